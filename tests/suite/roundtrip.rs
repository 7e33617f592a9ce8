//! Requests and responses against a scripted server.

use serde_json::json;
use tss_client::{ClientConfig, ClientError, CompletionCommand, Notification};
use tss_commands::args::{CompletionsRequestArgs, FileLocationRequestArgs, FileRequestArgs, OpenRequestArgs};
use tss_commands::{CommandError, Commands};

use crate::common::{FAKE_TSSERVER, REVERSING_TSSERVER, next_matching, sh_server, started, within};

#[tokio::test]
async fn correlated_request_gets_its_body() {
    let client = started(sh_server(FAKE_TSSERVER));

    let pending = client
        .send_correlated("reload", Some(json!({ "file": "/w/a.ts", "tmpfile": "/tmp/a" })))
        .unwrap();
    let body = within(pending).await.unwrap();
    assert_eq!(body, json!({ "command": "reload" }));
}

#[tokio::test]
async fn responses_in_reverse_order_reach_their_callers() {
    let client = started(sh_server(REVERSING_TSSERVER));

    let first = client.send_correlated("quickinfo", None).unwrap();
    let second = client.send_correlated("definition", None).unwrap();
    let third = client.send_correlated("references", None).unwrap();
    let seqs = [first.seq(), second.seq(), third.seq()];

    let (a, b, c) = within(async { tokio::join!(first.wait(), second.wait(), third.wait()) }).await;
    assert_eq!(a.unwrap(), json!(seqs[0]));
    assert_eq!(b.unwrap(), json!(seqs[1]));
    assert_eq!(c.unwrap(), json!(seqs[2]));
}

#[tokio::test]
async fn failed_response_carries_server_message() {
    let client = started(sh_server(FAKE_TSSERVER));

    let result = within(client.send_correlated("projectInfo", None).unwrap()).await;
    match result {
        Err(ClientError::RequestFailure { command, message }) => {
            assert_eq!(command, "projectInfo");
            assert_eq!(message, "No Project.");
        }
        other => panic!("expected RequestFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn typed_commands_decode_bodies() {
    let client = started(sh_server(FAKE_TSSERVER));
    let commands = Commands::new(&client);
    let at = FileLocationRequestArgs::new("/w/a.ts", 1, 7);

    let info = within(commands.quickinfo(&at)).await.unwrap();
    assert_eq!(info.display_string, "const x: number");
    assert_eq!(info.kind, "const");

    let spans = within(commands.definition(&at)).await.unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].file, "/w/a.ts");
    assert_eq!(spans[0].start.offset, 7);

    let tree = within(commands.navtree(&FileRequestArgs::new("/w/a.ts")))
        .await
        .unwrap();
    assert_eq!(tree["childItems"][0]["text"], "C");
}

#[tokio::test]
async fn typed_command_rejects_unexpected_body() {
    let client = started(sh_server(FAKE_TSSERVER));
    let commands = Commands::new(&client);

    // The echo body is an object, not a list of code fix names.
    let result = within(commands.get_supported_code_fixes()).await;
    assert!(matches!(
        result,
        Err(CommandError::Decode { command: "getSupportedCodeFixes", .. })
    ));
}

#[tokio::test]
async fn completions_use_configured_command() {
    for (configured, expected) in [
        (CompletionCommand::CompletionInfo, "completionInfo"),
        (CompletionCommand::Completions, "completions"),
    ] {
        let mut client = tss_client::ProtocolClient::new(sh_server(FAKE_TSSERVER))
            .with_completion_command(configured);
        client.start().unwrap();
        let commands = Commands::new(&client);

        let args = CompletionsRequestArgs {
            file: "/w/a.ts".into(),
            line: 1,
            offset: 1,
            ..CompletionsRequestArgs::default()
        };
        let body = within(commands.completions(&args)).await.unwrap();
        assert_eq!(body["command"], expected);
        client.stop().unwrap();
    }
}

#[tokio::test]
async fn fire_and_forget_open_is_followed_by_project_event() {
    let client = started(sh_server(FAKE_TSSERVER));
    let mut notifications = client.subscribe();
    let commands = Commands::new(&client);

    let seq = commands.open(&OpenRequestArgs::new("/w/a.ts")).unwrap();
    let next = client.send_correlated("signatureHelp", None).unwrap();
    assert!(next.seq() > seq);

    let event = next_matching(&mut notifications, |n| {
        matches!(n, Notification::ProjectLoadingFinished)
    })
    .await;
    assert_eq!(event, Notification::ProjectLoadingFinished);
    assert_eq!(within(next).await.unwrap(), json!({ "command": "signatureHelp" }));
}

#[tokio::test]
async fn timed_out_request_does_not_disturb_later_ones() {
    let config = ClientConfig {
        request_timeout_ms: Some(200),
        ..sh_server(FAKE_TSSERVER)
    };
    let client = started(config);

    let slow = client.send_correlated("slow", None).unwrap();
    let seq = slow.seq();
    assert!(matches!(
        within(slow).await,
        Err(ClientError::Timeout { seq: s, .. }) if s == seq
    ));

    let body = within(client.send_correlated("navto", None).unwrap())
        .await
        .unwrap();
    assert_eq!(body, json!({ "command": "navto" }));
}
