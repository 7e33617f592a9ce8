//! Asynchronous diagnostics batches.

use serde_json::json;
use tss_client::{DiagnosticCategory, Notification};
use tss_commands::args::GeterrRequestArgs;
use tss_commands::{Commands, DiagnosticSeverity, decode_report};

use crate::common::{FAKE_TSSERVER, next_matching, sh_server, started, within};

fn geterr(file: &str) -> GeterrRequestArgs {
    GeterrRequestArgs {
        files: vec![file.to_string()],
        delay: 0,
    }
}

#[tokio::test]
async fn geterr_batch_arrives_in_event_order() {
    let client = started(sh_server(FAKE_TSSERVER));
    let commands = Commands::new(&client);

    let report = within(commands.geterr_and_wait(&geterr("/w/a.ts")))
        .await
        .unwrap();

    let categories: Vec<_> = report.entries().iter().map(|e| e.category()).collect();
    assert_eq!(
        categories,
        vec![
            DiagnosticCategory::Syntactic,
            DiagnosticCategory::Semantic,
            DiagnosticCategory::Suggestion,
        ]
    );
    assert_eq!(report.entries()[1].body()["file"], json!("/w/a.ts"));

    let files = decode_report(&report).unwrap();
    let semantic = &files[1];
    assert_eq!(semantic.diagnostics.len(), 1);
    assert_eq!(semantic.diagnostics[0].code, Some(2322));
    assert_eq!(semantic.diagnostics[0].severity(), DiagnosticSeverity::Error);
}

#[tokio::test]
async fn consecutive_batches_do_not_leak_into_each_other() {
    let client = started(sh_server(FAKE_TSSERVER));
    let commands = Commands::new(&client);

    let first = within(commands.geterr_and_wait(&geterr("/w/a.ts")))
        .await
        .unwrap();
    let second = within(commands.geterr_and_wait(&geterr("/w/b.ts")))
        .await
        .unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_ne!(first.request_seq(), second.request_seq());
    assert!(
        second
            .bodies()
            .all(|body| body["file"] == json!("/w/b.ts"))
    );
}

#[tokio::test]
async fn completion_notification_reaches_every_subscriber() {
    let client = started(sh_server(FAKE_TSSERVER));
    let mut first = client.subscribe();
    let mut second = client.subscribe();

    let seq = Commands::new(&client).geterr(&geterr("/w/a.ts")).unwrap();

    for notifications in [&mut first, &mut second] {
        let Notification::DiagnosticsCompleted(report) = next_matching(notifications, |n| {
            matches!(n, Notification::DiagnosticsCompleted(_))
        })
        .await
        else {
            unreachable!();
        };
        assert_eq!(report.request_seq(), Some(seq));
        assert_eq!(report.len(), 3);
    }
}
