//! Starting, stopping and losing the server.

use std::path::PathBuf;

use tss_client::{ClientConfig, ClientError, Notification, ProtocolClient, ServerStopReason};

use tss_commands::Commands;
use tss_commands::args::GeterrRequestArgs;

use crate::common::{
    CRASHING_TSSERVER, FAKE_TSSERVER, next_matching, sh_server, started, until_stopped, within,
};

#[tokio::test]
async fn start_twice_is_rejected() {
    let mut client = started(sh_server(FAKE_TSSERVER));
    assert!(client.is_running());
    assert!(client.server_pid().is_some());
    assert!(matches!(client.start(), Err(ClientError::AlreadyRunning)));
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let config = ClientConfig {
        server_path: PathBuf::from("/definitely/not/here/tsserver"),
        ..ClientConfig::default()
    };
    let mut client = ProtocolClient::new(config);

    let err = client.start().unwrap_err();
    assert!(matches!(err, ClientError::Spawn { ref path, .. } if path.ends_with("tsserver")));
    assert!(!client.is_running());
    assert!(matches!(
        client.send_correlated("quickinfo", None),
        Err(ClientError::ProcessNotRunning)
    ));
}

#[tokio::test]
async fn stop_interrupts_server_and_allows_restart() {
    let mut client = started(sh_server(FAKE_TSSERVER));
    let mut notifications = client.subscribe();
    let before = client.send_fire_and_forget("reloadProjects", None).unwrap();

    client.stop().unwrap();
    assert!(!client.is_running());
    assert!(matches!(client.stop(), Err(ClientError::ProcessNotRunning)));
    assert!(matches!(
        client.send_fire_and_forget("close", None),
        Err(ClientError::ProcessNotRunning)
    ));

    next_matching(&mut notifications, |n| matches!(n, Notification::ServerExited { .. })).await;

    client.start().unwrap();
    let pending = client.send_correlated("brace", None).unwrap();
    assert!(pending.seq() > before);
    assert!(within(pending).await.is_ok());
}

#[tokio::test]
async fn crash_fails_outstanding_request() {
    let client = started(sh_server(CRASHING_TSSERVER));
    let run = client.server_run().unwrap();
    let mut notifications = client.subscribe();

    let pending = client.send_correlated("references", None).unwrap();
    let seq = pending.seq();
    match within(pending).await {
        Err(ClientError::ProcessCrashed { seq: s, command }) => {
            assert_eq!(s, seq);
            assert_eq!(command, "references");
        }
        other => panic!("expected ProcessCrashed, got {other:?}"),
    }

    let exited = next_matching(&mut notifications, |n| matches!(n, Notification::ServerExited { .. })).await;
    assert_eq!(
        exited,
        Notification::ServerExited {
            run,
            reason: ServerStopReason::Exited { code: Some(3) },
        }
    );

    until_stopped(&client).await;
    assert!(matches!(
        client.send_correlated("references", None),
        Err(ClientError::ProcessNotRunning)
    ));
}

#[tokio::test]
async fn crash_mid_session_then_restart() {
    let mut client = started(sh_server(FAKE_TSSERVER));

    let survivor = client.send_correlated("slow", None).unwrap();
    client.send_fire_and_forget("crash", None).unwrap();
    assert!(matches!(
        within(survivor).await,
        Err(ClientError::ProcessCrashed { .. })
    ));
    until_stopped(&client).await;

    client.start().unwrap();
    assert!(within(client.send_correlated("format", None).unwrap()).await.is_ok());
}

#[tokio::test]
async fn late_exit_of_stopped_server_does_not_fail_new_one() {
    let mut client = started(sh_server(FAKE_TSSERVER));
    let args = GeterrRequestArgs {
        files: vec!["/w/a.ts".to_string()],
        delay: 0,
    };

    for _ in 0..5 {
        let stopped = client.server_run();
        client.stop().unwrap();
        client.start().unwrap();
        assert_ne!(client.server_run(), stopped);

        let report = within(Commands::new(&client).geterr_and_wait(&args))
            .await
            .unwrap();
        assert_eq!(report.len(), 3);
    }
}
