//! Scripted stand-ins for tsserver.
//!
//! Each server is a `/bin/sh -c` script reading one request per line and
//! answering the way tsserver does, including its `Content-Length` preamble.

#![allow(dead_code)]

use std::future::IntoFuture;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::broadcast;
use tss_client::{ClientConfig, Notification, ProtocolClient};

/// Answers a handful of commands with realistic bodies and echoes the rest.
/// `open` announces project loading; `slow` never answers; `crash` exits.
pub const FAKE_TSSERVER: &str = r##"
while IFS= read -r line; do
  seq=$(printf '%s\n' "$line" | sed -n 's/.*"seq":\([0-9]*\).*/\1/p')
  cmd=$(printf '%s\n' "$line" | sed -n 's/.*"command":"\([^"]*\)".*/\1/p')
  file=$(printf '%s\n' "$line" | sed -n 's/.*"file":"\([^"]*\)".*/\1/p')
  case "$cmd" in
    open)
      printf 'Content-Length: 0\r\n\r\n'
      printf '{"seq":0,"type":"event","event":"projectLoadingFinish","body":{"projectName":"%s"}}\n' "$file"
      ;;
    close|reloadProjects|slow)
      ;;
    crash)
      exit 3
      ;;
    geterr)
      f=$(printf '%s\n' "$line" | sed -n 's/.*"files":\["\([^"]*\)".*/\1/p')
      printf '{"seq":0,"type":"event","event":"syntaxDiag","body":{"file":"%s","diagnostics":[]}}\n' "$f"
      printf '{"seq":0,"type":"event","event":"semanticDiag","body":{"file":"%s","diagnostics":[{"start":{"line":1,"offset":7},"end":{"line":1,"offset":8},"text":"Type string is not assignable to type number.","code":2322,"category":"error"}]}}\n' "$f"
      printf '{"seq":0,"type":"event","event":"suggestionDiag","body":{"file":"%s","diagnostics":[]}}\n' "$f"
      printf '{"seq":0,"type":"event","event":"requestCompleted","body":{"request_seq":%s}}\n' "$seq"
      ;;
    quickinfo)
      printf 'Content-Length: 0\r\n\r\n'
      printf '{"seq":0,"type":"response","command":"quickinfo","request_seq":%s,"success":true,"body":{"kind":"const","kindModifiers":"","start":{"line":1,"offset":7},"end":{"line":1,"offset":8},"displayString":"const x: number","documentation":"","tags":[]}}\n' "$seq"
      ;;
    definition)
      printf '{"seq":0,"type":"response","command":"definition","request_seq":%s,"success":true,"body":[{"file":"%s","start":{"line":1,"offset":7},"end":{"line":1,"offset":8}}]}\n' "$seq" "$file"
      ;;
    navtree)
      printf '{"seq":0,"type":"response","command":"navtree","request_seq":%s,"success":true,"body":{"text":"a","kind":"module","childItems":[{"text":"C","kind":"class"}]}}\n' "$seq"
      ;;
    projectInfo)
      printf '{"seq":0,"type":"response","command":"projectInfo","request_seq":%s,"success":false,"message":"No Project."}\n' "$seq"
      ;;
    *)
      printf '{"seq":0,"type":"response","command":"%s","request_seq":%s,"success":true,"body":{"command":"%s"}}\n' "$cmd" "$seq" "$cmd"
      ;;
  esac
done
"##;

/// Collects three requests, then answers them newest first.
pub const REVERSING_TSSERVER: &str = r##"
IFS= read -r a
IFS= read -r b
IFS= read -r c
for line in "$c" "$b" "$a"; do
  seq=$(printf '%s\n' "$line" | sed -n 's/.*"seq":\([0-9]*\).*/\1/p')
  printf '{"seq":0,"type":"response","request_seq":%s,"success":true,"body":%s}\n' "$seq" "$seq"
done
cat > /dev/null
"##;

/// Reads one request and dies without answering.
pub const CRASHING_TSSERVER: &str = r##"
IFS= read -r line
exit 3
"##;

pub fn sh_server(script: &str) -> ClientConfig {
    ClientConfig {
        server_path: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string(), script.to_string()],
        ..ClientConfig::default()
    }
}

pub fn started(config: ClientConfig) -> ProtocolClient {
    let mut client = ProtocolClient::new(config);
    client.start().expect("fake tsserver starts");
    client
}

/// Fail the test instead of hanging when the server misbehaves.
pub async fn within<F: IntoFuture>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future.into_future())
        .await
        .expect("operation finished in time")
}

/// The next notification matching `wanted`, skipping others.
pub async fn next_matching(
    notifications: &mut broadcast::Receiver<Notification>,
    wanted: impl Fn(&Notification) -> bool,
) -> Notification {
    within(async {
        loop {
            let notification = notifications.recv().await.expect("notification channel open");
            if wanted(&notification) {
                return notification;
            }
        }
    })
    .await
}

/// Poll until the client notices its server is gone.
pub async fn until_stopped(client: &ProtocolClient) {
    within(async {
        while client.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}
