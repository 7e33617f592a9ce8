use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tss_client::{ClientError, DiagnosticsReport, Notification, ProtocolClient};

use crate::args::{
    CodeFixRequestArgs, CompletionDetailsRequestArgs, CompletionsRequestArgs,
    DiagnosticsSyncRequestArgs, FileLocationRequestArgs, FileRangeRequestArgs, FileRequestArgs,
    GetCombinedCodeFixRequestArgs, GetEditsForFileRenameRequestArgs, GeterrForProjectRequestArgs,
    GeterrRequestArgs, NavtoRequestArgs, OpenRequestArgs, OrganizeImportsRequestArgs,
    ProjectInfoRequestArgs, ReloadRequestArgs, RenameRequestArgs,
};
use crate::error::CommandError;
use crate::responses::{Diagnostic, FileSpan, QuickInfo};

type Body = serde_json::Value;

/// Typed view over a [`ProtocolClient`]'s request primitives.
///
/// Bodies the server describes loosely are returned as raw JSON.
#[derive(Clone, Copy)]
pub struct Commands<'a> {
    client: &'a ProtocolClient,
}

impl<'a> Commands<'a> {
    #[must_use]
    pub fn new(client: &'a ProtocolClient) -> Self {
        Self { client }
    }

    pub fn open(&self, args: &OpenRequestArgs) -> Result<u64, CommandError> {
        self.notify("open", Some(args))
    }

    pub fn close(&self, args: &FileRequestArgs) -> Result<u64, CommandError> {
        self.notify("close", Some(args))
    }

    pub fn reload_projects(&self) -> Result<u64, CommandError> {
        self.notify::<()>("reloadProjects", None)
    }

    /// Start asynchronous diagnostics. Results arrive as a
    /// [`Notification::DiagnosticsCompleted`]; see [`Commands::geterr_and_wait`].
    pub fn geterr(&self, args: &GeterrRequestArgs) -> Result<u64, CommandError> {
        self.notify("geterr", Some(args))
    }

    pub fn geterr_for_project(&self, args: &GeterrForProjectRequestArgs) -> Result<u64, CommandError> {
        self.notify("geterrForProject", Some(args))
    }

    /// Send `geterr` and wait for the diagnostics batch its completion flushes.
    ///
    /// Batches completed for other requests are skipped, as are exits of
    /// servers stopped before this call. Honors the client's request timeout
    /// when one is configured.
    pub async fn geterr_and_wait(
        &self,
        args: &GeterrRequestArgs,
    ) -> Result<DiagnosticsReport, CommandError> {
        // Subscribe before sending so the completion cannot be missed.
        let mut notifications = self.client.subscribe();
        let run = self.client.server_run();
        let seq = self.geterr(args)?;
        let wait = wait_for_report(&mut notifications, seq, run);

        match self.client.config().request_timeout() {
            None => wait.await,
            Some(after) => tokio::time::timeout(after, wait).await.unwrap_or_else(|_| {
                Err(CommandError::Client(ClientError::Timeout {
                    seq,
                    command: "geterr".to_string(),
                    after,
                }))
            }),
        }
    }

    pub async fn reload(&self, args: &ReloadRequestArgs) -> Result<Body, CommandError> {
        self.request("reload", Some(args)).await
    }

    pub async fn quickinfo(&self, args: &FileLocationRequestArgs) -> Result<QuickInfo, CommandError> {
        self.request("quickinfo", Some(args)).await
    }

    pub async fn definition(
        &self,
        args: &FileLocationRequestArgs,
    ) -> Result<Vec<FileSpan>, CommandError> {
        self.request("definition", Some(args)).await
    }

    /// Uses whichever completion command the client was configured with.
    pub async fn completions(&self, args: &CompletionsRequestArgs) -> Result<Body, CommandError> {
        let command = self.client.completion_command().as_str();
        self.request(command, Some(args)).await
    }

    pub async fn completion_entry_details(
        &self,
        args: &CompletionDetailsRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("completionEntryDetails", Some(args)).await
    }

    pub async fn project_info(&self, args: &ProjectInfoRequestArgs) -> Result<Body, CommandError> {
        self.request("projectInfo", Some(args)).await
    }

    pub async fn references(&self, args: &FileLocationRequestArgs) -> Result<Body, CommandError> {
        self.request("references", Some(args)).await
    }

    pub async fn signature_help(
        &self,
        args: &FileLocationRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("signatureHelp", Some(args)).await
    }

    pub async fn rename(&self, args: &RenameRequestArgs) -> Result<Body, CommandError> {
        self.request("rename", Some(args)).await
    }

    pub async fn type_definition(
        &self,
        args: &FileLocationRequestArgs,
    ) -> Result<Vec<FileSpan>, CommandError> {
        self.request("typeDefinition", Some(args)).await
    }

    pub async fn navtree(&self, args: &FileRequestArgs) -> Result<Body, CommandError> {
        self.request("navtree", Some(args)).await
    }

    pub async fn navto(&self, args: &NavtoRequestArgs) -> Result<Body, CommandError> {
        self.request("navto", Some(args)).await
    }

    pub async fn semantic_diagnostics_sync(
        &self,
        args: &DiagnosticsSyncRequestArgs,
    ) -> Result<Vec<Diagnostic>, CommandError> {
        self.request("semanticDiagnosticsSync", Some(args)).await
    }

    pub async fn syntactic_diagnostics_sync(
        &self,
        args: &DiagnosticsSyncRequestArgs,
    ) -> Result<Vec<Diagnostic>, CommandError> {
        self.request("syntacticDiagnosticsSync", Some(args)).await
    }

    pub async fn suggestion_diagnostics_sync(
        &self,
        args: &DiagnosticsSyncRequestArgs,
    ) -> Result<Vec<Diagnostic>, CommandError> {
        self.request("suggestionDiagnosticsSync", Some(args)).await
    }

    pub async fn get_code_fixes(&self, args: &CodeFixRequestArgs) -> Result<Body, CommandError> {
        self.request("getCodeFixes", Some(args)).await
    }

    pub async fn get_applicable_refactors(
        &self,
        args: &FileRangeRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("getApplicableRefactors", Some(args)).await
    }

    pub async fn get_supported_code_fixes(&self) -> Result<Vec<String>, CommandError> {
        self.request::<(), _>("getSupportedCodeFixes", None).await
    }

    pub async fn get_combined_code_fix(
        &self,
        args: &GetCombinedCodeFixRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("getCombinedCodeFix", Some(args)).await
    }

    pub async fn organize_imports(
        &self,
        args: &OrganizeImportsRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("organizeImports", Some(args)).await
    }

    pub async fn get_edits_for_file_rename(
        &self,
        args: &GetEditsForFileRenameRequestArgs,
    ) -> Result<Body, CommandError> {
        self.request("getEditsForFileRename", Some(args)).await
    }

    fn notify<A: Serialize>(
        &self,
        command: &'static str,
        args: Option<&A>,
    ) -> Result<u64, CommandError> {
        let arguments = encode(command, args)?;
        Ok(self.client.send_fire_and_forget(command, arguments)?)
    }

    async fn request<A: Serialize, T: DeserializeOwned>(
        &self,
        command: &'static str,
        args: Option<&A>,
    ) -> Result<T, CommandError> {
        let arguments = encode(command, args)?;
        let body = self.client.send_correlated(command, arguments)?.await?;
        serde_json::from_value(body).map_err(|source| CommandError::Decode { command, source })
    }
}

fn encode<A: Serialize>(
    command: &'static str,
    args: Option<&A>,
) -> Result<Option<serde_json::Value>, CommandError> {
    args.map(serde_json::to_value)
        .transpose()
        .map_err(|source| CommandError::Encode { command, source })
}

/// Wait for the batch completed by `seq`, sent to the server of `run`.
async fn wait_for_report(
    notifications: &mut broadcast::Receiver<Notification>,
    seq: u64,
    run: Option<u64>,
) -> Result<DiagnosticsReport, CommandError> {
    let crashed = || {
        CommandError::Client(ClientError::ProcessCrashed {
            seq,
            command: "geterr".to_string(),
        })
    };
    loop {
        match notifications.recv().await {
            Ok(Notification::DiagnosticsCompleted(report)) if report.request_seq() == Some(seq) => {
                return Ok(report);
            }
            Ok(Notification::ServerExited { run: exited, .. }) if Some(exited) == run => {
                return Err(crashed());
            }
            Ok(_) => {}
            Err(RecvError::Closed) => return Err(crashed()),
            // The completion may have been among the dropped notifications.
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, seq, "Notification receiver lagged during geterr");
                return Err(CommandError::MissedNotifications {
                    command: "geterr",
                    skipped,
                });
            }
        }
    }
}
