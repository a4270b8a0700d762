//! Operation command: run one catalog operation through the invoker.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::OperationRequest;
use crate::client::WorkspacesApi;
use crate::config::Settings;
use crate::confirm::Confirmer;
use crate::error::CliError;
use crate::invoker::{Batch, InvocationReport, InvocationState, Invoker};
use crate::output::{Message, OutputFormat, PendingToken, WriterSink};

/// Exit status when the run was cancelled (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

/// Operation command executor.
#[derive(Debug, Clone)]
pub struct InvokeCommand {
    format: OutputFormat,
    settings: Settings,
}

impl InvokeCommand {
    /// Create a new operation command.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            format: OutputFormat::new(settings.format),
            settings,
        }
    }

    /// Run `request`, writing projected output to `out` and errors and
    /// notices to `err`.
    ///
    /// # Errors
    ///
    /// Returns an error for invocation-level validation failures and when
    /// output cannot be written. Per-item failures are reported on `err`.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute<C, F, O, E>(
        &self,
        client: &C,
        confirmer: &F,
        cancel: CancellationToken,
        request: OperationRequest,
        pipeline: Option<Vec<String>>,
        out: O,
        err: E,
    ) -> Result<InvocationReport, CliError>
    where
        C: WorkspacesApi,
        F: Confirmer,
        O: Write,
        E: Write,
    {
        let mut options = request.options;
        options.confirm_threshold = self.settings.confirm_threshold;
        let batch = Batch {
            base: request.base,
            pipeline,
        };

        let invoker = Invoker::new(client, confirmer, cancel);
        let mut sink =
            WriterSink::new(self.format.clone(), out, err).with_paging(request.op.paging.is_some());
        let report = invoker.run(request.op, &options, batch, &mut sink).await?;
        let (_, mut err) = sink.into_inner();

        for item in &report.items {
            if item.state == InvocationState::Aborted && !report.cancelled {
                self.format.write(
                    &mut err,
                    &Message::info(format!("Skipped item {}: not confirmed", item.item)),
                )?;
            }
        }
        for (item, token) in report.pending_tokens() {
            self.format.write(
                &mut err,
                &PendingToken {
                    item,
                    next_token: token.to_string(),
                },
            )?;
        }
        if report.cancelled {
            info!(operation = request.op.name, "cancelled");
        }
        Ok(report)
    }
}

/// Read pipeline items: one per non-empty line, surrounding whitespace
/// trimmed.
pub fn read_pipeline<R: BufRead>(reader: R) -> Result<Vec<String>, CliError> {
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            items.push(line.to_string());
        }
    }
    Ok(items)
}

/// Process exit status for a finished invocation.
#[must_use]
pub fn exit_status(report: &InvocationReport) -> u8 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if report.failures() > 0 {
        1
    } else {
        0
    }
}

/// [`exit_status`] as an [`ExitCode`].
#[must_use]
pub fn exit_code(report: &InvocationReport) -> ExitCode {
    ExitCode::from(exit_status(report))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use wsctl_proto::ConfirmImpact;

    use super::*;
    use crate::cli::{build_command, parse_matches, Format, Invocation};
    use crate::confirm::FixedConfirmer;
    use crate::error::RemoteError;
    use crate::invoker::ItemReport;

    /// Answers every call with the next page and counts calls.
    struct PagedClient {
        pages: Mutex<Vec<Value>>,
        calls: Mutex<usize>,
    }

    impl PagedClient {
        fn new(mut pages: Vec<Value>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                calls: Mutex::new(0),
            }
        }
    }

    impl WorkspacesApi for PagedClient {
        async fn call(&self, _operation: &'static str, _request: Value) -> Result<Value, RemoteError> {
            *self.calls.lock() += 1;
            self.pages
                .lock()
                .pop()
                .ok_or_else(|| RemoteError::Transport("no more pages".into()))
        }
    }

    fn settings(format: Format) -> Settings {
        Settings {
            region: Some("us-east-1".into()),
            profile: None,
            endpoint_url: None,
            format,
            confirm_threshold: ConfirmImpact::Medium,
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }

    fn request(args: &[&str]) -> OperationRequest {
        let matches = build_command()
            .try_get_matches_from(args)
            .expect("should parse");
        match parse_matches(&matches).expect("should resolve").1 {
            Invocation::Operation(request) => request,
            Invocation::Operations { .. } => panic!("expected an operation"),
        }
    }

    async fn execute(
        client: &PagedClient,
        confirm: bool,
        format: Format,
        args: &[&str],
    ) -> (InvocationReport, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let report = InvokeCommand::new(settings(format))
            .execute(
                client,
                &FixedConfirmer(confirm),
                CancellationToken::new(),
                request(args),
                None,
                &mut out,
                &mut err,
            )
            .await
            .expect("should execute");
        (
            report,
            String::from_utf8(out).expect("utf8"),
            String::from_utf8(err).expect("utf8"),
        )
    }

    #[tokio::test]
    async fn manual_paging_prints_next_token_notice() {
        let client = PagedClient::new(vec![json!({
            "Workspaces": [{ "WorkspaceId": "ws-1", "State": "AVAILABLE" }],
            "NextToken": "page-2"
        })]);

        let (report, out, err) = execute(
            &client,
            true,
            Format::Table,
            &["wsctl", "describe-workspaces", "--no-auto-iteration"],
        )
        .await;

        assert_eq!(exit_status(&report), 0);
        assert!(out.contains("ws-1"));
        assert_eq!(err, "NextToken: page-2\n");
    }

    #[tokio::test]
    async fn declined_item_is_reported_on_stderr() {
        let client = PagedClient::new(vec![]);
        let (report, out, err) = execute(
            &client,
            false,
            Format::Table,
            &["wsctl", "reboot-workspaces", "ws-1"],
        )
        .await;

        assert_eq!(*client.calls.lock(), 0);
        assert_eq!(exit_status(&report), 0);
        assert!(out.is_empty());
        assert_eq!(err, "Skipped item 1: not confirmed\n");
    }

    #[tokio::test]
    async fn remote_error_sets_failure_status() {
        let client = PagedClient::new(vec![]);
        let (report, out, err) = execute(
            &client,
            true,
            Format::Json,
            &["wsctl", "describe-account"],
        )
        .await;

        assert_eq!(exit_status(&report), 1);
        assert!(out.is_empty());
        let record: Value = serde_json::from_str(&err).expect("json error record");
        assert_eq!(record["kind"], "Transport");
        assert_eq!(record["item"], 1);
        assert_eq!(record["page"], 1);
    }

    #[tokio::test]
    async fn json_output_is_projected_field() {
        let client = PagedClient::new(vec![json!({
            "TagList": [{ "Key": "team", "Value": "blue" }]
        })]);
        let (_, out, _) = execute(
            &client,
            true,
            Format::Json,
            &["wsctl", "describe-tags", "ws-1"],
        )
        .await;

        let parsed: Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed, json!([{ "Key": "team", "Value": "blue" }]));
    }

    #[test]
    fn pipeline_lines() {
        let input = "ws-1\n\n  ws-2  \r\n\t\nws-3";
        let items = read_pipeline(input.as_bytes()).expect("read");
        assert_eq!(items, vec!["ws-1", "ws-2", "ws-3"]);
    }

    #[test]
    fn exit_statuses() {
        let item = |state| ItemReport {
            item: 1,
            state,
            calls: 1,
            pending_token: None,
        };
        let ok = InvocationReport {
            items: vec![item(InvocationState::Completed), item(InvocationState::Aborted)],
            cancelled: false,
        };
        assert_eq!(exit_status(&ok), 0);

        let failed = InvocationReport {
            items: vec![item(InvocationState::Completed), item(InvocationState::Failed)],
            cancelled: false,
        };
        assert_eq!(exit_status(&failed), 1);

        let cancelled = InvocationReport {
            items: vec![item(InvocationState::Aborted)],
            cancelled: true,
        };
        assert_eq!(exit_status(&cancelled), EXIT_CANCELLED);
    }
}
