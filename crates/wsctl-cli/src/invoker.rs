//! The operation invoker.
//!
//! One generic engine runs every catalog operation: resolve the selector once,
//! then for each pipeline item bind, confirm, build the request, call (paging
//! as needed) and push envelopes to an [`OutputSink`].
//!
//! ```text
//! Created ──► Bound ──► Confirmed ──► Executing ──► Completed
//!    │          │                        │  ▲ │
//!    ▼          ▼                        ▼  │ ▼
//!  Failed    Aborted                   Paging ──► Failed / Aborted
//! ```

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, trace, warn, Instrument};
use uuid::Uuid;
use wsctl_proto::{
    build_request, set_token, Bindings, ConfirmImpact, OperationDescriptor, Paging, ProtoError,
    Selector,
};

use crate::client::WorkspacesApi;
use crate::confirm::{ConfirmPrompt, Confirmer};
use crate::error::{CliError, RemoteError};

/// Flags that apply to every item of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOptions {
    /// `--select` expression.
    pub select: Option<String>,
    /// Deprecated `--pass-thru`.
    pub pass_thru: bool,
    /// Skip confirmation.
    pub force: bool,
    /// Fetch a single page and surface the continuation token.
    pub no_auto_iteration: bool,
    /// Operations at or above this impact are confirmed first.
    pub confirm_threshold: ConfirmImpact,
}

impl Default for InvocationOptions {
    fn default() -> Self {
        Self {
            select: None,
            pass_thru: false,
            force: false,
            no_auto_iteration: false,
            confirm_threshold: ConfirmImpact::Medium,
        }
    }
}

impl InvocationOptions {
    /// Whether `op` must be confirmed before it runs. A `none` threshold
    /// never prompts.
    #[must_use]
    pub fn needs_confirmation(&self, op: &OperationDescriptor) -> bool {
        !self.force
            && op.is_mutating()
            && self.confirm_threshold != ConfirmImpact::None
            && op.confirm >= self.confirm_threshold
    }
}

/// Raw parameter values for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    /// Parameters shared by every item, as given on the command line.
    pub base: Vec<(&'static str, Vec<String>)>,
    /// One value per pipeline item, bound to the operation's pipeline
    /// parameter. `None` runs a single item.
    pub pipeline: Option<Vec<String>>,
}

impl Batch {
    /// A single item from command-line values.
    #[must_use]
    pub const fn single(base: Vec<(&'static str, Vec<String>)>) -> Self {
        Self {
            base,
            pipeline: None,
        }
    }

    fn items(self, op: &OperationDescriptor) -> Vec<Vec<(&'static str, Vec<String>)>> {
        match (self.pipeline, op.pipeline_param()) {
            (Some(values), Some(spec)) => values
                .into_iter()
                .map(|value| {
                    let mut raw: Vec<_> = self
                        .base
                        .iter()
                        .filter(|(name, _)| *name != spec.name)
                        .cloned()
                        .collect();
                    raw.push((spec.name, vec![value]));
                    raw
                })
                .collect(),
            _ => vec![self.base],
        }
    }
}

/// Lifecycle of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// Context created, nothing bound yet.
    Created,
    /// Parameters bound and validated.
    Bound,
    /// Cleared to run.
    Confirmed,
    /// Declined or cancelled.
    Aborted,
    /// First call in flight.
    Executing,
    /// Fetching a follow-up page.
    Paging,
    /// Every call succeeded.
    Completed,
    /// Binding or a call failed.
    Failed,
}

impl InvocationState {
    /// Whether `next` is a legal successor.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Bound | Self::Failed)
                | (Self::Bound, Self::Confirmed | Self::Aborted)
                | (Self::Confirmed, Self::Executing | Self::Aborted)
                | (
                    Self::Executing | Self::Paging,
                    Self::Paging | Self::Completed | Self::Failed | Self::Aborted
                )
        )
    }

    /// `Aborted`, `Completed` or `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Completed | Self::Failed)
    }
}

/// Per-item state. Owns the bindings; the selector is shared.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    op: &'static OperationDescriptor,
    selector: &'a Selector,
    item: usize,
    bindings: Bindings,
    cancel: CancellationToken,
    state: InvocationState,
}

impl<'a> InvocationContext<'a> {
    /// New context for item `item` (1-based).
    #[must_use]
    pub fn new(
        op: &'static OperationDescriptor,
        selector: &'a Selector,
        item: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            op,
            selector,
            item,
            bindings: Bindings::new(),
            cancel,
            state: InvocationState::Created,
        }
    }

    /// Item number.
    #[must_use]
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> InvocationState {
        self.state
    }

    /// Bound parameters.
    #[must_use]
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Bind raw values and check required parameters.
    pub fn bind(&mut self, raw: &[(&'static str, Vec<String>)]) -> Result<(), ProtoError> {
        for (name, values) in raw {
            self.bindings.bind_raw(self.op, name, values)?;
        }
        self.bindings.validate(self.op)
    }

    /// Move to `next`. Illegal edges are ignored.
    pub fn advance(&mut self, next: InvocationState) {
        if self.state.can_advance_to(next) {
            trace!(from = ?self.state, to = ?next, "state");
            self.state = next;
        } else {
            warn!(from = ?self.state, to = ?next, "ignoring illegal state transition");
        }
    }

    /// Apply the invocation's selector to `response`.
    #[must_use]
    pub fn project(&self, response: &Value) -> Value {
        self.selector.project(response, &self.bindings)
    }

    fn prompt(&self) -> ConfirmPrompt {
        let target = self
            .op
            .target_param()
            .and_then(|spec| self.bindings.value(spec.name))
            .map(display_value);
        ConfirmPrompt {
            operation: self.op.name,
            alias: self.op.alias,
            target,
            impact: self.op.confirm,
        }
    }

    fn manual_paging(&self, paging: Paging, options: &InvocationOptions) -> bool {
        options.no_auto_iteration || self.bindings.is_bound(paging.input_token)
    }
}

/// One unit of output: a projected page or an error, never both.
#[derive(Debug)]
pub enum Envelope {
    /// A successful call or page.
    Output {
        /// Pipeline item, 1-based.
        item: usize,
        /// Page within the item, 1-based.
        page: usize,
        /// Projected value.
        value: Value,
        /// Full response.
        response: Value,
        /// Continuation token left for the caller in manual paging mode.
        next_token: Option<String>,
    },
    /// A failed item or page.
    Error {
        /// Pipeline item, 1-based.
        item: usize,
        /// Page that failed; 0 when nothing was sent.
        page: usize,
        /// What went wrong.
        error: CliError,
    },
}

impl Envelope {
    /// Item number.
    #[must_use]
    pub const fn item(&self) -> usize {
        match self {
            Self::Output { item, .. } | Self::Error { item, .. } => *item,
        }
    }

    /// Whether this is an error envelope.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Receives envelopes as they are produced.
pub trait OutputSink {
    /// Handle one envelope. An error stops the invocation.
    fn emit(&mut self, envelope: Envelope) -> Result<(), CliError>;
}

impl OutputSink for Vec<Envelope> {
    fn emit(&mut self, envelope: Envelope) -> Result<(), CliError> {
        self.push(envelope);
        Ok(())
    }
}

/// Outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    /// Item number, 1-based.
    pub item: usize,
    /// Terminal state.
    pub state: InvocationState,
    /// Remote calls started.
    pub calls: usize,
    /// Continuation token surfaced in manual paging mode.
    pub pending_token: Option<String>,
}

/// Outcome of an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationReport {
    /// One report per item that started.
    pub items: Vec<ItemReport>,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

impl InvocationReport {
    /// Items that ended in `Failed`.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.state == InvocationState::Failed)
            .count()
    }

    /// Remote calls across every item.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.items.iter().map(|item| item.calls).sum()
    }

    /// Tokens left for the caller, by item.
    pub fn pending_tokens(&self) -> impl Iterator<Item = (usize, &str)> {
        self.items
            .iter()
            .filter_map(|item| item.pending_token.as_deref().map(|token| (item.item, token)))
    }
}

/// Runs operations against a [`WorkspacesApi`].
#[derive(Debug)]
pub struct Invoker<'a, C, F> {
    client: &'a C,
    confirmer: &'a F,
    cancel: CancellationToken,
}

impl<'a, C, F> Invoker<'a, C, F>
where
    C: WorkspacesApi,
    F: Confirmer,
{
    /// New invoker.
    #[must_use]
    pub const fn new(client: &'a C, confirmer: &'a F, cancel: CancellationToken) -> Self {
        Self {
            client,
            confirmer,
            cancel,
        }
    }

    /// Run `op` once per item of `batch`, strictly in order.
    ///
    /// Selector errors fail the whole invocation before any item runs.
    /// Item failures become error envelopes and later items still run.
    /// Only a sink failure is returned as `Err` once items have started.
    pub async fn run<S: OutputSink>(
        &self,
        op: &'static OperationDescriptor,
        options: &InvocationOptions,
        batch: Batch,
        sink: &mut S,
    ) -> Result<InvocationReport, CliError> {
        let selector = Selector::resolve(op, options.select.as_deref(), options.pass_thru)?;
        debug!(operation = op.name, ?selector, "selector resolved");

        let mut report = InvocationReport::default();
        for (index, raw) in batch.items(op).into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let item = index + 1;
            let invocation_id = Uuid::new_v4();
            let span = info_span!("invoke", operation = op.name, item, %invocation_id);
            let outcome = self
                .run_item(op, &selector, options, item, &raw, sink)
                .instrument(span)
                .await?;

            let cancelled =
                outcome.state == InvocationState::Aborted && self.cancel.is_cancelled();
            report.items.push(outcome);
            if cancelled {
                report.cancelled = true;
                break;
            }
        }
        Ok(report)
    }

    async fn run_item<S: OutputSink>(
        &self,
        op: &'static OperationDescriptor,
        selector: &Selector,
        options: &InvocationOptions,
        item: usize,
        raw: &[(&'static str, Vec<String>)],
        sink: &mut S,
    ) -> Result<ItemReport, CliError> {
        let mut ctx = InvocationContext::new(op, selector, item, self.cancel.child_token());
        let mut report = ItemReport {
            item,
            state: InvocationState::Created,
            calls: 0,
            pending_token: None,
        };

        if let Err(e) = ctx.bind(raw) {
            debug!(error = %e, "binding failed");
            ctx.advance(InvocationState::Failed);
            report.state = ctx.state();
            sink.emit(Envelope::Error {
                item,
                page: 0,
                error: e.into(),
            })?;
            return Ok(report);
        }
        ctx.advance(InvocationState::Bound);

        if options.needs_confirmation(op) {
            let prompt = ctx.prompt();
            if !self.confirmer.confirm(&prompt) {
                warn!(impact = op.confirm.as_str(), "confirmation declined, skipping");
                ctx.advance(InvocationState::Aborted);
                report.state = ctx.state();
                return Ok(report);
            }
        }
        ctx.advance(InvocationState::Confirmed);

        let mut request = build_request(op, ctx.bindings());
        let auto_paging = match op.paging {
            Some(paging) => !ctx.manual_paging(paging, options),
            None => false,
        };
        ctx.advance(InvocationState::Executing);

        let mut page = 0;
        loop {
            page += 1;
            report.calls += 1;
            trace!(page, ?request, "calling");

            let call = self.client.call(op.name, Value::Object(request.clone()));
            let result = tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => None,
                result = call => Some(result),
            };
            let Some(result) = result else {
                debug!(page, "cancelled while in flight");
                ctx.advance(InvocationState::Aborted);
                break;
            };

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    debug!(page, error = %e, "call failed");
                    ctx.advance(InvocationState::Failed);
                    sink.emit(Envelope::Error {
                        item,
                        page,
                        error: e.into(),
                    })?;
                    break;
                }
            };

            let next = op
                .paging
                .and_then(|paging| continuation_token(&response, paging));
            debug!(page, has_next = next.is_some(), "page received");

            if let (true, Some(paging), Some(next)) = (auto_paging, op.paging, next.as_deref()) {
                let sent = request.get(paging.input_token).and_then(Value::as_str);
                if sent == Some(next) {
                    warn!(page, token = next, "service repeated the continuation token");
                    ctx.advance(InvocationState::Failed);
                    sink.emit(Envelope::Error {
                        item,
                        page,
                        error: RemoteError::PaginationStalled(next.to_string()).into(),
                    })?;
                    break;
                }
            }

            let value = ctx.project(&response);
            let surfaced = if auto_paging { None } else { next.clone() };
            sink.emit(Envelope::Output {
                item,
                page,
                value,
                response,
                next_token: surfaced.clone(),
            })?;

            match (op.paging, next) {
                (Some(paging), Some(next)) if auto_paging => {
                    set_token(&mut request, paging.input_token, Some(&next));
                    ctx.advance(InvocationState::Paging);
                }
                _ => {
                    report.pending_token = surfaced;
                    ctx.advance(InvocationState::Completed);
                    break;
                }
            }
        }

        report.state = ctx.state();
        Ok(report)
    }
}

/// Output token of `response`, if present and non-empty.
fn continuation_token(response: &Value, paging: Paging) -> Option<String> {
    response
        .get(paging.output_token)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
