//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Projected values
//! are arbitrary JSON, so the table renderer picks a layout from the shape:
//! an array of objects becomes rows, an object becomes `key: value` lines and
//! scalars print as-is.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};
use wsctl_proto::{ConfirmImpact, OperationDescriptor};

use crate::cli::Format;
use crate::error::CliError;
use crate::invoker::{Envelope, OutputSink};

const MAX_CELL: usize = 40;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A projected response value.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Projected<'a>(pub &'a Value);

impl TableDisplay for Projected<'_> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self.0 {
            Value::Null => Ok(()),
            Value::Array(items) if items.is_empty() => {
                writeln!(writer, "No results")?;
                Ok(())
            }
            Value::Array(items) if items.iter().all(Value::is_object) => {
                write_rows(writer, items, RowLayout::Full)
            }
            Value::Array(items) => {
                for item in items {
                    writeln!(writer, "{}", cell(item, usize::MAX))?;
                }
                Ok(())
            }
            Value::Object(fields) => write_fields(writer, fields),
            scalar => {
                writeln!(writer, "{}", cell(scalar, usize::MAX))?;
                Ok(())
            }
        }
    }
}

/// How much framing a block of rows gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowLayout {
    /// Header, rows and total.
    Full,
    /// First page of a paged stream: header and rows.
    FirstPage,
    /// Later page of a paged stream: rows only.
    NextPage,
}

fn write_rows<W: Write>(
    writer: &mut W,
    items: &[Value],
    layout: RowLayout,
) -> Result<(), CliError> {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(fields) = item {
            for key in fields.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| item.get(*column).map_or_else(String::new, |v| cell(v, MAX_CELL)))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    if layout != RowLayout::NextPage {
        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| format!("{:<width$}", column.to_ascii_uppercase()))
            .collect();
        writeln!(writer, "{}", header.join("  ").trim_end())?;
        let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(writer, "{}", "─".repeat(total_width))?;
    }

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect();
        writeln!(writer, "{}", line.join("  ").trim_end())?;
    }

    if layout == RowLayout::Full {
        writeln!(writer)?;
        writeln!(writer, "Total: {} item(s)", rows.len())?;
    }
    Ok(())
}

fn write_fields<W: Write>(writer: &mut W, fields: &Map<String, Value>) -> Result<(), CliError> {
    let width = fields.keys().map(String::len).max().unwrap_or(0) + 1;
    for (key, value) in fields {
        let label = format!("{key}:");
        writeln!(writer, "{label:<width$}  {}", cell(value, usize::MAX))?;
    }
    Ok(())
}

/// Render one value for a table cell.
fn cell(value: &Value, max_len: usize) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text, max_len)
}

/// Structured error record, written to stderr.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Pipeline item, 1-based.
    pub item: usize,
    /// Page that failed; 0 when nothing was sent.
    pub page: usize,
    /// Error kind.
    pub kind: String,
    /// Service error code, for service errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message.
    pub message: String,
}

impl ErrorRecord {
    /// Build a record from an error envelope's parts.
    #[must_use]
    pub fn new(item: usize, page: usize, error: &CliError) -> Self {
        Self {
            item,
            page,
            kind: error.kind().to_string(),
            code: error.code().map(ToString::to_string),
            message: error.to_string(),
        }
    }
}

impl TableDisplay for ErrorRecord {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.page > 0 {
            writeln!(
                writer,
                "✗ item {} page {}: {}",
                self.item, self.page, self.message
            )?;
        } else {
            writeln!(writer, "✗ item {}: {}", self.item, self.message)?;
        }
        Ok(())
    }
}

/// One catalog entry for `wsctl operations`.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    /// Subcommand name.
    pub command: String,
    /// Cmdlet-style alias.
    pub alias: &'static str,
    /// API operation name.
    pub operation: &'static str,
    /// Confirmation impact.
    pub impact: ConfirmImpact,
    /// Whether the operation pages.
    pub paginated: bool,
    /// One-line description.
    pub about: &'static str,
}

impl From<&OperationDescriptor> for OperationSummary {
    fn from(op: &OperationDescriptor) -> Self {
        Self {
            command: op.command_name(),
            alias: op.alias,
            operation: op.name,
            impact: op.confirm,
            paginated: op.paging.is_some(),
            about: op.about,
        }
    }
}

/// List of operations for display.
#[derive(Debug, Clone, Serialize)]
pub struct OperationList {
    /// Matching operations, in catalog order.
    pub operations: Vec<OperationSummary>,
}

impl TableDisplay for OperationList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.operations.is_empty() {
            writeln!(writer, "No matching operations")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<40}  {:<36}  {:<6}  {:<5}",
            "COMMAND", "ALIAS", "IMPACT", "PAGED"
        )?;
        writeln!(writer, "{}", "─".repeat(93))?;

        for op in &self.operations {
            writeln!(
                writer,
                "{:<40}  {:<36}  {:<6}  {:<5}",
                truncate(&op.command, 40),
                truncate(op.alias, 36),
                op.impact.as_str(),
                if op.paginated { "yes" } else { "no" }
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} operation(s)", self.operations.len())?;
        Ok(())
    }
}

/// Continuation token left over in manual paging mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PendingToken {
    /// Pipeline item, 1-based.
    pub item: usize,
    /// Token to pass back with `--next-token`.
    pub next_token: String,
}

impl TableDisplay for PendingToken {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "NextToken: {}", self.next_token)?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// Writes output envelopes to `out` and error envelopes to `err`.
///
/// With paging on, pages stream as they arrive: one compact JSON document
/// per line, or table rows under a single header.
#[derive(Debug)]
pub struct WriterSink<O, E> {
    format: OutputFormat,
    out: O,
    err: E,
    paged: bool,
}

impl<O: Write, E: Write> WriterSink<O, E> {
    /// Create a sink.
    pub const fn new(format: OutputFormat, out: O, err: E) -> Self {
        Self {
            format,
            out,
            err,
            paged: false,
        }
    }

    /// Stream output as pages of one paginated response.
    #[must_use]
    pub fn with_paging(mut self, paged: bool) -> Self {
        self.paged = paged;
        self
    }

    /// Give back the writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_page(&mut self, page: usize, value: &Value) -> Result<(), CliError> {
        if self.format.is_json() {
            serde_json::to_writer(&mut self.out, value)
                .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
            writeln!(self.out)?;
            return Ok(());
        }
        match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                let layout = if page > 1 {
                    RowLayout::NextPage
                } else {
                    RowLayout::FirstPage
                };
                write_rows(&mut self.out, items, layout)
            }
            Value::Array(items) if items.is_empty() && page > 1 => Ok(()),
            other => Projected(other).write_table(&mut self.out),
        }
    }
}

impl<O: Write, E: Write> OutputSink for WriterSink<O, E> {
    fn emit(&mut self, envelope: Envelope) -> Result<(), CliError> {
        match envelope {
            Envelope::Output { page, value, .. } => {
                if value.is_null() {
                    return Ok(());
                }
                if self.paged {
                    self.write_page(page, &value)?;
                } else {
                    self.format.write(&mut self.out, &Projected(&value))?;
                }
                self.out.flush()?;
            }
            Envelope::Error { item, page, error } => {
                self.format
                    .write(&mut self.err, &ErrorRecord::new(item, page, &error))?;
            }
        }
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use serde_json::json;
    use wsctl_proto::find_operation;

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
        assert!(!fmt.is_json());
    }

    #[test]
    fn output_format_json() {
        let fmt = OutputFormat::new(Format::Json);
        assert_eq!(fmt.format(), Format::Json);
        assert!(fmt.is_json());
    }

    #[test]
    fn projected_rows_table() {
        let value = json!([
            { "WorkspaceId": "ws-1", "State": "AVAILABLE" },
            { "WorkspaceId": "ws-2", "State": "STOPPED", "UserName": "jdoe" }
        ]);
        let output = OutputFormat::new(Format::Table)
            .to_string(&Projected(&value))
            .expect("should format");

        let mut lines = output.lines();
        let header = lines.next().expect("header");
        for column in ["WORKSPACEID", "STATE", "USERNAME"] {
            assert!(header.contains(column), "{header}");
        }
        assert!(lines.next().expect("separator").starts_with('─'));
        assert!(output
            .lines()
            .any(|line| line.contains("ws-2") && line.contains("STOPPED") && line.contains("jdoe")));
        assert!(output.contains("Total: 2 item(s)"));
    }

    #[test]
    fn projected_object_table() {
        let value = json!({ "AccountLinkId": "link-1", "AccountLinkStatus": "LINKED" });
        let output = OutputFormat::new(Format::Table)
            .to_string(&Projected(&value))
            .expect("should format");
        assert!(output.contains("AccountLinkId:      link-1"));
        assert!(output.contains("AccountLinkStatus:  LINKED"));
    }

    #[test]
    fn projected_scalars_and_empties() {
        let fmt = OutputFormat::new(Format::Table);
        assert_eq!(fmt.to_string(&Projected(&json!("ws-1"))).expect("fmt"), "ws-1\n");
        assert_eq!(fmt.to_string(&Projected(&Value::Null)).expect("fmt"), "");
        assert_eq!(fmt.to_string(&Projected(&json!([]))).expect("fmt"), "No results\n");
        assert_eq!(
            fmt.to_string(&Projected(&json!(["a", "b"]))).expect("fmt"),
            "a\nb\n"
        );
    }

    #[test]
    fn projected_json_is_the_value() {
        let value = json!({ "Tags": [{ "Key": "k", "Value": "v" }] });
        let output = OutputFormat::new(Format::Json)
            .to_string(&Projected(&value))
            .expect("should format");
        let parsed: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed, value);
    }

    #[test]
    fn nested_cells_are_compact_json() {
        let value = json!([{ "WorkspaceId": "ws-1", "WorkspaceProperties": { "RunningMode": "AUTO_STOP" } }]);
        let output = OutputFormat::new(Format::Table)
            .to_string(&Projected(&value))
            .expect("should format");
        assert!(output.contains(r#"{"RunningMode":"AUTO_STOP"}"#));
    }

    #[test]
    fn error_record_json() {
        let error = CliError::from(RemoteError::Service {
            code: "AccessDeniedException".into(),
            message: "not allowed".into(),
            status: 400,
            request_id: None,
        });
        let output = OutputFormat::new(Format::Json)
            .to_string(&ErrorRecord::new(2, 1, &error))
            .expect("should format");
        let parsed: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed["item"], 2);
        assert_eq!(parsed["page"], 1);
        assert_eq!(parsed["kind"], "ServiceError");
        assert_eq!(parsed["code"], "AccessDeniedException");
        assert_eq!(parsed["message"], "AccessDeniedException: not allowed");
    }

    #[test]
    fn error_record_table() {
        let error = CliError::Config("bad".into());
        let output = OutputFormat::new(Format::Table)
            .to_string(&ErrorRecord::new(3, 0, &error))
            .expect("should format");
        assert_eq!(output, "✗ item 3: configuration error: bad\n");
    }

    #[test]
    fn operation_list_table() {
        let list = OperationList {
            operations: vec![OperationSummary::from(
                find_operation("ListAccountLinks").expect("op"),
            )],
        };
        let output = OutputFormat::new(Format::Table)
            .to_string(&list)
            .expect("should format");
        assert!(output.contains("list-account-links"));
        assert!(output.contains("Get-WKSAccountLinkList"));
        assert!(output.contains("yes"));
        assert!(output.contains("Total: 1 operation(s)"));
    }

    #[test]
    fn operation_list_empty() {
        let list = OperationList { operations: vec![] };
        let output = OutputFormat::new(Format::Table)
            .to_string(&list)
            .expect("should format");
        assert!(output.contains("No matching operations"));
    }

    #[test]
    fn writer_sink_splits_streams() {
        let mut sink = WriterSink::new(OutputFormat::new(Format::Json), Vec::new(), Vec::new());
        sink.emit(Envelope::Output {
            item: 1,
            page: 1,
            value: json!(["ws-1"]),
            response: json!({ "Workspaces": ["ws-1"] }),
            next_token: None,
        })
        .expect("emit");
        sink.emit(Envelope::Output {
            item: 2,
            page: 1,
            value: Value::Null,
            response: json!({}),
            next_token: None,
        })
        .expect("emit");
        sink.emit(Envelope::Error {
            item: 3,
            page: 0,
            error: CliError::Config("x".into()),
        })
        .expect("emit");

        let (out, err) = sink.into_inner();
        let out = String::from_utf8(out).expect("utf8");
        let err = String::from_utf8(err).expect("utf8");
        assert_eq!(serde_json::from_str::<Value>(&out).expect("json"), json!(["ws-1"]));
        assert!(err.contains("\"item\": 3"));
    }

    fn emit_pages(format: Format) -> String {
        let mut sink = WriterSink::new(OutputFormat::new(format), Vec::new(), Vec::new())
            .with_paging(true);
        let pages = [json!([{ "WorkspaceId": "ws-1" }]), json!([{ "WorkspaceId": "ws-2" }])];
        for (index, value) in pages.into_iter().enumerate() {
            sink.emit(Envelope::Output {
                item: 1,
                page: index + 1,
                value: value.clone(),
                response: json!({ "Workspaces": value }),
                next_token: None,
            })
            .expect("emit");
        }
        String::from_utf8(sink.into_inner().0).expect("utf8")
    }

    #[test]
    fn paged_json_is_one_document_per_line() {
        let out = emit_pages(Format::Json);
        let lines: Vec<Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(
            lines,
            vec![json!([{ "WorkspaceId": "ws-1" }]), json!([{ "WorkspaceId": "ws-2" }])]
        );
    }

    #[test]
    fn paged_table_has_a_single_header() {
        let out = emit_pages(Format::Table);
        assert_eq!(out.matches("WORKSPACEID").count(), 1);
        assert!(out.contains("ws-1"));
        assert!(out.contains("ws-2"));
        assert!(!out.contains("Total:"));
    }

    #[test]
    fn pending_token_notice() {
        let pending = PendingToken {
            item: 1,
            next_token: "abc==".into(),
        };
        let table = OutputFormat::new(Format::Table)
            .to_string(&pending)
            .expect("should format");
        assert_eq!(table, "NextToken: abc==\n");

        let json = OutputFormat::new(Format::Json)
            .to_string(&pending)
            .expect("should format");
        let parsed: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed["NextToken"], "abc==");
        assert_eq!(parsed["Item"], 1);
    }

    #[test]
    fn message_info() {
        let output = OutputFormat::new(Format::Table)
            .to_string(&Message::info("Skipped item 2: not confirmed"))
            .expect("should format");
        assert_eq!(output, "Skipped item 2: not confirmed\n");
    }

    #[test]
    fn truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_multibyte() {
        assert_eq!(truncate("ääääää", 5), "ää...");
        assert_eq!(truncate("ääää", 2), "ää");
    }
}
