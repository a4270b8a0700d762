//! `wsctl operations`: list the catalog.

use std::io::Write;

use wsctl_proto::{operations, OperationDescriptor};

use crate::error::CliError;
use crate::output::{OperationList, OperationSummary, OutputFormat};

/// Operations listing command.
#[derive(Debug, Clone, Default)]
pub struct OperationsCommand {
    filter: Option<String>,
}

impl OperationsCommand {
    /// Create a new listing command with an optional substring filter.
    #[must_use]
    pub fn new(filter: Option<String>) -> Self {
        Self {
            filter: filter.map(|f| f.to_ascii_lowercase()),
        }
    }

    /// Write the matching operations.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        format.write(writer, &self.list())
    }

    /// Matching operations, in catalog order.
    #[must_use]
    pub fn list(&self) -> OperationList {
        OperationList {
            operations: operations()
                .iter()
                .filter(|op| self.matches(op))
                .map(OperationSummary::from)
                .collect(),
        }
    }

    fn matches(&self, op: &OperationDescriptor) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        [op.command_name(), op.alias.to_ascii_lowercase(), op.name.to_ascii_lowercase()]
            .iter()
            .any(|name| name.contains(filter.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    #[test]
    fn unfiltered_lists_everything() {
        let list = OperationsCommand::new(None).list();
        assert_eq!(list.operations.len(), operations().len());
    }

    #[test]
    fn filter_matches_any_name_ignoring_case() {
        let list = OperationsCommand::new(Some("ACCOUNT-LINK".into())).list();
        assert!(!list.operations.is_empty());
        assert!(list
            .operations
            .iter()
            .all(|op| op.command.contains("account-link")));

        let by_alias = OperationsCommand::new(Some("wkstag".into())).list();
        let names: Vec<_> = by_alias.operations.iter().map(|op| op.operation).collect();
        assert_eq!(names, vec!["CreateTags", "DeleteTags", "DescribeTags"]);
    }

    #[test]
    fn no_match_is_empty() {
        let list = OperationsCommand::new(Some("nothing-like-this".into())).list();
        assert!(list.operations.is_empty());
    }

    #[test]
    fn execute_json() {
        let mut buf = Vec::new();
        OperationsCommand::new(Some("restore".into()))
            .execute(&mut buf, &OutputFormat::new(Format::Json))
            .expect("should execute");

        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(parsed["operations"][0]["operation"], "RestoreWorkspace");
        assert_eq!(parsed["operations"][0]["impact"], "high");
    }
}
