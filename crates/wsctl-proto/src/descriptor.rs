//! Operation descriptor model.
//!
//! A descriptor is plain static data. Everything the invoker does for an
//! operation (binding, request shape, default projection, paging, prompting)
//! is read from here, so adding an operation means adding a table entry.

use serde::{Deserialize, Serialize};

/// Value kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Free-form string.
    String,
    /// Signed integer.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// One or more strings.
    StringList,
    /// Structured input given as JSON text.
    Document,
    /// One of a closed set of string constants.
    Enum(&'static [&'static str]),
    /// One or more values from a closed set of string constants.
    EnumList(&'static [&'static str]),
}

impl ParamKind {
    /// Whether the parameter accepts several values.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::StringList | Self::EnumList(_))
    }

    /// Allowed constants for enum kinds.
    #[must_use]
    pub const fn allowed(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Enum(values) | Self::EnumList(values) => Some(values),
            _ => None,
        }
    }

    /// Human-readable kind name for help text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::StringList => "string list",
            Self::Document => "JSON document",
            Self::Enum(_) => "enum",
            Self::EnumList(_) => "enum list",
        }
    }
}

/// Where a parameter value may come from on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Only as `--name value`.
    Named,
    /// Also accepted positionally at the given index.
    Positional(usize),
    /// Positional at index 0 and bindable from stdin, one item per line.
    Pipeline,
}

/// How a bound value lands in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireShape {
    /// Copied into the request field with the parameter's own name.
    Field,
    /// Each list element `v` becomes `{ key: v }` in request array `field`.
    WrapEach {
        /// Request array field.
        field: &'static str,
        /// Key inside each element object.
        key: &'static str,
    },
}

/// One input parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Canonical parameter name (PascalCase, as the API spells it).
    pub name: &'static str,
    /// Value kind.
    pub kind: ParamKind,
    /// Whether binding fails when the parameter is absent or null.
    pub required: bool,
    /// Command-line source.
    pub source: ParamSource,
    /// Request shape.
    pub wire: WireShape,
}

impl ParamSpec {
    /// Optional named parameter copied one-to-one into the request.
    #[must_use]
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            source: ParamSource::Named,
            wire: WireShape::Field,
        }
    }

    /// Mark as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accept positionally at `index`.
    #[must_use]
    pub const fn positional(mut self, index: usize) -> Self {
        self.source = ParamSource::Positional(index);
        self
    }

    /// Accept from the pipeline (stdin), and positionally at index 0.
    #[must_use]
    pub const fn pipeline(mut self) -> Self {
        self.source = ParamSource::Pipeline;
        self
    }

    /// Wrap each list element into `{ key: value }` inside request `field`.
    #[must_use]
    pub const fn wrap_each(mut self, field: &'static str, key: &'static str) -> Self {
        self.wire = WireShape::WrapEach { field, key };
        self
    }

    /// Positional index, if any.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self.source {
            ParamSource::Named => None,
            ParamSource::Positional(index) => Some(index),
            ParamSource::Pipeline => Some(0),
        }
    }
}

/// Default output of an operation when no `--select` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One documented field of the response.
    Field(&'static str),
    /// The entire response object.
    Whole,
    /// The operation returns an empty response; nothing is emitted.
    Nothing,
}

/// Continuation token field names of a listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Request field carrying the token in.
    pub input_token: &'static str,
    /// Response field carrying the next token out.
    pub output_token: &'static str,
}

impl Paging {
    /// The `NextToken` in / `NextToken` out convention used by WorkSpaces.
    pub const NEXT_TOKEN: Self = Self {
        input_token: "NextToken",
        output_token: "NextToken",
    };
}

/// How disruptive an operation is. Ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmImpact {
    /// Read-only; never prompts.
    None,
    /// Minor state change.
    Low,
    /// State-changing.
    Medium,
    /// Destructive or hard to reverse.
    High,
}

impl ConfirmImpact {
    /// Parse a lowercase impact name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Static metadata for one WorkSpaces API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// API operation name, also the `X-Amz-Target` suffix.
    pub name: &'static str,
    /// Verb-noun alias accepted as a subcommand name.
    pub alias: &'static str,
    /// One-line description.
    pub about: &'static str,
    /// Input parameters in declaration order.
    pub params: &'static [ParamSpec],
    /// Documented top-level response fields.
    pub response_fields: &'static [&'static str],
    /// Default projection.
    pub output: Output,
    /// Continuation token names for listing operations.
    pub paging: Option<Paging>,
    /// Confirmation impact.
    pub confirm: ConfirmImpact,
    /// Parameter echoed by the deprecated `--pass-thru` flag.
    pub pass_thru: Option<&'static str>,
}

impl OperationDescriptor {
    /// Look up a parameter by canonical name, ignoring ASCII case.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    /// Look up a documented response field, ignoring ASCII case.
    #[must_use]
    pub fn response_field(&self, name: &str) -> Option<&'static str> {
        self.response_fields
            .iter()
            .copied()
            .find(|field| field.eq_ignore_ascii_case(name))
    }

    /// The parameter fed from stdin, if the operation has one.
    #[must_use]
    pub fn pipeline_param(&self) -> Option<&'static ParamSpec> {
        self.params
            .iter()
            .find(|spec| spec.source == ParamSource::Pipeline)
    }

    /// Parameter that identifies the target in confirmation prompts.
    #[must_use]
    pub fn target_param(&self) -> Option<&'static ParamSpec> {
        self.params
            .iter()
            .find(|spec| spec.position() == Some(0))
            .or_else(|| self.params.iter().find(|spec| spec.required))
    }

    /// Subcommand name: the API name in kebab-case.
    #[must_use]
    pub fn command_name(&self) -> String {
        kebab_case(self.name)
    }

    /// Whether the operation changes state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.confirm > ConfirmImpact::None
    }
}

/// `DescribeWorkspaceBundles` -> `describe-workspace-bundles`.
#[must_use]
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && !chars[i - 1].is_ascii_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
