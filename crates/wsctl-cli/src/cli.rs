//! Command-line argument parsing with clap.
//!
//! Global options are a derived [`Args`] struct. Operation subcommands are
//! built at runtime from the catalog, one per descriptor, so the command line
//! always matches the table.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, ValueEnum};
use serde::{Deserialize, Serialize};
use wsctl_proto::descriptor::kebab_case;
use wsctl_proto::{operations, Bindings, OperationDescriptor, ParamSpec, Selector};

use crate::error::CliError;
use crate::invoker::InvocationOptions;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// AWS region, e.g. us-east-1.
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Named profile from the shared AWS config and credentials files.
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Send requests to this endpoint instead of the regional one.
    #[arg(long, global = true, env = "WSCTL_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Configuration file.
    #[arg(long, global = true, env = "WSCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<Format>,
}

/// Name of the catalog listing subcommand.
pub const OPERATIONS_COMMAND: &str = "operations";

const SELECT: &str = "select";
const FORCE: &str = "force";
const PASS_THRU: &str = "pass-thru";
const NO_AUTO_ITERATION: &str = "no-auto-iteration";
const STDIN: &str = "stdin";

/// Build the full command tree.
#[must_use]
pub fn build_command() -> Command {
    let cmd = Command::new("wsctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run Amazon WorkSpaces API operations from the command line.")
        .subcommand_required(true)
        .arg_required_else_help(true);
    let cmd = GlobalArgs::augment_args(cmd).subcommand(
        Command::new(OPERATIONS_COMMAND)
            .about("List the operations wsctl can run.")
            .arg(Arg::new("filter").help("Only show operations whose name or alias contains this text.")),
    );
    operations()
        .iter()
        .fold(cmd, |cmd, op| cmd.subcommand(operation_command(op)))
}

fn positional_id(spec: &ParamSpec) -> String {
    format!("{}-positional", spec.name)
}

fn param_help(spec: &ParamSpec) -> String {
    let mut help = format!("{} ({}", spec.name, spec.kind.label());
    if spec.required {
        help.push_str(", required");
    }
    help.push(')');
    if let Some(allowed) = spec.kind.allowed() {
        help.push_str(". One of: ");
        help.push_str(&allowed.join(", "));
    }
    help.push_str(". Pass \"\" for null.");
    help
}

fn operation_command(op: &'static OperationDescriptor) -> Command {
    let mut cmd = Command::new(op.command_name())
        .visible_alias(op.alias)
        .alias(op.name)
        .about(op.about);

    for spec in op.params {
        let value_name = kebab_case(spec.name).to_ascii_uppercase();
        let mut arg = Arg::new(spec.name)
            .long(kebab_case(spec.name))
            .value_name(value_name.clone())
            .help(param_help(spec));
        arg = if spec.kind.is_list() {
            arg.num_args(1..).action(ArgAction::Append)
        } else {
            arg.action(ArgAction::Set)
        };
        cmd = cmd.arg(arg);

        if let Some(index) = spec.position() {
            let mut positional = Arg::new(positional_id(spec))
                .index(index + 1)
                .value_name(value_name)
                .conflicts_with(spec.name)
                .help(format!("{} given positionally.", spec.name));
            if spec.kind.is_list() {
                positional = positional.num_args(1..).action(ArgAction::Append);
            }
            cmd = cmd.arg(positional);
        }
    }

    cmd = cmd.arg(
        Arg::new(SELECT)
            .long(SELECT)
            .value_name("EXPR")
            .help("Output selection: '*' for the whole response, a response field, or '^Parameter'."),
    );
    if op.is_mutating() {
        cmd = cmd.arg(
            Arg::new(FORCE)
                .long(FORCE)
                .action(ArgAction::SetTrue)
                .help("Do not ask for confirmation."),
        );
    }
    if let Some(param) = op.pass_thru {
        cmd = cmd.arg(
            Arg::new(PASS_THRU)
                .long(PASS_THRU)
                .action(ArgAction::SetTrue)
                .help(format!("Deprecated: same as --select ^{param}.")),
        );
    }
    if op.paging.is_some() {
        cmd = cmd.arg(
            Arg::new(NO_AUTO_ITERATION)
                .long(NO_AUTO_ITERATION)
                .action(ArgAction::SetTrue)
                .help("Fetch one page only and print the token for the next."),
        );
    }
    if let Some(spec) = op.pipeline_param() {
        cmd = cmd.arg(
            Arg::new(STDIN)
                .long(STDIN)
                .action(ArgAction::SetTrue)
                .conflicts_with_all([spec.name.to_string(), positional_id(spec)])
                .help(format!("Read {} values from stdin, one per line; each line runs once.", spec.name)),
        );
    }
    cmd
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `wsctl operations [filter]`.
    Operations {
        /// Substring filter.
        filter: Option<String>,
    },
    /// One catalog operation.
    Operation(OperationRequest),
}

/// A parsed operation subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    /// The operation.
    pub op: &'static OperationDescriptor,
    /// Raw parameter values, by canonical name.
    pub base: Vec<(&'static str, Vec<String>)>,
    /// Invocation flags. The confirmation threshold is filled in from settings.
    pub options: InvocationOptions,
    /// Read pipeline items from stdin.
    pub stdin: bool,
}

impl OperationRequest {
    /// Extract a request from the operation's subcommand matches.
    #[must_use]
    pub fn from_matches(op: &'static OperationDescriptor, matches: &ArgMatches) -> Self {
        let mut base = Vec::new();
        for spec in op.params {
            let named = matches.get_many::<String>(spec.name);
            let values = match (named, spec.position()) {
                (Some(values), _) => Some(values),
                (None, Some(_)) => matches.get_many::<String>(&positional_id(spec)),
                (None, None) => None,
            };
            if let Some(values) = values {
                base.push((spec.name, values.cloned().collect()));
            }
        }

        let flag = |present: bool, id: &str| present && matches.get_flag(id);
        Self {
            op,
            base,
            options: InvocationOptions {
                select: matches.get_one::<String>(SELECT).cloned(),
                pass_thru: flag(op.pass_thru.is_some(), PASS_THRU),
                force: flag(op.is_mutating(), FORCE),
                no_auto_iteration: flag(op.paging.is_some(), NO_AUTO_ITERATION),
                ..InvocationOptions::default()
            },
            stdin: flag(op.pipeline_param().is_some(), STDIN),
        }
    }

    /// Validate everything that needs no network: the selector and the
    /// parameter bindings. Under `--stdin` the pipeline parameter is bound
    /// per item, so only it is left unchecked.
    pub fn preflight(&self) -> Result<(), CliError> {
        Selector::resolve(
            self.op,
            self.options.select.as_deref(),
            self.options.pass_thru,
        )?;

        let mut bindings = Bindings::new();
        for (name, values) in &self.base {
            bindings.bind_raw(self.op, name, values)?;
        }
        let piped = self
            .op
            .pipeline_param()
            .filter(|_| self.stdin)
            .map(|spec| spec.name);
        bindings.validate_excluding(self.op, piped)?;
        Ok(())
    }
}

/// Split parsed matches into global options and the requested invocation.
pub fn parse_matches(matches: &ArgMatches) -> Result<(GlobalArgs, Invocation), CliError> {
    let globals = GlobalArgs::from_arg_matches(matches)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let Some((name, sub)) = matches.subcommand() else {
        return Err(CliError::Config("no subcommand given".into()));
    };
    if name == OPERATIONS_COMMAND {
        return Ok((
            globals,
            Invocation::Operations {
                filter: sub.get_one::<String>("filter").cloned(),
            },
        ));
    }

    let op = operations()
        .iter()
        .find(|op| op.command_name() == name)
        .ok_or_else(|| wsctl_proto::ProtoError::UnknownOperation(name.to_string()))?;
    Ok((globals, Invocation::Operation(OperationRequest::from_matches(op, sub))))
}
