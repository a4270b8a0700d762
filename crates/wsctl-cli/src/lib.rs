//! # wsctl-cli
//!
//! Command-line front end for Amazon WorkSpaces.
//!
//! Every operation in the `wsctl-proto` catalog becomes a subcommand. A
//! single [`invoker::Invoker`] runs all of them: it binds parameters, asks
//! for confirmation, calls the service through [`client::WorkspacesApi`]
//! (paging where the operation supports it) and streams
//! [`invoker::Envelope`]s to an [`invoker::OutputSink`].
//!
//! ```text
//! ┌───────────┐   AWS JSON 1.1 + SigV4   ┌───────────────────────┐
//! │   wsctl   │─────────────────────────►│ workspaces.<region>   │
//! └───────────┘        (HTTPS)           └───────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod invoker;
pub mod output;

pub use cli::{build_command, parse_matches, Format, GlobalArgs, Invocation, OperationRequest};
pub use client::{HttpWorkspacesClient, WorkspacesApi};
pub use config::{Settings, WsctlConfig};
pub use error::{CliError, RemoteError};
pub use invoker::{Envelope, InvocationOptions, InvocationReport, Invoker, OutputSink};
pub use output::OutputFormat;
