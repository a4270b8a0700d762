//! # wsctl-proto
//!
//! Static description of the Amazon WorkSpaces operations exposed by `wsctl`,
//! plus the pieces of the invocation contract that need no network:
//! parameter binding, request construction and output projection.
//!
//! ```text
//! raw args ──► Bindings ──► request (JSON) ──► [remote call] ──► response
//!                 │                                                │
//!                 └──────────────► Selector::project ◄─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod binding;
pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod selector;


pub use binding::{Bindings, Bound};
pub use catalog::{find_operation, operations};
pub use descriptor::{
    ConfirmImpact, OperationDescriptor, Output, Paging, ParamKind, ParamSource, ParamSpec,
    WireShape,
};
pub use error::ProtoError;
pub use request::{build_request, set_token};
pub use selector::Selector;
