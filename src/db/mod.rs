//! High-level Database API and command dispatch.
//!
//! This module provides a clean, user-facing API over the collection store:
//! configuration, one entry point per operation, and the structured
//! [`Response`] every command folds into.

mod api;
mod command;
mod response;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult, IdStrategy};
pub use command::{Action, Command, Invocation};
pub use response::{Outcome, Response, NO_ID};
