//! # Volt Server
//!
//! Hosts stored procedures over a SQLite database. A [`Procedure`] is a
//! stateless handler registered by name in a [`ProcedureRegistry`]; the
//! [`Engine`] runs each invocation atomically and the [`Server`] exposes the
//! engine to remote clients.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod engine;
mod error;
mod procedure;
pub mod procedures;
mod registry;
mod server;

pub use engine::Engine;
pub use error::{Error, Result};
pub use procedure::{Partitioning, Procedure, ProcedureContext, SqlStmt, expect_parameters};
pub use registry::ProcedureRegistry;
pub use server::Server;
