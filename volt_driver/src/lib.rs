//! # Volt Driver
//!
//! Client-side building blocks for invoking stored procedures on a volt
//! procedure host: typed [`Value`]s, [`ResultTable`]s with by-name row
//! accessors, [`ClientResponse`]s and the [`Connection`] used to send
//! invocations.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

mod connection;
mod error;
pub mod protocol;
mod response;
mod table;
mod tcp;
mod value;

pub use connection::{Connection, MockConnection, call};
pub use error::{Error, Result};
pub use protocol::{DEFAULT_PORT, Invocation};
pub use response::{ClientResponse, Status};
pub use table::{Column, ColumnType, ResultTable, Row};
pub use tcp::{TcpConnection, endpoint};
pub use value::Value;
