//! # Volt Hello
//!
//! Asks a volt procedure host for the greeting of a language through the
//! `Select` procedure and prints it as `<hello>, <world>!`.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]

pub mod configuration;
mod error;
pub mod greeting;

pub use error::{Error, Result};
pub use greeting::{Greeting, SELECT_PROCEDURE};
