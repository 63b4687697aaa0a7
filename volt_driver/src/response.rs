use crate::Error::CallError;
use crate::ResultTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a procedure invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,
    /// The procedure rolled back on its own request
    UserAbort,
    /// The invocation failed and its effects were rolled back
    GracefulFailure,
    UnexpectedFailure,
    ConnectionLost,
}

impl Status {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "SUCCESS",
            Status::UserAbort => "USER_ABORT",
            Status::GracefulFailure => "GRACEFUL_FAILURE",
            Status::UnexpectedFailure => "UNEXPECTED_FAILURE",
            Status::ConnectionLost => "CONNECTION_LOST",
        };
        write!(f, "{name}")
    }
}

/// Server reply to one [`Invocation`](crate::Invocation).
///
/// A non-success status always carries a status string; result tables of a
/// failed response are never consulted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientResponse {
    client_handle: u64,
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_string: Option<String>,
    #[serde(default)]
    results: Vec<ResultTable>,
}

impl ClientResponse {
    #[must_use]
    pub fn success(client_handle: u64, results: Vec<ResultTable>) -> Self {
        Self {
            client_handle,
            status: Status::Success,
            status_string: None,
            results,
        }
    }

    pub fn failure<S: Into<String>>(client_handle: u64, status: Status, status_string: S) -> Self {
        Self {
            client_handle,
            status,
            status_string: Some(status_string.into()),
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn client_handle(&self) -> u64 {
        self.client_handle
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable status; falls back to the status name when the server
    /// sent none.
    #[must_use]
    pub fn status_string(&self) -> String {
        match &self.status_string {
            Some(status_string) => status_string.clone(),
            None => self.status.to_string(),
        }
    }

    #[must_use]
    pub fn results(&self) -> &[ResultTable] {
        &self.results
    }

    /// Take the result tables of a successful response.
    ///
    /// # Errors
    /// * [`CallError`] carrying the status string if the status is not success
    pub fn into_results(self) -> Result<Vec<ResultTable>> {
        if self.status.is_success() {
            Ok(self.results)
        } else {
            Err(CallError {
                status: self.status,
                message: self.status_string(),
            })
        }
    }
}
