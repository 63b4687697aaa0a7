use volt_driver::Status;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the driver layer (wire format, values, tables)
    #[error(transparent)]
    DriverError(#[from] volt_driver::Error),
    /// Error raised by the SQL engine while executing queued statements
    #[error("{0}")]
    EngineError(String),
    /// IO error
    #[error("{0}")]
    IoError(String),
    /// A single-partition procedure was invoked without its partition parameter
    #[error("procedure {procedure} is partitioned on parameter {parameter}, which was not supplied")]
    MissingPartitionParameter {
        procedure: String,
        parameter: usize,
    },
    /// Wrong number of parameters for a procedure
    #[error("procedure {procedure} expects {expected} parameters, but received {actual}")]
    ParameterMismatch {
        procedure: String,
        expected: usize,
        actual: usize,
    },
    /// No procedure is registered under the invoked name
    #[error("Procedure {0} was not found")]
    ProcedureNotFound(String),
    /// The procedure asked for its work to be rolled back
    #[error("{0}")]
    UserAbort(String),
}

impl Error {
    /// Response status reported to the client for this error
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Error::UserAbort(_) => Status::UserAbort,
            Error::EngineError(_)
            | Error::MissingPartitionParameter { .. }
            | Error::ParameterMismatch { .. }
            | Error::ProcedureNotFound(_) => Status::GracefulFailure,
            Error::DriverError(_) | Error::IoError(_) => Status::UnexpectedFailure,
        }
    }
}

/// Converts a [`rusqlite::Error`] into an [`EngineError`](Error::EngineError)
impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Error::EngineError(error.to_string())
    }
}

/// Converts a [`std::io::Error`] into an [`IoError`](Error::IoError)
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn test_procedure_not_found() {
        let error = Error::ProcedureNotFound("Select".to_string());
        assert_eq!(error.to_string(), "Procedure Select was not found");
        assert_eq!(error.status(), Status::GracefulFailure);
    }

    #[test]
    fn test_user_abort_status() {
        let error = Error::UserAbort("rolled back".to_string());
        assert_eq!(error.status(), Status::UserAbort);
    }

    #[test]
    fn test_from_rusqlite_error() {
        let error = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(error.status(), Status::GracefulFailure);
        assert_eq!(error.to_string(), "Query returned no rows");
    }

    #[test]
    fn test_from_std_io_error() {
        let error = Error::from(std::io::Error::other("test"));
        assert_eq!(error.to_string(), "test");
        assert_eq!(error.status(), Status::UnexpectedFailure);
    }
}
