pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that stop a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the driver (connection or transport)
    #[error(transparent)]
    DriverError(#[from] volt_driver::Error),
    /// No workload was selected
    #[error("no workload selected; choose writes, reads or results")]
    NoWorkload,
    /// A worker task ended without a report
    #[error("worker failed: {0}")]
    WorkerFailed(String),
}
