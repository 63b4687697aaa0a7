pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can occur while fetching a greeting
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the driver (connection, call or result access)
    #[error(transparent)]
    DriverError(#[from] volt_driver::Error),
    /// The call succeeded but did not produce exactly one greeting
    #[error("I can't say Hello in that language.")]
    EmptyResult,
}
