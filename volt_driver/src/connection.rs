use crate::error::Result;
use crate::{ClientResponse, ResultTable, Value};
use async_trait::async_trait;
use mockall::automock;
use std::fmt::Debug;

/// A session with one procedure host
#[automock]
#[async_trait]
pub trait Connection: Debug + Send + Sync {
    /// Address of the connected endpoint
    fn endpoint(&self) -> String;

    /// Invoke a procedure by name and wait for its response. Non-success
    /// statuses are returned as responses, not errors.
    async fn call_procedure(
        &mut self,
        procedure: &str,
        parameters: &[Value],
    ) -> Result<ClientResponse>;

    async fn close(&mut self) -> Result<()>;
}

/// Invoke a procedure and return its result tables.
///
/// # Errors
/// * Transport errors from [`Connection::call_procedure`]
/// * [`CallError`](crate::Error::CallError) if the response status is not success
pub async fn call(
    connection: &mut dyn Connection,
    procedure: &str,
    parameters: &[Value],
) -> Result<Vec<ResultTable>> {
    let response = connection.call_procedure(procedure, parameters).await?;
    response.into_results()
}
