use crate::Error::ParameterMismatch;
use crate::engine;
use crate::error::Result;
use std::fmt::Debug;
use tracing::trace;
use volt_driver::{ResultTable, Value};

/// Where a procedure's data access is confined
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partitioning {
    /// Touches only the partition selected by the parameter at this position
    SinglePartition { parameter: usize },
    /// May read or write across the whole dataset
    MultiPartition,
}

/// A fixed SQL statement declared by a procedure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SqlStmt {
    sql: &'static str,
}

impl SqlStmt {
    #[must_use]
    pub const fn new(sql: &'static str) -> Self {
        Self { sql }
    }

    #[must_use]
    pub fn sql(&self) -> &'static str {
        self.sql
    }
}

/// A named, stateless unit of work executed atomically by the engine.
///
/// Every statement a procedure executes during one invocation runs in the
/// same transaction; returning an error rolls all of them back.
pub trait Procedure: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn partitioning(&self) -> Partitioning;

    /// Run the procedure with the invocation's positional parameters.
    ///
    /// # Errors
    /// * Any error aborts the invocation and rolls back its statements
    fn run(&self, context: &mut ProcedureContext<'_>, parameters: &[Value])
    -> Result<Vec<ResultTable>>;
}

/// Statement queue bound to the transaction of one invocation
#[derive(Debug)]
pub struct ProcedureContext<'a> {
    connection: &'a rusqlite::Connection,
    queue: Vec<(SqlStmt, Vec<Value>)>,
}

impl<'a> ProcedureContext<'a> {
    pub(crate) fn new(connection: &'a rusqlite::Connection) -> Self {
        Self {
            connection,
            queue: Vec::new(),
        }
    }

    /// Queue a statement with its parameters for the next [`execute_sql`](Self::execute_sql).
    pub fn queue_sql(&mut self, statement: &SqlStmt, parameters: Vec<Value>) {
        trace!("queued: {}", statement.sql());
        self.queue.push((*statement, parameters));
    }

    /// Execute the queued statements in order and return one result table
    /// per statement. The queue is empty afterwards.
    ///
    /// # Errors
    /// * [`EngineError`](crate::Error::EngineError) from the first failing statement
    pub fn execute_sql(&mut self) -> Result<Vec<ResultTable>> {
        let queue = std::mem::take(&mut self.queue);
        queue
            .iter()
            .map(|(statement, parameters)| {
                engine::execute_statement(self.connection, statement.sql(), parameters)
            })
            .collect()
    }
}

/// Check the number of parameters an invocation supplied.
///
/// # Errors
/// * [`ParameterMismatch`] if `parameters` does not have `expected` entries
pub fn expect_parameters(procedure: &str, parameters: &[Value], expected: usize) -> Result<()> {
    if parameters.len() == expected {
        Ok(())
    } else {
        Err(ParameterMismatch {
            procedure: procedure.to_string(),
            expected,
            actual: parameters.len(),
        })
    }
}
