use crate::error::Result;
use crate::{Partitioning, Procedure, ProcedureContext, SqlStmt, expect_parameters};
use volt_driver::{ResultTable, Value};

const INSERT_STMT: SqlStmt =
    SqlStmt::new("INSERT INTO HELLOWORLD (HELLO, WORLD, DIALECT) VALUES (?, ?, ?)");

/// `Insert(hello, world, dialect)`: store the greeting of one dialect.
/// Partitioned on the dialect.
#[derive(Debug)]
pub struct Insert;

impl Procedure for Insert {
    fn name(&self) -> &'static str {
        "Insert"
    }

    fn partitioning(&self) -> Partitioning {
        Partitioning::SinglePartition { parameter: 2 }
    }

    fn run(
        &self,
        context: &mut ProcedureContext<'_>,
        parameters: &[Value],
    ) -> Result<Vec<ResultTable>> {
        expect_parameters(self.name(), parameters, 3)?;
        context.queue_sql(&INSERT_STMT, parameters.to_vec());
        context.execute_sql()
    }
}
