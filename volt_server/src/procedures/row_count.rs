use crate::error::Result;
use crate::{Partitioning, Procedure, ProcedureContext, SqlStmt, expect_parameters};
use volt_driver::{ResultTable, Value};

const RESULT_STMT: SqlStmt = SqlStmt::new("SELECT COUNT(*) FROM HELLOWORLD");

/// `Results`: number of rows in `HELLOWORLD`, across all partitions.
#[derive(Debug)]
pub struct RowCount;

impl Procedure for RowCount {
    fn name(&self) -> &'static str {
        "Results"
    }

    fn partitioning(&self) -> Partitioning {
        Partitioning::MultiPartition
    }

    fn run(
        &self,
        context: &mut ProcedureContext<'_>,
        parameters: &[Value],
    ) -> Result<Vec<ResultTable>> {
        expect_parameters(self.name(), parameters, 0)?;
        context.queue_sql(&RESULT_STMT, Vec::new());
        context.execute_sql()
    }
}
