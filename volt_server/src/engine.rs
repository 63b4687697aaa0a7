use crate::Error::{EngineError, MissingPartitionParameter, ProcedureNotFound};
use crate::error::Result;
use crate::{Partitioning, ProcedureContext, ProcedureRegistry};
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use volt_driver::{ClientResponse, Column, ColumnType, Invocation, ResultTable, Status, Value};

/// Column reported for statements that return no rows of their own
const MODIFIED_TUPLES: &str = "modified_tuples";

/// Executes procedure invocations against one SQLite database.
///
/// Invocations are serialized: one procedure runs at a time and its
/// statements share a single transaction.
#[derive(Debug)]
pub struct Engine {
    connection: Mutex<rusqlite::Connection>,
    registry: ProcedureRegistry,
}

impl Engine {
    #[must_use]
    pub fn new(connection: rusqlite::Connection, registry: ProcedureRegistry) -> Self {
        Self {
            connection: Mutex::new(connection),
            registry,
        }
    }

    /// Open (or create) a database file.
    ///
    /// # Errors
    /// * [`EngineError`] if the database cannot be opened
    pub fn open<P: AsRef<Path>>(path: P, registry: ProcedureRegistry) -> Result<Self> {
        let connection = rusqlite::Connection::open(path)?;
        Ok(Self::new(connection, registry))
    }

    /// # Errors
    /// * [`EngineError`] if the database cannot be created
    pub fn open_in_memory(registry: ProcedureRegistry) -> Result<Self> {
        let connection = rusqlite::Connection::open_in_memory()?;
        Ok(Self::new(connection, registry))
    }

    #[must_use]
    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    /// Run one invocation and build its response. Failures never escape as
    /// errors; they become non-success responses carrying the error message.
    #[instrument(level = "debug", skip(self, invocation), fields(procedure = %invocation.procedure))]
    pub fn invoke(&self, invocation: &Invocation) -> ClientResponse {
        match self.run(invocation) {
            Ok(results) => ClientResponse::success(invocation.client_handle, results),
            Err(error) => {
                warn!("{} failed: {error}", invocation.procedure);
                ClientResponse::failure(invocation.client_handle, error.status(), error.to_string())
            }
        }
    }

    fn run(&self, invocation: &Invocation) -> Result<Vec<ResultTable>> {
        let procedure = self
            .registry
            .get(&invocation.procedure)
            .ok_or_else(|| ProcedureNotFound(invocation.procedure.clone()))?;

        if let Partitioning::SinglePartition { parameter } = procedure.partitioning() {
            if parameter >= invocation.parameters.len() {
                return Err(MissingPartitionParameter {
                    procedure: procedure.name().to_string(),
                    parameter,
                });
            }
        }

        // A panicking procedure poisons the lock after its transaction has
        // been rolled back, so the connection is still usable.
        let mut connection = self.connection.lock().unwrap_or_else(|error| {
            warn!("recovering engine after a procedure panicked");
            self.connection.clear_poison();
            error.into_inner()
        });
        let transaction = connection.transaction()?;
        let results = {
            let mut context = ProcedureContext::new(&transaction);
            procedure.run(&mut context, &invocation.parameters)?
        };
        transaction.commit()?;

        debug!("{} returned {} tables", procedure.name(), results.len());
        Ok(results)
    }
}

/// Execute one statement and collect its rows. Statements without result
/// columns yield a single-row table holding the number of modified rows.
pub(crate) fn execute_statement(
    connection: &rusqlite::Connection,
    sql: &str,
    parameters: &[Value],
) -> Result<ResultTable> {
    let mut statement = connection.prepare(sql)?;
    let declared: Vec<(String, Option<ColumnType>)> = statement
        .columns()
        .iter()
        .map(|column| {
            let column_type = column.decl_type().and_then(affinity);
            (column.name().to_string(), column_type)
        })
        .collect();

    let parameters = parameters.iter().map(to_sqlite);
    let mut query_rows = statement.query(rusqlite::params_from_iter(parameters))?;
    let mut rows = Vec::new();
    while let Some(query_row) = query_rows.next()? {
        let mut row = Vec::with_capacity(declared.len());
        for index in 0..declared.len() {
            row.push(convert_to_value(query_row.get_ref(index)?)?);
        }
        rows.push(row);
    }

    if declared.is_empty() {
        let modified = i64::try_from(connection.changes()).unwrap_or(i64::MAX);
        let columns = vec![Column::new(MODIFIED_TUPLES, ColumnType::BigInt)];
        return Ok(ResultTable::new(columns, vec![vec![Value::I64(modified)]]));
    }

    let columns = declared
        .into_iter()
        .enumerate()
        .map(|(index, (name, column_type))| {
            let column_type = column_type
                .or_else(|| {
                    rows.iter()
                        .find_map(|row: &Vec<Value>| ColumnType::of(&row[index]))
                })
                .unwrap_or(ColumnType::String);
            Column::new(name, column_type)
        })
        .collect();
    Ok(ResultTable::new(columns, rows))
}

/// Column type for a declared SQLite type, following SQLite's affinity
/// rules. `None` for numeric affinity, whose storage class varies per value.
fn affinity(declared_type: &str) -> Option<ColumnType> {
    let declared_type = declared_type.to_uppercase();
    if declared_type.contains("INT") {
        Some(ColumnType::BigInt)
    } else if ["CHAR", "CLOB", "TEXT"]
        .iter()
        .any(|name| declared_type.contains(name))
    {
        Some(ColumnType::String)
    } else if declared_type.contains("BLOB") || declared_type.is_empty() {
        Some(ColumnType::VarBinary)
    } else if ["REAL", "FLOA", "DOUB"]
        .iter()
        .any(|name| declared_type.contains(name))
    {
        Some(ColumnType::Float)
    } else {
        None
    }
}

fn to_sqlite(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as SqliteValue;

    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(value) => SqliteValue::Integer(i64::from(*value)),
        Value::Bytes(value) => SqliteValue::Blob(value.clone()),
        Value::I8(value) => SqliteValue::Integer(i64::from(*value)),
        Value::I16(value) => SqliteValue::Integer(i64::from(*value)),
        Value::I32(value) => SqliteValue::Integer(i64::from(*value)),
        Value::I64(value) => SqliteValue::Integer(*value),
        Value::F64(value) => SqliteValue::Real(*value),
        Value::String(value) => SqliteValue::Text(value.clone()),
    }
}

fn convert_to_value(value: ValueRef<'_>) -> Result<Value> {
    let value = match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => Value::I64(value),
        ValueRef::Real(value) => Value::F64(value),
        ValueRef::Text(value) => {
            let value = String::from_utf8(value.to_vec())
                .map_err(|error| EngineError(error.to_string()))?;
            Value::String(value)
        }
        ValueRef::Blob(value) => Value::Bytes(value.to_vec()),
    };
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Procedure, SqlStmt};
    use std::sync::Arc;
    use test_log::test;

    const INSERT_STMT: SqlStmt =
        SqlStmt::new("INSERT INTO HELLOWORLD (HELLO, WORLD, DIALECT) VALUES (?, ?, ?)");

    #[derive(Debug)]
    struct InsertThenFail;

    impl Procedure for InsertThenFail {
        fn name(&self) -> &'static str {
            "InsertThenFail"
        }

        fn partitioning(&self) -> Partitioning {
            Partitioning::SinglePartition { parameter: 0 }
        }

        fn run(
            &self,
            context: &mut ProcedureContext<'_>,
            parameters: &[Value],
        ) -> Result<Vec<ResultTable>> {
            context.queue_sql(
                &INSERT_STMT,
                vec![Value::from("Hello"), Value::from("World"), parameters[0].clone()],
            );
            context.execute_sql()?;
            Err(crate::Error::UserAbort("changed my mind".to_string()))
        }
    }

    #[derive(Debug)]
    struct Panic;

    impl Procedure for Panic {
        fn name(&self) -> &'static str {
            "Panic"
        }

        fn partitioning(&self) -> Partitioning {
            Partitioning::MultiPartition
        }

        fn run(
            &self,
            context: &mut ProcedureContext<'_>,
            parameters: &[Value],
        ) -> Result<Vec<ResultTable>> {
            context.queue_sql(
                &INSERT_STMT,
                vec![Value::from("Hello"), Value::from("World"), Value::from("English")],
            );
            context.execute_sql()?;
            let dialect = &parameters[5];
            Err(crate::Error::UserAbort(dialect.to_string()))
        }
    }

    fn engine() -> Result<Engine> {
        let connection = rusqlite::Connection::open_in_memory()?;
        connection.execute_batch(
            "CREATE TABLE HELLOWORLD (HELLO VARCHAR(15), WORLD VARCHAR(15), DIALECT VARCHAR(15) NOT NULL)",
        )?;
        let mut registry = ProcedureRegistry::default();
        registry.add(Arc::new(InsertThenFail));
        registry.add(Arc::new(Panic));
        Ok(Engine::new(connection, registry))
    }

    fn count(engine: &Engine) -> Result<i64> {
        let results = engine
            .invoke(&Invocation::new(1, "Results", Vec::new()))
            .into_results()?;
        let row = results[0].row(0).expect("row 0");
        Ok(row.get_i64("COUNT(*)")?)
    }

    #[test]
    fn test_procedure_not_found() -> Result<()> {
        let engine = engine()?;
        let response = engine.invoke(&Invocation::new(5, "Select", vec![Value::from("English")]));

        assert_eq!(response.client_handle(), 5);
        assert_eq!(response.status(), Status::GracefulFailure);
        assert_eq!(response.status_string(), "Procedure Select was not found");
        assert!(response.results().is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_partition_parameter() -> Result<()> {
        let engine = engine()?;
        let response = engine.invoke(&Invocation::new(1, "InsertThenFail", Vec::new()));

        assert_eq!(response.status(), Status::GracefulFailure);
        assert!(response.status_string().contains("partitioned on parameter 0"));
        Ok(())
    }

    #[test]
    fn test_user_abort_rolls_back() -> Result<()> {
        let engine = engine()?;
        let response = engine.invoke(&Invocation::new(
            2,
            "InsertThenFail",
            vec![Value::from("English")],
        ));

        assert_eq!(response.status(), Status::UserAbort);
        assert_eq!(response.status_string(), "changed my mind");
        assert_eq!(count(&engine)?, 0);
        Ok(())
    }

    #[test]
    fn test_recovers_after_procedure_panic() -> Result<()> {
        let engine = engine()?;

        let panicked = std::thread::scope(|scope| {
            scope
                .spawn(|| engine.invoke(&Invocation::new(3, "Panic", Vec::new())))
                .join()
                .is_err()
        });
        assert!(panicked);

        let response = engine.invoke(&Invocation::new(4, "Results", Vec::new()));
        assert_eq!(response.status(), Status::Success);
        assert_eq!(count(&engine)?, 0);
        Ok(())
    }

    #[test]
    fn test_open_file() -> Result<()> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("volt.sqlite3");
        {
            let connection = rusqlite::Connection::open(&path)?;
            connection.execute_batch(
                "CREATE TABLE HELLOWORLD (HELLO TEXT, WORLD TEXT, DIALECT TEXT);
                 INSERT INTO HELLOWORLD VALUES ('Hello', 'World', 'English');",
            )?;
        }

        let engine = Engine::open(&path, ProcedureRegistry::default())?;

        assert_eq!(count(&engine)?, 1);
        Ok(())
    }

    #[test]
    fn test_column_types() -> Result<()> {
        let connection = rusqlite::Connection::open_in_memory()?;
        connection.execute_batch(
            "CREATE TABLE t (i INTEGER, s VARCHAR(10), r DOUBLE, b BLOB, n NUMERIC);
             INSERT INTO t VALUES (1, 'a', 1.5, x'2a', 2);",
        )?;

        let table = execute_statement(&connection, "SELECT i, s, r, b, n, NULL AS x FROM t", &[])?;

        let column_types: Vec<ColumnType> =
            table.columns().iter().map(Column::column_type).collect();
        assert_eq!(
            column_types,
            [
                ColumnType::BigInt,
                ColumnType::String,
                ColumnType::Float,
                ColumnType::VarBinary,
                ColumnType::BigInt,
                ColumnType::String,
            ]
        );
        assert_eq!(
            table.row(0).expect("row 0").values(),
            [
                Value::I64(1),
                Value::from("a"),
                Value::F64(1.5),
                Value::Bytes(vec![42]),
                Value::I64(2),
                Value::Null,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parameters_are_bound() -> Result<()> {
        let connection = rusqlite::Connection::open_in_memory()?;

        let table = execute_statement(
            &connection,
            "SELECT ? AS s, ? AS i, ? AS f, ? AS b, ? AS n",
            &[
                Value::from("Monde"),
                Value::I16(7),
                Value::F64(0.25),
                Value::Bool(true),
                Value::Null,
            ],
        )?;

        assert_eq!(
            table.row(0).expect("row 0").values(),
            [
                Value::from("Monde"),
                Value::I64(7),
                Value::F64(0.25),
                Value::I64(1),
                Value::Null,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_affinity() {
        assert_eq!(affinity("BIGINT"), Some(ColumnType::BigInt));
        assert_eq!(affinity("varchar(15)"), Some(ColumnType::String));
        assert_eq!(affinity("REAL"), Some(ColumnType::Float));
        assert_eq!(affinity("BLOB"), Some(ColumnType::VarBinary));
        assert_eq!(affinity("NUMERIC"), None);
        assert_eq!(affinity("DECIMAL(10,2)"), None);
    }
}
