use crate::Error::{ColumnNotFound, InvalidColumnType};
use crate::Value;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a result table column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    String,
    VarBinary,
}

impl ColumnType {
    /// Column type matching a value; `None` for [`Value::Null`].
    #[must_use]
    pub fn of(value: &Value) -> Option<ColumnType> {
        let column_type = match value {
            Value::Null => return None,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Bytes(_) => ColumnType::VarBinary,
            Value::I8(_) => ColumnType::TinyInt,
            Value::I16(_) => ColumnType::SmallInt,
            Value::I32(_) => ColumnType::Integer,
            Value::I64(_) => ColumnType::BigInt,
            Value::F64(_) => ColumnType::Float,
            Value::String(_) => ColumnType::String,
        };
        Some(column_type)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::TinyInt => "TINYINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::String => "STRING",
            ColumnType::VarBinary => "VARBINARY",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// An ordered sequence of rows sharing one named, typed column schema.
///
/// Rows are addressed by position; values within a row are addressed by
/// column name through [`Row`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    #[must_use]
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Get the row at `index`, or `None` when the table is shorter.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            table: self,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            table: self,
            values,
        })
    }
}

/// Borrowed view of one row with typed, by-name accessors.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: &'a ResultTable,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Get the value of a column.
    ///
    /// # Errors
    /// * [`ColumnNotFound`] if the table has no such column
    pub fn get(&self, column: &str) -> Result<&'a Value> {
        self.table
            .column_index(column)
            .and_then(|index| self.values.get(index))
            .ok_or_else(|| ColumnNotFound(column.to_string()))
    }

    /// Get a string column; `NULL` is reported as a type error.
    ///
    /// # Errors
    /// * [`ColumnNotFound`] if the table has no such column
    /// * [`InvalidColumnType`] if the value is not a string
    pub fn get_string(&self, column: &str) -> Result<&'a str> {
        let value = self.get(column)?;
        value
            .as_str()
            .ok_or_else(|| invalid_type(column, "string", value))
    }

    /// Get an integer column, widening narrower integer types.
    ///
    /// # Errors
    /// * [`ColumnNotFound`] if the table has no such column
    /// * [`InvalidColumnType`] if the value is not an integer
    pub fn get_i64(&self, column: &str) -> Result<i64> {
        let value = self.get(column)?;
        value
            .as_i64()
            .ok_or_else(|| invalid_type(column, "integer", value))
    }

    /// # Errors
    /// * [`ColumnNotFound`] if the table has no such column
    /// * [`InvalidColumnType`] if the value is not a float
    pub fn get_f64(&self, column: &str) -> Result<f64> {
        let value = self.get(column)?;
        value
            .as_f64()
            .ok_or_else(|| invalid_type(column, "float", value))
    }

    /// # Errors
    /// * [`ColumnNotFound`] if the table has no such column
    /// * [`InvalidColumnType`] if the value is not a boolean
    pub fn get_bool(&self, column: &str) -> Result<bool> {
        let value = self.get(column)?;
        value
            .as_bool()
            .ok_or_else(|| invalid_type(column, "bool", value))
    }
}

fn invalid_type(column: &str, expected: &'static str, value: &Value) -> crate::Error {
    InvalidColumnType {
        column: column.to_string(),
        expected,
        actual: value.type_name(),
    }
}
