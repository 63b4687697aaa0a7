use crate::Error::EmptyResult;
use crate::error::Result;
use std::fmt::{Display, Formatter};
use std::io;
use tracing::{debug, instrument, warn};
use volt_driver::{Connection, ResultTable, TcpConnection, Value, call};

/// Procedure that looks up the greeting for a language
pub const SELECT_PROCEDURE: &str = "Select";

/// The two words of a greeting, as stored for one language
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Greeting {
    hello: String,
    world: String,
}

impl Greeting {
    pub fn new<S: Into<String>>(hello: S, world: S) -> Self {
        Self {
            hello: hello.into(),
            world: world.into(),
        }
    }

    #[must_use]
    pub fn hello(&self) -> &str {
        &self.hello
    }

    #[must_use]
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Read the greeting from the first row of `table`; any further rows
    /// are ignored.
    ///
    /// # Errors
    /// * [`EmptyResult`] if the table has no rows
    /// * [`DriverError`](crate::Error::DriverError) if the `hello` or `world`
    ///   column is missing or not a string
    pub fn from_table(table: &ResultTable) -> Result<Greeting> {
        let row = table.row(0).ok_or(EmptyResult)?;
        let hello = row.get_string("hello")?;
        let world = row.get_string("world")?;
        Ok(Greeting::new(hello, world))
    }
}

impl Display for Greeting {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}!", self.hello, self.world)
    }
}

/// Call [`SELECT_PROCEDURE`] for `language` and read the greeting it returns.
///
/// # Errors
/// * [`DriverError`](crate::Error::DriverError) if the call fails or returns
///   a non-success status
/// * [`EmptyResult`] unless the first result table holds exactly one row
#[instrument(level = "debug", skip(connection))]
pub async fn fetch(connection: &mut dyn Connection, language: &str) -> Result<Greeting> {
    let results = call(connection, SELECT_PROCEDURE, &[Value::from(language)]).await?;
    let table = match results.first() {
        Some(table) if table.row_count() == 1 => table,
        Some(table) => {
            debug!("expected one row, received {}", table.row_count());
            return Err(EmptyResult);
        }
        None => return Err(EmptyResult),
    };
    Greeting::from_table(table)
}

/// Write the outcome of a greeting request. The greeting and the fallback
/// message go to `stdout`; every other failure goes to `stderr`.
///
/// Returns `true` only when a greeting was written.
///
/// # Errors
/// * If either writer fails
pub fn render(
    result: &Result<Greeting>,
    stdout: &mut dyn io::Write,
    stderr: &mut dyn io::Write,
) -> io::Result<bool> {
    match result {
        Ok(greeting) => {
            writeln!(stdout, "{greeting}")?;
            Ok(true)
        }
        Err(error @ EmptyResult) => {
            writeln!(stdout, "{error}")?;
            Ok(false)
        }
        Err(error) => {
            writeln!(stderr, "{error}")?;
            Ok(false)
        }
    }
}

/// Connect to `host`, ask for the greeting in `language` and render it.
///
/// # Errors
/// * If writing to `stdout` or `stderr` fails
pub async fn execute(
    host: &str,
    port: u16,
    language: &str,
    stdout: &mut dyn io::Write,
    stderr: &mut dyn io::Write,
) -> io::Result<bool> {
    let result = greet(host, port, language).await;
    render(&result, stdout, stderr)
}

async fn greet(host: &str, port: u16, language: &str) -> Result<Greeting> {
    let mut connection = TcpConnection::connect(host, port).await?;
    let result = fetch(&mut connection, language).await;
    if let Err(error) = connection.close().await {
        warn!("failed to close connection: {error}");
    }
    result
}
