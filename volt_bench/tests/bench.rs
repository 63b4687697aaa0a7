use indoc::indoc;
use std::net::SocketAddr;
use std::process::Command;
use std::sync::Arc;
use test_log::test;
use volt_bench::{Benchmark, Error, Workload};
use volt_driver::{Connection, ResultTable, TcpConnection, Value, call};
use volt_server::{
    Engine, Partitioning, Procedure, ProcedureContext, ProcedureRegistry, Server, SqlStmt,
    expect_parameters,
};

const SCHEMA: &str = indoc! {"
    CREATE TABLE HELLOWORLD (
        HELLO VARCHAR(20),
        WORLD VARCHAR(20),
        DIALECT VARCHAR(20) NOT NULL PRIMARY KEY
    );
"};

const SELECT_STMT: SqlStmt = SqlStmt::new("SELECT HELLO, WORLD FROM HELLOWORLD WHERE DIALECT = ?");

#[derive(Debug)]
struct Select;

impl Procedure for Select {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn partitioning(&self) -> Partitioning {
        Partitioning::SinglePartition { parameter: 0 }
    }

    fn run(
        &self,
        context: &mut ProcedureContext<'_>,
        parameters: &[Value],
    ) -> volt_server::Result<Vec<ResultTable>> {
        expect_parameters(self.name(), parameters, 1)?;
        context.queue_sql(&SELECT_STMT, parameters.to_vec());
        context.execute_sql()
    }
}

async fn start(with_select: bool) -> anyhow::Result<SocketAddr> {
    let connection = rusqlite::Connection::open_in_memory()?;
    connection.execute_batch(SCHEMA)?;
    let mut registry = ProcedureRegistry::default();
    if with_select {
        registry.add(Arc::new(Select));
    }
    let server = Server::bind("127.0.0.1:0", Engine::new(connection, registry)).await?;
    let address = server.local_addr()?;
    tokio::spawn(server.run());
    Ok(address)
}

fn benchmark(address: SocketAddr, workloads: Vec<Workload>) -> Benchmark {
    Benchmark {
        host: address.to_string(),
        workers: 2,
        loops: 25,
        workloads,
        numeric: true,
        lap: 10,
        quiet: true,
        ..Benchmark::default()
    }
}

async fn row_count(address: SocketAddr) -> anyhow::Result<i64> {
    let mut connection = TcpConnection::connect(&address.to_string(), 0).await?;
    let results = call(&mut connection, "Results", &[]).await?;
    connection.close().await?;
    Ok(results[0].row(0).expect("row 0").get_i64("COUNT(*)")?)
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_writes() -> anyhow::Result<()> {
    let address = start(false).await?;

    let summary = benchmark(address, vec![Workload::Write]).run().await?;

    assert_eq!(summary.workers().len(), 2);
    assert_eq!(summary.transactions(), 50);
    assert_eq!(summary.failures(), 0);
    assert_eq!(row_count(address).await?, 50);
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_reads_find_numeric_writes() -> anyhow::Result<()> {
    let address = start(true).await?;

    let summary = benchmark(address, vec![Workload::Write, Workload::Read])
        .run()
        .await?;

    assert_eq!(summary.transactions(), 100);
    assert_eq!(summary.failures(), 0);
    let mut connection = TcpConnection::connect(&address.to_string(), 0).await?;
    for sequence in [0, 1, 49] {
        let results = call(
            &mut connection,
            "Select",
            &[Value::from(format!("l{sequence}"))],
        )
        .await?;
        let row = results[0].row(0).expect("row 0");
        assert_eq!(row.get_string("hello")?, format!("h{sequence}"));
        assert_eq!(row.get_string("world")?, format!("w{sequence}"));
    }
    connection.close().await?;
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_repeated_numeric_writes_fail() -> anyhow::Result<()> {
    let address = start(false).await?;
    let benchmark = benchmark(address, vec![Workload::Write]);

    let _ = benchmark.run().await?;
    let summary = benchmark.run().await?;

    assert_eq!(summary.transactions(), 50);
    assert_eq!(summary.failures(), 50);
    assert_eq!(row_count(address).await?, 50);
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_random_writes() -> anyhow::Result<()> {
    let address = start(false).await?;
    let benchmark = Benchmark {
        numeric: false,
        ..benchmark(address, vec![Workload::Write])
    };

    let summary = benchmark.run().await?;

    assert_eq!(summary.transactions(), 50);
    let inserted = row_count(address).await?;
    assert_eq!(
        inserted + i64::try_from(summary.failures())?,
        50
    );
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_results() -> anyhow::Result<()> {
    let address = start(false).await?;

    let summary = benchmark(address, vec![Workload::Results]).run().await?;

    assert_eq!(summary.transactions(), 50);
    assert_eq!(summary.failures(), 0);
    assert_eq!(row_count(address).await?, 0);
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_reads_without_select() -> anyhow::Result<()> {
    let address = start(false).await?;

    let summary = benchmark(address, vec![Workload::Read]).run().await?;

    assert_eq!(summary.transactions(), 50);
    assert_eq!(summary.failures(), 50);
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_connection_refused() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?;
    drop(listener);

    let error = benchmark(address, vec![Workload::Write])
        .run()
        .await
        .expect_err("connection refused");

    assert!(matches!(
        error,
        Error::DriverError(volt_driver::Error::ConnectionError { .. })
    ));
    Ok(())
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn test_volt_bench_binary() -> anyhow::Result<()> {
    let address = start(false).await?;
    let args = vec![
        "-h".to_string(),
        address.to_string(),
        "-c".to_string(),
        "10".to_string(),
        "-f".to_string(),
        "2".to_string(),
        "-w".to_string(),
        "-n".to_string(),
        "-q".to_string(),
    ];

    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_volt-bench"))
            .args(args)
            .env_remove("VOLT_BENCH_HOST")
            .env_remove("VOLT_BENCH_PORT")
            .output()
    })
    .await??;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("Total: "));
    assert!(stdout.contains("(20 transactions, 0 failed)"));
    assert_eq!(row_count(address).await?, 20);
    Ok(())
}
