#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{ArgAction, ArgGroup, Parser};
use std::io;
use std::num::NonZeroUsize;
use tracing::{Instrument, Span, info, info_span};
use tracing_subscriber::EnvFilter;
use volt_bench::{Benchmark, Workload};
use volt_driver::DEFAULT_PORT;

#[derive(Debug, Parser)]
#[command(
    name = "volt-bench",
    version,
    about = "Benchmark a volt procedure host",
    disable_help_flag = true,
    group(ArgGroup::new("workload").required(true).multiple(true).args(["write", "read", "results"]))
)]
struct Args {
    /// Number of loops each worker runs
    #[arg(short = 'c', long, default_value_t = 10_000)]
    loops: u64,

    /// Procedure host, optionally with a `:port` suffix
    #[arg(short = 'h', long, default_value = "localhost", env = "VOLT_BENCH_HOST")]
    host: String,

    /// Port used when the host does not name one
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "VOLT_BENCH_PORT")]
    port: u16,

    /// Number of parallel workers [default: number of cores]
    #[arg(short = 'f', long, value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// Call Insert(hello, world, language)
    #[arg(short, long)]
    write: bool,

    /// Call Select(language)
    #[arg(short, long)]
    read: bool,

    /// Call Results()
    #[arg(long)]
    results: bool,

    /// Use sequential h<n>/w<n>/l<n> values so reads find earlier writes
    #[arg(short, long)]
    numeric: bool,

    /// Log a worker lap every this many transactions
    #[arg(short = 'l', long, default_value_t = 10_000, value_parser = clap::value_parser!(u64).range(1..))]
    lograte: u64,

    /// Number of recent transactions averaged in lap logs
    #[arg(short = 'a', long, default_value_t = 1_000_000)]
    logaverage: u64,

    /// Machine id added to log lines
    #[arg(short, long)]
    id: Option<String>,

    /// Only log totals
    #[arg(short, long)]
    quiet: bool,

    /// Debug output
    #[arg(short, long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    fn benchmark(&self) -> Benchmark {
        let workloads = [
            (self.write, Workload::Write),
            (self.read, Workload::Read),
            (self.results, Workload::Results),
        ]
        .into_iter()
        .filter_map(|(selected, workload)| selected.then_some(workload))
        .collect();
        let workers = self.workers.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
            u64::try_from(cores).unwrap_or(1)
        });

        Benchmark {
            host: self.host.clone(),
            port: self.port,
            workers,
            loops: self.loops,
            workloads,
            numeric: self.numeric,
            lap: self.lograte,
            average: self.logaverage,
            quiet: self.quiet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("VOLT_BENCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let span = match &args.id {
        Some(id) => info_span!("volt-bench", id = %id),
        None => Span::none(),
    };
    execute(&args, &mut io::stdout()).instrument(span).await
}

async fn execute(args: &Args, output: &mut dyn io::Write) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    info!("volt-bench/{version} initialized");
    let summary = args.benchmark().run().await?;
    writeln!(output, "{summary}")?;
    info!("volt-bench/{version} completed");
    Ok(())
}
