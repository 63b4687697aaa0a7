use crate::error::{Error, Result};
use crate::stats::{LapWindow, format_count, tps};
use crate::workload::{Payload, Workload, sequence};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use volt_driver::{Connection, TcpConnection};

/// Settings of one benchmark run
#[derive(Clone, Debug)]
pub struct Benchmark {
    /// Procedure host, optionally with a `:port` suffix
    pub host: String,
    pub port: u16,
    /// Number of parallel workers, each with its own connection
    pub workers: u64,
    /// Loops per worker; every loop issues one call per workload
    pub loops: u64,
    pub workloads: Vec<Workload>,
    /// Use `h<n>`/`w<n>`/`l<n>` sequences instead of random strings
    pub numeric: bool,
    /// Log a lap every this many transactions of a worker
    pub lap: u64,
    /// Transactions covered by the rolling average
    pub average: u64,
    /// Only report totals
    pub quiet: bool,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: volt_driver::DEFAULT_PORT,
            workers: 1,
            loops: 10_000,
            workloads: Vec::new(),
            numeric: false,
            lap: 10_000,
            average: 1_000_000,
            quiet: false,
        }
    }
}

/// What one worker did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: u64,
    pub transactions: u64,
    /// Calls answered with a non-success status
    pub failures: u64,
    pub elapsed: Duration,
}

impl WorkerReport {
    #[must_use]
    pub fn tps(&self) -> u64 {
        tps(self.transactions, self.elapsed)
    }
}

/// Totals of a benchmark run
#[derive(Clone, Debug)]
pub struct Summary {
    workers: Vec<WorkerReport>,
    cores: u64,
}

impl Summary {
    #[must_use]
    pub fn new(workers: Vec<WorkerReport>, cores: u64) -> Self {
        Self {
            workers,
            cores: cores.max(1),
        }
    }

    #[must_use]
    pub fn workers(&self) -> &[WorkerReport] {
        &self.workers
    }

    #[must_use]
    pub fn transactions(&self) -> u64 {
        self.workers.iter().map(|report| report.transactions).sum()
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.workers.iter().map(|report| report.failures).sum()
    }

    /// Sum of the workers' rates
    #[must_use]
    pub fn tps(&self) -> u64 {
        self.workers.iter().map(WorkerReport::tps).sum()
    }

    #[must_use]
    pub fn tps_per_core(&self) -> u64 {
        self.tps() / self.cores
    }

    #[must_use]
    pub fn tps_per_worker(&self) -> u64 {
        let workers = u64::try_from(self.workers.len()).unwrap_or(u64::MAX);
        self.tps().checked_div(workers).unwrap_or(0)
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total: {} TPS = {} TPS/core = {} TPS/worker ({} transactions, {} failed)",
            format_count(self.tps()),
            format_count(self.tps_per_core()),
            format_count(self.tps_per_worker()),
            format_count(self.transactions()),
            format_count(self.failures()),
        )
    }
}

impl Benchmark {
    /// Run every worker to completion while logging the combined rate once
    /// a second.
    ///
    /// # Errors
    /// * [`NoWorkload`](Error::NoWorkload) if no workload is selected
    /// * [`DriverError`](Error::DriverError) if a worker cannot connect or
    ///   loses its connection
    #[instrument(level = "debug", skip(self), fields(host = %self.host))]
    pub async fn run(&self) -> Result<Summary> {
        if self.workloads.is_empty() {
            return Err(Error::NoWorkload);
        }
        let access: Vec<String> = self.workloads.iter().map(ToString::to_string).collect();
        info!("host: {}", self.host);
        info!("access: {}", access.join(" "));
        info!(
            "values: {}",
            if self.numeric {
                "numeric sequences"
            } else {
                "random strings"
            }
        );
        info!("workers: {}", self.workers);

        let completed = Arc::new(AtomicU64::new(0));
        let reporter = tokio::spawn(report(
            Arc::clone(&completed),
            LapWindow::for_rates(self.lap, self.average),
        ));

        let mut tasks = JoinSet::new();
        for worker in 0..self.workers {
            let benchmark = self.clone();
            let completed = Arc::clone(&completed);
            let _ = tasks.spawn(async move { benchmark.work(worker, &completed).await });
        }

        let mut reports = Vec::new();
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(error)) => {
                    warn!("{error}");
                    let _ = failure.get_or_insert(error);
                }
                Err(error) => {
                    let _ = failure.get_or_insert(Error::WorkerFailed(error.to_string()));
                }
            }
        }
        reporter.abort();

        if let Some(error) = failure {
            return Err(error);
        }
        reports.sort_by_key(|report| report.worker);
        Ok(Summary::new(reports, cores()))
    }

    async fn work(&self, worker: u64, completed: &AtomicU64) -> Result<WorkerReport> {
        let mut connection = TcpConnection::connect(&self.host, self.port).await?;
        let mut rng = StdRng::from_entropy();
        let mut window = LapWindow::for_rates(self.lap, self.average);

        let start = Instant::now();
        let mut lap_start = start;
        let mut transactions = 0;
        let mut failures = 0;
        for iteration in 0..self.loops {
            let payload = if self.numeric {
                Payload::numeric(sequence(iteration, self.workers, worker))
            } else {
                Payload::random(&mut rng)
            };

            for workload in &self.workloads {
                let procedure = workload.procedure();
                let response = connection
                    .call_procedure(procedure, &workload.parameters(&payload))
                    .await?;
                if !response.status().is_success() {
                    failures += 1;
                    debug!("{procedure} failed: {}", response.status_string());
                }
                transactions += 1;
                let _ = completed.fetch_add(1, Ordering::Relaxed);

                if self.lap > 0 && transactions % self.lap == 0 {
                    let lap_elapsed = lap_start.elapsed();
                    let lap = window.push(self.lap, lap_elapsed);
                    lap_start = Instant::now();
                    if !self.quiet {
                        info!(
                            worker = worker,
                            "executed {}; last {} in {}ms => {} TPS; last {} in {}ms => {} TPS",
                            format_count(transactions),
                            format_count(self.lap),
                            lap_elapsed.as_millis(),
                            format_count(lap.rate),
                            format_count(lap.window_transactions),
                            lap.window_elapsed.as_millis(),
                            format_count(lap.average),
                        );
                    }
                }
            }
        }
        let elapsed = start.elapsed();

        if let Err(error) = connection.close().await {
            warn!("failed to close connection: {error}");
        }
        let report = WorkerReport {
            worker,
            transactions,
            failures,
            elapsed,
        };
        info!(
            worker = worker,
            "{} transactions in {} milliseconds --> {} TPS",
            format_count(report.transactions),
            format_count(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
            format_count(report.tps()),
        );
        Ok(report)
    }
}

/// Log the combined rate of all workers once a second.
async fn report(completed: Arc<AtomicU64>, mut window: LapWindow) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let _ = interval.tick().await;
    let mut last_count = 0;
    let mut last_tick = Instant::now();
    loop {
        let _ = interval.tick().await;
        let count = completed.load(Ordering::Relaxed);
        let lap = window.push(count - last_count, last_tick.elapsed());
        last_count = count;
        last_tick = Instant::now();
        if lap.rate > 0 {
            info!(
                "{} TPS; {}s avg: {} TPS",
                format_count(lap.rate),
                lap.window_elapsed.as_secs(),
                format_count(lap.average),
            );
        }
    }
}

fn cores() -> u64 {
    let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    u64::try_from(cores).unwrap_or(1)
}
