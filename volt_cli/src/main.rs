#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::info;
use volt_cli::configuration::ConfigurationBuilder;
use volt_cli::greeting;

#[derive(Debug, Parser)]
#[command(name = "volt-hello", version, about = "Say hello in the language of your choice")]
struct Args {
    /// Language to say hello in (e.g. French)
    language: String,

    /// Host of the procedure server, optionally with a `:port` suffix
    #[arg(long, env = "VOLT_HELLO_HOST")]
    host: Option<String>,

    /// Port used when the host does not name one
    #[arg(long, env = "VOLT_HELLO_PORT")]
    port: Option<u16>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    match execute(&args, &mut io::stdout(), &mut io::stderr()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(
    args: &Args,
    stdout: &mut dyn io::Write,
    stderr: &mut dyn io::Write,
) -> Result<bool> {
    let program_name = "volt-hello";
    let version = env!("CARGO_PKG_VERSION");
    let mut builder = ConfigurationBuilder::new(program_name, version).with_config()?;
    if let Some(host) = &args.host {
        builder = builder.with_host(host.as_str());
    }
    if let Some(port) = args.port {
        builder = builder.with_port(port);
    }
    let configuration = builder.build()?;

    info!("{program_name}/{version} initialized");
    let greeted = greeting::execute(
        &configuration.host,
        configuration.port,
        &args.language,
        stdout,
        stderr,
    )
    .await?;
    info!("{program_name}/{version} completed");
    Ok(greeted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_is_required() {
        assert!(Args::try_parse_from(["volt-hello"]).is_err());
    }

    #[test]
    fn test_single_language() {
        assert!(Args::try_parse_from(["volt-hello", "French", "German"]).is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "volt-hello",
            "French",
            "--host",
            "db.example.com",
            "--port",
            "3000",
        ])
        .expect("args");
        assert_eq!(args.language, "French");
        assert_eq!(args.host.as_deref(), Some("db.example.com"));
        assert_eq!(args.port, Some(3000));
    }

    #[test]
    fn test_invalid_port() {
        assert!(Args::try_parse_from(["volt-hello", "French", "--port", "x"]).is_err());
    }
}
