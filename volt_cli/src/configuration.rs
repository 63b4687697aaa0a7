use anyhow::{Result, bail};
use config::{Config, FileFormat};
use dirs::home_dir;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use volt_driver::DEFAULT_PORT;

pub(crate) static DEFAULT_CONFIG: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/volt-hello.toml"
));

/// A builder for creating a [Configuration] instance.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationBuilder {
    configuration: Configuration,
}

impl ConfigurationBuilder {
    pub fn new<S: Into<String>>(program_name: S, version: S) -> Self {
        let mut configuration = Configuration::default();
        configuration.program_name = program_name.into();
        configuration.version = version.into();

        Self { configuration }
    }

    /// Initialize configuration from the configuration file in the user's
    /// home directory (e.g. `~/.volt-hello/volt-hello.toml`), or the current
    /// working directory when there is no home directory. A missing file
    /// leaves the defaults in place.
    ///
    /// # Errors
    /// * If the configuration file or environment holds invalid values
    pub fn with_config(self) -> Result<Self> {
        let home_dir = home_dir().unwrap_or_else(|| env::current_dir().unwrap_or_default());
        let config_dir = home_dir.join(format!(".{}", &self.configuration.program_name));
        self.with_config_dir(config_dir)
    }

    /// Initialize configuration from `<config_dir>/<program_name>.toml`,
    /// layered over the embedded defaults and under `VOLT_HELLO_*`
    /// environment variables.
    ///
    /// # Errors
    /// * If the configuration file or environment holds invalid values
    pub fn with_config_dir<P: Into<PathBuf>>(mut self, config_dir: P) -> Result<Self> {
        let config_dir = config_dir.into();
        self.configuration.config_dir = Some(config_dir.clone());
        let config_file = ConfigFile::new(&self.configuration.program_name, &config_dir)?;
        config_file.load_configuration(&mut self.configuration)?;
        Ok(self)
    }

    /// Set the host to connect to.
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.configuration.host = host.into();
        self
    }

    /// Set the port used when the host names none.
    pub fn with_port(mut self, port: u16) -> Self {
        self.configuration.port = port;
        self
    }

    /// Set the log level to use.
    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.configuration.log_level = log_level;
        self
    }

    /// Set the log directory to use.
    pub fn with_log_dir<P: Into<PathBuf>>(mut self, log_dir: P) -> Self {
        self.configuration.log_dir = Some(log_dir.into());
        self
    }

    /// Set the log rotation to use.
    pub fn with_log_rotation(mut self, log_rotation: Rotation) -> Self {
        self.configuration.log_rotation = log_rotation;
        self
    }

    /// Build a [Configuration] instance and install the file logger when
    /// logging is enabled.
    ///
    /// # Errors
    /// * If the log file appender cannot be created
    pub fn build(self) -> Result<Configuration> {
        let configuration = &self.configuration;

        if let (Some(level), Some(log_dir)) = (
            configuration.log_level.into_level(),
            configuration.log_dir.clone(),
        ) {
            let file_appender = RollingFileAppender::builder()
                .rotation(configuration.log_rotation.clone())
                .filename_prefix(&configuration.program_name)
                .build(log_dir)?
                .with_max_level(level);

            let _ = tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(file_appender),
                )
                .try_init();
        }

        Ok(self.configuration)
    }
}

/// The configuration for the application.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub program_name: String,
    pub version: String,
    pub config_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub log_level: LevelFilter,
    pub log_dir: Option<PathBuf>,
    pub log_rotation: Rotation,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            program_name: String::new(),
            version: String::new(),
            config_dir: None,
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            log_level: LevelFilter::OFF,
            log_dir: None,
            log_rotation: Rotation::DAILY,
        }
    }
}

/// The configuration file for the application.
#[derive(Clone, Debug)]
struct ConfigFile {
    config_dir: PathBuf,
    config: Config,
}

impl ConfigFile {
    fn new<S: AsRef<str>, P: Into<PathBuf>>(program_name: S, config_dir: P) -> Result<ConfigFile> {
        let program_name = program_name.as_ref();
        let config_dir = config_dir.into();
        let configuration_file = config_dir.join(format!("{program_name}.toml"));
        let conf_file = configuration_file.to_string_lossy();
        debug!("Configuration file: {conf_file}");

        let prefix = program_name.to_uppercase().replace('-', "_");
        debug!("Configuration environment prefix: {prefix}");

        let config = Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(config::File::new(&conf_file, FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix(prefix.as_str()).separator("_"))
            .build()?;

        Ok(Self { config_dir, config })
    }

    fn load_configuration(&self, configuration: &mut Configuration) -> Result<()> {
        let config = &self.config;

        configuration.host = config.get::<String>("connection.host")?;
        configuration.port = config.get::<u16>("connection.port")?;

        if let Ok(log_level) = config.get::<String>("log.level") {
            configuration.log_level = LevelFilter::from_str(log_level.as_str())?;
        }

        configuration.log_dir = Some(self.config_dir.join("logs"));

        configuration.log_rotation = match config.get::<String>("log.rotation")?.as_str() {
            "minutely" => Rotation::MINUTELY,
            "hourly" => Rotation::HOURLY,
            "daily" => Rotation::DAILY,
            "never" => Rotation::NEVER,
            rotation => bail!("Invalid log.rotation: {rotation}"),
        };

        Ok(())
    }
}
