//! Process-wide tracing setup, resolved once from the configuration

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::application::errors::ConfigError;
use crate::infrastructure::config::{Config, LogFormat};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level
pub fn env_filter(config: &Config) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.loglevel)
        .map_err(|e| ConfigError::InvalidValue(format!("loglevel '{}': {}", config.loglevel, e)))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &Config) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match &config.logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::InvalidValue(format!("logfile {}: {}", path.display(), e)))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match config.logformat {
                LogFormat::Full => builder.init(),
                LogFormat::Compact => builder.compact().init(),
            }
        }
        None => {
            let builder = builder.with_writer(std::io::stderr);
            match config.logformat {
                LogFormat::Full => builder.init(),
                LogFormat::Compact => builder.compact().init(),
            }
        }
    }

    Ok(())
}

/// Log output written while a test runs, readable afterwards
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CapturedLog(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CapturedLog {
    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish()
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_accepted() {
        let config = Config {
            loglevel: "debug".to_string(),
            ..Config::default()
        };
        assert!(env_filter(&config).is_ok());
    }
}
