use std::env;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;

use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};

/// level for the terminal logger (`error`, `warn`, `info`, `debug`, `trace`, `off`)
pub const LOG_LEVEL_VAR: &str = "STACKBOUND_LOG";
/// if set, also log to this file
pub const LOG_FILE_VAR: &str = "STACKBOUND_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub term_level: LevelFilter,
    pub file: Option<PathBuf>,
    pub file_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            term_level: LevelFilter::Warn,
            file: None,
            file_level: LevelFilter::Info,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_vars(env::var(LOG_LEVEL_VAR).ok().as_deref(), env::var_os(LOG_FILE_VAR).map(PathBuf::from))
    }
    
    fn from_vars(level: Option<&str>, file: Option<PathBuf>) -> Self {
        let default = Self::default();
        let term_level = level
            .and_then(|l| LevelFilter::from_str(l.trim()).ok())
            .unwrap_or(default.term_level);
        Self { term_level, file, ..default }
    }
}

static INIT: Once = Once::new();

/// Installs a terminal logger (and a file logger, if configured) as the `log` backend.
///
/// Only the first call does anything, later ones return `Ok(())`. If some other
/// logger is already installed it's left alone.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| result = install(config));
    result
}

fn install(config: &LogConfig) -> io::Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(config.term_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
    ];
    if let Some(path) = &config.file {
        loggers.push(WriteLogger::new(config.file_level, Config::default(), File::create(path)?));
    }
    
    if CombinedLogger::init(loggers).is_err() {
        debug!("logger already installed, keeping it");
    }
    Ok(())
}
