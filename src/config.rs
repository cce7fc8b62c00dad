//! Run configuration for the `sml` binary.
//!
//! Built from command-line arguments, with defaults taken from the
//! environment:
//! - `SML_LOG`: default log level (`debug`, `info`, `warn`, `error`)
//! - `SML_DIR`: directory program paths are resolved against

use crate::utils::log::Level;
use crate::virtual_machine::errors::SmlError;
use std::path::PathBuf;

pub const ENV_LOG: &str = "SML_LOG";
pub const ENV_DIR: &str = "SML_DIR";

/// What the binary was asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Program file as given on the command line.
    pub source: PathBuf,
    /// Directory `source` is resolved against, if any.
    pub source_dir: Option<PathBuf>,
    /// Suppress the listing and register dump; only `out` values are printed.
    pub quiet: bool,
    pub log_level: Level,
}

impl Config {
    /// Parses arguments (without the program name).
    ///
    /// `env` looks up environment variables; the binary passes
    /// `|k| std::env::var(k).ok()`.
    pub fn from_args<I, F>(args: I, env: F) -> Result<Command, SmlError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut source = None;
        let mut source_dir = env(ENV_DIR).map(PathBuf::from);
        let mut quiet = false;
        let mut log_level = match env(ENV_LOG) {
            Some(v) => v.parse::<Level>().map_err(SmlError::Config)?,
            None => Level::Info,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                k @ ("-d" | "--dir") => {
                    let dir = args
                        .next()
                        .ok_or_else(|| SmlError::Config(format!("{k} requires an argument")))?;
                    source_dir = Some(PathBuf::from(dir));
                }
                "-t" | "--trace" => log_level = Level::Debug,
                "-q" | "--quiet" => quiet = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(SmlError::Config(format!("unexpected argument: {flag}")));
                }
                path => {
                    if source.is_some() {
                        return Err(SmlError::Config(format!("unexpected argument: {path}")));
                    }
                    source = Some(PathBuf::from(path));
                }
            }
        }

        let source =
            source.ok_or_else(|| SmlError::Config("missing program file".to_string()))?;
        Ok(Command::Run(Config {
            source,
            source_dir,
            quiet,
            log_level,
        }))
    }

    /// Path of the program file, joined onto the source directory when set.
    /// Absolute paths are used as given.
    pub fn program_path(&self) -> PathBuf {
        match &self.source_dir {
            Some(dir) => dir.join(&self.source),
            None => self.source.clone(),
        }
    }
}
