// CLI module for podchapters
//
// Command-line front end over the library: argument parsing, report
// rendering and the subcommand implementations.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config, OutputFormat};
pub use output::OutputFormatter;

// Error type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::ParseError(e.to_string())
    }
}

impl From<podchapters::Error> for CliError {
    fn from(e: podchapters::Error) -> Self {
        match e {
            podchapters::Error::Io(e) => CliError::IoError(e),
            podchapters::Error::Config(e) => CliError::ParseError(e.to_string()),
            podchapters::Error::InvalidPath(path) => CliError::FileNotFound(path.display().to_string()),
        }
    }
}
