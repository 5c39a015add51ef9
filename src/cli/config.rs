// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use podchapters::{FrameSizeEncoding, ParseOptions};

use super::CliResult;

/// Podchapters - podcast chapter CLI tool
#[derive(Parser, Debug)]
#[command(name = "podchapters")]
#[command(about = "Read chapters, titles, images and links from ID3v2-tagged podcast audio", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Parser options as JSON
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How frame sizes are decoded (overrides the config file)
    #[arg(long, value_enum, global = true)]
    pub frame_size: Option<FrameSizeArg>,

    /// Maximum chapter nesting depth (overrides the config file)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrameSizeArg {
    Plain,
    Synchsafe,
    ByVersion,
}

impl From<FrameSizeArg> for FrameSizeEncoding {
    fn from(arg: FrameSizeArg) -> Self {
        match arg {
            FrameSizeArg::Plain => FrameSizeEncoding::Plain,
            FrameSizeArg::Synchsafe => FrameSizeEncoding::Synchsafe,
            FrameSizeArg::ByVersion => FrameSizeEncoding::ByVersion,
        }
    }
}

/// Where a fallback description comes from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DescriptionArgs {
    /// Episode description to mine for timestamps when no chapters are embedded
    #[arg(short, long, conflicts_with = "description_file")]
    pub description: Option<String>,

    /// Read the fallback description from a file
    #[arg(long, value_name = "FILE")]
    pub description_file: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List chapters in audio file(s)
    Chapters {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        #[command(flatten)]
        description: DescriptionArgs,

        /// Include chapter images as base64 in the output
        #[arg(long)]
        include_images: bool,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show tag header and frame information
    Info {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Show per-frame details
        #[arg(short = 'D', long)]
        detailed: bool,
    },

    /// Show the chapter at a playback position
    At {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Playback position in seconds
        #[arg(short, long)]
        seconds: f64,

        #[command(flatten)]
        description: DescriptionArgs,
    },

    /// Replay a sequence of playback positions and print chapter changes
    Follow {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Positions in seconds (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        positions: Vec<f64>,

        #[command(flatten)]
        description: DescriptionArgs,
    },

    /// Export chapter images
    ExportImages {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Output directory for images
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List chapters for every file matching a pattern
    Batch {
        /// Directory path
        #[arg(short, long)]
        directory: String,

        /// File pattern (e.g., "*.mp3")
        #[arg(short, long, default_value = "*.mp3")]
        pattern: String,
    },
}

impl Config {
    /// Parser options from the config file, then command-line overrides
    pub fn parse_options(&self) -> CliResult<ParseOptions> {
        let mut options = match &self.config {
            Some(path) => ParseOptions::from_json_file(path)?,
            None => ParseOptions::default(),
        };

        if let Some(frame_size) = self.frame_size {
            options.frame_size = frame_size.into();
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }

        Ok(options)
    }
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Chapters { .. } => "chapters",
            Commands::Info { .. } => "info",
            Commands::At { .. } => "at",
            Commands::Follow { .. } => "follow",
            Commands::ExportImages { .. } => "export-images",
            Commands::Batch { .. } => "batch",
        }
    }
}

impl DescriptionArgs {
    /// Resolve the description text, reading the file if one was given
    pub fn text(&self) -> CliResult<Option<String>> {
        if let Some(text) = &self.description {
            return Ok(Some(text.clone()));
        }
        match &self.description_file {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}
