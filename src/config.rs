// Parser configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// How individual frame sizes are decoded.
///
/// The outer tag size is always synchsafe. Frame sizes are plain big-endian
/// by default, which matches cached chapter data produced by older readers
/// but overstates sizes for real ID3v2.4 frames larger than 127 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSizeEncoding {
    #[default]
    Plain,
    Synchsafe,
    /// Synchsafe for ID3v2.4 and later, plain otherwise
    ByVersion,
}

impl FrameSizeEncoding {
    /// Whether frame sizes should be synchsafe-decoded for a tag of `major` version
    pub fn is_synchsafe(&self, major: u8) -> bool {
        match self {
            FrameSizeEncoding::Plain => false,
            FrameSizeEncoding::Synchsafe => true,
            FrameSizeEncoding::ByVersion => major >= 4,
        }
    }
}

/// Options controlling how a tag body is walked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub frame_size: FrameSizeEncoding,
    /// Maximum CHAP nesting depth; deeper chapters keep no sub-frames
    pub max_depth: usize,
    pub skip_extended_header: bool,
    /// Stop at the first frame whose ID is all zero bytes
    pub stop_at_padding: bool,
    /// Stable-sort chapters by start time when building the index
    pub sort_chapters: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            frame_size: FrameSizeEncoding::Plain,
            max_depth: 16,
            skip_extended_header: true,
            stop_at_padding: true,
            sort_chapters: true,
        }
    }
}

impl ParseOptions {
    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
