//! Podchapters - ID3v2 chapter extraction for podcast playback
//!
//! Reads the ID3v2 tag at the start of an audio file, pulls out chapter
//! (`CHAP`), title (`TIT2`), picture (`APIC`) and link (`WXXX`) frames, and
//! tracks which chapter is current as playback moves. Episodes without
//! embedded chapters can fall back to timestamps listed in their description.
//!
//! ```no_run
//! use podchapters::{ChapterStateMachine, ParseOptions, TagFile};
//!
//! let file = TagFile::open("episode.mp3", &ParseOptions::default())?
//!     .with_fallback_description("00:00 Intro 01:30 Main");
//!
//! let mut chapters = ChapterStateMachine::new();
//! chapters.load(file.chapters().clone());
//! if let Some(event) = chapters.on_position_update(95.0) {
//!     println!("now playing: {}", event.title());
//! }
//! # Ok::<(), podchapters::Error>(())
//! ```

pub mod chapters;
pub mod config;
pub mod error;
pub mod id3;
pub mod tag;
pub mod utils;

pub use chapters::{
    synthesize_chapters, ChapterChangedEvent, ChapterIndex, ChapterRef, ChapterStateMachine, CurrentChapter,
};
pub use config::{FrameSizeEncoding, ParseOptions};
pub use error::{Error, Result};
pub use id3::{Chapter, Frame, FrameHeader, Picture, PictureType, TagFlags, TagHeader, Title, UserUrl};
pub use tag::{ChapterSource, TagFile};
pub use utils::io::ByteSource;
