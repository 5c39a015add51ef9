// A loaded ID3v2 tag and the chapters derived from it

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::chapters::{synthesize_chapters, ChapterIndex};
use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::id3::header::HEADER_SIZE;
use crate::id3::{Chapter, Frame, FrameParser, TagHeader};
use crate::utils::io::ByteSource;

/// Where the chapter index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterSource {
    None,
    Embedded,
    Synthesized,
}

/// Parsed tag: header, frames and chapter index.
///
/// A file without a valid tag loads as an empty `TagFile` rather than an error.
#[derive(Debug, Clone)]
pub struct TagFile {
    header: Option<TagHeader>,
    frames: Vec<Frame>,
    chapters: ChapterIndex,
    chapter_source: ChapterSource,
    sort_chapters: bool,
}

impl TagFile {
    pub fn empty() -> Self {
        TagFile {
            header: None,
            frames: Vec::new(),
            chapters: ChapterIndex::default(),
            chapter_source: ChapterSource::None,
            sort_chapters: ParseOptions::default().sort_chapters,
        }
    }

    /// Read the tag at the start of `source`.
    ///
    /// Read failures are logged and produce an empty tag.
    pub fn load<S: ByteSource>(source: &mut S, options: &ParseOptions) -> Self {
        let head = match source.read_bytes(0, HEADER_SIZE) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to read tag header");
                return Self::empty();
            }
        };

        let Some(header) = TagHeader::decode(&head) else {
            return Self::empty();
        };

        let declared = header.declared_size as usize;
        let body = match source.read_bytes(HEADER_SIZE as u64, declared) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to read tag body");
                Vec::new()
            }
        };
        if body.len() < declared {
            debug!(declared, available = body.len(), "tag body shorter than declared size");
        }

        Self::from_body(header, &body, options)
    }

    pub fn from_bytes(data: &[u8], options: &ParseOptions) -> Self {
        Self::load(&mut Cursor::new(data), options)
    }

    /// Open a file and read its tag
    pub fn open<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }

        let mut reader = BufReader::new(File::open(path)?);
        Ok(Self::load(&mut reader, options))
    }

    fn from_body(header: TagHeader, body: &[u8], options: &ParseOptions) -> Self {
        let skip = if options.skip_extended_header {
            header.extended_header_len(body)
        } else {
            0
        };

        let frames = FrameParser::new(options, header.version_major).parse(&body[skip..]);
        let chapters = ChapterIndex::from_frames(&frames, options.sort_chapters);
        let chapter_source = if chapters.is_empty() {
            ChapterSource::None
        } else {
            ChapterSource::Embedded
        };

        debug!(
            version = %header.version(),
            size = header.declared_size,
            frames = frames.len(),
            chapters = chapters.len(),
            "parsed ID3v2 tag"
        );

        TagFile {
            header: Some(header),
            frames,
            chapters,
            chapter_source,
            sort_chapters: options.sort_chapters,
        }
    }

    /// Fall back to chapters listed in a free-text description.
    ///
    /// Embedded chapters always win. Otherwise any timestamps found in `text`
    /// replace the current chapter list; text without timestamps changes nothing.
    pub fn with_fallback_description(mut self, text: &str) -> Self {
        if self.chapter_source == ChapterSource::Embedded {
            return self;
        }

        let synthesized = synthesize_chapters(text);
        if synthesized.is_empty() {
            return self;
        }

        self.frames.retain(|frame| frame.as_chapter().is_none());
        self.frames.extend(synthesized.iter().cloned().map(Frame::Chapter));
        self.chapters = ChapterIndex::new(synthesized, self.sort_chapters);
        self.chapter_source = ChapterSource::Synthesized;
        self
    }

    pub fn header(&self) -> Option<&TagHeader> {
        self.header.as_ref()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn chapters(&self) -> &ChapterIndex {
        &self.chapters
    }

    pub fn chapter_source(&self) -> ChapterSource {
        self.chapter_source
    }

    pub fn has_chapters(&self) -> bool {
        !self.chapters.is_empty()
    }

    pub fn chapter_at(&self, seconds: f64) -> Option<&Chapter> {
        self.chapters.chapter_at(seconds)
    }

    /// Number of top-level frames per frame ID
    pub fn frame_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for frame in &self.frames {
            *counts.entry(frame.id().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for TagFile {
    fn default() -> Self {
        Self::empty()
    }
}
