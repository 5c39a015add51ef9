// Ordered chapter list and position lookup

use std::ops::Deref;
use std::sync::Arc;

use crate::id3::{Chapter, Frame};

/// Convert a playback position in seconds to whole milliseconds, rounding up.
///
/// NaN and non-positive positions map to zero.
pub fn position_ms(seconds: f64) -> u32 {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).ceil() as u32
}

/// Chapters of one loaded tag, ascending by start time.
///
/// Cloning is cheap and clones share the same chapters; an index is never
/// modified after it is built.
#[derive(Debug, Clone, Default)]
pub struct ChapterIndex {
    chapters: Arc<Vec<Chapter>>,
}

impl ChapterIndex {
    pub fn new(mut chapters: Vec<Chapter>, sort: bool) -> Self {
        if sort {
            chapters.sort_by_key(|chapter| chapter.start_time_ms);
        }
        ChapterIndex {
            chapters: Arc::new(chapters),
        }
    }

    /// Collect the top-level chapter frames
    pub fn from_frames(frames: &[Frame], sort: bool) -> Self {
        let chapters = frames.iter().filter_map(Frame::as_chapter).cloned().collect();
        Self::new(chapters, sort)
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }

    /// Position of the first chapter containing `ms`
    pub fn position_at_ms(&self, ms: u32) -> Option<usize> {
        self.chapters.iter().position(|chapter| chapter.contains(ms))
    }

    pub fn chapter_at(&self, seconds: f64) -> Option<&Chapter> {
        self.position_at_ms(position_ms(seconds))
            .map(|position| &self.chapters[position])
    }

    pub fn find_by_element_id(&self, element_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.element_id == element_id)
    }

    /// Shared handle to the chapter at `position`
    pub fn get(&self, position: usize) -> Option<ChapterRef> {
        (position < self.chapters.len()).then(|| ChapterRef {
            index: self.clone(),
            position,
        })
    }

    fn same_index(&self, other: &ChapterIndex) -> bool {
        Arc::ptr_eq(&self.chapters, &other.chapters)
    }
}

impl PartialEq for ChapterIndex {
    fn eq(&self, other: &Self) -> bool {
        self.chapters == other.chapters
    }
}

impl Eq for ChapterIndex {}

impl<'a> IntoIterator for &'a ChapterIndex {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A chapter identified by its place in a particular index.
///
/// Two refs are equal only when they point at the same slot of the same
/// index, even if another chapter has identical content.
#[derive(Debug, Clone)]
pub struct ChapterRef {
    index: ChapterIndex,
    position: usize,
}

impl ChapterRef {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn index(&self) -> &ChapterIndex {
        &self.index
    }
}

impl Deref for ChapterRef {
    type Target = Chapter;

    fn deref(&self) -> &Chapter {
        &self.index.chapters[self.position]
    }
}

impl PartialEq for ChapterRef {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.index.same_index(&other.index)
    }
}

impl Eq for ChapterRef {}
