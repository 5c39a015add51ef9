// Current-chapter tracking driven by playback position

use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use super::index::{position_ms, ChapterIndex, ChapterRef};
use crate::id3::Picture;

/// Emitted when playback moves into a different chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterChangedEvent {
    pub chapter: ChapterRef,
    /// Position (ms) that caused the change
    pub position_ms: u32,
}

impl ChapterChangedEvent {
    pub fn title(&self) -> &str {
        self.chapter.title().unwrap_or_default()
    }

    pub fn image(&self) -> Option<&Picture> {
        self.chapter.image()
    }

    pub fn url(&self) -> Option<&str> {
        self.chapter.url()
    }
}

/// Read-only view of the current chapter for another thread.
///
/// The writer swaps in whole values; readers clone out whatever is current.
#[derive(Debug, Clone, Default)]
pub struct CurrentChapter {
    slot: Arc<RwLock<Option<ChapterRef>>>,
}

impl CurrentChapter {
    pub fn get(&self) -> Option<ChapterRef> {
        self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn set(&self, value: Option<ChapterRef>) {
        *self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Empty,
    Indexed {
        index: ChapterIndex,
        current: Option<ChapterRef>,
    },
}

/// Keeps the current chapter in step with playback.
///
/// Positions that fall in a gap between chapters, or past the last bounded
/// chapter, leave the current chapter unchanged.
#[derive(Debug, Default)]
pub struct ChapterStateMachine {
    state: State,
    shared: CurrentChapter,
}

impl ChapterStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new index with no current chapter
    pub fn load(&mut self, index: ChapterIndex) {
        debug!(chapters = index.len(), "loaded chapter index");
        self.state = State::Indexed { index, current: None };
        self.shared.set(None);
    }

    /// Load and immediately resolve the chapter at a resume position
    pub fn load_at(&mut self, index: ChapterIndex, seconds: f64) -> Option<ChapterChangedEvent> {
        self.load(index);
        self.on_position_update(seconds)
    }

    pub fn reset(&mut self) {
        self.state = State::Empty;
        self.shared.set(None);
    }

    pub fn on_position_update(&mut self, seconds: f64) -> Option<ChapterChangedEvent> {
        let State::Indexed { index, current } = &mut self.state else {
            return None;
        };

        let ms = position_ms(seconds);
        let Some(found) = index.position_at_ms(ms).and_then(|position| index.get(position)) else {
            trace!(position_ms = ms, "no chapter at position, keeping current");
            return None;
        };

        if current.as_ref() == Some(&found) {
            return None;
        }

        debug!(
            position_ms = ms,
            element_id = %found.element_id,
            title = found.title().unwrap_or_default(),
            "chapter changed"
        );
        *current = Some(found.clone());
        self.shared.set(Some(found.clone()));

        Some(ChapterChangedEvent {
            chapter: found,
            position_ms: ms,
        })
    }

    pub fn current(&self) -> Option<&ChapterRef> {
        match &self.state {
            State::Indexed { current, .. } => current.as_ref(),
            State::Empty => None,
        }
    }

    pub fn index(&self) -> Option<&ChapterIndex> {
        match &self.state {
            State::Indexed { index, .. } => Some(index),
            State::Empty => None,
        }
    }

    pub fn has_chapters(&self) -> bool {
        self.index().is_some_and(|index| !index.is_empty())
    }

    /// Handle for reading the current chapter from another thread
    pub fn current_handle(&self) -> CurrentChapter {
        self.shared.clone()
    }
}
