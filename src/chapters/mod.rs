// Chapter navigation: ordered index, fallback synthesis, current-chapter tracking
pub mod index;
pub mod state;
pub mod synth;

pub use index::{position_ms, ChapterIndex, ChapterRef};
pub use state::{ChapterChangedEvent, ChapterStateMachine, CurrentChapter};
pub use synth::synthesize_chapters;
