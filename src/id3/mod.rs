// ID3v2 tag decoding
pub mod frames;
pub mod header;
pub mod v2;

pub use frames::{Chapter, Frame, FrameHeader, Picture, PictureType, Title, UnknownFrame, UserUrl};
pub use header::{TagFlags, TagHeader};
pub use v2::FrameParser;
