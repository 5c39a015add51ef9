// ID3 frame definitions

use serde::Serialize;

/// Frame identifiers interpreted by the parser
pub mod frame_ids {
    pub const CHAPTER: &str = "CHAP"; // Chapter with time range and sub-frames
    pub const TITLE: &str = "TIT2"; // Title/songname/content description
    pub const PICTURE: &str = "APIC"; // Attached picture
    pub const USER_URL: &str = "WXXX"; // User defined URL link
}

/// Size of a frame header (id + size + flags)
pub const FRAME_HEADER_SIZE: usize = 10;

/// ID3v2 frame header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    pub id: String,
    pub size: u32,
    pub flags: u16,
}

impl FrameHeader {
    /// Offset of the next frame relative to the start of this one
    pub fn total_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.size as usize
    }
}

/// A parsed frame. Only chapters carry children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Chapter(Chapter),
    Title(Title),
    Picture(Picture),
    UserUrl(UserUrl),
    Unknown(UnknownFrame),
}

impl Frame {
    pub fn header(&self) -> &FrameHeader {
        match self {
            Frame::Chapter(f) => &f.header,
            Frame::Title(f) => &f.header,
            Frame::Picture(f) => &f.header,
            Frame::UserUrl(f) => &f.header,
            Frame::Unknown(f) => &f.header,
        }
    }

    pub fn id(&self) -> &str {
        &self.header().id
    }

    pub fn as_chapter(&self) -> Option<&Chapter> {
        match self {
            Frame::Chapter(chapter) => Some(chapter),
            _ => None,
        }
    }
}

/// CHAP frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub header: FrameHeader,
    pub element_id: String,
    pub start_time_ms: u32,
    /// Zero means open-ended: the chapter runs to the next one or the end of media
    pub end_time_ms: u32,
    pub sub_frames: Vec<Frame>,
}

impl Chapter {
    /// Build a chapter that did not come from tag bytes, carrying a single title
    pub fn synthetic(element_id: String, start_time_ms: u32, end_time_ms: u32, title: String) -> Self {
        Chapter {
            header: FrameHeader { id: frame_ids::CHAPTER.to_string(), size: 0, flags: 0 },
            element_id,
            start_time_ms,
            end_time_ms,
            sub_frames: vec![Frame::Title(Title {
                header: FrameHeader { id: frame_ids::TITLE.to_string(), size: 0, flags: 0 },
                text: title,
            })],
        }
    }

    /// Whether position `ms` falls inside this chapter
    pub fn contains(&self, ms: u32) -> bool {
        ms >= self.start_time_ms && (self.end_time_ms == 0 || ms < self.end_time_ms)
    }

    /// Text of the first title sub-frame
    pub fn title(&self) -> Option<&str> {
        self.sub_frames.iter().find_map(|frame| match frame {
            Frame::Title(title) => Some(title.text.as_str()),
            _ => None,
        })
    }

    /// First embedded picture
    pub fn image(&self) -> Option<&Picture> {
        self.sub_frames.iter().find_map(|frame| match frame {
            Frame::Picture(picture) => Some(picture),
            _ => None,
        })
    }

    /// URL of the first user URL sub-frame
    pub fn url(&self) -> Option<&str> {
        self.sub_frames.iter().find_map(|frame| match frame {
            Frame::UserUrl(link) if !link.url.is_empty() => Some(link.url.as_str()),
            _ => None,
        })
    }

    /// Title for display, optionally prefixed with the start time
    pub fn display_title(&self, with_time: bool) -> String {
        let title = self.title().unwrap_or_default();
        if with_time {
            format!("{} - {}", format_timestamp(self.start_time_ms), title)
        } else {
            title.to_string()
        }
    }
}

/// Format milliseconds as MM:SS, or HH:MM:SS when at least an hour
pub fn format_timestamp(ms: u32) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, remaining)
    } else {
        format!("{:02}:{:02}", minutes, remaining)
    }
}

/// TIT2 frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Title {
    pub header: FrameHeader,
    pub text: String,
}

/// APIC frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Picture {
    pub header: FrameHeader,
    pub mime_type: String,
    pub picture_type: u8,
    pub description: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Picture {
    pub fn kind(&self) -> PictureType {
        PictureType::from_u8(self.picture_type)
    }

    /// Get file extension based on MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "jpg" => "jpg",
            "image/png" | "png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "jpg",
        }
    }
}

/// WXXX frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUrl {
    pub header: FrameHeader,
    pub description: String,
    pub url: String,
}

/// Any frame the parser skips over
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownFrame {
    pub header: FrameHeader,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Attached picture types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    VideoScreenCapture = 16,
    BrightColouredFish = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PictureType::FileIcon,
            2 => PictureType::OtherFileIcon,
            3 => PictureType::CoverFront,
            4 => PictureType::CoverBack,
            5 => PictureType::LeafletPage,
            6 => PictureType::Media,
            7 => PictureType::LeadArtist,
            8 => PictureType::Artist,
            9 => PictureType::Conductor,
            10 => PictureType::Band,
            11 => PictureType::Composer,
            12 => PictureType::Lyricist,
            13 => PictureType::RecordingLocation,
            14 => PictureType::DuringRecording,
            15 => PictureType::DuringPerformance,
            16 => PictureType::VideoScreenCapture,
            17 => PictureType::BrightColouredFish,
            18 => PictureType::Illustration,
            19 => PictureType::BandLogo,
            20 => PictureType::PublisherLogo,
            _ => PictureType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PictureType::Other => "Other",
            PictureType::FileIcon => "File Icon",
            PictureType::OtherFileIcon => "Other File Icon",
            PictureType::CoverFront => "Cover (front)",
            PictureType::CoverBack => "Cover (back)",
            PictureType::LeafletPage => "Leaflet page",
            PictureType::Media => "Media",
            PictureType::LeadArtist => "Lead artist",
            PictureType::Artist => "Artist",
            PictureType::Conductor => "Conductor",
            PictureType::Band => "Band",
            PictureType::Composer => "Composer",
            PictureType::Lyricist => "Lyricist",
            PictureType::RecordingLocation => "Recording Location",
            PictureType::DuringRecording => "During recording",
            PictureType::DuringPerformance => "During performance",
            PictureType::VideoScreenCapture => "Video screen capture",
            PictureType::BrightColouredFish => "Bright coloured fish",
            PictureType::Illustration => "Illustration",
            PictureType::BandLogo => "Band logo",
            PictureType::PublisherLogo => "Publisher logo",
        }
    }
}
