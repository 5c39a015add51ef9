// ID3v2 frame tree parser

use tracing::{debug, trace, warn};

use super::frames::{
    frame_ids, Chapter, Frame, FrameHeader, Picture, Title, UnknownFrame, UserUrl, FRAME_HEADER_SIZE,
};
use super::header::decode_synchsafe;
use crate::config::ParseOptions;
use crate::utils::encoding::{read_latin1_string, read_string, TextEncoding};
use crate::utils::io::{be_u16_at, be_u32_at};

/// Bytes between a chapter's element ID and its sub-frames:
/// start time, end time, start offset, end offset
const CHAPTER_FIXED_FIELDS: usize = 16;

/// A frame located in a body but not yet interpreted
#[derive(Debug)]
pub struct RawFrame<'a> {
    pub offset: usize,
    pub header: FrameHeader,
    pub payload: &'a [u8],
}

/// Steps through consecutive frame headers in a body.
///
/// Stops when fewer than ten bytes remain, at padding (if enabled), or at the
/// first frame whose declared size runs past the end of the body.
pub struct FrameCursor<'a> {
    body: &'a [u8],
    position: usize,
    synchsafe_sizes: bool,
    stop_at_padding: bool,
    done: bool,
}

impl<'a> FrameCursor<'a> {
    pub fn new(body: &'a [u8], synchsafe_sizes: bool, stop_at_padding: bool) -> Self {
        FrameCursor {
            body,
            position: 0,
            synchsafe_sizes,
            stop_at_padding,
            done: false,
        }
    }

    /// Offset where the next frame header is expected
    pub fn position(&self) -> usize {
        self.position
    }

    fn read_header(&self, bytes: &[u8]) -> FrameHeader {
        let size = if self.synchsafe_sizes {
            decode_synchsafe([bytes[4], bytes[5], bytes[6], bytes[7]])
        } else {
            be_u32_at(bytes, 4).unwrap_or(0)
        };

        FrameHeader {
            id: String::from_utf8_lossy(&bytes[0..4]).to_string(),
            size,
            flags: be_u16_at(bytes, 8).unwrap_or(0),
        }
    }
}

impl<'a> Iterator for FrameCursor<'a> {
    type Item = RawFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let body = self.body;
        if self.done || body.len() - self.position < FRAME_HEADER_SIZE {
            return None;
        }

        let offset = self.position;
        let bytes = &body[offset..offset + FRAME_HEADER_SIZE];

        if self.stop_at_padding && bytes[0..4].iter().all(|&b| b == 0) {
            trace!(offset, "reached padding");
            self.done = true;
            return None;
        }

        let header = self.read_header(bytes);
        let end = match offset.checked_add(header.total_len()) {
            Some(end) if end <= body.len() => end,
            _ => {
                debug!(
                    offset,
                    id = %header.id,
                    size = header.size,
                    available = body.len() - offset,
                    "frame runs past end of body"
                );
                self.done = true;
                return None;
            }
        };

        self.position = end;
        Some(RawFrame {
            offset,
            payload: &body[offset + FRAME_HEADER_SIZE..end],
            header,
        })
    }
}

/// Turns a tag body into a list of frames, recursing into chapters
pub struct FrameParser<'o> {
    options: &'o ParseOptions,
    synchsafe_sizes: bool,
}

impl<'o> FrameParser<'o> {
    pub fn new(options: &'o ParseOptions, version_major: u8) -> Self {
        FrameParser {
            options,
            synchsafe_sizes: options.frame_size.is_synchsafe(version_major),
        }
    }

    /// Parse all top-level frames in `body`
    pub fn parse(&self, body: &[u8]) -> Vec<Frame> {
        self.parse_level(body, 0)
    }

    fn parse_level(&self, body: &[u8], depth: usize) -> Vec<Frame> {
        FrameCursor::new(body, self.synchsafe_sizes, self.options.stop_at_padding)
            .map(|raw| self.parse_frame(raw, depth))
            .collect()
    }

    fn parse_frame(&self, raw: RawFrame<'_>, depth: usize) -> Frame {
        trace!(offset = raw.offset, id = %raw.header.id, size = raw.header.size, depth, "frame");

        match raw.header.id.as_str() {
            frame_ids::CHAPTER => Frame::Chapter(self.parse_chapter(raw.header, raw.payload, depth)),
            frame_ids::TITLE => Frame::Title(parse_title(raw.header, raw.payload)),
            frame_ids::PICTURE => Frame::Picture(parse_picture(raw.header, raw.payload)),
            frame_ids::USER_URL => Frame::UserUrl(parse_user_url(raw.header, raw.payload)),
            _ => Frame::Unknown(UnknownFrame {
                header: raw.header,
                data: raw.payload.to_vec(),
            }),
        }
    }

    fn parse_chapter(&self, header: FrameHeader, payload: &[u8], depth: usize) -> Chapter {
        let mut cursor = 0;
        let id_bound = (header.size as usize).saturating_sub(10);
        let element_id = read_latin1_string(payload, &mut cursor, id_bound);

        let start_time_ms = be_u32_at(payload, cursor).unwrap_or(0);
        let end_time_ms = be_u32_at(payload, cursor + 4).unwrap_or(0);
        cursor += CHAPTER_FIXED_FIELDS;

        let sub_frames = match payload.get(cursor..) {
            Some(region) if !region.is_empty() => {
                if depth + 1 > self.options.max_depth {
                    warn!(element_id = %element_id, depth, "chapter nesting too deep, dropping sub-frames");
                    Vec::new()
                } else {
                    self.parse_level(region, depth + 1)
                }
            }
            _ => Vec::new(),
        };

        Chapter {
            header,
            element_id,
            start_time_ms,
            end_time_ms,
            sub_frames,
        }
    }
}

fn parse_title(header: FrameHeader, payload: &[u8]) -> Title {
    let text = match payload.first() {
        Some(&selector) => {
            let mut cursor = 1;
            let bound = (header.size as usize).saturating_sub(1);
            read_string(payload, &mut cursor, bound, TextEncoding::from_byte(selector))
        }
        None => String::new(),
    };

    Title { header, text }
}

fn parse_picture(header: FrameHeader, payload: &[u8]) -> Picture {
    let encoding = TextEncoding::from_byte(payload.first().copied().unwrap_or(0));
    let mut cursor = 1;

    let mime_type = read_latin1_string(payload, &mut cursor, payload.len());
    let picture_type = payload.get(cursor).copied().unwrap_or(0);
    cursor += 1;
    let description = read_string(payload, &mut cursor, payload.len(), encoding);
    let data = payload.get(cursor..).unwrap_or_default().to_vec();

    Picture {
        header,
        mime_type,
        picture_type,
        description,
        data,
    }
}

fn parse_user_url(header: FrameHeader, payload: &[u8]) -> UserUrl {
    let encoding = TextEncoding::from_byte(payload.first().copied().unwrap_or(0));
    let mut cursor = 1;

    let description = read_string(payload, &mut cursor, payload.len(), encoding);
    let url = read_latin1_string(payload, &mut cursor, payload.len());

    UserUrl {
        header,
        description,
        url,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::FrameSizeEncoding;

    /// Assemble a frame with a plain big-endian size
    pub(crate) fn frame(id: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = id.as_bytes().to_vec();
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(payload);
        bytes
    }

    pub(crate) fn title_frame(text: &str) -> Vec<u8> {
        let mut payload = vec![0u8];
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        frame("TIT2", &payload)
    }

    pub(crate) fn chapter_frame(element_id: &str, start: u32, end: u32, sub_frames: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = element_id.as_bytes().to_vec();
        payload.push(0);
        payload.extend_from_slice(&start.to_be_bytes());
        payload.extend_from_slice(&end.to_be_bytes());
        payload.extend_from_slice(&[0xFF; 8]);
        for sub in sub_frames {
            payload.extend_from_slice(sub);
        }
        frame("CHAP", &payload)
    }

    fn parse(body: &[u8]) -> Vec<Frame> {
        let options = ParseOptions::default();
        FrameParser::new(&options, 3).parse(body)
    }

    #[test]
    fn test_cursor_offsets_are_monotonic() {
        let sizes = [0usize, 5, 12, 1];
        let body: Vec<u8> = sizes.iter().flat_map(|&size| frame("TXXX", &vec![7u8; size])).collect();

        let mut cursor = FrameCursor::new(&body, false, true);
        let mut expected = 0;
        let mut visited = 0;
        while let Some(raw) = cursor.next() {
            assert_eq!(raw.offset, expected);
            expected += 10 + sizes[visited];
            visited += 1;
            assert_eq!(cursor.position(), expected);
        }
        assert_eq!(visited, sizes.len());
    }

    #[test]
    fn test_truncated_last_frame_is_dropped() {
        let mut body = title_frame("one");
        body.extend(title_frame("two"));
        let mut last = title_frame("three");
        last[4..8].copy_from_slice(&1000u32.to_be_bytes());
        body.extend(last);

        let frames = parse(&body);
        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[1], Frame::Title(t) if t.text == "two"));
    }

    #[test]
    fn test_short_tail_stops_parsing() {
        let mut body = title_frame("one");
        body.extend_from_slice(b"TIT2\x00");
        assert_eq!(parse(&body).len(), 1);
    }

    #[test]
    fn test_zero_size_frames_still_advance() {
        let body: Vec<u8> = (0..3).flat_map(|_| frame("PRIV", &[])).collect();
        let frames = parse(&body);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| matches!(f, Frame::Unknown(u) if u.header.size == 0)));
    }

    #[test]
    fn test_padding_stops_parsing() {
        let mut body = title_frame("one");
        body.extend_from_slice(&[0u8; 32]);
        assert_eq!(parse(&body).len(), 1);

        let options = ParseOptions { stop_at_padding: false, ..ParseOptions::default() };
        let frames = FrameParser::new(&options, 3).parse(&body);
        assert_eq!(frames.len(), 4);
    }

    #[test]
    fn test_chapter_with_sub_frames() {
        let mut url_payload = vec![0u8];
        url_payload.extend_from_slice(b"link\0https://example.com/ep1");
        let picture_payload: Vec<u8> = [
            &[0u8][..],
            &b"image/png\0"[..],
            &[3u8][..],
            &b"cover\0"[..],
            &[0x89u8, 0x50, 0x4E, 0x47][..],
        ]
        .concat();

        let body = chapter_frame(
            "ch1",
            1500,
            9000,
            &[title_frame("Welcome"), frame("APIC", &picture_payload), frame("WXXX", &url_payload)],
        );

        let frames = parse(&body);
        assert_eq!(frames.len(), 1);
        let chapter = frames[0].as_chapter().unwrap();
        assert_eq!(chapter.element_id, "ch1");
        assert_eq!(chapter.start_time_ms, 1500);
        assert_eq!(chapter.end_time_ms, 9000);
        assert_eq!(chapter.sub_frames.len(), 3);
        assert_eq!(chapter.title(), Some("Welcome"));
        assert_eq!(chapter.url(), Some("https://example.com/ep1"));

        let picture = chapter.image().unwrap();
        assert_eq!(picture.mime_type, "image/png");
        assert_eq!(picture.picture_type, 3);
        assert_eq!(picture.description, "cover");
        assert_eq!(picture.data, vec![0x89, 0x50, 0x4E, 0x47]);
    }

    fn parse_single_picture(payload: &[u8]) -> Picture {
        let frames = parse(&frame("APIC", payload));
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::Picture(picture) => picture.clone(),
            other => panic!("expected picture, got {other:?}"),
        }
    }

    #[test]
    fn test_picture_utf16_bom_description() {
        // MIME type stays single-zero terminated; "Art ♪" is UTF-16LE with a BOM
        let payload: Vec<u8> = [
            &[1u8][..],
            &b"image/jpeg\0"[..],
            &[4u8][..],
            &[0xFF, 0xFE, 0x41, 0x00, 0x72, 0x00, 0x74, 0x00, 0x20, 0x00, 0x6A, 0x26, 0x00, 0x00][..],
            &[0xFF, 0xD8, 0xFF, 0xE0][..],
        ]
        .concat();

        let picture = parse_single_picture(&payload);
        assert_eq!(picture.mime_type, "image/jpeg");
        assert_eq!(picture.picture_type, 4);
        assert_eq!(picture.description, "Art \u{266A}");
        assert_eq!(picture.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_picture_utf16be_description() {
        let payload: Vec<u8> = [
            &[2u8][..],
            &b"image/png\0"[..],
            &[3u8][..],
            &[0x00, 0x43, 0x00, 0x6F, 0x00, 0x00][..],
            &[0x89, 0x50, 0x4E, 0x47, 0x00, 0x00][..],
        ]
        .concat();

        let picture = parse_single_picture(&payload);
        assert_eq!(picture.mime_type, "image/png");
        assert_eq!(picture.picture_type, 3);
        assert_eq!(picture.description, "Co");
        assert_eq!(picture.data, vec![0x89, 0x50, 0x4E, 0x47, 0x00, 0x00]);
    }

    #[test]
    fn test_utf16_title() {
        let payload = [1u8, 0xFF, 0xFE, b'O', 0, b'k', 0, 0, 0];
        let frames = parse(&frame("TIT2", &payload));
        assert!(matches!(&frames[0], Frame::Title(t) if t.text == "Ok"));
    }

    #[test]
    fn test_url_ignores_declared_encoding() {
        // UTF-16BE description, then a single-zero terminated URL
        let payload: Vec<u8> = [&[2u8, 0, b'd', 0, 0][..], &b"http://a.b\0"[..]].concat();
        let frames = parse(&frame("WXXX", &payload));
        match &frames[0] {
            Frame::UserUrl(link) => {
                assert_eq!(link.description, "d");
                assert_eq!(link.url, "http://a.b");
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn test_nested_chapters_respect_depth_cap() {
        let inner = chapter_frame("inner", 0, 0, &[title_frame("deep")]);
        let outer = chapter_frame("outer", 0, 0, &[inner]);

        let options = ParseOptions { max_depth: 1, ..ParseOptions::default() };
        let frames = FrameParser::new(&options, 3).parse(&outer);
        let outer = frames[0].as_chapter().unwrap();
        let inner = outer.sub_frames[0].as_chapter().unwrap();
        assert_eq!(inner.element_id, "inner");
        assert!(inner.sub_frames.is_empty());

        let frames = parse(&chapter_frame("outer", 0, 0, &[chapter_frame("inner", 0, 0, &[title_frame("deep")])]));
        let inner = frames[0].as_chapter().unwrap().sub_frames[0].as_chapter().unwrap();
        assert_eq!(inner.title(), Some("deep"));
    }

    #[test]
    fn test_malformed_payloads_do_not_panic() {
        let bodies = [
            frame("CHAP", &[]),
            frame("CHAP", b"abc"),
            frame("TIT2", &[]),
            frame("APIC", &[]),
            frame("APIC", &[0, b'x']),
            frame("WXXX", &[1]),
        ];
        for body in bodies {
            assert_eq!(parse(&body).len(), 1);
        }
    }

    #[test]
    fn test_synchsafe_frame_sizes() {
        // 200-byte payload: plain size 0x000000C8, synchsafe 0x00000148
        let payload = vec![b'a'; 200];
        let mut body = b"TXXX".to_vec();
        body.extend_from_slice(&[0x00, 0x00, 0x01, 0x48, 0, 0]);
        body.extend_from_slice(&payload);
        body.extend(title_frame("after"));

        let options = ParseOptions { frame_size: FrameSizeEncoding::ByVersion, ..ParseOptions::default() };
        assert_eq!(FrameParser::new(&options, 4).parse(&body).len(), 2);
        // Read as plain big-endian the size overstates the payload
        assert_eq!(FrameParser::new(&options, 3).parse(&body).len(), 0);
    }
}
