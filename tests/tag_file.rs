use std::io::Write;
use std::thread;

use podchapters::{ChapterSource, ChapterStateMachine, Error, Frame, ParseOptions, TagFile};
use tempfile::NamedTempFile;

fn frame(id: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = id.as_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(payload);
    bytes
}

fn chapter(element_id: &str, start: u32, end: u32, title: &str, url: Option<&str>) -> Vec<u8> {
    chapter_with(element_id, start, end, title, url, &[])
}

fn chapter_with(element_id: &str, start: u32, end: u32, title: &str, url: Option<&str>, extra: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = element_id.as_bytes().to_vec();
    payload.push(0);
    payload.extend_from_slice(&start.to_be_bytes());
    payload.extend_from_slice(&end.to_be_bytes());
    payload.extend_from_slice(&[0xFF; 8]);

    let mut text = vec![3u8];
    text.extend_from_slice(title.as_bytes());
    payload.extend(frame("TIT2", &text));

    if let Some(url) = url {
        let mut link = vec![0u8, 0];
        link.extend_from_slice(url.as_bytes());
        payload.extend(frame("WXXX", &link));
    }
    for sub in extra {
        payload.extend_from_slice(sub);
    }
    frame("CHAP", &payload)
}

fn picture_frame(data: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8];
    payload.extend_from_slice(b"image/png\0");
    payload.push(3);
    payload.extend_from_slice(b"cover\0");
    payload.extend_from_slice(data);
    frame("APIC", &payload)
}

/// ID3v2.3 tag followed by padding and some fake audio
fn episode_bytes(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut body: Vec<u8> = frames.concat();
    body.extend_from_slice(&[0u8; 32]);

    let size = body.len() as u32;
    let mut bytes = vec![b'I', b'D', b'3', 3, 0, 0];
    bytes.extend_from_slice(&[
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]);
    bytes.extend(body);
    bytes.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    bytes
}

fn write_episode(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_open_reads_embedded_chapters() {
    let with_art = chapter_with("ch2", 60_000, 0, "Main", None, &[picture_frame(&[0x89, b'P', b'N', b'G'])]);
    let bytes = episode_bytes(&[
        frame("TIT2", b"\x00Episode 12"),
        chapter("ch1", 0, 60_000, "Intro", Some("https://example.com")),
        with_art,
    ]);
    let file = write_episode(&bytes);

    let tag = TagFile::open(file.path(), &ParseOptions::default()).unwrap();
    let header = tag.header().unwrap();
    assert_eq!(header.version(), "2.3.0");
    assert_eq!(tag.chapter_source(), ChapterSource::Embedded);
    assert_eq!(tag.frames().len(), 3);
    assert!(matches!(&tag.frames()[0], Frame::Title(title) if title.text == "Episode 12"));

    let chapters = tag.chapters();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters.chapters()[0].url(), Some("https://example.com"));

    let main = tag.chapter_at(61.0).unwrap();
    assert_eq!(main.title(), Some("Main"));
    let image = main.image().unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.description, "cover");
    assert_eq!(image.data, vec![0x89, b'P', b'N', b'G']);
    assert_eq!(image.extension(), "png");
}

#[test]
fn test_open_rejects_missing_and_directory_paths() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.mp3");
    assert!(matches!(
        TagFile::open(&missing, &ParseOptions::default()),
        Err(Error::InvalidPath(path)) if path == missing
    ));
    assert!(matches!(
        TagFile::open(dir.path(), &ParseOptions::default()),
        Err(Error::InvalidPath(_))
    ));
}

#[test]
fn test_file_without_tag_falls_back_to_description() {
    let file = write_episode(b"\xFF\xFB\x90\x00 plain mpeg audio");

    let tag = TagFile::open(file.path(), &ParseOptions::default()).unwrap();
    assert!(tag.header().is_none());
    assert!(!tag.has_chapters());

    let tag = tag.with_fallback_description("Show notes\n00:00 Intro\n01:30 Main\n10:00 Outro");
    assert_eq!(tag.chapter_source(), ChapterSource::Synthesized);
    let ids: Vec<&str> = tag.chapters().iter().map(|c| c.element_id.as_str()).collect();
    assert_eq!(ids, ["chp0", "chp1", "chp2"]);
    assert_eq!(tag.chapter_at(95.0).and_then(|c| c.title()), Some("Main"));
    assert_eq!(tag.chapter_at(3_600.0).and_then(|c| c.title()), Some("Outro"));
}

#[test]
fn test_embedded_chapters_ignore_description() {
    let bytes = episode_bytes(&[chapter("a", 0, 5_000, "Only", None)]);
    let file = write_episode(&bytes);

    let tag = TagFile::open(file.path(), &ParseOptions::default())
        .unwrap()
        .with_fallback_description("00:00 Other 00:30 Another");
    assert_eq!(tag.chapter_source(), ChapterSource::Embedded);
    assert_eq!(tag.chapters().len(), 1);
}

#[test]
fn test_playback_drives_state_machine() {
    let bytes = episode_bytes(&[
        chapter("a", 0, 10_000, "A", None),
        chapter("b", 20_000, 30_000, "B", None),
    ]);
    let file = write_episode(&bytes);
    let tag = TagFile::open(file.path(), &ParseOptions::default()).unwrap();

    let mut machine = ChapterStateMachine::new();
    machine.load(tag.chapters().clone());
    let handle = machine.current_handle();

    let titles: Vec<String> = [0.0, 5.0, 15.0, 25.0, 26.0, 40.0, 1.0]
        .iter()
        .filter_map(|&seconds| machine.on_position_update(seconds))
        .map(|event| event.title().to_string())
        .collect();
    // The gaps at 15s and 40s keep the previous chapter
    assert_eq!(titles, ["A", "B", "A"]);

    let seen = thread::spawn(move || handle.get().map(|chapter| chapter.element_id.clone()))
        .join()
        .unwrap();
    assert_eq!(seen.as_deref(), Some("a"));
}
