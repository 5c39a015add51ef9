// CLI command implementations
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use podchapters::chapters::position_ms;
use podchapters::id3::frames::format_timestamp;
use podchapters::{Chapter, ChapterStateMachine, Frame, ParseOptions, TagFile};

use super::config::DescriptionArgs;
use super::output::ProgressBar;
use super::{CliError, CliResult, Commands, Config, OutputFormatter};

#[derive(Serialize)]
struct ImageReport<'a> {
    mime_type: &'a str,
    picture_type: &'static str,
    description: &'a str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

#[derive(Serialize)]
struct ChapterReport<'a> {
    element_id: &'a str,
    start: String,
    end: Option<String>,
    start_ms: u32,
    end_ms: u32,
    title: &'a str,
    url: Option<&'a str>,
    image: Option<ImageReport<'a>>,
}

impl<'a> ChapterReport<'a> {
    fn new(chapter: &'a Chapter, include_images: bool) -> Self {
        ChapterReport {
            element_id: &chapter.element_id,
            start: format_timestamp(chapter.start_time_ms),
            end: (chapter.end_time_ms != 0).then(|| format_timestamp(chapter.end_time_ms)),
            start_ms: chapter.start_time_ms,
            end_ms: chapter.end_time_ms,
            title: chapter.title().unwrap_or_default(),
            url: chapter.url(),
            image: chapter.image().map(|picture| ImageReport {
                mime_type: &picture.mime_type,
                picture_type: picture.kind().label(),
                description: &picture.description,
                size: picture.data.len(),
                data: include_images.then(|| base64::engine::general_purpose::STANDARD.encode(&picture.data)),
            }),
        }
    }
}

/// Run the parsed command line
pub fn run(config: &Config) -> CliResult<()> {
    let options = config.parse_options()?;
    let formatter = OutputFormatter::new(config.format, config.quiet);
    debug!(?options, "parser options");

    match &config.command {
        Commands::Chapters { files, description, include_images, output } => {
            command_chapters(files, description, *include_images, output.as_deref(), &options, &formatter)
        }
        Commands::Info { files, detailed } => command_info(files, *detailed, &options, &formatter),
        Commands::At { file, seconds, description } => command_at(file, *seconds, description, &options, &formatter),
        Commands::Follow { file, positions, description } => {
            command_follow(file, positions, description, &options, &formatter)
        }
        Commands::ExportImages { file, output } => command_export_images(file, output, &options, &formatter),
        Commands::Batch { directory, pattern } => command_batch(directory, pattern, &options, &formatter),
    }
}

/// Open a file and apply the fallback description, if any
fn load_tag(file_path: &str, options: &ParseOptions, description: Option<&str>) -> CliResult<TagFile> {
    if !Path::new(file_path).exists() {
        return Err(CliError::FileNotFound(file_path.to_string()));
    }

    let tag = TagFile::open(file_path, options)?;
    Ok(match description {
        Some(text) => tag.with_fallback_description(text),
        None => tag,
    })
}

fn chapters_report(file_path: &str, tag: &TagFile, include_images: bool) -> Value {
    let chapters: Vec<ChapterReport<'_>> = tag
        .chapters()
        .iter()
        .map(|chapter| ChapterReport::new(chapter, include_images))
        .collect();

    json!({
        "file": file_path,
        "version": tag.header().map(|header| header.version()),
        "source": tag.chapter_source(),
        "count": chapters.len(),
        "chapters": chapters,
    })
}

/// List chapters of each file
fn command_chapters(
    files: &[String],
    description: &DescriptionArgs,
    include_images: bool,
    output: Option<&Path>,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let description = description.text()?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };

    for file_path in files {
        match load_tag(file_path, options, description.as_deref()) {
            Ok(tag) => {
                formatter.output(&chapters_report(file_path, &tag, include_images), &mut writer)?;
            }
            Err(e) => formatter.print_error(&format!("{}: {}", file_path, e)),
        }
    }

    writer.flush()?;
    Ok(())
}

/// Frame tree as JSON; picture and unknown payload bytes are left out
fn frame_list(frames: &[Frame]) -> CliResult<Value> {
    Ok(serde_json::to_value(frames)?)
}

/// Show tag header and frame information
fn command_info(files: &[String], detailed: bool, options: &ParseOptions, formatter: &OutputFormatter) -> CliResult<()> {
    let mut stdout = std::io::stdout();

    for file_path in files {
        let metadata = match std::fs::metadata(file_path) {
            Ok(metadata) => metadata,
            Err(_) => {
                formatter.print_error(&format!("File not found: {}", file_path));
                continue;
            }
        };

        let modified = metadata
            .modified()
            .ok()
            .map(|mtime| chrono::DateTime::<chrono::Utc>::from(mtime).format("%Y-%m-%d %H:%M:%S UTC").to_string());

        let tag = match load_tag(file_path, options, None) {
            Ok(tag) => tag,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                continue;
            }
        };

        let mut report = json!({
            "file": file_path,
            "size": metadata.len(),
            "modified": modified,
            "id3v2": tag.header().is_some(),
            "frames": tag.frame_counts(),
            "chapters": tag.chapters().len(),
        });

        if let Some(header) = tag.header() {
            report["version"] = json!(header.version());
            report["tag_size"] = json!(header.declared_size);
            report["unsynchronisation"] = json!(header.flags.unsynchronisation);
            report["extended_header"] = json!(header.flags.extended_header);
        }

        if detailed {
            report["frame_list"] = frame_list(tag.frames())?;
        }

        formatter.output(&report, &mut stdout)?;
    }

    Ok(())
}

/// Show the chapter at a playback position
fn command_at(
    file_path: &str,
    seconds: f64,
    description: &DescriptionArgs,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CliError::InvalidFormat(format!("position must be a non-negative number: {}", seconds)));
    }

    let tag = load_tag(file_path, options, description.text()?.as_deref())?;
    let chapter = tag.chapter_at(seconds).map(|chapter| ChapterReport::new(chapter, false));

    let report = json!({
        "file": file_path,
        "position": seconds,
        "position_ms": position_ms(seconds),
        "chapter": chapter,
    });
    formatter.output(&report, &mut std::io::stdout())
}

/// Replay positions through the chapter state machine
fn command_follow(
    file_path: &str,
    positions: &[f64],
    description: &DescriptionArgs,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let tag = load_tag(file_path, options, description.text()?.as_deref())?;

    let mut machine = ChapterStateMachine::new();
    machine.load(tag.chapters().clone());

    let changes: Vec<Value> = positions
        .iter()
        .filter_map(|&seconds| {
            machine.on_position_update(seconds).map(|event| {
                json!({
                    "position": seconds,
                    "element_id": event.chapter.element_id,
                    "title": event.title(),
                    "url": event.url(),
                    "image": event.image().map(|picture| picture.mime_type.clone()),
                })
            })
        })
        .collect();

    let report = json!({
        "file": file_path,
        "has_chapters": machine.has_chapters(),
        "changes": changes,
        "current": machine.current().map(|chapter| chapter.display_title(true)),
    });
    formatter.output(&report, &mut std::io::stdout())
}

/// File name for an exported chapter image
fn image_file_name(chapter: &Chapter, position: usize, extension: &str) -> String {
    let stem: String = chapter
        .element_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        format!("chapter{}.{}", position, extension)
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// Export chapter images
fn command_export_images(
    file_path: &str,
    output_dir: &Path,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let tag = load_tag(file_path, options, None)?;
    std::fs::create_dir_all(output_dir)?;

    let mut exported = Vec::new();
    for (position, chapter) in tag.chapters().iter().enumerate() {
        let Some(picture) = chapter.image() else {
            continue;
        };
        if picture.data.is_empty() {
            continue;
        }

        let target = output_dir.join(image_file_name(chapter, position, picture.extension()));
        std::fs::write(&target, &picture.data)?;
        formatter.print_success(&format!("Exported {}", target.display()));
        exported.push(target.display().to_string());
    }

    if exported.is_empty() {
        formatter.print_info("No chapter images found");
    }

    let report = json!({
        "file": file_path,
        "exported": exported,
    });
    formatter.output(&report, &mut std::io::stdout())
}

/// List chapters for every file matching a glob pattern
fn command_batch(directory: &str, pattern: &str, options: &ParseOptions, formatter: &OutputFormatter) -> CliResult<()> {
    use glob::glob;

    // Build glob pattern
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory, pattern)
    } else {
        format!("{}/**/{}", directory, pattern)
    };

    let mut files: Vec<String> = Vec::new();
    for entry in glob(&glob_pattern).map_err(|e| CliError::Other(format!("Invalid glob pattern: {}", e)))? {
        match entry {
            Ok(path) if path.is_file() => {
                if let Some(path_str) = path.to_str() {
                    files.push(path_str.to_string());
                }
            }
            Ok(_) => {}
            Err(e) => formatter.print_error(&format!("Error reading path: {}", e)),
        }
    }

    if files.is_empty() {
        formatter.print_info("No files found matching pattern");
        return Ok(());
    }

    info!(count = files.len(), pattern = %glob_pattern, "processing files");
    let mut progress = ProgressBar::new(files.len(), !formatter.is_quiet());
    let mut results = Vec::new();
    let mut error_count = 0;

    for file_path in &files {
        progress.increment(file_path);
        match load_tag(file_path, options, None) {
            Ok(tag) => results.push(json!({
                "file": file_path,
                "chapters": tag.chapters().len(),
                "source": tag.chapter_source(),
            })),
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                error_count += 1;
            }
        }
    }

    let with_chapters = results.iter().filter(|r| r["chapters"].as_u64().unwrap_or(0) > 0).count();
    formatter.print_info(&format!(
        "Completed: {} files, {} with chapters, {} errors",
        files.len(),
        with_chapters,
        error_count
    ));

    let report = json!({
        "directory": directory,
        "pattern": pattern,
        "files": results,
        "with_chapters": with_chapters,
        "errors": error_count,
    });
    formatter.output(&report, &mut std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podchapters::{FrameHeader, Picture};

    #[test]
    fn test_image_file_name() {
        let chapter = Chapter::synthetic("ch 1/a".to_string(), 0, 0, "x".to_string());
        assert_eq!(image_file_name(&chapter, 0, "png"), "ch_1_a.png");

        let unnamed = Chapter::synthetic(String::new(), 0, 0, "x".to_string());
        assert_eq!(image_file_name(&unnamed, 4, "jpg"), "chapter4.jpg");
    }

    #[test]
    fn test_frame_list_nests_chapter_sub_frames() {
        let mut chapter = Chapter::synthetic("chp0".to_string(), 0, 5000, "Intro".to_string());
        chapter.sub_frames.push(Frame::Picture(Picture {
            header: FrameHeader { id: "APIC".to_string(), size: 20, flags: 0 },
            mime_type: "image/png".to_string(),
            picture_type: 3,
            description: "cover".to_string(),
            data: vec![1, 2, 3],
        }));

        let value = frame_list(&[Frame::Chapter(chapter)]).unwrap();
        let chapter = &value[0];
        assert_eq!(chapter["kind"], "chapter");
        assert_eq!(chapter["header"]["id"], "CHAP");
        assert_eq!(chapter["element_id"], "chp0");
        assert_eq!(chapter["end_time_ms"], 5000);
        assert_eq!(chapter["sub_frames"][0]["kind"], "title");
        assert_eq!(chapter["sub_frames"][0]["text"], "Intro");

        let picture = &chapter["sub_frames"][1];
        assert_eq!(picture["kind"], "picture");
        assert_eq!(picture["mime_type"], "image/png");
        assert!(picture.get("data").is_none());
    }

    #[test]
    fn test_chapter_report_shape() {
        let chapter = Chapter::synthetic("chp0".to_string(), 90_000, 0, "Main".to_string());
        let value = serde_json::to_value(ChapterReport::new(&chapter, false)).unwrap();
        assert_eq!(value["start"], "01:30");
        assert_eq!(value["end"], Value::Null);
        assert_eq!(value["title"], "Main");
        assert_eq!(value["image"], Value::Null);
    }
}
