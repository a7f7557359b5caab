//! Lightweight metadata sniffing for photos and MP3 files.
//!
//! Neither reader decodes its format. They scan the raw bytes for well-known
//! markers, which is enough to tell whether EXIF data or ID3 tags are present
//! and to pull out the common text fields.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::file_category::extension_of;
use crate::paths::require_exists;
use crate::record::FileRecord;

/// Extensions [`read_exif`] accepts.
pub const EXIF_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tiff", "tif", "heic", "heif"];

/// Vendor strings looked for once an EXIF marker is found, in priority order.
const CAMERA_MARKERS: &[&str] = &["Canon", "Nikon", "Sony", "Apple", "Samsung", "iPhone", "iPad"];

/// Buffers this short are not checked for EXIF at all.
const MIN_EXIF_SCAN_BYTES: usize = 20;

const ID3V1_LEN: usize = 128;
const ID3V2_FRAME_HEADER_LEN: usize = 10;
const ID3V2_MAX_VALUE_BYTES: usize = 100;

/// What [`read_exif`] found in an image.
#[derive(Debug, Clone)]
pub struct ExifReport {
    pub record: FileRecord,
    /// MIME type sniffed from the magic bytes.
    pub mime: Option<String>,
    /// `None` when the file was too small to check.
    pub has_exif: Option<bool>,
    /// First camera vendor marker found in the file.
    pub camera: Option<String>,
}

/// Tags [`read_mp3_tags`] found in an MP3 file.
#[derive(Debug, Clone)]
pub struct Mp3Report {
    pub record: FileRecord,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Only ID3v1 carries a year.
    pub year: Option<String>,
    pub has_id3v1: bool,
    pub has_id3v2: bool,
}

/// Reads basic EXIF indicators from a photo.
///
/// # Errors
///
/// Fails when the file does not exist, its extension is not one of
/// [`EXIF_EXTENSIONS`], or it cannot be read.
pub fn read_exif(path: &Path) -> Result<ExifReport> {
    let (record, buffer) = load(path, EXIF_EXTENSIONS)?;

    let mime = infer::get(&buffer).map(|kind| kind.mime_type().to_string());

    let mut has_exif = None;
    let mut camera = None;
    if buffer.len() > MIN_EXIF_SCAN_BYTES {
        let found = contains(&buffer, b"Exif");
        has_exif = Some(found);
        if found {
            camera = CAMERA_MARKERS
                .iter()
                .find(|marker| contains(&buffer, marker.as_bytes()))
                .map(|marker| marker.to_string());
        }
    }

    tracing::debug!(path = %path.display(), ?has_exif, ?camera, "exif scan");
    Ok(ExifReport {
        record,
        mime,
        has_exif,
        camera,
    })
}

/// Reads ID3v1 and ID3v2 text tags from an MP3 file.
///
/// ID3v2 values take precedence over ID3v1 values for the same field.
///
/// # Errors
///
/// Fails when the file does not exist, is not an `.mp3`, or cannot be read.
pub fn read_mp3_tags(path: &Path) -> Result<Mp3Report> {
    let (record, buffer) = load(path, &["mp3"])?;

    let mut report = Mp3Report {
        record,
        title: None,
        artist: None,
        album: None,
        year: None,
        has_id3v1: false,
        has_id3v2: false,
    };

    if let Some(trailer) = id3v1_trailer(&buffer) {
        report.has_id3v1 = true;
        report.title = clean(&latin1(&trailer[3..33]));
        report.artist = clean(&latin1(&trailer[33..63]));
        report.album = clean(&latin1(&trailer[63..93]));
        report.year = clean(&latin1(&trailer[93..97]));
    }

    if buffer.len() >= ID3V2_FRAME_HEADER_LEN && buffer.starts_with(b"ID3") {
        report.has_id3v2 = true;
        let version = buffer[3];
        if let Some(title) = id3v2_frame(&buffer, b"TIT2", version) {
            report.title = Some(title);
        }
        if let Some(artist) = id3v2_frame(&buffer, b"TPE1", version) {
            report.artist = Some(artist);
        }
        if let Some(album) = id3v2_frame(&buffer, b"TALB", version) {
            report.album = Some(album);
        }
    }

    tracing::debug!(
        path = %path.display(),
        id3v1 = report.has_id3v1,
        id3v2 = report.has_id3v2,
        "mp3 tag scan"
    );
    Ok(report)
}

fn load(path: &Path, accepted: &[&str]) -> Result<(FileRecord, Vec<u8>)> {
    require_exists(path)?;

    let supported = extension_of(path).is_some_and(|ext| accepted.contains(&ext.as_str()));
    if !supported {
        return Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            expected: accepted
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let buffer = fs::read(path).map_err(|e| Error::io(path, e))?;
    let record = FileRecord::observe(path).map_err(|e| Error::io(path, e))?;
    Ok((record, buffer))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn id3v1_trailer(buffer: &[u8]) -> Option<&[u8]> {
    let start = buffer.len().checked_sub(ID3V1_LEN)?;
    let trailer = &buffer[start..];
    trailer.starts_with(b"TAG").then_some(trailer)
}

/// Locates the first occurrence of `frame_id` and decodes its text payload.
///
/// The declared frame size bounds the payload when it fits in the buffer;
/// either way at most [`ID3V2_MAX_VALUE_BYTES`] are taken.
fn id3v2_frame(buffer: &[u8], frame_id: &[u8; 4], version: u8) -> Option<String> {
    let index = find(buffer, frame_id)?;
    let start = index + ID3V2_FRAME_HEADER_LEN;
    if start >= buffer.len() {
        return None;
    }

    let size_bytes: [u8; 4] = buffer.get(index + 4..index + 8)?.try_into().ok()?;
    let declared = match version {
        4.. => syncsafe(size_bytes),
        _ => u32::from_be_bytes(size_bytes),
    };
    let declared = declared as usize;

    let available = buffer.len() - start;
    let len = if declared > 0 && declared <= available {
        declared
    } else {
        available
    };
    let payload = &buffer[start..start + len.min(ID3V2_MAX_VALUE_BYTES)];

    clean(&decode_text(payload))
}

fn syncsafe(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0, |acc, b| (acc << 7) | u32::from(b & 0x7f))
}

/// Decodes an ID3v2 text payload according to its leading encoding byte.
fn decode_text(payload: &[u8]) -> String {
    match payload.split_first() {
        Some((0, rest)) => latin1(rest),
        Some((1, rest)) => utf16(rest, None),
        Some((2, rest)) => utf16(rest, Some(true)),
        Some((3, rest)) => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(payload).into_owned(),
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes UTF-16; without a fixed byte order, a BOM decides (little-endian if absent).
fn utf16(bytes: &[u8], big_endian: Option<bool>) -> String {
    let (big_endian, body) = match (big_endian, bytes) {
        (Some(be), _) => (be, bytes),
        (None, [0xfe, 0xff, rest @ ..]) => (true, rest),
        (None, [0xff, 0xfe, rest @ ..]) => (false, rest),
        (None, _) => (false, bytes),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Strips control characters and surrounding whitespace; empty becomes `None`.
fn clean(value: &str) -> Option<String> {
    let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
