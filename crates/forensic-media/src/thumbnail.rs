//! Embedded thumbnail extraction.
//!
//! Exif writers store camera-generated thumbnails as complete JPEG streams
//! inside APP1 segments. This module walks the marker segments of a source
//! image, pulls every embedded SOI..EOI stream out of its application
//! segments, and writes each one to the output directory.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::jpeg::{marker, JpegError, JpegResult, MarkerScanner};

/// Result of one thumbnail scan.
#[derive(Debug, Default)]
pub struct ThumbnailScan {
    /// Paths of extracted thumbnail files, in discovery order.
    pub thumbnail_paths: Vec<PathBuf>,
    /// Total marker segments seen before start-of-scan.
    pub marker_count: u32,
    /// Application (APPn) segments among them.
    pub app_segment_count: u32,
}

/// Scan `source` and write every embedded thumbnail to `out_dir` as
/// `thumbnail_<n>.jpg`.
pub fn extract_thumbnails(source: &Path, out_dir: &Path) -> JpegResult<ThumbnailScan> {
    let file = File::open(source)?;
    let mut scanner = MarkerScanner::new(BufReader::new(file));
    let mut scan = ThumbnailScan::default();

    loop {
        let m = scanner.next_marker()?;
        scan.marker_count += 1;
        // SOS is terminal for the scanner; EOI ends a header-only stream.
        if m.code == marker::SOS || m.code == marker::EOI {
            break;
        }
        if is_app_segment(m.code) {
            scan.app_segment_count += 1;
            // Thumbnails are only expected in Exif (APP1) and Photoshop
            // IRB (APP13) payloads.
            if m.code == marker::APP1 || m.code == marker::APP13 {
                let payload = scanner.read_payload_to_vec()?;
                for stream in embedded_jpeg_streams(&payload) {
                    let index = scan.thumbnail_paths.len();
                    let path = out_dir.join(format!("thumbnail_{index}.jpg"));
                    write_artifact(&path, stream)?;
                    debug!(
                        path = %path.display(),
                        bytes = stream.len(),
                        "extracted embedded thumbnail"
                    );
                    scan.thumbnail_paths.push(path);
                }
            }
        }
    }
    Ok(scan)
}

fn is_app_segment(code: u16) -> bool {
    (0xFFE0..=0xFFEF).contains(&code)
}

/// Locate complete SOI..EOI streams embedded in a segment payload.
fn embedded_jpeg_streams(payload: &[u8]) -> Vec<&[u8]> {
    let mut streams = Vec::new();
    let mut pos = 0;
    while pos + 4 <= payload.len() {
        if payload[pos] == 0xFF && payload[pos + 1] == 0xD8 && payload[pos + 2] == 0xFF {
            if let Some(end) = find_eoi(&payload[pos..]) {
                streams.push(&payload[pos..pos + end]);
                pos += end;
                continue;
            }
        }
        pos += 1;
    }
    streams
}

fn find_eoi(data: &[u8]) -> Option<usize> {
    data.windows(2)
        .position(|w| w == [0xFF, 0xD9])
        .map(|i| i + 2)
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), JpegError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(JpegError::Io)?;
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal but complete embedded JPEG stream for tests.
    fn tiny_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x01, 0x02];
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    /// Source image with one Exif segment containing an embedded thumbnail.
    fn source_with_thumbnail() -> Vec<u8> {
        let inner = tiny_jpeg();
        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&[0u8; 8]); // TIFF header filler
        app1.extend_from_slice(&inner);

        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE1]);
        data.extend_from_slice(&((app1.len() as u16 + 2).to_be_bytes()));
        data.extend_from_slice(&app1);
        // SOS header, then entropy data
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        data.extend_from_slice(&[0x55; 8]);
        data
    }

    #[test]
    fn extracts_embedded_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("img.jpg");
        std::fs::write(&source, source_with_thumbnail()).unwrap();

        let scan = extract_thumbnails(&source, dir.path()).unwrap();
        assert_eq!(scan.thumbnail_paths.len(), 1);
        assert_eq!(scan.app_segment_count, 1);
        // SOI, APP1, SOS
        assert_eq!(scan.marker_count, 3);

        let extracted = std::fs::read(&scan.thumbnail_paths[0]).unwrap();
        assert_eq!(extracted, tiny_jpeg());
    }

    #[test]
    fn no_thumbnail_yields_empty_scan() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.jpg");
        // SOI straight to SOS: no app segments at all.
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        std::fs::write(&source, data).unwrap();

        let scan = extract_thumbnails(&source, dir.path()).unwrap();
        assert!(scan.thumbnail_paths.is_empty());
        assert_eq!(scan.app_segment_count, 0);
    }

    #[test]
    fn truncated_source_surfaces_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cut.jpg");
        let mut data = source_with_thumbnail();
        data.truncate(7); // cut inside the APP1 payload
        std::fs::write(&source, data).unwrap();

        assert!(matches!(
            extract_thumbnails(&source, dir.path()),
            Err(JpegError::Truncated { .. })
        ));
    }
}
