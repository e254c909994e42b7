//! Image decoding
//!
//! Raw picker bytes (or a `data:` URL) become a displayable [`Image`]: the
//! format is sniffed from magic bytes, intrinsic dimensions are read from
//! the header where the format makes that cheap, and the payload is
//! re-encoded as a base64 `data:` URL.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use document_model::{Image, TextRange};

use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Identifies the format from its leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else if bytes.starts_with(b"BM") && bytes.len() >= 26 {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }

    /// Intrinsic `(width, height)` when the header exposes them
    pub fn dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        let dims = match self {
            ImageFormat::Png => png_dimensions(bytes),
            ImageFormat::Jpeg => jpeg_dimensions(bytes),
            ImageFormat::Gif => gif_dimensions(bytes),
            ImageFormat::Webp => webp_dimensions(bytes),
            ImageFormat::Bmp => bmp_dimensions(bytes),
        }?;
        (dims.0 > 0 && dims.1 > 0).then_some(dims)
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_be_bytes([b[0], b[1]])))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_le_bytes([b[0], b[1]])))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u24(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 3)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], 0]))
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    Some((be_u32(bytes, 16)?, be_u32(bytes, 20)?))
}

fn gif_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    Some((le_u16(bytes, 6)?, le_u16(bytes, 8)?))
}

fn bmp_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let b = bytes.get(18..26)?;
    let width = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    // Negative height marks a top-down bitmap
    let height = i32::from_le_bytes([b[4], b[5], b[6], b[7]]);
    Some((width.unsigned_abs(), height.unsigned_abs()))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut at = 2;
    while at + 4 <= bytes.len() {
        if bytes[at] != 0xFF {
            return None;
        }
        let marker = bytes[at + 1];
        // Padding and standalone markers carry no length
        if marker == 0xFF {
            at += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            at += 2;
            continue;
        }
        let length = be_u16(bytes, at + 2)? as usize;
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return Some((be_u16(bytes, at + 7)?, be_u16(bytes, at + 5)?));
        }
        at += 2 + length;
    }
    None
}

fn webp_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    match bytes.get(12..16)? {
        b"VP8X" => Some((le_u24(bytes, 24)? + 1, le_u24(bytes, 27)? + 1)),
        b"VP8L" => {
            if *bytes.get(20)? != 0x2F {
                return None;
            }
            let b = bytes.get(21..25)?;
            let bits = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        b"VP8 " => Some((le_u16(bytes, 26)? & 0x3FFF, le_u16(bytes, 28)? & 0x3FFF)),
        _ => None,
    }
}

/// Strips a `data:<mime>;base64,` wrapper if present
fn unwrap_data_url(data: &[u8]) -> EditorResult<Vec<u8>> {
    let Some(rest) = data.strip_prefix(b"data:") else {
        return Ok(data.to_vec());
    };
    let text = std::str::from_utf8(rest)
        .map_err(|_| EditorError::DecodeFailure("data URL is not UTF-8".into()))?;
    let (header, payload) = text
        .split_once(',')
        .ok_or_else(|| EditorError::DecodeFailure("data URL has no payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(EditorError::DecodeFailure(
            "only base64 data URLs are supported".into(),
        ));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| EditorError::DecodeFailure(e.to_string()))
}

/// Decodes picker data into an image with the given default display width.
///
/// Height follows the intrinsic aspect ratio when it is known, otherwise
/// `default_height` is used.
pub fn decode_image(data: &[u8], default_width: u32, default_height: u32) -> EditorResult<Image> {
    if data.is_empty() {
        return Err(EditorError::DecodeFailure("no data".into()));
    }
    let bytes = unwrap_data_url(data)?;
    let format = ImageFormat::sniff(&bytes)
        .ok_or_else(|| EditorError::DecodeFailure("unrecognized image format".into()))?;

    let display_height = match format.dimensions(&bytes) {
        Some((width, height)) => {
            let scaled = u64::from(default_width) * u64::from(height) / u64::from(width);
            u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
        }
        None => default_height,
    };

    Ok(Image {
        source: format!("data:{};base64,{}", format.mime(), STANDARD.encode(&bytes)),
        mime: format.mime().to_string(),
        display_width: default_width,
        display_height,
    })
}

/// Handle for an image decode that has been requested but not completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecodeTicket(u64);

impl DecodeTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A queued decode and, when captured, the selection at request time
#[derive(Debug, Clone)]
pub struct PendingDecode {
    pub ticket: DecodeTicket,
    pub data: Vec<u8>,
    pub anchor: Option<TextRange>,
}

/// Outstanding decodes in request order
#[derive(Debug, Default)]
pub struct DecodeQueue {
    next: u64,
    pending: Vec<PendingDecode>,
}

impl DecodeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, data: Vec<u8>, anchor: Option<TextRange>) -> DecodeTicket {
        self.next += 1;
        let ticket = DecodeTicket(self.next);
        self.pending.push(PendingDecode {
            ticket,
            data,
            anchor,
        });
        ticket
    }

    pub fn take(&mut self, ticket: DecodeTicket) -> Option<PendingDecode> {
        let ix = self.pending.iter().position(|p| p.ticket == ticket)?;
        Some(self.pending.remove(ix))
    }

    pub fn take_all(&mut self) -> Vec<PendingDecode> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Minimal PNG header with the given dimensions
    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::png;
    use super::*;
    use document_model::Position;

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageFormat::sniff(&png(1, 1)), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a\x01\x00\x01\x00"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8X"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"hello world"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(ImageFormat::Png.dimensions(&png(640, 480)), Some((640, 480)));
        assert_eq!(ImageFormat::Png.dimensions(&png(0, 480)), None);
    }

    #[test]
    fn test_gif_dimensions() {
        let gif = b"GIF89a\x20\x00\x10\x00";
        assert_eq!(ImageFormat::Gif.dimensions(gif), Some((32, 16)));
    }

    #[test]
    fn test_jpeg_dimensions() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 segment of length 4
        jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
        // SOF0: length, precision, height 100, width 200
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x64, 0x00, 0xC8]);
        assert_eq!(ImageFormat::Jpeg.dimensions(&jpeg), Some((200, 100)));
    }

    #[test]
    fn test_bmp_dimensions_top_down() {
        let mut bmp = b"BM".to_vec();
        bmp.resize(18, 0);
        bmp.extend_from_slice(&50i32.to_le_bytes());
        bmp.extend_from_slice(&(-25i32).to_le_bytes());
        assert_eq!(ImageFormat::Bmp.dimensions(&bmp), Some((50, 25)));
    }

    #[test]
    fn test_decode_scales_by_aspect_ratio() {
        let image = decode_image(&png(600, 300), 300, 200).unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.display_width, 300);
        assert_eq!(image.display_height, 150);
        assert!(image.source.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_decode_unknown_dimensions_uses_default_height() {
        let image = decode_image(&[0xFF, 0xD8, 0xFF, 0xD9], 300, 200).unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.display_height, 200);
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png(10, 10)));
        let image = decode_image(url.as_bytes(), 300, 200).unwrap();
        assert_eq!(image.display_height, 300);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode_image(b"", 300, 200),
            Err(EditorError::DecodeFailure(_))
        ));
        assert!(matches!(
            decode_image(b"plain text", 300, 200),
            Err(EditorError::DecodeFailure(_))
        ));
        assert!(matches!(
            decode_image(b"data:image/png;base64,!!!", 300, 200),
            Err(EditorError::DecodeFailure(_))
        ));
        assert!(matches!(
            decode_image(b"data:text/plain,hello", 300, 200),
            Err(EditorError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_decode_queue_order() {
        let mut queue = DecodeQueue::new();
        let first = queue.enqueue(vec![1], None);
        let caret = TextRange::collapsed(Position::zero());
        let second = queue.enqueue(vec![2], Some(caret));
        assert_ne!(first, second);
        assert_eq!(queue.len(), 2);

        let taken = queue.take(second).unwrap();
        assert_eq!(taken.anchor, Some(caret));
        assert!(queue.take(second).is_none());

        let rest = queue.take_all();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].ticket, first);
        assert!(queue.is_empty());
    }
}
