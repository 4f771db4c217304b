//! JPEG EXIF codec
//!
//! JPEG metadata lives in an APP1 segment whose payload is `Exif\0\0`
//! followed by a TIFF structure (see [`crate::exif`]). Rewrites splice a
//! fresh APP1 into the marker stream and copy every other segment, and the
//! entire entropy-coded stream after SOS, verbatim.

use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    exif, ImageCodec,
};

const MARKER_SOI: u8 = 0xD8;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;

const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Hard limit from the 16-bit segment length field (includes the two length
/// bytes themselves).
const MAX_SEGMENT_PAYLOAD: usize = 0xFFFF - 2;

/// JPEG metadata codec
pub struct JpegCodec;

struct Segment<'a> {
    marker: u8,
    /// Payload excluding marker and length bytes
    data: &'a [u8],
    /// Absolute offset of the 0xFF marker byte
    start: usize,
    /// Absolute offset one past the segment
    end: usize,
}

/// Walk the marker segments up to (and including) SOS. The caller treats
/// everything after the SOS segment header as opaque entropy-coded data.
fn segments(bytes: &[u8]) -> Result<Vec<Segment<'_>>> {
    if bytes.len() < 2 || bytes[0] != 0xFF || bytes[1] != MARKER_SOI {
        return Err(Error::CorruptJpeg("missing SOI marker".to_string()));
    }

    let mut out = Vec::new();
    let mut pos = 2;
    loop {
        // Fill bytes before a marker are legal.
        while pos + 1 < bytes.len() && bytes[pos] == 0xFF && bytes[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 2 > bytes.len() {
            return Err(Error::CorruptJpeg("truncated marker stream".to_string()));
        }
        if bytes[pos] != 0xFF {
            return Err(Error::CorruptJpeg(format!(
                "expected marker at offset {pos}"
            )));
        }
        let marker = bytes[pos + 1];
        if marker == MARKER_EOI {
            break;
        }
        // Standalone markers carry no length field.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        if pos + 4 > bytes.len() {
            return Err(Error::CorruptJpeg("truncated segment header".to_string()));
        }
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > bytes.len() {
            return Err(Error::CorruptJpeg(format!(
                "truncated segment 0x{marker:02X} at offset {pos}"
            )));
        }
        out.push(Segment {
            marker,
            data: &bytes[pos + 4..pos + 2 + len],
            start: pos,
            end: pos + 2 + len,
        });
        if marker == MARKER_SOS {
            break;
        }
        pos += 2 + len;
    }
    Ok(out)
}

fn is_exif_app1(segment: &Segment<'_>) -> bool {
    segment.marker == MARKER_APP1 && segment.data.starts_with(EXIF_HEADER)
}

fn push_app1_exif(out: &mut Vec<u8>, tiff: &[u8]) -> Result<()> {
    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(Error::EntryTooLarge("APP1 Exif".to_string(), payload_len));
    }
    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    Ok(())
}

impl ImageCodec for JpegCodec {
    fn read_metadata(&self, bytes: &[u8]) -> Result<BTreeMap<String, String>> {
        for segment in segments(bytes)? {
            if is_exif_app1(&segment) {
                return exif::read_tags(&segment.data[EXIF_HEADER.len()..]);
            }
        }
        Ok(BTreeMap::new())
    }

    fn write_metadata(
        &self,
        bytes: &[u8],
        entries: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>> {
        // Merge over whatever EXIF already exists; a payload too corrupt to
        // parse contributes nothing and gets replaced outright.
        let mut merged = self.read_metadata(bytes).unwrap_or_default();
        for (key, value) in entries {
            merged.insert(key.clone(), value.clone());
        }
        let tiff = exif::build_tiff(&merged)?;

        let parsed = segments(bytes)?;
        let mut out = Vec::with_capacity(bytes.len() + tiff.len() + 16);
        out.extend_from_slice(&bytes[..2]);

        // EXIF wants APP1 up front; keep a leading JFIF APP0 ahead of it.
        let leading_app0 = parsed.first().filter(|s| s.marker == MARKER_APP0);
        if let Some(first) = leading_app0 {
            out.extend_from_slice(&bytes[first.start..first.end]);
        }
        push_app1_exif(&mut out, &tiff)?;

        let mut tail_copied = false;
        for segment in parsed.iter().skip(usize::from(leading_app0.is_some())) {
            if is_exif_app1(segment) {
                continue;
            }
            out.extend_from_slice(&bytes[segment.start..segment.end]);
            if segment.marker == MARKER_SOS {
                // Entropy-coded data and trailer, byte-for-byte.
                out.extend_from_slice(&bytes[segment.end..]);
                tail_copied = true;
                break;
            }
        }
        if !tail_copied {
            // No scan (marker stream ended at EOI); keep the trailer anyway.
            let tail_start = parsed.last().map_or(2, |s| s.end);
            out.extend_from_slice(&bytes[tail_start..]);
        }
        Ok(out)
    }
}
