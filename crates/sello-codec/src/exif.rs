//! Minimal EXIF (TIFF) tag codec
//!
//! Parses and rebuilds the TIFF structure carried inside a JPEG APP1
//! segment. Coverage is bounded to what a metadata rewrite needs: ASCII
//! tags, single-value SHORT/LONG tags and the UserComment UNDEFINED tag, in
//! IFD0 and the Exif sub-IFD. Rational values, GPS and maker-note sub-IFDs
//! are not round-tripped.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_UNDEFINED: u16 = 7;

const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
const TAG_SOFTWARE: u16 = 0x0131;
const TAG_DATETIME: u16 = 0x0132;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;
const TAG_EXIF_IFD: u16 = 0x8769;

const TAG_USER_COMMENT: u16 = 0x9286;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;

const USER_COMMENT_ASCII: [u8; 8] = *b"ASCII\0\0\0";
const USER_COMMENT_UNICODE: [u8; 8] = *b"UNICODE\0";

/// Which IFD a tag lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Ifd0,
    ExifSub,
}

fn known_tag_name(tag: u16, placement: Placement) -> Option<&'static str> {
    match (placement, tag) {
        (Placement::Ifd0, TAG_IMAGE_DESCRIPTION) => Some("ImageDescription"),
        (Placement::Ifd0, TAG_SOFTWARE) => Some("Software"),
        (Placement::Ifd0, TAG_DATETIME) => Some("DateTime"),
        (Placement::Ifd0, TAG_ARTIST) => Some("Artist"),
        (Placement::Ifd0, TAG_COPYRIGHT) => Some("Copyright"),
        (Placement::ExifSub, TAG_USER_COMMENT) => Some("UserComment"),
        (Placement::ExifSub, TAG_DATETIME_ORIGINAL) => Some("DateTimeOriginal"),
        _ => None,
    }
}

fn known_name_tag(name: &str) -> Option<(u16, Placement)> {
    match name {
        "ImageDescription" => Some((TAG_IMAGE_DESCRIPTION, Placement::Ifd0)),
        "Software" => Some((TAG_SOFTWARE, Placement::Ifd0)),
        "DateTime" => Some((TAG_DATETIME, Placement::Ifd0)),
        "Artist" => Some((TAG_ARTIST, Placement::Ifd0)),
        "Copyright" => Some((TAG_COPYRIGHT, Placement::Ifd0)),
        "UserComment" => Some((TAG_USER_COMMENT, Placement::ExifSub)),
        "DateTimeOriginal" => Some((TAG_DATETIME_ORIGINAL, Placement::ExifSub)),
        _ => None,
    }
}

/// Map-key name for a tag with no well-known name.
fn fallback_name(tag: u16, placement: Placement) -> String {
    match placement {
        Placement::Ifd0 => format!("Exif-0x{tag:04X}"),
        Placement::ExifSub => format!("ExifEx-0x{tag:04X}"),
    }
}

fn parse_fallback_name(name: &str) -> Option<(u16, Placement)> {
    let (placement, hex) = if let Some(rest) = name.strip_prefix("Exif-0x") {
        (Placement::Ifd0, rest)
    } else if let Some(rest) = name.strip_prefix("ExifEx-0x") {
        (Placement::ExifSub, rest)
    } else {
        return None;
    };
    u16::from_str_radix(hex, 16).ok().map(|tag| (tag, placement))
}

// ============================================================================
// Reading
// ============================================================================

struct TiffReader<'a> {
    data: &'a [u8],
    le: bool,
}

impl<'a> TiffReader<'a> {
    fn bytes_at(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.bytes_at(offset, 2)?;
        Some(if self.le {
            u16::from_le_bytes([b[0], b[1]])
        } else {
            u16::from_be_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.bytes_at(offset, 4)?;
        Some(if self.le {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        })
    }
}

fn type_size(typ: u16) -> Option<usize> {
    match typ {
        TYPE_ASCII | TYPE_UNDEFINED => Some(1),
        TYPE_SHORT => Some(2),
        TYPE_LONG => Some(4),
        _ => None,
    }
}

fn decode_user_comment(bytes: &[u8], le: bool) -> String {
    if bytes.len() >= 8 {
        let (prefix, rest) = bytes.split_at(8);
        if prefix == USER_COMMENT_ASCII || prefix == [0u8; 8] {
            return String::from_utf8_lossy(rest)
                .trim_end_matches('\0')
                .to_string();
        }
        if prefix == USER_COMMENT_UNICODE {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| {
                    if le {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                })
                .collect();
            return String::from_utf16_lossy(&units)
                .trim_end_matches('\0')
                .to_string();
        }
    }
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
}

/// Parse a TIFF buffer (the APP1 payload after the `Exif\0\0` header) into a
/// flat name → value map. Entries with unsupported types or out-of-range
/// offsets are skipped rather than failing the whole parse.
pub fn read_tags(tiff: &[u8]) -> Result<BTreeMap<String, String>> {
    if tiff.len() < 8 {
        return Err(Error::CorruptExif("truncated TIFF header".to_string()));
    }
    let le = match &tiff[..2] {
        b"II" => true,
        b"MM" => false,
        _ => return Err(Error::CorruptExif("unknown TIFF byte order".to_string())),
    };
    let reader = TiffReader { data: tiff, le };
    if reader.u16_at(2) != Some(42) {
        return Err(Error::CorruptExif("bad TIFF magic".to_string()));
    }
    let ifd0 = reader
        .u32_at(4)
        .ok_or_else(|| Error::CorruptExif("truncated IFD0 offset".to_string()))?
        as usize;

    let mut map = BTreeMap::new();
    read_ifd(&reader, ifd0, Placement::Ifd0, &mut map, 0)?;
    Ok(map)
}

fn read_ifd(
    reader: &TiffReader<'_>,
    offset: usize,
    placement: Placement,
    map: &mut BTreeMap<String, String>,
    depth: u8,
) -> Result<()> {
    if depth > 1 {
        return Ok(());
    }
    let count = reader
        .u16_at(offset)
        .ok_or_else(|| Error::CorruptExif(format!("IFD offset {offset} out of range")))?
        as usize;

    for i in 0..count {
        let base = offset + 2 + i * 12;
        let (tag, typ, value_count) = match (
            reader.u16_at(base),
            reader.u16_at(base + 2),
            reader.u32_at(base + 4),
        ) {
            (Some(t), Some(ty), Some(c)) => (t, ty, c as usize),
            _ => return Err(Error::CorruptExif("truncated IFD entry".to_string())),
        };

        if tag == TAG_EXIF_IFD && typ == TYPE_LONG {
            if let Some(sub_offset) = reader.u32_at(base + 8) {
                read_ifd(reader, sub_offset as usize, Placement::ExifSub, map, depth + 1)?;
            }
            continue;
        }

        let size = match type_size(typ).and_then(|s| s.checked_mul(value_count)) {
            Some(s) => s,
            None => continue,
        };
        let value_bytes = if size <= 4 {
            reader.bytes_at(base + 8, size)
        } else {
            reader
                .u32_at(base + 8)
                .and_then(|off| reader.bytes_at(off as usize, size))
        };
        let value_bytes = match value_bytes {
            Some(b) => b,
            None => continue,
        };

        let value = match typ {
            TYPE_ASCII => String::from_utf8_lossy(value_bytes)
                .trim_end_matches('\0')
                .to_string(),
            TYPE_UNDEFINED if tag == TAG_USER_COMMENT => {
                decode_user_comment(value_bytes, reader.le)
            }
            TYPE_SHORT if value_count == 1 => {
                let b = [value_bytes[0], value_bytes[1]];
                let v = if reader.le {
                    u16::from_le_bytes(b)
                } else {
                    u16::from_be_bytes(b)
                };
                v.to_string()
            }
            TYPE_LONG if value_count == 1 => {
                let b = [value_bytes[0], value_bytes[1], value_bytes[2], value_bytes[3]];
                let v = if reader.le {
                    u32::from_le_bytes(b)
                } else {
                    u32::from_be_bytes(b)
                };
                v.to_string()
            }
            _ => continue,
        };

        let name = known_tag_name(tag, placement)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_name(tag, placement));
        map.insert(name, value);
    }
    Ok(())
}

// ============================================================================
// Writing
// ============================================================================

struct RawField {
    tag: u16,
    typ: u16,
    count: u32,
    data: Vec<u8>,
}

fn ascii_field(tag: u16, value: &str) -> RawField {
    let mut data = value.as_bytes().to_vec();
    data.push(0);
    RawField {
        tag,
        typ: TYPE_ASCII,
        count: data.len() as u32,
        data,
    }
}

fn long_field(tag: u16, value: u32) -> RawField {
    RawField {
        tag,
        typ: TYPE_LONG,
        count: 1,
        data: value.to_le_bytes().to_vec(),
    }
}

fn user_comment_field(value: &str) -> RawField {
    let mut data = USER_COMMENT_ASCII.to_vec();
    data.extend_from_slice(value.as_bytes());
    RawField {
        tag: TAG_USER_COMMENT,
        typ: TYPE_UNDEFINED,
        count: data.len() as u32,
        data,
    }
}

fn padded_len(len: usize) -> usize {
    len + (len & 1)
}

/// Serialize one IFD table plus its out-of-line value area.
///
/// `ifd_offset` is the absolute offset the table will land at; value offsets
/// are computed from it. Fields must already be sorted by tag.
fn layout_ifd(fields: &[RawField], ifd_offset: u32) -> Vec<u8> {
    let table_len = 2 + fields.len() * 12 + 4;
    let mut value_cursor = ifd_offset + table_len as u32;

    let mut table = Vec::with_capacity(table_len);
    let mut values = Vec::new();
    table.extend_from_slice(&(fields.len() as u16).to_le_bytes());
    for field in fields {
        table.extend_from_slice(&field.tag.to_le_bytes());
        table.extend_from_slice(&field.typ.to_le_bytes());
        table.extend_from_slice(&field.count.to_le_bytes());
        if field.data.len() <= 4 {
            let mut inline = field.data.clone();
            inline.resize(4, 0);
            table.extend_from_slice(&inline);
        } else {
            table.extend_from_slice(&value_cursor.to_le_bytes());
            values.extend_from_slice(&field.data);
            if field.data.len() % 2 == 1 {
                values.push(0);
            }
            value_cursor += padded_len(field.data.len()) as u32;
        }
    }
    // No chained IFD
    table.extend_from_slice(&0u32.to_le_bytes());
    table.extend_from_slice(&values);
    table
}

fn ifd_encoded_len(fields: &[RawField]) -> usize {
    let values: usize = fields
        .iter()
        .filter(|f| f.data.len() > 4)
        .map(|f| padded_len(f.data.len()))
        .sum();
    2 + fields.len() * 12 + 4 + values
}

/// Build a little-endian TIFF buffer from a flat name → value map.
///
/// Keys must be well-known tag names or the `Exif-0x…`/`ExifEx-0x…` fallback
/// names produced by [`read_tags`]; anything else cannot be placed in the
/// fixed EXIF tag space and is rejected.
pub fn build_tiff(entries: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let mut ifd0: Vec<RawField> = Vec::new();
    let mut sub: Vec<RawField> = Vec::new();

    for (name, value) in entries {
        let (tag, placement) = known_name_tag(name)
            .or_else(|| parse_fallback_name(name))
            .ok_or_else(|| Error::InvalidKey(name.clone()))?;
        let field = if tag == TAG_USER_COMMENT {
            user_comment_field(value)
        } else if let Ok(numeric) = value.parse::<u32>() {
            long_field(tag, numeric)
        } else {
            ascii_field(tag, value)
        };
        match placement {
            Placement::Ifd0 => ifd0.push(field),
            Placement::ExifSub => sub.push(field),
        }
    }

    let has_sub = !sub.is_empty();
    if has_sub {
        // Pointer size is fixed, so the sub-IFD offset is known up front.
        let pointer = RawField {
            tag: TAG_EXIF_IFD,
            typ: TYPE_LONG,
            count: 1,
            data: Vec::new(),
        };
        ifd0.push(pointer);
        let ifd0_len = ifd_encoded_len(&ifd0);
        let exif_offset = 8 + ifd0_len as u32;
        if let Some(pointer) = ifd0.iter_mut().find(|f| f.tag == TAG_EXIF_IFD) {
            pointer.data = exif_offset.to_le_bytes().to_vec();
        }
    }
    ifd0.sort_by_key(|f| f.tag);
    sub.sort_by_key(|f| f.tag);

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&layout_ifd(&ifd0, 8));
    if has_sub {
        let exif_offset = out.len() as u32;
        out.extend_from_slice(&layout_ifd(&sub, exif_offset));
    }
    Ok(out)
}
