//! PNG textual chunk codec
//!
//! PNG carries keyed text in `tEXt` (Latin-1) and `iTXt` (UTF-8) chunks.
//! Reads collect both; writes replace chunks whose keyword is being
//! overwritten and append the new entries immediately before `IEND`, copying
//! every other chunk byte-for-byte.

use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    format::PNG_SIGNATURE,
    ImageCodec,
};

const CHUNK_TEXT: &[u8; 4] = b"tEXt";
const CHUNK_ITXT: &[u8; 4] = b"iTXt";
const CHUNK_ZTXT: &[u8; 4] = b"zTXt";
const CHUNK_IEND: &[u8; 4] = b"IEND";

/// Maximum keyword length permitted by the PNG specification
const MAX_KEYWORD_LEN: usize = 79;

/// PNG metadata codec
pub struct PngCodec;

/// One raw chunk inside a PNG stream.
///
/// `raw` spans the whole chunk (length, type, data, CRC) so untouched chunks
/// can be copied without re-encoding.
struct Chunk<'a> {
    chunk_type: [u8; 4],
    data: &'a [u8],
    raw: &'a [u8],
}

fn chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(Error::CorruptPng("missing PNG signature".to_string()));
    }

    let mut out = Vec::new();
    let mut pos = PNG_SIGNATURE.len();
    while pos < bytes.len() {
        if pos + 8 > bytes.len() {
            return Err(Error::CorruptPng(format!(
                "truncated chunk header at offset {pos}"
            )));
        }
        let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
            as usize;
        let mut chunk_type = [0u8; 4];
        chunk_type.copy_from_slice(&bytes[pos + 4..pos + 8]);
        let end = pos + 8 + len + 4;
        if end > bytes.len() {
            return Err(Error::CorruptPng(format!(
                "truncated chunk {} at offset {pos}",
                String::from_utf8_lossy(&chunk_type)
            )));
        }
        out.push(Chunk {
            chunk_type,
            data: &bytes[pos + 8..pos + 8 + len],
            raw: &bytes[pos..end],
        });
        if &chunk_type == CHUNK_IEND {
            break;
        }
        pos = end;
    }

    match out.last() {
        Some(last) if &last.chunk_type == CHUNK_IEND => Ok(out),
        _ => Err(Error::CorruptPng("missing IEND chunk".to_string())),
    }
}

/// Extract the keyword of a textual chunk, if it is one we understand.
fn text_keyword(chunk: &Chunk<'_>) -> Option<String> {
    if [CHUNK_TEXT, CHUNK_ITXT, CHUNK_ZTXT].contains(&&chunk.chunk_type) {
        let end = chunk.data.iter().position(|&b| b == 0)?;
        Some(latin1_to_string(&chunk.data[..end]))
    } else {
        None
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn is_latin1(value: &str) -> bool {
    value.chars().all(|c| (c as u32) < 256)
}

/// Parse a `tEXt` chunk: keyword, NUL, Latin-1 text.
fn parse_text(data: &[u8]) -> Option<(String, String)> {
    let sep = data.iter().position(|&b| b == 0)?;
    let keyword = latin1_to_string(&data[..sep]);
    let value = latin1_to_string(&data[sep + 1..]);
    Some((keyword, value))
}

/// Parse an uncompressed `iTXt` chunk: keyword, NUL, compression flag,
/// compression method, language tag, NUL, translated keyword, NUL, UTF-8
/// text. Compressed entries are skipped.
fn parse_itxt(data: &[u8]) -> Option<(String, String)> {
    let sep = data.iter().position(|&b| b == 0)?;
    let keyword = latin1_to_string(&data[..sep]);
    let rest = &data[sep + 1..];
    let (&compression_flag, rest) = rest.split_first()?;
    let (_method, rest) = rest.split_first()?;
    if compression_flag != 0 {
        return None;
    }
    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let trans_end = rest.iter().position(|&b| b == 0)?;
    let text = &rest[trans_end + 1..];
    Some((keyword, String::from_utf8_lossy(text).into_owned()))
}

fn validate_keyword(keyword: &str) -> Result<()> {
    let ok = !keyword.is_empty()
        && keyword.len() <= MAX_KEYWORD_LEN
        && is_latin1(keyword)
        && !keyword.contains('\0')
        && !keyword.starts_with(' ')
        && !keyword.ends_with(' ');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidKey(keyword.to_string()))
    }
}

fn push_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Encode one key/value pair as `tEXt` when the value fits in Latin-1,
/// otherwise as an uncompressed `iTXt`.
fn push_text_entry(out: &mut Vec<u8>, keyword: &str, value: &str) {
    if is_latin1(value) {
        let mut data = Vec::with_capacity(keyword.len() + 1 + value.len());
        data.extend(keyword.chars().map(|c| c as u8));
        data.push(0);
        data.extend(value.chars().map(|c| c as u8));
        push_chunk(out, CHUNK_TEXT, &data);
    } else {
        let mut data = Vec::with_capacity(keyword.len() + 5 + value.len());
        data.extend(keyword.chars().map(|c| c as u8));
        data.push(0);
        data.push(0); // compression flag: none
        data.push(0); // compression method
        data.push(0); // empty language tag
        data.push(0); // empty translated keyword
        data.extend_from_slice(value.as_bytes());
        push_chunk(out, CHUNK_ITXT, &data);
    }
}

impl ImageCodec for PngCodec {
    fn read_metadata(&self, bytes: &[u8]) -> Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        for chunk in chunks(bytes)? {
            let parsed = match &chunk.chunk_type {
                t if t == CHUNK_TEXT => parse_text(chunk.data),
                t if t == CHUNK_ITXT => parse_itxt(chunk.data),
                // zTXt needs inflate; values this crate writes never use it
                _ => None,
            };
            if let Some((keyword, value)) = parsed {
                map.insert(keyword, value);
            }
        }
        Ok(map)
    }

    fn write_metadata(
        &self,
        bytes: &[u8],
        entries: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>> {
        for keyword in entries.keys() {
            validate_keyword(keyword)?;
        }

        let parsed = chunks(bytes)?;
        let mut out = Vec::with_capacity(bytes.len() + 256);
        out.extend_from_slice(&PNG_SIGNATURE);
        for chunk in &parsed {
            // Same-keyword textual chunks are superseded by the new entries.
            if let Some(keyword) = text_keyword(chunk) {
                if entries.contains_key(&keyword) {
                    continue;
                }
            }
            if &chunk.chunk_type == CHUNK_IEND {
                for (keyword, value) in entries {
                    push_text_entry(&mut out, keyword, value);
                }
            }
            out.extend_from_slice(chunk.raw);
        }
        Ok(out)
    }
}
