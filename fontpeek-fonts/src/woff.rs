//! WOFF 1.0 to sfnt conversion.
//!
//! Each table is stored either raw or zlib-compressed; decoding inflates the
//! tables and lays them out behind a rebuilt sfnt header and table directory.
//! Metadata and private blocks are ignored.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::RasterError;

const SIGNATURE: &[u8; 4] = b"wOFF";
const HEADER_LEN: usize = 44;
const ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_ENTRY_LEN: usize = 16;

/// Upper bound on the decoded font size.
pub const MAX_DECODED_SIZE: usize = 64 * 1024 * 1024;

fn read_u16(data: &[u8], at: usize) -> Result<u16, RasterError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(RasterError::InvalidWoff("truncated header"))
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, RasterError> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(RasterError::InvalidWoff("truncated header"))
}

struct TableEntry {
    tag: [u8; 4],
    offset: usize,
    comp_length: usize,
    orig_length: usize,
    checksum: u32,
}

fn padded(len: usize) -> usize {
    len.saturating_add(3) & !3
}

fn inflate(compressed: &[u8], orig_length: usize) -> Result<Vec<u8>, RasterError> {
    let mut table = Vec::with_capacity(orig_length);
    ZlibDecoder::new(compressed)
        .take(orig_length as u64 + 1)
        .read_to_end(&mut table)
        .map_err(|_| RasterError::InvalidWoff("corrupt compressed table"))?;
    if table.len() != orig_length {
        return Err(RasterError::InvalidWoff("table length mismatch"));
    }
    Ok(table)
}

/// Decode a WOFF file into the TrueType/OpenType bytes it wraps.
pub fn decode_woff(data: &[u8]) -> Result<Vec<u8>, RasterError> {
    if data.get(..4) != Some(SIGNATURE.as_slice()) {
        return Err(RasterError::InvalidWoff("bad signature"));
    }
    let flavor = read_u32(data, 4)?;
    let num_tables = usize::from(read_u16(data, 12)?);
    if num_tables == 0 {
        return Err(RasterError::InvalidWoff("no tables"));
    }

    let mut entries = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let at = HEADER_LEN + i * ENTRY_LEN;
        let tag = data
            .get(at..at + 4)
            .and_then(|t| <[u8; 4]>::try_from(t).ok())
            .ok_or(RasterError::InvalidWoff("truncated table directory"))?;
        entries.push(TableEntry {
            tag,
            offset: read_u32(data, at + 4)? as usize,
            comp_length: read_u32(data, at + 8)? as usize,
            orig_length: read_u32(data, at + 12)? as usize,
            checksum: read_u32(data, at + 16)?,
        });
    }

    let mut total = SFNT_HEADER_LEN + num_tables * SFNT_ENTRY_LEN;
    for entry in &entries {
        if entry.comp_length > entry.orig_length {
            return Err(RasterError::InvalidWoff("compressed table larger than original"));
        }
        total = total
            .checked_add(padded(entry.orig_length))
            .filter(|t| *t <= MAX_DECODED_SIZE)
            .ok_or(RasterError::InvalidWoff("decoded font too large"))?;
    }

    // Largest power of two not above num_tables.
    let entry_selector = usize::BITS - 1 - num_tables.leading_zeros();
    let search_range = (1usize << entry_selector) * SFNT_ENTRY_LEN;
    let range_shift = num_tables * SFNT_ENTRY_LEN - search_range;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&(search_range as u16).to_be_bytes());
    out.extend_from_slice(&(entry_selector as u16).to_be_bytes());
    out.extend_from_slice(&(range_shift as u16).to_be_bytes());

    let mut offset = SFNT_HEADER_LEN + num_tables * SFNT_ENTRY_LEN;
    for entry in &entries {
        out.extend_from_slice(&entry.tag);
        out.extend_from_slice(&entry.checksum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(entry.orig_length as u32).to_be_bytes());
        offset += padded(entry.orig_length);
    }

    for entry in &entries {
        let stored = entry
            .offset
            .checked_add(entry.comp_length)
            .and_then(|end| data.get(entry.offset..end))
            .ok_or(RasterError::InvalidWoff("table outside file"))?;
        if entry.comp_length == entry.orig_length {
            out.extend_from_slice(stored);
        } else {
            out.extend_from_slice(&inflate(stored, entry.orig_length)?);
        }
        out.resize(padded(out.len()), 0);
    }
    Ok(out)
}
