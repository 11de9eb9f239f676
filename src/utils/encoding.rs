//! Postings codec: delta-gap variable-length integers.
//!
//! A posting list `[d0, d1, ..., dn]` is stored as `d0, d1-d0, ..., dn-dn-1`,
//! each gap written as an unsigned LEB128-style varint (7 payload bits per
//! byte, high bit set while more bytes follow). The stream carries no length
//! or terminator: callers frame it with the document frequency recorded in the
//! dictionary.

use crate::index::types::DocId;
use thiserror::Error;

/// Failures while decoding a postings stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("postings offset {offset} is past the end of the store ({len} bytes)")]
    OffsetOutOfRange { offset: u64, len: usize },

    #[error("postings stream ended after {decoded} of {expected} values")]
    Truncated { decoded: usize, expected: usize },

    #[error("varint does not fit in the target integer type")]
    Overflow,
}

/// Encode a u64 as a variable-length integer
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns `Ok(None)` when the slice ends mid-value, `(value, bytes_consumed)` otherwise.
pub fn decode_varint(buf: &[u8]) -> Result<Option<(u64, usize)>, CodecError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().enumerate() {
        let payload = (byte & 0x7F) as u64;
        if shift >= 64 || (shift == 63 && payload > 1) {
            return Err(CodecError::Overflow);
        }

        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok(Some((result, i + 1)));
        }

        shift += 7;
    }

    Ok(None)
}

/// Gap-encode a strictly increasing list of doc ids, appending to `buf`.
/// Returns the number of bytes written.
pub fn encode_postings(doc_ids: &[DocId], buf: &mut Vec<u8>) -> usize {
    let start = buf.len();
    let mut prev: Option<DocId> = None;
    for &id in doc_ids {
        let gap = match prev {
            None => id,
            Some(p) => {
                debug_assert!(id > p, "posting list must be strictly increasing");
                id - p
            }
        };
        encode_varint(gap as u64, buf);
        prev = Some(id);
    }
    buf.len() - start
}

/// Decode exactly `df` gaps starting at `offset` and rebuild the ids by running sum.
pub fn decode_postings(store: &[u8], offset: u64, df: u32) -> Result<Vec<DocId>, CodecError> {
    decode_postings_with_len(store, offset, df).map(|(ids, _)| ids)
}

/// Like [`decode_postings`], also returning how many bytes the list occupied.
pub fn decode_postings_with_len(
    store: &[u8],
    offset: u64,
    df: u32,
) -> Result<(Vec<DocId>, usize), CodecError> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&s| s <= store.len())
        .ok_or(CodecError::OffsetOutOfRange {
            offset,
            len: store.len(),
        })?;

    let expected = df as usize;
    let mut ids = Vec::with_capacity(expected);
    let mut pos = start;
    let mut current: u64 = 0;

    for i in 0..expected {
        let (gap, consumed) = decode_varint(&store[pos..])?.ok_or(CodecError::Truncated {
            decoded: i,
            expected,
        })?;
        current = if i == 0 {
            gap
        } else {
            current.checked_add(gap).ok_or(CodecError::Overflow)?
        };
        ids.push(DocId::try_from(current).map_err(|_| CodecError::Overflow)?);
        pos += consumed;
    }

    Ok((ids, pos - start))
}
