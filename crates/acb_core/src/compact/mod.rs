//! Decoder for the prefix-tagged compact format used inside blocks 3 and 5.
//!
//! A stream is an 8-byte header, a preamble running up to the first table
//! reference, then a flat run of records. Each record is recognised by its
//! two leading bytes (or a single marker byte). Bytes that match nothing are
//! counted and skipped; they never abort the decode.

pub mod analysis;
pub mod entry;
pub mod types;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::error::{Result, SaveError};
use entry::{
    ARRAY_ELEMENT, ElementValue, Entry, EXTENDED, ExtendedValue, FIXED_32, FixedKind, Marker,
    OpaquePrefix, Record, RecordTag, TABLE_REF, TYPE_REF, VALUE_12, VALUE_15, VARINT,
};

pub const COMPACT_HEADER_LEN: usize = 8;
pub const COMPACT_VERSION: u8 = 0x01;
pub const COMPACT_FLAGS: u32 = 0x0080_0000;
pub const MAX_VARINT_LEN: usize = 5;
/// Longest raw value carried by a variable-length extended record.
pub const MAX_REFERENCE_LEN: usize = 5;

/// Bytes that end a variable-length extended value: the first byte of a
/// known prefix, or a marker.
const REFERENCE_STOP_BYTES: [u8; 13] = [
    0x08, 0x1C, 0x17, 0x15, 0x12, 0x14, 0x10, 0x18, 0x19, 0x0C, 0x6D, 0xDB, 0xCD,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactHeader {
    pub version: u8,
    /// 24-bit size field. Not cross-checked against the stream length.
    pub data_size: u32,
    pub flags: u32,
}

impl CompactHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let version = cursor.read_u8("compact header version")?;
        let data_size = cursor.read_u24("compact header data size")?;
        let flags = cursor.read_u32("compact header flags")?;
        Ok(Self {
            version,
            data_size,
            flags,
        })
    }

    /// Version 1 with the usual `00 00 80 00` flags.
    pub fn is_standard(&self) -> bool {
        self.version == COMPACT_VERSION && self.flags == COMPACT_FLAGS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodeStats {
    counts: BTreeMap<RecordTag, usize>,
    pub unclassified: usize,
}

impl DecodeStats {
    fn record(&mut self, tag: RecordTag) {
        *self.counts.entry(tag).or_default() += 1;
    }

    pub fn count(&self, tag: RecordTag) -> usize {
        self.counts.get(&tag).copied().unwrap_or(0)
    }

    /// Non-zero counts in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordTag, usize)> + '_ {
        self.counts.iter().map(|(&tag, &n)| (tag, n))
    }

    pub fn total_entries(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn markers(&self) -> usize {
        self.iter()
            .filter(|(tag, _)| matches!(tag, RecordTag::Marker(_)))
            .map(|(_, n)| n)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStream {
    pub header: CompactHeader,
    /// Bytes between the header and the first table reference.
    pub preamble: Vec<u8>,
    /// Offset of the first byte after the preamble.
    pub data_offset: usize,
    pub entries: Vec<Entry>,
    pub unknown_byte_count: usize,
    pub stats: DecodeStats,
}

/// Decoded entries split by family, in stream order.
#[derive(Debug, Clone, Default)]
pub struct Categories<'a> {
    pub table_refs: Vec<&'a Entry>,
    pub extended_values: Vec<&'a Entry>,
    pub array_elements: Vec<&'a Entry>,
    pub fixed_values: Vec<&'a Entry>,
    pub varints: Vec<&'a Entry>,
    pub type_refs: Vec<&'a Entry>,
    pub opaque: Vec<&'a Entry>,
    pub markers: Vec<&'a Entry>,
}

impl DecodedStream {
    pub fn categories(&self) -> Categories<'_> {
        let mut out = Categories::default();
        for entry in &self.entries {
            let bucket = match entry.record {
                Record::TableRef { .. } => &mut out.table_refs,
                Record::Extended { .. } => &mut out.extended_values,
                Record::ArrayElement { .. } => &mut out.array_elements,
                Record::Fixed { .. } => &mut out.fixed_values,
                Record::Varint { .. } => &mut out.varints,
                Record::TypeRef { .. } => &mut out.type_refs,
                Record::Opaque { .. } => &mut out.opaque,
                Record::Marker { .. } => &mut out.markers,
            };
            bucket.push(entry);
        }
        out
    }
}

/// End of the preamble: the first `08 03` at or after the header, or the
/// end of the header when there is none.
pub fn find_preamble_end(stream: &[u8]) -> usize {
    stream
        .get(COMPACT_HEADER_LEN..)
        .and_then(|body| body.windows(2).position(|w| w == TABLE_REF))
        .map_or(COMPACT_HEADER_LEN, |pos| COMPACT_HEADER_LEN + pos)
}

pub fn decode(stream: &[u8]) -> Result<DecodedStream> {
    let header = CompactHeader::parse(stream)?;
    if !header.is_standard() {
        debug!(
            version = header.version,
            flags = header.flags,
            "compact header has unusual version or flags"
        );
    }

    let data_offset = find_preamble_end(stream);
    let preamble = stream[COMPACT_HEADER_LEN..data_offset].to_vec();

    let mut entries = Vec::new();
    let mut stats = DecodeStats::default();
    let mut pos = data_offset;

    while pos < stream.len() {
        let prefixed = if pos + 1 < stream.len() {
            decode_prefixed(stream, pos)?
        } else {
            None
        };
        let decoded = prefixed.or_else(|| {
            Marker::from_byte(stream[pos]).map(|marker| (Record::Marker { marker }, 1))
        });

        match decoded {
            Some((record, len)) => {
                stats.record(record.tag());
                entries.push(Entry {
                    offset: pos,
                    len,
                    record,
                });
                pos += len;
            }
            None => {
                trace!(offset = pos, byte = stream[pos], "unclassified byte");
                stats.unclassified += 1;
                pos += 1;
            }
        }
    }

    debug!(
        entries = entries.len(),
        unclassified = stats.unclassified,
        preamble_len = preamble.len(),
        "decoded compact stream"
    );

    Ok(DecodedStream {
        header,
        preamble,
        data_offset,
        entries,
        unknown_byte_count: stats.unclassified,
        stats,
    })
}

/// Tries every two-byte prefix at `pos`. A recognised prefix whose record
/// runs past the end of the stream is an error.
fn decode_prefixed(stream: &[u8], pos: usize) -> Result<Option<(Record, usize)>> {
    let prefix = [stream[pos], stream[pos + 1]];
    let mut cursor = ByteCursor::at(stream, pos + 2);

    let record = match prefix {
        TABLE_REF => Record::TableRef {
            table_id: cursor.read_u8("table reference id")?,
            property_id: cursor.read_u8("table reference property")?,
        },
        EXTENDED => {
            let subtype = cursor.read_u8("extended subtype")?;
            let value = match subtype {
                0x08 => ExtendedValue::Byte(cursor.read_u8("extended byte value")?),
                0x21 | 0x23 | 0x24 | 0x25 => {
                    let raw = read_reference(stream, cursor.position());
                    cursor.skip(raw.len(), "extended reference")?;
                    ExtendedValue::Reference(raw.to_vec())
                }
                // 0x0A, 0x0B and unrecognised subtypes all carry a u16.
                _ => ExtendedValue::Word(cursor.read_u16("extended word value")?),
            };
            Record::Extended { subtype, value }
        }
        ARRAY_ELEMENT => {
            let element_type = cursor.read_u8("array element type")?;
            let value = match element_type {
                0x00 => ElementValue::Dword(cursor.read_u32("array element dword")?),
                0x08 => ElementValue::Byte(cursor.read_u8("array element byte")?),
                _ => ElementValue::Word(cursor.read_u16("array element word")?),
            };
            Record::ArrayElement {
                element_type,
                value,
            }
        }
        VALUE_15 | VALUE_12 | FIXED_32 => {
            let kind = match prefix {
                VALUE_15 => FixedKind::Value15,
                VALUE_12 => FixedKind::Value12,
                _ => FixedKind::Fixed32,
            };
            Record::Fixed {
                prefix: kind,
                value: cursor.read_u32("fixed value")?,
            }
        }
        VARINT => {
            let (value, width) = read_varint(stream, pos + 2)?;
            cursor.skip(width, "varint")?;
            Record::Varint { value, width }
        }
        TYPE_REF => Record::TypeRef {
            table_id: cursor.read_u8("type reference id")?,
            extra: cursor.read_u8("type reference extra")?,
        },
        _ => match OpaquePrefix::from_bytes(prefix) {
            Some(opaque) => Record::Opaque {
                prefix: opaque,
                value: cursor.read_u16("opaque value")?,
            },
            None => return Ok(None),
        },
    };

    Ok(Some((record, cursor.position() - pos)))
}

/// Up to [`MAX_REFERENCE_LEN`] bytes from `start`, stopping before any byte
/// that could begin another record.
fn read_reference(stream: &[u8], start: usize) -> &[u8] {
    let tail = stream.get(start..).unwrap_or_default();
    let len = tail
        .iter()
        .take(MAX_REFERENCE_LEN)
        .take_while(|b| !REFERENCE_STOP_BYTES.contains(b))
        .count();
    &tail[..len]
}

/// LEB128-style varint: seven value bits per byte, high bit set on all but
/// the last. At most [`MAX_VARINT_LEN`] bytes are consumed; a run that is
/// still continuing at that point ends there.
pub fn read_varint(stream: &[u8], start: usize) -> Result<(u64, usize)> {
    if start >= stream.len() {
        return Err(SaveError::OutOfBounds {
            context: "varint",
            offset: start,
            needed: 1,
            len: stream.len(),
        });
    }

    let mut value = 0u64;
    let mut width = 0;
    for (i, &byte) in stream[start..].iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u64::from(byte & 0x7F) << (7 * i);
        width = i + 1;
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok((value, width))
}
