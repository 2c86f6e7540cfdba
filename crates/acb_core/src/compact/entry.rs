use std::fmt;

use serde::Serialize;

use super::types::{TypeTableEntry, lookup_type};

pub const TABLE_REF: [u8; 2] = [0x08, 0x03];
pub const EXTENDED: [u8; 2] = [0x1C, 0x04];
pub const ARRAY_ELEMENT: [u8; 2] = [0x17, 0x3C];
pub const VALUE_15: [u8; 2] = [0x15, 0x00];
pub const VALUE_12: [u8; 2] = [0x12, 0x00];
pub const FIXED_32: [u8; 2] = [0x05, 0x02];
pub const VARINT: [u8; 2] = [0x14, 0x05];
pub const TYPE_REF: [u8; 2] = [0x10, 0x06];

pub const MARKER_TRUE: u8 = 0x6D;
pub const MARKER_FALSE: u8 = 0xDB;
pub const MARKER_SEPARATOR: u8 = 0xCD;

/// Prefixes that are consumed as a raw u16 without further meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum OpaquePrefix {
    P1809,
    P1907,
    P0C18,
    P1013,
    P1830,
    P140E,
    P1902,
    P16E1,
}

impl OpaquePrefix {
    pub const ALL: [OpaquePrefix; 8] = [
        Self::P1809,
        Self::P1907,
        Self::P0C18,
        Self::P1013,
        Self::P1830,
        Self::P140E,
        Self::P1902,
        Self::P16E1,
    ];

    pub fn bytes(self) -> [u8; 2] {
        match self {
            Self::P1809 => [0x18, 0x09],
            Self::P1907 => [0x19, 0x07],
            Self::P0C18 => [0x0C, 0x18],
            Self::P1013 => [0x10, 0x13],
            Self::P1830 => [0x18, 0x30],
            Self::P140E => [0x14, 0x0E],
            Self::P1902 => [0x19, 0x02],
            Self::P16E1 => [0x16, 0xE1],
        }
    }

    pub fn from_bytes(prefix: [u8; 2]) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.bytes() == prefix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    True,
    False,
    Separator,
}

impl Marker {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MARKER_TRUE => Some(Self::True),
            MARKER_FALSE => Some(Self::False),
            MARKER_SEPARATOR => Some(Self::Separator),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Separator => None,
        }
    }
}

/// The three prefixes followed by a plain u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedKind {
    Value15,
    Value12,
    Fixed32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedValue {
    Byte(u8),
    Word(u16),
    /// Raw bytes of a 0x21/0x23/0x24/0x25 reference, up to five.
    Reference(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementValue {
    Byte(u8),
    Word(u16),
    Dword(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    TableRef { table_id: u8, property_id: u8 },
    Extended { subtype: u8, value: ExtendedValue },
    ArrayElement { element_type: u8, value: ElementValue },
    Fixed { prefix: FixedKind, value: u32 },
    Varint { value: u64, width: usize },
    TypeRef { table_id: u8, extra: u8 },
    Opaque { prefix: OpaquePrefix, value: u16 },
    Marker { marker: Marker },
}

impl Record {
    pub fn tag(&self) -> RecordTag {
        match self {
            Self::TableRef { .. } => RecordTag::TableRef,
            Self::Extended { .. } => RecordTag::Extended,
            Self::ArrayElement { .. } => RecordTag::ArrayElement,
            Self::Fixed { prefix, .. } => match prefix {
                FixedKind::Value15 => RecordTag::Value15,
                FixedKind::Value12 => RecordTag::Value12,
                FixedKind::Fixed32 => RecordTag::Fixed32,
            },
            Self::Varint { .. } => RecordTag::Varint,
            Self::TypeRef { .. } => RecordTag::TypeRef,
            Self::Opaque { prefix, .. } => RecordTag::Opaque(*prefix),
            Self::Marker { marker } => RecordTag::Marker(*marker),
        }
    }

    /// Type identity for table references whose id is in the type table.
    pub fn resolved_type(&self) -> Option<&'static TypeTableEntry> {
        match self {
            Self::TableRef { table_id, .. } => lookup_type(*table_id),
            _ => None,
        }
    }
}

/// One decoded record and where it sits in the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub offset: usize,
    pub len: usize,
    #[serde(flatten)]
    pub record: Record,
}

impl Entry {
    pub fn tag(&self) -> RecordTag {
        self.record.tag()
    }
}

/// Statistics key: one per prefix, plus one per marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordTag {
    TableRef,
    Extended,
    ArrayElement,
    Value15,
    Value12,
    Fixed32,
    Varint,
    TypeRef,
    Opaque(OpaquePrefix),
    Marker(Marker),
}

impl RecordTag {
    pub fn label(self) -> &'static str {
        match self {
            Self::TableRef => "TABLE_REF",
            Self::Extended => "EXTENDED_1C",
            Self::ArrayElement => "ARRAY_ELEM",
            Self::Value15 => "VALUE_15",
            Self::Value12 => "VALUE_12",
            Self::Fixed32 => "FIXED32",
            Self::Varint => "VARINT",
            Self::TypeRef => "TYPE_REF",
            Self::Opaque(OpaquePrefix::P1809) => "PREFIX_1809",
            Self::Opaque(OpaquePrefix::P1907) => "PREFIX_1907",
            Self::Opaque(OpaquePrefix::P0C18) => "PREFIX_0C18",
            Self::Opaque(OpaquePrefix::P1013) => "PREFIX_1013",
            Self::Opaque(OpaquePrefix::P1830) => "PREFIX_1830",
            Self::Opaque(OpaquePrefix::P140E) => "PREFIX_140E",
            Self::Opaque(OpaquePrefix::P1902) => "PREFIX_1902",
            Self::Opaque(OpaquePrefix::P16E1) => "PREFIX_16E1",
            Self::Marker(Marker::True) => "MARKER_6D",
            Self::Marker(Marker::False) => "MARKER_DB",
            Self::Marker(Marker::Separator) => "MARKER_CD",
        }
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
