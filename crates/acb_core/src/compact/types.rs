//! Static table-id → type identity mapping used by table references.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeTableEntry {
    pub table_id: u8,
    pub type_hash: u32,
    pub type_name: &'static str,
}

impl TypeTableEntry {
    const fn new(table_id: u8, type_hash: u32, type_name: &'static str) -> Self {
        Self {
            table_id,
            type_hash,
            type_name,
        }
    }

    /// Ids seen in saves whose type hash has not been recovered.
    pub fn is_placeholder(&self) -> bool {
        self.type_hash == 0
    }
}

/// Sorted by `table_id`. Ids 0x00..=0x67 carry verified hashes; the last
/// four were observed in saves without a known hash.
pub const TYPE_TABLE: &[TypeTableEntry] = &[
    TypeTableEntry::new(0x00, 0x87BF_B8DB, "CompactType_00"),
    TypeTableEntry::new(0x01, 0x5B08_85B7, "CompactType_01"),
    TypeTableEntry::new(0x02, 0x95DE_1A76, "CompactType_02"),
    TypeTableEntry::new(0x03, 0x6EC3_C146, "CompactType_03"),
    TypeTableEntry::new(0x04, 0x1039_317E, "CompactType_04"),
    TypeTableEntry::new(0x05, 0x0B1C_A4FF, "CompactType_05"),
    TypeTableEntry::new(0x06, 0x0899_9B6B, "CompactType_06"),
    TypeTableEntry::new(0x07, 0xE45C_13C1, "CompactType_07"),
    TypeTableEntry::new(0x08, 0xC9A5_839D, "CompactType_08"),
    TypeTableEntry::new(0x09, 0x723C_7DFD, "CompactType_09"),
    TypeTableEntry::new(0x0A, 0xC438_CAAA, "CompactType_0A"),
    TypeTableEntry::new(0x0B, 0x82A2_AEE0, "CompactType_0B"),
    TypeTableEntry::new(0x0C, 0x885F_D270, "CompactType_0C"),
    TypeTableEntry::new(0x0D, 0x9ED7_3EC7, "CompactType_0D"),
    TypeTableEntry::new(0x0E, 0xB01D_2FBC, "CompactType_0E"),
    TypeTableEntry::new(0x0F, 0x635E_D6FD, "CompactType_0F"),
    TypeTableEntry::new(0x10, 0x2138_9788, "CompactType_10"),
    TypeTableEntry::new(0x11, 0x7C0A_22D2, "CompactType_11"),
    TypeTableEntry::new(0x12, 0x5E9D_4672, "CompactType_12"),
    TypeTableEntry::new(0x13, 0x9464_A1DF, "CompactType_13"),
    TypeTableEntry::new(0x14, 0xCE77_DEA9, "CompactType_14"),
    TypeTableEntry::new(0x15, 0xF34A_E634, "CompactType_15"),
    TypeTableEntry::new(0x16, 0x0AFD_89DC, "PlayerOptionsElement"),
    TypeTableEntry::new(0x17, 0x6FEB_4D3E, "CompactType_17"),
    TypeTableEntry::new(0x18, 0x1BD6_AF74, "CompactType_18"),
    TypeTableEntry::new(0x19, 0x7EC0_6B96, "CompactType_19"),
    TypeTableEntry::new(0x1A, 0xFE52_CE42, "CompactType_1A"),
    TypeTableEntry::new(0x1B, 0x1EAE_1A27, "CompactType_1B"),
    TypeTableEntry::new(0x1C, 0xEEFD_3C62, "CompactType_1C"),
    TypeTableEntry::new(0x1D, 0x8178_B0FC, "CompactType_1D"),
    TypeTableEntry::new(0x1E, 0x35A7_3BF9, "CompactType_1E"),
    TypeTableEntry::new(0x1F, 0xD17B_9E84, "CompactType_1F"),
    TypeTableEntry::new(0x20, 0x1B21_59BE, "CompactType_20"),
    TypeTableEntry::new(0x21, 0xC30F_CF3C, "CompactType_21"),
    TypeTableEntry::new(0x22, 0xB2AC_9ECF, "CompactType_22"),
    TypeTableEntry::new(0x23, 0xEEA8_4BEB, "CompactType_23"),
    TypeTableEntry::new(0x24, 0xA387_B867, "CompactType_24"),
    TypeTableEntry::new(0x25, 0x07F8_4685, "CompactType_25"),
    TypeTableEntry::new(0x26, 0x04B2_6A6F, "CompactType_26"),
    TypeTableEntry::new(0x27, 0x649B_330F, "CompactType_27"),
    TypeTableEntry::new(0x28, 0xB17C_A151, "CompactType_28"),
    TypeTableEntry::new(0x29, 0xFDDE_216B, "CompactType_29"),
    TypeTableEntry::new(0x2A, 0x2EF0_DC94, "CompactType_2A"),
    TypeTableEntry::new(0x2B, 0x0A0E_F2AB, "CompactType_2B"),
    TypeTableEntry::new(0x2C, 0x0DF3_8019, "CompactType_2C"),
    TypeTableEntry::new(0x2D, 0xB342_3CBF, "CompactType_2D"),
    TypeTableEntry::new(0x2E, 0x7998_5A47, "CompactType_2E"),
    TypeTableEntry::new(0x2F, 0xBE42_7635, "CompactType_2F"),
    TypeTableEntry::new(0x30, 0x9690_57FD, "CompactType_30"),
    TypeTableEntry::new(0x31, 0xC31A_6D47, "CompactType_31"),
    TypeTableEntry::new(0x32, 0x0DC7_52FA, "CompactType_32"),
    TypeTableEntry::new(0x33, 0xF04D_FE62, "CompactType_33"),
    TypeTableEntry::new(0x34, 0xC38E_48D7, "CompactType_34"),
    TypeTableEntry::new(0x35, 0xEAAC_8DA8, "CompactType_35"),
    TypeTableEntry::new(0x36, 0x33D7_1609, "CompactType_36"),
    TypeTableEntry::new(0x37, 0x5949_EFD9, "CompactType_37"),
    TypeTableEntry::new(0x38, 0xFA1A_A549, "CompactType_38"),
    TypeTableEntry::new(0x39, 0x8FC5_A10C, "CompactType_39"),
    TypeTableEntry::new(0x3A, 0x3C4C_3BD2, "CompactType_3A"),
    TypeTableEntry::new(0x3B, 0xFC6E_DE2A, "CompactType_3B"),
    TypeTableEntry::new(0x3C, 0xF571_8FB1, "CompactType_3C"),
    TypeTableEntry::new(0x3D, 0xE051_FC8F, "CompactType_3D"),
    TypeTableEntry::new(0x3E, 0x83BA_68A2, "CompactType_3E"),
    TypeTableEntry::new(0x3F, 0x6D2E_5F10, "CompactType_3F"),
    TypeTableEntry::new(0x40, 0x762B_59C4, "CompactType_40"),
    TypeTableEntry::new(0x41, 0x252E_9992, "CompactType_41"),
    TypeTableEntry::new(0x42, 0xB507_DD42, "CompactType_42"),
    TypeTableEntry::new(0x43, 0xE27B_FE05, "CompactType_43"),
    TypeTableEntry::new(0x44, 0x4DAC_6313, "CompactType_44"),
    TypeTableEntry::new(0x45, 0xAF9F_222E, "CompactType_45"),
    TypeTableEntry::new(0x46, 0xE418_1084, "CompactType_46"),
    TypeTableEntry::new(0x47, 0x289A_D354, "CompactType_47"),
    TypeTableEntry::new(0x48, 0x8D47_4522, "CompactType_48"),
    TypeTableEntry::new(0x49, 0x144E_1498, "CompactType_49"),
    TypeTableEntry::new(0x4A, 0x6349_240E, "CompactType_4A"),
    TypeTableEntry::new(0x4B, 0xFD2D_B1AD, "CompactType_4B"),
    TypeTableEntry::new(0x4C, 0x8A2A_813B, "CompactType_4C"),
    TypeTableEntry::new(0x4D, 0x1323_D081, "CompactType_4D"),
    TypeTableEntry::new(0x4E, 0x6424_E017, "CompactType_4E"),
    TypeTableEntry::new(0x4F, 0xF49B_FD86, "CompactType_4F"),
    TypeTableEntry::new(0x50, 0x839C_CD10, "CompactType_50"),
    TypeTableEntry::new(0x51, 0xE35B_44F5, "CompactType_51"),
    TypeTableEntry::new(0x52, 0x945C_7463, "CompactType_52"),
    TypeTableEntry::new(0x53, 0x0D55_25D9, "CompactType_53"),
    TypeTableEntry::new(0x54, 0x7A52_154F, "CompactType_54"),
    TypeTableEntry::new(0x55, 0xE436_80EC, "CompactType_55"),
    TypeTableEntry::new(0x56, 0x9331_B07A, "CompactType_56"),
    TypeTableEntry::new(0x57, 0x0A38_E1C0, "CompactType_57"),
    TypeTableEntry::new(0x58, 0x7D3F_D156, "CompactType_58"),
    TypeTableEntry::new(0x59, 0xED80_CCC7, "CompactType_59"),
    TypeTableEntry::new(0x5A, 0x9A87_FC51, "CompactType_5A"),
    TypeTableEntry::new(0x5B, 0xC876_1736, "CompactType_5B"),
    TypeTableEntry::new(0x5C, 0xE3E5_8C35, "CompactType_5C"),
    TypeTableEntry::new(0x5D, 0x7AEC_DD8F, "CompactType_5D"),
    TypeTableEntry::new(0x5E, 0x0DEB_ED19, "CompactType_5E"),
    TypeTableEntry::new(0x5F, 0x938F_78BA, "CompactType_5F"),
    TypeTableEntry::new(0x60, 0xE488_482C, "CompactType_60"),
    TypeTableEntry::new(0x61, 0xE2A9_97E4, "CompactType_61"),
    TypeTableEntry::new(0x62, 0x7BA0_C65E, "CompactType_62"),
    TypeTableEntry::new(0x63, 0x0CA7_F6C8, "CompactType_63"),
    TypeTableEntry::new(0x64, 0x92C3_636B, "CompactType_64"),
    TypeTableEntry::new(0x65, 0xE5C4_53FD, "CompactType_65"),
    TypeTableEntry::new(0x66, 0x0633_7DCC, "CompactType_66"),
    TypeTableEntry::new(0x67, 0x78A9_0B6B, "CompactType_67"),
    TypeTableEntry::new(0x95, 0x0000_0000, "Unknown_95"),
    TypeTableEntry::new(0xDB, 0x0000_0000, "Unknown_DB"),
    TypeTableEntry::new(0xE1, 0x0000_0000, "Unknown_E1"),
    TypeTableEntry::new(0xFB, 0x0000_0000, "Unknown_FB"),
];

pub fn lookup_type(table_id: u8) -> Option<&'static TypeTableEntry> {
    TYPE_TABLE
        .binary_search_by_key(&table_id, |entry| entry.table_id)
        .ok()
        .map(|index| &TYPE_TABLE[index])
}
