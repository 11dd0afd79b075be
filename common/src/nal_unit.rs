use std::fmt;

use crate::nal_unit_type::NalUnitType;

/// The four-byte sequence `0x00000001` that delimits NAL units in an Annex B byte stream: a
/// `zero_byte` followed by the three-byte start code prefix `0x000001`.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// `NalUnitHeader` is the single byte at the start of every NAL unit:
///
/// ```text
/// +---------------+
/// |7|6|5|4|3|2|1|0|
/// +-+-+-+-+-+-+-+-+
/// |F|NRI|  Type   |
/// +---------------+
/// ```
///
/// Fields are extracted with shifts and masks so the layout does not depend on how a compiler
/// packs bit fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NalUnitHeader {
    /// `forbidden_zero_bit` shall be equal to 0.
    forbidden_zero_bit: bool,

    /// `nal_ref_idc` not equal to 0 specifies that the content of the NAL unit contains a sequence
    /// parameter set, a picture parameter set or a slice of a reference picture. `nal_ref_idc`
    /// shall be equal to 0 for all NAL units having `nal_unit_type` equal to 6, 9, 10, 11, or 12.
    nal_ref_idc: u8,

    /// `nal_unit_type` specifies the type of RBSP data structure contained in the NAL unit.
    nal_unit_type: NalUnitType,
}

impl NalUnitHeader {
    const FORBIDDEN_ZERO_BIT_SHIFT: u8 = 7;
    const NAL_REF_IDC_SHIFT: u8 = 5;
    const NAL_REF_IDC_MASK: u8 = 0b11;
    const NAL_UNIT_TYPE_MASK: u8 = 0b0001_1111;

    /// Decodes a header byte. Every byte value yields a header; out-of-table types classify as
    /// `NalUnitType::Unknown`.
    pub fn decode(byte: u8) -> Self {
        Self {
            forbidden_zero_bit: byte >> Self::FORBIDDEN_ZERO_BIT_SHIFT == 1,
            nal_ref_idc: (byte >> Self::NAL_REF_IDC_SHIFT) & Self::NAL_REF_IDC_MASK,
            nal_unit_type: NalUnitType::from_type_id(byte & Self::NAL_UNIT_TYPE_MASK),
        }
    }

    pub fn forbidden_zero_bit(&self) -> bool {
        self.forbidden_zero_bit
    }

    pub fn nal_ref_idc(&self) -> u8 {
        self.nal_ref_idc
    }

    pub fn nal_type(&self) -> NalUnitType {
        self.nal_unit_type
    }

    pub fn to_byte(&self) -> u8 {
        (u8::from(self.forbidden_zero_bit) << Self::FORBIDDEN_ZERO_BIT_SHIFT)
            | (self.nal_ref_idc << Self::NAL_REF_IDC_SHIFT)
            | self.nal_unit_type.type_id()
    }
}

impl From<u8> for NalUnitHeader {
    fn from(byte: u8) -> Self {
        NalUnitHeader::decode(byte)
    }
}

impl fmt::Display for NalUnitHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hdr:0x{:02x} forbidden_zero_bit:{} nal_ref_idc:{} nal_type:{}",
            self.to_byte(),
            u8::from(self.forbidden_zero_bit),
            self.nal_ref_idc,
            self.nal_unit_type
        )
    }
}
