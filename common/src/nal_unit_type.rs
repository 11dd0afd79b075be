use std::fmt;

/// Classification of `nal_unit_type` values, pulled from Table 7-1.
///
/// Only the types produced by baseline/main/high encoders are named. Everything else,
/// including the reserved and unspecified ranges, is carried as `Unknown` with its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NalUnitType {
    CodedSliceNonIDRPicture,
    CodedSliceDataPartitionA,
    CodedSliceDataPartitionB,
    CodedSliceDataPartitionC,
    CodedSliceIDRPicture,
    SupplementalEnhancementInformation,
    SequenceParameterSet,
    PictureParameterSet,
    AccessUnitDelimiter,
    SequenceEnd,
    StreamEnd,
    FillerData,
    Unknown(u8),
}

impl NalUnitType {
    pub fn from_type_id(nal_unit_type: u8) -> Self {
        match nal_unit_type {
            1 => NalUnitType::CodedSliceNonIDRPicture,
            2 => NalUnitType::CodedSliceDataPartitionA,
            3 => NalUnitType::CodedSliceDataPartitionB,
            4 => NalUnitType::CodedSliceDataPartitionC,
            5 => NalUnitType::CodedSliceIDRPicture,
            6 => NalUnitType::SupplementalEnhancementInformation,
            7 => NalUnitType::SequenceParameterSet,
            8 => NalUnitType::PictureParameterSet,
            9 => NalUnitType::AccessUnitDelimiter,
            10 => NalUnitType::SequenceEnd,
            11 => NalUnitType::StreamEnd,
            12 => NalUnitType::FillerData,
            other => NalUnitType::Unknown(other),
        }
    }

    pub fn type_id(&self) -> u8 {
        match self {
            NalUnitType::CodedSliceNonIDRPicture => 1,
            NalUnitType::CodedSliceDataPartitionA => 2,
            NalUnitType::CodedSliceDataPartitionB => 3,
            NalUnitType::CodedSliceDataPartitionC => 4,
            NalUnitType::CodedSliceIDRPicture => 5,
            NalUnitType::SupplementalEnhancementInformation => 6,
            NalUnitType::SequenceParameterSet => 7,
            NalUnitType::PictureParameterSet => 8,
            NalUnitType::AccessUnitDelimiter => 9,
            NalUnitType::SequenceEnd => 10,
            NalUnitType::StreamEnd => 11,
            NalUnitType::FillerData => 12,
            NalUnitType::Unknown(id) => *id,
        }
    }

    /// Slices and slice data partitions, i.e. the Video Coding Layer.
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            NalUnitType::CodedSliceNonIDRPicture
                | NalUnitType::CodedSliceDataPartitionA
                | NalUnitType::CodedSliceDataPartitionB
                | NalUnitType::CodedSliceDataPartitionC
                | NalUnitType::CodedSliceIDRPicture
        )
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(
            self,
            NalUnitType::SequenceParameterSet | NalUnitType::PictureParameterSet
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, NalUnitType::Unknown(_))
    }
}

impl fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NalUnitType::CodedSliceNonIDRPicture => write!(f, "P/B Slice"),
            NalUnitType::CodedSliceDataPartitionA => write!(f, "DPA Slice"),
            NalUnitType::CodedSliceDataPartitionB => write!(f, "DPB Slice"),
            NalUnitType::CodedSliceDataPartitionC => write!(f, "DPC Slice"),
            NalUnitType::CodedSliceIDRPicture => write!(f, "IDR Slice"),
            NalUnitType::SupplementalEnhancementInformation => write!(f, "SEI"),
            NalUnitType::SequenceParameterSet => write!(f, "SPS"),
            NalUnitType::PictureParameterSet => write!(f, "PPS"),
            NalUnitType::AccessUnitDelimiter => write!(f, "AUD"),
            NalUnitType::SequenceEnd => write!(f, "End of Sequence"),
            NalUnitType::StreamEnd => write!(f, "End of Stream"),
            NalUnitType::FillerData => write!(f, "Filler Data"),
            NalUnitType::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}
