//! AVCC to Annex B conversion for H.264 elementary streams.
//!
//! Two inputs are understood: an `AVCDecoderConfigurationRecord` (the `avcC` "extra data"), whose
//! SPS and PPS are extracted, and a stream of length-prefixed NAL units. Both come out as a
//! sequence of NAL units each preceded by the start code `00 00 00 01`.

pub mod annex_b;
pub mod avcc_config;
pub mod avcc_stream;
pub mod decoder;
pub mod errors;
mod hex;

pub use annex_b::{write_unit, AnnexBUnit};
pub use avcc_config::{AvccConfigHeader, AvccConfigRecord, ParameterSetRecord};
pub use avcc_stream::{
    avcc_to_annex_b, rewrite_in_place, AvccStreamUnit, AvccStreamWalker, NalLengthSize,
    StreamSummary,
};
pub use decoder::{
    convert_extra_data, convert_stream, ExtraDataDecoder, OutputMode, StreamDecoder,
    DEFAULT_OUTPUT_PATH,
};
pub use errors::{ConversionError, ParseError, RecordKind};
pub use hex::HexDump;
