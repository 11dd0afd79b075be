use std::fmt;
use std::io::{self, Write};

use common::NalUnitHeader;
use tracing::{debug, trace, warn};

use crate::annex_b::{self, AnnexBUnit};
use crate::avcc_stream::NalLengthSize;
use crate::errors::{ParseError, RecordKind};
use crate::hex::HexDump;

/// The fixed leading bytes of an `AVCDecoderConfigurationRecord`:
///
/// ```text
///  8  configurationVersion (always 0x01)
///  8  AVCProfileIndication
///  8  profile_compatibility
///  8  AVCLevelIndication
///  6  reserved (all bits on)
///  2  lengthSizeMinusOne
///  3  reserved (all bits on)
///  5  numOfSequenceParameterSets
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvccConfigHeader {
    pub version: u8,
    pub profile: u8,
    pub profile_compatibility: u8,
    pub level: u8,
    pub length_size_minus_one: u8,
    pub sps_count: u8,
    reserved_length_bits: u8,
    reserved_count_bits: u8,
}

impl AvccConfigHeader {
    pub const LEN: usize = 6;

    /// A record must carry at least the header and the byte that follows it (the first SPS length
    /// byte, or the PPS count when there are no SPS).
    pub const MIN_RECORD_LEN: usize = Self::LEN + 1;

    const SUPPORTED_VERSION: u8 = 1;
    const LENGTH_SIZE_MASK: u8 = 0b0000_0011;
    const SPS_COUNT_MASK: u8 = 0b0001_1111;

    pub fn decode(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::MIN_RECORD_LEN {
            return Err(ParseError::TruncatedHeader {
                expected: Self::MIN_RECORD_LEN,
                found: data.len(),
            });
        }

        let header = Self {
            version: data[0],
            profile: data[1],
            profile_compatibility: data[2],
            level: data[3],
            length_size_minus_one: data[4] & Self::LENGTH_SIZE_MASK,
            reserved_length_bits: data[4] >> 2,
            sps_count: data[5] & Self::SPS_COUNT_MASK,
            reserved_count_bits: data[5] >> 5,
        };

        if header.version != Self::SUPPORTED_VERSION {
            warn!(
                version = header.version,
                expected = Self::SUPPORTED_VERSION,
                "unexpected AVCC configuration version"
            );
        }

        Ok(header)
    }

    /// Width of the length prefix in front of every NAL unit of the associated stream.
    pub fn nal_length_size(&self) -> NalLengthSize {
        NalLengthSize::from_length_size_minus_one(self.length_size_minus_one)
    }

    pub fn reserved_length_bits(&self) -> u8 {
        self.reserved_length_bits
    }

    pub fn reserved_count_bits(&self) -> u8 {
        self.reserved_count_bits
    }
}

/// One SPS or PPS entry: a 16-bit big-endian length followed by the NAL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSetRecord<'a> {
    offset: usize,
    payload: &'a [u8],
}

impl<'a> ParameterSetRecord<'a> {
    /// Offset of the length field within the configuration record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> u16 {
        // bounded by the u16 length field it was read from
        self.payload.len() as u16
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn header(&self) -> Option<NalUnitHeader> {
        self.payload.first().copied().map(NalUnitHeader::decode)
    }
}

/// A decoded `AVCDecoderConfigurationRecord` (the `avcC` box payload, a.k.a. "extra data").
/// Parameter sets borrow from the buffer the record was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvccConfigRecord<'a> {
    header: AvccConfigHeader,
    sps: Vec<ParameterSetRecord<'a>>,
    pps: Vec<ParameterSetRecord<'a>>,
    trailing: &'a [u8],
}

impl<'a> AvccConfigRecord<'a> {
    pub fn decode(data: &'a [u8]) -> Result<Self, ParseError> {
        let header = AvccConfigHeader::decode(data)?;
        let mut reader = RecordReader::new(data, AvccConfigHeader::LEN);

        let sps = reader.read_parameter_sets(
            usize::from(header.sps_count),
            RecordKind::SpsLength,
            RecordKind::Sps,
        )?;

        let pps_count = reader.read_u8(RecordKind::PpsCount, 0)?;
        let pps = reader.read_parameter_sets(
            usize::from(pps_count),
            RecordKind::PpsLength,
            RecordKind::Pps,
        )?;

        let trailing = reader.remaining();
        if !trailing.is_empty() {
            debug!(bytes = trailing.len(), "ignoring bytes after the PPS list");
        }

        Ok(Self {
            header,
            sps,
            pps,
            trailing,
        })
    }

    pub fn header(&self) -> &AvccConfigHeader {
        &self.header
    }

    pub fn sps(&self) -> &[ParameterSetRecord<'a>] {
        &self.sps
    }

    pub fn pps(&self) -> &[ParameterSetRecord<'a>] {
        &self.pps
    }

    /// Bytes following the PPS list, e.g. the High profile chroma/bit depth extension.
    pub fn trailing(&self) -> &'a [u8] {
        self.trailing
    }

    /// Every SPS followed by every PPS, in record order.
    pub fn parameter_sets(&self) -> impl Iterator<Item = &ParameterSetRecord<'a>> {
        self.sps.iter().chain(self.pps.iter())
    }

    pub fn annex_b_units(&self) -> impl Iterator<Item = AnnexBUnit> + '_ {
        self.parameter_sets()
            .map(|parameter_set| AnnexBUnit::rewrite(parameter_set.payload()))
    }

    /// Writes every SPS then every PPS to `sink`, each framed with a start code.
    pub fn write_annex_b<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<usize> {
        let mut written = 0;
        for parameter_set in self.parameter_sets() {
            annex_b::write_unit(sink, parameter_set.payload())?;
            written += common::START_CODE.len() + parameter_set.payload().len();
        }

        Ok(written)
    }

    pub fn to_annex_b(&self) -> Vec<u8> {
        self.annex_b_units().flat_map(AnnexBUnit::into_bytes).collect()
    }
}

impl fmt::Display for AvccConfigRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = &self.header;
        writeln!(f, "version: {}", header.version)?;
        writeln!(f, "profile: 0x{:02x}", header.profile)?;
        writeln!(f, "profile_compatibility: 0x{:02x}", header.profile_compatibility)?;
        writeln!(f, "level: 0x{:02x}", header.level)?;
        writeln!(
            f,
            "length_size_minus_one: {} ({}-byte NAL length prefix)",
            header.length_size_minus_one,
            header.nal_length_size().get()
        )?;

        for (label, parameter_sets) in [("sps", &self.sps), ("pps", &self.pps)] {
            writeln!(f, "{label}_count: {}", parameter_sets.len())?;
            for (index, parameter_set) in parameter_sets.iter().enumerate() {
                writeln!(
                    f,
                    "  {label}[{index}] length: {} data: {}",
                    parameter_set.length(),
                    HexDump(parameter_set.payload())
                )?;
            }
        }

        if !self.trailing.is_empty() {
            writeln!(f, "trailing: {} bytes", self.trailing.len())?;
        }

        Ok(())
    }
}

/// Bounds-checked cursor over a configuration record. Every read is validated against the bytes
/// remaining before the cursor moves.
struct RecordReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8], cursor: usize) -> Self {
        Self { data, cursor }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.cursor.min(self.data.len())..]
    }

    fn take(
        &mut self,
        needed: usize,
        kind: RecordKind,
        index: usize,
    ) -> Result<&'a [u8], ParseError> {
        let remaining = self.remaining();
        if needed > remaining.len() {
            return Err(ParseError::TruncatedRecord {
                kind,
                index,
                offset: self.cursor,
                needed,
                remaining: remaining.len(),
            });
        }

        self.cursor += needed;
        Ok(&remaining[..needed])
    }

    fn read_u8(&mut self, kind: RecordKind, index: usize) -> Result<u8, ParseError> {
        Ok(self.take(1, kind, index)?[0])
    }

    fn read_u16_be(&mut self, kind: RecordKind, index: usize) -> Result<u16, ParseError> {
        let bytes = self.take(2, kind, index)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_parameter_sets(
        &mut self,
        count: usize,
        length_kind: RecordKind,
        payload_kind: RecordKind,
    ) -> Result<Vec<ParameterSetRecord<'a>>, ParseError> {
        let mut parameter_sets = Vec::with_capacity(count);

        for index in 0..count {
            let offset = self.cursor;
            let length = self.read_u16_be(length_kind, index)?;
            let payload = self.take(usize::from(length), payload_kind, index)?;

            match payload.first() {
                Some(&byte) => debug!(
                    index,
                    offset,
                    length,
                    header = %NalUnitHeader::decode(byte),
                    "{payload_kind}"
                ),
                None => warn!(index, offset, "empty {payload_kind} record"),
            }
            trace!(data = %HexDump(payload), "{payload_kind} #{index}");

            parameter_sets.push(ParameterSetRecord { offset, payload });
        }

        Ok(parameter_sets)
    }
}
