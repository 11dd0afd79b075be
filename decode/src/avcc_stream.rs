use std::collections::BTreeMap;
use std::fmt;
use std::iter::FusedIterator;

use common::{NalUnitHeader, NalUnitType, START_CODE};
use tracing::{debug, trace, warn};

use crate::annex_b::AnnexBUnit;
use crate::errors::ParseError;
use crate::hex::HexDump;

/// Width in bytes of the big-endian length field in front of each NAL unit of an AVCC stream.
/// The configuration record stores it as `lengthSizeMinusOne`; 4 is by far the most common.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalLengthSize(u8);

impl NalLengthSize {
    pub const FOUR: NalLengthSize = NalLengthSize(4);

    pub fn new(size: u8) -> Result<Self, ParseError> {
        match size {
            1..=4 => Ok(Self(size)),
            _ => Err(ParseError::InvalidLengthSize(size)),
        }
    }

    /// Only the low two bits are meaningful, so every value maps to a width of 1 to 4.
    pub fn from_length_size_minus_one(length_size_minus_one: u8) -> Self {
        Self((length_size_minus_one & 0b11) + 1)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    fn width(&self) -> usize {
        usize::from(self.0)
    }
}

impl Default for NalLengthSize {
    fn default() -> Self {
        Self::FOUR
    }
}

impl TryFrom<u8> for NalLengthSize {
    type Error = ParseError;

    fn try_from(size: u8) -> Result<Self, Self::Error> {
        NalLengthSize::new(size)
    }
}

/// One length-prefixed NAL unit of an AVCC stream. A declared length of 0 gives an empty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvccStreamUnit<'a> {
    offset: usize,
    length_size: NalLengthSize,
    payload: &'a [u8],
}

impl<'a> AvccStreamUnit<'a> {
    /// Offset of the length field within the stream.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn payload_offset(&self) -> usize {
        self.offset + self.length_size.width()
    }

    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Header byte and body.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// `None` for an empty unit.
    pub fn header(&self) -> Option<NalUnitHeader> {
        self.payload.first().copied().map(NalUnitHeader::decode)
    }

    pub fn to_annex_b(&self) -> AnnexBUnit {
        AnnexBUnit::rewrite(self.payload)
    }
}

/// `AvccStreamWalker` is a single pass over a buffer of concatenated AVCC NAL units. It yields
/// one `AvccStreamUnit` per length-prefixed record and stops for good after the first error.
pub struct AvccStreamWalker<'a> {
    data: &'a [u8],
    cursor: usize,
    length_size: NalLengthSize,
    failed: bool,
}

impl<'a> AvccStreamWalker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_length_size(data, NalLengthSize::FOUR)
    }

    pub fn with_length_size(data: &'a [u8], length_size: NalLengthSize) -> Self {
        Self {
            data,
            cursor: 0,
            length_size,
            failed: false,
        }
    }

    fn next_unit(&mut self) -> Result<AvccStreamUnit<'a>, ParseError> {
        let offset = self.cursor;
        let width = self.length_size.width();
        let remaining = self.data.len() - offset;

        if remaining < width {
            return Err(ParseError::TruncatedUnit {
                offset,
                needed: width,
                remaining,
            });
        }

        let length = self.data[offset..offset + width]
            .iter()
            .fold(0usize, |length, &byte| (length << 8) | usize::from(byte));
        let payload_offset = offset + width;
        let available = self.data.len() - payload_offset;

        if length > available {
            return Err(ParseError::TruncatedUnit {
                offset,
                needed: length,
                remaining: available,
            });
        }

        if length == 0 {
            warn!(offset, "zero-length NAL unit");
        }

        self.cursor = payload_offset + length;
        Ok(AvccStreamUnit {
            offset,
            length_size: self.length_size,
            payload: &self.data[payload_offset..self.cursor],
        })
    }
}

impl<'a> Iterator for AvccStreamWalker<'a> {
    type Item = Result<AvccStreamUnit<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.data.len() {
            return None;
        }

        let unit = self.next_unit();
        self.failed = unit.is_err();
        Some(unit)
    }
}

impl FusedIterator for AvccStreamWalker<'_> {}

/// Totals gathered while walking a stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub units: usize,
    pub payload_bytes: usize,
    /// Units with a zero length, and so no header.
    pub empty_units: usize,
    pub vcl_units: usize,
    pub parameter_sets: usize,
    pub nal_types: BTreeMap<NalUnitType, usize>,
}

impl StreamSummary {
    fn record(&mut self, unit: &AvccStreamUnit<'_>) {
        self.units += 1;
        self.payload_bytes += unit.length();

        let Some(header) = unit.header() else {
            self.empty_units += 1;
            return;
        };
        let nal_unit_type = header.nal_type();
        if nal_unit_type.is_vcl() {
            self.vcl_units += 1;
        }
        if nal_unit_type.is_parameter_set() {
            self.parameter_sets += 1;
        }
        *self.nal_types.entry(nal_unit_type).or_default() += 1;
    }

    pub fn count(&self, nal_unit_type: NalUnitType) -> usize {
        self.nal_types.get(&nal_unit_type).copied().unwrap_or(0)
    }
}

impl fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} NAL units, {} payload bytes", self.units, self.payload_bytes)?;
        if self.empty_units > 0 {
            write!(f, ", {} empty", self.empty_units)?;
        }
        for (index, (nal_unit_type, count)) in self.nal_types.iter().enumerate() {
            let separator = if index == 0 { " (" } else { ", " };
            write!(f, "{separator}{nal_unit_type}: {count}")?;
        }
        if !self.nal_types.is_empty() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn inspect(unit: &AvccStreamUnit<'_>) {
    let Some(header) = unit.header() else {
        debug!(offset = unit.offset(), length = 0, "nal unit");
        return;
    };
    debug!(
        offset = unit.offset(),
        length = unit.length(),
        forbidden_zero_bit = header.forbidden_zero_bit(),
        nal_ref_idc = header.nal_ref_idc(),
        nal_type = %header.nal_type(),
        "nal unit"
    );

    if header.forbidden_zero_bit() {
        warn!(offset = unit.offset(), "forbidden_zero_bit is set");
    }
    if header.nal_type().is_unknown() {
        warn!(
            offset = unit.offset(),
            nal_type = header.nal_type().type_id(),
            "unrecognized nal_unit_type"
        );
    }

    trace!(data = %HexDump(unit.payload()), "nal unit at {}", unit.offset());
}

/// Validates every unit of `data`, logging each one, before anything is produced from it.
fn walk_all<'a>(
    data: &'a [u8],
    length_size: NalLengthSize,
) -> Result<(Vec<AvccStreamUnit<'a>>, StreamSummary), ParseError> {
    let mut units = vec![];
    let mut summary = StreamSummary::default();

    for unit in AvccStreamWalker::with_length_size(data, length_size) {
        let unit = unit?;
        inspect(&unit);
        summary.record(&unit);
        units.push(unit);
    }

    Ok((units, summary))
}

/// Converts a stream of 4-byte length-prefixed NAL units to Annex B by overwriting each length
/// field with `START_CODE`. The whole buffer is validated first; on error it is left untouched.
pub fn rewrite_in_place(buffer: &mut [u8]) -> Result<StreamSummary, ParseError> {
    let (offsets, summary) = {
        let (units, summary) = walk_all(buffer, NalLengthSize::FOUR)?;
        let offsets: Vec<usize> = units.iter().map(AvccStreamUnit::offset).collect();
        (offsets, summary)
    };

    for offset in offsets {
        buffer[offset..offset + START_CODE.len()].copy_from_slice(&START_CODE);
    }

    Ok(summary)
}

/// Converts a stream with any prefix width into a new Annex B buffer. Needed when the prefix is
/// not 4 bytes wide and the start code cannot take its place.
pub fn avcc_to_annex_b(
    data: &[u8],
    length_size: NalLengthSize,
) -> Result<(Vec<u8>, StreamSummary), ParseError> {
    let (units, summary) = walk_all(data, length_size)?;

    let mut annex_b = Vec::with_capacity(summary.payload_bytes + units.len() * START_CODE.len());
    for unit in &units {
        annex_b.extend_from_slice(&START_CODE);
        annex_b.extend_from_slice(unit.payload());
    }

    Ok((annex_b, summary))
}
