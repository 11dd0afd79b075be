use std::io::{self, Write};

use common::{NalUnitHeader, START_CODE};

/// `AnnexBUnit` is a byte stream NAL unit: the four-byte `START_CODE` followed by the NAL unit
/// (header byte and body) exactly as it was carried in the source framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexBUnit {
    data: Vec<u8>,
}

impl AnnexBUnit {
    /// Frames `payload` with a start code. The payload is not inspected; any byte sequence,
    /// including an empty one, is accepted.
    pub fn rewrite(payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(START_CODE.len() + payload.len());
        data.extend_from_slice(&START_CODE);
        data.extend_from_slice(payload);

        Self { data }
    }

    /// The NAL unit without its start code.
    pub fn payload(&self) -> &[u8] {
        &self.data[START_CODE.len()..]
    }

    pub fn header(&self) -> Option<NalUnitHeader> {
        self.payload().first().copied().map(NalUnitHeader::decode)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for AnnexBUnit {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Appends `START_CODE` and `payload` to `sink` without building an intermediate `AnnexBUnit`.
pub fn write_unit<W: Write + ?Sized>(sink: &mut W, payload: &[u8]) -> io::Result<()> {
    sink.write_all(&START_CODE)?;
    sink.write_all(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::NalUnitType;

    #[test]
    fn test_rewrite_prepends_start_code() {
        let unit = AnnexBUnit::rewrite(&[0x67, 0x42, 0x00, 0x1E]);

        assert_eq!(
            unit.as_bytes(),
            &[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E]
        );
        assert_eq!(unit.payload(), &[0x67, 0x42, 0x00, 0x1E]);
        assert_eq!(unit.len(), 8);
        assert_eq!(
            unit.header().map(|h| h.nal_type()),
            Some(NalUnitType::SequenceParameterSet)
        );
    }

    #[test]
    fn test_rewrite_empty_payload() {
        let unit = AnnexBUnit::rewrite(&[]);

        assert_eq!(unit.as_bytes(), &START_CODE);
        assert!(unit.payload().is_empty());
        assert!(unit.header().is_none());
    }

    #[test]
    fn test_rewrite_does_not_validate_payload() {
        // a payload that itself looks like a start code is passed through untouched
        let unit = AnnexBUnit::rewrite(&[0x00, 0x00, 0x01, 0xFF]);
        assert_eq!(unit.payload(), &[0x00, 0x00, 0x01, 0xFF]);
    }

    #[test]
    fn test_write_unit_appends() -> io::Result<()> {
        let mut sink = vec![0xAA];
        write_unit(&mut sink, &[0x68, 0xCE])?;
        write_unit(&mut sink, &[0x65])?;

        assert_eq!(
            sink,
            vec![0xAA, 0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x00, 0x00, 0x00, 0x01, 0x65]
        );
        Ok(())
    }

    #[test]
    fn test_write_unit_matches_rewrite() -> io::Result<()> {
        let payload = [0x41, 0x9A, 0x00, 0x03];
        let mut sink = vec![];
        write_unit(&mut sink, &payload)?;

        assert_eq!(sink, AnnexBUnit::rewrite(&payload).into_bytes());
        Ok(())
    }
}
