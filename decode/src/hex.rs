use std::fmt;

/// Renders bytes as `0x67 0x42 0x00 0x1e` for diagnostics.
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.iter();
        if let Some(first) = bytes.next() {
            write!(f, "0x{first:02x}")?;
        }
        for byte in bytes {
            write!(f, " 0x{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump() {
        assert_eq!(HexDump(&[0x67, 0x42, 0x00, 0x1E]).to_string(), "0x67 0x42 0x00 0x1e");
        assert_eq!(HexDump(&[]).to_string(), "");
    }
}
