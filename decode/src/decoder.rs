use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap::{Mmap, MmapMut, MmapOptions};
use tracing::{debug, info};

use crate::avcc_config::AvccConfigRecord;
use crate::avcc_stream::{self, NalLengthSize, StreamSummary};
use crate::errors::{ConversionError, ParseError};

/// Where both modes write when no output path is given.
pub const DEFAULT_OUTPUT_PATH: &str = "annexb.h264";

/// How the output artifact is opened. Configuration records replace the file; streams are
/// appended so they can follow the SPS/PPS written from a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Truncate,
    Append,
}

impl OutputMode {
    fn open(self, path: &Path) -> Result<File, ConversionError> {
        let mut options = OpenOptions::new();
        match self {
            OutputMode::Truncate => options.write(true).create(true).truncate(true),
            OutputMode::Append => options.append(true).create(true),
        };

        options.open(path).map_err(|source| ConversionError::FileOpen {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Opens the output, hands a buffered writer to `write` and flushes it. The file is closed when
/// this returns, whether or not writing succeeded.
fn write_output<F>(path: &Path, mode: OutputMode, write: F) -> Result<(), ConversionError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut sink = BufWriter::new(mode.open(path)?);

    write(&mut sink)
        .and_then(|()| sink.flush())
        .map_err(|source| ConversionError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}

fn open_input(path: &Path) -> Result<File, ConversionError> {
    let file = File::open(path).map_err(|source| ConversionError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let len = file
        .metadata()
        .map_err(|source| ConversionError::FileRead {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    // mapping an empty file fails on some platforms
    if len == 0 {
        return Err(ConversionError::EmptyInput(path.to_path_buf()));
    }

    debug!(path = %path.display(), bytes = len, "opened input");
    Ok(file)
}

/// `ExtraDataDecoder` holds a memory-mapped AVCC configuration record ("extra data").
pub struct ExtraDataDecoder {
    path: PathBuf,
    data: Mmap,
}

impl ExtraDataDecoder {
    pub fn from_file_path(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref().to_path_buf();
        let file = open_input(&path)?;
        let data = unsafe { Mmap::map(&file) }.map_err(|source| ConversionError::FileRead {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> Result<AvccConfigRecord<'_>, ParseError> {
        AvccConfigRecord::decode(&self.data)
    }

    /// Decodes the record and replaces `output` with its SPS and PPS in Annex B framing. The
    /// output is only opened once the whole record decoded cleanly.
    pub fn convert(&self, output: &Path) -> Result<AvccConfigRecord<'_>, ConversionError> {
        let record = self.record()?;

        write_output(output, OutputMode::Truncate, |sink| {
            record.write_annex_b(sink).map(|_| ())
        })?;

        info!(
            input = %self.path.display(),
            output = %output.display(),
            sps = record.sps().len(),
            pps = record.pps().len(),
            "wrote parameter sets"
        );
        Ok(record)
    }
}

/// `StreamDecoder` holds a private copy-on-write mapping of an AVCC stream, so the in-place
/// rewrite never reaches the input file.
pub struct StreamDecoder {
    path: PathBuf,
    data: MmapMut,
    length_size: NalLengthSize,
}

impl StreamDecoder {
    pub fn from_file_path(
        path: impl AsRef<Path>,
        length_size: NalLengthSize,
    ) -> Result<Self, ConversionError> {
        let path = path.as_ref().to_path_buf();
        let file = open_input(&path)?;
        let data = unsafe { MmapOptions::new().map_copy(&file) }.map_err(|source| {
            ConversionError::FileRead {
                path: path.clone(),
                source,
            }
        })?;

        Ok(Self {
            path,
            data,
            length_size,
        })
    }

    /// Converts the stream and appends it to `output`. Nothing is written if any unit is
    /// malformed.
    pub fn convert(mut self, output: &Path) -> Result<StreamSummary, ConversionError> {
        let summary = if self.length_size == NalLengthSize::FOUR {
            let summary = avcc_stream::rewrite_in_place(&mut self.data)?;
            write_output(output, OutputMode::Append, |sink| sink.write_all(&self.data))?;
            summary
        } else {
            let (annex_b, summary) = avcc_stream::avcc_to_annex_b(&self.data, self.length_size)?;
            write_output(output, OutputMode::Append, |sink| sink.write_all(&annex_b))?;
            summary
        };

        info!(
            input = %self.path.display(),
            output = %output.display(),
            vcl_units = summary.vcl_units,
            parameter_sets = summary.parameter_sets,
            %summary,
            "appended stream"
        );
        Ok(summary)
    }
}

/// Decodes the configuration record at `input` and replaces `output` with its parameter sets.
/// Returns the printable structure of the record.
pub fn convert_extra_data(input: &Path, output: &Path) -> Result<String, ConversionError> {
    let decoder = ExtraDataDecoder::from_file_path(input)?;
    let record = decoder.convert(output)?;
    Ok(record.to_string())
}

/// Converts the AVCC stream at `input` and appends it to `output`.
pub fn convert_stream(
    input: &Path,
    output: &Path,
    length_size: NalLengthSize,
) -> Result<StreamSummary, ConversionError> {
    StreamDecoder::from_file_path(input, length_size)?.convert(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use common::{NalUnitType, START_CODE};
    use tempfile::TempDir;

    const SPS: &[u8] = &[0x67, 0x42, 0x00, 0x1E];
    const PPS: &[u8] = &[0x68, 0xCE, 0x38, 0x80];
    const IDR: &[u8] = &[0x65, 0x88, 0x84, 0x00, 0x33];

    fn extra_data() -> Vec<u8> {
        let mut data = vec![0x01, 0x42, 0x00, 0x1E, 0xFF, 0xE1];
        data.extend_from_slice(&(SPS.len() as u16).to_be_bytes());
        data.extend_from_slice(SPS);
        data.push(0x01);
        data.extend_from_slice(&(PPS.len() as u16).to_be_bytes());
        data.extend_from_slice(PPS);
        data
    }

    fn avcc_stream(payloads: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![];
        for payload in payloads {
            data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            data.extend_from_slice(payload);
        }
        data
    }

    fn annex_b(payloads: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![];
        for payload in payloads {
            data.extend_from_slice(&START_CODE);
            data.extend_from_slice(payload);
        }
        data
    }

    fn write_input(dir: &TempDir, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, data)?;
        Ok(path)
    }

    #[test]
    fn test_convert_extra_data() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let input = write_input(&dir, "extra.bin", &extra_data())?;
        let output = dir.path().join("out.h264");

        let printed = convert_extra_data(&input, &output)?;

        assert_eq!(fs::read(&output)?, annex_b(&[SPS, PPS]));
        assert!(printed.contains("sps_count: 1"));
        Ok(())
    }

    #[test]
    fn test_extra_data_truncates_existing_output() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let input = write_input(&dir, "extra.bin", &extra_data())?;
        let output = write_input(&dir, "out.h264", &[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00])?;

        ExtraDataDecoder::from_file_path(&input)?.convert(&output)?;

        assert_eq!(fs::read(&output)?, annex_b(&[SPS, PPS]));
        Ok(())
    }

    #[test]
    fn test_convert_stream_appends() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let extra = write_input(&dir, "extra.bin", &extra_data())?;
        let stream = write_input(&dir, "stream.bin", &avcc_stream(&[IDR, IDR]))?;
        let output = dir.path().join("out.h264");

        convert_extra_data(&extra, &output)?;
        let summary = convert_stream(&stream, &output, NalLengthSize::FOUR)?;

        assert_eq!(summary.units, 2);
        assert_eq!(summary.count(NalUnitType::CodedSliceIDRPicture), 2);
        assert_eq!(fs::read(&output)?, annex_b(&[SPS, PPS, IDR, IDR]));
        Ok(())
    }

    #[test]
    fn test_convert_stream_leaves_input_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let original = avcc_stream(&[SPS, PPS, IDR]);
        let stream = write_input(&dir, "stream.bin", &original)?;
        let output = dir.path().join("out.h264");

        convert_stream(&stream, &output, NalLengthSize::FOUR)?;

        assert_eq!(fs::read(&stream)?, original);
        assert_eq!(fs::read(&output)?, annex_b(&[SPS, PPS, IDR]));
        Ok(())
    }

    #[test]
    fn test_convert_stream_two_byte_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let mut data = vec![];
        for payload in [SPS, IDR] {
            data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            data.extend_from_slice(payload);
        }
        let stream = write_input(&dir, "stream.bin", &data)?;
        let output = dir.path().join("out.h264");

        convert_stream(&stream, &output, NalLengthSize::new(2)?)?;

        assert_eq!(fs::read(&output)?, annex_b(&[SPS, IDR]));
        Ok(())
    }

    #[test]
    fn test_truncated_stream_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let mut data = avcc_stream(&[SPS, PPS]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x09, 0x65, 0x88]);
        let stream = write_input(&dir, "stream.bin", &data)?;
        let output = dir.path().join("out.h264");

        let result = convert_stream(&stream, &output, NalLengthSize::FOUR);

        assert!(matches!(
            result,
            Err(ConversionError::Parse(ParseError::TruncatedUnit { .. }))
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_truncated_extra_data_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let input = write_input(&dir, "extra.bin", &[0x01, 0x42, 0x00, 0x1E, 0xFF])?;
        let output = dir.path().join("out.h264");

        let result = convert_extra_data(&input, &output);

        assert!(matches!(
            result,
            Err(ConversionError::Parse(ParseError::TruncatedHeader { .. }))
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_missing_input() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("missing.bin");

        assert!(matches!(
            ExtraDataDecoder::from_file_path(&missing),
            Err(ConversionError::FileOpen { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let empty = write_input(&dir, "empty.bin", &[])?;

        assert!(matches!(
            StreamDecoder::from_file_path(&empty, NalLengthSize::FOUR),
            Err(ConversionError::EmptyInput(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unwritable_output() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let input = write_input(&dir, "extra.bin", &extra_data())?;
        let output = dir.path().join("no-such-dir").join("out.h264");

        assert!(matches!(
            convert_extra_data(&input, &output),
            Err(ConversionError::FileOpen { .. })
        ));
        Ok(())
    }
}
