//! CSV export of decoded segments.
//!
//! Each echo becomes one row. Optional fields that a module does not carry are
//! written as empty cells so every row has the same column count.

use crate::types::{Beam, CompactSegment, Echo};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column header written before the first row.
pub const CSV_HEADER: &str = "telegram,module,beam,layer,echo,distance,rssi,properties,theta";

struct Cell<T>(Option<T>);

impl<T: Display> Display for Cell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => Ok(()),
        }
    }
}

/// CSV writer for decoded echoes.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the column header.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "{CSV_HEADER}")?;
        Ok(())
    }

    /// Writes a `%` comment line with the segment header followed by one row
    /// per echo.
    pub fn write_segment(&mut self, segment: &CompactSegment) -> Result<(), OutputError> {
        let header = &segment.header;
        writeln!(
            self.writer,
            "%telegram:{},timestamp:{},modules:{}",
            header.telegram_counter,
            header.timestamp_transmit,
            segment.modules.len()
        )?;

        for (module_index, module) in segment.modules.iter().enumerate() {
            for (beam_index, layers) in module.beams.iter().enumerate() {
                for (layer_index, beam) in layers.iter().enumerate() {
                    for (echo_index, echo) in beam.echoes.iter().enumerate() {
                        self.write_echo(
                            header.telegram_counter,
                            [module_index, beam_index, layer_index, echo_index],
                            beam,
                            echo,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn write_echo(
        &mut self,
        telegram: u64,
        [module, beam_index, layer, echo_index]: [usize; 4],
        beam: &Beam,
        echo: &Echo,
    ) -> Result<(), OutputError> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{}",
            telegram,
            module,
            beam_index,
            layer,
            echo_index,
            Cell(echo.distance),
            Cell(echo.rssi),
            Cell(beam.properties),
            Cell(beam.theta)
        )?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes decoded segments to a CSV file.
pub fn write_csv<P: AsRef<Path>>(path: P, segments: &[CompactSegment]) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = CsvWriter::new(file);
    writer.write_header()?;
    for segment in segments {
        writer.write_segment(segment)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamContent, EchoContent, Header, ModuleData, ModuleMetaData};

    fn segment() -> CompactSegment {
        let meta_data = ModuleMetaData {
            segment_counter: 1,
            frame_number: 2,
            sender_id: 3,
            number_of_layers_in_module: 1,
            number_of_beams_per_scan: 2,
            number_of_echoes: 1,
            timestamps_start: vec![0],
            timestamps_stop: vec![0],
            phis: vec![0.0],
            theta_start: vec![0.0],
            theta_stop: vec![0.0],
            distance_scaling_factor: 1.0,
            next_module_size: 0,
            echo_content: EchoContent::DISTANCE,
            beam_content: BeamContent::THETA,
        };
        let beam = |distance, theta| Beam {
            echoes: vec![Echo {
                distance: Some(distance),
                rssi: None,
            }],
            properties: None,
            theta: Some(theta),
        };
        CompactSegment {
            header: Header {
                start_of_frame: 0x0202_0202,
                command_id: 1,
                telegram_counter: 42,
                timestamp_transmit: 1000,
                version: 4,
                size_of_first_module: 1,
            },
            modules: vec![ModuleData {
                meta_data,
                beams: vec![vec![beam(1500, -3)], vec![beam(1600, 4)]],
            }],
        }
    }

    #[test]
    fn test_csv_writer() {
        let mut output = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut output);
            writer.write_header().unwrap();
            writer.write_segment(&segment()).unwrap();
            writer.flush().unwrap();
        }

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "%telegram:42,timestamp:1000,modules:1");
        assert_eq!(lines[2], "42,0,0,0,0,1500,,,-3");
        assert_eq!(lines[3], "42,0,1,0,0,1600,,,4");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echoes.csv");
        write_csv(&path, &[segment(), segment()]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().filter(|l| l.starts_with('%')).count(), 2);
        assert_eq!(contents.lines().filter(|l| l.starts_with("42,")).count(), 4);
    }
}
