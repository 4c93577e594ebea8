//! Compact telegram decoder.
//!
//! Decoding is a single forward pass over one buffer: checksum, header, then
//! a chain of modules. Each module is a metadata block followed by a scan data
//! block whose shape (layers, beams, echoes and which optional fields are
//! present) is read from that metadata.

use crate::checksum;
use crate::error::DecodeError;
use crate::reader::CursorReader;
use crate::types::{
    Beam, BeamAllLayers, BeamContent, CompactSegment, Echo, EchoContent, Header, ModuleData,
    ModuleMetaData, CHECKSUM_LEN, COMMAND_ID, PROTOCOL_VERSION, START_OF_FRAME,
};
use tracing::{debug, trace};

/// Upper bound on decoded cells across all modules of one segment.
///
/// A module contributes `beams * max(layers, 1) * max(echoes, 1)` cells.
/// Modules without content flags take no scan data bytes, so neither the
/// declared module sizes nor the buffer length bound the allocation.
/// A full 64 KiB datagram carries at most ~32k echoes with any flag set.
pub const MAX_CELLS_PER_SEGMENT: u64 = 1 << 20;

/// Decodes one complete telegram.
///
/// The checksum is verified over the whole buffer first; structural decoding
/// then starts again at offset 0.
pub fn decode_segment(buffer: &[u8]) -> Result<CompactSegment, DecodeError> {
    checksum::ensure_checksum_is_valid(buffer)?;

    let mut decoder = SegmentDecoder::new(buffer);
    let header = decoder.decode_header()?;
    debug!(
        telegram_counter = header.telegram_counter,
        timestamp = header.timestamp_transmit,
        first_module_size = header.size_of_first_module,
        "Decoded telegram header"
    );

    let modules = decoder.decode_modules(header.size_of_first_module)?;

    let slack = decoder.reader.remaining().saturating_sub(CHECKSUM_LEN);
    if slack > 0 {
        debug!(slack, "Ignoring bytes between last module and checksum");
    }

    Ok(CompactSegment { header, modules })
}

/// Decoding state for a single telegram.
struct SegmentDecoder<'a> {
    reader: CursorReader<'a>,
    cells_decoded: u64,
}

impl<'a> SegmentDecoder<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            reader: CursorReader::new(buffer),
            cells_decoded: 0,
        }
    }

    /// Reads and validates the fixed 24-byte header.
    fn decode_header(&mut self) -> Result<Header, DecodeError> {
        let start_of_frame = self.reader.read::<u32>()?;
        if start_of_frame != START_OF_FRAME {
            return Err(DecodeError::InvalidMagic {
                found: start_of_frame,
            });
        }

        let command_id = self.reader.read::<u32>()?;
        if command_id != COMMAND_ID {
            return Err(DecodeError::InvalidCommand { found: command_id });
        }

        let telegram_counter = self.reader.read::<u64>()?;
        let timestamp_transmit = self.reader.read::<u64>()?;

        let version = self.reader.read::<u32>()?;
        if version != PROTOCOL_VERSION {
            return Err(DecodeError::UnsupportedVersion { found: version });
        }

        let size_of_first_module = self.reader.read::<u32>()?;
        if size_of_first_module == 0 {
            return Err(DecodeError::EmptyPayload);
        }

        Ok(Header {
            start_of_frame,
            command_id,
            telegram_counter,
            timestamp_transmit,
            version,
            size_of_first_module,
        })
    }

    /// Reads a module metadata block.
    fn decode_module_meta_data(&mut self) -> Result<ModuleMetaData, DecodeError> {
        let segment_counter = self.reader.read::<u64>()?;
        let frame_number = self.reader.read::<u64>()?;
        let sender_id = self.reader.read::<u32>()?;
        let number_of_layers_in_module = self.reader.read::<u32>()?;
        let number_of_beams_per_scan = self.reader.read::<u32>()?;
        let number_of_echoes = self.reader.read::<u32>()?;

        let layers = number_of_layers_in_module;
        let timestamps_start = self.reader.read_vec::<u64>(layers)?;
        let timestamps_stop = self.reader.read_vec::<u64>(layers)?;
        let phis = self.reader.read_vec::<f32>(layers)?;
        let theta_start = self.reader.read_vec::<f32>(layers)?;
        let theta_stop = self.reader.read_vec::<f32>(layers)?;

        let distance_scaling_factor = self.reader.read::<f32>()?;
        let next_module_size = self.reader.read::<u32>()?;
        let _reserved = self.reader.read::<u8>()?;
        let echo_content = EchoContent::from_bits_retain(self.reader.read::<u8>()?);
        let beam_content = BeamContent::from_bits_retain(self.reader.read::<u8>()?);
        let _reserved = self.reader.read::<u8>()?;

        Ok(ModuleMetaData {
            segment_counter,
            frame_number,
            sender_id,
            number_of_layers_in_module,
            number_of_beams_per_scan,
            number_of_echoes,
            timestamps_start,
            timestamps_stop,
            phis,
            theta_start,
            theta_stop,
            distance_scaling_factor,
            next_module_size,
            echo_content,
            beam_content,
        })
    }

    /// Reads the scan data block described by `meta_data`.
    ///
    /// Wire order is beam index outermost, then layer, then echo.
    fn decode_module_data(&mut self, meta_data: ModuleMetaData) -> Result<ModuleData, DecodeError> {
        let beams_per_scan = meta_data.number_of_beams_per_scan;
        let layers = meta_data.number_of_layers_in_module;
        let echoes = meta_data.number_of_echoes;

        let cells = u64::from(beams_per_scan)
            .saturating_mul(u64::from(layers.max(1)))
            .saturating_mul(u64::from(echoes.max(1)));
        let cells_decoded = self.cells_decoded.saturating_add(cells);
        if cells_decoded > MAX_CELLS_PER_SEGMENT {
            return Err(DecodeError::ShapeTooLarge {
                beams: beams_per_scan,
                layers,
                echoes,
            });
        }
        self.cells_decoded = cells_decoded;

        let echo_content = meta_data.echo_content;
        let beam_content = meta_data.beam_content;

        let mut beams = Vec::with_capacity(beams_per_scan as usize);
        for _ in 0..beams_per_scan {
            let mut beam_all_layers = BeamAllLayers::with_capacity(layers as usize);
            for _ in 0..layers {
                beam_all_layers.push(self.decode_beam(echoes, echo_content, beam_content)?);
            }
            beams.push(beam_all_layers);
        }

        Ok(ModuleData { meta_data, beams })
    }

    #[inline]
    fn decode_beam(
        &mut self,
        echoes: u32,
        echo_content: EchoContent,
        beam_content: BeamContent,
    ) -> Result<Beam, DecodeError> {
        let mut beam = Beam {
            echoes: Vec::with_capacity(echoes as usize),
            ..Beam::default()
        };

        for _ in 0..echoes {
            let mut echo = Echo::default();
            if echo_content.contains(EchoContent::DISTANCE) {
                echo.distance = Some(self.reader.read::<u16>()?);
            }
            if echo_content.contains(EchoContent::RSSI) {
                echo.rssi = Some(self.reader.read::<u16>()?);
            }
            beam.echoes.push(echo);
        }

        if beam_content.contains(BeamContent::PROPERTIES) {
            beam.properties = Some(self.reader.read::<u8>()?);
        }
        if beam_content.contains(BeamContent::THETA) {
            beam.theta = Some(self.reader.read::<i16>()?);
        }

        Ok(beam)
    }

    /// Follows the module chain until a module declares no successor.
    ///
    /// Each module must consume exactly the number of bytes announced by the
    /// previous one (or by the header, for the first module).
    fn decode_modules(&mut self, first_module_size: u32) -> Result<Vec<ModuleData>, DecodeError> {
        let mut modules = Vec::new();
        let mut next_module_size = first_module_size;

        while next_module_size != 0 {
            let module_index = modules.len();
            let start = self.reader.position();

            let meta_data = self.decode_module_meta_data()?;
            trace!(
                module_index,
                offset = start,
                layers = meta_data.number_of_layers_in_module,
                beams = meta_data.number_of_beams_per_scan,
                echoes = meta_data.number_of_echoes,
                echo_content = meta_data.echo_content.bits(),
                beam_content = meta_data.beam_content.bits(),
                "Decoded module metadata"
            );
            let following = meta_data.next_module_size;
            let module = self.decode_module_data(meta_data)?;

            let consumed = self.reader.position() - start;
            if consumed != next_module_size as usize {
                return Err(DecodeError::SizeMismatch {
                    module_index,
                    declared: next_module_size,
                    consumed,
                });
            }

            modules.push(module);
            next_module_size = following;
        }

        debug!(modules = modules.len(), "Decoded module chain");
        Ok(modules)
    }
}
