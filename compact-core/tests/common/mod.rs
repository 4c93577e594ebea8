//! Builders for synthetic Compact telegrams used across integration tests.

#![allow(dead_code)]

use compact_core::types::{BeamContent, EchoContent, ModuleMetaData, START_OF_FRAME};

/// Shape and content flags of one synthetic module.
#[derive(Debug, Clone)]
pub struct ModuleShape {
    pub layers: u32,
    pub beams: u32,
    pub echoes: u32,
    pub echo_content: u8,
    pub beam_content: u8,
    pub timestamps_start: Vec<u64>,
    pub timestamps_stop: Vec<u64>,
}

impl ModuleShape {
    pub fn new(layers: u32, beams: u32, echoes: u32, echo_content: u8, beam_content: u8) -> Self {
        Self {
            layers,
            beams,
            echoes,
            echo_content,
            beam_content,
            timestamps_start: (0..layers).map(|l| 1_000 + u64::from(l)).collect(),
            timestamps_stop: (0..layers).map(|l| 2_000 + u64::from(l)).collect(),
        }
    }

    /// Encoded size of this module in bytes.
    pub fn encoded_len(&self) -> usize {
        let per_beam = self.echoes as usize
            * EchoContent::from_bits_retain(self.echo_content).echo_len()
            + BeamContent::from_bits_retain(self.beam_content).trailer_len();
        ModuleMetaData::encoded_len(self.layers as usize)
            + (self.beams * self.layers) as usize * per_beam
    }
}

/// Distance written for an echo, derived from its position.
pub fn distance_at(beam: u32, layer: u32, echo: u32) -> u16 {
    (beam * 100 + layer * 10 + echo) as u16
}

/// RSSI written for an echo, derived from its position.
pub fn rssi_at(beam: u32, layer: u32, echo: u32) -> u16 {
    distance_at(beam, layer, echo) + 5000
}

/// Properties written for a beam.
pub fn properties_at(beam: u32, layer: u32) -> u8 {
    ((beam + layer) % 4) as u8
}

/// Theta written for a beam.
pub fn theta_at(beam: u32, layer: u32) -> i16 {
    beam as i16 - 3 * layer as i16
}

/// Encodes one module with the given successor size.
pub fn module_bytes(shape: &ModuleShape, next_module_size: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(shape.encoded_len());
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&12441u64.to_le_bytes());
    bytes.extend_from_slice(&23_350_001u32.to_le_bytes());
    bytes.extend_from_slice(&shape.layers.to_le_bytes());
    bytes.extend_from_slice(&shape.beams.to_le_bytes());
    bytes.extend_from_slice(&shape.echoes.to_le_bytes());
    for ts in &shape.timestamps_start {
        bytes.extend_from_slice(&ts.to_le_bytes());
    }
    for ts in &shape.timestamps_stop {
        bytes.extend_from_slice(&ts.to_le_bytes());
    }
    for layer in 0..shape.layers {
        bytes.extend_from_slice(&(layer as f32 * 0.1).to_le_bytes());
    }
    for _ in 0..shape.layers {
        bytes.extend_from_slice(&(-1.5f32).to_le_bytes());
    }
    for _ in 0..shape.layers {
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
    }
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    bytes.extend_from_slice(&next_module_size.to_le_bytes());
    bytes.extend_from_slice(&[0, shape.echo_content, shape.beam_content, 0]);

    let echo_content = EchoContent::from_bits_retain(shape.echo_content);
    let beam_content = BeamContent::from_bits_retain(shape.beam_content);
    for beam in 0..shape.beams {
        for layer in 0..shape.layers {
            for echo in 0..shape.echoes {
                if echo_content.contains(EchoContent::DISTANCE) {
                    bytes.extend_from_slice(&distance_at(beam, layer, echo).to_le_bytes());
                }
                if echo_content.contains(EchoContent::RSSI) {
                    bytes.extend_from_slice(&rssi_at(beam, layer, echo).to_le_bytes());
                }
            }
            if beam_content.contains(BeamContent::PROPERTIES) {
                bytes.push(properties_at(beam, layer));
            }
            if beam_content.contains(BeamContent::THETA) {
                bytes.extend_from_slice(&theta_at(beam, layer).to_le_bytes());
            }
        }
    }
    bytes
}

/// Encodes the 24-byte header.
pub fn header_bytes(telegram_counter: u64, size_of_first_module: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(24);
    bytes.extend_from_slice(&START_OF_FRAME.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&telegram_counter.to_le_bytes());
    bytes.extend_from_slice(&629_160_554u64.to_le_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(&size_of_first_module.to_le_bytes());
    bytes
}

/// Appends the CRC-32 trailer.
pub fn seal(mut body: Vec<u8>) -> Vec<u8> {
    let crc = crc32fast::hash(&body);
    body.extend_from_slice(&crc.to_le_bytes());
    body
}

/// Encodes a complete telegram with correctly chained module sizes.
pub fn telegram(shapes: &[ModuleShape]) -> Vec<u8> {
    let sizes: Vec<u32> = shapes.iter().map(|s| s.encoded_len() as u32).collect();
    let mut body = header_bytes(3703, sizes.first().copied().unwrap_or(0));
    for (i, shape) in shapes.iter().enumerate() {
        let next = sizes.get(i + 1).copied().unwrap_or(0);
        body.extend_from_slice(&module_bytes(shape, next));
    }
    seal(body)
}

/// Overwrites a little-endian `u32` at `offset` and re-seals the checksum.
pub fn patch_u32(telegram: &[u8], offset: usize, value: u32) -> Vec<u8> {
    let mut body = telegram[..telegram.len() - 4].to_vec();
    body[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    seal(body)
}
