//! Core types for decoded Compact telegrams.
//!
//! A telegram decodes into a [`CompactSegment`]: one [`Header`] followed by a
//! chain of [`ModuleData`] blocks. The layout of every echo and beam inside a
//! module is decided at runtime by the module's content flags, so the optional
//! fields are modelled as `Option`s rather than as separate types.

/// Start-of-frame marker that opens every telegram.
pub const START_OF_FRAME: u32 = 0x0202_0202;

/// The only command id carried by measurement telegrams.
pub const COMMAND_ID: u32 = 1;

/// Supported telegram protocol version.
pub const PROTOCOL_VERSION: u32 = 4;

/// Encoded size of the [`Header`] in bytes.
pub const HEADER_LEN: usize = 24;

/// Size of the trailing CRC-32 field in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// Content flags describing which fields are present in each echo.
///
/// Bits not listed here are kept as received but do not change the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EchoContent(u8);

impl EchoContent {
    /// No per-echo data.
    pub const NONE: Self = Self(0x00);
    /// Each echo carries a `u16` distance.
    pub const DISTANCE: Self = Self(0x01);
    /// Each echo carries a `u16` RSSI.
    pub const RSSI: Self = Self(0x02);
    /// Distance and RSSI.
    pub const ALL: Self = Self(0x03);

    /// Wraps a raw flag byte, keeping unknown bits.
    #[inline]
    pub const fn from_bits_retain(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw flag byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of bytes one echo occupies on the wire.
    pub const fn echo_len(self) -> usize {
        let mut len = 0;
        if self.contains(Self::DISTANCE) {
            len += 2;
        }
        if self.contains(Self::RSSI) {
            len += 2;
        }
        len
    }
}

impl std::ops::BitOr for EchoContent {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Content flags describing which per-beam fields follow the echoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BeamContent(u8);

impl BeamContent {
    /// No per-beam data beyond the echoes.
    pub const NONE: Self = Self(0x00);
    /// Each beam carries a `u8` properties field.
    pub const PROPERTIES: Self = Self(0x01);
    /// Each beam carries an `i16` theta offset.
    pub const THETA: Self = Self(0x02);
    /// Properties and theta.
    pub const ALL: Self = Self(0x03);

    /// Wraps a raw flag byte, keeping unknown bits.
    #[inline]
    pub const fn from_bits_retain(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw flag byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of bytes appended after the echoes of one beam.
    pub const fn trailer_len(self) -> usize {
        let mut len = 0;
        if self.contains(Self::PROPERTIES) {
            len += 1;
        }
        if self.contains(Self::THETA) {
            len += 2;
        }
        len
    }
}

impl std::ops::BitOr for BeamContent {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Fixed-size leading block of every telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Always [`START_OF_FRAME`].
    pub start_of_frame: u32,
    /// Always [`COMMAND_ID`].
    pub command_id: u32,
    /// Telegrams sent since the device was switched on.
    pub telegram_counter: u64,
    /// Sensor system time in microseconds since the Unix epoch.
    pub timestamp_transmit: u64,
    /// Always [`PROTOCOL_VERSION`].
    pub version: u32,
    /// Encoded size of the first module in bytes.
    pub size_of_first_module: u32,
}

/// General information about one module.
///
/// All layer-indexed vectors have exactly `number_of_layers_in_module`
/// elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleMetaData {
    /// Position of this segment within its revolution.
    pub segment_counter: u64,
    /// Revolutions since the device was switched on.
    pub frame_number: u64,
    /// Serial number of the sending device.
    pub sender_id: u32,
    pub number_of_layers_in_module: u32,
    pub number_of_beams_per_scan: u32,
    pub number_of_echoes: u32,
    /// Per layer: timestamp when the first beam was recorded.
    pub timestamps_start: Vec<u64>,
    /// Per layer: timestamp when the last beam was recorded.
    pub timestamps_stop: Vec<u64>,
    /// Per layer: elevation angle in radians.
    pub phis: Vec<f32>,
    /// Per layer: azimuth of the first beam in radians.
    pub theta_start: Vec<f32>,
    /// Per layer: azimuth of the last beam in radians.
    pub theta_stop: Vec<f32>,
    /// Multiplier applied to raw distances by consumers.
    pub distance_scaling_factor: f32,
    /// Encoded size of the following module, `0` if this is the last one.
    pub next_module_size: u32,
    pub echo_content: EchoContent,
    pub beam_content: BeamContent,
}

impl ModuleMetaData {
    /// Encoded size of a metadata block with `layers` layers.
    pub const fn encoded_len(layers: usize) -> usize {
        44 + 28 * layers
    }

    /// Returns `true` if this is the last module of the segment.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.next_module_size == 0
    }
}

/// One reflected-pulse measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Echo {
    /// Raw distance, present iff [`EchoContent::DISTANCE`] is set.
    pub distance: Option<u16>,
    /// Received signal strength, present iff [`EchoContent::RSSI`] is set.
    pub rssi: Option<u16>,
}

/// One measurement beam of a single layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Beam {
    pub echoes: Vec<Echo>,
    /// Present iff [`BeamContent::PROPERTIES`] is set.
    pub properties: Option<u8>,
    /// Azimuth offset, present iff [`BeamContent::THETA`] is set.
    pub theta: Option<i16>,
}

impl Beam {
    /// Bit 0 of the properties byte: a reflector was detected for one of the echoes.
    #[inline]
    pub fn has_reflector(&self) -> bool {
        self.properties.is_some_and(|p| p & 0x01 != 0)
    }
}

/// The beams of every layer for one beam index.
pub type BeamAllLayers = Vec<Beam>;

/// Metadata plus measurement data of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleData {
    pub meta_data: ModuleMetaData,
    /// Indexed `[beam][layer]`.
    pub beams: Vec<BeamAllLayers>,
}

impl ModuleData {
    /// Returns the beam at `beam_index` in layer `layer_index`.
    pub fn beam(&self, beam_index: usize, layer_index: usize) -> Option<&Beam> {
        self.beams.get(beam_index)?.get(layer_index)
    }
}

/// Everything decoded from one telegram.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactSegment {
    pub header: Header,
    pub modules: Vec<ModuleData>,
}

impl CompactSegment {
    /// Total number of echoes across all modules.
    pub fn echo_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| m.beams.iter().flatten())
            .map(|beam| beam.echoes.len())
            .sum()
    }
}
