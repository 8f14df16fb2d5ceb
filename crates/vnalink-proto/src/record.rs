//! Typed records exchanged with the instrument.
//!
//! Every record kind has one payload struct with a fixed wire layout (see
//! [`layout`](crate::layout)). Flag groups that are bit-packed on the wire
//! are plain `bool` fields here, and multi-bit selectors are enums, so every
//! value of these types has a valid encoding.

use crate::kind::RecordKind;

/// Size of the data block carried by one [`FirmwarePacket`].
pub const FIRMWARE_CHUNK_SIZE: usize = 256;

macro_rules! selector {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $bits:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Width of the field on the wire, in bits.
            pub const BITS: u32 = $bits;

            pub const fn bits(self) -> u8 {
                self as u8
            }

            pub const fn from_bits(bits: u8) -> Option<Self> {
                match bits {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

selector! {
    /// FFT window applied by the acquisition chain.
    pub enum WindowType: 2 {
        #[default]
        None = 0,
        Kaiser = 1,
        Hann = 2,
        FlatTop = 3,
    }
}

selector! {
    /// Spectrum analyzer detector mode.
    pub enum Detector: 3 {
        #[default]
        PositivePeak = 0,
        NegativePeak = 1,
        Sample = 2,
        Normal = 3,
        Average = 4,
    }
}

selector! {
    /// Output power of the high-band synthesizer.
    pub enum HighBandPower: 2 {
        #[default]
        Minus4Dbm = 0,
        Minus1Dbm = 1,
        Plus2Dbm = 2,
        Plus5Dbm = 3,
    }
}

selector! {
    /// Output drive strength of the low-band synthesizer.
    pub enum LowBandPower: 2 {
        #[default]
        Drive2mA = 0,
        Drive4mA = 1,
        Drive6mA = 2,
        Drive8mA = 3,
    }
}

selector! {
    /// Low-pass filter after the high-band source.
    pub enum LowpassFilter: 2 {
        #[default]
        Cutoff947MHz = 0,
        Cutoff1880MHz = 1,
        Cutoff3500MHz = 2,
        Bypass = 3,
    }
}

/// Step attenuator setting in 0.25 dB steps (7 bits, 0..=127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Attenuation(u8);

impl Attenuation {
    pub const MAX: u8 = 0x7F;

    pub const fn new(steps: u8) -> Option<Self> {
        if steps <= Self::MAX {
            Some(Self(steps))
        } else {
            None
        }
    }

    pub const fn steps(self) -> u8 {
        self.0
    }

    pub fn db(self) -> f32 {
        f32::from(self.0) * 0.25
    }
}

impl TryFrom<u8> for Attenuation {
    type Error = String;

    fn try_from(steps: u8) -> Result<Self, Self::Error> {
        Self::new(steps).ok_or_else(|| format!("attenuation {steps} exceeds {}", Self::MAX))
    }
}

impl From<Attenuation> for u8 {
    fn from(value: Attenuation) -> Self {
        value.0
    }
}

/// One complex sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IqPair {
    pub real: f32,
    pub imag: f32,
}

impl IqPair {
    pub const fn new(real: f32, imag: f32) -> Self {
        Self { real, imag }
    }
}

/// One measured sweep point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Datapoint {
    pub port1: IqPair,
    pub port2: IqPair,
    pub port3: IqPair,
    pub reference: IqPair,
    /// Hz.
    pub frequency: u64,
    pub point: u16,
}

/// Vector sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepSettings {
    /// Hz.
    pub start: u64,
    /// Hz.
    pub stop: u64,
    pub points: u16,
    /// Hz.
    pub if_bandwidth: u32,
    /// Hundredths of a dBm.
    pub excitation_cdbm: i16,
    pub excite_port1: bool,
    pub excite_port2: bool,
    pub suppress_peaks: bool,
}

/// Raw ADC range of one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdcRange {
    pub min: i16,
    pub max: i16,
}

/// Telemetry reported while the instrument is in manual control mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManualStatus {
    pub port1_adc: AdcRange,
    pub port2_adc: AdcRange,
    pub reference_adc: AdcRange,
    pub port1: IqPair,
    pub port2: IqPair,
    pub reference: IqPair,
    /// °C.
    pub temp_source: u8,
    /// °C.
    pub temp_lo: u8,
    pub source_locked: bool,
    pub lo_locked: bool,
}

/// Direct hardware control used for bring-up and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManualControl {
    pub high_source_chip_enable: bool,
    pub high_source_rf_enable: bool,
    pub high_source_power: HighBandPower,
    pub high_source_lowpass: LowpassFilter,
    /// Hz.
    pub high_source_frequency: u64,

    pub low_source_enable: bool,
    pub low_source_power: LowBandPower,
    /// Hz.
    pub low_source_frequency: u32,

    pub attenuator: Attenuation,
    pub high_band_select: bool,
    pub amplifier_enable: bool,
    pub port_switch: bool,

    pub lo1_chip_enable: bool,
    pub lo1_rf_enable: bool,
    /// Hz.
    pub lo1_frequency: u64,

    pub lo2_enable: bool,
    /// Hz.
    pub lo2_frequency: u32,

    pub port1_enable: bool,
    pub port2_enable: bool,
    pub reference_enable: bool,
    pub samples: u32,
    pub window: WindowType,
}

/// Identification and health summary of the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    pub firmware_major: u16,
    pub firmware_minor: u16,
    /// ASCII revision letter, e.g. `b'B'`.
    pub hardware_revision: u8,
    pub ext_ref_available: bool,
    pub ext_ref_in_use: bool,
    pub fpga_configured: bool,
    pub source_locked: bool,
    pub lo1_locked: bool,
    pub adc_overload: bool,
    /// °C.
    pub temp_source: u8,
    /// °C.
    pub temp_lo1: u8,
    /// °C.
    pub temp_mcu: u8,
}

impl DeviceInfo {
    pub fn hardware_revision_char(&self) -> char {
        char::from(self.hardware_revision)
    }
}

/// One addressed slice of a firmware image.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwarePacket {
    /// Absolute flash address of `data[0]`.
    pub address: u32,
    #[cfg_attr(feature = "serde", serde(with = "chunk_serde"))]
    pub data: Box<[u8; FIRMWARE_CHUNK_SIZE]>,
}

impl FirmwarePacket {
    /// Build a packet from up to [`FIRMWARE_CHUNK_SIZE`] bytes, zero padding
    /// the remainder. Returns `None` if `bytes` is longer than one chunk.
    pub fn from_slice(address: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() > FIRMWARE_CHUNK_SIZE {
            return None;
        }
        let mut data = Box::new([0u8; FIRMWARE_CHUNK_SIZE]);
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self { address, data })
    }
}

/// 10 MHz reference configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceSettings {
    /// Frequency of the reference output in Hz, 0 disables it.
    pub output_frequency: u32,
    pub automatic_switch: bool,
    pub use_external_reference: bool,
}

/// Signal generator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorSettings {
    /// Hz.
    pub frequency: u64,
    /// Hundredths of a dBm.
    pub level_cdbm: i16,
    /// 0 turns the output off.
    pub active_port: u8,
}

/// Spectrum analyzer sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumAnalyzerSettings {
    /// Hz.
    pub start: u64,
    /// Hz.
    pub stop: u64,
    /// Resolution bandwidth in Hz.
    pub rbw: u32,
    pub points: u16,
    pub window: WindowType,
    pub signal_id: bool,
    pub detector: Detector,
}

/// One spectrum analyzer point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumAnalyzerResult {
    pub port1: f32,
    pub port2: f32,
    /// Hz.
    pub frequency: u64,
    pub point: u16,
}

/// Capability limits reported by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceLimits {
    pub min_frequency: u64,
    pub max_frequency: u64,
    pub min_if_bandwidth: u32,
    pub max_if_bandwidth: u32,
    pub max_points: u16,
    pub min_excitation_cdbm: i16,
    pub max_excitation_cdbm: i16,
    pub min_rbw: u32,
    pub max_rbw: u32,
}

/// A typed message exchanged with the instrument.
///
/// The variant is the kind tag; a payload can only be reached by matching
/// its own variant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Record {
    None,
    Datapoint(Datapoint),
    SweepSettings(SweepSettings),
    Status(ManualStatus),
    ManualControl(ManualControl),
    DeviceInfo(DeviceInfo),
    FirmwarePacket(FirmwarePacket),
    Ack,
    ClearFlash,
    PerformFirmwareUpdate,
    Nack,
    ReferenceSettings(ReferenceSettings),
    GeneratorSettings(GeneratorSettings),
    SpectrumAnalyzerSettings(SpectrumAnalyzerSettings),
    SpectrumAnalyzerResult(SpectrumAnalyzerResult),
    RequestDeviceLimits,
    DeviceLimits(DeviceLimits),
}

impl Record {
    pub const fn kind(&self) -> RecordKind {
        match self {
            Record::None => RecordKind::None,
            Record::Datapoint(_) => RecordKind::Datapoint,
            Record::SweepSettings(_) => RecordKind::SweepSettings,
            Record::Status(_) => RecordKind::Status,
            Record::ManualControl(_) => RecordKind::ManualControl,
            Record::DeviceInfo(_) => RecordKind::DeviceInfo,
            Record::FirmwarePacket(_) => RecordKind::FirmwarePacket,
            Record::Ack => RecordKind::Ack,
            Record::ClearFlash => RecordKind::ClearFlash,
            Record::PerformFirmwareUpdate => RecordKind::PerformFirmwareUpdate,
            Record::Nack => RecordKind::Nack,
            Record::ReferenceSettings(_) => RecordKind::ReferenceSettings,
            Record::GeneratorSettings(_) => RecordKind::GeneratorSettings,
            Record::SpectrumAnalyzerSettings(_) => RecordKind::SpectrumAnalyzerSettings,
            Record::SpectrumAnalyzerResult(_) => RecordKind::SpectrumAnalyzerResult,
            Record::RequestDeviceLimits => RecordKind::RequestDeviceLimits,
            Record::DeviceLimits(_) => RecordKind::DeviceLimits,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Record::Ack)
    }

    pub fn is_nack(&self) -> bool {
        matches!(self, Record::Nack)
    }
}

macro_rules! record_from {
    ($($payload:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$payload> for Record {
                fn from(payload: $payload) -> Self {
                    Record::$variant(payload)
                }
            }
        )+
    };
}

record_from! {
    Datapoint => Datapoint,
    SweepSettings => SweepSettings,
    ManualStatus => Status,
    ManualControl => ManualControl,
    DeviceInfo => DeviceInfo,
    FirmwarePacket => FirmwarePacket,
    ReferenceSettings => ReferenceSettings,
    GeneratorSettings => GeneratorSettings,
    SpectrumAnalyzerSettings => SpectrumAnalyzerSettings,
    SpectrumAnalyzerResult => SpectrumAnalyzerResult,
    DeviceLimits => DeviceLimits,
}

#[cfg(feature = "serde")]
mod chunk_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::FIRMWARE_CHUNK_SIZE;

    pub fn serialize<S: Serializer>(
        data: &[u8; FIRMWARE_CHUNK_SIZE],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Box<[u8; FIRMWARE_CHUNK_SIZE]>, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let len = bytes.len();
        bytes
            .into_boxed_slice()
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"256 firmware bytes"))
    }
}
