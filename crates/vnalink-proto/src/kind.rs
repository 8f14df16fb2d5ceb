//! Record kind codes.
//!
//! The kind byte is the first byte of every frame body and selects exactly
//! one payload layout. Codes are part of the wire contract with the
//! instrument firmware and must never be renumbered.

use std::fmt;

/// Kind tag of a [`Record`](crate::Record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum RecordKind {
    None = 0,
    Datapoint = 1,
    SweepSettings = 2,
    /// Manual-mode status telemetry.
    Status = 3,
    ManualControl = 4,
    DeviceInfo = 5,
    FirmwarePacket = 6,
    Ack = 7,
    ClearFlash = 8,
    PerformFirmwareUpdate = 9,
    Nack = 10,
    ReferenceSettings = 11,
    GeneratorSettings = 12,
    SpectrumAnalyzerSettings = 13,
    SpectrumAnalyzerResult = 14,
    RequestDeviceLimits = 15,
    DeviceLimits = 16,
}

impl RecordKind {
    /// Every kind, in code order.
    pub const ALL: [RecordKind; 17] = [
        RecordKind::None,
        RecordKind::Datapoint,
        RecordKind::SweepSettings,
        RecordKind::Status,
        RecordKind::ManualControl,
        RecordKind::DeviceInfo,
        RecordKind::FirmwarePacket,
        RecordKind::Ack,
        RecordKind::ClearFlash,
        RecordKind::PerformFirmwareUpdate,
        RecordKind::Nack,
        RecordKind::ReferenceSettings,
        RecordKind::GeneratorSettings,
        RecordKind::SpectrumAnalyzerSettings,
        RecordKind::SpectrumAnalyzerResult,
        RecordKind::RequestDeviceLimits,
        RecordKind::DeviceLimits,
    ];

    /// Look up a kind by its wire code. Returns `None` for codes this
    /// build does not know, which the decoder reports as unknown-kind.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::Datapoint,
            2 => Self::SweepSettings,
            3 => Self::Status,
            4 => Self::ManualControl,
            5 => Self::DeviceInfo,
            6 => Self::FirmwarePacket,
            7 => Self::Ack,
            8 => Self::ClearFlash,
            9 => Self::PerformFirmwareUpdate,
            10 => Self::Nack,
            11 => Self::ReferenceSettings,
            12 => Self::GeneratorSettings,
            13 => Self::SpectrumAnalyzerSettings,
            14 => Self::SpectrumAnalyzerResult,
            15 => Self::RequestDeviceLimits,
            16 => Self::DeviceLimits,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Fixed payload length of this kind in bytes.
    pub const fn payload_len(self) -> usize {
        match self {
            Self::None
            | Self::Ack
            | Self::ClearFlash
            | Self::PerformFirmwareUpdate
            | Self::Nack
            | Self::RequestDeviceLimits => 0,
            Self::Datapoint => 42,
            Self::SweepSettings => 25,
            Self::Status => 39,
            Self::ManualControl => 35,
            Self::DeviceInfo => 9,
            Self::FirmwarePacket => 4 + crate::FIRMWARE_CHUNK_SIZE,
            Self::ReferenceSettings => 5,
            Self::GeneratorSettings => 11,
            Self::SpectrumAnalyzerSettings => 23,
            Self::SpectrumAnalyzerResult => 18,
            Self::DeviceLimits => 38,
        }
    }

    /// Whether the instrument answers this kind with `Ack`/`Nack`.
    pub const fn expects_ack(self) -> bool {
        matches!(
            self,
            Self::SweepSettings
                | Self::ManualControl
                | Self::FirmwarePacket
                | Self::ClearFlash
                | Self::PerformFirmwareUpdate
                | Self::ReferenceSettings
                | Self::GeneratorSettings
                | Self::SpectrumAnalyzerSettings
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Datapoint => "Datapoint",
            Self::SweepSettings => "SweepSettings",
            Self::Status => "Status",
            Self::ManualControl => "ManualControl",
            Self::DeviceInfo => "DeviceInfo",
            Self::FirmwarePacket => "FirmwarePacket",
            Self::Ack => "Ack",
            Self::ClearFlash => "ClearFlash",
            Self::PerformFirmwareUpdate => "PerformFirmwareUpdate",
            Self::Nack => "Nack",
            Self::ReferenceSettings => "ReferenceSettings",
            Self::GeneratorSettings => "GeneratorSettings",
            Self::SpectrumAnalyzerSettings => "SpectrumAnalyzerSettings",
            Self::SpectrumAnalyzerResult => "SpectrumAnalyzerResult",
            Self::RequestDeviceLimits => "RequestDeviceLimits",
            Self::DeviceLimits => "DeviceLimits",
        }
    }
}

impl TryFrom<u8> for RecordKind {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
