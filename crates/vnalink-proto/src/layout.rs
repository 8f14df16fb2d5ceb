//! Fixed payload layouts, one per record kind.
//!
//! All multi-byte fields are little-endian. Flag groups are packed LSB
//! first; unused bits are sent as zero and ignored on receipt.

use bytes::{Buf, BufMut};

use crate::error::DecodeError;
use crate::kind::RecordKind;
use crate::record::*;

/// Largest payload of any kind (a firmware packet).
pub const MAX_PAYLOAD_LEN: usize = 4 + FIRMWARE_CHUNK_SIZE;

fn pack_flags(flags: &[bool]) -> u8 {
    flags
        .iter()
        .enumerate()
        .fold(0u8, |acc, (bit, &set)| acc | (u8::from(set) << bit))
}

fn flag(byte: u8, bit: u8) -> bool {
    byte & (1 << bit) != 0
}

fn field(byte: u8, shift: u8, bits: u32) -> u8 {
    (byte >> shift) & ((1u8 << bits) - 1)
}

fn put_iq(dst: &mut impl BufMut, iq: IqPair) {
    dst.put_f32_le(iq.real);
    dst.put_f32_le(iq.imag);
}

fn get_iq(src: &mut &[u8]) -> IqPair {
    IqPair {
        real: src.get_f32_le(),
        imag: src.get_f32_le(),
    }
}

/// Write the payload bytes of `record` (without the kind byte).
///
/// `dst` must have room for `record.kind().payload_len()` bytes.
pub fn write_payload(record: &Record, dst: &mut impl BufMut) {
    match record {
        Record::None
        | Record::Ack
        | Record::ClearFlash
        | Record::PerformFirmwareUpdate
        | Record::Nack
        | Record::RequestDeviceLimits => {}
        Record::Datapoint(p) => {
            put_iq(dst, p.port1);
            put_iq(dst, p.port2);
            put_iq(dst, p.port3);
            put_iq(dst, p.reference);
            dst.put_u64_le(p.frequency);
            dst.put_u16_le(p.point);
        }
        Record::SweepSettings(s) => {
            dst.put_u64_le(s.start);
            dst.put_u64_le(s.stop);
            dst.put_u16_le(s.points);
            dst.put_u32_le(s.if_bandwidth);
            dst.put_i16_le(s.excitation_cdbm);
            dst.put_u8(pack_flags(&[s.excite_port1, s.excite_port2, s.suppress_peaks]));
        }
        Record::Status(s) => {
            for range in [s.port1_adc, s.port2_adc, s.reference_adc] {
                dst.put_i16_le(range.min);
                dst.put_i16_le(range.max);
            }
            put_iq(dst, s.port1);
            put_iq(dst, s.port2);
            put_iq(dst, s.reference);
            dst.put_u8(s.temp_source);
            dst.put_u8(s.temp_lo);
            dst.put_u8(pack_flags(&[s.source_locked, s.lo_locked]));
        }
        Record::ManualControl(m) => {
            dst.put_u8(
                pack_flags(&[m.high_source_chip_enable, m.high_source_rf_enable])
                    | m.high_source_power.bits() << 2
                    | m.high_source_lowpass.bits() << 4,
            );
            dst.put_u64_le(m.high_source_frequency);
            dst.put_u8(pack_flags(&[m.low_source_enable]) | m.low_source_power.bits() << 1);
            dst.put_u32_le(m.low_source_frequency);
            dst.put_u8(m.attenuator.steps() | u8::from(m.high_band_select) << 7);
            dst.put_u8(pack_flags(&[
                m.amplifier_enable,
                m.port_switch,
                m.lo1_chip_enable,
                m.lo1_rf_enable,
            ]));
            dst.put_u64_le(m.lo1_frequency);
            dst.put_u8(pack_flags(&[m.lo2_enable]));
            dst.put_u32_le(m.lo2_frequency);
            dst.put_u8(pack_flags(&[m.port1_enable, m.port2_enable, m.reference_enable]));
            dst.put_u32_le(m.samples);
            dst.put_u8(m.window.bits());
        }
        Record::DeviceInfo(i) => {
            dst.put_u16_le(i.firmware_major);
            dst.put_u16_le(i.firmware_minor);
            dst.put_u8(i.hardware_revision);
            dst.put_u8(pack_flags(&[
                i.ext_ref_available,
                i.ext_ref_in_use,
                i.fpga_configured,
                i.source_locked,
                i.lo1_locked,
                i.adc_overload,
            ]));
            dst.put_u8(i.temp_source);
            dst.put_u8(i.temp_lo1);
            dst.put_u8(i.temp_mcu);
        }
        Record::FirmwarePacket(f) => {
            dst.put_u32_le(f.address);
            dst.put_slice(&f.data[..]);
        }
        Record::ReferenceSettings(r) => {
            dst.put_u32_le(r.output_frequency);
            dst.put_u8(pack_flags(&[r.automatic_switch, r.use_external_reference]));
        }
        Record::GeneratorSettings(g) => {
            dst.put_u64_le(g.frequency);
            dst.put_i16_le(g.level_cdbm);
            dst.put_u8(g.active_port);
        }
        Record::SpectrumAnalyzerSettings(s) => {
            dst.put_u64_le(s.start);
            dst.put_u64_le(s.stop);
            dst.put_u32_le(s.rbw);
            dst.put_u16_le(s.points);
            dst.put_u8(s.window.bits() | u8::from(s.signal_id) << 2 | s.detector.bits() << 3);
        }
        Record::SpectrumAnalyzerResult(r) => {
            dst.put_f32_le(r.port1);
            dst.put_f32_le(r.port2);
            dst.put_u64_le(r.frequency);
            dst.put_u16_le(r.point);
        }
        Record::DeviceLimits(l) => {
            dst.put_u64_le(l.min_frequency);
            dst.put_u64_le(l.max_frequency);
            dst.put_u32_le(l.min_if_bandwidth);
            dst.put_u32_le(l.max_if_bandwidth);
            dst.put_u16_le(l.max_points);
            dst.put_i16_le(l.min_excitation_cdbm);
            dst.put_i16_le(l.max_excitation_cdbm);
            dst.put_u32_le(l.min_rbw);
            dst.put_u32_le(l.max_rbw);
        }
    }
}

macro_rules! selector_field {
    ($ty:ty, $kind:expr, $name:literal, $raw:expr) => {{
        let raw = $raw;
        <$ty>::from_bits(raw).ok_or(DecodeError::InvalidField {
            kind: $kind,
            field: $name,
            value: raw,
        })?
    }};
}

/// Interpret `payload` with the layout of `kind`.
///
/// The length is checked before any field is read, so a payload is never
/// parsed with another kind's layout.
pub fn read_payload(kind: RecordKind, payload: &[u8]) -> Result<Record, DecodeError> {
    let expected = kind.payload_len();
    if payload.len() != expected {
        return Err(DecodeError::LengthMismatch {
            kind,
            expected,
            actual: payload.len(),
        });
    }

    let src = &mut &payload[..];
    let record = match kind {
        RecordKind::None => Record::None,
        RecordKind::Ack => Record::Ack,
        RecordKind::ClearFlash => Record::ClearFlash,
        RecordKind::PerformFirmwareUpdate => Record::PerformFirmwareUpdate,
        RecordKind::Nack => Record::Nack,
        RecordKind::RequestDeviceLimits => Record::RequestDeviceLimits,
        RecordKind::Datapoint => Record::Datapoint(Datapoint {
            port1: get_iq(src),
            port2: get_iq(src),
            port3: get_iq(src),
            reference: get_iq(src),
            frequency: src.get_u64_le(),
            point: src.get_u16_le(),
        }),
        RecordKind::SweepSettings => {
            let start = src.get_u64_le();
            let stop = src.get_u64_le();
            let points = src.get_u16_le();
            let if_bandwidth = src.get_u32_le();
            let excitation_cdbm = src.get_i16_le();
            let flags = src.get_u8();
            Record::SweepSettings(SweepSettings {
                start,
                stop,
                points,
                if_bandwidth,
                excitation_cdbm,
                excite_port1: flag(flags, 0),
                excite_port2: flag(flags, 1),
                suppress_peaks: flag(flags, 2),
            })
        }
        RecordKind::Status => {
            let mut adc = || AdcRange {
                min: src.get_i16_le(),
                max: src.get_i16_le(),
            };
            let port1_adc = adc();
            let port2_adc = adc();
            let reference_adc = adc();
            let port1 = get_iq(src);
            let port2 = get_iq(src);
            let reference = get_iq(src);
            let temp_source = src.get_u8();
            let temp_lo = src.get_u8();
            let flags = src.get_u8();
            Record::Status(ManualStatus {
                port1_adc,
                port2_adc,
                reference_adc,
                port1,
                port2,
                reference,
                temp_source,
                temp_lo,
                source_locked: flag(flags, 0),
                lo_locked: flag(flags, 1),
            })
        }
        RecordKind::ManualControl => {
            let high = src.get_u8();
            let high_source_frequency = src.get_u64_le();
            let low = src.get_u8();
            let low_source_frequency = src.get_u32_le();
            let path = src.get_u8();
            let switches = src.get_u8();
            let lo1_frequency = src.get_u64_le();
            let lo2 = src.get_u8();
            let lo2_frequency = src.get_u32_le();
            let acquisition = src.get_u8();
            let samples = src.get_u32_le();
            let window = src.get_u8();
            Record::ManualControl(ManualControl {
                high_source_chip_enable: flag(high, 0),
                high_source_rf_enable: flag(high, 1),
                high_source_power: selector_field!(
                    HighBandPower,
                    kind,
                    "high_source_power",
                    field(high, 2, HighBandPower::BITS)
                ),
                high_source_lowpass: selector_field!(
                    LowpassFilter,
                    kind,
                    "high_source_lowpass",
                    field(high, 4, LowpassFilter::BITS)
                ),
                high_source_frequency,
                low_source_enable: flag(low, 0),
                low_source_power: selector_field!(
                    LowBandPower,
                    kind,
                    "low_source_power",
                    field(low, 1, LowBandPower::BITS)
                ),
                low_source_frequency,
                attenuator: Attenuation::new(field(path, 0, 7)).unwrap_or_default(),
                high_band_select: flag(path, 7),
                amplifier_enable: flag(switches, 0),
                port_switch: flag(switches, 1),
                lo1_chip_enable: flag(switches, 2),
                lo1_rf_enable: flag(switches, 3),
                lo1_frequency,
                lo2_enable: flag(lo2, 0),
                lo2_frequency,
                port1_enable: flag(acquisition, 0),
                port2_enable: flag(acquisition, 1),
                reference_enable: flag(acquisition, 2),
                samples,
                window: selector_field!(
                    WindowType,
                    kind,
                    "window",
                    field(window, 0, WindowType::BITS)
                ),
            })
        }
        RecordKind::DeviceInfo => {
            let firmware_major = src.get_u16_le();
            let firmware_minor = src.get_u16_le();
            let hardware_revision = src.get_u8();
            let flags = src.get_u8();
            Record::DeviceInfo(DeviceInfo {
                firmware_major,
                firmware_minor,
                hardware_revision,
                ext_ref_available: flag(flags, 0),
                ext_ref_in_use: flag(flags, 1),
                fpga_configured: flag(flags, 2),
                source_locked: flag(flags, 3),
                lo1_locked: flag(flags, 4),
                adc_overload: flag(flags, 5),
                temp_source: src.get_u8(),
                temp_lo1: src.get_u8(),
                temp_mcu: src.get_u8(),
            })
        }
        RecordKind::FirmwarePacket => {
            let address = src.get_u32_le();
            let mut data = Box::new([0u8; FIRMWARE_CHUNK_SIZE]);
            src.copy_to_slice(&mut data[..]);
            Record::FirmwarePacket(FirmwarePacket { address, data })
        }
        RecordKind::ReferenceSettings => {
            let output_frequency = src.get_u32_le();
            let flags = src.get_u8();
            Record::ReferenceSettings(ReferenceSettings {
                output_frequency,
                automatic_switch: flag(flags, 0),
                use_external_reference: flag(flags, 1),
            })
        }
        RecordKind::GeneratorSettings => Record::GeneratorSettings(GeneratorSettings {
            frequency: src.get_u64_le(),
            level_cdbm: src.get_i16_le(),
            active_port: src.get_u8(),
        }),
        RecordKind::SpectrumAnalyzerSettings => {
            let start = src.get_u64_le();
            let stop = src.get_u64_le();
            let rbw = src.get_u32_le();
            let points = src.get_u16_le();
            let modes = src.get_u8();
            Record::SpectrumAnalyzerSettings(SpectrumAnalyzerSettings {
                start,
                stop,
                rbw,
                points,
                window: selector_field!(
                    WindowType,
                    kind,
                    "window",
                    field(modes, 0, WindowType::BITS)
                ),
                signal_id: flag(modes, 2),
                detector: selector_field!(
                    Detector,
                    kind,
                    "detector",
                    field(modes, 3, Detector::BITS)
                ),
            })
        }
        RecordKind::SpectrumAnalyzerResult => {
            Record::SpectrumAnalyzerResult(SpectrumAnalyzerResult {
                port1: src.get_f32_le(),
                port2: src.get_f32_le(),
                frequency: src.get_u64_le(),
                point: src.get_u16_le(),
            })
        }
        RecordKind::DeviceLimits => Record::DeviceLimits(DeviceLimits {
            min_frequency: src.get_u64_le(),
            max_frequency: src.get_u64_le(),
            min_if_bandwidth: src.get_u32_le(),
            max_if_bandwidth: src.get_u32_le(),
            max_points: src.get_u16_le(),
            min_excitation_cdbm: src.get_i16_le(),
            max_excitation_cdbm: src.get_i16_le(),
            min_rbw: src.get_u32_le(),
            max_rbw: src.get_u32_le(),
        }),
    };
    debug_assert!(src.is_empty(), "{kind} layout left trailing bytes");
    Ok(record)
}
