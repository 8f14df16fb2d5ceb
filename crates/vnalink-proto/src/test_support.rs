use proptest::prelude::*;

use crate::record::*;

/// One representative, non-default record of every kind.
pub(crate) fn sample_records() -> Vec<Record> {
    let mut chunk = [0u8; FIRMWARE_CHUNK_SIZE];
    for (i, byte) in chunk.iter_mut().enumerate() {
        *byte = i as u8;
    }
    vec![
        Record::None,
        Record::Datapoint(Datapoint {
            port1: IqPair::new(0.5, -0.25),
            port2: IqPair::new(1.0e-3, 2.5),
            port3: IqPair::new(-7.75, 0.0),
            reference: IqPair::new(1234.5, -0.125),
            frequency: 2_450_000_000,
            point: 300,
        }),
        Record::SweepSettings(SweepSettings {
            start: 1_000_000,
            stop: 6_000_000_000,
            points: 501,
            if_bandwidth: 1000,
            excitation_cdbm: -1000,
            excite_port1: true,
            excite_port2: false,
            suppress_peaks: true,
        }),
        Record::Status(ManualStatus {
            port1_adc: AdcRange { min: -2048, max: 2047 },
            port2_adc: AdcRange { min: -100, max: 90 },
            reference_adc: AdcRange { min: -1, max: 1 },
            port1: IqPair::new(0.1, 0.2),
            port2: IqPair::new(-0.3, 0.4),
            reference: IqPair::new(0.5, -0.6),
            temp_source: 42,
            temp_lo: 39,
            source_locked: true,
            lo_locked: false,
        }),
        Record::ManualControl(ManualControl {
            high_source_chip_enable: true,
            high_source_rf_enable: true,
            high_source_power: HighBandPower::Plus2Dbm,
            high_source_lowpass: LowpassFilter::Bypass,
            high_source_frequency: 5_000_000_000,
            low_source_enable: false,
            low_source_power: LowBandPower::Drive8mA,
            low_source_frequency: 100_000_000,
            attenuator: Attenuation::new(90).unwrap_or_default(),
            high_band_select: true,
            amplifier_enable: true,
            port_switch: false,
            lo1_chip_enable: true,
            lo1_rf_enable: false,
            lo1_frequency: 5_060_000_000,
            lo2_enable: true,
            lo2_frequency: 60_000_000,
            port1_enable: true,
            port2_enable: false,
            reference_enable: true,
            samples: 131_072,
            window: WindowType::Kaiser,
        }),
        Record::DeviceInfo(DeviceInfo {
            firmware_major: 1,
            firmware_minor: 2,
            hardware_revision: b'B',
            ext_ref_available: true,
            ext_ref_in_use: false,
            fpga_configured: true,
            source_locked: true,
            lo1_locked: false,
            adc_overload: true,
            temp_source: 45,
            temp_lo1: 47,
            temp_mcu: 38,
        }),
        Record::FirmwarePacket(FirmwarePacket {
            address: 0x0800_4000,
            data: Box::new(chunk),
        }),
        Record::Ack,
        Record::ClearFlash,
        Record::PerformFirmwareUpdate,
        Record::Nack,
        Record::ReferenceSettings(ReferenceSettings {
            output_frequency: 10_000_000,
            automatic_switch: false,
            use_external_reference: true,
        }),
        Record::GeneratorSettings(GeneratorSettings {
            frequency: 1_500_000_000,
            level_cdbm: -2500,
            active_port: 2,
        }),
        Record::SpectrumAnalyzerSettings(SpectrumAnalyzerSettings {
            start: 100_000,
            stop: 3_000_000_000,
            rbw: 10_000,
            points: 1001,
            window: WindowType::FlatTop,
            signal_id: true,
            detector: Detector::Normal,
        }),
        Record::SpectrumAnalyzerResult(SpectrumAnalyzerResult {
            port1: -72.5,
            port2: -81.25,
            frequency: 433_920_000,
            point: 17,
        }),
        Record::RequestDeviceLimits,
        Record::DeviceLimits(DeviceLimits {
            min_frequency: 100_000,
            max_frequency: 6_000_000_000,
            min_if_bandwidth: 10,
            max_if_bandwidth: 50_000,
            max_points: 4501,
            min_excitation_cdbm: -4200,
            max_excitation_cdbm: -1000,
            min_rbw: 10,
            max_rbw: 100_000,
        }),
    ]
}

fn finite() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn iq() -> impl Strategy<Value = IqPair> {
    (finite(), finite()).prop_map(|(real, imag)| IqPair { real, imag })
}

/// Arbitrary records of the kinds whose payloads carry free-form numbers.
pub(crate) fn any_record() -> impl Strategy<Value = Record> {
    prop_oneof![
        Just(Record::Ack),
        Just(Record::Nack),
        Just(Record::RequestDeviceLimits),
        (iq(), iq(), iq(), iq(), any::<u64>(), any::<u16>()).prop_map(
            |(port1, port2, port3, reference, frequency, point)| {
                Record::Datapoint(Datapoint {
                    port1,
                    port2,
                    port3,
                    reference,
                    frequency,
                    point,
                })
            }
        ),
        (
            any::<u64>(),
            any::<u64>(),
            any::<u16>(),
            any::<u32>(),
            any::<i16>(),
            any::<[bool; 3]>()
        )
            .prop_map(|(start, stop, points, if_bandwidth, excitation_cdbm, flags)| {
                Record::SweepSettings(SweepSettings {
                    start,
                    stop,
                    points,
                    if_bandwidth,
                    excitation_cdbm,
                    excite_port1: flags[0],
                    excite_port2: flags[1],
                    suppress_peaks: flags[2],
                })
            }),
        (any::<u32>(), proptest::collection::vec(any::<u8>(), FIRMWARE_CHUNK_SIZE)).prop_map(
            |(address, bytes)| {
                Record::FirmwarePacket(
                    FirmwarePacket::from_slice(address, &bytes).expect("chunk sized"),
                )
            }
        ),
        (any::<u64>(), any::<i16>(), any::<u8>()).prop_map(|(frequency, level_cdbm, active_port)| {
            Record::GeneratorSettings(GeneratorSettings {
                frequency,
                level_cdbm,
                active_port,
            })
        }),
        (finite(), finite(), any::<u64>(), any::<u16>()).prop_map(
            |(port1, port2, frequency, point)| {
                Record::SpectrumAnalyzerResult(SpectrumAnalyzerResult {
                    port1,
                    port2,
                    frequency,
                    point,
                })
            }
        ),
    ]
}
