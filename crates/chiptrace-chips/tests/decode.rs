use approx::assert_relative_eq;
use chiptrace_chips::family::{ATARI_ST_CLOCK, SID_PAL_CLOCK};
use chiptrace_chips::{
    ChipConfig, ChipError, ChipFamily, ChipState, PitchReference, RegisterWrite, Waveform, paula,
};

fn chip_with(config: ChipConfig, writes: &[(u8, u8)]) -> ChipState {
    let mut chip = ChipState::new(config);
    chip.apply_all(
        writes
            .iter()
            .enumerate()
            .map(|(tick, &(reg, value))| RegisterWrite::new(reg, value, tick as u32)),
    );
    chip
}

#[test]
fn ay_middle_c_on_channel_a() {
    let chip = chip_with(
        ChipConfig::new(ChipFamily::Ay8910, ATARI_ST_CLOCK),
        &[(0, 0xDE), (1, 0x01), (7, 0x3E), (8, 0x0F)],
    );

    let a = chip.decode_channel(0).unwrap();
    assert_eq!(a.period, 478);
    assert_relative_eq!(a.frequency_hz.unwrap(), ATARI_ST_CLOCK / 7648.0);
    assert_eq!(a.volume, 15);
    assert_eq!(a.waveform, Waveform::Square);
    assert!(a.is_audible());
    assert_eq!(PitchReference::default().note_for(a.frequency_hz.unwrap()), 60);

    let b = chip.decode_channel(1).unwrap();
    assert!(!b.enabled);
    assert!(!b.is_audible());
}

#[test]
fn ay_envelope_mode_is_full_volume() {
    let chip = chip_with(
        ChipConfig::new(ChipFamily::Ay8910, ATARI_ST_CLOCK),
        &[(0, 0xDE), (1, 0x01), (7, 0x3E), (8, 0x10), (13, 0x0E)],
    );
    let a = chip.decode_channel(0).unwrap();
    assert_eq!(a.volume, 15);
    assert_eq!(a.waveform, Waveform::Envelope(0x0E));
}

#[test]
fn sid_a4_gated_sawtooth() {
    let config = ChipConfig::new(ChipFamily::Sid, SID_PAL_CLOCK);
    let chip = chip_with(config, &[(0, 0x45), (1, 0x1D), (4, 0x21), (24, 0x0F)]);

    let voice = chip.decode_channel(0).unwrap();
    assert_eq!(voice.waveform, Waveform::Sawtooth);
    assert_eq!(voice.volume, 15);
    assert!(voice.is_audible());
    assert_eq!(PitchReference::default().note_for(voice.frequency_hz.unwrap()), 69);

    let tested = chip_with(config, &[(0, 0x45), (1, 0x1D), (4, 0x29), (24, 0x0F)]);
    assert!(!tested.decode_channel(0).unwrap().is_audible());
}

#[test]
fn paula_voice_from_synthetic_registers() {
    let chip = chip_with(
        ChipConfig::with_default_clock(ChipFamily::Paula),
        &[
            (paula::register(2, paula::PERIOD_HI), 0x01),
            (paula::register(2, paula::PERIOD_LO), 0xAC),
            (paula::register(2, paula::VOLUME), 80),
            (paula::register(2, paula::WAVEFORM), 3),
        ],
    );

    let voice = chip.decode_channel(2).unwrap();
    assert_eq!(voice.period, 428);
    assert_eq!(voice.volume, paula::MAX_VOLUME);
    assert_eq!(voice.waveform, Waveform::Sample(3));
    assert_eq!(PitchReference::default().note_for(voice.frequency_hz.unwrap()), 60);
    assert!(!chip.decode_channel(0).unwrap().enabled);
}

#[test]
fn decode_depends_only_on_latched_registers() {
    let config = ChipConfig::new(ChipFamily::Ay8910, ATARI_ST_CLOCK);
    let direct = chip_with(config, &[(0, 0xDE), (1, 0x01), (7, 0x3E), (8, 0x0F)]);
    let roundabout = chip_with(
        config,
        &[
            (8, 0x03),
            (0, 0x11),
            (7, 0x38),
            (1, 0x01),
            (0, 0xDE),
            (7, 0x3E),
            (8, 0x0F),
        ],
    );

    assert_eq!(direct.registers(), roundabout.registers());
    for channel in 0..3 {
        assert_eq!(
            direct.decode_channel(channel).unwrap(),
            roundabout.decode_channel(channel).unwrap()
        );
    }
    assert_eq!(roundabout.writes_applied(), 7);
}

#[test]
fn snapshot_is_frozen_at_capture() {
    let mut chip = chip_with(
        ChipConfig::new(ChipFamily::Ay8910, ATARI_ST_CLOCK),
        &[(0, 0xDE), (1, 0x01), (7, 0x3E), (8, 0x0F)],
    );
    let before = chip.snapshot(4);
    chip.apply(RegisterWrite::new(8, 0, 0));

    assert_eq!(before.frame(), 4);
    assert!(before.decode_channel(0).unwrap().is_audible());
    assert!(!chip.decode_channel(0).unwrap().is_audible());
}

#[test]
fn writes_past_the_register_table_are_dropped() {
    let mut chip = ChipState::new(ChipConfig::with_default_clock(ChipFamily::Ay8910));
    chip.apply(RegisterWrite::new(20, 0xFF, 0));
    assert!(chip.registers().iter().all(|&r| r == 0));
    assert_eq!(chip.registers().len(), 16);
}

#[test]
fn channel_past_the_family_is_an_error() {
    let chip = ChipState::new(ChipConfig::with_default_clock(ChipFamily::Sid));
    assert_eq!(
        chip.decode_channel(3),
        Err(ChipError::ChannelOutOfRange {
            channel: 3,
            channels: 3
        })
    );
}
