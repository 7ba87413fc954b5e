use chiptrace::{
    EngineSpec, EventKind, ExtractionConfig, ExtractionJob, Extractor, LoadBlock, MacroFault,
    SubsongEntry, TickFault,
};
use chiptrace_chips::{ChipConfig, ChipFamily};

const TABLE: u16 = 0x0000;
const LOOP_TABLE: u16 = 0x0300;
const BAD_TABLE: u16 = 0x0380;

fn job(subsongs: Vec<SubsongEntry>) -> ExtractionJob {
    let blocks = vec![
        // Voice 0 at 0x0100, voice 1 at 0x0200, voices 2-3 unused.
        LoadBlock::new(TABLE as u32, vec![0x00, 0x01, 0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFF]),
        // WAVE 1; PERIOD 428; VOL_RAMP 64 -> 0 over 4; STOP
        LoadBlock::new(
            0x0100,
            vec![0x01, 0x01, 0x02, 0x01, 0xAC, 0x04, 0x40, 0x00, 0x04, 0x00],
        ),
        // PERIOD 214; WAVE 2; VOLUME 32; WAIT 2; WAVE 0; STOP
        LoadBlock::new(
            0x0200,
            vec![0x02, 0x00, 0xD6, 0x01, 0x02, 0x03, 0x20, 0x06, 0x02, 0x01, 0x00, 0x00],
        ),
        // Voice 0 spins on JUMP 0x0310.
        LoadBlock::new(LOOP_TABLE as u32, vec![0x10, 0x03, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        LoadBlock::new(0x0310, vec![0x07, 0x03, 0x10]),
        // Voice 0 hits an undefined opcode on its second frame.
        LoadBlock::new(BAD_TABLE as u32, vec![0x90, 0x03, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        LoadBlock::new(0x0390, vec![0x01, 0x01, 0x02, 0x01, 0xAC, 0x03, 0x40, 0x06, 0x01, 0x0E]),
    ];
    ExtractionJob::new(
        0x400,
        blocks,
        EngineSpec::Macro,
        ChipConfig::with_default_clock(ChipFamily::Paula),
    )
    .with_subsongs(subsongs)
}

fn config() -> ExtractionConfig {
    ExtractionConfig {
        frame_step_budget: 100,
        ..ExtractionConfig::default()
    }
    .with_frame_count(8)
    .with_frames_per_block(4)
}

#[test]
fn two_voices_reconstruct_notes_and_ramps() {
    let extraction = Extractor::new(job(vec![SubsongEntry::new(TABLE, 0, 0)]), config())
        .unwrap()
        .extract();
    let subsong = &extraction.song.subsongs[0];

    assert_eq!(subsong.channels, 4);
    assert_eq!(subsong.order, vec![0, 1]);
    assert_eq!(
        subsong.patterns[0].rows,
        vec![
            vec![Some(EventKind::NoteOn(60)), Some(EventKind::NoteOn(72)), None, None],
            vec![Some(EventKind::VolumeChange(43)), None, None, None],
            vec![Some(EventKind::VolumeChange(22)), Some(EventKind::NoteOff), None, None],
            vec![Some(EventKind::NoteOff), None, None, None],
        ]
    );
    assert_eq!(subsong.patterns[1].events().count(), 0);
    assert!(!extraction.diagnostics[0].is_degraded());
}

#[test]
fn jump_loop_times_out_every_frame() {
    let extraction = Extractor::new(job(vec![SubsongEntry::new(LOOP_TABLE, 0, 0)]), config())
        .unwrap()
        .extract();
    let diag = &extraction.diagnostics[0];

    assert_eq!(diag.frames_sampled, 8);
    assert_eq!(diag.frame_timeouts, 8);
    assert_eq!(diag.events, 0);
    assert!(diag.is_degraded());
    assert_eq!(extraction.song.subsongs[0].order, vec![0, 0]);
}

#[test]
fn unknown_opcode_keeps_frames_before_it() {
    let extraction = Extractor::new(job(vec![SubsongEntry::new(BAD_TABLE, 0, 0)]), config())
        .unwrap()
        .extract();
    let diag = &extraction.diagnostics[0];

    assert_eq!(diag.frames_sampled, 1);
    let fault = diag.fault.expect("fault recorded");
    assert_eq!(fault.frame, Some(1));
    assert_eq!(
        fault.fault,
        TickFault::Macro(MacroFault::UnknownOpcode {
            voice: 0,
            opcode: 0x0E,
            address: 0x0399
        })
    );

    let subsong = &extraction.song.subsongs[0];
    assert_eq!(subsong.order, vec![0]);
    assert_eq!(
        subsong.patterns[0].rows,
        vec![vec![Some(EventKind::NoteOn(60)), None, None, None]]
    );
}
