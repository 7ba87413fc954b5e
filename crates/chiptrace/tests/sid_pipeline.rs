use chiptrace::{
    CpuFault, EngineSpec, EventKind, ExtractionConfig, ExtractionJob, Extractor, LoadBlock,
    SubsongEntry, TickFault,
};
use chiptrace_chips::{ChipConfig, ChipFamily};

const INIT: u16 = 0x1000;
const FRAME: u16 = 0x1010;
const FRAME_ILLEGAL: u16 = 0x1020;

fn job(subsongs: Vec<SubsongEntry>) -> ExtractionJob {
    let blocks = vec![
        // LDA #$0F; STA $D418; RTS
        LoadBlock::new(INIT as u32, vec![0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x60]),
        // Voice 1 frequency $1D45 (440 Hz on PAL), gate + sawtooth.
        LoadBlock::new(
            FRAME as u32,
            vec![
                0xA9, 0x45, 0x8D, 0x00, 0xD4, // LDA #$45; STA $D400
                0xA9, 0x1D, 0x8D, 0x01, 0xD4, // LDA #$1D; STA $D401
                0xA9, 0x21, 0x8D, 0x04, 0xD4, // LDA #$21; STA $D404
                0x60, // RTS
            ],
        ),
        LoadBlock::new(FRAME_ILLEGAL as u32, vec![0x02]),
    ];
    ExtractionJob::new(
        0x10000,
        blocks,
        EngineSpec::c64(),
        ChipConfig::with_default_clock(ChipFamily::Sid),
    )
    .with_subsongs(subsongs)
}

#[test]
fn sustained_a4_is_a_single_note_on() {
    let config = ExtractionConfig::default().with_frame_count(32);
    let extraction = Extractor::new(job(vec![SubsongEntry::new(INIT, FRAME, 0)]), config)
        .unwrap()
        .extract();

    let subsong = &extraction.song.subsongs[0];
    assert_eq!(subsong.channels, 3);
    assert_eq!(subsong.order, vec![0, 1]);
    assert_eq!(
        subsong.patterns[0].events().collect::<Vec<_>>(),
        vec![(0, 0, EventKind::NoteOn(69))]
    );
    assert_eq!(subsong.patterns[1].events().count(), 0);

    let diag = &extraction.diagnostics[0];
    assert_eq!(diag.events, 1);
    // One write at init, three per frame.
    assert_eq!(diag.writes, 1 + 3 * 32);
    assert!(!diag.is_degraded());
}

#[test]
fn illegal_opcode_ends_the_subsong() {
    let config = ExtractionConfig::default().with_frame_count(16);
    let extraction = Extractor::new(
        job(vec![
            SubsongEntry::new(INIT, FRAME_ILLEGAL, 0),
            SubsongEntry::new(INIT, FRAME, 1),
        ]),
        config,
    )
    .unwrap()
    .extract();

    assert!(extraction.song.subsongs[0].is_empty());
    let fault = extraction.diagnostics[0].fault.expect("fault recorded");
    assert_eq!(fault.frame, Some(0));
    assert_eq!(
        fault.fault,
        TickFault::Cpu(CpuFault::IllegalOpcode {
            opcode: 0x02,
            pc: FRAME_ILLEGAL
        })
    );

    assert_eq!(extraction.diagnostics[1].frames_sampled, 16);
    assert!(!extraction.song.subsongs[1].is_empty());
}
