//! Integration test: configure generators → drive a simulated host
//! transport → verify the rendered note stream.

use euclid::{
    generate, Diagnostic, GeneratorConfig, MidiMessage, OfflineHost, ParamId, RenderedEvent, Rendering,
    EVENT_BYTES, GENERATORS, PARAMETERS_PER_GENERATOR,
};

const FPS: f32 = 48_000.0;
const FRAMES_PER_BAR: i64 = 96_000; // 120 BPM, 4/4
const BLOCK: u32 = 512;

fn host() -> OfflineHost {
    let mut host = OfflineHost::new(FPS, 120.0, 4.0, BLOCK);
    host.clear_configs();
    host
}

fn voice(onsets: u16, beats: u16, note: u8) -> GeneratorConfig {
    GeneratorConfig { enabled: true, onsets, beats, note, ..GeneratorConfig::default() }
}

fn on_frames(events: &[&RenderedEvent]) -> Vec<i64> {
    events.iter().filter(|e| e.message.is_note_on()).map(|e| e.frame).collect()
}

/// Each note must alternate note-on, note-off, starting with a note-on.
fn assert_monophonic(rendering: &Rendering, note: u8) {
    let mut held = false;
    for event in rendering.note_events(note) {
        if event.message.is_note_on() {
            assert!(!held, "note {} retriggered at frame {} without a note-off", note, event.frame);
        } else {
            assert!(held, "note {} released at frame {} without a note-on", note, event.frame);
        }
        held = !held;
    }
}

fn assert_frame_order(rendering: &Rendering) {
    for pair in rendering.events.windows(2) {
        assert!(pair[0].frame <= pair[1].frame, "{:?} before {:?}", pair[0], pair[1]);
    }
}

// --- Single generator ---

#[test]
fn four_on_the_floor_is_sample_accurate() {
    let mut host = host();
    host.set_config(0, voice(4, 4, 60));
    // Stop just short of the next bar line.
    let rendering = host.render_until(FRAMES_PER_BAR - BLOCK as i64);

    let expected: Vec<RenderedEvent> = [0, 24_000, 48_000, 72_000]
        .iter()
        .flat_map(|&frame| {
            [
                RenderedEvent { frame, message: MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 } },
                RenderedEvent { frame: frame + 1_000, message: MidiMessage::NoteOff { channel: 0, note: 60 } },
            ]
        })
        .collect();
    assert_eq!(rendering.events, expected);
    assert!(rendering.diagnostics.is_empty());
}

#[test]
fn onsets_follow_the_rotated_pattern() {
    for rotation in [-3i16, 0, 1, 2, 5, 11] {
        let mut host = host();
        host.set_config(0, GeneratorConfig { rotation, ..voice(3, 8, 60) });
        let rendering = host.render_until(FRAMES_PER_BAR - BLOCK as i64);

        let pattern = generate(3, 8, rotation).unwrap();
        let expected: Vec<i64> = (0..8).filter(|&i| pattern.slot(i)).map(|i| i as i64 * 12_000).collect();
        assert_eq!(rendering.note_on_frames(), expected, "rotation {}", rotation);
    }
}

#[test]
fn pattern_repeats_every_bar() {
    let mut host = host();
    host.set_config(0, voice(3, 8, 60));
    let rendering = host.render_until(4 * FRAMES_PER_BAR - BLOCK as i64);

    let frames = rendering.note_on_frames();
    assert_eq!(frames.len(), 12);
    for bar in 0..4 {
        let base = bar as i64 * FRAMES_PER_BAR;
        assert_eq!(&frames[bar * 3..bar * 3 + 3], &[base, base + 36_000, base + 72_000]);
    }
    assert_monophonic(&rendering, 60);
}

#[test]
fn decoded_parameters_drive_the_output() {
    let mut values = [0.0f32; PARAMETERS_PER_GENERATOR];
    values[ParamId::Enabled.index()] = 1.0;
    values[ParamId::Beats.index()] = 4.0;
    values[ParamId::Onsets.index()] = 1.0;
    values[ParamId::Bars.index()] = 1.0;
    values[ParamId::Channel.index()] = 10.0;
    values[ParamId::Note.index()] = 36.0;
    values[ParamId::Velocity.index()] = 127.0;

    let mut host = host();
    host.set_config(0, GeneratorConfig::from_values(&values));
    let rendering = host.render_blocks(1);
    assert_eq!(
        rendering.events,
        vec![RenderedEvent { frame: 0, message: MidiMessage::NoteOn { channel: 9, note: 36, velocity: 127 } }]
    );
}

// --- Several generators ---

#[test]
fn generators_keep_their_own_cycle_lengths() {
    let mut host = host();
    host.set_config(0, voice(4, 4, 36));
    host.set_config(1, GeneratorConfig { bars_per_cycle: 2, ..voice(3, 4, 38) });
    host.set_config(2, GeneratorConfig { bars_per_cycle: 3, ..voice(5, 12, 42) });
    let rendering = host.render_until(6 * FRAMES_PER_BAR - BLOCK as i64);

    let kick: Vec<&RenderedEvent> = rendering.note_events(36).collect();
    assert_eq!(on_frames(&kick).len(), 24);

    let snare_pattern = generate(3, 4, 0).unwrap();
    let expected_snare: Vec<i64> = (0..3)
        .flat_map(|cycle| {
            (0..4)
                .filter(move |&i| snare_pattern.slot(i))
                .map(move |i| cycle * 2 * FRAMES_PER_BAR + i as i64 * 48_000)
        })
        .collect();
    let snare: Vec<&RenderedEvent> = rendering.note_events(38).collect();
    assert_eq!(on_frames(&snare), expected_snare);

    let hat_pattern = generate(5, 12, 0).unwrap();
    let expected_hat: Vec<i64> = (0..2)
        .flat_map(|cycle| {
            (0..12)
                .filter(move |&i| hat_pattern.slot(i))
                .map(move |i| cycle * 3 * FRAMES_PER_BAR + i as i64 * 24_000)
        })
        .collect();
    let hat: Vec<&RenderedEvent> = rendering.note_events(42).collect();
    assert_eq!(on_frames(&hat), expected_hat);

    assert_frame_order(&rendering);
    for note in [36, 38, 42] {
        assert_monophonic(&rendering, note);
    }
}

#[test]
fn invalid_generator_is_isolated() {
    let mut host = host();
    host.set_config(0, voice(3, 0, 36));
    host.set_config(1, voice(4, 4, 38));
    host.set_config(2, GeneratorConfig { bars_per_cycle: 0, ..voice(2, 4, 40) });
    host.set_config(3, voice(2, 65, 41));
    let rendering = host.render_until(FRAMES_PER_BAR - BLOCK as i64);

    assert!(rendering.diagnostics.contains(&Diagnostic::InvalidBeats { generator: 0 }));
    assert!(rendering.diagnostics.contains(&Diagnostic::InvalidBarsPerCycle { generator: 2 }));
    assert!(rendering.diagnostics.contains(&Diagnostic::TooManyBeats { generator: 3, beats: 65 }));
    assert!(rendering.events.iter().all(|e| e.message.note() == 38));
    assert_eq!(rendering.note_on_frames(), vec![0, 24_000, 48_000, 72_000]);
}

#[test]
fn onsets_exceeding_beats_fire_every_beat() {
    let mut host = host();
    host.set_config(0, voice(9, 4, 60));
    let rendering = host.render_until(FRAMES_PER_BAR - BLOCK as i64);
    assert_eq!(
        rendering.diagnostics,
        vec![Diagnostic::OnsetsExceedBeats { generator: 0, onsets: 9, beats: 4 }]
    );
    assert_eq!(rendering.note_on_frames(), vec![0, 24_000, 48_000, 72_000]);
}

#[test]
fn full_output_drops_events() {
    let mut host = host().with_output_capacity(3 * EVENT_BYTES);
    for index in 0..GENERATORS {
        host.set_config(index, voice(4, 4, 36 + index as u8));
    }
    let rendering = host.render_blocks(1);
    assert_eq!(rendering.events.len(), 3);
    assert_eq!(rendering.dropped, 5);
    // Ties at one frame are written in generator order.
    let notes: Vec<u8> = rendering.events.iter().map(|e| e.message.note()).collect();
    assert_eq!(notes, vec![36, 37, 38]);
    assert!(rendering.diagnostics.contains(&Diagnostic::CapacityExceeded { generator: 7 }));
}

// --- Transport changes ---

#[test]
fn tempo_change_mid_cycle_never_duplicates() {
    let mut host = host();
    host.set_config(0, voice(4, 4, 60));
    let mut rendering = host.render_until(30_000);
    assert_eq!(rendering.note_on_frames(), vec![0, 24_000]);

    host.set_tempo(240.0);
    let after = host.render_until(FRAMES_PER_BAR - BLOCK as i64);
    rendering.events.extend(after.events);

    // Beat three at the new tempo (36000) is still ahead; beats one and two
    // are not replayed. The next bar starts at 48000.
    assert_eq!(
        rendering.note_on_frames(),
        vec![0, 24_000, 36_000, 48_000, 60_000, 72_000, 84_000]
    );
    assert_monophonic(&rendering, 60);
}

#[test]
fn tempo_change_while_a_note_sounds_still_releases_it() {
    let mut host = OfflineHost::new(FPS, 120.0, 4.0, 64);
    host.clear_configs();
    host.set_config(0, voice(4, 4, 60));
    // Note on at 24000, its note-off due at 25000.
    let mut rendering = host.render_until(24_064);
    host.set_tempo(60.0);
    rendering.events.extend(host.render_until(60_000).events);

    assert_eq!(rendering.note_on_frames(), vec![0, 24_000, 48_000]);
    assert_monophonic(&rendering, 60);
    // At 60 BPM the held note's release falls before the playhead, so it is
    // sent at the start of the first block at the new tempo. Later notes
    // last one 2000-frame tick.
    let releases: Vec<i64> =
        rendering.events.iter().filter(|e| !e.message.is_note_on()).map(|e| e.frame).collect();
    assert_eq!(releases, vec![1_000, 24_064, 50_000]);
}

#[test]
fn stopping_releases_and_restarting_resumes() {
    let mut host = host();
    host.set_config(0, voice(4, 4, 60));
    let mut rendering = host.render_blocks(1);
    host.stop();
    rendering.events.extend(host.render_blocks(3).events);
    assert_eq!(host.frame(), BLOCK as i64);

    host.start();
    rendering.events.extend(host.render_until(30_000).events);

    assert_eq!(
        rendering.events,
        vec![
            RenderedEvent { frame: 0, message: MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 } },
            RenderedEvent { frame: 512, message: MidiMessage::NoteOff { channel: 0, note: 60 } },
            RenderedEvent { frame: 24_000, message: MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 } },
            RenderedEvent { frame: 25_000, message: MidiMessage::NoteOff { channel: 0, note: 60 } },
        ]
    );
}

#[test]
fn disabling_mid_note_releases_it() {
    let mut host = host();
    host.set_config(0, voice(4, 4, 60));
    let mut rendering = host.render_blocks(1);
    host.set_config(0, GeneratorConfig { enabled: false, ..voice(4, 4, 60) });
    rendering.events.extend(host.render_until(FRAMES_PER_BAR).events);

    assert_eq!(rendering.note_on_frames(), vec![0]);
    assert_eq!(
        rendering.events[1],
        RenderedEvent { frame: 512, message: MidiMessage::NoteOff { channel: 0, note: 60 } }
    );
    assert_eq!(rendering.events.len(), 2);
}

#[test]
fn no_tempo_means_no_notes() {
    let mut host = OfflineHost::new(FPS, 0.0, 4.0, BLOCK);
    host.set_config(0, voice(4, 4, 60));
    let rendering = host.render_blocks(8);
    assert!(rendering.events.is_empty());
    assert_eq!(rendering.diagnostics, vec![Diagnostic::TransportNotReady]);
}

#[test]
fn long_run_with_varied_generators_stays_consistent() {
    let mut host = OfflineHost::new(44_100.0, 133.0, 7.0, 300);
    host.clear_configs();
    for index in 0..GENERATORS {
        host.set_config(
            index,
            GeneratorConfig {
                enabled: true,
                beats: 3 + 5 * index as u16,
                onsets: 1 + 3 * index as u16,
                rotation: index as i16 - 3,
                bars_per_cycle: 1 + (index % 3) as u16,
                channel: index as u8,
                note: 40 + index as u8,
                velocity: 90,
            },
        );
    }

    let mut rendering = Rendering::default();
    for (step, bpm) in [133.0, 171.5, 96.0, 240.0, 133.0].iter().enumerate() {
        host.set_tempo(*bpm);
        let until = host.frame() + 250_000 + step as i64 * 17;
        rendering.events.extend(host.render_until(until).events);
    }

    assert!(!rendering.events.is_empty());
    assert_frame_order(&rendering);
    for index in 0..GENERATORS {
        assert_monophonic(&rendering, 40 + index as u8);
    }
}
