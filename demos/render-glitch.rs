//! An example which renders the granular pitch shift effect over a generated guitar-ish
//! test tone into a WAV file.
//!
//! Run with `cargo run --example render-glitch [OUTPUT_PATH]`.

use grainshift::{effects::PitchShiftEffect, Effect, OctaveMode, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

// Render parameter consts (tweak as needed!)

const SAMPLE_RATE: u32 = 48000;
const CHANNEL_COUNT: usize = 2;
const BLOCK_SIZE: usize = 512;
const DURATION_SECONDS: f32 = 8.0;

/// Effect settings
const OCTAVE: OctaveMode = OctaveMode::OneUp;
const RISE_TIME_MS: f32 = 250.0;
const PANIC: f32 = 0.35; // slow random drift
const CHAOS: f32 = 0.2; // fast random jumps
const SPEED: f32 = 0.4; // ring modulator drive
const RING_MIX: f32 = 0.3;

/// Plucked test tone settings
const NOTE_FREQUENCIES: [f32; 4] = [110.0, 146.83, 196.0, 246.94]; // A2 D3 G3 B3
const NOTE_SECONDS: f32 = 2.0;

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::init_with_level(log::Level::Info)?;

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "render-glitch.wav".to_string());

    // Set up the effect
    let mut effect = PitchShiftEffect::new();
    effect.initialize(SAMPLE_RATE, CHANNEL_COUNT, BLOCK_SIZE)?;

    let updates: [(four_cc::FourCC, f32); 5] = [
        (PitchShiftEffect::RISE_TIME_ID, RISE_TIME_MS),
        (PitchShiftEffect::PANIC_ID, PANIC),
        (PitchShiftEffect::CHAOS_ID, CHAOS),
        (PitchShiftEffect::SPEED_ID, SPEED),
        (PitchShiftEffect::RING_MIX_ID, RING_MIX),
    ];
    for (id, value) in updates {
        effect.process_parameter_update(id, &ParameterValueUpdate::Raw(Box::new(value)))?;
    }
    effect.process_parameter_update(
        PitchShiftEffect::OCTAVE_ID,
        &ParameterValueUpdate::Raw(Box::new(OCTAVE)),
    )?;

    // Render block by block
    let spec = hound::WavSpec {
        channels: CHANNEL_COUNT as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output_path, spec)?;

    let total_frames = (DURATION_SECONDS * SAMPLE_RATE as f32) as usize;
    let mut buffer = vec![0.0f32; BLOCK_SIZE * CHANNEL_COUNT];

    log::info!("Rendering {DURATION_SECONDS} seconds to '{output_path}'...");

    let mut frame_index = 0;
    while frame_index < total_frames {
        let block_frames = BLOCK_SIZE.min(total_frames - frame_index);
        for (block_frame, frame) in buffer[..block_frames * CHANNEL_COUNT]
            .chunks_exact_mut(CHANNEL_COUNT)
            .enumerate()
        {
            let sample = plucked_tone(frame_index + block_frame);
            frame.fill(sample);
        }
        effect.process(&mut buffer[..block_frames * CHANNEL_COUNT]);
        for sample in &buffer[..block_frames * CHANNEL_COUNT] {
            writer.write_sample(*sample)?;
        }
        frame_index += block_frames;
    }
    writer.finalize()?;

    log::info!("Done.");
    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// A plucked string-ish test tone: a decaying note with a few harmonics, cycling through
/// a small chord progression.
fn plucked_tone(frame_index: usize) -> f32 {
    let note_frames = (NOTE_SECONDS * SAMPLE_RATE as f32) as usize;
    let note = (frame_index / note_frames) % NOTE_FREQUENCIES.len();
    let note_frame = (frame_index % note_frames) as f32;

    let frequency = NOTE_FREQUENCIES[note];
    let phase = note_frame * frequency / SAMPLE_RATE as f32 * std::f32::consts::TAU;
    let envelope = (-3.0 * note_frame / (NOTE_SECONDS * SAMPLE_RATE as f32)).exp();

    let harmonics = phase.sin() + 0.5 * (2.0 * phase).sin() + 0.2 * (3.0 * phase).sin();
    0.4 * envelope * harmonics
}
