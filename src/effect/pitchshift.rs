use std::any::Any;

use four_cc::FourCC;

use crate::{
    dsp::{GranularPitchShifter, ModulationGenerator, OctaveMode, RingModulator},
    effect::{Effect, EffectMessage, EffectMessagePayload},
    parameter::{
        BooleanParameter, BooleanParameterValue, EnumParameter, EnumParameterValue, FloatParameter,
        FloatParameterValue, ParameterValueUpdate, SmoothedParameterValue,
    },
    ClonableParameter, Error,
};

// -------------------------------------------------------------------------------------------------

/// Message type for `PitchShiftEffect` to change state which is not expressed as a parameter.
#[derive(Clone, Debug)]
pub enum PitchShiftEffectMessage {
    /// Zero all ring buffers, grain phases and modulation state.
    Reset,
    /// Reseed the modulation random sources, for reproducible modulation sequences.
    SetSeed(u64),
}

impl EffectMessage for PitchShiftEffectMessage {
    fn effect_name(&self) -> &'static str {
        PitchShiftEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// A granular pitch shifting effect with randomized pitch modulation and a downstream ring
/// modulator.
///
/// The octave mode transposes the signal in discrete octave steps, ramped in over the rise
/// time. On top of that, the panic and chaos amounts add slow random pitch drift and fast
/// random pitch jumps, and the dynamic pitch offset accepts continuous semitone input from
/// external pitch-slide sources. The speed amount drives a 20-320 Hz modulator which ring
/// modulates the shifted signal, blended in by the ring mix amount.
///
/// When disengaged, the dry signal passes through unchanged while the ring buffers and grain
/// clocks keep running, so re-engaging the effect is seamless.
pub struct PitchShiftEffect {
    channel_count: usize,

    // Parameters
    octave: EnumParameterValue<OctaveMode>,
    engage: BooleanParameterValue,
    rise_time: FloatParameterValue,
    panic: SmoothedParameterValue,
    chaos: SmoothedParameterValue,
    speed: SmoothedParameterValue,
    pitch_offset: FloatParameterValue,
    ring_mix: SmoothedParameterValue,

    // Runtime data
    shifter: GranularPitchShifter,
    modulation: ModulationGenerator,
    ring_mod: RingModulator,

    mod_pitch: Vec<f32>,
    mod_fm: Vec<f32>,
}

impl PitchShiftEffect {
    pub const EFFECT_NAME: &str = "PitchShiftEffect";
    pub const OCTAVE_ID: FourCC = FourCC(*b"octv");
    pub const ENGAGE_ID: FourCC = FourCC(*b"engd");
    pub const RISE_TIME_ID: FourCC = FourCC(*b"rise");
    pub const PANIC_ID: FourCC = FourCC(*b"pnic");
    pub const CHAOS_ID: FourCC = FourCC(*b"chao");
    pub const SPEED_ID: FourCC = FourCC(*b"sped");
    pub const PITCH_OFFSET_ID: FourCC = FourCC(*b"ptch");
    pub const RING_MIX_ID: FourCC = FourCC(*b"rmix");

    /// Creates a new `PitchShiftEffect` with default parameter values.
    pub fn new() -> Self {
        let to_string_percent = |v: f32| format!("{:.2}", v * 100.0);
        let from_string_percent = |v: &str| v.parse::<f32>().map(|f| f / 100.0).ok();

        Self {
            channel_count: 0,

            octave: EnumParameterValue::from_description(EnumParameter::new(
                Self::OCTAVE_ID,
                "Octave",
                OctaveMode::Unison,
            )),
            engage: BooleanParameterValue::from_description(BooleanParameter::new(
                Self::ENGAGE_ID,
                "Engage",
                true,
            )),
            rise_time: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::RISE_TIME_ID,
                    "Rise",
                    1.0..=2000.0,
                    50.0, //
                )
                .with_unit("ms"),
            ),
            panic: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::PANIC_ID,
                    "Panic",
                    0.0..=1.0,
                    0.0, //
                )
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent),
            ),
            chaos: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::CHAOS_ID,
                    "Chaos",
                    0.0..=1.0,
                    0.0, //
                )
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent),
            ),
            speed: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::SPEED_ID,
                    "Speed",
                    0.0..=1.0,
                    0.0, //
                )
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent),
            ),
            pitch_offset: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::PITCH_OFFSET_ID,
                    "Pitch",
                    -24.0..=24.0,
                    0.0, //
                )
                .with_unit("st"),
            ),
            ring_mix: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::RING_MIX_ID,
                    "Ring Mix",
                    0.0..=1.0,
                    0.0, //
                )
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent),
            ),

            shifter: GranularPitchShifter::new(),
            modulation: ModulationGenerator::default(),
            ring_mod: RingModulator::new(),

            mod_pitch: Vec::new(),
            mod_fm: Vec::new(),
        }
    }

    /// Creates a new `PitchShiftEffect` with the given parameter values.
    #[allow(clippy::too_many_arguments)]
    pub fn with_parameters(
        octave: OctaveMode,
        engage: bool,
        rise_time_ms: f32,
        panic: f32,
        chaos: f32,
        speed: f32,
        pitch_offset: f32,
        ring_mix: f32,
    ) -> Self {
        let mut effect = Self::default();
        effect.octave.set_value(octave);
        effect.engage.set_value(engage);
        effect.rise_time.set_value_clamped(rise_time_ms);
        effect.panic.init_value_clamped(panic);
        effect.chaos.init_value_clamped(chaos);
        effect.speed.init_value_clamped(speed);
        effect.pitch_offset.set_value_clamped(pitch_offset);
        effect.ring_mix.init_value_clamped(ring_mix);
        effect
    }

    /// Reseed the modulation random sources.
    pub fn set_seed(&mut self, seed: u64) {
        self.modulation.set_seed(seed);
    }

    /// The effect's passthrough latency in samples at a settled pitch ratio of 1.0.
    pub fn latency(&self) -> usize {
        self.shifter.latency()
    }

    fn reset(&mut self) {
        self.shifter.reset();
        self.modulation.reset();
        self.ring_mod.reset();
        // settle any in-flight parameter ramps
        self.panic.init_value_clamped(self.panic.target_value());
        self.chaos.init_value_clamped(self.chaos.target_value());
        self.speed.init_value_clamped(self.speed.target_value());
        self.ring_mix.init_value_clamped(self.ring_mix.target_value());
    }
}

impl Default for PitchShiftEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for PitchShiftEffect {
    fn name(&self) -> &'static str {
        Self::EFFECT_NAME
    }

    fn parameters(&self) -> Vec<&dyn ClonableParameter> {
        vec![
            self.octave.description(),
            self.engage.description(),
            self.rise_time.description(),
            self.panic.description(),
            self.chaos.description(),
            self.speed.description(),
            self.pitch_offset.description(),
            self.ring_mix.description(),
        ]
    }

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        max_frames: usize,
    ) -> Result<(), Error> {
        self.channel_count = channel_count;

        self.shifter.initialize(sample_rate, channel_count, max_frames)?;
        self.shifter.set_octave_mode(*self.octave.value());
        self.shifter.set_rise_time(self.rise_time.value());

        self.modulation.set_sample_rate(sample_rate);
        self.ring_mod.set_sample_rate(sample_rate);

        self.panic.set_sample_rate(sample_rate);
        self.chaos.set_sample_rate(sample_rate);
        self.speed.set_sample_rate(sample_rate);
        self.ring_mix.set_sample_rate(sample_rate);

        self.mod_pitch = vec![0.0; max_frames];
        self.mod_fm = vec![0.0; max_frames];

        self.reset();

        Ok(())
    }

    fn process(&mut self, output: &mut [f32]) {
        let frames = output.len() / self.channel_count;
        debug_assert!(
            frames <= self.mod_pitch.len(),
            "Buffer exceeds the max_frames the effect was initialized with"
        );
        let frames = frames.min(self.mod_pitch.len());

        // apply block-rate parameter values to the DSP components
        self.modulation.set_panic(self.panic.next_value());
        self.modulation.set_chaos(self.chaos.next_value());
        self.modulation.set_speed(self.speed.next_value());
        self.shifter
            .set_dynamic_pitch_offset(self.pitch_offset.value());
        self.ring_mod
            .set_frequency(self.modulation.speed_frequency());
        self.ring_mod.set_amount(self.ring_mix.next_value());

        // run the modulation generator at full sample rate
        for (pitch, fm) in self
            .mod_pitch
            .iter_mut()
            .zip(self.mod_fm.iter_mut())
            .take(frames)
        {
            let frame = self.modulation.next();
            *pitch = frame.pitch_semitones;
            *fm = frame.fm;
        }

        // the ring modulator stage only runs when the speed source actually produces output
        let apply_ring_mod = self.speed.current_value() >= ModulationGenerator::AMOUNT_GATE;

        if self.engage.value() {
            for (frame_index, frame) in output
                .chunks_exact_mut(self.channel_count)
                .take(frames)
                .enumerate()
            {
                self.shifter
                    .process_frame(frame, self.mod_pitch[frame_index]);
                if apply_ring_mod {
                    self.ring_mod
                        .process_frame_with(frame, self.mod_fm[frame_index]);
                }
            }
        } else {
            // bypassed: pass the dry signal through, but keep feeding the ring buffers and
            // ticking the grain clocks, so engaging the effect again is seamless
            let mut scratch = [0.0f32; GranularPitchShifter::MAX_CHANNELS];
            for (frame_index, frame) in output
                .chunks_exact(self.channel_count)
                .take(frames)
                .enumerate()
            {
                let scratch = &mut scratch[..self.channel_count];
                scratch.copy_from_slice(frame);
                self.shifter
                    .process_frame(scratch, self.mod_pitch[frame_index]);
            }
        }
    }

    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        match id {
            Self::OCTAVE_ID => {
                self.octave.apply_update(value);
                self.shifter.set_octave_mode(*self.octave.value());
            }
            Self::ENGAGE_ID => self.engage.apply_update(value),
            Self::RISE_TIME_ID => {
                self.rise_time.apply_update(value);
                self.shifter.set_rise_time(self.rise_time.value());
            }
            Self::PANIC_ID => self.panic.apply_update(value),
            Self::CHAOS_ID => self.chaos.apply_update(value),
            Self::SPEED_ID => self.speed.apply_update(value),
            Self::PITCH_OFFSET_ID => self.pitch_offset.apply_update(value),
            Self::RING_MIX_ID => self.ring_mix.apply_update(value),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Unknown parameter: '{id}' for effect '{}'",
                    self.name()
                )))
            }
        }
        Ok(())
    }

    fn process_message(&mut self, message: &EffectMessagePayload) -> Result<(), Error> {
        if let Some(message) = message.payload().downcast_ref::<PitchShiftEffectMessage>() {
            match message {
                PitchShiftEffectMessage::Reset => self.reset(),
                PitchShiftEffectMessage::SetSeed(seed) => self.set_seed(*seed),
            }
            Ok(())
        } else {
            Err(Error::ParameterError(
                "PitchShiftEffect: Invalid/unknown message payload".to_owned(),
            ))
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48000;
    const MAX_FRAMES: usize = 512;

    fn initialized_effect() -> PitchShiftEffect {
        let mut effect = PitchShiftEffect::new();
        effect
            .initialize(SAMPLE_RATE, 2, MAX_FRAMES)
            .expect("Failed to initialize effect");
        effect
    }

    fn test_buffer(frames: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let sample =
                    (i as f32 * 440.0 / SAMPLE_RATE as f32 * std::f32::consts::TAU).sin();
                [sample, sample]
            })
            .collect()
    }

    #[test]
    fn parameter_descriptors() {
        let effect = PitchShiftEffect::new();
        let parameters = effect.parameters();
        assert_eq!(parameters.len(), 8);
        assert!(parameters
            .iter()
            .any(|p| p.id() == PitchShiftEffect::OCTAVE_ID));
        assert!(parameters
            .iter()
            .any(|p| p.id() == PitchShiftEffect::RING_MIX_ID));
    }

    #[test]
    fn unknown_parameter_ids_are_rejected() {
        let mut effect = initialized_effect();
        let result = effect
            .process_parameter_update(FourCC(*b"what"), &ParameterValueUpdate::Normalized(0.5));
        assert!(result.is_err());
    }

    #[test]
    fn octave_parameter_updates() {
        let mut effect = initialized_effect();
        effect
            .process_parameter_update(
                PitchShiftEffect::OCTAVE_ID,
                &ParameterValueUpdate::Raw(Box::new(OctaveMode::TwoDown)),
            )
            .expect("Failed to apply octave update");
        assert_eq!(*effect.octave.value(), OctaveMode::TwoDown);
        assert_eq!(effect.shifter.octave_mode(), OctaveMode::TwoDown);

        // normalized updates map over the full mode range
        effect
            .process_parameter_update(
                PitchShiftEffect::OCTAVE_ID,
                &ParameterValueUpdate::Normalized(1.0),
            )
            .expect("Failed to apply octave update");
        assert_eq!(*effect.octave.value(), OctaveMode::TwoUp);
    }

    #[test]
    fn disengaged_effect_passes_dry_signal() {
        let mut effect = initialized_effect();
        effect
            .process_parameter_update(
                PitchShiftEffect::ENGAGE_ID,
                &ParameterValueUpdate::Raw(Box::new(false)),
            )
            .expect("Failed to disengage");

        let input = test_buffer(MAX_FRAMES);
        let mut output = input.clone();
        effect.process(&mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn engaged_unison_is_a_pure_delay() {
        let mut effect = initialized_effect();
        let latency = effect.latency();

        const BLOCKS: usize = 64;
        let mut all_input = Vec::new();
        let mut all_output = Vec::new();
        for block in 0..BLOCKS {
            let mut buffer = (0..MAX_FRAMES)
                .flat_map(|i| {
                    let index = block * MAX_FRAMES + i;
                    let sample = (index as f32 * 997.0 / SAMPLE_RATE as f32
                        * std::f32::consts::TAU)
                        .sin();
                    [sample, sample]
                })
                .collect::<Vec<_>>();
            all_input.extend(buffer.iter().step_by(2).copied());
            effect.process(&mut buffer);
            all_output.extend(buffer.iter().step_by(2).copied());
        }

        let settle = 10 * MAX_FRAMES;
        let mut error_energy = 0.0f64;
        let mut signal_energy = 0.0f64;
        for i in settle..all_output.len() {
            let expected = all_input[i - latency];
            let error = all_output[i] - expected;
            error_energy += (error * error) as f64;
            signal_energy += (expected * expected) as f64;
        }
        let rms_db = 10.0 * (error_energy / signal_energy).log10();
        assert!(rms_db < -40.0, "Unison error too large: {rms_db:.1} dB");
    }

    #[test]
    fn reset_message_restores_processing_state() {
        let mut a = initialized_effect();
        let mut b = initialized_effect();
        a.set_seed(42);
        b.set_seed(42);
        for effect in [&mut a, &mut b] {
            effect
                .process_parameter_update(
                    PitchShiftEffect::PANIC_ID,
                    &ParameterValueUpdate::Normalized(1.0),
                )
                .expect("Failed to set panic");
        }

        // process some audio through `a` only, then reset it
        let mut buffer = test_buffer(MAX_FRAMES);
        a.process(&mut buffer);
        a.process_message(&PitchShiftEffectMessage::Reset)
            .expect("Failed to reset");
        b.process_message(&PitchShiftEffectMessage::Reset)
            .expect("Failed to reset");

        // both instances process identically from here on
        let mut buffer_a = test_buffer(MAX_FRAMES);
        let mut buffer_b = buffer_a.clone();
        a.process(&mut buffer_a);
        b.process(&mut buffer_b);
        assert_eq!(buffer_a, buffer_b);
    }

    #[test]
    fn mistyped_messages_are_rejected() {
        let mut effect = initialized_effect();
        let message = crate::effect::ringmod::RingModEffectMessage::Reset;
        assert!(effect.process_message(&message).is_err());
    }
}
