use std::any::Any;

use four_cc::FourCC;

use crate::{
    dsp::RingModulator,
    effect::{Effect, EffectMessage, EffectMessagePayload},
    parameter::{FloatParameter, ParameterValueUpdate, SmoothedParameterValue},
    ClonableParameter, Error,
};

// -------------------------------------------------------------------------------------------------

/// Message type for `RingModEffect` to change parameters.
#[derive(Clone, Debug)]
pub enum RingModEffectMessage {
    /// Rewind the oscillator phase.
    Reset,
}

impl EffectMessage for RingModEffectMessage {
    fn effect_name(&self) -> &'static str {
        RingModEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// A standalone ring modulator effect: amplitude modulation by a single sine oscillator,
/// blended with the dry signal.
pub struct RingModEffect {
    channel_count: usize,

    // Parameters
    frequency: SmoothedParameterValue,
    amount: SmoothedParameterValue,

    // Runtime data
    ring_mod: RingModulator,
}

impl RingModEffect {
    pub const EFFECT_NAME: &str = "RingModEffect";
    pub const FREQUENCY_ID: FourCC = FourCC(*b"freq");
    pub const AMOUNT_ID: FourCC = FourCC(*b"amnt");

    /// Creates a new `RingModEffect` with default parameter values.
    pub fn new() -> Self {
        let to_string_percent = |v: f32| format!("{:.2}", v * 100.0);
        let from_string_percent = |v: &str| v.parse::<f32>().map(|f| f / 100.0).ok();

        Self {
            channel_count: 0,

            frequency: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::FREQUENCY_ID,
                    "Frequency",
                    *RingModulator::FREQUENCY_RANGE_HZ.start()
                        ..=*RingModulator::FREQUENCY_RANGE_HZ.end(),
                    RingModulator::DEFAULT_FREQUENCY_HZ,
                )
                .with_unit("Hz"),
            ),
            amount: SmoothedParameterValue::from_description(
                FloatParameter::new(
                    Self::AMOUNT_ID,
                    "Amount",
                    0.0..=1.0,
                    0.5, //
                )
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent),
            ),

            ring_mod: RingModulator::new(),
        }
    }

    /// Creates a new `RingModEffect` with the given parameter values.
    pub fn with_parameters(frequency_hz: f32, amount: f32) -> Self {
        let mut effect = Self::default();
        effect.frequency.init_value_clamped(frequency_hz);
        effect.amount.init_value_clamped(amount);
        effect
    }
}

impl Default for RingModEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for RingModEffect {
    fn name(&self) -> &'static str {
        Self::EFFECT_NAME
    }

    fn parameters(&self) -> Vec<&dyn ClonableParameter> {
        vec![self.frequency.description(), self.amount.description()]
    }

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        _max_frames: usize,
    ) -> Result<(), Error> {
        if channel_count == 0 {
            return Err(Error::ChannelCountError(channel_count));
        }
        self.channel_count = channel_count;

        self.frequency.set_sample_rate(sample_rate);
        self.amount.set_sample_rate(sample_rate);

        self.ring_mod.set_sample_rate(sample_rate);
        self.ring_mod.set_frequency(self.frequency.target_value());
        self.ring_mod.set_amount(self.amount.target_value());
        self.ring_mod.reset();

        Ok(())
    }

    fn process(&mut self, output: &mut [f32]) {
        // frequency ramps at block rate, the wet amount is smoothed per sample internally
        self.ring_mod.set_frequency(self.frequency.next_value());
        self.ring_mod.set_amount(self.amount.next_value());

        for frame in output.chunks_exact_mut(self.channel_count) {
            self.ring_mod.process_frame(frame);
        }
    }

    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        match id {
            Self::FREQUENCY_ID => self.frequency.apply_update(value),
            Self::AMOUNT_ID => self.amount.apply_update(value),
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
        if let Some(message) = message.payload().downcast_ref::<RingModEffectMessage>() {
            match message {
                RingModEffectMessage::Reset => self.ring_mod.reset(),
            }
            Ok(())
        } else {
            Err(Error::ParameterError(
                "RingModEffect: Invalid/unknown message payload".to_owned(),
            ))
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized_effect() -> RingModEffect {
        let mut effect = RingModEffect::new();
        effect
            .initialize(44100, 2, 512)
            .expect("Failed to initialize effect");
        effect
    }

    #[test]
    fn zero_amount_passes_dry_signal() {
        let mut effect = RingModEffect::with_parameters(100.0, 0.0);
        effect
            .initialize(44100, 2, 512)
            .expect("Failed to initialize effect");

        let input = (0..1024).map(|i| (i as f32 * 0.01).sin()).collect::<Vec<_>>();
        let mut output = input.clone();
        effect.process(&mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn parameter_clamping() {
        let mut effect = initialized_effect();
        effect
            .process_parameter_update(
                RingModEffect::FREQUENCY_ID,
                &ParameterValueUpdate::Raw(Box::new(100_000.0_f32)),
            )
            .expect("Failed to set frequency");
        assert_eq!(effect.frequency.target_value(), 320.0);

        assert!(effect
            .process_parameter_update(FourCC(*b"nope"), &ParameterValueUpdate::Normalized(0.0))
            .is_err());
    }

    #[test]
    fn reset_message_rewinds_the_oscillator() {
        let mut effect = initialized_effect();

        let mut first = vec![1.0_f32; 512];
        effect.process(&mut first);
        effect
            .process_message(&RingModEffectMessage::Reset)
            .expect("Failed to reset");
        let mut second = vec![1.0_f32; 512];
        effect.process(&mut second);
        assert_eq!(first, second);
    }
}
