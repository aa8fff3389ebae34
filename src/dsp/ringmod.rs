use crate::utils::smoothed::{ExponentialSmoothedValue, SmoothedValue};

use super::sine::SINE_TABLE;

// -------------------------------------------------------------------------------------------------

/// A single-oscillator amplitude modulator: the input is multiplied by a sine oscillator and
/// blended with the dry signal.
///
/// `output = dry * (1 - amount) + (dry * oscillator) * amount`
///
/// The wet amount is smoothed per sample to avoid zipper noise on knob movements; the carrier
/// frequency is typically linked to the speed parameter (20-320 Hz). The oscillator phase
/// advances once per sample frame, so all channels of a frame see the same carrier value.
#[derive(Debug, Clone)]
pub struct RingModulator {
    sample_rate: u32,
    frequency: f32,
    phase: f32,
    phase_inc: f32,
    amount: ExponentialSmoothedValue,
}

impl RingModulator {
    /// Valid carrier frequency range in Hz.
    pub const FREQUENCY_RANGE_HZ: std::ops::RangeInclusive<f32> = 20.0..=320.0;
    /// Default carrier frequency in Hz.
    pub const DEFAULT_FREQUENCY_HZ: f32 = 20.0;

    /// Create a new ring modulator with the amount at zero.
    ///
    /// NB: Call [`Self::set_sample_rate`] before processing!
    pub fn new() -> Self {
        Self {
            sample_rate: 0,
            frequency: Self::DEFAULT_FREQUENCY_HZ,
            phase: 0.0,
            phase_inc: 0.0,
            amount: ExponentialSmoothedValue::default(),
        }
    }

    /// Update the sample rate the oscillator and amount smoothing run at.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        self.sample_rate = sample_rate;
        self.amount.set_sample_rate(sample_rate);
        self.phase_inc = self.frequency / sample_rate as f32;
    }

    /// Set the carrier frequency in Hz, clamped to the valid range.
    pub fn set_frequency(&mut self, frequency_hz: f32) {
        self.frequency = frequency_hz.clamp(
            *Self::FREQUENCY_RANGE_HZ.start(),
            *Self::FREQUENCY_RANGE_HZ.end(),
        );
        if self.sample_rate > 0 {
            self.phase_inc = self.frequency / self.sample_rate as f32;
        }
    }

    /// The current carrier frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the wet amount in range `[0, 1]`, clamped. The change is ramped in smoothly.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount.set_target(amount.clamp(0.0, 1.0));
    }

    /// Rewind the oscillator phase and settle any pending amount ramp.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        let amount = self.amount.target();
        self.amount.init(amount);
    }

    /// Process a single (mono) sample, advancing the oscillator.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let oscillator = self.next_oscillator();
        let amount = self.amount.next();
        input * (1.0 - amount) + input * oscillator * amount
    }

    /// Process one multi-channel sample frame in place, advancing the oscillator once.
    #[inline]
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        let oscillator = self.next_oscillator();
        let amount = self.amount.next();
        for sample in frame.iter_mut() {
            *sample = *sample * (1.0 - amount) + *sample * oscillator * amount;
        }
    }

    /// Process one multi-channel sample frame in place using an externally generated modulator
    /// signal instead of the internal oscillator. The internal phase stays untouched.
    #[inline]
    pub fn process_frame_with(&mut self, frame: &mut [f32], modulator: f32) {
        let amount = self.amount.next();
        for sample in frame.iter_mut() {
            *sample = *sample * (1.0 - amount) + *sample * modulator * amount;
        }
    }

    #[inline(always)]
    fn next_oscillator(&mut self) -> f32 {
        let value = SINE_TABLE.sine(self.phase);
        self.phase += self.phase_inc;
        self.phase -= self.phase.floor();
        value
    }
}

impl Default for RingModulator {
    fn default() -> Self {
        Self::new()
    }
}

// -------------------------------------------------------------------------------------------------
