use crate::utils::smoothed::{LinearSmoothedValue, SmoothedValue};

// -------------------------------------------------------------------------------------------------

/// Discrete octave transposition selection for the pitch shifter.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::VariantNames,
)]
#[repr(u8)]
pub enum OctaveMode {
    /// Two octaves down.
    TwoDown,
    /// One octave down.
    OneDown,
    /// No transposition.
    #[default]
    Unison,
    /// One octave up.
    OneUp,
    /// Two octaves up.
    TwoUp,
}

impl OctaveMode {
    /// The linear playback ratio of this transposition.
    pub const fn ratio(&self) -> f32 {
        match self {
            Self::TwoDown => 0.25,
            Self::OneDown => 0.5,
            Self::Unison => 1.0,
            Self::OneUp => 2.0,
            Self::TwoUp => 4.0,
        }
    }

    /// Convert a mode index into a mode, clamping out of range indices to the last mode.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::TwoDown,
            1 => Self::OneDown,
            2 => Self::Unison,
            3 => Self::OneUp,
            _ => Self::TwoUp,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Converts the discrete octave selection plus continuous semitone modulation into a smoothed
/// linear pitch ratio.
///
/// The base ratio ramps linearly towards the selected octave's ratio over a configurable rise
/// time: it converges monotonically, never overshoots and reaches the target exactly. The
/// continuous parts (an externally set semitone offset plus the per-sample modulation input)
/// apply multiplicatively on top, without smoothing.
#[derive(Debug, Clone)]
pub struct PitchRatioController {
    sample_rate: u32,
    mode: OctaveMode,
    rise_time_ms: f32,
    base_ratio: LinearSmoothedValue,
    offset_semitones: f32,
}

impl PitchRatioController {
    /// Valid rise time range in milliseconds.
    pub const RISE_TIME_RANGE_MS: std::ops::RangeInclusive<f32> = 1.0..=2000.0;
    /// Default rise time in milliseconds.
    pub const DEFAULT_RISE_TIME_MS: f32 = 50.0;

    /// Valid range of the external semitone offset.
    pub const OFFSET_RANGE_SEMITONES: std::ops::RangeInclusive<f32> = -24.0..=24.0;

    /// Create a new controller at unison, for the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        let mode = OctaveMode::default();
        Self {
            sample_rate,
            mode,
            rise_time_ms: Self::DEFAULT_RISE_TIME_MS,
            base_ratio: LinearSmoothedValue::new(mode.ratio()),
            offset_semitones: 0.0,
        }
    }

    /// The currently selected octave mode.
    pub fn octave_mode(&self) -> OctaveMode {
        self.mode
    }

    /// Select a new octave mode. The base ratio starts ramping towards the mode's ratio
    /// over the configured rise time.
    pub fn set_octave_mode(&mut self, mode: OctaveMode) {
        if self.mode != mode {
            self.mode = mode;
            self.base_ratio
                .set_target_with_duration(mode.ratio(), self.rise_time_samples());
        }
    }

    /// Set the base ratio rise time in milliseconds, clamped to the valid range.
    /// Applies to the next octave mode change; an in-flight ramp continues unchanged.
    pub fn set_rise_time(&mut self, rise_time_ms: f32) {
        self.rise_time_ms =
            rise_time_ms.clamp(*Self::RISE_TIME_RANGE_MS.start(), *Self::RISE_TIME_RANGE_MS.end());
    }

    /// Set the external pitch offset in semitones, clamped to the valid range.
    pub fn set_offset_semitones(&mut self, semitones: f32) {
        self.offset_semitones = semitones.clamp(
            *Self::OFFSET_RANGE_SEMITONES.start(),
            *Self::OFFSET_RANGE_SEMITONES.end(),
        );
    }

    /// The smoothed base ratio as of the last processed sample.
    pub fn current_base_ratio(&self) -> f32 {
        self.base_ratio.current()
    }

    /// Ramp the base ratio and combine it with the given per-sample modulation value into the
    /// total pitch ratio. Must be called exactly once per sample frame.
    #[inline]
    pub fn next_ratio(&mut self, modulation_semitones: f32) -> f32 {
        let base = self.base_ratio.next();
        let semitones = self.offset_semitones + modulation_semitones;
        if semitones == 0.0 {
            base
        } else {
            base * semitones_to_ratio(semitones)
        }
    }

    /// Snap the base ratio to the selected mode's ratio and drop the semitone offset,
    /// as if the controller was freshly created with the current mode.
    pub fn reset(&mut self) {
        self.base_ratio.init(self.mode.ratio());
        self.offset_semitones = 0.0;
    }

    fn rise_time_samples(&self) -> u32 {
        ((self.rise_time_ms * self.sample_rate as f32 / 1000.0) as u32).max(1)
    }
}

// -------------------------------------------------------------------------------------------------

/// Convert a semitone offset into a linear playback ratio.
#[inline(always)]
pub(crate) fn semitones_to_ratio(semitones: f32) -> f32 {
    (semitones * (1.0 / 12.0)).exp2()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_mapping() {
        assert_eq!(OctaveMode::from_index(0).ratio(), 0.25);
        assert_eq!(OctaveMode::from_index(1).ratio(), 0.5);
        assert_eq!(OctaveMode::from_index(2).ratio(), 1.0);
        assert_eq!(OctaveMode::from_index(3).ratio(), 2.0);
        assert_eq!(OctaveMode::from_index(4).ratio(), 4.0);
        // out of range indices clamp
        assert_eq!(OctaveMode::from_index(100), OctaveMode::TwoUp);
    }

    #[test]
    fn semitone_ratios() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-6);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-6);
        assert!((semitones_to_ratio(0.0) - 1.0).abs() < 1e-6);
        assert!((semitones_to_ratio(7.0) - 1.498307).abs() < 1e-5);
    }

    #[test]
    fn ramp_converges_monotonically() {
        const SAMPLE_RATE: u32 = 48000;
        const RISE_TIME_MS: f32 = 100.0;

        let mut controller = PitchRatioController::new(SAMPLE_RATE);
        controller.set_rise_time(RISE_TIME_MS);
        controller.set_octave_mode(OctaveMode::TwoUp);

        let rise_samples = (RISE_TIME_MS * SAMPLE_RATE as f32 / 1000.0) as usize;
        let mut last = controller.current_base_ratio();
        for _ in 0..rise_samples {
            let ratio = controller.next_ratio(0.0);
            assert!(ratio >= last, "Ramp must not move away from the target");
            assert!(ratio <= 4.0, "Ramp must not overshoot the target");
            last = ratio;
        }
        // target is reached within the rise time, one extra sample of slack allowed
        let settled = controller.next_ratio(0.0);
        assert!((settled - 4.0).abs() < 1e-6);
    }

    #[test]
    fn modulation_combines_multiplicatively() {
        let mut controller = PitchRatioController::new(44100);
        controller.set_octave_mode(OctaveMode::OneUp);
        controller.reset(); // snap the ramp
        assert!((controller.next_ratio(0.0) - 2.0).abs() < 1e-6);
        assert!((controller.next_ratio(12.0) - 4.0).abs() < 1e-5);
        controller.set_offset_semitones(-12.0);
        assert!((controller.next_ratio(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn offset_and_rise_time_clamp() {
        let mut controller = PitchRatioController::new(44100);
        controller.set_offset_semitones(100.0);
        assert!((controller.next_ratio(0.0) - 4.0).abs() < 1e-5); // 1.0 * 2^(24/12)
        controller.set_rise_time(99999.0);
        assert_eq!(controller.rise_time_ms, 2000.0);
        controller.set_rise_time(0.0);
        assert_eq!(controller.rise_time_ms, 1.0);
    }
}
