use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::sine::SINE_TABLE;

// -------------------------------------------------------------------------------------------------

/// A periodically retargeted, exponentially smoothed random walk in range `[-1, 1]`.
///
/// Every `interval` samples a new uniform random target is drawn; the output value approaches
/// it with a one-pole coefficient. Retarget rate and smoothing coefficient together define the
/// perceptual character: slow retargeting with lazy smoothing drifts, fast retargeting with
/// tight smoothing glitches.
#[derive(Debug, Clone, Copy, Default)]
struct RandomDrift {
    interval: u32,
    countdown: u32,
    coeff: f32,
    target: f32,
    value: f32,
}

impl RandomDrift {
    fn configure(&mut self, frequency: f32, coeff_scale: f32, sample_rate: u32) {
        debug_assert!(frequency > 0.0 && sample_rate > 0);
        self.interval = ((sample_rate as f32 / frequency) as u32).max(1);
        self.coeff = 1.0 - (-coeff_scale * frequency / sample_rate as f32).exp();
    }

    fn reset(&mut self) {
        self.countdown = 0;
        self.target = 0.0;
        self.value = 0.0;
    }

    #[inline]
    fn next(&mut self, rng: &mut SmallRng) -> f32 {
        if self.countdown == 0 {
            self.target = rng.random::<f32>() * 2.0 - 1.0;
            self.countdown = self.interval;
        }
        self.countdown -= 1;
        self.value += (self.target - self.value) * self.coeff;
        self.value
    }
}

// -------------------------------------------------------------------------------------------------

/// Per-sample output of the [`ModulationGenerator`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulationFrame {
    /// Combined panic and chaos pitch modulation in semitones.
    pub pitch_semitones: f32,
    /// Bipolar FM/ring modulator signal in range `[-1, 1]`.
    pub fm: f32,
}

// -------------------------------------------------------------------------------------------------

/// Produces the pitch modulation and FM signals which drive the pitch shifter and ring modulator.
///
/// Three sources, each controlled by a normalized 0-1 amount knob:
/// - *panic*: a slow random drift of up to ±12 semitones. The amount raises both the retarget
///   rate (0.5-2.5 Hz) and the drift depth.
/// - *chaos*: fast random jumps of up to ±24 semitones, retargeting at 5-35 Hz with a tighter
///   smoothing coefficient than panic, so the same random-walk technique reads as glitching
///   instead of wobbling.
/// - *speed*: an audio-rate oscillator at 20-320 Hz made of a fundamental plus two harmonics
///   (weights 1.0, 0.3, 0.15), evaluated via the shared sine table.
///
/// Sources gate off completely below an amount of 0.001 and then contribute exactly zero.
/// The generator is seedable, so modulation sequences can be reproduced exactly in tests;
/// by default it seeds itself from OS entropy.
#[derive(Debug, Clone)]
pub struct ModulationGenerator {
    sample_rate: u32,
    rng: SmallRng,
    seed: u64,

    panic_amount: f32,
    chaos_amount: f32,
    speed_amount: f32,

    panic: RandomDrift,
    chaos: RandomDrift,

    speed_phase: f32,
    speed_phase_inc: f32,
}

impl ModulationGenerator {
    /// Maximum panic pitch modulation depth in semitones.
    pub const PANIC_RANGE_SEMITONES: f32 = 12.0;
    /// Maximum chaos pitch modulation depth in semitones.
    pub const CHAOS_RANGE_SEMITONES: f32 = 24.0;

    /// Speed oscillator frequency range in Hz.
    pub const SPEED_FREQUENCY_RANGE_HZ: std::ops::RangeInclusive<f32> = 20.0..=320.0;

    /// Amounts below this threshold switch a source off entirely.
    pub const AMOUNT_GATE: f32 = 0.001;

    const UNINITIALIZED_SAMPLE_RATE: u32 = 66666;

    /// Create a new generator, seeded from OS entropy.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_seed(sample_rate, SmallRng::from_os_rng().random::<u64>())
    }

    /// Create a new generator with an explicit seed, for reproducible modulation sequences.
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        let mut generator = Self {
            sample_rate,
            rng: SmallRng::seed_from_u64(seed),
            seed,
            panic_amount: 0.0,
            chaos_amount: 0.0,
            speed_amount: 0.0,
            panic: RandomDrift::default(),
            chaos: RandomDrift::default(),
            speed_phase: 0.0,
            speed_phase_inc: 0.0,
        };
        generator.set_panic(0.0);
        generator.set_chaos(0.0);
        generator.set_speed(0.0);
        generator
    }

    /// Update the sample rate and rescale all rate dependent internals.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        self.sample_rate = sample_rate;
        self.set_panic(self.panic_amount);
        self.set_chaos(self.chaos_amount);
        self.set_speed(self.speed_amount);
    }

    /// Reseed the generator and restart its random processes.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self.panic.reset();
        self.chaos.reset();
    }

    /// Set the panic (slow drift) amount, clamped to `[0, 1]`.
    pub fn set_panic(&mut self, amount: f32) {
        self.panic_amount = amount.clamp(0.0, 1.0);
        let frequency = 0.5 + self.panic_amount * 2.0;
        self.panic.configure(frequency, 2.0, self.sample_rate);
    }

    /// Set the chaos (fast jump) amount, clamped to `[0, 1]`.
    pub fn set_chaos(&mut self, amount: f32) {
        self.chaos_amount = amount.clamp(0.0, 1.0);
        let frequency = 5.0 + self.chaos_amount * 30.0;
        self.chaos.configure(frequency, 4.0, self.sample_rate);
    }

    /// Set the speed (FM oscillator) amount, clamped to `[0, 1]`.
    pub fn set_speed(&mut self, amount: f32) {
        self.speed_amount = amount.clamp(0.0, 1.0);
        self.speed_phase_inc = self.speed_frequency() / self.sample_rate as f32;
    }

    /// The speed oscillator frequency in Hz, as mapped from the speed amount.
    /// Also used as the ring modulator's carrier frequency.
    pub fn speed_frequency(&self) -> f32 {
        let start = *Self::SPEED_FREQUENCY_RANGE_HZ.start();
        let end = *Self::SPEED_FREQUENCY_RANGE_HZ.end();
        start + self.speed_amount * (end - start)
    }

    /// Restart all phases, targets and smoothed values, and rewind the random sequence to its
    /// seeded start. State afterwards matches a freshly created generator with the same seed.
    pub fn reset(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.panic.reset();
        self.chaos.reset();
        self.speed_phase = 0.0;
    }

    /// Generate the next modulation frame. Runs at full sample rate.
    #[inline]
    pub fn next(&mut self) -> ModulationFrame {
        let mut pitch_semitones = 0.0;
        if self.panic_amount >= Self::AMOUNT_GATE {
            pitch_semitones +=
                self.panic.next(&mut self.rng) * Self::PANIC_RANGE_SEMITONES * self.panic_amount;
        }
        if self.chaos_amount >= Self::AMOUNT_GATE {
            pitch_semitones +=
                self.chaos.next(&mut self.rng) * Self::CHAOS_RANGE_SEMITONES * self.chaos_amount;
        }

        let fm = if self.speed_amount >= Self::AMOUNT_GATE {
            let phase = self.speed_phase;
            self.speed_phase += self.speed_phase_inc;
            self.speed_phase -= self.speed_phase.floor();
            // fundamental plus 2nd and 3rd harmonics for a deliberately shrill character
            let oscillator = SINE_TABLE.sine(phase)
                + 0.3 * SINE_TABLE.sine(2.0 * phase)
                + 0.15 * SINE_TABLE.sine(3.0 * phase);
            (oscillator * self.speed_amount).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        ModulationFrame {
            pitch_semitones,
            fm,
        }
    }
}

impl Default for ModulationGenerator {
    /// Create a new generator, seeded from OS entropy, with an uninitialized sample rate.
    /// Call [`Self::set_sample_rate`] before processing.
    fn default() -> Self {
        Self::new(Self::UNINITIALIZED_SAMPLE_RATE)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48000;
    const SEED: u64 = 0x5EED_CAFE;

    #[test]
    fn disabled_sources_output_exactly_zero() {
        let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        for _ in 0..1000 {
            let frame = generator.next();
            assert_eq!(frame.pitch_semitones, 0.0);
            assert_eq!(frame.fm, 0.0);
        }
    }

    #[test]
    fn seeded_sequences_are_reproducible() {
        let mut a = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        let mut b = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        a.set_panic(1.0);
        b.set_panic(1.0);

        let sequence_a = (0..1000).map(|_| a.next().pitch_semitones).collect::<Vec<_>>();
        let sequence_b = (0..1000).map(|_| b.next().pitch_semitones).collect::<Vec<_>>();
        assert_eq!(sequence_a, sequence_b);
        assert!(sequence_a.iter().any(|v| *v != 0.0));

        // a different seed produces a different sequence
        let mut c = ModulationGenerator::with_seed(SAMPLE_RATE, SEED ^ 1);
        c.set_panic(1.0);
        let sequence_c = (0..1000).map(|_| c.next().pitch_semitones).collect::<Vec<_>>();
        assert_ne!(sequence_a, sequence_c);
    }

    #[test]
    fn reset_rewinds_the_random_sequence() {
        let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        generator.set_panic(0.8);
        generator.set_chaos(0.5);
        let first = (0..500).map(|_| generator.next()).collect::<Vec<_>>();
        generator.reset();
        let second = (0..500).map(|_| generator.next()).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn modulation_stays_within_bounds() {
        for amount in [0.25, 0.5, 1.0] {
            let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
            generator.set_panic(amount);
            generator.set_chaos(amount);
            generator.set_speed(amount);
            for _ in 0..100_000 {
                let frame = generator.next();
                assert!(frame.pitch_semitones.abs() <= 36.0);
                assert!(frame.fm.abs() <= 1.0);
            }
        }

        // panic alone stays within its own documented range
        let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        generator.set_panic(1.0);
        for _ in 0..100_000 {
            assert!(generator.next().pitch_semitones.abs() <= 12.0);
        }

        // as does chaos
        let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        generator.set_chaos(1.0);
        for _ in 0..100_000 {
            assert!(generator.next().pitch_semitones.abs() <= 24.0);
        }
    }

    #[test]
    fn speed_frequency_mapping() {
        let mut generator = ModulationGenerator::with_seed(SAMPLE_RATE, SEED);
        assert_eq!(generator.speed_frequency(), 20.0);
        generator.set_speed(1.0);
        assert_eq!(generator.speed_frequency(), 320.0);
        generator.set_speed(0.5);
        assert_eq!(generator.speed_frequency(), 170.0);
        // out of range amounts clamp
        generator.set_speed(7.0);
        assert_eq!(generator.speed_frequency(), 320.0);
    }
}
