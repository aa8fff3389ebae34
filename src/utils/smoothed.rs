use std::fmt::Debug;

// -------------------------------------------------------------------------------------------------

/// Provides smooth transitions between a current and a target f32 value.
///
/// Smoothing usually needs to be applied to avoid clicks in volume or other DSP parameter
/// changes. Smoothed values are expected to be ticked once per audio frame.
pub trait SmoothedValue: Debug {
    /// Access to the current, possibly ramped value.
    #[must_use]
    fn current(&self) -> f32;
    /// Access to the target value.
    #[must_use]
    fn target(&self) -> f32;

    /// Ramp, if needed, and get the current ramped value, else returns the target value.
    #[must_use]
    fn next(&mut self) -> f32 {
        if self.need_ramp() {
            self.ramp();
            self.current()
        } else {
            self.target()
        }
    }

    /// Test if ramping is necessary. When ramping is not necessary, parameter changes
    /// may be applied in blocks without calling `next` or `ramp`, which usually is faster.
    #[must_use]
    fn need_ramp(&self) -> bool;
    /// Move current towards the target value, when ramping is necessary, else do nothing.
    fn ramp(&mut self);

    /// Set current and target to the same value, skipping any pending ramp.
    fn init(&mut self, value: f32);
    /// Set a new target value and ramp current towards it, when needed.
    fn set_target(&mut self, target: f32);

    /// Update the sample rate of the smoothed value. Ramping scales with the sample rate.
    fn set_sample_rate(&mut self, sample_rate: u32);
}

// -------------------------------------------------------------------------------------------------

/// Exponential smoothed value, using an inertial one-pole approach: the value moves towards the
/// target by a fixed fraction of the remaining distance each frame.
///
/// This should be the default smoother for volume alike parameters.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothedValue {
    current: f32,
    target: f32,
    inertia: f32,
    sample_rate_comp: f32,
}

impl ExponentialSmoothedValue {
    pub const DEFAULT_INERTIA: f32 = 0.02;

    const UNINITIALIZED_SAMPLE_RATE: u32 = 66666;
    const UNINITIALIZED_SAMPLE_RATE_COMP: f32 = 44100.0 / Self::UNINITIALIZED_SAMPLE_RATE as f32;

    pub const fn new(value: f32, sample_rate: u32) -> Self {
        Self::with_inertia(value, Self::DEFAULT_INERTIA, sample_rate)
    }

    pub const fn with_inertia(value: f32, inertia: f32, sample_rate: u32) -> Self {
        assert!(inertia > 0.0 && inertia <= 1.0, "Invalid inertia");
        assert!(sample_rate > 0, "Invalid sample rate");
        ExponentialSmoothedValue {
            current: value,
            target: value,
            inertia,
            sample_rate_comp: 44100.0 / sample_rate as f32,
        }
    }

    pub fn set_inertia(&mut self, inertia: f32) {
        assert!(inertia > 0.0 && inertia <= 1.0, "Invalid inertia");
        self.inertia = inertia;
    }
}

impl SmoothedValue for ExponentialSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    fn need_ramp(&self) -> bool {
        debug_assert!(
            self.sample_rate_comp != Self::UNINITIALIZED_SAMPLE_RATE_COMP,
            "Call 'set_sample_rate' for default constructed smoothed values before using them!"
        );
        const EPSILON: f32 = f32::EPSILON * 100.0;
        let step = (self.target - self.current) * self.inertia * self.sample_rate_comp;
        step.abs() > EPSILON
    }

    fn ramp(&mut self) {
        debug_assert!(
            self.sample_rate_comp != Self::UNINITIALIZED_SAMPLE_RATE_COMP,
            "Call 'set_sample_rate' for default constructed smoothed values before using them!"
        );
        self.current += (self.target - self.current) * self.inertia * self.sample_rate_comp;
    }

    fn init(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    fn set_target(&mut self, target: f32) {
        self.target = target;
        if !self.need_ramp() {
            self.current = self.target;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate_comp = 44100.0 / sample_rate as f32;
    }
}

impl Default for ExponentialSmoothedValue {
    fn default() -> Self {
        Self::new(0.0, Self::UNINITIALIZED_SAMPLE_RATE)
    }
}

impl From<f32> for ExponentialSmoothedValue {
    fn from(value: f32) -> Self {
        Self::new(value, Self::UNINITIALIZED_SAMPLE_RATE)
    }
}

// -------------------------------------------------------------------------------------------------

/// Linear smoothed value, ramping towards the target in equal steps over a configured duration.
///
/// Unlike [`ExponentialSmoothedValue`] this reaches the target exactly, after the configured
/// number of frames, and never overshoots. Use it where a precise ramp duration matters.
#[derive(Debug, Clone)]
pub struct LinearSmoothedValue {
    current: f32,
    target: f32,
    step: f32,
    pending_steps: u32,
    duration: u32,
}

impl LinearSmoothedValue {
    pub const DEFAULT_DURATION: u32 = 1024;

    pub const fn new(value: f32) -> Self {
        Self::with_duration(value, Self::DEFAULT_DURATION)
    }

    pub const fn with_duration(value: f32, duration: u32) -> Self {
        assert!(duration > 0, "Invalid ramp duration");
        LinearSmoothedValue {
            current: value,
            target: value,
            step: 0.0,
            pending_steps: 0,
            duration,
        }
    }

    /// The configured ramp duration in frames.
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Set a new ramp duration in frames, applied with the next `set_target` call.
    pub fn set_duration(&mut self, duration: u32) {
        assert!(duration > 0, "Invalid ramp duration");
        self.duration = duration;
    }

    /// Set a new target value, ramping towards it over the given number of frames instead of
    /// the configured default duration.
    pub fn set_target_with_duration(&mut self, target: f32, duration: u32) {
        assert!(duration > 0, "Invalid ramp duration");
        self.target = target;
        if self.current == self.target {
            self.pending_steps = 0;
        } else {
            self.pending_steps = duration;
            self.step = (self.target - self.current) / duration as f32;
        }
    }
}

impl SmoothedValue for LinearSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    #[inline(always)]
    fn need_ramp(&self) -> bool {
        self.pending_steps > 0
    }

    fn ramp(&mut self) {
        if self.pending_steps > 0 {
            self.current += self.step;
            self.pending_steps -= 1;
            if self.pending_steps == 0 {
                self.current = self.target;
            }
        }
    }

    fn init(&mut self, value: f32) {
        self.target = value;
        self.current = value;
        self.pending_steps = 0;
    }

    fn set_target(&mut self, target: f32) {
        self.set_target_with_duration(target, self.duration);
    }

    fn set_sample_rate(&mut self, _sample_rate: u32) {
        // ramp durations are configured in frames, so there's nothing to scale here
    }
}

impl Default for LinearSmoothedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<f32> for LinearSmoothedValue {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_smoothed_value() {
        let mut value = ExponentialSmoothedValue::new(0.0, 44100);
        assert_eq!(value.current(), 0.0);
        assert_eq!(value.target(), 0.0);
        assert!(!value.need_ramp());

        value.set_target(1.0);
        assert!(value.need_ramp());
        let initial = value.current();
        for _ in 0..10 {
            value.ramp();
        }
        assert!(value.current() > initial);
        assert!(value.current() < value.target());

        value.init(0.5);
        assert_eq!(value.current(), 0.5);
        assert!(!value.need_ramp());
    }

    #[test]
    fn linear_smoothed_value() {
        let mut value = LinearSmoothedValue::new(0.0);
        value.set_target_with_duration(1.0, 10);
        assert!(value.need_ramp());

        let mut steps = 0;
        let mut last = value.current();
        while value.need_ramp() {
            let next = value.next();
            assert!(next > last, "Ramp should increase monotonically");
            assert!(next <= value.target(), "Ramp should never overshoot");
            last = next;
            steps += 1;
        }
        assert_eq!(steps, 10);
        assert_eq!(value.current(), 1.0);

        // downwards ramps converge exactly as well
        value.set_target_with_duration(0.25, 7);
        for _ in 0..7 {
            let _ = value.next();
        }
        assert_eq!(value.current(), 0.25);
        assert!(!value.need_ramp());
    }
}
