// -------------------------------------------------------------------------------------------------

/// A fixed-length circular sample buffer with a monotonically advancing write cursor and
/// fractional-position reads via 4-point Hermite interpolation.
///
/// The buffer always holds the most recent `capacity` samples written. Capacities get rounded
/// up to a power of two, so reducing read indices into range is a single mask operation which,
/// applied to a signed index, behaves as a floor modulo: negative positions wrap to the end of
/// the buffer instead of being truncated towards zero.
#[derive(Debug, Default, Clone)]
pub struct CircularSampleBuffer {
    buffer: Vec<f32>,
    buffer_mask: usize,
    write_pos: usize,
}

impl CircularSampleBuffer {
    /// Create a new buffer holding at least `min_capacity` samples, zero initialized.
    pub fn new(min_capacity: usize) -> Self {
        debug_assert!(min_capacity > 0, "Need a non-empty buffer capacity");
        let capacity = min_capacity.next_power_of_two();
        Self {
            buffer: vec![0.0; capacity],
            buffer_mask: capacity - 1,
            write_pos: 0,
        }
    }

    /// The actual (power of two) buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The current write cursor position in range `[0, capacity)`.
    ///
    /// The cursor points to the slot the *next* sample will be written to, so the most
    /// recently written sample lives at `write_position() - 1`.
    #[inline(always)]
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Zero all contents and rewind the write cursor, without reallocating.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Store a sample at the current cursor position and advance the cursor by one, wrapping
    /// at the buffer capacity.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) & self.buffer_mask;
    }

    /// Read an interpolated sample at the given fractional position.
    ///
    /// The position is an absolute fractional index into the ring: any real value is valid and
    /// gets reduced into buffer range, including negative positions. Interpolation uses the
    /// 4-point, 3rd-order Hermite x-form from "Polynomial Interpolators for High-Quality
    /// Resampling of Oversampled Audio" by Olli Niemitalo, p. 43:
    /// http://yehar.com/blog/wp-content/uploads/2009/08/deip.pdf
    #[inline]
    pub fn read(&self, position: f64) -> f32 {
        let position_floor = position.floor();
        let fraction = (position - position_floor) as f32;
        let index = position_floor as isize;

        let y0 = self.buffer[self.wrap(index - 1)];
        let y1 = self.buffer[self.wrap(index)];
        let y2 = self.buffer[self.wrap(index + 1)];
        let y3 = self.buffer[self.wrap(index + 2)];

        let c0 = y1;
        let c1 = (y2 - y0) * 0.5;
        let c2 = y0 - y1 * 2.5 + y2 * 2.0 - y3 * 0.5;
        let c3 = (y3 - y0) * 0.5 + (y1 - y2) * 1.5;
        ((c3 * fraction + c2) * fraction + c1) * fraction + c0
    }

    /// Reduce a signed sample index into buffer range with floor-modulo semantics.
    #[inline(always)]
    fn wrap(&self, index: isize) -> usize {
        // two's complement: masking the signed index floor-wraps negative values
        (index & self.buffer_mask as isize) as usize
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_cursor_wrapping() {
        let mut buffer = CircularSampleBuffer::new(4);
        assert_eq!(buffer.capacity(), 4);
        for i in 0..6 {
            assert_eq!(buffer.write_position(), i % 4);
            buffer.write(i as f32);
        }
        // slots 0 and 1 got overwritten by samples 4 and 5
        assert_eq!(buffer.read(0.0), 4.0);
        assert_eq!(buffer.read(1.0), 5.0);
        assert_eq!(buffer.read(2.0), 2.0);
        assert_eq!(buffer.read(3.0), 3.0);
    }

    #[test]
    fn floor_modulo_reads() {
        let mut buffer = CircularSampleBuffer::new(8);
        for i in 0..8 {
            buffer.write(i as f32);
        }
        // negative positions wrap to the buffer end, they never truncate towards zero
        assert_eq!(buffer.read(-1.0), 7.0);
        assert_eq!(buffer.read(-8.0), 0.0);
        assert_eq!(buffer.read(15.0), 7.0);
    }

    #[test]
    fn hermite_is_exact_for_linear_ramps() {
        // cubic Hermite interpolation reproduces linear segments exactly
        let mut buffer = CircularSampleBuffer::new(16);
        for i in 0..16 {
            buffer.write(i as f32 * 0.5);
        }
        for i in 1..12 {
            for f in [0.0, 0.25, 0.5, 0.75] {
                let position = i as f64 + f;
                let expected = position as f32 * 0.5;
                assert!(
                    (buffer.read(position) - expected).abs() < 1e-5,
                    "Interpolation should be exact at {position}"
                );
            }
        }
    }

    #[test]
    fn reset_zeroes_contents() {
        let mut buffer = CircularSampleBuffer::new(8);
        for _ in 0..5 {
            buffer.write(1.0);
        }
        buffer.reset();
        assert_eq!(buffer.write_position(), 0);
        for i in 0..8 {
            assert_eq!(buffer.read(i as f64), 0.0);
        }
    }
}
