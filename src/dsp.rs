//! DSP kernels: sine lookup table, circular sample buffer, grain based pitch shifting,
//! randomized modulation and ring modulation.

mod buffer;
mod grains;
mod modulation;
mod ratio;
mod ringmod;
mod sine;

pub use buffer::CircularSampleBuffer;
pub use grains::GranularPitchShifter;
pub use modulation::{ModulationFrame, ModulationGenerator};
pub use ratio::{OctaveMode, PitchRatioController};
pub use ringmod::RingModulator;
pub use sine::FastSineTable;
