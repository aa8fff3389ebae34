#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod dsp;
mod effect;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use dsp::{
    CircularSampleBuffer, FastSineTable, GranularPitchShifter, ModulationFrame,
    ModulationGenerator, OctaveMode, PitchRatioController, RingModulator,
};

pub use effect::{Effect, EffectMessage, EffectMessagePayload};

pub use parameter::{
    BooleanParameter, BooleanParameterValue, ClonableParameter, EnumParameter, EnumParameterValue,
    FloatParameter, FloatParameterValue, Parameter, ParameterType, ParameterValueUpdate,
    SmoothedParameterValue,
};

// public mods
pub mod utils;

pub mod effects {
    //! Host-facing effect implementations.

    pub use super::effect::{
        pitchshift::{PitchShiftEffect, PitchShiftEffectMessage},
        ringmod::{RingModEffect, RingModEffectMessage},
    };
}
