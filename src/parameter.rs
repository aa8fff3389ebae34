//! Effect parameter descriptors and value wrappers.

use std::{any::Any, fmt::Debug};

use four_cc::FourCC;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A continuous floating-point value with a plain value range and default.
    Float {
        range: std::ops::RangeInclusive<f32>,
        default: f32,
    },
    /// A choice from a list of strings (an enum).
    Enum {
        values: Vec<String>,
        default_index: usize,
    },
    /// A boolean toggle.
    Boolean,
}

// -------------------------------------------------------------------------------------------------

/// Describes a single parameter of an [`Effect`](crate::Effect) for use in UIs or for automation.
///
/// All value conversions work on normalized floating point values in range \[0, 1\], so generic
/// hosts never need to know a parameter's plain value type or range.
pub trait Parameter: Debug {
    /// The unique id of the parameter.
    fn id(&self) -> FourCC;

    /// The name of the parameter.
    fn name(&self) -> &'static str;

    /// The parameter type.
    fn parameter_type(&self) -> ParameterType;

    /// Default value of the parameter, expressed as a normalized value in range \[0, 1\].
    fn default_normalized(&self) -> f32;

    /// Convert the given normalized value to a display string.
    fn normalized_to_string(&self, normalized: f32, include_unit: bool) -> String;

    /// Convert the given string to a normalized value.
    /// Returns `None` when the conversion failed, else a valid normalized value.
    fn string_to_normalized(&self, string: &str) -> Option<f32>;
}

/// Allows creating `dyn Parameter` clones.
pub trait ClonableParameter: Parameter {
    /// Create a dyn Parameter clone, wrapped into a box.
    fn dyn_clone(&self) -> Box<dyn Parameter>;
}

impl<P> ClonableParameter for P
where
    P: Parameter + Clone + 'static,
{
    fn dyn_clone(&self) -> Box<dyn Parameter> {
        Box::new(Self::clone(self))
    }
}

// -------------------------------------------------------------------------------------------------

/// An update for a [`Parameter`]'s value, consumed by [`Effect`](crate::Effect)s in audio time.
#[derive(Debug)]
pub enum ParameterValueUpdate {
    /// Raw, type-erased internal value (f32, some enum or a boolean).
    Raw(Box<dyn Any + Send + Sync>),
    /// A float value in range `0.0..=1.0`.
    Normalized(f32),
}

// -------------------------------------------------------------------------------------------------

mod boolean;
pub use boolean::{BooleanParameter, BooleanParameterValue};

mod float;
pub use float::{FloatParameter, FloatParameterValue};

mod r#enum;
pub use r#enum::{EnumParameter, EnumParameterValue};

mod smoothed;
pub use smoothed::SmoothedParameterValue;
