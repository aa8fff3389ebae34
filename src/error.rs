use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainshift.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    ChannelCountError(usize),
    ParameterError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelCountError(channel_count) => {
                write!(f, "Unsupported channel count: {channel_count}")
            }
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
        }
    }
}
