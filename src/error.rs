//! Error types for the mixing engine.
//!
//! Every fallible operation in the crate returns [`MixerResult`]. Frame-producing
//! operations still report how many frames they actually produced, so a short
//! count is not an error by itself; callers decide when a short count becomes
//! an underrun.

use crate::emitter::EmitterState;

/// Errors produced by the mixer, its buffers and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// A PCM format was missing or carried zero channels, rate or frames
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A parameter index or value was rejected
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// No resource handler is registered for the locator's extension
    #[error("Unsupported resource type: '{extension}'")]
    UnsupportedResource { extension: String },

    /// The backing resource could not be opened
    #[error("Failed to open resource '{locator}': {reason}")]
    ResourceOpen { locator: String, reason: String },

    /// Buffer underrun or overrun
    #[error("Buffer {operation}: {details}")]
    Buffer {
        operation: &'static str,
        details: String,
    },

    /// Render was requested while the ring buffer still holds unread slots
    #[error("Render refused: {pending} ring buffer slot(s) still pending")]
    Backpressure { pending: usize },

    /// The operation needs at least one listener
    #[error("No listeners attached to the mixer")]
    NoListeners,

    /// A handle no longer refers to a live node
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// The emitter is not in a state that produces audio
    #[error("Emitter is inactive ({state:?})")]
    Inactive { state: EmitterState },

    /// Resampling engine failure
    #[error("Resampler error: {0}")]
    Resampler(String),

    /// Allocation failures
    #[error("Resource allocation failed: {resource} - {reason}")]
    ResourceAllocation {
        resource: &'static str,
        reason: String,
    },

    /// Backend-specific errors (CPAL, etc.)
    #[error("Backend error: {backend} - {details}")]
    Backend {
        backend: &'static str,
        details: String,
    },

    /// The operation is not implemented by this mixer
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl MixerError {
    /// Create an invalid format error
    pub fn invalid_format(details: impl Into<String>) -> Self {
        Self::InvalidFormat(details.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported resource error
    pub fn unsupported_resource(extension: impl Into<String>) -> Self {
        Self::UnsupportedResource {
            extension: extension.into(),
        }
    }

    /// Create a resource open error
    pub fn resource_open(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceOpen {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Create a buffer underrun error
    pub fn buffer_underrun(details: impl Into<String>) -> Self {
        Self::Buffer {
            operation: "underrun",
            details: details.into(),
        }
    }

    /// Create a buffer overrun error
    pub fn buffer_overrun(details: impl Into<String>) -> Self {
        Self::Buffer {
            operation: "overrun",
            details: details.into(),
        }
    }

    /// Create an invalid handle error
    pub fn invalid_handle(details: impl Into<String>) -> Self {
        Self::InvalidHandle(details.into())
    }

    /// Create a resampler error
    pub fn resampler(details: impl Into<String>) -> Self {
        Self::Resampler(details.into())
    }

    /// Create an allocation failure error
    pub fn allocation(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::ResourceAllocation {
            resource,
            reason: reason.into(),
        }
    }

    /// Create a backend error
    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors leave the mixer in a consistent state; retrying on
    /// the next callback is expected to succeed once the condition clears.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Buffer { .. }
                | Self::Backpressure { .. }
                | Self::Inactive { .. }
                | Self::Backend { .. }
        )
    }

    /// Check if this error was caused by bad configuration input
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::InvalidParameter { .. }
                | Self::UnsupportedResource { .. }
        )
    }

    /// Check if this error is an underrun
    pub fn is_underrun(&self) -> bool {
        matches!(self, Self::Buffer { operation, .. } if *operation == "underrun")
    }
}

impl From<rubato::ResamplerConstructionError> for MixerError {
    fn from(error: rubato::ResamplerConstructionError) -> Self {
        Self::Resampler(error.to_string())
    }
}

impl From<rubato::ResampleError> for MixerError {
    fn from(error: rubato::ResampleError) -> Self {
        Self::Resampler(error.to_string())
    }
}

/// Convert CPAL errors to MixerError
#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for MixerError {
    fn from(err: cpal::BuildStreamError) -> Self {
        Self::backend("cpal", format!("Failed to build stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for MixerError {
    fn from(err: cpal::PlayStreamError) -> Self {
        Self::backend("cpal", format!("Failed to play stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PauseStreamError> for MixerError {
    fn from(err: cpal::PauseStreamError) -> Self {
        Self::backend("cpal", format!("Failed to pause stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DefaultStreamConfigError> for MixerError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        Self::backend(
            "cpal",
            format!("Failed to get default stream config: {}", err),
        )
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DeviceNameError> for MixerError {
    fn from(err: cpal::DeviceNameError) -> Self {
        Self::backend("cpal", format!("Failed to query device name: {}", err))
    }
}

/// Result type for mixer operations
pub type MixerResult<T> = Result<T, MixerError>;
