//! Error types and handling for sensorwire

/// Result type alias for sensorwire operations
pub type Result<T> = std::result::Result<T, SensorWireError>;

/// Errors raised by the transport, the buffer pool and the encoders
#[derive(Debug, thiserror::Error)]
pub enum SensorWireError {
    /// I/O related errors (socket setup, reads, writes)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Destination region too small for the encoded message
    #[error("Insufficient space: requested {requested}, available {available}")]
    InsufficientSpace { requested: usize, available: usize },

    /// Received bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Endpoint string could not be parsed
    #[error("Invalid endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },

    /// The component has been shut down
    #[error("Closed: {component}")]
    Closed { component: String },

    /// A blocking receive gave up waiting
    #[error("Timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl SensorWireError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an insufficient space error
    pub fn insufficient_space(requested: usize, available: usize) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    /// Create an invalid endpoint error
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Create a closed error
    pub fn closed(component: impl Into<String>) -> Self {
        Self::Closed {
            component: component.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            millis: duration.as_millis() as u64,
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// True when the error means the peer went away rather than a local fault
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io {
                source: Some(err), ..
            } => matches!(
                err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

impl From<std::io::Error> for SensorWireError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<nix::Error> for SensorWireError {
    fn from(err: nix::Error) -> Self {
        Self::platform(format!("socket option failed: {}", err))
    }
}

/// Reasons a received message is rejected
///
/// Every variant is produced before any payload allocation happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes than the header fields require
    #[error("{message}: truncated, need {needed} bytes but only {available} available")]
    Truncated {
        message: &'static str,
        needed: usize,
        available: usize,
    },

    /// The envelope names another message family
    #[error("this message is not a {expected} message (type tag {actual})")]
    WrongMessageType { expected: &'static str, actual: u16 },

    /// The envelope carries an incompatible major version
    #[error("{message} message major versions differ: {actual} != {expected}")]
    MajorVersionMismatch {
        message: &'static str,
        expected: u8,
        actual: u8,
    },

    /// A declared dimension or count is beyond what we accept
    #[error("{message}: implausible {field} = {value} (limit {limit})")]
    ImplausibleSize {
        message: &'static str,
        field: &'static str,
        value: u64,
        limit: u64,
    },

    /// The image element type is not a known pixel depth
    #[error("unrecognized image element type code {0}")]
    UnknownPixelType(u32),

    /// Bytes left over after the declared message end
    #[error("{message}: declared size {declared} but {available} bytes supplied")]
    SizeMismatch {
        message: &'static str,
        declared: usize,
        available: usize,
    },

    /// Paired images declare different dimensions
    #[error("{message}: {field} is {actual_rows}x{actual_cols} but must match {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        message: &'static str,
        field: &'static str,
        expected_rows: u32,
        expected_cols: u32,
        actual_rows: u32,
        actual_cols: u32,
    },

    /// Type tag outside the closed set of message families
    #[error("unknown message type tag {0}")]
    UnknownMessageType(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SensorWireError::invalid_parameter("rows", "zero");
        assert!(matches!(err, SensorWireError::InvalidParameter { .. }));

        let err = SensorWireError::insufficient_space(1024, 512);
        assert!(matches!(err, SensorWireError::InsufficientSpace { .. }));

        let err: SensorWireError = DecodeError::UnknownPixelType(7).into();
        assert!(matches!(err, SensorWireError::Decode(DecodeError::UnknownPixelType(7))));
    }

    #[test]
    fn test_error_display() {
        let err = DecodeError::MajorVersionMismatch {
            message: "StampedImage",
            expected: 0,
            actual: 3,
        };
        let display = format!("{}", err);
        assert!(display.contains("StampedImage"));
        assert!(display.contains("3 != 0"));
    }

    #[test]
    fn test_disconnect_classification() {
        let err = SensorWireError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(err.is_disconnect());
        assert!(!SensorWireError::closed("publisher").is_disconnect());
    }
}
