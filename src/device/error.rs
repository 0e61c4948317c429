use std::fmt;

#[derive(Debug)]
pub enum DeviceError {
    /// Bridge process failed to spawn
    Spawn { command: String, source: std::io::Error },

    /// Reading from or writing to the bridge failed
    Io(String),

    /// Bridge answered a request with ok=false
    Protocol { command: String, error: String },

    /// Bridge output was not valid JSON
    JsonParse { context: String, source: serde_json::Error },

    /// Request could not be serialized
    JsonSerialize { context: String, source: serde_json::Error },

    /// Bridge process exited or its output closed
    Closed,

    /// Status value had an unexpected shape
    UnexpectedValue { path: String, detail: String },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Spawn { command, source } => {
                write!(f, "Failed to spawn device bridge '{}': {}", command, source)
            }
            DeviceError::Io(msg) => write!(f, "Device bridge I/O error: {}", msg),
            DeviceError::Protocol { command, error } => {
                write!(f, "Device rejected {}: {}", command, error)
            }
            DeviceError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            DeviceError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            DeviceError::Closed => write!(f, "Device bridge closed"),
            DeviceError::UnexpectedValue { path, detail } => {
                write!(f, "Unexpected value for {}: {}", path, detail)
            }
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Spawn { source, .. } => Some(source),
            DeviceError::JsonParse { source, .. } => Some(source),
            DeviceError::JsonSerialize { source, .. } => Some(source),
            _ => None,
        }
    }
}
