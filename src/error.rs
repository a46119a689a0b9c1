/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema, example and link inference
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A value could not be encoded into an [`AnyValue`](crate::any_value::AnyValue)
    EncodingError(String),
    /// A type could not be described as a schema
    InferenceError { type_name: String, message: String },
    /// Mutating a field produced no observable change in the encoded value
    LinkKeyPathError { type_name: String, message: String },
    /// A version string is not `MAJOR.MINOR.PATCH[-pre][+build]`
    InvalidVersion(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            Error::InferenceError { type_name, message } => {
                write!(f, "Cannot infer schema for {}: {}", type_name, message)
            }
            Error::LinkKeyPathError { type_name, message } => {
                write!(f, "Cannot detect link key path on {}: {}", type_name, message)
            }
            Error::InvalidVersion(version) => write!(f, "Invalid version: {}", version),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
