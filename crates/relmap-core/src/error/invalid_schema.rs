use super::Error;

/// Error when entity or relation metadata is inconsistent.
///
/// This occurs when:
/// - Two entities or two relations share a name
/// - An entity declares no primary key, or a primary key field that does not exist
/// - A load group or relation role refers to an unknown field or entity
/// - A foreign key does not line up with the primary key it references
///
/// These errors are raised once, while the [`Schema`](crate::Schema) is built.
#[derive(Debug)]
pub(super) struct InvalidSchema {
    message: Box<str>,
}

impl std::error::Error for InvalidSchema {}

impl core::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchema {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }
}
