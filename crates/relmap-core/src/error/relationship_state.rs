use super::Error;

/// Error when an association change names roles that do not form the two
/// ends of the relation being tracked.
#[derive(Debug)]
pub(super) struct RelationshipStateError {
    message: Box<str>,
}

impl std::error::Error for RelationshipStateError {}

impl core::fmt::Display for RelationshipStateError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "relationship state error: {}", self.message)
    }
}

impl Error {
    /// Creates a relationship state error.
    pub fn relationship_state(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::RelationshipState(RelationshipStateError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a relationship state error.
    pub fn is_relationship_state(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::RelationshipState(_))
    }
}
