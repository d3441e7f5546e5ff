use super::Error;

/// Error when a statement cannot be generated from the entity metadata.
///
/// Raised for finder names that do not resolve to a searchable field, and for
/// eager-load configuration that names an unknown load group or relation.
#[derive(Debug)]
pub(super) struct QueryBuildError {
    message: Box<str>,
}

impl std::error::Error for QueryBuildError {}

impl core::fmt::Display for QueryBuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "query build error: {}", self.message)
    }
}

impl Error {
    /// Creates a query build error.
    pub fn query_build(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::QueryBuild(QueryBuildError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a query build error.
    pub fn is_query_build(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::QueryBuild(_))
    }
}
