use super::Error;

/// Error when executing a generated statement fails.
///
/// Carries the statement verb and the affected table. It is attached as
/// context on top of the driver failure, so the root cause stays reachable
/// through [`Error::root`].
#[derive(Debug)]
pub(super) struct StatementExecutionError {
    verb: &'static str,
    table: Box<str>,
}

impl std::error::Error for StatementExecutionError {}

impl core::fmt::Display for StatementExecutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "failed to execute {} on table `{}`", self.verb, self.table)
    }
}

impl Error {
    /// Creates a statement execution error for `verb` (`SELECT`, `INSERT`,
    /// ...) against `table`.
    pub fn statement_execution(verb: &'static str, table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::StatementExecution(
            StatementExecutionError {
                verb,
                table: table.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is a statement execution error.
    pub fn is_statement_execution(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::StatementExecution(_))
    }
}
