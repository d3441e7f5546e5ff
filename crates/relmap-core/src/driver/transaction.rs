use crate::Result;

/// Suspends and resumes the caller's ambient transaction around work that
/// must run outside of it, such as DDL.
pub trait TransactionManager {
    type Transaction;

    /// Detaches the current transaction, if any.
    fn suspend(&mut self) -> Result<Option<Self::Transaction>>;

    fn resume(&mut self, transaction: Self::Transaction) -> Result<()>;
}
