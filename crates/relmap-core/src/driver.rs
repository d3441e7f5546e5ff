mod capability;
pub use capability::{Capability, Flavor};

mod transaction;
pub use transaction::TransactionManager;

use crate::{
    schema::db,
    stmt::{Param, ValueRecord},
    Result,
};

/// A database connection. Statements are executed synchronously.
///
/// Placeholders in `sql` are bound from `params` in order. Rows returned by
/// [`query`](Connection::query) hold one raw value per entry of `columns`,
/// decoded according to that storage type; the mapping layer converts them
/// to field values.
pub trait Connection {
    fn capability(&self) -> &'static Capability;

    /// Executes a statement that returns no rows, returning the number of
    /// affected rows.
    fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64>;

    fn query(&mut self, sql: &str, params: &[Param], columns: &[db::Type])
        -> Result<Vec<ValueRecord>>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn capability(&self) -> &'static Capability {
        (**self).capability()
    }

    fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn query(
        &mut self,
        sql: &str,
        params: &[Param],
        columns: &[db::Type],
    ) -> Result<Vec<ValueRecord>> {
        (**self).query(sql, params, columns)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn capability(&self) -> &'static Capability {
        (**self).capability()
    }

    fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn query(
        &mut self,
        sql: &str,
        params: &[Param],
        columns: &[db::Type],
    ) -> Result<Vec<ValueRecord>> {
        (**self).query(sql, params, columns)
    }
}
