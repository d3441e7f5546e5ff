mod value;
pub(crate) use value::Value;

use relmap_core::{
    driver::{Capability, TransactionManager},
    schema::db,
    err,
    stmt::{Param, ValueRecord},
    Error, Result,
};
use rusqlite::Connection as RusqliteConnection;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_configuration(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn url(&self) -> String {
        match self {
            Sqlite::InMemory => "sqlite::memory:".to_string(),
            Sqlite::File(path) => format!("sqlite:{}", path.display()),
        }
    }

    pub fn connect(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory => Connection::in_memory(),
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    pub fn begin(&mut self) -> Result<()> {
        self.batch("BEGIN")
    }

    pub fn commit(&mut self) -> Result<()> {
        self.batch("COMMIT")
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.batch("ROLLBACK")
    }

    /// `true` while a transaction started with [`begin`](Self::begin) is open.
    pub fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }

    fn batch(&mut self, sql: &str) -> Result<()> {
        log::debug!("sqlite: {sql}");
        self.connection
            .execute_batch(sql)
            .map_err(Error::driver_operation_failed)
    }
}

impl relmap_core::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64> {
        log::debug!("sqlite: {sql}; params={}", params.len());

        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(Error::driver_operation_failed)?;

        let params = params.iter().map(|param| Value::from(param.value.clone()));
        let count = stmt
            .execute(rusqlite::params_from_iter(params))
            .map_err(Error::driver_operation_failed)?;

        Ok(count as u64)
    }

    fn query(
        &mut self,
        sql: &str,
        params: &[Param],
        columns: &[db::Type],
    ) -> Result<Vec<ValueRecord>> {
        log::debug!("sqlite: {sql}; params={}", params.len());

        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(Error::driver_operation_failed)?;

        let params = params.iter().map(|param| Value::from(param.value.clone()));
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(Error::driver_operation_failed)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut items = Vec::with_capacity(columns.len());

                    for (index, ty) in columns.iter().enumerate() {
                        items.push(Value::from_sql(row, index, ty)?.into_inner());
                    }

                    ret.push(ValueRecord::from_vec(items));
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::driver_operation_failed(err));
                }
            }
        }

        Ok(ret)
    }
}

/// SQLite has a single transaction per connection and cannot detach it. An
/// open transaction therefore cannot be suspended; with none open there is
/// nothing to suspend.
impl TransactionManager for Connection {
    type Transaction = ();

    fn suspend(&mut self) -> Result<Option<()>> {
        if self.in_transaction() {
            return Err(err!("SQLite cannot suspend an open transaction"));
        }
        Ok(None)
    }

    fn resume(&mut self, _transaction: ()) -> Result<()> {
        Ok(())
    }
}
