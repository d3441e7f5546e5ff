use serde::Deserialize;

/// SQL dialect of the target database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Sqlite,
    Postgresql,
    Mysql,
}

#[derive(Debug)]
pub struct Capability {
    pub flavor: Flavor,

    /// Template for a locking primary key select. `?1` is replaced with the
    /// select list, `?2` with the from clause and `?3` with the where clause.
    /// `None` when the database has no row-level locking.
    pub row_locking_template: Option<&'static str>,

    /// Longest identifier the database accepts
    pub max_identifier_length: usize,

    /// Largest number of bind parameters in one statement
    pub max_params: usize,

    /// Whether `ALTER TABLE .. ADD CONSTRAINT` is supported
    pub alter_table_constraints: bool,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        flavor: Flavor::Sqlite,
        row_locking_template: None,
        max_identifier_length: 1024,
        max_params: 32_766,
        alter_table_constraints: false,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        flavor: Flavor::Postgresql,
        row_locking_template: Some("SELECT ?1 FROM ?2 WHERE ?3 FOR UPDATE"),
        max_identifier_length: 63,
        max_params: 65_535,
        alter_table_constraints: true,
    };

    /// MySQL capabilities
    pub const MYSQL: Self = Self {
        flavor: Flavor::Mysql,
        max_identifier_length: 64,
        ..Self::POSTGRESQL
    };

    pub fn for_flavor(flavor: Flavor) -> &'static Capability {
        match flavor {
            Flavor::Sqlite => &Self::SQLITE,
            Flavor::Postgresql => &Self::POSTGRESQL,
            Flavor::Mysql => &Self::MYSQL,
        }
    }

    /// Substitutes the statement fragments into the locking template.
    pub fn row_locking_select(&self, select: &str, from: &str, filter: &str) -> Option<String> {
        self.row_locking_template.map(|template| {
            template
                .replace("?1", select)
                .replace("?2", from)
                .replace("?3", filter)
        })
    }
}
