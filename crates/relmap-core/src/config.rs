use crate::{
    driver::{Capability, Flavor},
    Error, Result,
};

use serde::Deserialize;

/// Settings for statement generation and relation flushing.
///
/// Built in code with the chained setters, or read from TOML:
///
/// ```toml
/// flavor = "postgresql"
/// max-keys-in-delete = 100
/// row-locking = true
///
/// [alias]
/// prefix = "t"
/// suffix = "_"
/// max-length = 30
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// SQL dialect of the target database
    pub flavor: Flavor,

    /// Table alias generation
    pub alias: AliasConfig,

    /// Maximum number of key tuples in one relation `DELETE`. Zero or
    /// negative means unlimited.
    pub max_keys_in_delete: i64,

    /// Lock rows read by eager primary key lookups
    pub row_locking: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AliasConfig {
    pub prefix: String,
    pub suffix: String,
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flavor: Flavor::default(),
            alias: AliasConfig::default(),
            max_keys_in_delete: 0,
            row_locking: false,
        }
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            prefix: "t".to_string(),
            suffix: "_".to_string(),
            max_length: 32,
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(src).map_err(|err| Error::invalid_configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn alias(mut self, alias: AliasConfig) -> Self {
        self.alias = alias;
        self
    }

    pub fn max_keys_in_delete(mut self, max: i64) -> Self {
        self.max_keys_in_delete = max;
        self
    }

    pub fn row_locking(mut self, row_locking: bool) -> Self {
        self.row_locking = row_locking;
        self
    }

    /// The delete chunk size, or `None` when unlimited.
    pub fn delete_chunk_size(&self) -> Option<usize> {
        usize::try_from(self.max_keys_in_delete)
            .ok()
            .filter(|max| *max > 0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alias.max_length == 0 {
            return Err(Error::invalid_configuration(
                "alias max-length must be greater than zero",
            ));
        }

        let capability = Capability::for_flavor(self.flavor);
        if self.alias.max_length > capability.max_identifier_length {
            return Err(Error::invalid_configuration(format!(
                "alias max-length {} exceeds the {:?} identifier limit of {}",
                self.alias.max_length, self.flavor, capability.max_identifier_length
            )));
        }

        Ok(())
    }
}

impl AliasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!(config.alias.prefix, "t");
        assert_eq!(config.alias.suffix, "_");
        assert_eq!(config.alias.max_length, 32);
        assert_eq!(config.delete_chunk_size(), None);
    }

    #[test]
    fn from_toml() {
        let config = Config::from_toml_str(
            r#"
            flavor = "postgresql"
            max-keys-in-delete = 3
            row-locking = true

            [alias]
            max-length = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.flavor, Flavor::Postgresql);
        assert_eq!(config.delete_chunk_size(), Some(3));
        assert!(config.row_locking);
        assert_eq!(config.alias.max_length, 12);
        assert_eq!(config.alias.prefix, "t");
    }

    #[test]
    fn negative_max_keys_is_unlimited() {
        assert_eq!(Config::new().max_keys_in_delete(-1).delete_chunk_size(), None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml_str("max-keys = 3").unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn alias_length_fits_identifiers() {
        let err = Config::from_toml_str("flavor = \"postgresql\"\n[alias]\nmax-length = 64")
            .unwrap_err();
        assert!(err.is_invalid_configuration());

        Config::from_toml_str("flavor = \"sqlite\"\n[alias]\nmax-length = 64").unwrap();
    }

    #[test]
    fn rejects_zero_alias_length() {
        let err = Config::from_toml_str("[alias]\nmax-length = 0").unwrap_err();
        assert!(err.is_invalid_configuration());
    }
}
