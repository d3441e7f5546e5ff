use relmap_core::config::AliasConfig;

use std::collections::HashMap;

const RELATION_TABLE_SUFFIX: &str = "_RELATION_TABLE";

/// Hands out short table aliases for navigation paths within one statement.
///
/// An alias is `prefix + counter + suffix + path`, with dots in the path
/// replaced by underscores, cut to `max_length` characters. The counter keeps
/// aliases distinct until truncation removes the differing tail; paths that
/// still collide after truncation map to the same alias. Create a new source
/// for every statement.
#[derive(Debug)]
pub struct AliasSource {
    prefix: String,
    suffix: String,
    max_length: usize,
    count: usize,
    aliases: HashMap<String, String>,
}

impl AliasSource {
    pub fn new(config: &AliasConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
            max_length: config.max_length,
            count: 0,
            aliases: HashMap::new(),
        }
    }

    /// Returns the alias for `path`, allocating one on first use.
    pub fn alias(&mut self, path: &str) -> String {
        if let Some(alias) = self.aliases.get(path) {
            return alias.clone();
        }

        let alias = self.create_alias(path);
        self.aliases.insert(path.to_string(), alias.clone());
        alias
    }

    /// Pins `path` to `alias`.
    pub fn assign(&mut self, path: &str, alias: &str) {
        self.aliases.insert(path.to_string(), alias.to_string());
    }

    /// Returns the alias of the join table reached through `path`.
    pub fn relation_alias(&mut self, path: &str) -> String {
        let key = format!("{path}{RELATION_TABLE_SUFFIX}");
        self.alias(&key)
    }

    fn create_alias(&mut self, path: &str) -> String {
        let mut alias = format!(
            "{}{}{}{}",
            self.prefix,
            self.count,
            self.suffix,
            path.replace('.', "_")
        );
        self.count += 1;

        if let Some((end, _)) = alias.char_indices().nth(self.max_length) {
            alias.truncate(end);
        }

        alias
    }
}

impl Default for AliasSource {
    fn default() -> Self {
        Self::new(&AliasConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_is_memoized() {
        let mut aliases = AliasSource::default();
        let first = aliases.alias("Order");
        assert_eq!(first, "t0_Order");
        assert_eq!(aliases.alias("Order"), first);
    }

    #[test]
    fn distinct_paths_get_distinct_aliases() {
        let mut aliases = AliasSource::default();
        let order = aliases.alias("Order");
        let lines = aliases.alias("Order.lines");
        assert_eq!(lines, "t1_Order_lines");
        assert_ne!(order, lines);
    }

    #[test]
    fn relation_alias_is_separate_from_entity_alias() {
        let mut aliases = AliasSource::default();
        let entity = aliases.alias("Order.products");
        let relation = aliases.relation_alias("Order.products");

        assert_ne!(entity, relation);
        assert_eq!(relation, "t1_Order_products_RELATION_TABLE");
        assert_eq!(aliases.relation_alias("Order.products"), relation);
    }

    #[test]
    fn long_aliases_are_truncated() {
        let mut aliases = AliasSource::default();
        let alias = aliases.alias("Customer.orders.lineItems.product");
        assert_eq!(alias, "t0_Customer_orders_lineItems_pro");
        assert_eq!(alias.chars().count(), 32);
    }

    #[test]
    fn assign_overrides() {
        let mut aliases = AliasSource::default();
        aliases.assign("Order", "o");
        assert_eq!(aliases.alias("Order"), "o");
        // The counter is not consumed by assignments
        assert_eq!(aliases.alias("Customer"), "t0_Customer");
    }

    #[test]
    fn truncation_collisions_are_deterministic() {
        let config = AliasConfig::default().max_length(6);
        let long_a = "Customer.orders.lines";
        let long_b = "Customer.orders.items";

        let mut first = AliasSource::new(&config);
        let a1 = first.alias(long_a);
        let b1 = first.alias(long_b);

        let mut second = AliasSource::new(&config);
        let a2 = second.alias(long_a);
        let b2 = second.alias(long_b);

        assert_eq!(a1, "t0_Cus");
        assert_eq!(b1, "t1_Cus");
        assert_eq!((a1, b1), (a2, b2));
        assert_eq!(first.alias(long_a).chars().count(), 6);
    }

    #[test]
    fn truncation_can_collapse_paths() {
        let config = AliasConfig::default().max_length(2);
        let mut aliases = AliasSource::new(&config);

        let a = aliases.alias("Customer");
        let b = aliases.alias("Order");
        assert_eq!(a, "t0");
        assert_eq!(b, "t1");

        // Once the counter alone no longer fits, aliases collide silently
        let config = AliasConfig::default().max_length(1);
        let mut aliases = AliasSource::new(&config);
        assert_eq!(aliases.alias("Customer"), aliases.alias("Order"));
    }
}
