mod builder;
pub use builder::StatementBuilder;

mod compiled;
pub use compiled::{Bound, CompiledParam, CompiledQuery, CompiledSelect};

mod key;
pub use key::QueryKey;

mod param;
pub use param::{Component, QueryParameter};

mod query;
pub use query::{EntitySelect, JoinNode, Query, Select};
