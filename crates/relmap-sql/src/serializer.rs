#[macro_use]
mod fmt;
pub(crate) use fmt::ToSql;

mod column;
pub(crate) use column::{Bind, ColumnRef, Compare};

mod delim;
pub(crate) use delim::{Comma, Delimited, Paren};

mod params;
pub use params::{Params, Placeholder};

use relmap_core::driver::Flavor;

/// Writes SQL fragments for one database flavor.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    /// The flavor decides how placeholders are rendered
    flavor: Flavor,
}

pub(crate) struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn new(flavor: Flavor) -> Serializer {
        Serializer { flavor }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Serializes `fragment`, appending any bound parameters to `params`.
    pub(crate) fn serialize<P: Params>(&self, params: &mut P, fragment: impl ToSql) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        fragment.to_sql(&mut fmt);
        ret
    }
}
