use super::{Formatter, ToSql};
use crate::stmt::QueryParameter;

use relmap_core::driver::Flavor;

pub trait Params {
    fn push(&mut self, param: QueryParameter) -> Placeholder;
}

/// One-based position of a bound parameter.
pub struct Placeholder(pub usize);

impl Params for Vec<QueryParameter> {
    fn push(&mut self, param: QueryParameter) -> Placeholder {
        Vec::push(self, param);
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match f.serializer.flavor {
            Flavor::Sqlite | Flavor::Mysql => f.dst.push('?'),
            Flavor::Postgresql => {
                f.dst.push('$');
                f.dst.push_str(&self.0.to_string());
            }
        }
    }
}
