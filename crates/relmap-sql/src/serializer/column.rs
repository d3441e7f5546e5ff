use super::{Formatter, Params, ToSql};
use crate::stmt::QueryParameter;

/// A column, optionally qualified by a table alias.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnRef<'a> {
    pub(crate) alias: Option<&'a str>,
    pub(crate) name: &'a str,
}

/// A placeholder bound to `param`.
pub(crate) struct Bind(pub(crate) QueryParameter);

/// `column = ?`, binding `param` to the placeholder.
pub(crate) struct Compare<'a> {
    pub(crate) column: ColumnRef<'a>,
    pub(crate) param: QueryParameter,
}

impl<'a> ColumnRef<'a> {
    pub(crate) fn new(alias: &'a str, name: &'a str) -> ColumnRef<'a> {
        ColumnRef {
            alias: Some(alias),
            name,
        }
    }

    pub(crate) fn bare(name: &'a str) -> ColumnRef<'a> {
        ColumnRef { alias: None, name }
    }
}

impl ToSql for ColumnRef<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if let Some(alias) = self.alias {
            fmt!(f, alias ".");
        }
        fmt!(f, self.name);
    }
}

impl ToSql for Bind {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = f.params.push(self.0);
        placeholder.to_sql(f);
    }
}

impl ToSql for Compare<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.column " = " Bind(self.param));
    }
}

/// `lhs = rhs` between two columns, as used in join conditions.
impl<'a> ToSql for (ColumnRef<'a>, ColumnRef<'a>) {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.0 " = " self.1);
    }
}
