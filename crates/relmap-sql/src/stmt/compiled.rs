use relmap_core::{
    err,
    stmt::{self, Value},
    Error, Result,
};

/// A statement produced by the query language compiler.
///
/// The SQL text is used exactly as given; placeholders must already be in the
/// target flavor's syntax and appear in the same order as `params`.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,

    pub params: Vec<CompiledParam>,

    pub select: CompiledSelect,

    /// The SQL selects `DISTINCT` rows. Eager fields whose columns cannot be
    /// compared are left out of the row layout.
    pub distinct: bool,

    pub offset: Option<Bound>,

    pub limit: Option<Bound>,
}

/// What a compiled query's rows produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledSelect {
    /// Identities of `entity`, followed by the columns of the named load
    /// group's fields
    Entity {
        entity: String,
        eager_load_group: Option<String>,
    },

    Field {
        entity: String,
        field: String,
    },

    Function(stmt::Type),
}

/// Source of one placeholder in a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledParam {
    /// The argument is a value of the named field; `column` selects the
    /// column of that field's mapping
    Field {
        arg: usize,
        entity: String,
        field: String,
        column: usize,
    },

    /// The argument is an identity of `entity`; `column` indexes its primary
    /// key columns
    Identity {
        arg: usize,
        entity: String,
        column: usize,
    },

    /// The argument is a plain value of the given type
    Value { arg: usize, ty: stmt::Type },
}

/// A row offset or limit, either fixed or read from an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Zero-based argument position
    Arg(usize),

    Value(u64),
}

/// Piece of a declared SQL template.
#[derive(Debug, PartialEq)]
pub(crate) enum TemplatePart<'a> {
    Text(&'a str),
    Arg(usize),
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, select: CompiledSelect) -> CompiledQuery {
        CompiledQuery {
            sql: sql.into(),
            params: vec![],
            select,
            distinct: false,
            offset: None,
            limit: None,
        }
    }

    pub fn param(mut self, param: CompiledParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn offset(mut self, offset: Bound) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: Bound) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl CompiledSelect {
    pub fn entity(entity: impl Into<String>) -> CompiledSelect {
        CompiledSelect::Entity {
            entity: entity.into(),
            eager_load_group: None,
        }
    }
}

impl Bound {
    pub fn resolve(&self, args: &[Value]) -> Result<u64> {
        match *self {
            Bound::Value(value) => Ok(value),
            Bound::Arg(index) => args
                .get(index)
                .ok_or_else(|| err!("row bound refers to missing argument {index}"))?
                .to_u64(),
        }
    }
}

/// Splits a declared SQL template into text and `{n}` argument markers.
pub(crate) fn parse_template(template: &str) -> Result<Vec<TemplatePart<'_>>> {
    let mut parts = vec![];
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            return Err(Error::query_build(format!(
                "unterminated parameter marker in `{template}`"
            )));
        };

        let marker = &rest[start + 1..start + len];
        let arg = marker.parse::<usize>().map_err(|_| {
            Error::query_build(format!("invalid parameter marker `{{{marker}}}`"))
        })?;

        if start > 0 {
            parts.push(TemplatePart::Text(&rest[..start]));
        }
        parts.push(TemplatePart::Arg(arg));
        rest = &rest[start + len + 1..];
    }

    if !rest.is_empty() {
        parts.push(TemplatePart::Text(rest));
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_markers() {
        let parts = parse_template("SELECT id FROM a WHERE x = {1} AND y > {0}").unwrap();
        assert_eq!(
            parts,
            vec![
                TemplatePart::Text("SELECT id FROM a WHERE x = "),
                TemplatePart::Arg(1),
                TemplatePart::Text(" AND y > "),
                TemplatePart::Arg(0),
            ]
        );
    }

    #[test]
    fn parse_rejects_bad_markers() {
        assert!(parse_template("x = {a}").unwrap_err().is_query_build());
        assert!(parse_template("x = {1").unwrap_err().is_query_build());
    }

    #[test]
    fn bound_resolution() {
        let args = [Value::from("name"), Value::I32(20)];
        assert_eq!(Bound::Value(5).resolve(&args).unwrap(), 5);
        assert_eq!(Bound::Arg(1).resolve(&args).unwrap(), 20);
        assert!(Bound::Arg(2).resolve(&args).is_err());
        assert!(Bound::Arg(0).resolve(&args).is_err());
    }
}
