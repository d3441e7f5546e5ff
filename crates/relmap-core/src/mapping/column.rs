use super::{ParamBinder, ResultReader};
use crate::{
    schema::db,
    stmt::{self, Param, Value},
    Result,
};

/// One physical column backing (part of) a field.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Logical type of the column value. For a transformed field this is the
    /// transformer's column-side type.
    pub ty: stmt::Type,

    /// How the database stores the column
    pub storage_ty: db::Type,

    /// SQL type written in DDL. Derived from `storage_ty` when unset.
    pub sql_type: Option<String>,

    pub not_null: bool,

    pub auto_increment: bool,

    /// Prepares non-null values for the driver
    pub binder: ParamBinder,

    /// Converts raw driver values back to `ty`
    pub reader: ResultReader,
}

impl Column {
    /// Creates a column with the default storage type for `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is a record type, which cannot be stored in a single
    /// column.
    pub fn new(name: impl Into<String>, ty: stmt::Type) -> Column {
        let storage_ty = match db::Type::from_app(&ty) {
            Ok(storage_ty) => storage_ty,
            Err(err) => panic!("{err}"),
        };
        Column::with_storage(name, ty, storage_ty)
    }

    pub fn with_storage(name: impl Into<String>, ty: stmt::Type, storage_ty: db::Type) -> Column {
        Column {
            name: name.into(),
            binder: ParamBinder::for_types(&storage_ty, &ty),
            reader: ResultReader::for_types(&storage_ty, &ty),
            ty,
            storage_ty,
            sql_type: None,
            not_null: false,
            auto_increment: false,
        }
    }

    /// Overrides the storage type, re-selecting the binder and reader.
    pub fn storage_ty(mut self, storage_ty: db::Type) -> Self {
        self.binder = ParamBinder::for_types(&storage_ty, &self.ty);
        self.reader = ResultReader::for_types(&storage_ty, &self.ty);
        self.storage_ty = storage_ty;
        self
    }

    pub fn sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn sql_type_name(&self) -> String {
        match &self.sql_type {
            Some(sql_type) => sql_type.clone(),
            None => self.storage_ty.sql_name(),
        }
    }

    pub fn is_searchable(&self) -> bool {
        !self.storage_ty.is_large_object()
    }

    /// Binds a column value. Null binds as a typed NULL.
    pub fn bind(&self, value: Value) -> Result<Param> {
        if value.is_null() {
            return Ok(Param::null(self.storage_ty.clone()));
        }

        Ok(Param {
            value: self.binder.bind(value)?,
            ty: self.storage_ty.clone(),
        })
    }

    pub fn read(&self, raw: Value) -> Result<Value> {
        self.reader.read(raw)
    }
}
