use super::{Accessor, Column, PropertyKind, ValueClass, ValueClasses};
use crate::{schema::db, stmt::Value, Error, Result};

/// A value object flattened depth-first across several columns.
#[derive(Debug)]
pub struct DecomposedMapping {
    root: ValueClass,
    columns: Vec<Column>,
    paths: Vec<PropertyPath>,
}

/// Changes applied to one leaf property of a decomposed field.
#[derive(Debug, Clone, Default)]
pub struct PropertyOverride {
    /// Dotted property path, e.g. `address.city`
    pub property: String,
    pub column: Option<String>,
    pub storage_ty: Option<db::Type>,
    pub sql_type: Option<String>,
    pub not_null: bool,
}

#[derive(Debug)]
struct PropertyPath {
    /// Dotted property name
    name: String,
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
struct Step {
    accessor: Accessor,
    /// Class of the value this step reaches, when it is an intermediate node
    class: Option<ValueClass>,
}

struct Flatten<'a> {
    classes: &'a ValueClasses,
    field_column: &'a str,
    /// Class names on the path currently being walked
    visiting: Vec<String>,
    columns: Vec<Column>,
    paths: Vec<PropertyPath>,
}

impl DecomposedMapping {
    pub fn new(
        field_column: &str,
        not_null: bool,
        class: &str,
        classes: &ValueClasses,
        overrides: &[PropertyOverride],
    ) -> Result<Self> {
        let root = classes.get(class)?.clone();

        let mut flatten = Flatten {
            classes,
            field_column,
            visiting: vec![],
            columns: vec![],
            paths: vec![],
        };
        flatten.walk(&root, &mut vec![], &mut vec![], &mut vec![], not_null)?;

        let Flatten {
            mut columns, paths, ..
        } = flatten;

        for property in overrides {
            let Some(index) = paths.iter().position(|path| path.name == property.property) else {
                return Err(Error::mapping(format!(
                    "value class `{}` has no property `{}`",
                    root.name, property.property
                )));
            };

            let mut column = columns[index].clone();
            if let Some(name) = &property.column {
                column = column.rename(name.clone());
            }
            if let Some(storage_ty) = &property.storage_ty {
                column = column.storage_ty(storage_ty.clone());
            }
            if let Some(sql_type) = &property.sql_type {
                column = column.sql_type(sql_type.clone());
            }
            if property.not_null {
                column = column.not_null();
            }
            columns[index] = column;
        }

        if columns.is_empty() {
            return Err(Error::mapping(format!(
                "value class `{}` has no properties",
                root.name
            )));
        }

        Ok(Self {
            root,
            columns,
            paths,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Dotted property names, one per column.
    pub fn property_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.paths.iter().map(|path| &path.name[..])
    }

    pub fn column_value(&self, field_value: &Value, index: usize) -> Result<Value> {
        let mut current = field_value.clone();
        for step in &self.paths[index].steps {
            if current.is_null() {
                return Ok(Value::Null);
            }
            current = step.accessor.get(&current)?;
        }
        Ok(current)
    }

    /// Sets one leaf property, instantiating null nodes on the way down.
    /// Other properties of existing nodes are left untouched.
    pub fn set_column_value(
        &self,
        field_value: &mut Value,
        index: usize,
        column_value: Value,
    ) -> Result<()> {
        if field_value.is_null() {
            if column_value.is_null() {
                return Ok(());
            }
            *field_value = self.root.instantiate()?;
        }

        set_path(field_value, &self.paths[index].steps, column_value)
    }

    pub fn read(&self, row: &[Value]) -> Result<Value> {
        let mut value = Value::Null;
        for (index, (column, raw)) in self.columns.iter().zip(row).enumerate() {
            let column_value = column.read(raw.clone())?;
            self.set_column_value(&mut value, index, column_value)?;
        }
        Ok(value)
    }
}

fn set_path(node: &mut Value, steps: &[Step], value: Value) -> Result<()> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        return step.accessor.set(node, value);
    }

    let mut child = step.accessor.get(node)?;
    if child.is_null() {
        if value.is_null() {
            return Ok(());
        }
        child = match &step.class {
            Some(class) => class.instantiate()?,
            None => return Err(Error::mapping("intermediate property has no value class")),
        };
    }

    set_path(&mut child, rest, value)?;
    step.accessor.set(node, child)
}

impl Flatten<'_> {
    fn walk(
        &mut self,
        class: &ValueClass,
        columns: &mut Vec<String>,
        names: &mut Vec<String>,
        steps: &mut Vec<Step>,
        not_null: bool,
    ) -> Result<()> {
        if self.visiting.contains(&class.name) {
            return Err(Error::mapping(format!(
                "circular reference to value class `{}` through `{}`",
                class.name,
                names.join(".")
            )));
        }
        self.visiting.push(class.name.clone());

        for (index, property) in class.properties.iter().enumerate() {
            let accessor = property
                .accessor
                .clone()
                .unwrap_or_else(|| Accessor::field(index));
            let not_null = not_null || property.not_null;

            columns.push(property.column.clone());
            names.push(property.name.clone());

            match &property.kind {
                PropertyKind::Column { ty, storage_ty } => {
                    let name = format!("{}_{}", self.field_column, columns.join("_"));
                    let storage_ty = match storage_ty {
                        Some(storage_ty) => storage_ty.clone(),
                        None => db::Type::from_app(ty)?,
                    };
                    let mut column = Column::with_storage(name, ty.clone(), storage_ty);
                    if not_null {
                        column = column.not_null();
                    }

                    let mut path = steps.clone();
                    path.push(Step {
                        accessor,
                        class: None,
                    });

                    self.columns.push(column);
                    self.paths.push(PropertyPath {
                        name: names.join("."),
                        steps: path,
                    });
                }
                PropertyKind::Class(name) => {
                    let child = self.classes.get(name)?.clone();
                    steps.push(Step {
                        accessor,
                        class: Some(child.clone()),
                    });
                    self.walk(&child, columns, names, steps, not_null)?;
                    steps.pop();
                }
            }

            columns.pop();
            names.pop();
        }

        self.visiting.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Property;
    use crate::stmt::Type;

    fn classes() -> ValueClasses {
        let mut classes = ValueClasses::new();
        classes
            .register(
                ValueClass::record("Address")
                    .property(Property::column("street", "street", Type::String))
                    .property(Property::column("city", "city", Type::String).not_null())
                    .property(Property::class("geo", "geo", "Geo")),
            )
            .register(
                ValueClass::record("Geo")
                    .property(Property::column("lat", "lat", Type::F64))
                    .property(Property::column("lng", "lng", Type::F64)),
            );
        classes
    }

    fn address() -> DecomposedMapping {
        DecomposedMapping::new("home", false, "Address", &classes(), &[]).unwrap()
    }

    #[test]
    fn flattens_depth_first() {
        let mapping = address();
        let names: Vec<_> = mapping.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["home_street", "home_city", "home_geo_lat", "home_geo_lng"]
        );
        assert_eq!(
            mapping.property_names().collect::<Vec<_>>(),
            ["street", "city", "geo.lat", "geo.lng"]
        );

        let not_null: Vec<_> = mapping.columns().iter().map(|c| c.not_null).collect();
        assert_eq!(not_null, [false, true, false, false]);
    }

    #[test]
    fn set_on_null_root_instantiates() {
        let mapping = address();
        let mut value = Value::Null;

        mapping
            .set_column_value(&mut value, 2, Value::F64(51.5))
            .unwrap();

        assert_eq!(
            value,
            Value::record_from_vec(vec![
                Value::Null,
                Value::Null,
                Value::record_from_vec(vec![Value::F64(51.5), Value::Null]),
            ])
        );
        assert_eq!(mapping.column_value(&value, 2).unwrap(), Value::F64(51.5));
        assert!(mapping.column_value(&value, 0).unwrap().is_null());
    }

    #[test]
    fn set_on_existing_preserves_siblings() {
        let mapping = address();
        let mut value = Value::record_from_vec(vec![
            Value::from("1 Main St"),
            Value::from("Springfield"),
            Value::record_from_vec(vec![Value::F64(1.0), Value::F64(2.0)]),
        ]);

        mapping
            .set_column_value(&mut value, 1, Value::from("Shelbyville"))
            .unwrap();
        mapping
            .set_column_value(&mut value, 3, Value::F64(3.0))
            .unwrap();

        assert_eq!(
            value,
            Value::record_from_vec(vec![
                Value::from("1 Main St"),
                Value::from("Shelbyville"),
                Value::record_from_vec(vec![Value::F64(1.0), Value::F64(3.0)]),
            ])
        );
    }

    #[test]
    fn null_columns_read_as_null() {
        let mapping = address();
        let row = vec![Value::Null; 4];
        assert!(mapping.read(&row).unwrap().is_null());
    }

    #[test]
    fn missing_default_constructor() {
        let mut classes = ValueClasses::new();
        classes.register(
            ValueClass::new("Money")
                .property(Property::column("amount", "amount", Type::Decimal))
                .property(Property::column("currency", "currency", Type::String)),
        );
        let mapping = DecomposedMapping::new("price", false, "Money", &classes, &[]).unwrap();

        let mut value = Value::Null;
        let err = mapping
            .set_column_value(&mut value, 1, Value::from("EUR"))
            .unwrap_err();
        assert!(err.is_mapping());
    }

    #[test]
    fn circular_reference() {
        let mut classes = ValueClasses::new();
        classes.register(
            ValueClass::record("Node")
                .property(Property::column("label", "label", Type::String))
                .property(Property::class("next", "next", "Node")),
        );
        let err = DecomposedMapping::new("head", false, "Node", &classes, &[]).unwrap_err();
        assert!(err.is_mapping());
    }

    #[test]
    fn overrides() {
        let overrides = [PropertyOverride {
            property: "geo.lat".to_string(),
            column: Some("latitude".to_string()),
            not_null: true,
            ..Default::default()
        }];
        let mapping =
            DecomposedMapping::new("home", false, "Address", &classes(), &overrides).unwrap();
        assert_eq!(mapping.columns()[2].name, "latitude");
        assert!(mapping.columns()[2].not_null);

        let overrides = [PropertyOverride {
            property: "geo.altitude".to_string(),
            ..Default::default()
        }];
        let err =
            DecomposedMapping::new("home", false, "Address", &classes(), &overrides).unwrap_err();
        assert!(err.is_mapping());
    }
}
