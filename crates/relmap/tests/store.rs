use pretty_assertions::assert_eq;
use relmap::{ReadAheadCache, ReadAheadMap, RelationTracker, Store};
use relmap_core::{
    driver::{Capability, TransactionManager},
    err,
    mapping::Column,
    schema::{db, Entity, Field, LeftJoin, ReadAhead, Relation, Side, Strategy},
    stmt::{Param, Type, Value, ValueRecord},
    Config, Connection as _, Result, Schema,
};
use relmap_driver_sqlite::{Connection, Sqlite};
use relmap_sql::stmt::{Bound, CompiledQuery, CompiledSelect};
use rust_decimal::Decimal;

fn make_schema() -> Schema {
    Schema::builder()
        .entity(
            Entity::builder("Customer")
                .table("customers")
                .field(Field::simple("id", Column::new("id", Type::I64)))
                .field(Field::simple("name", Column::new("name", Type::String)).indexed())
                .primary_key(["id"]),
        )
        .entity(
            Entity::builder("Order")
                .table("orders")
                .field(Field::simple("region", Column::new("region", Type::String)))
                .field(Field::simple("number", Column::new("number", Type::I64)))
                .field(Field::simple(
                    "customerId",
                    Column::new("customer_id", Type::I64),
                ))
                .field(Field::simple("total", Column::new("total", Type::Decimal)))
                .primary_key(["region", "number"])
                .read_ahead(
                    ReadAhead::new(Strategy::OnFind)
                        .left_join(LeftJoin::new("customer").eager_load_group("*")),
                ),
        )
        .entity(
            Entity::builder("Product")
                .table("products")
                .field(Field::simple("id", Column::new("id", Type::I64)))
                .field(Field::simple("label", Column::new("label", Type::String)))
                .primary_key(["id"]),
        )
        .relation(
            Relation::builder("customer-orders")
                .left("customer", "Customer", Some("orders"))
                .right("order", "Order", Some("customer"))
                .foreign_key(Side::Right, ["customerId"]),
        )
        .relation(
            Relation::builder("order-products")
                .left("order", "Order", Some("products"))
                .right("product", "Product", Some("orders"))
                .join_table("order_products"),
        )
        .build()
        .unwrap()
}

fn order_id(region: &str, number: i64) -> Value {
    Value::record_from_vec(vec![region.into(), number.into()])
}

fn record(values: Vec<Value>) -> Value {
    Value::record_from_vec(values)
}

fn setup(store: &Store<'_>) -> Connection {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut connection = Sqlite::in_memory().connect().unwrap();
    for entity in ["Customer", "Order", "Product"] {
        store.create_table(&mut connection, entity).unwrap();
    }
    store
        .create_relation_table(&mut connection, "order-products")
        .unwrap();

    let total: Decimal = "12.50".parse().unwrap();
    let rows = [
        ("Customer", record(vec![1_i64.into(), "Ada".into()])),
        ("Customer", record(vec![2_i64.into(), "Grace".into()])),
        (
            "Order",
            record(vec!["eu".into(), 7_i64.into(), 1_i64.into(), total.into()]),
        ),
        (
            "Order",
            record(vec!["eu".into(), 8_i64.into(), 1_i64.into(), total.into()]),
        ),
        (
            "Order",
            record(vec!["us".into(), 1_i64.into(), Value::Null, total.into()]),
        ),
        ("Product", record(vec![100_i64.into(), "lamp".into()])),
        ("Product", record(vec![101_i64.into(), "desk".into()])),
    ];
    for (entity, row) in &rows {
        store.insert(&mut connection, entity, row).unwrap();
    }

    connection
}

#[test]
fn find_by_primary_key_reads_ahead() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let order = schema.entity_by_name("Order").unwrap().id;
    let customer = schema.entity_by_name("Customer").unwrap().id;
    let id = order_id("eu", 7);

    assert!(store
        .find_by_primary_key(&mut connection, &mut cache, "Order", &id)
        .unwrap());

    assert!(cache.contains(order, &id));
    assert_eq!(
        cache.preloaded(order, &id, 3),
        Some(&Value::from("12.5".parse::<Decimal>().unwrap()))
    );
    assert_eq!(cache.related(order, &id, "customer"), [Value::from(1_i64)]);
    assert_eq!(
        cache.preloaded(customer, &Value::from(1_i64), 1),
        Some(&Value::from("Ada"))
    );

    // A cached instance is not selected again
    connection.execute("DELETE FROM orders", &[]).unwrap();
    assert!(store
        .find_by_primary_key(&mut connection, &mut cache, "Order", &id)
        .unwrap());

    assert!(!store
        .find_by_primary_key(&mut connection, &mut cache, "Order", &order_id("eu", 9))
        .unwrap());
}

#[test]
fn unmatched_left_join_reads_no_relation() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let order = schema.entity_by_name("Order").unwrap().id;
    let id = order_id("us", 1);

    assert!(store
        .find_by_primary_key(&mut connection, &mut cache, "Order", &id)
        .unwrap());
    assert!(cache.related(order, &id, "customer").is_empty());
    assert_eq!(cache.preloaded(order, &id, 2), Some(&Value::Null));
}

#[test]
fn finders() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let orders = store
        .find_all(&mut connection, &mut cache, "Order", false)
        .unwrap();
    assert_eq!(orders.len(), 3);
    for id in [order_id("eu", 7), order_id("eu", 8), order_id("us", 1)] {
        assert!(orders.contains(&id));
    }

    let customers = store
        .find_by_field(&mut connection, &mut cache, "Customer", "findByName", "Grace", false)
        .unwrap();
    assert_eq!(customers, [Value::from(2_i64)]);

    let customer = schema.entity_by_name("Customer").unwrap().id;
    assert_eq!(cache.finder_results().last().unwrap(), &(customer, customers));

    let err = store
        .find_by_field(&mut connection, &mut cache, "Customer", "findByAge", 3_i64, false)
        .unwrap_err();
    assert!(err.is_query_build());
}

#[test]
fn compiled_query_window() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let query = store
        .builder()
        .compiled(
            &CompiledQuery::new(
                "SELECT id FROM products ORDER BY id",
                CompiledSelect::entity("Product"),
            )
            .offset(Bound::Value(1))
            .limit(Bound::Arg(0)),
        )
        .unwrap();

    let found = store
        .find(&mut connection, &mut cache, &query, &[Value::from(5_i64)])
        .unwrap();
    assert_eq!(found, [Value::from(101_i64)]);

    let found = store
        .find(&mut connection, &mut cache, &query, &[Value::from(0_i64)])
        .unwrap();
    assert_eq!(found, [Value::from(101_i64)]);

    let unbounded = store
        .builder()
        .compiled(
            &CompiledQuery::new(
                "SELECT id FROM products ORDER BY id",
                CompiledSelect::entity("Product"),
            )
            .limit(Bound::Arg(0)),
        )
        .unwrap();
    let found = store
        .find(&mut connection, &mut cache, &unbounded, &[Value::from(0_i64)])
        .unwrap();
    assert_eq!(found, [Value::from(100_i64), Value::from(101_i64)]);

    let found = store
        .find(&mut connection, &mut cache, &unbounded, &[Value::from(1_i64)])
        .unwrap();
    assert_eq!(found, [Value::from(100_i64)]);

    let count = store
        .builder()
        .compiled(&CompiledQuery::new(
            "SELECT COUNT(*) FROM orders",
            CompiledSelect::Function(Type::I64),
        ))
        .unwrap();
    let found = store
        .find(&mut connection, &mut cache, &count, &[])
        .unwrap();
    assert_eq!(found, [Value::from(3_i64)]);

    let labels = store
        .builder()
        .compiled(&CompiledQuery::new(
            "SELECT label FROM products ORDER BY id",
            CompiledSelect::Field {
                entity: "Product".to_string(),
                field: "label".to_string(),
            },
        ))
        .unwrap();
    let found = store
        .find(&mut connection, &mut cache, &labels, &[])
        .unwrap();
    assert_eq!(found, [Value::from("lamp"), Value::from("desk")]);
}

#[test]
fn relation_sync_through_join_table() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let relation = schema.relation_by_name("order-products").unwrap();
    let (order, product) = (relation.left.id, relation.right.id);
    let id = order_id("eu", 7);

    let mut tracker = RelationTracker::new(&schema);
    tracker.add_relation(order, id.clone(), product, 100_i64).unwrap();
    tracker.add_relation(product, 101_i64, order, id.clone()).unwrap();
    store.flush(&mut connection, &mut tracker).unwrap();
    assert!(!tracker.is_dirty());

    let mut products = store
        .load_relation(&mut connection, &mut cache, "Order", "products", &id)
        .unwrap();
    products.sort_by_key(|value| value.to_i64().unwrap());
    assert_eq!(products, [Value::from(100_i64), Value::from(101_i64)]);

    tracker.remove_relation(order, id.clone(), product, 100_i64).unwrap();
    store.flush(&mut connection, &mut tracker).unwrap();

    let products = store
        .load_relation(&mut connection, &mut cache, "Order", "products", &id)
        .unwrap();
    assert_eq!(products, [Value::from(101_i64)]);

    // Relations on the other side see the same rows
    let orders = store
        .load_relation(&mut connection, &mut cache, "Product", "orders", &Value::from(101_i64))
        .unwrap();
    assert_eq!(orders, [id]);
}

#[test]
fn foreign_key_relation_lookup() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);
    let mut cache = ReadAheadMap::new();

    let orders = store
        .load_relation(&mut connection, &mut cache, "Customer", "orders", &Value::from(1_i64))
        .unwrap();
    assert_eq!(orders.len(), 2);

    let customer = store
        .load_relation(&mut connection, &mut cache, "Order", "customer", &order_id("eu", 8))
        .unwrap();
    assert_eq!(customer, [Value::from(1_i64)]);
}

#[test]
fn delete_entity() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);

    assert!(store
        .delete(&mut connection, "Order", &order_id("eu", 8))
        .unwrap());
    assert!(!store
        .delete(&mut connection, "Order", &order_id("eu", 8))
        .unwrap());
}

#[test]
fn insert_failure_names_the_table() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);

    let duplicate = record(vec![1_i64.into(), "Ada".into()]);
    let err = store
        .insert(&mut connection, "Customer", &duplicate)
        .unwrap_err();

    assert!(err.is_statement_execution());
    assert!(err.root().is_driver_operation_failed());
    assert!(err
        .to_string()
        .starts_with("failed to execute INSERT on table `customers`: "));
}

#[test]
fn indexes_and_foreign_keys() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);

    store.create_indexes(&mut connection, "Customer").unwrap();

    // SQLite cannot add constraints afterwards, so only the indexes are made
    store
        .create_foreign_keys(&mut connection, "customer-orders")
        .unwrap();
    store
        .create_foreign_keys(&mut connection, "order-products")
        .unwrap();

    let err = store
        .create_foreign_keys(&mut connection, "customer-orders")
        .unwrap_err();
    assert!(err.is_statement_execution());
    assert!(err
        .to_string()
        .starts_with("failed to execute CREATE INDEX on table `orders`: "));

    let err = store.create_indexes(&mut connection, "Customer").unwrap_err();
    assert!(err.is_statement_execution());
}

#[test]
fn drop_table_outside_transaction() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);
    let mut connection = setup(&store);

    assert!(store.drop_table(&mut connection, "order_products"));
    // Already gone
    assert!(!store.drop_table(&mut connection, "order_products"));

    // SQLite cannot suspend an open transaction
    connection.begin().unwrap();
    assert!(!store.drop_table(&mut connection, "products"));
    connection.rollback().unwrap();
    assert!(store.drop_table(&mut connection, "products"));
}

/// Counts transaction hand-offs around the statements it runs.
#[derive(Default)]
struct Suspending {
    statements: Vec<String>,
    suspended: u32,
    resumed: Vec<u32>,
    fail_resume: bool,
}

impl relmap_core::Connection for Suspending {
    fn capability(&self) -> &'static Capability {
        &Capability::POSTGRESQL
    }

    fn execute(&mut self, sql: &str, _: &[Param]) -> Result<u64> {
        self.statements.push(sql.to_string());
        Ok(0)
    }

    fn query(&mut self, _: &str, _: &[Param], _: &[db::Type]) -> Result<Vec<ValueRecord>> {
        Ok(vec![])
    }
}

impl TransactionManager for Suspending {
    type Transaction = u32;

    fn suspend(&mut self) -> Result<Option<u32>> {
        self.suspended += 1;
        Ok(Some(self.suspended))
    }

    fn resume(&mut self, transaction: u32) -> Result<()> {
        if self.fail_resume {
            return Err(err!("transaction {transaction} is gone"));
        }
        self.resumed.push(transaction);
        Ok(())
    }
}

#[test]
fn drop_table_resumes_transaction() {
    let schema = make_schema();
    let config = Config::new();
    let store = Store::new(&schema, &config);

    let mut connection = Suspending::default();
    assert!(store.drop_table(&mut connection, "orders"));
    assert_eq!(connection.statements, ["DROP TABLE orders"]);
    assert_eq!(connection.resumed, [1]);

    // A failed resume is logged, not raised
    connection.fail_resume = true;
    assert!(store.drop_table(&mut connection, "customers"));
    assert_eq!(connection.resumed, [1]);
}
