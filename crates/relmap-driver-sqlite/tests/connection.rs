use pretty_assertions::assert_eq;
use relmap_core::{
    driver::TransactionManager,
    schema::db,
    stmt::{Param, Value},
    Connection as _,
};
use relmap_driver_sqlite::{Connection, Sqlite};
use rust_decimal::Decimal;

fn make_connection() -> Connection {
    let mut connection = Sqlite::in_memory().connect().unwrap();
    connection
        .execute(
            "CREATE TABLE items (id BIGINT, label TEXT, price NUMERIC, code UUID, active BOOLEAN, \
             CONSTRAINT pk_items PRIMARY KEY (id))",
            &[],
        )
        .unwrap();
    connection
}

#[test]
fn url_parsing() {
    assert!(matches!(Sqlite::new("sqlite::memory:").unwrap(), Sqlite::InMemory));
    assert!(matches!(
        Sqlite::new("sqlite:/tmp/relmap.db").unwrap(),
        Sqlite::File(_)
    ));

    let err = Sqlite::new("postgresql://localhost/db").unwrap_err();
    assert!(err.is_invalid_configuration());

    assert_eq!(Sqlite::in_memory().url(), "sqlite::memory:");
}

#[test]
fn insert_and_query_round_trip() {
    let mut connection = make_connection();
    let code = uuid::Uuid::new_v4();
    let price: Decimal = "19.99".parse().unwrap();

    let count = connection
        .execute(
            "INSERT INTO items (id, label, price, code, active) VALUES (?, ?, ?, ?, ?)",
            &[
                Param::new(1_i64, db::Type::Integer(8)),
                Param::new("widget", db::Type::Text),
                Param::new(price, db::Type::Numeric(None)),
                Param::new(code, db::Type::Uuid),
                Param::new(true, db::Type::Boolean),
            ],
        )
        .unwrap();
    assert_eq!(count, 1);

    let rows = connection
        .query(
            "SELECT id, label, price, code, active FROM items WHERE id = ?",
            &[Param::new(1_i64, db::Type::Integer(8))],
            &[
                db::Type::Integer(8),
                db::Type::Text,
                db::Type::Numeric(None),
                db::Type::Uuid,
                db::Type::Boolean,
            ],
        )
        .unwrap();

    // NUMERIC affinity turns the decimal text into a REAL; the column reader
    // restores the decimal
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].fields,
        vec![
            Value::I64(1),
            Value::from("widget"),
            Value::F64(19.99),
            Value::Uuid(code),
            Value::Bool(true),
        ]
    );
}

#[test]
fn nulls_are_returned_as_null() {
    let mut connection = make_connection();
    connection
        .execute(
            "INSERT INTO items (id, label) VALUES (?, ?)",
            &[
                Param::new(2_i64, db::Type::Integer(8)),
                Param::null(db::Type::Text),
            ],
        )
        .unwrap();

    let rows = connection
        .query(
            "SELECT label FROM items WHERE id = ?",
            &[Param::new(2_i64, db::Type::Integer(8))],
            &[db::Type::Text],
        )
        .unwrap();
    assert_eq!(rows[0].fields, vec![Value::Null]);
}

#[test]
fn driver_errors_are_reported() {
    let mut connection = make_connection();
    let err = connection
        .execute("INSERT INTO missing (id) VALUES (?)", &[Param::new(1_i64, db::Type::Integer(8))])
        .unwrap_err();
    assert!(err.is_driver_operation_failed());
}

#[test]
fn suspend_outside_transaction() {
    let mut connection = make_connection();
    assert_eq!(connection.suspend().unwrap(), None);

    connection.begin().unwrap();
    assert!(connection.in_transaction());
    assert!(connection.suspend().is_err());
    connection.rollback().unwrap();
    assert!(!connection.in_transaction());
}
