#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use chrono::{NaiveDate, TimeZone, Utc};
use seedbank_db::{DbConfig, SqliteDatabase, is_memory_dsn};
use seedbank_hydrate::{Database, Row, SqlValue};

const SCHEMA: &str = r"
CREATE TABLE crops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    weight REAL,
    perennial BOOLEAN,
    sown DATE,
    created_on TIMESTAMP
);
";

async fn memory_db() -> SqliteDatabase {
    let config = DbConfig {
        max_conns: Some(1),
        ..DbConfig::default()
    };
    let db = SqliteDatabase::connect(&config)
        .await
        .expect("Failed to connect to database");
    db.execute_script(SCHEMA).await.expect("Failed to create schema");
    db
}

const INSERT: &str = "INSERT INTO crops (name, weight, perennial, sown, created_on) VALUES (?, ?, ?, ?, ?)";
const SELECT: &str = r#"SELECT crops.id AS "crops.id", crops.name AS "crops.name", crops.weight AS "crops.weight", crops.perennial AS "crops.perennial", crops.sown AS "crops.sown", crops.created_on AS "crops.created_on" FROM crops ORDER BY crops.id"#;

fn crop_params(name: &str) -> Vec<SqlValue> {
    vec![
        name.into(),
        SqlValue::Float(1.25),
        SqlValue::Bool(true),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().into(),
        Utc.with_ymd_and_hms(2024, 3, 2, 10, 30, 0).unwrap().into(),
    ]
}

#[test]
fn memory_dsns_are_detected() {
    assert!(is_memory_dsn("sqlite::memory:"));
    assert!(is_memory_dsn("sqlite:file:test?mode=memory&cache=shared"));
    assert!(!is_memory_dsn("sqlite://data/seedbank.db"));
}

#[tokio::test]
async fn insert_returns_generated_keys() {
    let db = memory_db().await;

    let first = db.insert(INSERT, crop_params("barley")).await.unwrap();
    let second = db.insert(INSERT, crop_params("oat")).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 2);
}

#[tokio::test]
async fn rows_are_read_by_qualified_alias() {
    let db = memory_db().await;
    db.insert(INSERT, crop_params("barley")).await.unwrap();

    let rows = db.fetch_all(SELECT, Vec::new()).await.unwrap();
    let row = &rows[0];

    assert_eq!(row.get_i64("crops.id").unwrap(), Some(1));
    assert_eq!(row.get_string("crops.name").unwrap().as_deref(), Some("barley"));
    assert_eq!(row.get_f64("crops.weight").unwrap(), Some(1.25));
    assert_eq!(row.get_bool("crops.perennial").unwrap(), Some(true));
    assert_eq!(
        row.get_date("crops.sown").unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    assert_eq!(
        row.get_timestamp("crops.created_on").unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 3, 2, 10, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn unselected_columns_and_nulls_read_as_none() {
    let db = memory_db().await;
    db.insert(
        INSERT,
        vec![
            "rye".into(),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
        ],
    )
    .await
    .unwrap();

    let rows = db.fetch_all(SELECT, Vec::new()).await.unwrap();
    let row = &rows[0];

    assert_eq!(row.get_f64("crops.weight").unwrap(), None);
    assert_eq!(row.get_timestamp("crops.created_on").unwrap(), None);
    assert_eq!(row.get_i64("institutions.id").unwrap(), None);
}

#[tokio::test]
async fn strings_render_numeric_cells() {
    let db = memory_db().await;
    db.insert(INSERT, crop_params("barley")).await.unwrap();

    let rows = db
        .fetch_all(
            "SELECT COUNT(*) AS count, AVG(crops.weight) AS avg FROM crops WHERE crops.name = ?",
            vec!["barley".into()],
        )
        .await
        .unwrap();

    assert_eq!(rows[0].get_string("count").unwrap().as_deref(), Some("1"));
    assert_eq!(rows[0].get_i64("count").unwrap(), Some(1));
    assert_eq!(rows[0].get_f64("avg").unwrap(), Some(1.25));
}

#[tokio::test]
async fn batch_inserts_in_order() {
    let db = memory_db().await;

    let ids = db
        .insert_batch(
            INSERT,
            vec![crop_params("a"), crop_params("b"), crop_params("c")],
        )
        .await
        .unwrap();

    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn failed_batch_rolls_back() {
    let db = memory_db().await;
    let mut bad = crop_params("x");
    bad[0] = SqlValue::Null;

    let result = db
        .insert_batch(INSERT, vec![crop_params("a"), bad])
        .await;

    assert!(result.is_err());
    let rows = db.fetch_all(SELECT, Vec::new()).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn statement_errors_are_storage_errors() {
    let db = memory_db().await;

    let err = db
        .fetch_all("SELECT * FROM no_such_table", Vec::new())
        .await
        .unwrap_err();

    assert_eq!(err.message(), "query failed");
}
