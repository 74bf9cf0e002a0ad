//! Relational operator tests over heap files.

use minirel::common::Error;
use minirel::database::Database;
use minirel::heap::{create_heap_file, Datatype, HeapFileScan, Operator};
use minirel::query::{self, AttrValue, Predicate, Relation};
use tempfile::{tempdir, TempDir};

fn emp() -> Relation {
    Relation::new("emp")
        .string("name", 16)
        .integer("age")
        .float("salary")
}

fn setup() -> (Database, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path(), 6).unwrap();
    create_heap_file(&db, "emp").unwrap();
    create_heap_file(&db, "result").unwrap();

    let rel = emp();
    for i in 0..60 {
        let name = format!("emp{:02}", i);
        let age = (20 + i % 30).to_string();
        let salary = format!("{}.5", 1000 + i * 10);
        query::insert(
            &db,
            &rel,
            &[
                AttrValue::new("salary", Datatype::Float, &salary),
                AttrValue::new("name", Datatype::String, &name),
                AttrValue::new("age", Datatype::Integer, &age),
            ],
        )
        .unwrap();
    }
    (db, dir)
}

fn rows(db: &Database, name: &str) -> Vec<Vec<u8>> {
    let mut scan = HeapFileScan::open(db, name).unwrap();
    let mut rows = Vec::new();
    while scan.scan_next().unwrap().is_some() {
        rows.push(scan.get_record().unwrap());
    }
    rows
}

#[test]
fn test_select_all_columns() {
    let (db, _dir) = setup();
    let rel = emp();

    let produced = query::select(&db, "result", &["name", "age", "salary"], &rel, None).unwrap();
    assert_eq!(produced, 60);
    assert_eq!(rows(&db, "result"), rows(&db, "emp"));
}

#[test]
fn test_select_float_predicate() {
    let (db, _dir) = setup();
    let rel = emp();

    // salary >= 1500.5 holds for i >= 50.
    let rich = Predicate::new("salary", Operator::Gte, "1500.5");
    let produced = query::select(&db, "result", &["salary"], &rel, Some(&rich)).unwrap();
    assert_eq!(produced, 10);

    for row in rows(&db, "result") {
        let salary = f32::from_le_bytes([row[0], row[1], row[2], row[3]]);
        assert!(salary >= 1500.5);
        assert_eq!(row.len(), 4);
    }
}

#[test]
fn test_delete_then_select() {
    let (db, _dir) = setup();
    let rel = emp();

    // Ages cycle 20..50, so two employees per age.
    let young = Predicate::new("age", Operator::Lt, "25");
    assert_eq!(query::delete(&db, &rel, Some(&young)).unwrap(), 10);

    let all = query::select(&db, "result", &["age"], &rel, None).unwrap();
    assert_eq!(all, 50);
    assert!(rows(&db, "result")
        .iter()
        .all(|row| i32::from_le_bytes([row[0], row[1], row[2], row[3]]) >= 25));

    let named = Predicate::new("name", Operator::Eq, "emp07");
    assert_eq!(query::delete(&db, &rel, Some(&named)).unwrap(), 1);
    assert_eq!(query::delete(&db, &rel, Some(&named)).unwrap(), 0);
}

#[test]
fn test_bad_predicate_value() {
    let (db, _dir) = setup();
    let bad = Predicate::new("age", Operator::Eq, "twenty");
    assert!(matches!(
        query::delete(&db, &emp(), Some(&bad)),
        Err(Error::BadAttrValue { .. })
    ));
    let unknown = Predicate::new("dept", Operator::Eq, "x");
    assert!(matches!(
        query::select(&db, "result", &["name"], &emp(), Some(&unknown)),
        Err(Error::AttrNotFound(_))
    ));
    assert_eq!(db.pool().pinned_frame_count(), 0);
}

#[test]
fn test_missing_relation() {
    let (db, _dir) = setup();
    let ghost = Relation::new("ghost").integer("id");
    assert!(matches!(
        query::insert(&db, &ghost, &[AttrValue::new("id", Datatype::Integer, "1")]),
        Err(Error::FileNotFound(_))
    ));
}
