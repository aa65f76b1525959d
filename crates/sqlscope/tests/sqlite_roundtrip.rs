//! End-to-end runs against real SQLite files, checking that commits and
//! rollbacks land where fresh connections can see them.

use sqlscope::{Database, Queryable, Record, Row, SessionRegistry, named_params, params};
use sqlscope_sqlite::SqliteDriver;
use tempfile::TempDir;

fn file_db(dir: &TempDir) -> Database {
    let path = dir.path().join("app.db");
    Database::builder()
        .driver(SqliteDriver::new())
        .dsn(path.to_string_lossy())
        .build()
        .unwrap()
}

fn create_people(db: &mut Database) {
    db.execute(
        "CREATE TABLE people (name TEXT NOT NULL, age INTEGER NOT NULL)",
        params![],
    )
    .unwrap();
}

fn count(db: &mut Database, table: &str) -> i64 {
    let rows = db
        .select(&format!("SELECT COUNT(*) FROM {table}"), params![])
        .fetch_all()
        .unwrap();
    rows[0].get_as::<i64>(0).unwrap()
}

fn names(rows: Vec<Row>) -> Vec<String> {
    rows.into_iter()
        .map(|row| row.get_as::<String>(0).unwrap())
        .collect()
}

#[test]
fn committed_work_is_visible_to_later_sessions() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);

    // every call below runs on its own connection
    db.insert(
        "people",
        &[
            Record::new().set("name", "ada").set("age", 36),
            Record::new().set("name", "grace").set("age", 45),
        ],
    )
    .unwrap();

    let rows = db
        .select("SELECT name, age FROM people ORDER BY age", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_named::<String>("name").unwrap(), "ada");
    assert_eq!(rows[1].get_named::<i64>("age").unwrap(), 45);
}

#[test]
fn rolled_back_transactions_leave_no_rows() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);

    let session = db.session().unwrap();
    let tx = session.transaction().unwrap();
    tx.with_cursor(|cursor| {
        cursor.execute(
            "INSERT INTO people (name, age) VALUES ('eve', 20)",
            &params![],
        )
    })
    .unwrap();
    tx.rollback().unwrap();
    session.close().unwrap();

    assert_eq!(count(&mut db, "people"), 0);
}

#[test]
fn parameters_bind_by_position_and_name() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);
    db.insert(
        "people",
        &[
            Record::new().set("name", "ada").set("age", 36),
            Record::new().set("name", "grace").set("age", 45),
        ],
    )
    .unwrap();

    let rows = db
        .select("SELECT name FROM people WHERE age > ?1", params![40])
        .fetch_all()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<String>(0).unwrap(), "grace");

    let rows = db
        .select(
            "SELECT name FROM people WHERE age = :age",
            named_params! { "age" => 36 },
        )
        .fetch_all()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<String>(0).unwrap(), "ada");
}

#[test]
fn the_same_query_reads_identically_from_every_scope() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);
    db.insert(
        "people",
        &[
            Record::new().set("name", "ada").set("age", 36),
            Record::new().set("name", "grace").set("age", 45),
        ],
    )
    .unwrap();

    let query = "SELECT name FROM people ORDER BY age";
    let via_database = names(db.select(query, params![]).fetch_all().unwrap());

    let mut session = db.session().unwrap();
    let via_session = names(session.select(query, params![]).fetch_all().unwrap());

    let mut tx = session.transaction().unwrap();
    let via_transaction = names(tx.select(query, params![]).fetch_all().unwrap());
    tx.commit().unwrap();
    session.close().unwrap();

    assert_eq!(via_database, vec!["ada", "grace"]);
    assert_eq!(via_session, via_database);
    assert_eq!(via_transaction, via_database);
}

#[test]
fn uuids_store_as_hyphenated_text() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    db.execute("CREATE TABLE items (id TEXT NOT NULL)", params![])
        .unwrap();

    let uuid = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10,
    ];
    db.insert("items", &[Record::new().set("id", uuid)]).unwrap();

    let rows = db.select("SELECT id FROM items", params![]).fetch_all().unwrap();
    assert_eq!(
        rows[0].get_as::<String>(0).unwrap(),
        "01020304-0506-0708-090a-0b0c0d0e0f10"
    );
}

#[test]
fn returning_rows_commit_when_fully_consumed() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);

    let rows = db
        .select(
            "INSERT INTO people (name, age) VALUES ('eve', 20) RETURNING name",
            params![],
        )
        .fetch_all()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<String>(0).unwrap(), "eve");

    assert_eq!(count(&mut db, "people"), 1);
}

#[test]
fn abandoning_returning_rows_rolls_the_insert_back() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);

    {
        let mut select = db.select(
            "INSERT INTO people (name, age) VALUES ('eve', 20) RETURNING name",
            params![],
        );
        let mut rows = select.rows().unwrap();
        let first = rows.next().unwrap().unwrap();
        assert_eq!(first.get_as::<String>(0).unwrap(), "eve");
        // dropped before exhaustion: the transaction rolls back
    }

    assert_eq!(count(&mut db, "people"), 0);
}

#[test]
fn scoped_helpers_commit_on_success() {
    let dir = TempDir::new().unwrap();
    let mut db = file_db(&dir);
    create_people(&mut db);

    db.with_session(|session| {
        session.with_transaction(|tx| {
            tx.with_cursor(|cursor| {
                cursor.execute(
                    "INSERT INTO people (name, age) VALUES ('eve', 20)",
                    &params![],
                )
            })
        })
    })
    .unwrap();

    assert_eq!(count(&mut db, "people"), 1);
}

#[test]
fn registry_runs_the_whole_api_on_one_connection() {
    let dir = TempDir::new().unwrap();
    let mut registry = SessionRegistry::new();
    registry.configure(file_db(&dir)).unwrap();

    registry
        .execute(
            "CREATE TABLE people (name TEXT NOT NULL, age INTEGER NOT NULL)",
            params![],
        )
        .unwrap();
    registry
        .insert(
            "people",
            &[
                Record::new().set("name", "ada").set("age", 36),
                Record::new().set("name", "grace").set("age", 45),
            ],
        )
        .unwrap();

    let rows = registry
        .select("SELECT COUNT(*) FROM people", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows[0].get_as::<i64>(0).unwrap(), 2);

    registry.reset().unwrap();
    assert!(!registry.is_configured());
}
