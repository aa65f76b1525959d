//! QueryableMock behavior: pattern matching, replay, and trait parity.

use sqlscope::{Params, Queryable, QueryableMock, Record, Result, params, values};

#[test]
fn first_matching_pattern_wins() {
    let mut mock = QueryableMock::new()
        .on("SELECT name", vec![values!["first"]])
        .unwrap()
        .on("SELECT", vec![values!["second"]])
        .unwrap();

    let rows = mock
        .select("SELECT name FROM people", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<String>(0).unwrap(), "first");

    let rows = mock
        .select("SELECT age FROM people", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows[0].get_as::<String>(0).unwrap(), "second");
}

#[test]
fn patterns_match_from_the_start() {
    let mut mock = QueryableMock::new()
        .on("FROM people", vec![values![1]])
        .unwrap();

    let rows = mock
        .select("SELECT * FROM people", params![])
        .fetch_all()
        .unwrap();
    assert!(rows.is_empty());

    let rows = mock.select("FROM people", params![]).fetch_all().unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn patterns_are_full_regexes() {
    let mut mock = QueryableMock::new()
        .on(r"SELECT (name|id) FROM \w+", vec![values![7]])
        .unwrap();

    let rows = mock
        .select("SELECT id FROM people", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows[0].get_as::<i64>(0).unwrap(), 7);

    let rows = mock
        .select("SELECT age FROM people", params![])
        .fetch_all()
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn unmatched_queries_yield_nothing() {
    let mut mock = QueryableMock::new();
    let rows = mock.select("SELECT 1", params![]).fetch_all().unwrap();
    assert!(rows.is_empty());
}

#[test]
fn every_select_replays_the_rows() {
    let mut mock = QueryableMock::new()
        .on("SELECT name", vec![values!["ada"], values!["grace"]])
        .unwrap();

    for _ in 0..2 {
        let rows = mock.select("SELECT name", params![]).fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
    }
}

#[test]
fn a_select_is_consumed_once() {
    let mut mock = QueryableMock::new()
        .on("SELECT name", vec![values!["ada"], values!["grace"]])
        .unwrap();

    let mut select = mock.select("SELECT name", params![]);
    let first: Vec<_> = select.rows().unwrap().collect();
    assert_eq!(first.len(), 2);

    let second: Vec<_> = select.rows().unwrap().collect();
    assert!(second.is_empty());
}

#[test]
fn invalid_patterns_are_config_errors() {
    let err = QueryableMock::new().on("SELECT ((", vec![]).unwrap_err();
    assert!(err.to_string().contains("invalid mock pattern"));
}

#[test]
fn inserts_and_executes_are_accepted_and_ignored() {
    let mut mock = QueryableMock::new()
        .on("SELECT COUNT", vec![values![0]])
        .unwrap();

    mock.insert("people", &[Record::new().set("name", "ada")])
        .unwrap();
    mock.execute("DELETE FROM people", params![]).unwrap();

    // nothing was recorded; selects still serve the canned answer
    let rows = mock
        .select("SELECT COUNT(*) FROM people", params![])
        .fetch_all()
        .unwrap();
    assert_eq!(rows[0].get_as::<i64>(0).unwrap(), 0);
}

#[test]
fn mock_serves_code_written_against_the_trait() {
    fn adult_names(db: &mut dyn Queryable) -> Result<Vec<String>> {
        let mut select = db.select("SELECT name FROM people WHERE age >= 18", Params::None);
        let rows = select.fetch_all()?;
        rows.into_iter().map(|row| row.get_as::<String>(0)).collect()
    }

    let mut mock = QueryableMock::new()
        .on("SELECT name FROM people", vec![values!["ada"], values!["grace"]])
        .unwrap();

    assert_eq!(adult_names(&mut mock).unwrap(), vec!["ada", "grace"]);
}
