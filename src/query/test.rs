#![cfg(test)]

use crate::test_helpers::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn basic() -> Result<()> {
    let h = TestHelpers::new();
    h.db.execute(
        "CREATE TABLE tbl(a TEXT, b, c); \
         INSERT INTO tbl VALUES ('a1', 1, 1.5), ('a2', NULL, x'00');",
    )?;
    let mut stmt = h.db.prepare("SELECT a AS a_alias, b, c FROM tbl ORDER BY a")?;
    assert_eq!(stmt.column_count(), 3);
    assert_eq!(stmt.column_name(0)?, "a_alias");
    let mut rows = stmt.query()?;
    assert_eq!(rows.columns(), &["a_alias", "b", "c"]);
    let ret: Vec<Row> = rows.by_ref().collect()?;
    assert_eq!(
        ret,
        vec![
            Row::new(vec![
                ("a_alias".to_owned(), Value::from("a1")),
                ("b".to_owned(), Value::Integer(1)),
                ("c".to_owned(), Value::Float(1.5)),
            ]),
            Row::new(vec![
                ("a_alias".to_owned(), Value::from("a2")),
                ("b".to_owned(), Value::Null),
                ("c".to_owned(), Value::Blob(vec![0])),
            ]),
        ]
    );
    // A finished result set stays finished.
    assert_eq!(rows.next()?, None);
    Ok(())
}

#[test]
fn requery() -> Result<()> {
    let h = TestHelpers::new();
    let mut stmt = h.db.prepare("SELECT 1 UNION ALL SELECT 2")?;
    let first: Vec<Row> = stmt.query()?.collect()?;
    let second: Vec<Row> = stmt.query()?.collect()?;
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn row_access() {
    let row = Row::new(vec![
        ("value".to_owned(), Value::Float(0.5)),
        ("name".to_owned(), Value::from("Sam")),
    ]);
    assert_eq!(row.len(), 2);
    assert_eq!(row.get("name"), Some(&Value::from("Sam")));
    assert_eq!(row.get("missing"), None);
    assert_eq!(row[0], Value::Float(0.5));
    assert_eq!(
        row.iter().map(|(n, _)| n).collect::<Vec<_>>(),
        vec!["value", "name"]
    );
    assert_eq!(
        row.into_values(),
        vec![Value::Float(0.5), Value::from("Sam")]
    );
}

#[test]
fn sql() -> Result<()> {
    let h = TestHelpers::new();
    let (stmt, rest) = h.db.prepare_next("SELECT 1; SELECT 2")?;
    assert_eq!(stmt.expect("no statement").sql()?, "SELECT 1;");
    assert_eq!(rest, " SELECT 2");
    let (stmt, _) = h.db.prepare_next("  -- only a comment")?;
    assert!(stmt.is_none());
    Ok(())
}

#[test]
fn errors() {
    let h = TestHelpers::new();
    match h.db.prepare("SELEC 1") {
        Err(Error::Query { code, message }) => {
            assert_eq!(code, ffi::SQLITE_ERROR);
            assert!(message.contains("syntax error"), "{}", message);
        }
        x => panic!("expected Query, got {:?}", x),
    }
    assert!(matches!(
        h.db.prepare("   "),
        Err(Error::Query { code, .. }) if code == ffi::SQLITE_MISUSE
    ));
    // Statements before the failing one have already run.
    let ret = h.db.execute("CREATE TABLE t(x); SELECT * FROM nope;");
    assert!(ret.is_err());
    assert!(h.db.prepare("SELECT * FROM t").is_ok());
}

#[test]
fn for_each_statement() -> Result<()> {
    let h = TestHelpers::new();
    let mut seen = vec![];
    h.db.for_each_statement("SELECT 1; SELECT 'two';  ", |stmt| {
        seen.push(stmt.sql()?.to_owned());
        Ok(())
    })?;
    assert_eq!(seen, vec!["SELECT 1;", "SELECT 'two';"]);
    Ok(())
}
