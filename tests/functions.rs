use indoc::indoc;
use pretty_assertions::assert_eq;
use seqsql::*;
use std::{sync::Arc, thread};

mod helpers;
use helpers::*;

fn scalar(conn: &mut QueryBridge, sql: &str) -> Result<Value> {
    let rows = conn.run(sql)?;
    assert_eq!(rows.len(), 1, "{}", sql);
    Ok(rows[0][0].clone())
}

#[test]
fn gc_content() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run("SELECT gc_content('ATCG') as value")?;
    assert_eq!(
        rows,
        vec![Row::new(vec![("value".to_owned(), Value::Float(0.5))])]
    );
    assert_eq!(conn.state(), BridgeState::Done);
    Ok(())
}

#[test]
fn greet() -> Result<()> {
    let mut conn = setup()?;
    assert_eq!(scalar(&mut conn, "SELECT greet('Sam')")?, Value::from("Hello Sam"));
    assert_eq!(
        scalar(&mut conn, "SELECT greeting_version()")?,
        Value::from(env!("CARGO_PKG_VERSION"))
    );
    Ok(())
}

#[test]
fn sequence_functions() -> Result<()> {
    let mut conn = setup()?;
    let cases = [
        ("SELECT complement('ATCG')", Value::from("TAGC")),
        ("SELECT reverse_complement('ATCG')", Value::from("CGAT")),
        ("SELECT transcribe('ATCG')", Value::from("AUCG")),
        ("SELECT reverse_transcribe('AUCG')", Value::from("ATCG")),
        ("SELECT translate_dna_to_aa('ATGGCC')", Value::from("MA")),
        ("SELECT gc_content('')", Value::Float(0.0)),
        ("SELECT GC_CONTENT('GGCC')", Value::Float(1.0)),
    ];
    for (sql, expected) in cases {
        assert_eq!(scalar(&mut conn, sql)?, expected, "{}", sql);
    }
    Ok(())
}

#[test]
fn sam_flags() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run(indoc! {"
        SELECT column1 AS flag,
               is_segmented(column1) AS paired,
               is_reverse_complemented(column1) AS reverse,
               is_duplicate(column1) AS duplicate
        FROM (VALUES (99), (1040), (NULL))
    "})?;
    let ret: Vec<Vec<Value>> = rows.into_iter().map(Row::into_values).collect();
    let int = Value::Integer;
    assert_eq!(
        ret,
        vec![
            vec![int(99), int(1), int(0), int(0)],
            vec![int(1040), int(0), int(1), int(1)],
            vec![Value::Null, Value::Null, Value::Null, Value::Null],
        ]
    );
    assert!(matches!(
        conn.run("SELECT is_unmapped('4')"),
        Err(Error::TypeMismatch { position: 1, .. })
    ));
    Ok(())
}

#[test]
fn nested_calls() -> Result<()> {
    let mut conn = setup()?;
    assert_eq!(
        scalar(&mut conn, "SELECT reverse_transcribe(transcribe(complement('ATCG')))")?,
        Value::from("TAGC")
    );
    Ok(())
}

#[test]
fn row_order() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run(indoc! {"
        CREATE TABLE seqs(id INTEGER PRIMARY KEY, seq TEXT);
        INSERT INTO seqs(seq) VALUES ('ATAT'), ('GGCC'), ('ATCG'), ('GATT');
        SELECT id, seq, gc_content(seq) AS gc FROM seqs ORDER BY id;
    "})?;
    let gc: Vec<Value> = rows.iter().map(|r| r.get("gc").cloned().unwrap()).collect();
    assert_eq!(
        gc,
        vec![
            Value::Float(0.0),
            Value::Float(1.0),
            Value::Float(0.5),
            Value::Float(0.25)
        ]
    );
    let cols: Vec<&str> = rows[0].iter().map(|(n, _)| n).collect();
    assert_eq!(cols, vec!["id", "seq", "gc"]);
    Ok(())
}

#[test]
fn errors_keep_their_type() -> Result<()> {
    let mut conn = setup()?;
    match conn.run("SELECT gc_content('AT', 'CG')") {
        Err(Error::Arity {
            name,
            expected,
            actual,
        }) => assert_eq!((name.as_str(), expected, actual), ("gc_content", 1, 2)),
        x => panic!("expected Arity, got {:?}", x),
    }
    match conn.run("SELECT gc_content(42)") {
        Err(Error::TypeMismatch {
            position,
            expected,
            actual,
            ..
        }) => assert_eq!((position, expected, actual), (1, Kind::Text, ValueType::Integer)),
        x => panic!("expected TypeMismatch, got {:?}", x),
    }
    match conn.run("SELECT complement('ATXG')") {
        Err(Error::Evaluation { name, source }) => {
            assert_eq!(name, "complement");
            assert_eq!(source.to_string(), "invalid character in sequence: X");
        }
        x => panic!("expected Evaluation, got {:?}", x),
    }
    assert!(matches!(
        conn.run("SELECT translate_dna_to_aa('ATGG')"),
        Err(Error::Evaluation { .. })
    ));
    assert_eq!(conn.state(), BridgeState::Failed);
    // The connection is still usable afterwards.
    assert_eq!(scalar(&mut conn, "SELECT gc_content('GC')")?, Value::Float(1.0));
    Ok(())
}

#[test]
fn engine_errors() -> Result<()> {
    let mut conn = setup()?;
    match conn.run("SELEC gc_content('ATCG')") {
        Err(Error::Query { message, .. }) => assert!(message.contains("syntax error"), "{}", message),
        x => panic!("expected Query, got {:?}", x),
    }
    assert!(matches!(
        conn.run("SELECT not_registered('x')"),
        Err(Error::Query { .. })
    ));
    Ok(())
}

#[test]
fn null_rows_give_null() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run(indoc! {"
        CREATE TABLE s(seq TEXT);
        INSERT INTO s VALUES ('ATCG'), (NULL), ('GGCC');
        SELECT gc_content(seq) AS gc, complement(seq) AS c FROM s ORDER BY rowid;
    "})?;
    let ret: Vec<Vec<Value>> = rows.into_iter().map(Row::into_values).collect();
    assert_eq!(
        ret,
        vec![
            vec![Value::Float(0.5), Value::from("TAGC")],
            vec![Value::Null, Value::Null],
            vec![Value::Float(1.0), Value::from("CCGG")],
        ]
    );
    // Evaluating directly stays strict.
    assert!(matches!(
        conn.registry().evaluator().evaluate("gc_content", &[Value::Null]),
        Err(Error::TypeMismatch { position: 1, .. })
    ));
    Ok(())
}

#[test]
fn invalid_text_arguments() -> Result<()> {
    let mut conn = setup()?;
    let ret = conn.run("SELECT gc_content(CAST(x'ff' AS TEXT))");
    assert!(matches!(ret, Err(Error::Utf8Error(_))), "{:?}", ret);
    assert_eq!(conn.state(), BridgeState::Failed);
    Ok(())
}

#[test]
fn run_file() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run_file(fixture("query.sql"), &[("extra", "ATCG")])?;
    let ret: Vec<(Value, Value)> = rows
        .into_iter()
        .map(|r| {
            let mut v = r.into_values().into_iter();
            (v.next().unwrap(), v.next().unwrap())
        })
        .collect();
    assert_eq!(
        ret,
        vec![
            (Value::from("b"), Value::Float(1.0)),
            (Value::from("c"), Value::Float(0.5)),
            (Value::from("a"), Value::Float(0.0)),
        ]
    );
    assert!(matches!(
        conn.run_file(fixture("query.sql"), &[("other", "ATCG")]),
        Err(Error::Template(k)) if k == "extra"
    ));
    // Without vars the file runs as written, so '${extra}' reaches gc_content.
    match conn.run_file(fixture("query.sql"), &[]) {
        Err(Error::Evaluation { name, source }) => {
            assert_eq!(name, "gc_content");
            assert!(matches!(*source, Error::InvalidInput(_)), "{:?}", source);
        }
        x => panic!("expected Evaluation, got {:?}", x),
    }
    assert!(matches!(
        conn.run_file(fixture("missing.sql"), &[]),
        Err(Error::Io(_))
    ));
    Ok(())
}

#[test]
fn run_file_placeholders() -> Result<()> {
    let mut conn = setup()?;
    let rows = conn.run_file(fixture("placeholders.sql"), &[("seq", "GGCA"), ("name", "x")])?;
    assert_eq!(
        rows[0].clone().into_values(),
        vec![Value::from("x"), Value::Float(0.75), Value::from("$seq")]
    );
    assert!(matches!(
        conn.run_file(fixture("placeholders.sql"), &[("seq", "GGCA")]),
        Err(Error::Template(k)) if k == "name"
    ));
    Ok(())
}

#[test]
fn concurrent_connections() -> Result<()> {
    let host = Arc::new(Host::new(HostOptions::default())?);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let host = host.clone();
            thread::spawn(move || -> Result<Vec<Value>> {
                let mut conn = host.connect()?;
                let seq = "GC".repeat(i + 1) + &"AT".repeat(3 - i);
                (0..50)
                    .map(|_| scalar(&mut conn, &format!("SELECT gc_content('{}')", seq)))
                    .collect()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let values = h.join().expect("thread panicked")?;
        let expected = Value::Float((i + 1) as f64 / 4.0);
        assert!(values.iter().all(|v| *v == expected), "{}: {:?}", i, values);
    }
    Ok(())
}

#[test]
fn evaluate_directly() -> Result<()> {
    let host = Host::new(HostOptions::default())?;
    let eval = Evaluator::new(host.registry());
    let first = eval.evaluate("gc_content", &["ATCG".into()])?;
    assert_eq!(first, Value::Float(0.5));
    assert_eq!(eval.evaluate("gc_content", &["ATCG".into()])?, first);
    assert_eq!(eval.evaluate("greet", &["Sam".into()])?, Value::from("Hello Sam"));
    assert!(matches!(eval.evaluate("nope", &[]), Err(Error::NotFound(_))));
    Ok(())
}
