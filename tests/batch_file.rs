use std::fs::File;
use std::io::{BufReader, Write};

use docbridge::{BatchDriver, BatchSummary, TranslateError, Translator, TranslatorConfig};
use tempfile::NamedTempFile;

fn statements_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_batch_from_file() {
    let file = statements_file(&[
        "-- users collection",
        r#"insert node <user><name>Ann</name></user> into collection("users")"#,
        r#"db.collection("users").find({"name": "Ann"}).limit(1)"#,
        "",
        r#"for $u in collection("users") where $u/age gt 18 return $u"#,
        "# end",
    ]);

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let mut lines = Vec::new();
    let summary = BatchDriver::default()
        .run(reader, |outcome| {
            lines.push(serde_json::to_string(outcome.result.as_ref().unwrap()).unwrap());
            Ok(())
        })
        .unwrap();

    assert_eq!(summary, BatchSummary { translated: 3, failed: 0, skipped: 3 });
    assert_eq!(
        lines,
        vec![
            r#"{"collection":"users","operation":"insert","document":{"name":"Ann"}}"#.to_string(),
            r#"{"collection":"users","operation":"find","filter":{"name":"Ann"},"limit":1}"#.to_string(),
            r#"{"collection":"users","operation":"find","filter":{"age":{"$gt":18}}}"#.to_string(),
        ]
    );
}

#[test]
fn test_batch_reports_each_failure() {
    let file = statements_file(&[
        "SELECT * FROM users",
        "UPDATE users SET age = 1 WHERE name = 'Ann'",
        r#"db.collection("users").remove({"age": {"$lt": 0}})"#,
    ]);

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let mut failures = Vec::new();
    let summary = BatchDriver::default()
        .run(reader, |outcome| {
            if let Err(e) = outcome.result {
                failures.push((outcome.line, e));
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(summary.translated, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(failures[0].0, 1);
    assert!(matches!(failures[1].1, TranslateError::UnsupportedStatement(_)));
}

#[test]
fn test_batch_with_relational_dialect() {
    let file = statements_file(&[
        "SELECT * FROM users",
        "UPDATE users SET age = 1 WHERE name = 'Ann'",
    ]);

    let translator = Translator::with_config(TranslatorConfig::default().with_relational(true));
    let reader = BufReader::new(File::open(file.path()).unwrap());
    let summary = BatchDriver::new(translator).run(reader, |_| Ok(())).unwrap();

    assert_eq!(summary, BatchSummary { translated: 2, failed: 0, skipped: 0 });
}
