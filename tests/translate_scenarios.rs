use docbridge::{
    Dialect, LiteralValue, Operation, OperationKind, StatementForm, TranslateError, Translator,
    TranslatorConfig,
};
use serde_json::json;

fn translate(statement: &str) -> docbridge::Result<serde_json::Value> {
    Translator::new().translate(statement).map(|op| op.to_document())
}

#[test]
fn test_insert_node_literal() {
    assert_eq!(
        translate(r#"insert node {"name":"John","age":30} into collection("users")"#).unwrap(),
        json!({
            "collection": "users",
            "operation": "insert",
            "document": {"name": "John", "age": 30}
        })
    );
}

#[test]
fn test_shorthand_find() {
    assert_eq!(
        translate(r#"db.collection("users").find({"age": 18})"#).unwrap(),
        json!({"collection": "users", "operation": "find", "filter": {"age": 18}})
    );
}

#[test]
fn test_for_where_order_return() {
    let statement =
        r#"for $u in collection("users") where $u/age > 18 order by $u/name descending return $u/name"#;
    let op = Translator::new().translate(statement).unwrap();

    assert_eq!(
        serde_json::to_string(&op).unwrap(),
        r#"{"collection":"users","operation":"find","filter":{"age":{"$gt":18}},"sort":{"name":-1},"projection":{"name":1,"_id":0}}"#
    );
}

#[test]
fn test_shorthand_update_is_not_double_wrapped() {
    assert_eq!(
        translate(r#"db.collection("users").update({"name": "John"}, {"$set": {"age": 31}})"#).unwrap(),
        json!({
            "collection": "users",
            "operation": "updateMany",
            "filter": {"name": "John"},
            "update": {"$set": {"age": 31}}
        })
    );
}

#[test]
fn test_delete_node_with_keyword_equality() {
    assert_eq!(
        translate(r#"delete node $u where $u/age eq 18 in collection("users")"#).unwrap(),
        json!({"collection": "users", "operation": "deleteMany", "filter": {"age": 18}})
    );
}

#[test]
fn test_select_without_relational_dialect() {
    let err = Translator::new().translate("SELECT name FROM users").unwrap_err();
    assert!(matches!(err, TranslateError::UnsupportedStatement(_)));
}

#[test]
fn test_select_with_relational_dialect() {
    let translator = Translator::with_config(TranslatorConfig::default().with_relational(true));
    let op = translator.translate("SELECT name FROM users").unwrap();
    assert_eq!(
        op.to_document(),
        json!({"collection": "users", "operation": "find", "filter": {}, "projection": {"name": 1, "_id": 0}})
    );
    assert_eq!(translator.route("SELECT name FROM users").unwrap().dialect, Dialect::Sql);
}

#[test]
fn test_filter_has_one_key_per_fragment() {
    let statement = r#"for $u in collection("users")
        where $u/age >= 21 and $u/city = "Paris" and starts-with($u/name, "A") and exists($u/email)
        return $u"#;
    let op = Translator::new().translate(statement).unwrap();

    let filter = op.filter().unwrap();
    assert_eq!(filter.len(), 4);
    assert_eq!(filter.get("age"), Some(&json!({"$gte": 21})));
    assert_eq!(filter.get("city"), Some(&json!("Paris")));
    assert_eq!(filter.get("name"), Some(&json!({"$regex": "^A", "$options": "i"})));
    assert_eq!(filter.get("email"), Some(&json!({"$exists": true})));
}

#[test]
fn test_absent_clauses() {
    let op = Translator::new()
        .translate(r#"for $u in collection("users") return $u"#)
        .unwrap();
    match op {
        Operation::Find { filter, sort, projection, .. } => {
            assert!(filter.is_empty());
            assert!(sort.is_none());
            assert!(projection.is_none());
        }
        other => panic!("expected a find, got {:?}", other),
    }
}

#[test]
fn test_coercion_is_idempotent() {
    for token in ["\"Paris\"", "'it\"s'", "42", "-3", "2.50", "TRUE", "none", "fn:now()", "  plain  "] {
        let first = LiteralValue::resolve(token);
        let second = LiteralValue::resolve(&first.to_string());
        assert_eq!(first, second, "token {}", token);
    }
}

#[test]
fn test_markup_insert_with_document_uri() {
    let translator = Translator::with_config(TranslatorConfig::default().with_default_collection("books"));
    let op = translator
        .translate(r#"xdmp:document-insert("/books/1.xml", <book id="1"><author>A</author><author>B</author></book>)"#)
        .unwrap();

    assert_eq!(op.kind(), OperationKind::Insert);
    assert_eq!(
        op.to_document(),
        json!({
            "collection": "books",
            "operation": "insert",
            "document": {"@id": "1", "author": ["A", "B"], "_id": "/books/1.xml"}
        })
    );
}

#[test]
fn test_error_kinds() {
    let cases = [
        ("hello", "UnsupportedStatement"),
        (r#"for $u in collection("u") where $u/a > 1 or $u/b < 2 return $u"#, "UnsupportedCondition"),
        (r#"db.collection("u").insert({"a": )"#, "MalformedLiteral"),
        (r#"insert node <a><b></a> into collection("u")"#, "MalformedMarkup"),
        (r#"delete node u where $u/a = 1 in collection("u")"#, "MalformedPath"),
        (r#"replace node $u/a with 1 where $u/b = 2"#, "MissingCollection"),
    ];

    for (statement, kind) in cases {
        let err = Translator::new().translate(statement).unwrap_err();
        assert_eq!(err.kind(), kind, "{}", statement);
    }
}

#[test]
fn test_route_forms() {
    let translator = Translator::new();
    let route = translator.route(r#"update value $u/age with 3 in collection("u")"#).unwrap();
    assert_eq!(route.form, StatementForm::ReplaceValue);
    assert_eq!(route.kind, OperationKind::Update);
    assert_eq!(route.dialect, Dialect::XQuery);
}

#[test]
fn test_bare_variable_replacement_goes_under_set() {
    assert_eq!(
        translate(r#"update value $u with 31 in collection("users")"#).unwrap(),
        json!({"collection": "users", "operation": "updateMany", "filter": {}, "update": {"$set": 31}})
    );
    assert_eq!(
        translate(r#"replace node $u with "x" where $u/name = "Ann" in collection("users")"#).unwrap(),
        json!({
            "collection": "users",
            "operation": "updateMany",
            "filter": {"name": "Ann"},
            "update": {"$set": "x"}
        })
    );
}

#[test]
fn test_markup_payloads_containing_clause_keywords() {
    assert_eq!(
        translate(r#"replace node $u/bio with <bio>lives where it rains</bio> in collection("users")"#).unwrap(),
        json!({
            "collection": "users",
            "operation": "updateMany",
            "filter": {},
            "update": {"$set": {"bio": "lives where it rains"}}
        })
    );
    assert_eq!(
        translate(r#"insert node <note>copy into collection("x") now</note> into collection("users")"#).unwrap(),
        json!({
            "collection": "users",
            "operation": "insert",
            "document": {"data": "copy into collection(\"x\") now"}
        })
    );
}

#[test]
fn test_overflowing_number_is_never_null() {
    let digits = "9".repeat(330);
    let statement = format!(r#"for $u in collection("users") where $u/n = {} return $u"#, digits);
    let op = Translator::new().translate(&statement).unwrap();
    assert_eq!(op.filter().unwrap().get("n"), Some(&json!(digits)));
}
