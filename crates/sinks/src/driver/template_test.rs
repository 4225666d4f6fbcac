//! Tests for insert template parsing

use super::*;

#[test]
fn test_parse_simple_insert() {
    let template = InsertTemplate::parse("INSERT INTO events (id, name) VALUES (?, ?)").unwrap();
    assert_eq!(template.placeholders(), 2);
    assert_eq!(
        template.render(1),
        "INSERT INTO events (id, name) VALUES (?, ?)"
    );
}

#[test]
fn test_render_many_rows() {
    let template = InsertTemplate::parse("insert into t (a) values (?)").unwrap();
    assert_eq!(template.render(3), "insert into t (a) values (?), (?), (?)");
}

#[test]
fn test_render_zero_rows_is_head_only() {
    let template = InsertTemplate::parse("INSERT INTO t (a) VALUES (?)").unwrap();
    assert_eq!(template.render(0), "INSERT INTO t (a) VALUES ");
}

#[test]
fn test_parse_nested_functions_and_literals() {
    let template = InsertTemplate::parse(
        "INSERT INTO t (a, b, c, d) VALUES (?, toDateTime(?), 'what??', concat(?, ')'))",
    )
    .unwrap();
    assert_eq!(template.placeholders(), 3);
}

#[test]
fn test_parse_trailing_semicolon_and_whitespace() {
    let template = InsertTemplate::parse("  INSERT INTO t (a) VALUES(?) ;\n").unwrap();
    assert_eq!(template.placeholders(), 1);
    assert_eq!(template.render(2), "INSERT INTO t (a) VALUES (?), (?)");
}

#[test]
fn test_parse_ignores_values_in_identifiers() {
    let template =
        InsertTemplate::parse("INSERT INTO t (values_count, `values`) VALUES (?, ?)").unwrap();
    assert_eq!(template.placeholders(), 2);
}

#[test]
fn test_parse_missing_values() {
    let err = InsertTemplate::parse("SELECT 1").unwrap_err();
    assert!(matches!(err, DriverError::InvalidTemplate(_)));
    assert!(err.to_string().contains("missing VALUES"));
}

#[test]
fn test_parse_missing_group() {
    let err = InsertTemplate::parse("INSERT INTO t (a) VALUES ?").unwrap_err();
    assert!(err.to_string().contains("expected '('"));
}

#[test]
fn test_parse_unbalanced_group() {
    let err = InsertTemplate::parse("INSERT INTO t (a) VALUES (?, f(?)").unwrap_err();
    assert!(err.to_string().contains("unbalanced"));
}

#[test]
fn test_parse_rejects_multiple_groups() {
    let err = InsertTemplate::parse("INSERT INTO t (a) VALUES (?), (?)").unwrap_err();
    assert!(err.to_string().contains("exactly one VALUES group"));
}

#[test]
fn test_parse_rejects_group_without_placeholders() {
    let err = InsertTemplate::parse("INSERT INTO t (a) VALUES (1)").unwrap_err();
    assert!(err.to_string().contains("no placeholders"));
}

#[test]
fn test_parse_rejects_placeholders_before_values() {
    let err = InsertTemplate::parse("INSERT INTO ? (a) VALUES (?)").unwrap_err();
    assert!(err.to_string().contains("only allowed inside"));
}

#[test]
fn test_parse_rejects_lone_placeholder_in_literal() {
    let err = InsertTemplate::parse("INSERT INTO t (a, b) VALUES (?, 'why?')").unwrap_err();
    assert!(matches!(err, DriverError::InvalidTemplate(_)));
    assert!(err.to_string().contains("quoted literal"));

    let err = InsertTemplate::parse("INSERT INTO `t?` (a) VALUES (?)").unwrap_err();
    assert!(err.to_string().contains("quoted literal"));
}

#[test]
fn test_parse_double_placeholder_is_literal() {
    let template = InsertTemplate::parse("INSERT INTO t (a, b, c) VALUES (?, 'why??', ?? , ?)").unwrap();
    assert_eq!(template.placeholders(), 2);
    assert_eq!(template.render(1), "INSERT INTO t (a, b, c) VALUES (?, 'why??', ?? , ?)");
}

#[test]
fn test_parse_rejects_fields_placeholder() {
    let err = InsertTemplate::parse("INSERT INTO t (?fields) VALUES (?)").unwrap_err();
    assert!(err.to_string().contains("?fields"));

    let err = InsertTemplate::parse("INSERT INTO t (a) VALUES (?fields)").unwrap_err();
    assert!(err.to_string().contains("?fields"));
}
