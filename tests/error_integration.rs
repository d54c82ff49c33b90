//! Integration tests for error reporting
//!
//! These tests cover error kinds, positions, snippets and formatting of parse
//! failures.

use precedent::engine::error::ErrorBuilder;
use precedent::engine::source_location::SNIPPET_MARKER;
use precedent::prelude::*;

fn arithmetic() -> Parser {
    create_parser([
        NodeDefinition::new("add", 1)
            .pattern([lhs_typed("number").named("left"), token("+"), rhs_typed("number").named("right")])
            .returns("number"),
        NodeDefinition::new("mul", 2)
            .pattern([lhs_typed("number").named("left"), token("*"), rhs_typed("number").named("right")])
            .returns("number"),
    ])
    .unwrap()
}

fn parse_err(input: &str) -> RichError {
    arithmetic().parse_ast(input, &Context::new()).unwrap_err()
}

// ============================================================================
// Error Kind Tests
// ============================================================================

#[test]
fn test_dangling_operator_reports_end_of_input() {
    let err = parse_err("1 + ");
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.message, "unexpected end of input");
    assert_eq!(err.offset(), 4);
    assert_eq!((err.position.line, err.position.column), (1, 5));
    assert_eq!(err.expected(), Some("expression"));
    assert_eq!(err.to_string(), "Error at line 1, column 5: unexpected end of input");
    assert!(err.snippet.ends_with(SNIPPET_MARKER));
}

#[test]
fn test_no_match_on_later_line() {
    let err = parse_err("1 +\n  * 2");
    assert_eq!(err.kind, ErrorKind::NoMatch);
    assert_eq!(err.offset(), 6);
    assert_eq!((err.position.line, err.position.column), (2, 3));
    assert!(err.message.contains("near '* 2'"), "message: {}", err.message);
    assert!(err.snippet.contains("\\n  →* 2"), "snippet: {}", err.snippet);
}

#[test]
fn test_type_mismatch_points_at_operand() {
    let err = parse_err("1 + 'a'");
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.offset(), 4);
    assert_eq!(err.expected(), Some("number"));
    assert_eq!(err.actual(), Some("string"));
    assert_eq!(err.message, "type mismatch: expected number but found string");
}

#[test]
fn test_leftover_input_is_unexpected_token() {
    let err = parse_err("1 2");
    assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    assert_eq!(err.offset(), 2);
    assert_eq!(err.expected(), Some("end of input"));
}

#[test]
fn test_hard_failures() {
    let err = parse_err("1 + 'abc");
    assert_eq!(err.kind, ErrorKind::UnterminatedString);
    assert_eq!(err.offset(), 4);

    let err = parse_err("2 * (1 + 2");
    assert_eq!(err.kind, ErrorKind::UnclosedParen);
    assert_eq!(err.offset(), 4);

    assert_eq!(parse_err("").kind, ErrorKind::EmptyInput);
    assert_eq!(parse_err("   \n ").kind, ErrorKind::EmptyInput);
}

#[test]
fn test_trailing_whitespace_is_accepted() {
    assert!(arithmetic().parse_ast("1 + 2 \n\t", &Context::new()).is_ok());
}

#[test]
fn test_recursion_limit_instead_of_overflow() {
    // Reaching the default depth takes more stack than a test thread's default
    let err = std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(|| parse_err(&format!("{}1{}", "(".repeat(5000), ")".repeat(5000))))
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);

    let shallow = Parser::with_config(
        arithmetic().nodes().cloned(),
        ParserConfig::new().with_max_recursion_depth(64),
    )
    .unwrap();
    let input = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    let err = shallow.parse_ast(&input, &Context::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);

    let unlimited = Parser::with_config(
        arithmetic().nodes().cloned(),
        ParserConfig::new().with_max_recursion_depth(0),
    )
    .unwrap();
    assert!(unlimited.parse_ast("((((((1))))))", &Context::new()).is_ok());
}

// ============================================================================
// Formatting Tests
// ============================================================================

#[test]
fn test_format_with_source() {
    let err = parse_err("1 + 'a'");
    let formatted = err.format_with_source();
    assert!(formatted.starts_with("Error at line 1, column 5: type mismatch"));
    assert!(formatted.contains("\n1 + 'a'\n    ^\n"));
    assert!(formatted.contains("  expected: number\n"));
    assert!(formatted.contains("  actual: string\n"));
}

#[test]
fn test_error_serializes_kind_as_snake_case() {
    let err = parse_err("1 + ");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["kind"], "no_match");
    assert_eq!(json["position"]["column"], 5);

    let back: RichError = serde_json::from_value(json).unwrap();
    assert_eq!(back, err);
}

#[test]
fn test_error_builder_defaults() {
    let err = ErrorBuilder::new(ErrorKind::UnclosedParen, "(1").build();
    assert_eq!(err.message, "unclosed paren");
    assert_eq!(err.offset(), 0);
    assert!(err.context.is_none());
}

#[test]
fn test_errors_are_values_in_batches() {
    let parser = arithmetic();
    let results = parse_batch(&parser, &["1 + 2", "1 +", "'x"], &Context::new());
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind, ErrorKind::NoMatch);
    assert_eq!(results[2].as_ref().unwrap_err().kind, ErrorKind::UnterminatedString);
}
