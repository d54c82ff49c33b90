//! Integration tests for grammar assembly and parsing
//!
//! These tests build small languages from node definitions and check the
//! shape of the trees they produce.

use precedent::engine::grammar_analysis::WarningKind;
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

fn equality() -> Parser {
    create_parser([
        NodeDefinition::new("eq_str", 1)
            .pattern([lhs_typed("string").named("left"), token("=="), rhs_typed("string").named("right")])
            .returns("boolean"),
        NodeDefinition::new("eq_num", 1)
            .pattern([lhs_typed("number").named("left"), token("=="), rhs_typed("number").named("right")])
            .returns("boolean"),
    ])
    .unwrap()
}

fn sexpr(parser: &Parser, input: &str) -> String {
    parser.parse_ast(input, &Context::new()).unwrap().to_sexpr()
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
fn test_tighter_operator_nests_inside() {
    let parser = arithmetic();
    assert_eq!(sexpr(&parser, "1+2*3"), "add(1, mul(2, 3))");
    assert_eq!(sexpr(&parser, "2+1*3"), "add(2, mul(1, 3))");
    assert_eq!(sexpr(&parser, "2*3+1"), "add(mul(2, 3), 1)");
}

#[test]
fn test_same_level_is_right_associative() {
    let parser = arithmetic();
    assert_eq!(sexpr(&parser, "1+2+3"), "add(1, add(2, 3))");
    assert_eq!(sexpr(&parser, "1*2*3*4"), "mul(1, mul(2, mul(3, 4)))");
}

#[test]
fn test_group_resets_precedence() {
    let parser = arithmetic();
    assert_eq!(sexpr(&parser, "(1+2)*3"), "mul(group(add(1, 2)), 3)");
    assert_eq!(sexpr(&parser, "((1))"), "group(group(1))");

    let ast = parser.parse_ast("(1+2)*3", &Context::new()).unwrap();
    let group = ast.capture("left").unwrap();
    assert_eq!(group.output, TypeTag::Number);
    assert_eq!(group.span, 0..5);
}

#[test]
fn test_whitespace_between_elements() {
    let parser = arithmetic();
    assert_eq!(sexpr(&parser, " 1 \n+\t2 * 3 "), "add(1, mul(2, 3))");
}

#[test]
fn test_precedence_numbers_only_order_levels() {
    let parser = create_parser([
        NodeDefinition::new("mul", 700)
            .pattern([lhs().named("left"), token("*"), rhs().named("right")]),
        NodeDefinition::new("add", -3)
            .pattern([lhs().named("left"), token("+"), rhs().named("right")]),
    ])
    .unwrap();
    assert_eq!(sexpr(&parser, "1+2*3"), "add(1, mul(2, 3))");
    assert_eq!(parser.grammar().level_of("add"), Some(0));
    assert_eq!(parser.grammar().level_of("mul"), Some(1));
    assert_eq!(parser.grammar().builtin_level(), 2);
}

// ============================================================================
// Overload Tests
// ============================================================================

#[test]
fn test_overload_selected_by_operand_type() {
    let parser = equality();
    let ctx = Context::new();

    let strings = parser.parse_ast(r#""a"=="b""#, &ctx).unwrap();
    assert_eq!(strings.name, "eq_str");
    assert_eq!(strings.output, TypeTag::Boolean);

    let numbers = parser.parse_ast("1==2", &ctx).unwrap();
    assert_eq!(numbers.name, "eq_num");
}

#[test]
fn test_overload_uses_declared_identifier_types() {
    let parser = equality();
    let ctx = Context::from_descriptors([("name", "string"), ("age", "number")]).unwrap();

    assert_eq!(parser.parse_ast("name == 'bob'", &ctx).unwrap().name, "eq_str");
    assert_eq!(parser.parse_ast("age == 3", &ctx).unwrap().name, "eq_num");
}

#[test]
fn test_undeclared_identifier_satisfies_any_constraint() {
    let parser = equality();
    let ast = parser.parse_ast("x == 'y'", &Context::new()).unwrap();
    assert_eq!(ast.name, "eq_str");
    assert_eq!(ast.capture("left").unwrap().output, TypeTag::Unknown);
}

#[test]
fn test_union_result_type() {
    let parser = create_parser([
        NodeDefinition::new("choose", 0)
            .pattern([lhs().named("cond"), token("?"), full().named("then"), token(":"), full().named("otherwise")])
            .union_of(["then", "otherwise"]),
    ])
    .unwrap();

    let ast = parser.parse_ast("true ? 1 : 'no'", &Context::new()).unwrap();
    assert_eq!(ast.output.to_string(), "number | string");

    let ast = parser.parse_ast("true ? 1 : 2", &Context::new()).unwrap();
    assert_eq!(ast.output, TypeTag::Number);
}

// ============================================================================
// Atom Tests
// ============================================================================

#[test]
fn test_keywords_match_whole_words_only() {
    let parser = arithmetic();
    let ctx = Context::new();

    for (input, name) in [
        ("null", "null"),
        ("true", "boolean"),
        ("false", "boolean"),
        ("undefined", "undefined"),
    ] {
        let ast = parser.parse_ast(input, &ctx).unwrap();
        assert_eq!(ast.name, name, "input {:?}", input);
        assert!(ast.as_literal().is_some());
    }

    for input in ["nullable", "trueName", "undefined123", "truenull", "_false"] {
        let ast = parser.parse_ast(input, &ctx).unwrap();
        assert_eq!(ast.as_identifier(), Some(input));
    }
}

#[test]
fn test_string_literals_decode_escapes() {
    let parser = arithmetic();
    let ast = parser.parse_ast(r#"'it\'s\tok'"#, &Context::new()).unwrap();
    let literal = ast.as_literal().unwrap();
    assert_eq!(literal.raw, r#"'it\'s\tok'"#);
    assert_eq!(literal.value, Value::string("it's\tok"));
}

#[test]
fn test_literal_pattern_elements() {
    let parser = create_parser([
        NodeDefinition::new("flag", 0)
            .pattern([token("set"), ident().named("name"), token("to"), boolean().named("value")])
            .returns("boolean"),
        NodeDefinition::new("label", 0)
            .pattern([token("label"), string_with(['`']).named("text")])
            .returns("string"),
    ])
    .unwrap();
    let ctx = Context::new();

    let ast = parser.parse_ast("set debug to true", &ctx).unwrap();
    assert_eq!(ast.name, "flag");
    assert_eq!(ast.capture("name").unwrap().as_identifier(), Some("debug"));
    assert_eq!(ast.capture("value").unwrap().as_literal().unwrap().value, Value::bool(true));

    let ast = parser.parse_ast("label `hi`", &ctx).unwrap();
    assert_eq!(ast.capture("text").unwrap().as_literal().unwrap().value, Value::string("hi"));

    // "setting" is an identifier, not the "set" token
    assert_eq!(parser.parse_ast("setting", &ctx).unwrap().as_identifier(), Some("setting"));
    // a keyword is not an identifier element
    assert!(parser.parse_ast("set null to true", &ctx).is_err());
}

#[test]
fn test_configure_fields() {
    let parser = create_parser([NodeDefinition::new("call", 0)
        .pattern([ident().named("callee"), token("("), full().named("arg"), token(")")])
        .configure(|captures, ctx| {
            let callee = captures[0].node.as_identifier().unwrap_or_default();
            [
                ("callee".to_string(), Value::string(callee)),
                ("known".to_string(), Value::bool(ctx.contains(callee))),
            ]
            .into_iter()
            .collect()
        })])
    .unwrap();

    let ctx = Context::from_descriptors([("abs", "number")]).unwrap();
    let ast = parser.parse_ast("abs(1)", &ctx).unwrap();
    assert_eq!(ast.field("callee"), Some(&Value::string("abs")));
    assert_eq!(ast.field("known"), Some(&Value::bool(true)));
}

// ============================================================================
// Long Input Tests
// ============================================================================

#[test]
fn test_long_flat_sum_within_default_limits() {
    let parser = arithmetic();
    let input = vec!["1"; 400].join("+");
    let ast = parser.parse_ast(&input, &Context::new()).unwrap();
    assert_eq!(ast.name, "add");
    assert_eq!(ast.span.end, input.len());
    assert_eq!(ast.to_sexpr().matches("add(").count(), 399);

    let spaced = vec!["2 * 3"; 300].join(" + ");
    assert!(parser.parse_ast(&spaced, &Context::new()).is_ok());
}

// ============================================================================
// Prefix Parse Tests
// ============================================================================

#[test]
fn test_prefix_leaves_remaining_suffix() {
    let parser = arithmetic();
    let input = "1 + 2 ; rest";
    let (ast, rest) = parser.parse_partial(input, &Context::new()).unwrap();
    assert_eq!(ast.to_sexpr(), "add(1, 2)");
    assert_eq!(rest, " ; rest");
    assert!(input.ends_with(rest));
    assert_eq!(ast.source(input), "1 + 2");
}

#[test]
fn test_prefix_absent_on_failure() {
    let parser = arithmetic();
    assert!(parser.parse_prefix("* 2", &Context::new()).is_none());
    assert!(parser.parse_prefix("", &Context::new()).is_none());
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_rejects_left_recursive_patterns() {
    let err = create_parser([NodeDefinition::new("bad", 0)
        .pattern([rhs(), token("+"), rhs()])])
    .unwrap_err();
    assert!(matches!(err, GrammarError::LeftRecursion { .. }));

    let err = create_parser([NodeDefinition::new("bad", 0)
        .pattern([full(), token("!")])])
    .unwrap_err();
    assert!(matches!(err, GrammarError::LeftRecursion { .. }));
}

#[test]
fn test_rejects_duplicates_and_bad_types() {
    let add = || {
        NodeDefinition::new("add", 0).pattern([lhs(), token("+"), rhs()])
    };
    assert!(matches!(
        create_parser([add(), add()]),
        Err(GrammarError::DuplicateNode { .. })
    ));

    let err = create_parser([NodeDefinition::new("neg", 0)
        .pattern([token("-"), rhs_typed("numbr")])])
    .unwrap_err();
    assert!(matches!(err, GrammarError::InvalidType { .. }));
}

#[test]
fn test_shadowed_definition_is_flagged() {
    let parser = create_parser([
        NodeDefinition::new("first", 0).pattern([lhs(), token("+"), rhs()]),
        NodeDefinition::new("second", 0).pattern([lhs(), token("+"), rhs()]),
    ])
    .unwrap();

    assert_eq!(parser.warnings().len(), 1);
    assert_eq!(parser.warnings()[0].kind, WarningKind::DuplicatePattern);
    assert_eq!(parser.warnings()[0].node, "second");
    // first registered wins
    assert_eq!(sexpr(&parser, "1+2"), "first");
}

#[test]
fn test_overloads_are_not_flagged() {
    assert!(equality().warnings().is_empty());
}

#[test]
fn test_atom_definitions_live_at_builtin_level() {
    let parser = create_parser([
        NodeDefinition::atom("pi").pattern([token("pi")]).returns("number"),
        NodeDefinition::new("add", 0)
            .pattern([lhs_typed("number").named("left"), token("+"), rhs_typed("number").named("right")])
            .returns("number"),
    ])
    .unwrap();

    let ast = parser.parse_ast("pi + 1", &Context::new()).unwrap();
    assert_eq!(ast.to_sexpr(), "add(pi, 1)");
    assert_eq!(ast.capture("left").unwrap().output, TypeTag::Number);
}
