use numscript::ast::{BinaryOp, Expr, Parser, UnaryOp, parse};
use numscript::lexer::tokenize;
use numscript::{Error, ErrorKind, Number};

fn parse_ok(src: &str) -> Expr {
    parse(tokenize(src).unwrap()).unwrap()
}

fn parse_err(src: &str) -> Error {
    let err = parse(tokenize(src).unwrap()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    err
}

fn offsets(expr: &Expr) -> (usize, usize) {
    let span = expr.span();
    (span.start.offset, span.end.offset)
}

#[test]
fn multiplication_binds_tighter() {
    let Expr::BinaryOperation { op, lhs, rhs } = parse_ok("3+4*5") else {
        panic!("expected a binary operation");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(*lhs, Expr::Number { value: Number::Int(3), .. }));
    assert!(matches!(*rhs, Expr::BinaryOperation { op: BinaryOp::Mul, .. }));
}

#[test]
fn operators_fold_left() {
    let Expr::BinaryOperation { op, lhs, .. } = parse_ok("1-2-3") else {
        panic!("expected a binary operation");
    };
    assert_eq!(op, BinaryOp::Sub);
    assert!(matches!(*lhs, Expr::BinaryOperation { op: BinaryOp::Sub, .. }));
}

#[test]
fn comparison_sits_below_arithmetic_and_above_logic() {
    let Expr::BinaryOperation { op, lhs, rhs } = parse_ok("1+1 == 2 AND NOT 3 < 1") else {
        panic!("expected a binary operation");
    };
    assert_eq!(op, BinaryOp::And);
    assert!(matches!(*lhs, Expr::BinaryOperation { op: BinaryOp::Equal, .. }));
    assert!(matches!(*rhs, Expr::UnaryOperation { op: UnaryOp::Not, .. }));
}

#[test]
fn parses_assignment() {
    let expr = parse_ok("VAR x = 1 + 2");
    let Expr::Assignment { name, value, .. } = &expr else {
        panic!("expected an assignment");
    };
    assert_eq!(name, "x");
    assert!(matches!(**value, Expr::BinaryOperation { op: BinaryOp::Add, .. }));
    assert_eq!(offsets(&expr), (4, 13));
}

#[test]
fn parses_elif_chain() {
    let expr = parse_ok("IF 1 THEN 2 ELIF 3 THEN 4");
    let Expr::If { cases, else_case } = &expr else {
        panic!("expected an if");
    };
    assert_eq!(cases.len(), 2);
    assert!(else_case.is_none());
    assert_eq!(offsets(&expr), (3, 25));
}

#[test]
fn if_span_reaches_else_body() {
    let expr = parse_ok("IF 1 THEN 2 ELSE 3");
    assert_eq!(offsets(&expr), (3, 18));
}

#[test]
fn while_span_starts_at_condition() {
    let expr = parse_ok("WHILE x THEN 1");
    assert!(matches!(expr, Expr::While { .. }));
    assert_eq!(offsets(&expr), (6, 14));
}

#[test]
fn unary_span_starts_at_operator() {
    let expr = parse_ok("--5");
    assert!(matches!(expr, Expr::UnaryOperation { op: UnaryOp::Minus, .. }));
    assert_eq!(offsets(&expr), (0, 3));
}

#[test]
fn parentheses_group() {
    let Expr::BinaryOperation { op, lhs, .. } = parse_ok("(1+2)*3") else {
        panic!("expected a binary operation");
    };
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(*lhs, Expr::BinaryOperation { op: BinaryOp::Add, .. }));
}

#[test]
fn var_needs_identifier() {
    assert_eq!(parse_err("VAR 2").details, "Expected identifier");
}

#[test]
fn var_needs_equals() {
    assert_eq!(parse_err("VAR x 2").details, "Expected '='");
}

#[test]
fn unclosed_parenthesis() {
    assert_eq!(parse_err("(1+2").details, "Expected ')'");
}

#[test]
fn if_needs_then() {
    let err = parse_err("IF 1 2");
    assert_eq!(err.details, "Expected 'THEN'");
    assert_eq!(err.span.start.offset, 5);
}

#[test]
fn trailing_tokens_are_rejected() {
    let err = parse_err("1 2");
    assert!(err.details.starts_with("Expected '+', '-', '*', '/'"));
    assert_eq!(err.span.start.offset, 2);
}

#[test]
fn failure_before_any_token_gets_general_message() {
    let err = parse_err(")");
    assert_eq!(
        err.details,
        "Expected 'VAR', int, float, identifier, '+', '-', '(' or 'NOT'"
    );
}

#[test]
fn deeper_failure_wins() {
    let err = parse_err("1 + )");
    assert_eq!(err.details, "Expected int, float, identifier, '+', '-', '('");
    assert_eq!(err.span.start.offset, 4);
}

#[test]
fn empty_input_is_a_syntax_error() {
    let err = parse_err("");
    assert_eq!(
        err.details,
        "Expected 'VAR', int, float, identifier, '+', '-', '(' or 'NOT'"
    );
}

#[test]
fn nesting_depth_is_bounded() {
    let parse_at_depth = |src: &str| Parser::new(tokenize(src).unwrap()).max_depth(3).parse();
    assert!(parse_at_depth("(((1)))").is_ok());
    assert!(parse_at_depth("---1").is_ok());

    let err = parse_at_depth("((((1))))").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.details, "Expression nested too deeply (limit 3)");
    assert_eq!(err.span.start.offset, 4);

    let err = parse_at_depth("NOT NOT NOT NOT 1").unwrap_err();
    assert_eq!(err.details, "Expression nested too deeply (limit 3)");
}

#[test]
fn thousands_of_parentheses_fail_cleanly() {
    let src = format!("{}1{}", "(".repeat(2000), ")".repeat(2000));
    let err = parse_err(&src);
    assert!(err.details.starts_with("Expression nested too deeply"));
}
