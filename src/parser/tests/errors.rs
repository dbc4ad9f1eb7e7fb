use crate::parser::parse;

#[test]
fn missing_period_reports_end_of_input() {
    let err = parse("kick(T) :- every(T, 1)").unwrap_err();
    assert!(err.info.contains("end of input"), "{}", err);
    assert_eq!(err.line, 1);
}

#[test]
fn unexpected_token_reports_position() {
    let err = parse("a.\nb :- , c.").unwrap_err();
    assert_eq!((err.line, err.column), (2, 6));
    assert!(err.info.contains("','"), "{}", err);
}

#[test]
fn variable_heads_are_rejected() {
    let err = parse("X :- true.").unwrap_err();
    assert!(err.info.contains("clause head"), "{}", err);
    assert!(parse("3.").is_err());
}

#[test]
fn errors_never_return_partial_programs() {
    assert!(parse("good(1).\nbad(.\n").is_err());
}

#[test]
fn unbalanced_brackets() {
    assert!(parse("p([1, 2).").is_err());
    assert!(parse("p((1 + 2).").is_err());
}

#[test]
fn display_includes_location() {
    let err = parse("p :- q ?").unwrap_err();
    assert_eq!(err.to_string(), format!("parse error at 1:8: {}", err.info));
}
