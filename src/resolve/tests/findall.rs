use crate::testing::Harness;

#[test]
fn every_matching_fact_is_a_solution() {
    let mut h = Harness::with_program("foo(1). foo(2). foo(3).");
    assert_eq!(h.values("foo(X)", "X"), vec!["1", "2", "3"]);
}

#[test]
fn conjunction_joins_through_shared_variables() {
    let mut h = Harness::with_program(
        "parent(ann, bob). parent(bob, cid). parent(bob, dee).\n\
         grand(X, Z) :- parent(X, Y), parent(Y, Z).",
    );
    assert_eq!(h.values("grand(ann, Z)", "Z"), vec!["cid", "dee"]);
    assert!(h.values("grand(bob, Z)", "Z").is_empty());
}

#[test]
fn query_alternatives_are_all_explored() {
    let mut h = Harness::with_program("foo(1). foo(2). foo(3).");
    assert_eq!(h.values("foo(X) ; X = 9", "X"), vec!["1", "2", "3", "9"]);
}

#[test]
fn nested_calls_do_not_capture_each_others_variables() {
    let mut h = Harness::with_program("p(X) :- q(X). q(X) :- r(X). r(5).\nboth(X, Y) :- p(X), p(Y).");
    assert_eq!(h.values("p(A)", "A"), vec!["5"]);
    assert_eq!(h.values("both(A, B), A =:= B", "B"), vec!["5"]);
}

#[test]
fn builtins_enumerate_inside_clause_bodies() {
    let mut h = Harness::with_program("notes(N) :- chord(60, maj, 0, N).");
    assert_eq!(h.values("notes(N)", "N"), vec!["60", "64", "67"]);
}

#[test]
fn builtin_names_with_other_arities_use_clauses() {
    let mut h = Harness::with_program("add(left, right).");
    assert_eq!(h.values("add(X, right)", "X"), vec!["left"]);
    assert_eq!(h.values("add(1, 2, Z)", "Z"), vec!["3"]);
}

#[test]
fn goals_may_be_bound_variables() {
    let mut h = Harness::with_program("foo(1). foo(2).");
    assert_eq!(h.values("G = foo(X), G", "X"), vec!["1", "2"]);
}

#[test]
fn unbound_and_unknown_goals_have_no_solutions() {
    let mut h = Harness::with_program("foo(1).");
    assert_eq!(h.count("X"), 0);
    assert_eq!(h.count("bar(X)"), 0);
    assert_eq!(h.count("foo(1, 2)"), 0);
    assert_eq!(h.count("42"), 0);
}

#[test]
fn facts_with_repeated_variables_constrain_callers() {
    let mut h = Harness::with_program("same(X, X).");
    assert!(h.succeeds("same(a, a)"));
    assert!(!h.succeeds("same(a, b)"));
    assert_eq!(h.values("same(Q, 4)", "Q"), vec!["4"]);
}
