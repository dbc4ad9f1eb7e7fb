use super::Builtins;

mod random;

#[test]
fn standard_table_matches_on_name_and_arity() {
    let b = Builtins::standard();
    assert!(b.find("euc", 5).is_some());
    assert!(b.find("euc", 4).is_none());
    assert!(b.find("nope", 1).is_none());
    assert!(b.contains("cycle"));
    assert!(b.signatures().contains(&"scale/5".to_string()));
}

#[test]
fn registering_replaces_same_arity_only() {
    use super::BuiltinResult;
    use crate::arena::Arena;
    use crate::env::Env;
    use crate::resolve::Context;
    use crate::term::Term;

    fn never(_: &[Term], _: &Env, _: &mut Context<'_>, _: &mut Vec<Env>, _: &Arena) -> BuiltinResult {
        Ok(())
    }

    let mut b = Builtins::standard();
    b.register("add", 2, never);
    assert!(b.find("add", 2).is_some());
    assert!(b.find("add", 3).is_some());
}
