use super::*;
use pretty_assertions::assert_eq;

use crate::test_helpers::name;

fn variable(sequence: u64, level: usize) -> Arc<Variable> {
    Variable::new(name("variable", sequence), level, false)
}

fn variable_of(binding: Option<Binding>) -> Arc<Variable> {
    match binding {
        Some(Binding::Variable { variable, .. }) => variable,
        other => panic!("expected a variable binding, got {other:?}"),
    }
}

#[test]
fn top_level_definitions_go_to_globals() {
    let globals = SharedGlobals::new();
    let mut env = Environment::new(globals.clone());
    assert!(env.is_global());

    let x = variable(0, 0);
    assert!(env.bind_variable("x", Arc::clone(&x)).is_none());

    assert!(globals.contains("x"));
    assert!(Arc::ptr_eq(&variable_of(env.lookup("x")), &x));
}

#[test]
fn globals_are_shared_between_environments() {
    let globals = SharedGlobals::new();
    let mut first = Environment::new(globals.clone());
    first.bind_variable("f", variable(0, 0));

    let second = Environment::new(globals.clone());
    assert!(second.lookup("f").is_some());
    assert_eq!(globals.names(), vec!["f".to_string()]);
}

#[test]
fn block_scope_keeps_the_function_level() {
    let mut env = Environment::new(SharedGlobals::new());
    env.push_scope(ScopeKind::Block);
    assert_eq!(env.level(), 0);
    assert_eq!(env.scope_kind(), Some(ScopeKind::Block));
    assert!(!env.is_global());

    env.push_scope(ScopeKind::Function);
    assert_eq!(env.level(), 1);
    env.push_scope(ScopeKind::Block);
    assert_eq!(env.level(), 1);
}

#[test]
fn shadowing_ends_with_the_scope() {
    let globals = SharedGlobals::new();
    let mut env = Environment::new(globals.clone());
    let outer = variable(0, 0);
    env.bind_variable("x", Arc::clone(&outer));

    env.push_scope(ScopeKind::Block);
    let inner = variable(1, 0);
    env.bind_variable("x", Arc::clone(&inner));
    assert!(Arc::ptr_eq(&variable_of(env.lookup("x")), &inner));
    env.pop_scope();

    assert!(Arc::ptr_eq(&variable_of(env.lookup("x")), &outer));
    assert_eq!(globals.len(), 1);
}

#[test]
fn arguments_resolve_with_depth() {
    let mut env = Environment::new(SharedGlobals::new());
    env.push_scope(ScopeKind::Function);
    env.bind_argument("a", 0);
    env.push_scope(ScopeKind::Function);
    env.bind_argument("b", 0);
    env.bind_argument("c", 1);

    let a = env.lookup("a").unwrap();
    assert!(matches!(a, Binding::Argument { index: 0, level: 1 }));
    assert_eq!(env.depth_of(&a), 1);

    let c = env.lookup("c").unwrap();
    assert!(matches!(c, Binding::Argument { index: 1, level: 2 }));
    assert_eq!(env.depth_of(&c), 0);
}

#[test]
fn globals_are_reached_from_any_depth() {
    let mut env = Environment::new(SharedGlobals::new());
    env.bind_variable("g", variable(0, 0));
    env.push_scope(ScopeKind::Function);
    env.push_scope(ScopeKind::Function);

    let g = env.lookup("g").unwrap();
    assert_eq!(g.level(), 0);
    assert_eq!(env.depth_of(&g), 2);
}

#[test]
fn restore_undoes_a_failed_global_definition() {
    let globals = SharedGlobals::new();
    let mut env = Environment::new(globals.clone());
    let old = variable(0, 0);
    env.bind_variable("x", Arc::clone(&old));

    let previous = env.bind_variable("x", variable(1, 0));
    env.restore("x", previous);
    assert!(Arc::ptr_eq(&globals.get("x").unwrap(), &old));

    let previous = env.bind_variable("y", variable(2, 0));
    env.restore("y", previous);
    assert!(!globals.contains("y"));
}

#[test]
fn restore_undoes_a_failed_local_definition() {
    let mut env = Environment::new(SharedGlobals::new());
    env.push_scope(ScopeKind::Function);
    env.bind_argument("x", 0);

    let previous = env.bind_variable("x", variable(0, 1));
    env.restore("x", previous);
    assert!(matches!(env.lookup("x"), Some(Binding::Argument { index: 0, .. })));

    let previous = env.bind_variable("y", variable(1, 1));
    env.restore("y", previous);
    assert!(env.lookup("y").is_none());
}

#[test]
fn unknown_names_do_not_resolve() {
    let env = Environment::new(SharedGlobals::new());
    assert!(env.lookup("missing").is_none());
}
