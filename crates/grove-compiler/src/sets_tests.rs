use grove_core::{Grammar, Symbol, dsl::*};

use crate::{FirstSets, TerminalSet};

#[test]
fn terminal_set_insert_and_union() {
    let mut a = TerminalSet::new();
    assert!(a.is_empty());
    assert!(a.insert(Symbol::new(3)));
    assert!(!a.insert(Symbol::new(3)));
    assert!(a.contains(Symbol::new(3)));
    assert!(!a.contains(Symbol::new(70)));

    let b = TerminalSet::single(Symbol::new(70));
    assert!(a.union_with(&b));
    assert!(!a.union_with(&b));
    assert_eq!(a.iter().collect::<Vec<_>>(), [Symbol::new(3), Symbol::new(70)]);
}

#[test]
fn terminal_set_equality_ignores_insertion_order() {
    let mut a = TerminalSet::new();
    a.insert(Symbol::new(65));
    a.insert(Symbol::new(1));
    let mut b = TerminalSet::single(Symbol::new(1));
    b.insert(Symbol::new(65));
    assert_eq!(a, b);
}

#[test]
fn first_and_nullable() {
    let model = Grammar::builder("stmts")
        .rule("program", repeat(sym("stmt")))
        .rule("stmt", seq([optional("pub".into()), "fn".into(), sym("name")]))
        .rule("name", pattern("[a-z]+"))
        .build()
        .validate()
        .unwrap();
    let first = FirstSets::compute(&model);
    let program = model.symbol_by_name("program").unwrap();
    let stmt = model.symbol_by_name("stmt").unwrap();
    let kw_pub = model.symbol_by_name("pub").unwrap();
    let kw_fn = model.symbol_by_name("fn").unwrap();

    assert!(first.is_nullable(program));
    assert!(!first.is_nullable(stmt));
    assert_eq!(first.first(stmt).iter().collect::<Vec<_>>(), [kw_pub, kw_fn]);
    assert_eq!(first.first(program), first.first(stmt));

    let (set, nullable) = first.first_of_sequence([program, stmt]);
    assert!(!nullable);
    assert_eq!(set, *first.first(stmt));
    let (set, nullable) = first.first_of_sequence([program]);
    assert!(nullable);
    assert!(!set.contains(Symbol::END));
}
