use rowan::{TextRange, TextSize};

use crate::test_utils::{arithmetic, list, parse, statements};
use crate::tree::text_range;

#[test]
fn navigation_over_hidden_rules() {
    let table = statements();
    let tree = parse(&table, "let x = 1; print x;");
    let root = tree.root_node();
    assert_eq!(root.kind(), "program");
    assert!(root.parent().is_none());
    assert_eq!(root.child_count(), 2);

    let stmt = root.child(0).unwrap();
    assert_eq!(stmt.kind(), "let");
    assert_eq!(stmt.byte_range(), 0..10);
    assert_eq!(stmt.utf8_text(), Some("let x = 1;"));
    assert_eq!(stmt.parent().unwrap().kind(), "program");

    let kinds: Vec<_> = stmt.children().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, ["let", "identifier", "=", "number", ";"]);
    let named: Vec<_> = stmt.named_children().iter().map(|c| c.kind()).collect();
    assert_eq!(named, ["identifier", "number"]);

    let name = stmt.child_by_field_name("name").unwrap();
    assert_eq!(name.utf8_text(), Some("x"));
    assert_eq!(name.field_name(), Some("name"));
    assert_eq!(name.next_sibling().unwrap().kind(), "=");
    assert_eq!(name.prev_sibling().unwrap().kind(), "let");
    assert_eq!(name.parent().unwrap().kind(), "let");

    // The field sits on a hidden choice; its visible child inherits it.
    let value = stmt.child_by_field_name("value").unwrap();
    assert_eq!(value.kind(), "number");
    assert_eq!(stmt.field_name_for_child(3), Some("value"));
    assert_eq!(stmt.field_name_for_child(0), None);
    assert!(stmt.child_by_field_name("missing").is_none());

    let print = stmt.next_sibling().unwrap();
    assert_eq!(print.kind(), "print");
    assert!(print.next_sibling().is_none());
    assert_eq!(print.prev_sibling().unwrap().kind(), "let");
}

#[test]
fn node_flags_and_ranges() {
    let table = arithmetic();
    let tree = parse(&table, "1+");
    let root = tree.root_node();
    assert!(root.has_error());
    assert!(!root.is_error());
    assert_eq!(root.range(), Some(TextRange::new(TextSize::from(0), TextSize::from(2))));

    let error = root.child(1).unwrap();
    assert!(error.is_error());
    assert!(error.is_extra());
    assert!(error.is_named());
    assert_eq!(error.kind(), "ERROR");
    assert_eq!(error.byte_range(), 1..2);

    let plus = error.child(0).unwrap();
    assert!(!plus.is_named());
    assert_eq!(plus.kind(), "+");
    assert_eq!(plus.kind_id(), table.symbol_for_name("+", false).unwrap().get());
    assert_eq!(plus.parent().unwrap().kind(), "ERROR");
}

#[test]
fn descendant_lookup() {
    let table = arithmetic();
    let tree = parse(&table, "1 + 23");
    let root = tree.root_node();

    let node = root.descendant_for_byte_range(4..5).unwrap();
    assert_eq!(node.kind(), "number");
    assert_eq!(node.byte_range(), 4..6);

    let node = root.descendant_for_byte_range(0..6).unwrap();
    assert_eq!(node.byte_range(), 0..6);
    assert!(root.descendant_for_byte_range(3..9).is_none());
}

#[test]
fn leaves_partition_the_input() {
    let table = arithmetic();
    let tree = parse(&table, "1 *2");
    let ranges: Vec<_> = tree.leaves().into_iter().map(|leaf| leaf.byte_range).collect();
    assert_eq!(ranges, [0..1, 1..2, 2..3, 3..4]);
}

#[test]
fn trees_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::SyntaxTree>();
    assert_send_sync::<crate::Subtree>();
}

#[test]
fn debug_output() {
    let table = arithmetic();
    let tree = parse(&table, "7");
    insta::assert_snapshot!(format!("{:?}", tree.root_node()), @"expr 0..1");
    insta::assert_snapshot!(
        format!("{tree:?}"),
        @r#"SyntaxTree { version: 1, ambiguity_limit_hit: false, root: "(expr (number))" }"#
    );
}

#[test]
fn text_ranges_past_four_gigabytes() {
    assert_eq!(text_range(3, 4), Some(TextRange::new(TextSize::from(3), TextSize::from(7))));
    let max = u32::MAX as usize;
    assert_eq!(text_range(max, 0), Some(TextRange::empty(TextSize::from(u32::MAX))));
    assert_eq!(text_range(max, 1), None);
    assert_eq!(text_range(max - 1, 1), Some(TextRange::at(TextSize::from(u32::MAX - 1), TextSize::from(1))));
}

#[test]
fn hundred_thousand_items() {
    let table = list();
    let items = 100_000;
    let source = "a;".repeat(items);
    let tree = parse(&table, &source);
    assert!(!tree.has_error());

    let root = tree.root_node();
    assert_eq!(root.child_count(), items);
    let mut end = 0;
    for index in 0..root.child_count() {
        let stmt = root.child(index).unwrap();
        assert_eq!(stmt.start_byte(), end);
        end = stmt.end_byte();
    }
    assert_eq!(end, source.len());

    let last = root.child(items - 1).unwrap();
    assert_eq!(last.kind(), "stmt");
    assert_eq!(last.parent().unwrap().kind(), "program");
    assert_eq!(last.prev_sibling().unwrap().byte_range(), 2 * items - 4..2 * items - 2);
    assert!(last.next_sibling().is_none());
    let node = root.descendant_for_byte_range(2 * items - 2..2 * items - 1).unwrap();
    assert_eq!(node.kind(), "identifier");

    let sexp = tree.to_sexp();
    assert!(sexp.starts_with(r#"(program (stmt (identifier) ";") (stmt"#));
    assert_eq!(sexp.matches("(stmt").count(), items);

    let again = parse(&table, &source);
    assert_eq!(tree.root_subtree(), again.root_subtree());
    assert!(format!("{:?}", tree.root_subtree()).len() > source.len());
    drop(again);
}
