use std::sync::Arc;

use grove_table::Symbol;

use crate::test_utils::{ambiguous, arithmetic, list, parse, parse_with, power, sexp, statements};
use crate::{Edit, EditError, ParseOptions, Parser, PrintTracer, Subtree, SyntaxTree, Verbosity};

fn reparse(parser: &mut Parser, old: &SyntaxTree, edit: Edit, replacement: &str) -> (SyntaxTree, String) {
    let mut text = old.source().to_vec();
    edit.apply(&mut text, replacement.as_bytes());
    let tree = parser.reparse(old, &[edit], &text).unwrap();
    (tree, String::from_utf8(text).unwrap())
}

fn assert_covers(tree: &SyntaxTree) {
    let mut end = 0;
    for leaf in tree.leaves() {
        assert_eq!(leaf.byte_range.start, end, "gap or overlap before {leaf:?}");
        end = leaf.byte_range.end;
    }
    assert_eq!(end, tree.len());
}

#[test]
fn precedence_shapes_the_tree() {
    let table = arithmetic();
    insta::assert_snapshot!(sexp(&table, "1+2*3"), @r#"(expr (expr (number)) "+" (expr (expr (number)) "*" (expr (number))))"#);
    insta::assert_snapshot!(sexp(&table, "1*2+3"), @r#"(expr (expr (expr (number)) "*" (expr (number))) "+" (expr (number)))"#);
}

#[test]
fn left_associativity() {
    let table = arithmetic();
    insta::assert_snapshot!(sexp(&table, "1-2-3"), @r#"(expr (expr (expr (number)) "-" (expr (number))) "-" (expr (number)))"#);
}

#[test]
fn extras_stay_out_of_the_query_surface() {
    let table = arithmetic();
    let tree = parse(&table, " 1 +\n2 ");
    insta::assert_snapshot!(tree.to_sexp(), @r#"(expr (expr (number)) "+" (expr (number)))"#);
    assert_covers(&tree);

    let extras = tree.leaves().iter().filter(|leaf| leaf.extra).count();
    assert_eq!(extras, 4);
    assert!(!tree.has_error());
}

#[test]
fn truncated_input_recovers() {
    let table = arithmetic();
    let tree = parse(&table, "1+");
    insta::assert_snapshot!(tree.to_sexp(), @r#"(expr (number) (ERROR "+"))"#);
    assert_covers(&tree);
    assert_eq!(tree.root_subtree().error_count(), 1);
    assert!(tree.has_error());
}

#[test]
fn stray_token_is_wrapped() {
    let table = arithmetic();
    let tree = parse(&table, "1 + + 2");
    insta::assert_snapshot!(tree.to_sexp(), @r#"(expr (expr (number)) (ERROR "+") "+" (expr (number)))"#);
    assert_covers(&tree);
}

#[test]
fn invalid_bytes_and_empty_input() {
    let table = arithmetic();

    let tree = parse(&table, "#");
    insta::assert_snapshot!(tree.to_sexp(), @"(ERROR (ERROR))");
    assert_covers(&tree);

    let tree = parse(&table, "");
    insta::assert_snapshot!(tree.to_sexp(), @"(ERROR)");
    assert_eq!(tree.leaves(), vec![]);

    let tree = parse(&table, "1 # 2");
    assert!(tree.has_error());
    assert_covers(&tree);
}

#[test]
fn fields_and_hidden_rules() {
    let table = statements();
    insta::assert_snapshot!(
        sexp(&table, "let x = 1; print x;"),
        @r#"(program (let "let" name: (identifier) "=" value: (number) ";") (print "print" value: (identifier) ";"))"#
    );
}

#[test]
fn declared_ambiguity_prefers_dynamic_precedence() {
    let table = ambiguous();
    let tree = parse(&table, "a b");
    insta::assert_snapshot!(tree.to_sexp(), @"(list (pair (item) (item)))");
    assert!(!tree.ambiguity_limit_hit());
}

#[test]
fn fork_limit_is_reported() {
    let table = ambiguous();
    let tree = parse_with(&table, ParseOptions::new().fork_limit(1), "a b");
    assert!(tree.ambiguity_limit_hit());
    // The earlier alternative survives the cut.
    insta::assert_snapshot!(tree.to_sexp(), @"(list (pair (item) (item)))");
}

#[test]
fn parsing_is_deterministic() {
    let table = statements();
    let source = "let a = 1; print a; let b = a;";
    assert_eq!(parse(&table, source).root_subtree(), parse(&table, source).root_subtree());
}

#[test]
fn versions_count_up() {
    let table = arithmetic();
    let mut parser = Parser::new(Arc::clone(&table));
    let tree = parser.parse(b"1+2");
    assert_eq!(tree.version(), 1);

    let (tree, _) = reparse(&mut parser, &tree, Edit::replace(2..3, 1), "4");
    assert_eq!(tree.version(), 2);
    let (tree, _) = reparse(&mut parser, &tree, Edit::insert(3, 2), "*5");
    assert_eq!(tree.version(), 3);
}

fn product(tree: &SyntaxTree) -> Subtree {
    tree.root_subtree().children()[2].clone()
}

#[test]
fn reparse_reuses_untouched_subtree() {
    let table = arithmetic();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse(b"1+2*3");

    let (new, text) = reparse(&mut parser, &old, Edit::replace(1..2, 1), "-");
    assert_eq!(text, "1-2*3");
    insta::assert_snapshot!(new.to_sexp(), @r#"(expr (expr (number)) "-" (expr (expr (number)) "*" (expr (number))))"#);
    assert!(product(&old).ptr_eq(&product(&new)));
    assert_eq!(new.root_subtree(), parse(&table, &text).root_subtree());
}

#[test]
fn reparse_without_reuse_builds_fresh_nodes() {
    let table = arithmetic();
    let mut parser = Parser::new(Arc::clone(&table)).with_options(ParseOptions::new().reuse(false));
    let old = parser.parse(b"1+2*3");

    let (new, _) = reparse(&mut parser, &old, Edit::replace(1..2, 1), "-");
    assert!(!product(&old).ptr_eq(&product(&new)));
    assert_eq!(product(&old), product(&new));
}

#[test]
fn reparse_matches_fresh_parse() {
    let table = arithmetic();
    let cases = [
        ("2+3", Edit::insert(0, 2), "1*"),
        ("1+2*3", Edit::delete(3..5), ""),
        ("1 + 2 * 3", Edit::replace(4..5, 2), "42"),
        ("12+3", Edit::insert(2, 1), "4"),
        ("1+2", Edit::insert(3, 1), "+"),
        ("1+", Edit::insert(2, 1), "2"),
    ];
    for (source, edit, replacement) in cases {
        let mut parser = Parser::new(Arc::clone(&table));
        let old = parser.parse(source.as_bytes());
        let (new, text) = reparse(&mut parser, &old, edit, replacement);
        let fresh = parse(&table, &text);
        assert_eq!(new.root_subtree(), fresh.root_subtree(), "{source:?} -> {text:?}");
        assert_eq!(new.to_sexp(), fresh.to_sexp());
    }
}

#[test]
fn reparse_of_keywords_and_statements() {
    let table = statements();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse(b"let x = 1; print x;");
    let first = old.root_node().child(0).unwrap().subtree().clone();

    let (new, text) = reparse(&mut parser, &old, Edit::replace(17..18, 1), "y");
    assert_eq!(text, "let x = 1; print y;");
    assert_eq!(new.root_subtree(), parse(&table, &text).root_subtree());
    assert!(new.root_node().child(0).unwrap().subtree().ptr_eq(&first));

    let (new, text) = reparse(&mut parser, &new, Edit::replace(0..3, 3), "lex");
    assert_eq!(new.to_sexp(), parse(&table, &text).to_sexp());
    assert!(new.has_error());
}

#[test]
fn malformed_edits_are_rejected() {
    let table = arithmetic();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse(b"1+2");

    let err = parser.reparse(&old, &[Edit::delete(2..9)], b"1+").unwrap_err();
    assert_eq!(
        err,
        EditError::OutOfBounds {
            index: 0,
            end: 9,
            len: 3
        }
    );

    let err = parser.reparse(&old, &[Edit::insert(3, 1)], b"1+2").unwrap_err();
    insta::assert_snapshot!(err, @"edits describe a text of 4 bytes, got 3");
}

#[test]
fn dynamic_precedence_accumulates() {
    let table = ambiguous();
    let tree = parse(&table, "a b");
    assert_eq!(tree.root_subtree().dynamic_precedence(), 1);
}

#[test]
fn right_associative_operator() {
    let table = power();
    insta::assert_snapshot!(sexp(&table, "1^2^3"), @r#"(expr (expr (number)) "^" (expr (expr (number)) "^" (expr (number))))"#);
}

#[test]
fn error_leaves_keep_their_symbol() {
    let table = arithmetic();
    let tree = parse(&table, "#");
    let leaves = tree.leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].symbol, Symbol::ERROR);
    assert_eq!(leaves[0].byte_range, 0..1);
}

#[test]
fn deep_right_associative_chain() {
    let table = power();
    let depth = 50_000;
    let source = format!("{}1", "1^".repeat(depth));
    let tree = parse(&table, &source);
    assert!(!tree.has_error());
    assert_covers(&tree);

    let mut node = tree.root_node();
    let mut levels = 0;
    while let Some(right) = node.child(2) {
        node = right;
        levels += 1;
    }
    assert_eq!(levels, depth);
    assert_eq!(node.byte_range(), source.len() - 1..source.len());
    assert_eq!(node.parent().unwrap().child_count(), 3);
    drop(node);

    let sexp = tree.to_sexp();
    assert_eq!(sexp.matches("\"^\"").count(), depth);
    assert_eq!(tree.root_subtree(), parse(&table, &source).root_subtree());
}

#[test]
fn long_error_run() {
    let table = arithmetic();
    let garbage = "#".repeat(20_000);
    let source = format!("1+{garbage}2");
    let tree = parse(&table, &source);
    assert_covers(&tree);

    let root = tree.root_node();
    let kinds: Vec<_> = root.children().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, ["expr", "+", "ERROR", "expr"]);
    assert_eq!(root.child(2).unwrap().child_count(), 20_000);

    let mut parser = Parser::new(Arc::clone(&table));
    let (new, text) = reparse(&mut parser, &tree, Edit::delete(10_000..10_001), "");
    assert_eq!(new.root_subtree(), parse(&table, &text).root_subtree());
}

fn count(tracer: &PrintTracer, event: &str) -> usize {
    tracer.lines().iter().filter(|line| line.starts_with(event)).count()
}

#[test]
fn edit_at_the_end_reuses_the_prefix_whole() {
    let table = list();
    let mut parser = Parser::new(Arc::clone(&table));
    let items = 10_000;
    let old = parser.parse("a;".repeat(items).as_bytes());

    let last = 2 * (items - 1);
    let edit = Edit::replace(last..last + 1, 1);
    let mut text = old.source().to_vec();
    edit.apply(&mut text, b"b");
    let mut tracer = PrintTracer::new(&text, &table, Verbosity::Verbose);
    let new = parser.reparse_with(&old, &[edit], &text, &mut tracer).unwrap();

    assert_eq!(new.root_subtree(), parse(&table, std::str::from_utf8(&text).unwrap()).root_subtree());
    assert_eq!(count(&tracer, "reuse"), 1);
    assert!(count(&tracer, "lex") <= 8, "{:#?}", tracer.lines());
    assert!(tracer.lines().len() <= 40, "{:#?}", tracer.lines());
}

#[test]
fn edits_inside_a_long_list() {
    let table = list();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse("ab;".repeat(5_000).as_bytes());

    for (edit, replacement) in [
        (Edit::replace(0..1, 1), "x"),
        (Edit::delete(7_500..7_503), ""),
        (Edit::insert(9_000, 4), "cd;e"),
        (Edit::replace(14_997..15_000, 0), ""),
    ] {
        let (new, text) = reparse(&mut parser, &old, edit, replacement);
        let fresh = parse(&table, &text);
        assert_eq!(new.root_subtree(), fresh.root_subtree(), "{edit:?}");
        assert_eq!(new.has_error(), fresh.has_error());
    }
}

#[test]
fn ambiguous_regions_reparse_like_fresh() {
    let table = ambiguous();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse(b"a b c d");

    let (new, text) = reparse(&mut parser, &old, Edit::replace(6..7, 1), "e");
    assert_eq!(new.root_subtree(), parse(&table, &text).root_subtree());
    let (new, text) = reparse(&mut parser, &new, Edit::insert(0, 2), "z ");
    assert_eq!(new.root_subtree(), parse(&table, &text).root_subtree());
}
