use super::*;
use crate::GrammarError;

#[test]
fn parse_arithmetic_grammar() {
    let json = r#"{
        "name": "arith",
        "rules": {
            "expr": {
                "type": "CHOICE",
                "members": [
                    {
                        "type": "PREC_LEFT",
                        "value": 1,
                        "content": {
                            "type": "SEQ",
                            "members": [
                                { "type": "SYMBOL", "name": "expr" },
                                { "type": "STRING", "value": "+" },
                                { "type": "SYMBOL", "name": "expr" }
                            ]
                        }
                    },
                    { "type": "SYMBOL", "name": "number" }
                ]
            },
            "number": { "type": "PATTERN", "value": "[0-9]+" }
        },
        "extras": [{ "type": "PATTERN", "value": "\\s" }]
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.name, "arith");
    assert_eq!(grammar.rules.len(), 2);
    assert_eq!(grammar.extras.len(), 1);

    let Rule::Choice(members) = &grammar.rules[0].1 else {
        panic!("expected choice");
    };
    assert!(matches!(
        &members[0],
        Rule::PrecLeft {
            value: Precedence::Integer(1),
            ..
        }
    ));
}

#[test]
fn rule_order_follows_the_source_object() {
    let json = r#"{
        "name": "test",
        "rules": {
            "program": { "type": "SYMBOL", "name": "statement" },
            "statement": { "type": "SYMBOL", "name": "atom" },
            "atom": { "type": "STRING", "value": "x" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let names: Vec<_> = grammar.rules.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["program", "statement", "atom"]);
}

#[test]
fn named_precedence_and_orderings() {
    let json = r#"{
        "name": "test",
        "rules": {
            "root": {
                "type": "PREC",
                "value": "call",
                "content": { "type": "STRING", "value": "x" }
            }
        },
        "precedences": [[
            { "type": "STRING", "value": "call" },
            { "type": "SYMBOL", "name": "root" }
        ]]
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert!(matches!(
        &grammar.rules[0].1,
        Rule::Prec { value: Precedence::Name(n), .. } if n == "call"
    ));
    assert_eq!(
        grammar.precedences[0],
        [
            PrecedenceEntry::Name("call".into()),
            PrecedenceEntry::Symbol("root".into())
        ]
    );
}

#[test]
fn externals_inline_and_word() {
    let json = r#"{
        "name": "test",
        "word": "identifier",
        "rules": {
            "root": { "type": "SYMBOL", "name": "identifier" },
            "identifier": { "type": "PATTERN", "value": "[a-z]+", "flags": "i" }
        },
        "externals": [
            { "type": "SYMBOL", "name": "indent" },
            { "type": "STRING", "value": "}" }
        ],
        "inline": ["_value"],
        "supertypes": ["_expression"],
        "conflicts": [["root", "identifier"]]
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.word.as_deref(), Some("identifier"));
    assert_eq!(grammar.externals.len(), 2);
    assert_eq!(grammar.inline, ["_value"]);
    assert_eq!(grammar.supertypes, ["_expression"]);
    assert_eq!(grammar.conflicts, [vec!["root".to_string(), "identifier".to_string()]]);
    assert!(matches!(
        grammar.rule("identifier"),
        Some(Rule::Pattern { flags: Some(f), .. }) if f == "i"
    ));
}

#[test]
fn reserved_and_inherits_are_kept() {
    let json = r#"{
        "name": "child",
        "inherits": "parent",
        "rules": { "root": { "type": "STRING", "value": "x" } },
        "reserved": { "global": [{ "type": "STRING", "value": "if" }] }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.inherits.as_deref(), Some("parent"));
    assert_eq!(grammar.reserved[0].0, "global");
}

#[test]
fn unknown_rule_type_is_an_error() {
    let json = r#"{
        "name": "test",
        "rules": { "root": { "type": "LOOKAHEAD", "value": "x" } }
    }"#;

    let err = Grammar::from_json(json).unwrap_err();
    assert!(matches!(err, GrammarError::Json(_)));
}

#[test]
fn json_written_back_parses_to_the_same_grammar() {
    let json = r#"{
        "name": "test",
        "rules": {
            "root": {
                "type": "SEQ",
                "members": [
                    { "type": "FIELD", "name": "head", "content": { "type": "SYMBOL", "name": "word" } },
                    { "type": "REPEAT", "content": {
                        "type": "ALIAS", "value": "tail", "named": true,
                        "content": { "type": "IMMEDIATE_TOKEN", "content": { "type": "STRING", "value": "!" } }
                    }},
                    { "type": "PREC_DYNAMIC", "value": -2, "content": { "type": "BLANK" } }
                ]
            },
            "word": { "type": "TOKEN", "content": { "type": "PATTERN", "value": "\\w+" } }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let written = grammar.to_json().unwrap();
    assert_eq!(Grammar::from_json(&written).unwrap(), grammar);
    assert!(written.contains("\"IMMEDIATE_TOKEN\""));
    assert!(written.contains("\"PREC_DYNAMIC\""));
}
