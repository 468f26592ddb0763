//! Rule constructors for building grammars in Rust.
//!
//! These mirror tree-sitter's `grammar.js` helpers so a grammar can be
//! transcribed almost verbatim:
//!
//! ```
//! use grove_core::Grammar;
//! use grove_core::dsl::*;
//!
//! let grammar = Grammar::builder("arith")
//!     .rule("expr", choice([
//!         prec_left(1, seq([sym("expr"), string("+"), sym("expr")])),
//!         sym("number"),
//!     ]))
//!     .rule("number", pattern("[0-9]+"))
//!     .extra(pattern(r"\s"))
//!     .build();
//! assert_eq!(grammar.rules.len(), 2);
//! ```

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

impl From<i32> for Precedence {
    fn from(n: i32) -> Self {
        Precedence::Integer(n)
    }
}

impl From<&str> for Precedence {
    fn from(name: &str) -> Self {
        Precedence::Name(name.to_string())
    }
}

/// String literals are literal tokens.
impl From<&str> for Rule {
    fn from(s: &str) -> Self {
        Rule::String(s.to_string())
    }
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn string(s: impl Into<String>) -> Rule {
    Rule::String(s.into())
}

pub fn pattern(re: impl Into<String>) -> Rule {
    Rule::Pattern {
        value: re.into(),
        flags: None,
    }
}

/// Pattern with JavaScript-style flags (`i` and `s` are honored).
pub fn pattern_with_flags(re: impl Into<String>, flags: impl Into<String>) -> Rule {
    Rule::Pattern {
        value: re.into(),
        flags: Some(flags.into()),
    }
}

pub fn sym(name: impl Into<String>) -> Rule {
    Rule::Symbol(name.into())
}

pub fn seq(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(members.into_iter().collect())
}

pub fn choice(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(members.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

pub fn field(name: impl Into<String>, rule: Rule) -> Rule {
    Rule::Field {
        name: name.into(),
        content: Box::new(rule),
    }
}

/// Rename to a named kind.
pub fn alias(rule: Rule, name: impl Into<String>) -> Rule {
    Rule::Alias {
        content: Box::new(rule),
        value: name.into(),
        named: true,
    }
}

/// Rename to an anonymous kind.
pub fn alias_anonymous(rule: Rule, text: impl Into<String>) -> Rule {
    Rule::Alias {
        content: Box::new(rule),
        value: text.into(),
        named: false,
    }
}

pub fn token(rule: Rule) -> Rule {
    Rule::Token(Box::new(rule))
}

pub fn token_immediate(rule: Rule) -> Rule {
    Rule::ImmediateToken(Box::new(rule))
}

pub fn prec(value: impl Into<Precedence>, rule: Rule) -> Rule {
    Rule::Prec {
        value: value.into(),
        content: Box::new(rule),
    }
}

pub fn prec_left(value: impl Into<Precedence>, rule: Rule) -> Rule {
    Rule::PrecLeft {
        value: value.into(),
        content: Box::new(rule),
    }
}

pub fn prec_right(value: impl Into<Precedence>, rule: Rule) -> Rule {
    Rule::PrecRight {
        value: value.into(),
        content: Box::new(rule),
    }
}

pub fn prec_dynamic(value: i32, rule: Rule) -> Rule {
    Rule::PrecDynamic {
        value,
        content: Box::new(rule),
    }
}

/// Grammar assembled rule by rule. See the module docs.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    grammar: Grammar,
}

impl Grammar {
    pub fn builder(name: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder {
            grammar: Grammar::new(name),
        }
    }
}

impl GrammarBuilder {
    /// Add a rule. The first rule added is the start rule.
    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.grammar.rules.push((name.into(), rule));
        self
    }

    pub fn extra(mut self, rule: Rule) -> Self {
        self.grammar.extras.push(rule);
        self
    }

    pub fn external(mut self, rule: Rule) -> Self {
        self.grammar.externals.push(rule);
        self
    }

    pub fn conflict<S: Into<String>>(mut self, rules: impl IntoIterator<Item = S>) -> Self {
        self.grammar
            .conflicts
            .push(rules.into_iter().map(Into::into).collect());
        self
    }

    /// Add an ordering of named precedences, highest first.
    pub fn precedence_order<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.grammar.precedences.push(
            names
                .into_iter()
                .map(|n| PrecedenceEntry::Name(n.into()))
                .collect(),
        );
        self
    }

    pub fn precedences(mut self, order: Vec<PrecedenceEntry>) -> Self {
        self.grammar.precedences.push(order);
        self
    }

    pub fn inline(mut self, name: impl Into<String>) -> Self {
        self.grammar.inline.push(name.into());
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.grammar.supertypes.push(name.into());
        self
    }

    pub fn word(mut self, name: impl Into<String>) -> Self {
        self.grammar.word = Some(name.into());
        self
    }

    pub fn build(self) -> Grammar {
        self.grammar
    }
}
