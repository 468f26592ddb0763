//! `grammar.json` reading and writing.
//!
//! The on-disk shape is tree-sitter's: rules are objects tagged by a `type`
//! field in SCREAMING_SNAKE_CASE, and `rules` is an object whose key order
//! is the definition order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};
use crate::GrammarError;

impl Grammar {
    /// Parse a grammar from `grammar.json` text.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: JsonGrammar = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    /// Render the grammar as pretty-printed `grammar.json` text.
    pub fn to_json(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string_pretty(&JsonGrammar::from(self))?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonGrammar {
    name: String,
    // IndexMap keeps the key order of the source object. The first key is the
    // start rule, so order is semantically significant here.
    rules: IndexMap<String, JsonRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extras: Vec<JsonRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    precedences: Vec<Vec<JsonPrecedenceEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    externals: Vec<JsonRule>,
    #[serde(default, rename = "inline", skip_serializing_if = "Vec::is_empty")]
    inline_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    supertypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    reserved: IndexMap<String, Vec<JsonRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inherits: Option<String>,
}

impl From<JsonGrammar> for Grammar {
    fn from(raw: JsonGrammar) -> Self {
        let rules_of = |v: Vec<JsonRule>| v.into_iter().map(Rule::from).collect::<Vec<_>>();
        Self {
            name: raw.name,
            rules: raw.rules.into_iter().map(|(k, v)| (k, v.into())).collect(),
            extras: rules_of(raw.extras),
            precedences: raw
                .precedences
                .into_iter()
                .map(|level| level.into_iter().map(Into::into).collect())
                .collect(),
            conflicts: raw.conflicts,
            externals: rules_of(raw.externals),
            inline: raw.inline_rules,
            supertypes: raw.supertypes,
            word: raw.word,
            reserved: raw
                .reserved
                .into_iter()
                .map(|(k, v)| (k, rules_of(v)))
                .collect(),
            inherits: raw.inherits,
        }
    }
}

impl From<&Grammar> for JsonGrammar {
    fn from(g: &Grammar) -> Self {
        let rules_of = |v: &[Rule]| v.iter().map(JsonRule::from).collect::<Vec<_>>();
        Self {
            name: g.name.clone(),
            rules: g
                .rules
                .iter()
                .map(|(k, v)| (k.clone(), JsonRule::from(v)))
                .collect(),
            extras: rules_of(&g.extras),
            precedences: g
                .precedences
                .iter()
                .map(|level| level.iter().map(JsonPrecedenceEntry::from).collect())
                .collect(),
            conflicts: g.conflicts.clone(),
            externals: rules_of(&g.externals),
            inline_rules: g.inline.clone(),
            supertypes: g.supertypes.clone(),
            word: g.word.clone(),
            reserved: g
                .reserved
                .iter()
                .map(|(k, v)| (k.clone(), rules_of(v)))
                .collect(),
            inherits: g.inherits.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonRule {
    Blank,
    String {
        value: String,
    },
    Pattern {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    Symbol {
        name: String,
    },
    Seq {
        members: Vec<JsonRule>,
    },
    Choice {
        members: Vec<JsonRule>,
    },
    Repeat {
        content: Box<JsonRule>,
    },
    Repeat1 {
        content: Box<JsonRule>,
    },
    Field {
        name: String,
        content: Box<JsonRule>,
    },
    Alias {
        content: Box<JsonRule>,
        value: String,
        named: bool,
    },
    Token {
        content: Box<JsonRule>,
    },
    ImmediateToken {
        content: Box<JsonRule>,
    },
    Prec {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecLeft {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecRight {
        value: JsonPrecedence,
        content: Box<JsonRule>,
    },
    PrecDynamic {
        value: i32,
        content: Box<JsonRule>,
    },
    Reserved {
        context_name: String,
        content: Box<JsonRule>,
    },
}

impl From<JsonRule> for Rule {
    fn from(raw: JsonRule) -> Self {
        let b = |c: Box<JsonRule>| Box::new(Rule::from(*c));
        let list = |m: Vec<JsonRule>| m.into_iter().map(Rule::from).collect();
        match raw {
            JsonRule::Blank => Rule::Blank,
            JsonRule::String { value } => Rule::String(value),
            JsonRule::Pattern { value, flags } => Rule::Pattern { value, flags },
            JsonRule::Symbol { name } => Rule::Symbol(name),
            JsonRule::Seq { members } => Rule::Seq(list(members)),
            JsonRule::Choice { members } => Rule::Choice(list(members)),
            JsonRule::Repeat { content } => Rule::Repeat(b(content)),
            JsonRule::Repeat1 { content } => Rule::Repeat1(b(content)),
            JsonRule::Field { name, content } => Rule::Field {
                name,
                content: b(content),
            },
            JsonRule::Alias {
                content,
                value,
                named,
            } => Rule::Alias {
                content: b(content),
                value,
                named,
            },
            JsonRule::Token { content } => Rule::Token(b(content)),
            JsonRule::ImmediateToken { content } => Rule::ImmediateToken(b(content)),
            JsonRule::Prec { value, content } => Rule::Prec {
                value: value.into(),
                content: b(content),
            },
            JsonRule::PrecLeft { value, content } => Rule::PrecLeft {
                value: value.into(),
                content: b(content),
            },
            JsonRule::PrecRight { value, content } => Rule::PrecRight {
                value: value.into(),
                content: b(content),
            },
            JsonRule::PrecDynamic { value, content } => Rule::PrecDynamic {
                value,
                content: b(content),
            },
            JsonRule::Reserved {
                context_name,
                content,
            } => Rule::Reserved {
                context_name,
                content: b(content),
            },
        }
    }
}

impl From<&Rule> for JsonRule {
    fn from(rule: &Rule) -> Self {
        let b = |c: &Rule| Box::new(JsonRule::from(c));
        let list = |m: &[Rule]| m.iter().map(JsonRule::from).collect();
        match rule {
            Rule::Blank => JsonRule::Blank,
            Rule::String(value) => JsonRule::String {
                value: value.clone(),
            },
            Rule::Pattern { value, flags } => JsonRule::Pattern {
                value: value.clone(),
                flags: flags.clone(),
            },
            Rule::Symbol(name) => JsonRule::Symbol { name: name.clone() },
            Rule::Seq(members) => JsonRule::Seq {
                members: list(members),
            },
            Rule::Choice(members) => JsonRule::Choice {
                members: list(members),
            },
            Rule::Repeat(c) => JsonRule::Repeat { content: b(c) },
            Rule::Repeat1(c) => JsonRule::Repeat1 { content: b(c) },
            Rule::Field { name, content } => JsonRule::Field {
                name: name.clone(),
                content: b(content),
            },
            Rule::Alias {
                content,
                value,
                named,
            } => JsonRule::Alias {
                content: b(content),
                value: value.clone(),
                named: *named,
            },
            Rule::Token(c) => JsonRule::Token { content: b(c) },
            Rule::ImmediateToken(c) => JsonRule::ImmediateToken { content: b(c) },
            Rule::Prec { value, content } => JsonRule::Prec {
                value: value.into(),
                content: b(content),
            },
            Rule::PrecLeft { value, content } => JsonRule::PrecLeft {
                value: value.into(),
                content: b(content),
            },
            Rule::PrecRight { value, content } => JsonRule::PrecRight {
                value: value.into(),
                content: b(content),
            },
            Rule::PrecDynamic { value, content } => JsonRule::PrecDynamic {
                value: *value,
                content: b(content),
            },
            Rule::Reserved {
                context_name,
                content,
            } => JsonRule::Reserved {
                context_name: context_name.clone(),
                content: b(content),
            },
        }
    }
}

/// Precedence is a bare integer or a bare string in JSON.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum JsonPrecedence {
    Integer(i32),
    Name(String),
}

impl From<JsonPrecedence> for Precedence {
    fn from(raw: JsonPrecedence) -> Self {
        match raw {
            JsonPrecedence::Integer(n) => Precedence::Integer(n),
            JsonPrecedence::Name(s) => Precedence::Name(s),
        }
    }
}

impl From<&Precedence> for JsonPrecedence {
    fn from(p: &Precedence) -> Self {
        match p {
            Precedence::Integer(n) => JsonPrecedence::Integer(*n),
            Precedence::Name(s) => JsonPrecedence::Name(s.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonPrecedenceEntry {
    String { value: String },
    Symbol { name: String },
}

impl From<JsonPrecedenceEntry> for PrecedenceEntry {
    fn from(raw: JsonPrecedenceEntry) -> Self {
        match raw {
            JsonPrecedenceEntry::String { value } => PrecedenceEntry::Name(value),
            JsonPrecedenceEntry::Symbol { name } => PrecedenceEntry::Symbol(name),
        }
    }
}

impl From<&PrecedenceEntry> for JsonPrecedenceEntry {
    fn from(e: &PrecedenceEntry) -> Self {
        match e {
            PrecedenceEntry::Name(value) => JsonPrecedenceEntry::String {
                value: value.clone(),
            },
            PrecedenceEntry::Symbol(name) => JsonPrecedenceEntry::Symbol { name: name.clone() },
        }
    }
}
