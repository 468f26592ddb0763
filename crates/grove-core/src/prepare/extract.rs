//! Rule indexing and token extraction.
//!
//! Rule bodies are lowered to [`Ir`], where every token (literal, pattern,
//! `token(...)`, reference to a lexical rule) has been replaced by a slot in
//! the terminal list. Slots are assigned on first appearance, walking the
//! extras and then the rules in definition order, so slot order is the
//! terminal declaration order.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use super::token;
use crate::GrammarError;
use crate::grammar::{Grammar, Precedence, Rule};
use crate::model::{Associativity, TokenPattern};

/// Rule body with tokens resolved to slots.
#[derive(Clone, Debug)]
pub(super) enum Ir {
    Blank,
    Terminal(usize),
    External(usize),
    Rule(usize),
    Seq(Vec<Ir>),
    Choice(Vec<Ir>),
    Repeat(Box<Ir>),
    Repeat1(Box<Ir>),
    Prec {
        value: Precedence,
        associativity: Option<Associativity>,
        content: Box<Ir>,
    },
    Dynamic {
        value: i32,
        content: Box<Ir>,
    },
    Field {
        name: String,
        content: Box<Ir>,
    },
    Alias {
        value: String,
        named: bool,
        content: Box<Ir>,
    },
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum TerminalKey {
    Rule(String),
    Literal { text: String, immediate: bool },
    Pattern { regex: String, immediate: bool },
}

#[derive(Debug)]
pub(super) struct PendingTerminal {
    pub name: String,
    pub named: bool,
    pub visible: bool,
    pub pattern: TokenPattern,
    pub precedence: i32,
    pub immediate: bool,
}

#[derive(Debug)]
pub(super) struct PendingExternal {
    pub name: String,
    pub named: bool,
}

#[derive(Debug)]
pub(super) struct Extracted {
    /// Terminals in declaration order. `Ir::Terminal` indexes this.
    pub terminals: Vec<PendingTerminal>,
    pub externals: Vec<PendingExternal>,
    /// Syntax rules in definition order, start rule first. `Ir::Rule` indexes this.
    pub rules: Vec<(String, Ir)>,
    pub extras: Vec<Ir>,
    /// Terminal slot of the word token.
    pub word: Option<usize>,
}

pub(super) fn extract(grammar: &Grammar) -> Result<Extracted, GrammarError> {
    let rules: IndexMap<&str, &Rule> = grammar
        .rules
        .iter()
        .map(|(name, rule)| (name.as_str(), rule))
        .collect();
    let Some((&start, _)) = rules.first() else {
        return Err(GrammarError::EmptyGrammar);
    };

    // (name, named): named externals are referenced by symbol, anonymous by literal text.
    let mut externals: IndexSet<(&str, bool)> = IndexSet::new();
    for (index, rule) in grammar.externals.iter().enumerate() {
        match rule {
            Rule::Symbol(name) => externals.insert((name.as_str(), true)),
            Rule::String(text) => externals.insert((text.as_str(), false)),
            _ => return Err(GrammarError::InvalidExternal { index }),
        };
    }
    let is_external = |name: &str| externals.contains(&(name, true));

    let mut inline = IndexSet::new();
    for name in &grammar.inline {
        if !rules.contains_key(name.as_str()) {
            return Err(GrammarError::UndefinedSymbol {
                rule: "inline".to_string(),
                symbol: name.clone(),
            });
        }
        inline.insert(name.as_str());
    }
    if inline.contains(start) {
        return Err(invalid_start(start, "cannot be inlined"));
    }
    if is_external(start) {
        return Err(invalid_start(start, "cannot be an external token"));
    }

    let mut refs = Vec::new();
    for (&name, rule) in &rules {
        refs.clear();
        symbol_refs(rule, &mut refs);
        if let Some(missing) = refs
            .iter()
            .find(|s| !rules.contains_key(**s) && !is_external(**s))
        {
            return Err(GrammarError::UndefinedSymbol {
                rule: name.to_string(),
                symbol: missing.to_string(),
            });
        }
    }

    let lexical: IndexSet<&str> = rules
        .iter()
        .filter(|(name, rule)| {
            **name != start && !inline.contains(**name) && !is_external(**name) && is_lexical(rule)
        })
        .map(|(name, _)| *name)
        .collect();

    // Reachability over rule names. Extras and the word token are roots too.
    let mut stack = vec![start];
    for extra in &grammar.extras {
        symbol_refs(extra, &mut stack);
    }
    if let Some(word) = &grammar.word {
        stack.push(word);
    }
    let mut reachable: IndexSet<&str> = IndexSet::new();
    while let Some(name) = stack.pop() {
        if !reachable.insert(name) || is_external(name) {
            continue;
        }
        match rules.get(name) {
            Some(rule) => symbol_refs(rule, &mut stack),
            None => {
                return Err(GrammarError::UndefinedSymbol {
                    rule: "extras".to_string(),
                    symbol: name.to_string(),
                });
            }
        }
    }
    if let Some(&unused) = rules
        .keys()
        .find(|n| !reachable.contains(**n) && !lexical.contains(**n) && !is_external(**n))
    {
        return Err(GrammarError::UnreachableRule {
            rule: unused.to_string(),
        });
    }

    let syntax: IndexSet<&str> = rules
        .keys()
        .copied()
        .filter(|n| !lexical.contains(n) && !inline.contains(n) && !is_external(*n))
        .collect();

    let mut ex = Extractor {
        rules: &rules,
        lexical: &lexical,
        inline: &inline,
        externals: &externals,
        syntax: &syntax,
        terminals: IndexMap::new(),
        aux_counts: HashMap::new(),
        inline_stack: Vec::new(),
    };

    let extras = grammar
        .extras
        .iter()
        .map(|rule| ex.extra(rule))
        .collect::<Result<Vec<_>, _>>()?;

    let mut lowered = Vec::with_capacity(syntax.len());
    for (&name, &rule) in &rules {
        if lexical.contains(name) {
            if reachable.contains(name) {
                ex.named_terminal(name)?;
            }
        } else if syntax.contains(name) {
            lowered.push((name.to_string(), ex.lower(rule, name)?));
        }
    }

    let word = match &grammar.word {
        Some(name) if lexical.contains(name.as_str()) => Some(ex.named_terminal(name)?),
        Some(name) => {
            return Err(GrammarError::InvalidWord {
                symbol: name.clone(),
            });
        }
        None => None,
    };

    Ok(Extracted {
        terminals: ex.terminals.into_values().collect(),
        externals: externals
            .iter()
            .map(|&(name, named)| PendingExternal {
                name: name.to_string(),
                named,
            })
            .collect(),
        rules: lowered,
        extras,
        word,
    })
}

fn invalid_start(rule: &str, reason: &'static str) -> GrammarError {
    GrammarError::InvalidStartRule {
        rule: rule.to_string(),
        reason,
    }
}

struct Extractor<'g, 'a> {
    rules: &'a IndexMap<&'g str, &'g Rule>,
    lexical: &'a IndexSet<&'g str>,
    inline: &'a IndexSet<&'g str>,
    externals: &'a IndexSet<(&'g str, bool)>,
    syntax: &'a IndexSet<&'g str>,
    terminals: IndexMap<TerminalKey, PendingTerminal>,
    aux_counts: HashMap<&'g str, usize>,
    inline_stack: Vec<&'g str>,
}

impl<'g> Extractor<'g, '_> {
    fn extra(&mut self, rule: &'g Rule) -> Result<Ir, GrammarError> {
        match self.lower(rule, "extras")? {
            ir @ (Ir::Terminal(_) | Ir::External(_)) => Ok(ir),
            _ => Err(GrammarError::NonTerminalExtra {
                symbol: match rule {
                    Rule::Symbol(name) => name.clone(),
                    other => format!("{other:?}"),
                },
            }),
        }
    }

    fn lower(&mut self, rule: &'g Rule, owner: &'g str) -> Result<Ir, GrammarError> {
        let boxed = |ir: Ir| Box::new(ir);
        Ok(match rule {
            Rule::Blank => Ir::Blank,
            Rule::String(text) => self.literal(text, false, 0, owner)?,
            Rule::Pattern { value, flags } => {
                let regex = token::pattern_regex(value, flags.as_deref());
                Ir::Terminal(self.pattern_terminal(regex, false, 0, owner)?)
            }
            Rule::Symbol(name) => self.reference(name, owner)?,
            Rule::Seq(members) => Ir::Seq(self.lower_all(members, owner)?),
            Rule::Choice(members) => Ir::Choice(self.lower_all(members, owner)?),
            Rule::Repeat(c) => Ir::Repeat(boxed(self.lower(c, owner)?)),
            Rule::Repeat1(c) => Ir::Repeat1(boxed(self.lower(c, owner)?)),
            Rule::Field { name, content } => Ir::Field {
                name: name.clone(),
                content: boxed(self.lower(content, owner)?),
            },
            Rule::Alias {
                content,
                value,
                named,
            } => Ir::Alias {
                value: value.clone(),
                named: *named,
                content: boxed(self.lower(content, owner)?),
            },
            Rule::Token(c) => self.token(c, false, owner)?,
            Rule::ImmediateToken(c) => self.token(c, true, owner)?,
            Rule::Prec { value, content } => self.prec(value, None, content, owner)?,
            Rule::PrecLeft { value, content } => {
                self.prec(value, Some(Associativity::Left), content, owner)?
            }
            Rule::PrecRight { value, content } => {
                self.prec(value, Some(Associativity::Right), content, owner)?
            }
            Rule::PrecDynamic { value, content } => Ir::Dynamic {
                value: *value,
                content: boxed(self.lower(content, owner)?),
            },
            Rule::Reserved { content, .. } => self.lower(content, owner)?,
        })
    }

    fn lower_all(&mut self, rules: &'g [Rule], owner: &'g str) -> Result<Vec<Ir>, GrammarError> {
        rules.iter().map(|r| self.lower(r, owner)).collect()
    }

    fn prec(
        &mut self,
        value: &Precedence,
        associativity: Option<Associativity>,
        content: &'g Rule,
        owner: &'g str,
    ) -> Result<Ir, GrammarError> {
        Ok(Ir::Prec {
            value: value.clone(),
            associativity,
            content: Box::new(self.lower(content, owner)?),
        })
    }

    fn reference(&mut self, name: &'g str, owner: &'g str) -> Result<Ir, GrammarError> {
        if let Some(i) = self.externals.get_index_of(&(name, true)) {
            return Ok(Ir::External(i));
        }
        if self.lexical.contains(name) {
            return Ok(Ir::Terminal(self.named_terminal(name)?));
        }
        if self.inline.contains(name) {
            if self.inline_stack.contains(&name) {
                return Err(GrammarError::InlineCycle {
                    rule: name.to_string(),
                });
            }
            let body: &'g Rule = self.rules[name];
            self.inline_stack.push(name);
            let lowered = self.lower(body, owner);
            self.inline_stack.pop();
            return lowered;
        }
        match self.syntax.get_index_of(name) {
            Some(i) => Ok(Ir::Rule(i)),
            None => Err(GrammarError::UndefinedSymbol {
                rule: owner.to_string(),
                symbol: name.to_string(),
            }),
        }
    }

    /// `token(...)` content: a literal stays a literal, anything else becomes
    /// one hidden pattern terminal.
    fn token(&mut self, content: &'g Rule, immediate: bool, owner: &'g str) -> Result<Ir, GrammarError> {
        let precedence = lexical_precedence(content);
        if let Some(text) = literal_of(content) {
            return self.literal(text, immediate, precedence, owner);
        }
        let regex = self.token_regex(content, owner, &mut Vec::new())?;
        Ok(Ir::Terminal(
            self.pattern_terminal(regex, immediate, precedence, owner)?,
        ))
    }

    fn literal(
        &mut self,
        text: &str,
        immediate: bool,
        precedence: i32,
        owner: &str,
    ) -> Result<Ir, GrammarError> {
        if !immediate && let Some(i) = self.externals.get_index_of(&(text, false)) {
            return Ok(Ir::External(i));
        }
        if text.is_empty() {
            return Err(GrammarError::EmptyToken {
                rule: owner.to_string(),
            });
        }
        let entry = self.terminals.entry(TerminalKey::Literal {
            text: text.to_string(),
            immediate,
        });
        let slot = entry.index();
        entry.or_insert_with(|| PendingTerminal {
            name: text.to_string(),
            named: false,
            visible: true,
            pattern: TokenPattern::Literal(text.to_string()),
            precedence,
            immediate,
        });
        Ok(Ir::Terminal(slot))
    }

    fn pattern_terminal(
        &mut self,
        regex: String,
        immediate: bool,
        precedence: i32,
        owner: &'g str,
    ) -> Result<usize, GrammarError> {
        let key = TerminalKey::Pattern {
            regex: regex.clone(),
            immediate,
        };
        if let Some(slot) = self.terminals.get_index_of(&key) {
            return Ok(slot);
        }
        token::validate(&regex, owner)?;
        let count = self.aux_counts.entry(owner).or_default();
        *count += 1;
        let terminal = PendingTerminal {
            name: format!("{owner}_token{count}"),
            named: true,
            visible: false,
            pattern: TokenPattern::Regex(regex),
            precedence,
            immediate,
        };
        Ok(self.terminals.insert_full(key, terminal).0)
    }

    /// Slot of a lexical rule, declaring it on first use.
    fn named_terminal(&mut self, name: &'g str) -> Result<usize, GrammarError> {
        let key = TerminalKey::Rule(name.to_string());
        if let Some(slot) = self.terminals.get_index_of(&key) {
            return Ok(slot);
        }
        let body: &'g Rule = self.rules[name];
        let pattern = match literal_of(body) {
            Some("") => {
                return Err(GrammarError::EmptyToken {
                    rule: name.to_string(),
                });
            }
            Some(text) => TokenPattern::Literal(text.to_string()),
            None => {
                let regex = self.token_regex(body, name, &mut vec![name])?;
                token::validate(&regex, name)?;
                TokenPattern::Regex(regex)
            }
        };
        let terminal = PendingTerminal {
            name: name.to_string(),
            named: true,
            visible: !name.starts_with('_'),
            pattern,
            precedence: lexical_precedence(body),
            immediate: is_immediate(body),
        };
        Ok(self.terminals.insert_full(key, terminal).0)
    }

    /// Compose a token rule into one regex. Lexical rules may reference
    /// other lexical rules; syntax rules may not appear inside tokens.
    fn token_regex(
        &self,
        rule: &'g Rule,
        owner: &str,
        stack: &mut Vec<&'g str>,
    ) -> Result<String, GrammarError> {
        Ok(match rule {
            Rule::Blank => String::new(),
            Rule::String(text) => regex_syntax::escape(text),
            Rule::Pattern { value, flags } => token::pattern_regex(value, flags.as_deref()),
            Rule::Symbol(name) => {
                let name = name.as_str();
                if !self.lexical.contains(name) || stack.contains(&name) {
                    return Err(GrammarError::SymbolInToken {
                        rule: owner.to_string(),
                        symbol: name.to_string(),
                    });
                }
                stack.push(name);
                let inner = self.token_regex(self.rules[name], owner, stack)?;
                stack.pop();
                format!("(?:{inner})")
            }
            Rule::Seq(members) => members
                .iter()
                .map(|m| self.token_regex(m, owner, stack))
                .collect::<Result<Vec<_>, _>>()?
                .concat(),
            Rule::Choice(members) => {
                let alternatives = members
                    .iter()
                    .map(|m| self.token_regex(m, owner, stack))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("(?:{})", alternatives.join("|"))
            }
            Rule::Repeat(c) => format!("(?:{})*", self.token_regex(c, owner, stack)?),
            Rule::Repeat1(c) => format!("(?:{})+", self.token_regex(c, owner, stack)?),
            other => match other.content() {
                Some(content) => self.token_regex(content, owner, stack)?,
                None => String::new(),
            },
        })
    }
}

/// Rule names referenced anywhere inside `rule`.
fn symbol_refs<'r>(rule: &'r Rule, out: &mut Vec<&'r str>) {
    match rule {
        Rule::Symbol(name) => out.push(name),
        Rule::Seq(members) | Rule::Choice(members) => {
            for m in members {
                symbol_refs(m, out);
            }
        }
        other => {
            if let Some(content) = other.content() {
                symbol_refs(content, out);
            }
        }
    }
}

/// A rule is lexical when its whole body is one token: a literal, a pattern
/// or a `token(...)`, possibly under precedence wrappers.
fn is_lexical(rule: &Rule) -> bool {
    match rule {
        Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_) | Rule::ImmediateToken(_) => true,
        Rule::Prec { content, .. }
        | Rule::PrecLeft { content, .. }
        | Rule::PrecRight { content, .. }
        | Rule::Reserved { content, .. } => is_lexical(content),
        _ => false,
    }
}

/// Literal text under precedence and token wrappers.
fn literal_of(rule: &Rule) -> Option<&str> {
    match rule {
        Rule::String(text) => Some(text),
        Rule::Token(c)
        | Rule::ImmediateToken(c)
        | Rule::Prec { content: c, .. }
        | Rule::PrecLeft { content: c, .. }
        | Rule::PrecRight { content: c, .. }
        | Rule::Reserved { content: c, .. } => literal_of(c),
        _ => None,
    }
}

/// Outermost numeric precedence, as in `token(prec(2, ...))`.
fn lexical_precedence(rule: &Rule) -> i32 {
    match rule {
        Rule::Prec { value, .. } | Rule::PrecLeft { value, .. } | Rule::PrecRight { value, .. } => {
            match value {
                Precedence::Integer(n) => *n,
                Precedence::Name(_) => 0,
            }
        }
        Rule::Token(c) | Rule::ImmediateToken(c) | Rule::Reserved { content: c, .. } => {
            lexical_precedence(c)
        }
        _ => 0,
    }
}

fn is_immediate(rule: &Rule) -> bool {
    match rule {
        Rule::ImmediateToken(_) => true,
        Rule::Token(c)
        | Rule::Prec { content: c, .. }
        | Rule::PrecLeft { content: c, .. }
        | Rule::PrecRight { content: c, .. } => is_immediate(c),
        _ => false,
    }
}
