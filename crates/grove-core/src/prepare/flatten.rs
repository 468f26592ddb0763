//! Symbol numbering and expansion of rule bodies into productions.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::extract::{Extracted, Ir};
use crate::grammar::{Grammar, Precedence, PrecedenceEntry};
use crate::model::{Associativity, GrammarModel, Production, Step, TerminalDef};
use crate::symbol::{FieldId, Symbol, SymbolInfo, SymbolKind};
use crate::GrammarError;

/// Upper bound on alternatives a single rule body may expand into.
const MAX_ALTERNATIVES: usize = 1 << 16;

pub(super) fn flatten(grammar: &Grammar, ex: Extracted) -> Result<GrammarModel, GrammarError> {
    let mut symbols = vec![
        SymbolInfo {
            name: "end".to_string(),
            kind: SymbolKind::End,
            visible: false,
            named: false,
            supertype: false,
            origin: None,
        },
        SymbolInfo::new("ERROR", SymbolKind::Error),
    ];
    let first_terminal = symbols.len();
    for t in &ex.terminals {
        let mut info = SymbolInfo::new(&t.name, SymbolKind::Terminal);
        info.visible = t.visible;
        info.named = t.named;
        symbols.push(info);
    }
    let first_external = symbols.len();
    for e in &ex.externals {
        let mut info = SymbolInfo::new(&e.name, SymbolKind::External);
        info.named = e.named;
        info.visible |= !e.named;
        symbols.push(info);
    }
    let first_nonterminal = symbols.len();
    for (name, _) in &ex.rules {
        symbols.push(SymbolInfo::new(name, SymbolKind::NonTerminal));
    }

    let rule_symbol = |name: &str, context: &str| -> Result<Symbol, GrammarError> {
        ex.rules
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| Symbol::from_index(first_nonterminal + i))
            .ok_or_else(|| GrammarError::UndefinedSymbol {
                rule: context.to_string(),
                symbol: name.to_string(),
            })
    };

    for name in &grammar.supertypes {
        let symbol = rule_symbol(name, "supertypes")?;
        let info = &mut symbols[symbol.index()];
        info.supertype = true;
        info.visible = false;
    }

    let conflicts = grammar
        .conflicts
        .iter()
        .map(|set| {
            set.iter()
                .map(|name| rule_symbol(name, "conflicts"))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut declared_precedences = IndexSet::new();
    for entry in grammar.precedences.iter().flatten() {
        match entry {
            PrecedenceEntry::Name(name) => {
                declared_precedences.insert(name.as_str());
            }
            PrecedenceEntry::Symbol(name) => {
                if grammar.rule(name).is_none() {
                    return Err(GrammarError::UndefinedSymbol {
                        rule: "precedences".to_string(),
                        symbol: name.clone(),
                    });
                }
            }
        }
    }

    let mut f = Flattener {
        symbols,
        first_terminal,
        first_external,
        first_nonterminal,
        productions: Vec::new(),
        fields: IndexSet::new(),
        aliases: IndexSet::new(),
        aux_counts: HashMap::new(),
    };
    for (i, (_, ir)) in ex.rules.iter().enumerate() {
        let lhs = Symbol::from_index(first_nonterminal + i);
        let alts = f.flatten(ir, lhs, &Context::default())?;
        f.push_productions(lhs, alts)?;
    }

    let Flattener {
        mut symbols,
        productions: flat,
        fields,
        aliases,
        ..
    } = f;

    let nonterminal_count = symbols.len() - first_nonterminal;
    let mut alias_symbols = Vec::with_capacity(aliases.len());
    for (value, named) in &aliases {
        let existing = symbols.iter().position(|s| {
            &s.name == value
                && s.named == *named
                && matches!(
                    s.kind,
                    SymbolKind::Terminal | SymbolKind::External | SymbolKind::NonTerminal
                )
        });
        let symbol = match existing {
            Some(i) => Symbol::from_index(i),
            None => {
                let mut info = SymbolInfo::new(value, SymbolKind::Alias);
                info.named = *named;
                info.visible |= !named;
                symbols.push(info);
                Symbol::from_index(symbols.len() - 1)
            }
        };
        alias_symbols.push(symbol);
    }
    if symbols.len() > u16::MAX as usize {
        return Err(GrammarError::TooManySymbols);
    }

    let field_names: Vec<String> = fields.into_iter().collect();
    let mut by_lhs = vec![Vec::new(); nonterminal_count];
    let mut productions = Vec::with_capacity(flat.len());
    for (id, FlatProduction { lhs, alt }) in flat.into_iter().enumerate() {
        by_lhs[lhs.index() - first_nonterminal].push(id);
        let steps = alt
            .steps
            .into_iter()
            .map(|s| {
                if let Precedence::Name(name) = &s.precedence
                    && !declared_precedences.contains(name.as_str())
                {
                    return Err(GrammarError::UndefinedPrecedence { name: name.clone() });
                }
                Ok(Step {
                    symbol: s.symbol,
                    precedence: s.precedence,
                    associativity: s.associativity,
                    field: s.field,
                    alias: s.alias.map(|a| alias_symbols[a]),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        productions.push(Production {
            lhs,
            steps,
            dynamic_precedence: alt.dynamic,
        });
    }

    let terminal_symbol = |slot: usize| Symbol::from_index(first_terminal + slot);
    let mut extras = Vec::new();
    for ir in &ex.extras {
        let symbol = match ir {
            Ir::Terminal(slot) => terminal_symbol(*slot),
            Ir::External(i) => Symbol::from_index(first_external + i),
            _ => continue,
        };
        if !extras.contains(&symbol) {
            extras.push(symbol);
        }
    }

    Ok(GrammarModel {
        name: grammar.name.clone(),
        terminals: ex
            .terminals
            .iter()
            .enumerate()
            .map(|(slot, t)| TerminalDef {
                symbol: terminal_symbol(slot),
                pattern: t.pattern.clone(),
                precedence: t.precedence,
                immediate: t.immediate,
            })
            .collect(),
        externals: (first_external..first_nonterminal)
            .map(Symbol::from_index)
            .collect(),
        symbols,
        productions,
        by_lhs,
        first_nonterminal: first_nonterminal as u16,
        start: Symbol::from_index(first_nonterminal),
        extras,
        conflicts,
        precedences: grammar.precedences.clone(),
        word: ex.word.map(terminal_symbol),
        field_names,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct FlatStep {
    symbol: Symbol,
    precedence: Precedence,
    associativity: Option<Associativity>,
    field: Option<FieldId>,
    /// Index into the alias table, resolved to a symbol at the end.
    alias: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Alt {
    steps: Vec<FlatStep>,
    dynamic: i32,
}

struct FlatProduction {
    lhs: Symbol,
    alt: Alt,
}

/// Annotations inherited from enclosing wrappers.
#[derive(Clone, Debug, Default)]
struct Context {
    precedence: Precedence,
    associativity: Option<Associativity>,
    field: Option<FieldId>,
    alias: Option<usize>,
}

impl Context {
    fn step(&self, symbol: Symbol) -> FlatStep {
        FlatStep {
            symbol,
            precedence: self.precedence.clone(),
            associativity: self.associativity,
            field: self.field,
            alias: self.alias,
        }
    }

    /// Context for the body of an auxiliary rule: precedence carries over,
    /// child labels stay on the step that references the auxiliary rule.
    fn inner(&self) -> Context {
        Context {
            precedence: self.precedence.clone(),
            associativity: self.associativity,
            field: None,
            alias: None,
        }
    }
}

struct Flattener {
    symbols: Vec<SymbolInfo>,
    first_terminal: usize,
    first_external: usize,
    first_nonterminal: usize,
    productions: Vec<FlatProduction>,
    fields: IndexSet<String>,
    aliases: IndexSet<(String, bool)>,
    aux_counts: HashMap<Symbol, usize>,
}

impl Flattener {
    fn flatten(&mut self, ir: &Ir, lhs: Symbol, ctx: &Context) -> Result<Vec<Alt>, GrammarError> {
        let single = |symbol: Symbol| {
            vec![Alt {
                steps: vec![ctx.step(symbol)],
                dynamic: 0,
            }]
        };
        Ok(match ir {
            Ir::Blank => vec![Alt::default()],
            Ir::Terminal(slot) => single(Symbol::from_index(self.first_terminal + slot)),
            Ir::External(i) => single(Symbol::from_index(self.first_external + i)),
            Ir::Rule(i) => single(Symbol::from_index(self.first_nonterminal + i)),
            Ir::Seq(members) => {
                let mut acc = vec![Alt::default()];
                for member in members {
                    let tails = self.flatten(member, lhs, ctx)?;
                    if acc.len() * tails.len() > MAX_ALTERNATIVES {
                        return Err(GrammarError::TooManyProductions {
                            rule: self.origin_name(lhs),
                        });
                    }
                    acc = acc
                        .iter()
                        .flat_map(|head| {
                            tails.iter().map(move |tail| {
                                let mut steps = head.steps.clone();
                                steps.extend(tail.steps.iter().cloned());
                                Alt {
                                    steps,
                                    dynamic: stronger(head.dynamic, tail.dynamic),
                                }
                            })
                        })
                        .collect();
                }
                acc
            }
            Ir::Choice(members) => {
                let mut alts = Vec::new();
                for member in members {
                    alts.extend(self.flatten(member, lhs, ctx)?);
                }
                alts
            }
            Ir::Repeat(content) => {
                let aux = self.repeat(content, lhs, ctx)?;
                let mut alts = vec![Alt::default()];
                alts.extend(aux.map(single).unwrap_or_default());
                alts
            }
            Ir::Repeat1(content) => match self.repeat(content, lhs, ctx)? {
                Some(aux) => single(aux),
                None => vec![Alt::default()],
            },
            Ir::Prec {
                value,
                associativity,
                content,
            } => {
                let ctx = Context {
                    precedence: value.clone(),
                    associativity: *associativity,
                    ..ctx.clone()
                };
                self.flatten(content, lhs, &ctx)?
            }
            Ir::Dynamic { value, content } => {
                let mut alts = self.flatten(content, lhs, ctx)?;
                for alt in &mut alts {
                    alt.dynamic = stronger(alt.dynamic, *value);
                }
                alts
            }
            Ir::Field { name, content } => {
                let index = self.fields.insert_full(name.clone()).0;
                let field = u16::try_from(index + 1)
                    .ok()
                    .and_then(FieldId::new)
                    .ok_or(GrammarError::TooManySymbols)?;
                let ctx = Context {
                    field: Some(field),
                    ..ctx.clone()
                };
                self.flatten(content, lhs, &ctx)?
            }
            Ir::Alias {
                value,
                named,
                content,
            } => {
                let alias = self.aliases.insert_full((value.clone(), *named)).0;
                let ctx = Context {
                    alias: Some(alias),
                    ..ctx.clone()
                };
                match **content {
                    Ir::Terminal(_) | Ir::External(_) | Ir::Rule(_) => {
                        self.flatten(content, lhs, &ctx)?
                    }
                    _ => {
                        let aux = self.aux(lhs, "alias")?;
                        let body = self.flatten(content, lhs, &ctx.inner())?;
                        self.push_productions(aux, body)?;
                        vec![Alt {
                            steps: vec![ctx.step(aux)],
                            dynamic: 0,
                        }]
                    }
                }
            }
        })
    }

    /// Left-recursive auxiliary rule `aux → aux body | body`. Returns `None`
    /// when the body can only match the empty string.
    fn repeat(&mut self, content: &Ir, lhs: Symbol, ctx: &Context) -> Result<Option<Symbol>, GrammarError> {
        let inner = ctx.inner();
        let mut body = self.flatten(content, lhs, &inner)?;
        body.retain(|alt| !alt.steps.is_empty());
        if body.is_empty() {
            return Ok(None);
        }
        let aux = self.aux(lhs, "repeat")?;
        let mut alts = Vec::with_capacity(body.len() * 2);
        for alt in &body {
            let mut steps = vec![inner.step(aux)];
            steps.extend(alt.steps.iter().cloned());
            alts.push(Alt {
                steps,
                dynamic: alt.dynamic,
            });
        }
        alts.extend(body);
        self.push_productions(aux, alts)?;
        Ok(Some(aux))
    }

    fn aux(&mut self, lhs: Symbol, kind: &str) -> Result<Symbol, GrammarError> {
        if self.symbols.len() >= u16::MAX as usize {
            return Err(GrammarError::TooManySymbols);
        }
        let origin = self.symbols[lhs.index()].origin.unwrap_or(lhs);
        let count = self.aux_counts.entry(origin).or_default();
        *count += 1;
        let name = format!("{}_{kind}{count}", self.symbols[origin.index()].name);
        let mut info = SymbolInfo::new(name, SymbolKind::Auxiliary);
        info.visible = false;
        info.origin = Some(origin);
        self.symbols.push(info);
        Ok(Symbol::from_index(self.symbols.len() - 1))
    }

    fn push_productions(&mut self, lhs: Symbol, alts: Vec<Alt>) -> Result<(), GrammarError> {
        let mut unique: Vec<Alt> = Vec::with_capacity(alts.len());
        for alt in alts {
            if !unique.contains(&alt) {
                unique.push(alt);
            }
        }
        if unique.is_empty() {
            return Err(GrammarError::NonProductive {
                rule: self.origin_name(lhs),
            });
        }
        self.productions
            .extend(unique.into_iter().map(|alt| FlatProduction { lhs, alt }));
        Ok(())
    }

    fn origin_name(&self, symbol: Symbol) -> String {
        let info = &self.symbols[symbol.index()];
        let origin = info.origin.unwrap_or(symbol);
        self.symbols[origin.index()].name.clone()
    }
}

/// The dynamic precedence with the larger magnitude wins.
fn stronger(a: i32, b: i32) -> i32 {
    if b.unsigned_abs() > a.unsigned_abs() { b } else { a }
}
