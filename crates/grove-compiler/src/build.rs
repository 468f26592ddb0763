//! Table assembly: automaton, resolved actions, lexical table.

use std::collections::BTreeMap;

use grove_core::{GrammarError, GrammarModel, Production, Symbol};
use grove_table::{Action, ParseState, ParseTable, ProductionInfo, TableParts};

use crate::automaton::{self, Automaton};
use crate::conflicts::{Candidates, Resolver};
use crate::lexical::build_lex_table;
use crate::sets::FirstSets;
use crate::BuildOptions;

pub(crate) fn build(model: &GrammarModel, options: BuildOptions) -> Result<ParseTable, GrammarError> {
    let first = FirstSets::compute(model);
    let automaton = automaton::build(model, &first, options.state_merging);
    tracing::info!(
        "{}: {} states from {} productions ({:?})",
        model.name(),
        automaton.states.len(),
        model.productions().len(),
        options.state_merging
    );

    let resolver = Resolver::new(model, options.resolution_order);
    let mut states = (0..automaton.states.len())
        .map(|id| parse_state(model, &automaton, &resolver, id))
        .collect::<Result<Vec<_>, _>>()?;

    let forks = states
        .iter()
        .flat_map(|s| &s.actions)
        .filter(|(_, actions)| actions.len() > 1)
        .count();
    if forks > 0 {
        tracing::info!("{}: {} fork points kept for declared conflicts", model.name(), forks);
    }

    let lex = build_lex_table(model, &mut states)?;

    Ok(ParseTable::new(TableParts {
        name: model.name().to_string(),
        symbols: model.symbols().to_vec(),
        start: model.start(),
        states,
        productions: model.productions().iter().map(production_info).collect(),
        field_names: model.field_names().to_vec(),
        extras: model.extras().to_vec(),
        externals: model.externals().to_vec(),
        lex,
    }))
}

fn parse_state(
    model: &GrammarModel,
    automaton: &Automaton,
    resolver: &Resolver<'_>,
    id: usize,
) -> Result<ParseState, GrammarError> {
    let lr = &automaton.states[id];
    let augmented = automaton.augmented();

    let mut candidates: BTreeMap<Symbol, Candidates> = BTreeMap::new();
    for (&(production, dot), lookahead) in &lr.items {
        match automaton.rhs[production].get(dot) {
            Some(&next) if model.is_terminal(next) => {
                let entry = candidates.entry(next).or_default();
                entry.shift = lr.transitions.get(&next).copied();
                entry.shift_items.push((production, dot));
            }
            Some(_) => {}
            None if production == augmented => candidates.entry(Symbol::END).or_default().accept = true,
            None => {
                for terminal in lookahead.iter() {
                    candidates.entry(terminal).or_default().reduces.push(production);
                }
            }
        }
    }

    let mut actions: BTreeMap<Symbol, Box<[Action]>> = BTreeMap::new();
    for (lookahead, c) in candidates {
        actions.insert(lookahead, resolver.resolve(id, lookahead, c)?);
    }
    for &extra in model.extras() {
        actions.entry(extra).or_insert_with(|| Box::new([Action::ShiftExtra]));
    }

    let gotos = lr
        .transitions
        .iter()
        .filter(|(symbol, _)| !model.is_terminal(**symbol))
        .map(|(&symbol, &target)| (symbol, target))
        .collect();
    let kernel = lr
        .kernel
        .keys()
        .copied()
        .filter(|&(production, _)| production != augmented)
        .collect();

    Ok(ParseState {
        actions: actions.into_iter().collect(),
        gotos,
        lex_mode: 0,
        kernel,
    })
}

fn production_info(p: &Production) -> ProductionInfo {
    ProductionInfo {
        lhs: p.lhs,
        rhs: p.steps.iter().map(|s| s.symbol).collect(),
        fields: p.steps.iter().map(|s| s.field).collect(),
        aliases: p.steps.iter().map(|s| s.alias).collect(),
        dynamic_precedence: p.dynamic_precedence,
    }
}
