//! Rust source generation for node kind enums.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use grove_core::{Symbol, SymbolKind};
use grove_table::ParseTable;

/// Emit a `#[repr(u16)]` enum with one variant per visible node kind.
///
/// Discriminants are the table's symbol ids, so `kind as u16` can be
/// compared against a node's symbol directly.
pub fn rust_node_kinds(table: &ParseTable) -> String {
    let mut used = BTreeSet::new();
    let mut variants = Vec::new();
    for (i, info) in table.symbols().iter().enumerate() {
        let keep = info.kind == SymbolKind::Error
            || (info.visible && !matches!(info.kind, SymbolKind::End | SymbolKind::Auxiliary));
        if !keep {
            continue;
        }
        let symbol = Symbol::from_index(i);
        let base = match info.kind {
            SymbolKind::Error => "Error".to_string(),
            _ if info.named => to_pascal_case(&info.name),
            _ => anonymous_name(&info.name),
        };
        let mut name = base.clone();
        if !used.insert(name.clone()) {
            name = format!("{base}{}", symbol.get());
            used.insert(name.clone());
        }
        variants.push((name, symbol, table.display_symbol(symbol)));
    }

    let mut out = String::new();
    let _ = writeln!(out, "/// Node kinds of the `{}` grammar.", table.name());
    out.push_str("#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]\n");
    out.push_str("#[repr(u16)]\n");
    out.push_str("pub enum NodeKind {\n");
    for (name, symbol, display) in &variants {
        let _ = writeln!(out, "    /// `{display}`");
        let _ = writeln!(out, "    {name} = {},", symbol.get());
    }
    out.push_str("}\n\n");

    out.push_str("impl NodeKind {\n");
    out.push_str("    pub const fn from_id(id: u16) -> Option<Self> {\n");
    out.push_str("        match id {\n");
    for (name, symbol, _) in &variants {
        let _ = writeln!(out, "            {} => Some(Self::{name}),", symbol.get());
    }
    out.push_str("            _ => None,\n");
    out.push_str("        }\n");
    out.push_str("    }\n\n");
    out.push_str("    pub const fn name(self) -> &'static str {\n");
    out.push_str("        match self {\n");
    for (name, symbol, _) in &variants {
        let _ = writeln!(out, "            Self::{name} => {:?},", table.symbol_name(*symbol));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

fn to_pascal_case(name: &str) -> String {
    let mut out = String::new();
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        return anonymous_name(name);
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}

/// Keywords become `KwIf`, punctuation is spelled out: `->` is `MinusGt`.
fn anonymous_name(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') && !text.is_empty() {
        return format!("Kw{}", to_pascal_case(text));
    }
    let mut out = String::new();
    for c in text.chars() {
        match punctuation_name(c) {
            Some(name) => out.push_str(name),
            None if c.is_ascii_alphanumeric() => out.push(c.to_ascii_uppercase()),
            None => {
                let _ = write!(out, "U{:04X}", c as u32);
            }
        }
    }
    if out.is_empty() {
        out.push_str("Empty");
    }
    out
}

fn punctuation_name(c: char) -> Option<&'static str> {
    Some(match c {
        '+' => "Plus",
        '-' => "Minus",
        '*' => "Star",
        '/' => "Slash",
        '%' => "Percent",
        '(' => "LParen",
        ')' => "RParen",
        '[' => "LBracket",
        ']' => "RBracket",
        '{' => "LBrace",
        '}' => "RBrace",
        '<' => "Lt",
        '>' => "Gt",
        '=' => "Eq",
        '!' => "Bang",
        '&' => "Amp",
        '|' => "Pipe",
        '^' => "Caret",
        '~' => "Tilde",
        '?' => "Question",
        ':' => "Colon",
        ';' => "Semi",
        ',' => "Comma",
        '.' => "Dot",
        '@' => "At",
        '#' => "Hash",
        '$' => "Dollar",
        '\'' => "Quote",
        '"' => "DoubleQuote",
        '`' => "Backtick",
        '\\' => "Backslash",
        '_' => "Underscore",
        ' ' => "Space",
        '\t' => "Tab",
        '\n' => "Newline",
        '\r' => "Return",
        _ => return None,
    })
}
