//! Grammar type definitions.

/// Complete grammar in declarative form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Grammar name (e.g., "arithmetic", "json").
    pub name: String,
    /// Rules in definition order. The first one is the start rule.
    pub rules: Vec<(String, Rule)>,
    /// Tokens allowed anywhere between other tokens (whitespace, comments).
    pub extras: Vec<Rule>,
    /// Named precedence orderings, highest first within each list.
    pub precedences: Vec<Vec<PrecedenceEntry>>,
    /// Rule sets whose LR conflicts are resolved by forking at parse time.
    pub conflicts: Vec<Vec<String>>,
    /// Tokens produced by an external scanner.
    pub externals: Vec<Rule>,
    /// Rules substituted at every use site.
    pub inline: Vec<String>,
    /// Rules that only group other rules and stay hidden in trees.
    pub supertypes: Vec<String>,
    /// Identifier rule used for keyword extraction.
    pub word: Option<String>,
    /// Reserved word contexts. Accepted for compatibility, not interpreted.
    pub reserved: Vec<(String, Vec<Rule>)>,
    /// Parent grammar name. Accepted for compatibility, not interpreted.
    pub inherits: Option<String>,
}

impl Grammar {
    /// Grammar with a name and no rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            extras: Vec::new(),
            precedences: Vec::new(),
            conflicts: Vec::new(),
            externals: Vec::new(),
            inline: Vec::new(),
            supertypes: Vec::new(),
            word: None,
            reserved: Vec::new(),
            inherits: None,
        }
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }
}

/// Grammar rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Matches nothing.
    Blank,
    /// Literal token.
    String(String),
    /// Regex token.
    Pattern { value: String, flags: Option<String> },
    /// Reference to another rule.
    Symbol(String),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// Zero or more.
    Repeat(Box<Rule>),
    /// One or more.
    Repeat1(Box<Rule>),
    /// Label the content with a field name in its parent.
    Field { name: String, content: Box<Rule> },
    /// Rename the node produced by the content.
    Alias {
        content: Box<Rule>,
        value: String,
        named: bool,
    },
    /// Collapse the content into one token.
    Token(Box<Rule>),
    /// Token that must not be preceded by extras.
    ImmediateToken(Box<Rule>),
    Prec {
        value: Precedence,
        content: Box<Rule>,
    },
    PrecLeft {
        value: Precedence,
        content: Box<Rule>,
    },
    PrecRight {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Preference among parse-time alternatives.
    PrecDynamic { value: i32, content: Box<Rule> },
    Reserved {
        context_name: String,
        content: Box<Rule>,
    },
}

impl Rule {
    /// Content of a wrapper rule, or `None` for leaves and lists.
    pub fn content(&self) -> Option<&Rule> {
        match self {
            Rule::Repeat(c)
            | Rule::Repeat1(c)
            | Rule::Token(c)
            | Rule::ImmediateToken(c)
            | Rule::Field { content: c, .. }
            | Rule::Alias { content: c, .. }
            | Rule::Prec { content: c, .. }
            | Rule::PrecLeft { content: c, .. }
            | Rule::PrecRight { content: c, .. }
            | Rule::PrecDynamic { content: c, .. }
            | Rule::Reserved { content: c, .. } => Some(c),
            _ => None,
        }
    }
}

/// Precedence value (numeric or named).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Precedence {
    Integer(i32),
    Name(String),
}

impl Default for Precedence {
    fn default() -> Self {
        Precedence::Integer(0)
    }
}

impl Precedence {
    pub fn is_none(&self) -> bool {
        matches!(self, Precedence::Integer(0))
    }
}

impl std::fmt::Display for Precedence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precedence::Integer(n) => write!(f, "{n}"),
            Precedence::Name(s) => write!(f, "'{s}'"),
        }
    }
}

/// Entry in a precedence ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrecedenceEntry {
    /// Named precedence level.
    Name(String),
    /// Rule whose productions share this level.
    Symbol(String),
}
