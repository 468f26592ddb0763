/// Runtime knobs for one parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    fork_limit: usize,
    reuse: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            fork_limit: 6,
            reuse: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most stack versions alive at once. Zero is treated as one.
    pub fn fork_limit(mut self, limit: usize) -> Self {
        self.fork_limit = limit.max(1);
        self
    }

    /// Reuse unchanged subtrees of the previous tree when reparsing.
    pub fn reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn get_fork_limit(&self) -> usize {
        self.fork_limit
    }

    pub fn get_reuse(&self) -> bool {
        self.reuse
    }
}
