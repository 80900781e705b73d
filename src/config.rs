use crate::lex::LexerMode;

/// Nesting depth accepted by default before the infix evaluator gives up.
///
/// Each level costs several stack frames, so this stays well inside a 2 MiB
/// thread stack even in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs shared by both evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub mode: LexerMode,
    /// Limit on parenthesis/unary-minus nesting plus exponent chain length.
    /// Only the infix evaluator recurses, so RPN ignores it.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mode: LexerMode::Tolerant,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn with_mode(mut self, mode: LexerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
