use std::{fmt::Display, iter::FusedIterator, ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

use crate::error::{EvalError, SpanError};

/// Signed decimal with optional fraction and exponent: `3`, `-.5`, `+4.5e+6`.
const NUMBER: &str = r"[-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?";

static INFIX_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<number>{NUMBER})|(?P<operator>\*\*|[-+*/^])|(?P<parenthesis>[()])|(?P<invalid>\S+)"
    ))
    .expect("infix grammar is a valid regex")
});

static RPN_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<number>{NUMBER})|(?P<operator>[-+*/])|(?P<invalid>\S+)"
    ))
    .expect("rpn grammar is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    StarStar,
    Caret,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::StarStar => "**",
            Operator::Caret => "^",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            "**" => Operator::StarStar,
            "^" => Operator::Caret,
            _ => return None,
        })
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paren {
    Open,
    Close,
}

impl Display for Paren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Paren::Open => f.write_str("("),
            Paren::Close => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'de> {
    Number(f64),
    Operator(Operator),
    Parenthesis(Paren),
    /// A run of non-whitespace that fits no other category.
    Invalid(&'de str),
}

impl Display for TokenKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Operator(op) => write!(f, "{op}"),
            TokenKind::Parenthesis(paren) => write!(f, "{paren}"),
            TokenKind::Invalid(text) => f.write_str(text),
        }
    }
}

/// A classified piece of an expression covering the characters `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    kind: TokenKind<'de>,
    start: usize,
    end: usize,
}

impl<'de> Token<'de> {
    pub fn new(kind: TokenKind<'de>, start: usize, end: usize) -> Result<Self, SpanError> {
        if end < start {
            return Err(SpanError { start, end });
        }
        Ok(Token { kind, start, end })
    }

    pub fn kind(&self) -> TokenKind<'de> {
        self.kind
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (start, end) = (self.start, self.end);
        match self.kind {
            TokenKind::Number(n) => write!(f, "NUMBER {n} [{start}, {end})"),
            TokenKind::Operator(op) => write!(f, "OPERATOR {op} [{start}, {end})"),
            TokenKind::Parenthesis(paren) => write!(f, "PARENTHESIS {paren} [{start}, {end})"),
            TokenKind::Invalid(text) => write!(f, "INVALID {text} [{start}, {end})"),
        }
    }
}

/// Which symbols the lexer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grammar {
    /// `+ - * / ** ^`, parentheses, and sign splitting after a number.
    #[default]
    Infix,
    /// `+ - * /` only; operands and operators are whitespace separated.
    Rpn,
}

impl Grammar {
    fn regex(self) -> &'static Regex {
        match self {
            Grammar::Infix => LazyLock::force(&INFIX_GRAMMAR),
            Grammar::Rpn => LazyLock::force(&RPN_GRAMMAR),
        }
    }
}

/// How the lexer reacts to text matching no symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerMode {
    /// Emit a [`TokenKind::Invalid`] token and let the consumer decide.
    #[default]
    Tolerant,
    /// Yield an [`EvalError::InvalidToken`] and stop scanning.
    Strict,
}

pub struct Lexer<'de> {
    whole: &'de str,
    grammar: Grammar,
    mode: LexerMode,
    byte: usize,
    /// Character offset matching `byte`.
    offset: usize,
    after_number: bool,
    pending: Option<Token<'de>>,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str, grammar: Grammar) -> Self {
        Self::with_mode(input, grammar, LexerMode::default())
    }

    pub fn with_mode(input: &'de str, grammar: Grammar, mode: LexerMode) -> Self {
        Lexer {
            whole: input,
            grammar,
            mode,
            byte: 0,
            offset: 0,
            after_number: false,
            pending: None,
        }
    }

    pub fn whole(&self) -> &'de str {
        self.whole
    }

    fn number(
        &mut self,
        literal: &'de str,
        start: usize,
        end: usize,
    ) -> Result<Token<'de>, EvalError> {
        // "4-3" is four minus three: a signed literal right after a number is an operator
        // followed by an unsigned number.
        if self.grammar == Grammar::Infix && self.after_number {
            if let Some(digits) = literal.strip_prefix(['+', '-']) {
                let sign = if literal.starts_with('-') {
                    Operator::Minus
                } else {
                    Operator::Plus
                };
                let Ok(value) = digits.parse::<f64>() else {
                    return self.invalid(literal, start, end);
                };
                self.pending = Some(Token::new(TokenKind::Number(value), start + 1, end)?);
                return Ok(Token::new(TokenKind::Operator(sign), start, start + 1)?);
            }
        }

        match literal.parse::<f64>() {
            Ok(value) => Ok(Token::new(TokenKind::Number(value), start, end)?),
            Err(_) => self.invalid(literal, start, end),
        }
    }

    fn invalid(
        &mut self,
        literal: &'de str,
        start: usize,
        end: usize,
    ) -> Result<Token<'de>, EvalError> {
        let token = Token::new(TokenKind::Invalid(literal), start, end)?;
        match self.mode {
            LexerMode::Tolerant => Ok(token),
            LexerMode::Strict => {
                self.byte = self.whole.len();
                self.pending = None;
                Err(EvalError::invalid_token(self.whole, &token))
            }
        }
    }

    fn classify(
        &mut self,
        captures: &Captures<'de>,
        literal: &'de str,
        start: usize,
        end: usize,
    ) -> Result<Token<'de>, EvalError> {
        if captures.name("number").is_some() {
            return self.number(literal, start, end);
        }
        if captures.name("operator").is_some() {
            if let Some(op) = Operator::from_symbol(literal) {
                return Ok(Token::new(TokenKind::Operator(op), start, end)?);
            }
        }
        if captures.name("parenthesis").is_some() {
            let paren = if literal == "(" {
                Paren::Open
            } else {
                Paren::Close
            };
            return Ok(Token::new(TokenKind::Parenthesis(paren), start, end)?);
        }
        self.invalid(literal, start, end)
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            log::trace!("scanned {pending}");
            return Some(Ok(pending));
        }

        // Whitespace is whatever lies between two matches.
        let captures = self.grammar.regex().captures_at(self.whole, self.byte)?;
        let matched = captures.get(0)?;
        let literal = matched.as_str();

        let start = self.offset + self.whole[self.byte..matched.start()].chars().count();
        let end = start + literal.chars().count();
        self.byte = matched.end();
        self.offset = end;

        let token = self.classify(&captures, literal, start, end);
        self.after_number = captures.name("number").is_some();
        if let Ok(token) = &token {
            log::trace!("scanned {token}");
        }
        Some(token)
    }
}

impl FusedIterator for Lexer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kinds(expression: &str) -> Vec<TokenKind<'_>> {
        Lexer::new(expression, Grammar::Infix)
            .map(|token| token.expect("tolerant lexing never fails").kind())
            .collect()
    }

    fn rpn_kinds(expression: &str) -> Vec<TokenKind<'_>> {
        Lexer::new(expression, Grammar::Rpn)
            .map(|token| token.expect("tolerant lexing never fails").kind())
            .collect()
    }

    fn n(value: f64) -> TokenKind<'static> {
        TokenKind::Number(value)
    }

    fn op(symbol: &str) -> TokenKind<'static> {
        TokenKind::Operator(Operator::from_symbol(symbol).expect("known operator"))
    }

    fn open() -> TokenKind<'static> {
        TokenKind::Parenthesis(Paren::Open)
    }

    fn close() -> TokenKind<'static> {
        TokenKind::Parenthesis(Paren::Close)
    }

    #[test]
    fn token_rejects_end_before_start() {
        let err = Token::new(TokenKind::Number(1.0), 3, 2).unwrap_err();
        assert_eq!(err, SpanError { start: 3, end: 2 });
        assert!(Token::new(TokenKind::Number(1.0), 2, 2).is_ok());
    }

    #[test]
    fn tokens_of_different_kinds_are_never_equal() {
        let minus = Token::new(op("-"), 0, 1).unwrap();
        let invalid = Token::new(TokenKind::Invalid("-"), 0, 1).unwrap();
        assert_ne!(minus, invalid);
        assert_eq!(minus, Token::new(op("-"), 0, 1).unwrap());
        assert_ne!(minus, Token::new(op("-"), 1, 2).unwrap());
    }

    #[test]
    fn token_display_shows_value_and_span() {
        let token = Token::new(op("**"), 20, 22).unwrap();
        assert_eq!(token.to_string(), "OPERATOR ** [20, 22)");
        let token = Token::new(n(-5.0), 8, 10).unwrap();
        assert_eq!(token.to_string(), "NUMBER -5 [8, 10)");
    }

    #[test]
    fn signs_are_absorbed_at_the_start() {
        assert_eq!(kinds("+3"), vec![n(3.0)]);
        assert_eq!(kinds("-3"), vec![n(-3.0)]);
        assert_eq!(kinds("--3"), vec![op("-"), n(-3.0)]);
        assert_eq!(kinds("-(-3)"), vec![op("-"), open(), n(-3.0), close()]);
    }

    #[test]
    fn signs_after_a_number_become_operators() {
        assert_eq!(kinds("4-3"), vec![n(4.0), op("-"), n(3.0)]);
        assert_eq!(kinds("4+3"), vec![n(4.0), op("+"), n(3.0)]);
        assert_eq!(kinds("+3++3"), vec![n(3.0), op("+"), n(3.0)]);
        assert_eq!(kinds("3--4"), vec![n(3.0), op("-"), n(-4.0)]);
    }

    #[test]
    fn split_sign_keeps_both_spans() {
        let tokens: Vec<_> = Lexer::new("10 -5", Grammar::Infix)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(n(10.0), 0, 2).unwrap(),
                Token::new(op("-"), 3, 4).unwrap(),
                Token::new(n(5.0), 4, 5).unwrap(),
            ]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(
            kinds("  3   + 4   * 10 -5 / 2 **  2   "),
            vec![
                n(3.0),
                op("+"),
                n(4.0),
                op("*"),
                n(10.0),
                op("-"),
                n(5.0),
                op("/"),
                n(2.0),
                op("**"),
                n(2.0),
            ]
        );
        assert!(kinds("").is_empty());
        assert!(kinds(" \t\n ").is_empty());
    }

    #[test]
    fn parentheses_and_caret() {
        assert_eq!(
            kinds("(3 + 4) ^ (10 - 5)"),
            vec![
                open(),
                n(3.0),
                op("+"),
                n(4.0),
                close(),
                op("^"),
                open(),
                n(10.0),
                op("-"),
                n(5.0),
                close(),
            ]
        );
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(
            kinds("3.2e-5 + +4.5e+6 - -1.0E100"),
            vec![n(3.2e-5), op("+"), n(4.5e6), op("-"), n(-1.0e100)]
        );
        assert_eq!(kinds(".5"), vec![n(0.5)]);
    }

    #[test]
    fn typed_tokens_carry_character_spans() {
        let tokens: Vec<_> = Lexer::new("3 + 4 - -5 * ( 1e50 ** 0.001 )", Grammar::Infix)
            .collect::<Result<_, _>>()
            .unwrap();
        let expected = [
            (n(3.0), 0, 1),
            (op("+"), 2, 3),
            (n(4.0), 4, 5),
            (op("-"), 6, 7),
            (n(-5.0), 8, 10),
            (op("*"), 11, 12),
            (open(), 13, 14),
            (n(1e50), 15, 19),
            (op("**"), 20, 22),
            (n(0.001), 23, 28),
            (close(), 29, 30),
        ]
        .map(|(kind, start, end)| Token::new(kind, start, end).unwrap());
        assert_eq!(tokens, expected);
    }

    #[test]
    fn tolerant_mode_emits_invalid_tokens() {
        let tokens: Vec<_> = Lexer::new("3 + 4 & 10", Grammar::Infix)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens[3], Token::new(TokenKind::Invalid("&"), 6, 7).unwrap());
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn invalid_runs_swallow_the_rest_of_the_word() {
        assert_eq!(kinds("4&5"), vec![n(4.0), TokenKind::Invalid("&5")]);
        assert_eq!(kinds("3abc"), vec![n(3.0), TokenKind::Invalid("abc")]);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let tokens: Vec<_> = Lexer::new("é + 1", Grammar::Infix)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::Invalid("é"), 0, 1).unwrap());
        assert_eq!(tokens[2], Token::new(n(1.0), 4, 5).unwrap());
    }

    #[test]
    fn strict_mode_fails_at_scan_time_and_stops() {
        let mut lexer = Lexer::with_mode("3 + 4 & 10", Grammar::Infix, LexerMode::Strict);
        for _ in 0..3 {
            assert!(lexer.next().unwrap().is_ok());
        }
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert_eq!(err.token(), Some("&"));
        assert_eq!(err.span(), Some(6..7));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn rpn_grammar_reads_double_star_as_two_operators() {
        assert_eq!(
            rpn_kinds("( 2 ** ^"),
            vec![
                TokenKind::Invalid("("),
                n(2.0),
                op("*"),
                op("*"),
                TokenKind::Invalid("^"),
            ]
        );
    }

    #[test]
    fn rpn_grammar_never_splits_signs() {
        assert_eq!(rpn_kinds("3 -4"), vec![n(3.0), n(-4.0)]);
        assert_eq!(rpn_kinds("4 2 1-"), vec![n(4.0), n(2.0), n(1.0), op("-")]);
        assert_eq!(rpn_kinds("2 3 + a"), vec![n(2.0), n(3.0), op("+"), TokenKind::Invalid("a")]);
    }
}
