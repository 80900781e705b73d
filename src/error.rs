use std::ops::Range;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::lex::{Token, TokenKind};

const SOURCE_NAME: &str = "<expression>";

/// A token was built with its end offset before its start offset.
///
/// The lexer never does this for well-formed scans, so seeing one is a lexer bug.
#[derive(Error, Debug, Diagnostic, Clone, Copy, PartialEq, Eq)]
#[error("token end {end} precedes its start {start}")]
#[diagnostic(code(expr_calc::span))]
pub struct SpanError {
    pub start: usize,
    pub end: usize,
}

/// The category of an [`EvalError`], without any of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSpan,
    InvalidToken,
    UnexpectedToken,
    UnexpectedEnd,
    PushbackOccupied,
    NestingTooDeep,
}

#[derive(Error, Debug, Diagnostic)]
pub enum EvalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidSpan(#[from] SpanError),

    #[error("Invalid token '{token}'")]
    #[diagnostic(
        code(expr_calc::invalid_token),
        help("remove or correct the token: `{token}`")
    )]
    InvalidToken {
        #[source_code]
        src: NamedSource<String>,

        #[label("not a number, operator or parenthesis")]
        bad_bit: SourceSpan,

        token: String,
        span: Range<usize>,
    },

    #[error("Unexpected token '{token}'")]
    #[diagnostic(code(expr_calc::unexpected_token))]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,

        #[label("not allowed here")]
        bad_bit: SourceSpan,

        token: String,
        span: Range<usize>,
    },

    #[error("Unexpected end of expression")]
    #[diagnostic(
        code(expr_calc::unexpected_end),
        help("the expression ended early, possibly due to a missing operand or closing parenthesis")
    )]
    UnexpectedEnd {
        #[source_code]
        src: NamedSource<String>,

        #[label("expression ends here")]
        bad_bit: SourceSpan,

        span: Range<usize>,
    },

    #[error("cannot push back '{token}': a token is already buffered")]
    #[diagnostic(code(expr_calc::pushback))]
    PushbackOccupied { token: String, span: Range<usize> },

    #[error("expression nests deeper than {limit} levels")]
    #[diagnostic(
        code(expr_calc::too_deep),
        help("flatten the expression or raise the depth limit")
    )]
    NestingTooDeep { limit: usize },
}

impl EvalError {
    pub(crate) fn invalid_token(whole: &str, token: &Token) -> Self {
        let span = token.span();
        EvalError::InvalidToken {
            src: named_source(whole),
            bad_bit: byte_span(whole, &span),
            token: slice_chars(whole, &span),
            span,
        }
    }

    pub(crate) fn unexpected_token(whole: &str, token: &Token) -> Self {
        let span = token.span();
        EvalError::UnexpectedToken {
            src: named_source(whole),
            bad_bit: byte_span(whole, &span),
            token: slice_chars(whole, &span),
            span,
        }
    }

    /// Reports a token the grammar cannot accept, keeping invalid text apart
    /// from well-formed tokens in the wrong place.
    pub(crate) fn rejected(whole: &str, token: &Token) -> Self {
        match token.kind() {
            TokenKind::Invalid(_) => Self::invalid_token(whole, token),
            _ => Self::unexpected_token(whole, token),
        }
    }

    /// Points at the last non-blank character, or `0..0` when there is none.
    pub(crate) fn unexpected_end(whole: &str) -> Self {
        let len = whole.trim_end().chars().count();
        let span = len.saturating_sub(1)..len;
        EvalError::UnexpectedEnd {
            src: named_source(whole),
            bad_bit: byte_span(whole, &span),
            span,
        }
    }

    pub(crate) fn pushback_occupied(whole: &str, buffered: &Token) -> Self {
        let span = buffered.span();
        EvalError::PushbackOccupied {
            token: slice_chars(whole, &span),
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::InvalidSpan(_) => ErrorKind::InvalidSpan,
            EvalError::InvalidToken { .. } => ErrorKind::InvalidToken,
            EvalError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            EvalError::UnexpectedEnd { .. } => ErrorKind::UnexpectedEnd,
            EvalError::PushbackOccupied { .. } => ErrorKind::PushbackOccupied,
            EvalError::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
        }
    }

    /// The `[start, end)` character span of the offending text, if any.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            EvalError::InvalidToken { span, .. }
            | EvalError::UnexpectedToken { span, .. }
            | EvalError::UnexpectedEnd { span, .. }
            | EvalError::PushbackOccupied { span, .. } => Some(span.clone()),
            EvalError::InvalidSpan(_) | EvalError::NestingTooDeep { .. } => None,
        }
    }

    /// The offending source text, for errors that name a token.
    pub fn token(&self) -> Option<&str> {
        match self {
            EvalError::InvalidToken { token, .. }
            | EvalError::UnexpectedToken { token, .. }
            | EvalError::PushbackOccupied { token, .. } => Some(token),
            _ => None,
        }
    }
}

fn named_source(whole: &str) -> NamedSource<String> {
    NamedSource::new(SOURCE_NAME, whole.to_string())
}

// Token spans count characters; miette labels count bytes.
fn byte_offset(whole: &str, chars: usize) -> usize {
    whole
        .char_indices()
        .nth(chars)
        .map_or(whole.len(), |(byte, _)| byte)
}

fn byte_span(whole: &str, span: &Range<usize>) -> SourceSpan {
    let start = byte_offset(whole, span.start);
    let end = byte_offset(whole, span.end);
    SourceSpan::from(start..end)
}

fn slice_chars(whole: &str, span: &Range<usize>) -> String {
    whole
        .chars()
        .skip(span.start)
        .take(span.end - span.start)
        .collect()
}
