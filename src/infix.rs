//! Infix evaluation by recursive descent.
//!
//! ```text
//! expression := term (("+" | "-") term)*
//! term       := factor (("*" | "/") factor)*
//! factor     := base (("**" | "^") factor)?
//! base       := number | "-" expression | "(" expression ")"
//! ```
//!
//! Every rule computes its value as it goes; no tree is built.

use crate::{
    config::Options,
    error::EvalError,
    lex::{Grammar, Lexer, Operator, Paren, Token, TokenKind},
    stream::TokenStream,
};

/// Evaluates an infix expression such as `2 ** 3 ** 2` or `-(3 + 4) * 2`.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    evaluate_with(expression, &Options::default())
}

pub fn evaluate_with(expression: &str, options: &Options) -> Result<f64, EvalError> {
    log::debug!("evaluating infix expression {expression:?}");
    let mut evaluator = Evaluator::new(expression, options);
    let value = evaluator.expression()?;

    // anything left over, e.g. the `)` in `3 + 4)`
    if let Some(token) = evaluator.next_token()? {
        return Err(EvalError::rejected(expression, &token));
    }

    log::debug!("{expression:?} = {value}");
    Ok(value)
}

struct Evaluator<'de> {
    tokens: TokenStream<'de>,
    depth: usize,
    max_depth: usize,
}

impl<'de> Evaluator<'de> {
    fn new(expression: &'de str, options: &Options) -> Self {
        Evaluator {
            tokens: TokenStream::new(Lexer::with_mode(expression, Grammar::Infix, options.mode)),
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'de>>, EvalError> {
        self.tokens.next().transpose()
    }

    fn unexpected_end(&self) -> EvalError {
        EvalError::unexpected_end(self.tokens.whole())
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            let Some(token) = self.next_token()? else {
                return Ok(value);
            };
            match token.kind() {
                TokenKind::Operator(Operator::Plus) => value += self.term()?,
                TokenKind::Operator(Operator::Minus) => value -= self.term()?,
                _ => {
                    self.tokens.pushback(token)?;
                    return Ok(value);
                }
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        loop {
            let Some(token) = self.next_token()? else {
                return Ok(value);
            };
            match token.kind() {
                TokenKind::Operator(Operator::Star) => value *= self.factor()?,
                TokenKind::Operator(Operator::Slash) => value /= self.factor()?,
                _ => {
                    self.tokens.pushback(token)?;
                    return Ok(value);
                }
            }
        }
    }

    // Every nesting level passes through here: parentheses and unary minus via
    // `base`, exponent chains via the right recursion.
    fn factor(&mut self) -> Result<f64, EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let value = self.power();
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.base()?;
        let Some(token) = self.next_token()? else {
            return Ok(base);
        };
        match token.kind() {
            TokenKind::Operator(Operator::StarStar | Operator::Caret) => {
                Ok(base.powf(self.factor()?))
            }
            _ => {
                self.tokens.pushback(token)?;
                Ok(base)
            }
        }
    }

    fn base(&mut self) -> Result<f64, EvalError> {
        let Some(token) = self.next_token()? else {
            return Err(self.unexpected_end());
        };
        match token.kind() {
            TokenKind::Number(n) => Ok(n),
            TokenKind::Operator(Operator::Minus) => Ok(-self.expression()?),
            TokenKind::Parenthesis(Paren::Open) => {
                let value = self.expression()?;
                match self.next_token()? {
                    Some(close) if close.kind() == TokenKind::Parenthesis(Paren::Close) => {
                        Ok(value)
                    }
                    Some(other) => Err(EvalError::rejected(self.tokens.whole(), &other)),
                    None => Err(self.unexpected_end()),
                }
            }
            TokenKind::Operator(_)
            | TokenKind::Parenthesis(Paren::Close)
            | TokenKind::Invalid(_) => Err(EvalError::rejected(self.tokens.whole(), &token)),
        }
    }
}
