//! Postfix (reverse Polish) evaluation with an explicit operand stack.

use crate::{
    config::Options,
    error::EvalError,
    lex::{Grammar, Lexer, Operator, TokenKind},
};

/// Evaluates a postfix expression such as `2 3 + 4 *`.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    evaluate_with(expression, &Options::default())
}

pub fn evaluate_with(expression: &str, options: &Options) -> Result<f64, EvalError> {
    log::debug!("evaluating rpn expression {expression:?}");
    let mut stack: Vec<f64> = Vec::new();

    for token in Lexer::with_mode(expression, Grammar::Rpn, options.mode) {
        let token = token?;
        match token.kind() {
            TokenKind::Number(n) => stack.push(n),
            TokenKind::Operator(op) => {
                // too few operands is the operator's fault
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(EvalError::unexpected_token(expression, &token));
                };
                let Some(result) = apply(op, left, right) else {
                    return Err(EvalError::unexpected_token(expression, &token));
                };
                stack.push(result);
            }
            TokenKind::Invalid(_) => return Err(EvalError::invalid_token(expression, &token)),
            TokenKind::Parenthesis(_) => {
                return Err(EvalError::unexpected_token(expression, &token));
            }
        }
        log::trace!("stack after {token}: {stack:?}");
    }

    match stack.as_slice() {
        [value] => {
            log::debug!("{expression:?} = {value}");
            Ok(*value)
        }
        _ => Err(EvalError::unexpected_end(expression)),
    }
}

fn apply(op: Operator, left: f64, right: f64) -> Option<f64> {
    Some(match op {
        Operator::Plus => left + right,
        Operator::Minus => left - right,
        Operator::Star => left * right,
        Operator::Slash => left / right,
        // not part of the postfix grammar
        Operator::StarStar | Operator::Caret => return None,
    })
}
