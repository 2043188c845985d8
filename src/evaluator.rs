use crate::source::Span;
use crate::types::{Expr, Node, Operator, Value};
use log::trace;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("division by zero")]
    DivideByZero { span: Span },
    #[error("'{operator}' expects at least 2 operands, got {found}")]
    ArityMismatch {
        operator: Operator,
        found: usize,
        span: Span,
    },
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("integer overflow in '{operator}'")]
    Overflow { operator: Operator, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::DivideByZero { span }
            | EvalError::ArityMismatch { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::Overflow { span, .. } => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Evaluates a tree depth-first, stopping at the first error.
pub fn evaluate(node: &Node) -> EvalResult {
    match &node.kind {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Empty => Ok(Value::Empty),
        Expr::Operator(_) => Err(EvalError::TypeMismatch {
            expected: "a number",
            found: node.type_name(),
            span: node.span,
        }),
        Expr::Sequence(atoms) => evaluate_sequence(atoms),
        Expr::Apply(op, operands) => evaluate_apply(*op, operands, node.span),
    }
}

// Every atom is evaluated; the last one is the value of the level.
fn evaluate_sequence(atoms: &[Node]) -> EvalResult {
    let mut last = Value::Empty;
    for atom in atoms {
        last = evaluate(atom)?;
    }
    Ok(last)
}

fn evaluate_apply(op: Operator, operands: &[Node], span: Span) -> EvalResult {
    // `()` operands don't count towards arity
    let resolvable = operands
        .iter()
        .filter(|operand| operand.kind != Expr::Empty)
        .count();

    let [first, rest @ ..] = operands else {
        return Err(arity_error(op, resolvable, span));
    };
    if resolvable < 2 {
        return Err(arity_error(op, resolvable, span));
    }

    let mut acc = evaluate_operand(first)?;
    for operand in rest {
        let rhs = evaluate_operand(operand)?;
        if op == Operator::Div && rhs == 0 {
            return Err(EvalError::DivideByZero { span: operand.span });
        }
        acc = op.apply(acc, rhs).ok_or(EvalError::Overflow { operator: op, span })?;
    }

    trace!("{} over {} operands = {}", op, operands.len(), acc);
    Ok(Value::Number(acc))
}

fn evaluate_operand(node: &Node) -> EvalResult<i64> {
    match evaluate(node)? {
        Value::Number(n) => Ok(n),
        Value::Empty => Err(EvalError::TypeMismatch {
            expected: "a number",
            found: match node.kind {
                Expr::Empty => node.type_name(),
                _ => "no value",
            },
            span: node.span,
        }),
    }
}

fn arity_error(operator: Operator, found: usize, span: Span) -> EvalError {
    EvalError::ArityMismatch {
        operator,
        found,
        span,
    }
}
