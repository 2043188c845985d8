use crate::source::Span;
use std::fmt; // For custom display formatting

/// One of the four arithmetic operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    /// Binary reducer for this operator. `None` means the result does not fit in an `i64`,
    /// or the divisor was zero; the evaluator checks for zero first.
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Sub => lhs.checked_sub(rhs),
            Operator::Mul => lhs.checked_mul(rhs),
            // checked_div truncates toward zero
            Operator::Div => lhs.checked_div(rhs),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: Expr, // The node's data
    pub span: Span, // The source span it covers
}

impl Node {
    pub fn new(kind: Expr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_number(n: i64, span: Span) -> Self {
        Node::new(Expr::Number(n), span)
    }

    pub fn new_operator(op: Operator, span: Span) -> Self {
        Node::new(Expr::Operator(op), span)
    }

    pub fn new_apply(op: Operator, operands: Vec<Node>, span: Span) -> Self {
        Node::new(Expr::Apply(op, operands), span)
    }

    pub fn new_sequence(atoms: Vec<Node>, span: Span) -> Self {
        Node::new(Expr::Sequence(atoms), span)
    }

    pub fn new_empty(span: Span) -> Self {
        Node::new(Expr::Empty, span)
    }

    /// Short description of what this node is, for error messages.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// The expression tree built by the parser.
///
/// Each nesting level of the input becomes either an `Apply`, when its first atom is an
/// operator, or a `Sequence` otherwise. The top level of a line follows the same rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i64),
    /// A bare operator atom outside head position, e.g. the `+` in `(1 + 2)`.
    Operator(Operator),
    /// `(op operand...)`. Arity is not checked until evaluation.
    Apply(Operator, Vec<Node>),
    Sequence(Vec<Node>),
    /// `()`
    Empty,
}

impl Expr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "number",
            Expr::Operator(_) => "operator",
            Expr::Apply(..) => "operator application",
            Expr::Sequence(_) => "sequence",
            Expr::Empty => "empty list",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, head: Option<Operator>, items: &[Node]) -> fmt::Result {
    write!(f, "(")?;
    let mut first = true;
    if let Some(op) = head {
        write!(f, "{}", op)?;
        first = false;
    }
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
        first = false;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Operator(op) => write!(f, "{}", op),
            Expr::Apply(op, operands) => write_list(f, Some(*op), operands),
            Expr::Sequence(atoms) => write_list(f, None, atoms),
            Expr::Empty => write!(f, "()"),
        }
    }
}

/// Result of evaluating a tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    /// "No value", produced by `()` and by empty input.
    Empty,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Empty => write!(f, "()"),
        }
    }
}

/// Indented multi-line rendering of a tree, one node per line.
pub fn dump_tree(node: &Node) -> String {
    let mut out = String::new();
    dump_node(node, 0, &mut out);
    out
}

fn dump_node(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let line = match &node.kind {
        Expr::Number(n) => format!("Number {}", n),
        Expr::Operator(op) => format!("Operator {}", op),
        Expr::Apply(op, _) => format!("Apply {}", op),
        Expr::Sequence(_) => "Sequence".to_string(),
        Expr::Empty => "Empty".to_string(),
    };
    out.push_str(&format!("{}{} @ {}\n", indent, line, node.span));
    if let Expr::Apply(_, children) | Expr::Sequence(children) = &node.kind {
        for child in children {
            dump_node(child, depth + 1, out);
        }
    }
}
