use std::fmt;

use serde::{Deserialize, Serialize};

/// Deepest tree the engine builds, counted in nodes from root to leaf.
///
/// A tree this deep still decodes under serde_json's nesting limit of 128
/// when wrapped in a request body.
pub const MAX_DEPTH: usize = 100;

/// Discriminates the two node shapes of a rule tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Logical (`AND`/`OR`) or comparison operator with two children.
    Operator,
    /// Leaf holding the raw token: a field name or a literal.
    Operand,
}

/// Operators understood by the parser and the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Operator {
    pub const COMPARISONS: [Operator; 6] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "AND" => Some(Operator::And),
            "OR" => Some(Operator::Or),
            other => Self::COMPARISONS
                .iter()
                .copied()
                .find(|op| op.as_str() == other),
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule tree node, serialized exactly as the rule endpoints exchange it:
/// `{"type": ..., "value": ..., "left": ..., "right": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn operand(value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Operand,
            value: value.into(),
            left: None,
            right: None,
        }
    }

    pub fn operator(op: Operator, left: Node, right: Node) -> Self {
        Self {
            kind: NodeKind::Operator,
            value: op.as_str().to_string(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn is_operand(&self) -> bool {
        self.kind == NodeKind::Operand
    }

    /// The operator held by this node, if it is an operator node with a known symbol.
    pub fn operator_kind(&self) -> Option<Operator> {
        match self.kind {
            NodeKind::Operator => Operator::parse(&self.value),
            NodeKind::Operand => None,
        }
    }

    /// Counts `AND`/`OR` nodes along the logical spine of the tree.
    ///
    /// Only logical nodes are descended into; comparisons end the walk.
    pub fn logical_operator_counts(&self) -> OperatorCounts {
        let mut counts = OperatorCounts::default();
        self.collect_logical(&mut counts);
        counts
    }

    fn collect_logical(&self, counts: &mut OperatorCounts) {
        match self.operator_kind() {
            Some(Operator::And) => counts.and += 1,
            Some(Operator::Or) => counts.or += 1,
            _ => return,
        }
        for child in [&self.left, &self.right].into_iter().flatten() {
            child.collect_logical(counts);
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        1 + [&self.left, &self.right]
            .into_iter()
            .flatten()
            .map(|child| child.size())
            .sum::<usize>()
    }

    /// Number of nodes on the longest path from this node to a leaf.
    pub fn depth(&self) -> usize {
        1 + [&self.left, &self.right]
            .into_iter()
            .flatten()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorCounts {
    pub and: usize,
    pub or: usize,
}
