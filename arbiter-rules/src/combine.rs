use crate::ast::{Node, Operator, MAX_DEPTH};
use crate::error::RuleError;

/// Joins several rule trees under the logical operator they use most.
///
/// `AND` wins ties. The first two trees become the children of the root and
/// every further tree wraps what has been built so far: `op(op(a, b), c)`.
/// A single tree is returned unchanged.
///
/// Fails with [`RuleError::TooDeep`] before joining anything when the result
/// would nest deeper than [`MAX_DEPTH`].
pub fn combine_asts(asts: Vec<Node>) -> Result<Node, RuleError> {
    if combined_depth(&asts) > MAX_DEPTH {
        return Err(RuleError::TooDeep { limit: MAX_DEPTH });
    }

    let root = dominant_operator(&asts);
    let mut trees = asts.into_iter();
    let first = trees.next().ok_or(RuleError::NothingToCombine)?;

    Ok(trees.fold(first, |combined, next| Node::operator(root, combined, next)))
}

/// Depth of the left-nested tree `combine_asts` would build from `asts`.
fn combined_depth(asts: &[Node]) -> usize {
    let mut trees = asts.iter();
    let first = trees.next().map_or(0, Node::depth);
    trees.fold(first, |depth, next| 1 + depth.max(next.depth()))
}

/// The logical operator used for the combined root.
pub fn dominant_operator(asts: &[Node]) -> Operator {
    let (and, or) = asts
        .iter()
        .map(Node::logical_operator_counts)
        .fold((0, 0), |(and, or), counts| (and + counts.and, or + counts.or));

    if and >= or {
        Operator::And
    } else {
        Operator::Or
    }
}
