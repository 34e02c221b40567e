//! Operator-precedence grouping of fielded terms.
//!
//! A flat list of fielded terms is reduced to one binary expression tree.
//! `NOT` binds tightest, then `AND`, then `OR`; operators of equal precedence
//! associate to the left.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;

use super::QueryError;
use crate::models::{BooleanOperator, FieldedSearchTerm};

/// Binding strength of an operator; higher binds tighter
fn precedence(operator: BooleanOperator) -> u8 {
    match operator {
        BooleanOperator::Not => 3,
        BooleanOperator::And => 2,
        BooleanOperator::Or => 1,
    }
}

/// A node of the grouped expression tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Leaf(FieldedSearchTerm),
    Group(Box<Node>, BooleanOperator, Box<Node>),
}

impl Node {
    /// Join two nodes with an operator
    pub fn group(left: Node, operator: BooleanOperator, right: Node) -> Node {
        Node::Group(Box::new(left), operator, Box::new(right))
    }

    /// Leaves in order
    pub fn leaves(&self) -> Vec<&FieldedSearchTerm> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a FieldedSearchTerm>) {
        match self {
            Node::Leaf(term) => leaves.push(term),
            Node::Group(left, _, right) => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
        }
    }

    /// Number of internal (operator) nodes
    pub fn group_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Group(left, _, right) => 1 + left.group_count() + right.group_count(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(term) => write!(f, "{}", term.term),
            Node::Group(left, operator, right) => {
                write_operand(f, left)?;
                write!(f, " {} ", operator)?;
                write_operand(f, right)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Leaf(_) => write!(f, "{}", node),
        Node::Group(..) => write!(f, "({})", node),
    }
}

/// Group a fielded term list into a single expression tree.
///
/// The first term's operator is structural and ignored. Every later term must
/// carry an operator.
pub fn group_terms(terms: &[FieldedSearchTerm]) -> Result<Node, QueryError> {
    let Some((first, rest)) = terms.split_first() else {
        return Err(QueryError::InvalidQuery(
            "cannot group an empty term list".to_string(),
        ));
    };

    let mut rest = rest
        .iter()
        .map(|term| {
            let operator = term.operator.ok_or_else(|| {
                QueryError::InvalidQuery(format!("term '{}' has no boolean operator", term.term))
            })?;
            Ok((operator, Node::Leaf(term.clone())))
        })
        .collect::<Result<Vec<_>, QueryError>>()?
        .into_iter()
        .peekable();

    let root = climb(Node::Leaf(first.clone()), 1, &mut rest);
    match rest.next() {
        None => Ok(root),
        Some((_, node)) => Err(QueryError::InvalidQuery(format!(
            "term list did not reduce to a single group at '{}'",
            node
        ))),
    }
}

/// Fold operators binding at least as tight as `min` onto `left`, in one pass.
///
/// A tighter operator after the right operand claims that operand first, so
/// recursion is bounded by the number of precedence levels.
fn climb<I>(mut left: Node, min: u8, rest: &mut Peekable<I>) -> Node
where
    I: Iterator<Item = (BooleanOperator, Node)>,
{
    while let Some((operator, mut right)) = rest.next_if(|(op, _)| precedence(*op) >= min) {
        let level = precedence(operator);
        while rest
            .peek()
            .is_some_and(|(next, _)| precedence(*next) > level)
        {
            right = climb(right, level + 1, rest);
        }
        left = Node::group(left, operator, right);
    }
    left
}
