use crate::ast::{Node, Operator, MAX_DEPTH};
use crate::error::RuleError;
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest parenthesis nesting accepted by the parser.
pub const MAX_NESTING: usize = 128;

/// Parses a rule string into its tree.
///
/// `OR` binds loosest, then `AND`, then comparisons. Chains of the same
/// logical operator nest to the right: `a OR b OR c` is `OR(a, OR(b, c))`.
pub fn parse_rule(source: &str) -> Result<Node, RuleError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(RuleError::Parse("rule string is empty".into()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let node = parser.parse_logical(Operator::Or)?;
    if let Some(token) = parser.peek() {
        return Err(RuleError::Parse(format!(
            "unexpected {} at offset {}",
            describe(token),
            token.offset
        )));
    }
    Ok(node)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next_is(&self, op: Operator) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Operator(found), .. }) if *found == op)
    }

    /// Parses `operand (op operand)*` for `AND` or `OR`, folding to the right.
    ///
    /// Every operand adds a level to the folded chain, so the chain is cut
    /// off at [`MAX_DEPTH`] operands before any of it is built.
    fn parse_logical(&mut self, op: Operator) -> Result<Node, RuleError> {
        let mut operands = vec![self.parse_logical_operand(op)?];
        while self.next_is(op) {
            if operands.len() >= MAX_DEPTH {
                return Err(RuleError::TooDeep { limit: MAX_DEPTH });
            }
            self.advance();
            operands.push(self.parse_logical_operand(op)?);
        }

        let mut node = operands
            .pop()
            .ok_or_else(|| RuleError::Parse("expected an expression".into()))?;
        let mut depth = node.depth();
        while let Some(previous) = operands.pop() {
            depth = 1 + depth.max(previous.depth());
            if depth > MAX_DEPTH {
                return Err(RuleError::TooDeep { limit: MAX_DEPTH });
            }
            node = Node::operator(op, previous, node);
        }
        Ok(node)
    }

    fn parse_logical_operand(&mut self, op: Operator) -> Result<Node, RuleError> {
        match op {
            Operator::Or => self.parse_logical(Operator::And),
            _ => self.parse_term(),
        }
    }

    fn parse_term(&mut self) -> Result<Node, RuleError> {
        let token = self
            .advance()
            .ok_or_else(|| RuleError::Parse("unexpected end of rule".into()))?;

        match &token.kind {
            TokenKind::LParen => {
                if self.depth >= MAX_NESTING {
                    return Err(RuleError::Parse(format!(
                        "parentheses nested deeper than {MAX_NESTING} levels"
                    )));
                }
                self.depth += 1;
                let inner = self.parse_logical(Operator::Or)?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(RuleError::Parse(format!(
                        "expected ')' but found {} at offset {}",
                        describe(other),
                        other.offset
                    ))),
                    None => Err(RuleError::Parse(format!(
                        "missing ')' for '(' at offset {}",
                        token.offset
                    ))),
                }
            }
            TokenKind::Word(left) => match self.peek() {
                Some(Token {
                    kind: TokenKind::Operator(op),
                    ..
                }) if !op.is_logical() => {
                    let op = *op;
                    self.advance();
                    let right = self.expect_word(op)?;
                    Ok(Node::operator(op, Node::operand(left.clone()), Node::operand(right)))
                }
                _ => Ok(Node::operand(left.clone())),
            },
            other => Err(RuleError::Parse(format!(
                "unexpected {} at offset {}",
                describe_kind(other),
                token.offset
            ))),
        }
    }

    fn expect_word(&mut self, op: Operator) -> Result<String, RuleError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => Ok(word.clone()),
            Some(other) => Err(RuleError::Parse(format!(
                "expected a value after '{op}' but found {} at offset {}",
                describe(other),
                other.offset
            ))),
            None => Err(RuleError::Parse(format!(
                "expected a value after '{op}' at end of rule"
            ))),
        }
    }
}

fn describe(token: &Token) -> String {
    describe_kind(&token.kind)
}

fn describe_kind(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::Operator(op) => format!("'{op}'"),
        TokenKind::Word(word) => format!("'{word}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(field: &str, op: Operator, value: &str) -> Node {
        Node::operator(op, Node::operand(field), Node::operand(value))
    }

    #[test]
    fn parses_single_comparison() {
        assert_eq!(
            parse_rule("age > 30").expect("parse"),
            cmp("age", Operator::Gt, "30")
        );
    }

    #[test]
    fn or_binds_looser_than_and() {
        let tree = parse_rule("a = 1 AND b = 2 OR c = 3 AND d = 4").expect("parse");
        let expected = Node::operator(
            Operator::Or,
            Node::operator(
                Operator::And,
                cmp("a", Operator::Eq, "1"),
                cmp("b", Operator::Eq, "2"),
            ),
            Node::operator(
                Operator::And,
                cmp("c", Operator::Eq, "3"),
                cmp("d", Operator::Eq, "4"),
            ),
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn chains_nest_to_the_right() {
        let tree = parse_rule("a > 1 OR b > 2 OR c > 3").expect("parse");
        let expected = Node::operator(
            Operator::Or,
            cmp("a", Operator::Gt, "1"),
            Node::operator(
                Operator::Or,
                cmp("b", Operator::Gt, "2"),
                cmp("c", Operator::Gt, "3"),
            ),
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn parentheses_override_precedence_and_collapse() {
        let tree = parse_rule(
            "((age > 30 AND department = 'Marketing')) OR (salary > 20000 OR experience > 5)",
        )
        .expect("parse");
        let expected = Node::operator(
            Operator::Or,
            Node::operator(
                Operator::And,
                cmp("age", Operator::Gt, "30"),
                cmp("department", Operator::Eq, "'Marketing'"),
            ),
            Node::operator(
                Operator::Or,
                cmp("salary", Operator::Gt, "20000"),
                cmp("experience", Operator::Gt, "5"),
            ),
        );
        assert_eq!(tree, expected);

        let grouped = parse_rule("a = 1 AND (b = 2 OR c = 3)").expect("parse");
        assert_eq!(grouped.operator_kind(), Some(Operator::And));
    }

    #[test]
    fn lone_word_is_an_operand() {
        assert_eq!(parse_rule("active").expect("parse"), Node::operand("active"));
    }

    #[test]
    fn reports_structural_errors() {
        for rule in ["", "(a = 1", "a = 1)", "a =", "a = 1 b", "a < b < c", "AND"] {
            assert!(
                matches!(parse_rule(rule), Err(RuleError::Parse(_))),
                "expected parse error for {rule:?}"
            );
        }
    }

    #[test]
    fn limits_nesting_depth() {
        let deep = format!("{}a{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        let err = parse_rule(&deep).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));

        let shallow = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse_rule(&shallow).expect("parse"), Node::operand("a"));
    }

    fn chain(op: &str, terms: usize) -> String {
        (0..terms)
            .map(|i| format!("f{i} = {i}"))
            .collect::<Vec<_>>()
            .join(&format!(" {op} "))
    }

    #[test]
    fn long_chains_are_rejected_without_building_them() {
        for op in ["AND", "OR"] {
            let err = parse_rule(&chain(op, 100_000)).unwrap_err();
            assert!(matches!(err, RuleError::TooDeep { limit: MAX_DEPTH }), "{op}: {err}");
        }
    }

    #[test]
    fn chains_up_to_the_depth_limit_parse() {
        // Comparisons sit one level below the last operator.
        let tree = parse_rule(&chain("AND", MAX_DEPTH - 1)).expect("parse");
        assert_eq!(tree.depth(), MAX_DEPTH);

        assert!(matches!(
            parse_rule(&chain("AND", MAX_DEPTH)),
            Err(RuleError::TooDeep { .. })
        ));
    }

    #[test]
    fn grouping_counts_towards_tree_depth() {
        // ((((a = 0 AND b = 0) AND b = 0) AND b = 0) ...) nests to the left.
        let mut rule = String::from("a = 0");
        for _ in 0..MAX_DEPTH {
            rule = format!("({rule} AND b = 0)");
        }
        assert!(matches!(parse_rule(&rule), Err(RuleError::TooDeep { .. })));
    }
}
