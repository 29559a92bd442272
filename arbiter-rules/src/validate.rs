use crate::error::RuleError;
use crate::lexer::{tokenize, Token, TokenKind};

/// Cheap structural checks run before a rule string is parsed.
///
/// Rejects blank input, unbalanced parentheses and operators that sit at
/// either end of the rule or next to another operator. Parentheses are
/// ignored when checking operator placement.
pub fn validate_rule_string(rule: &str) -> Result<(), RuleError> {
    if rule.trim().is_empty() {
        return Err(RuleError::invalid("rule string is empty"));
    }

    let opening = rule.matches('(').count();
    let closing = rule.matches(')').count();
    if opening != closing {
        return Err(RuleError::invalid(format!(
            "unbalanced parentheses: {opening} opening, {closing} closing"
        )));
    }

    let tokens = tokenize(rule).map_err(|err| RuleError::invalid(err.to_string()))?;
    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|token| !matches!(token.kind, TokenKind::LParen | TokenKind::RParen))
        .collect();

    let last = significant.len().saturating_sub(1);
    for (index, token) in significant.iter().enumerate() {
        if !token.is_operator() {
            continue;
        }
        if index == 0 || index == last {
            return Err(RuleError::invalid(format!(
                "operator at offset {} has no operand on one side",
                token.offset
            )));
        }
        if significant[index - 1].is_operator() || significant[index + 1].is_operator() {
            return Err(RuleError::invalid(format!(
                "operator at offset {} is adjacent to another operator",
                token.offset
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(rule: &str) -> String {
        match validate_rule_string(rule) {
            Err(RuleError::InvalidRule { reason }) => reason,
            other => panic!("expected invalid rule for {rule:?}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_rules() {
        validate_rule_string("((age > 30 AND department = 'Marketing')) OR (salary > 20000)")
            .expect("valid rule");
        validate_rule_string("active").expect("single operand is valid");
    }

    #[test]
    fn rejects_blank_rules() {
        assert!(reason("   ").contains("empty"));
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(reason("(age > 30").contains("unbalanced"));
        assert!(reason("age > 30)").contains("unbalanced"));
    }

    #[test]
    fn rejects_operators_at_the_edges() {
        assert!(reason("AND age > 30").contains("no operand"));
        assert!(reason("age >").contains("no operand"));
        assert!(reason("(OR a = 1)").contains("no operand"));
    }

    #[test]
    fn rejects_adjacent_operators() {
        assert!(reason("age > AND 30").contains("adjacent"));
        assert!(reason("a = 1 AND OR b = 2").contains("adjacent"));
    }

    #[test]
    fn lexer_failures_are_invalid_rules() {
        assert!(reason("a => 1").contains("unknown operator"));
    }

    #[test]
    fn error_message_is_generic() {
        let err = validate_rule_string("age >").unwrap_err();
        assert_eq!(err.to_string(), "Invalid rule string");
    }
}
