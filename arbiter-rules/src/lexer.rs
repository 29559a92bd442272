use crate::ast::Operator;
use crate::error::RuleError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Operator(Operator),
    /// Field name, number or literal. Quoted literals keep their quotes.
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character in the source string.
    pub offset: usize,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self.kind, TokenKind::Operator(_))
    }
}

const COMPARISON_CHARS: &[char] = &['<', '>', '=', '!'];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '\'')
}

/// Splits a rule string into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, RuleError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            c if COMPARISON_CHARS.contains(&c) => {
                let mut symbol = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !COMPARISON_CHARS.contains(&next) {
                        break;
                    }
                    symbol.push(next);
                    chars.next();
                }
                match Operator::parse(&symbol).filter(|op| !op.is_logical()) {
                    Some(op) => TokenKind::Operator(op),
                    None => {
                        return Err(RuleError::Lex {
                            offset,
                            message: format!("unknown operator '{symbol}'"),
                        })
                    }
                }
            }
            '\'' => {
                chars.next();
                let mut literal = String::from('\'');
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    literal.push(next);
                    if next == '\'' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(RuleError::Lex {
                        offset,
                        message: "unterminated quoted literal".into(),
                    });
                }
                TokenKind::Word(literal)
            }
            c if is_word_char(c) || (c == '-' && starts_number(source, offset)) => {
                let mut word = String::new();
                word.push(c);
                chars.next();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.as_str() {
                    "AND" => TokenKind::Operator(Operator::And),
                    "OR" => TokenKind::Operator(Operator::Or),
                    _ => TokenKind::Word(word),
                }
            }
            other => {
                return Err(RuleError::Lex {
                    offset,
                    message: format!("unexpected character '{other}'"),
                })
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn starts_number(source: &str, offset: usize) -> bool {
    source[offset + 1..]
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn word(value: &str) -> TokenKind {
        TokenKind::Word(value.to_string())
    }

    #[test]
    fn splits_comparisons_and_keywords() {
        assert_eq!(
            kinds("(age>=30 AND department = 'Marketing')"),
            vec![
                TokenKind::LParen,
                word("age"),
                TokenKind::Operator(Operator::Ge),
                word("30"),
                TokenKind::Operator(Operator::And),
                word("department"),
                TokenKind::Operator(Operator::Eq),
                word("'Marketing'"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn keywords_must_be_whole_words() {
        assert_eq!(
            kinds("ANDROID = ORACLE"),
            vec![word("ANDROID"), TokenKind::Operator(Operator::Eq), word("ORACLE")]
        );
        assert_eq!(kinds("and"), vec![word("and")]);
    }

    #[test]
    fn quoted_literals_keep_spaces() {
        assert_eq!(
            kinds("city = 'New York'"),
            vec![word("city"), TokenKind::Operator(Operator::Eq), word("'New York'")]
        );
    }

    #[test]
    fn numbers_and_paths_are_single_words() {
        assert_eq!(
            kinds("address.zip != -12.5"),
            vec![
                word("address.zip"),
                TokenKind::Operator(Operator::NotEq),
                word("-12.5"),
            ]
        );
    }

    #[test]
    fn records_offsets() {
        let tokens = tokenize("a  >  1").expect("tokenize");
        let offsets: Vec<_> = tokens.iter().map(|token| token.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn rejects_unknown_operator_runs() {
        let err = tokenize("a == 1").unwrap_err();
        assert!(matches!(err, RuleError::Lex { offset: 2, .. }));
    }

    #[test]
    fn rejects_unterminated_quotes_and_stray_characters() {
        assert!(matches!(
            tokenize("name = 'Bob").unwrap_err(),
            RuleError::Lex { offset: 7, .. }
        ));
        assert!(matches!(
            tokenize("a > 1 & b").unwrap_err(),
            RuleError::Lex { offset: 6, .. }
        ));
    }
}
