//! Tokenizer for rule expressions.

use std::fmt;

use crate::errors::ExprError;

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    /// Numeric literal.
    Number(f64),
    /// Quoted string literal, quotes removed.
    Str(String),
    /// Identifier.
    Name(String),
    /// `True`.
    True,
    /// `False`.
    False,
    /// `and`.
    And,
    /// `or`.
    Or,
    /// `not`.
    Not,
    /// `in`.
    In,
    /// `if`.
    If,
    /// `else`.
    Else,
    /// `+`.
    Plus,
    /// `-`.
    Minus,
    /// `*`.
    Star,
    /// `**`.
    DoubleStar,
    /// `/`.
    Slash,
    /// `//`.
    DoubleSlash,
    /// `%`.
    Percent,
    /// `<`.
    Less,
    /// `<=`.
    LessEqual,
    /// `>`.
    Greater,
    /// `>=`.
    GreaterEqual,
    /// `==`.
    EqualEqual,
    /// `!=`.
    NotEqual,
    /// `(`.
    LeftParen,
    /// `)`.
    RightParen,
    /// `,`.
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string '{s}'"),
            Self::Name(name) => write!(f, "name '{name}'"),
            other => write!(f, "'{}'", other.symbol()),
        }
    }
}

impl Token {
    /// Source spelling of keyword and punctuation tokens.
    fn symbol(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::If => "if",
            Self::Else => "else",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::EqualEqual => "==",
            Self::NotEqual => "!=",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::Comma => ",",
            Self::Number(_) | Self::Str(_) | Self::Name(_) => "",
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    /// The token.
    pub(crate) token: Token,
    /// Byte offset into the source.
    pub(crate) offset: usize,
}

/// Split `source` into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && next_is_digit(source, offset)) {
            let end = scan_number(source, offset);
            let literal = &source[offset..end];
            let value = literal.parse::<f64>().map_err(|_| ExprError::InvalidNumber {
                literal: literal.to_owned(),
                offset,
            })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            while chars.peek().is_some_and(|&(idx, _)| idx < end) {
                chars.next();
            }
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut end = offset;
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    end = idx + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &source[offset..end];
            let token = match word {
                "True" => Token::True,
                "False" => Token::False,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "in" => Token::In,
                "if" => Token::If,
                "else" => Token::Else,
                _ => Token::Name(word.to_owned()),
            };
            tokens.push(Spanned { token, offset });
            continue;
        }

        if ch == '\'' || ch == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == ch {
                    closed = true;
                    break;
                }
                text.push(c);
            }
            if !closed {
                return Err(ExprError::UnterminatedString { offset });
            }
            tokens.push(Spanned {
                token: Token::Str(text),
                offset,
            });
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, c)| c);
        let (token, double) = match (ch, next) {
            ('*', Some('*')) => (Token::DoubleStar, true),
            ('/', Some('/')) => (Token::DoubleSlash, true),
            ('<', Some('=')) => (Token::LessEqual, true),
            ('>', Some('=')) => (Token::GreaterEqual, true),
            ('=', Some('=')) => (Token::EqualEqual, true),
            ('!', Some('=')) => (Token::NotEqual, true),
            ('+', _) => (Token::Plus, false),
            ('-', _) => (Token::Minus, false),
            ('*', _) => (Token::Star, false),
            ('/', _) => (Token::Slash, false),
            ('%', _) => (Token::Percent, false),
            ('<', _) => (Token::Less, false),
            ('>', _) => (Token::Greater, false),
            ('(', _) => (Token::LeftParen, false),
            (')', _) => (Token::RightParen, false),
            (',', _) => (Token::Comma, false),
            (found, _) => return Err(ExprError::UnexpectedChar { found, offset }),
        };
        if double {
            chars.next();
        }
        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

/// Whether the byte after `offset` is an ASCII digit.
fn next_is_digit(source: &str, offset: usize) -> bool {
    source
        .as_bytes()
        .get(offset + 1)
        .is_some_and(u8::is_ascii_digit)
}

/// Find the end of a numeric literal starting at `start`.
///
/// Accepts `12`, `12.5`, `.5`, `1e3` and `2.5E-4`.
fn scan_number(source: &str, start: usize) -> usize {
    let bytes = source.as_bytes();
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b'.' {
        idx += 1;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
    }
    if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
        let mut exp = idx + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            idx = exp;
        }
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("source tokenizes")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn reads_numbers_with_fraction_and_exponent() {
        assert_eq!(
            kinds("12 2.5 .5 1e3 2.5E-4"),
            vec![
                Token::Number(12.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(2.5e-4),
            ]
        );
    }

    #[test]
    fn distinguishes_single_and_double_operators() {
        assert_eq!(
            kinds("a ** b // c <= d != e"),
            vec![
                Token::Name("a".into()),
                Token::DoubleStar,
                Token::Name("b".into()),
                Token::DoubleSlash,
                Token::Name("c".into()),
                Token::LessEqual,
                Token::Name("d".into()),
                Token::NotEqual,
                Token::Name("e".into()),
            ]
        );
    }

    #[test]
    fn recognises_keywords_and_strings() {
        assert_eq!(
            kinds("not x in ('a', \"b\") or True"),
            vec![
                Token::Not,
                Token::Name("x".into()),
                Token::In,
                Token::LeftParen,
                Token::Str("a".into()),
                Token::Comma,
                Token::Str("b".into()),
                Token::RightParen,
                Token::Or,
                Token::True,
            ]
        );
    }

    #[test]
    fn records_offsets() {
        let tokens = tokenize("espesor >= 4").expect("tokenizes");
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 8, 11]);
    }

    #[test]
    fn rejects_lone_equals_sign() {
        let error = tokenize("a = 1").expect_err("assignment is not an expression");
        assert_eq!(error, ExprError::UnexpectedChar { found: '=', offset: 2 });
    }

    #[test]
    fn rejects_unterminated_string() {
        let error = tokenize("patron == 'none").expect_err("missing quote");
        assert_eq!(error, ExprError::UnterminatedString { offset: 10 });
    }
}
