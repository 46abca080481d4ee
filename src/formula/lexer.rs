use super::{aliases::is_word_char, error::FormulaError};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,
    Comma,
    LParen,
    RParen,
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Splits a formula into tokens. `and`, `or`, `not`, `true` and `false` are
/// keywords; `&&`, `||` and `!` are accepted as spellings of the first three.
pub fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let two = bytes.get(pos + 1).copied();
        let kind = match c {
            b'0'..=b'9' | b'.' => {
                let (value, end) = lex_number(src, pos)?;
                pos = end;
                TokenKind::Number(value)
            }
            b'"' | b'\'' => {
                let (text, end) = lex_string(src, pos)?;
                pos = end;
                TokenKind::Str(text)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let end = src[pos..]
                    .char_indices()
                    .find(|(_, ch)| !is_word_char(*ch))
                    .map(|(i, _)| pos + i)
                    .unwrap_or(src.len());
                let word = &src[pos..end];
                pos = end;
                match word {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    _ => TokenKind::Ident(word.to_string()),
                }
            }
            b'&' if two == Some(b'&') => {
                pos += 2;
                TokenKind::And
            }
            b'|' if two == Some(b'|') => {
                pos += 2;
                TokenKind::Or
            }
            b'=' if two == Some(b'=') => {
                pos += 2;
                TokenKind::Eq
            }
            b'!' if two == Some(b'=') => {
                pos += 2;
                TokenKind::Ne
            }
            b'<' if two == Some(b'=') => {
                pos += 2;
                TokenKind::Le
            }
            b'>' if two == Some(b'=') => {
                pos += 2;
                TokenKind::Ge
            }
            _ => {
                pos += 1;
                match c {
                    b'!' => TokenKind::Not,
                    b'<' => TokenKind::Lt,
                    b'>' => TokenKind::Gt,
                    b'+' => TokenKind::Plus,
                    b'-' => TokenKind::Minus,
                    b'*' => TokenKind::Star,
                    b'/' => TokenKind::Slash,
                    b'%' => TokenKind::Percent,
                    b'^' => TokenKind::Caret,
                    b'?' => TokenKind::Question,
                    b':' => TokenKind::Colon,
                    b',' => TokenKind::Comma,
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    _ => {
                        let ch = src[start..].chars().next().unwrap_or('?');
                        return Err(FormulaError::parse(
                            start,
                            format!("Unexpected character '{ch}'"),
                        ));
                    }
                }
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
    }

    Ok(tokens)
}

fn lex_number(src: &str, start: usize) -> Result<(f64, usize), FormulaError> {
    let bytes = src.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    // Exponent only when followed by digits; `2e` stays a parse error later.
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            pos = exp;
        }
    }

    let text = &src[start..pos];
    text.parse::<f64>()
        .map(|value| (value, pos))
        .map_err(|_| FormulaError::parse(start, format!("Invalid number '{text}'")))
}

fn lex_string(src: &str, start: usize) -> Result<(String, usize), FormulaError> {
    let mut chars = src[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(FormulaError::parse(start, "Unterminated string")),
    };

    let mut out = String::new();
    let mut escaped = false;
    for (offset, ch) in chars {
        if escaped {
            out.push(match ch {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return Ok((out, start + offset + ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }

    Err(FormulaError::parse(start, "Unterminated string"))
}
