//! Tokenizer for configuration scripts.

use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),

    Let,
    Export,
    Default,
    Fn,
    If,
    Else,
    True,
    False,
    Null,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Pipe,

    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Coalesce,

    Eof,
}

impl Token {
    /// Source text of a keyword token, so keywords can be used as object keys.
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            Token::Let => "let",
            Token::Export => "export",
            Token::Default => "default",
            Token::Fn => "fn",
            Token::If => "if",
            Token::Else => "else",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            _ => return None,
        })
    }
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;

    let err = |line: usize, message: String| ScriptError::Lex { line, message };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Comments
        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && next == Some('*') {
            let start_line = line;
            i += 2;
            loop {
                match chars.get(i) {
                    None => return Err(err(start_line, "unterminated block comment".into())),
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            continue;
        }

        let start_line = line;

        if c == '"' || c == '\'' {
            let quote = c;
            let mut value = String::new();
            i += 1;
            loop {
                let Some(&ch) = chars.get(i) else {
                    return Err(err(start_line, "unterminated string".into()));
                };
                i += 1;
                match ch {
                    '\\' => {
                        let Some(&escaped) = chars.get(i) else {
                            return Err(err(start_line, "unterminated string".into()));
                        };
                        i += 1;
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                    }
                    '\n' => return Err(err(start_line, "newline in string literal".into())),
                    ch if ch == quote => break,
                    ch => value.push(ch),
                }
            }
            tokens.push(Spanned {
                token: Token::Str(value),
                line: start_line,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
            if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if matches!(chars.get(i), Some('e') | Some('E')) {
                let mut j = i + 1;
                if matches!(chars.get(j), Some('+') | Some('-')) {
                    j += 1;
                }
                if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().filter(|&&ch| ch != '_').collect();
            let number = text
                .parse::<f64>()
                .map_err(|_| err(start_line, format!("invalid number '{text}'")))?;
            tokens.push(Spanned {
                token: Token::Number(number),
                line: start_line,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let token = match word.as_str() {
                "let" | "const" => Token::Let,
                "export" => Token::Export,
                "default" => Token::Default,
                "fn" | "function" => Token::Fn,
                "if" => Token::If,
                "else" => Token::Else,
                "true" => Token::True,
                "false" => Token::False,
                "null" | "undefined" => Token::Null,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned {
                token,
                line: start_line,
            });
            continue;
        }

        let (token, width) = match (c, next) {
            ('=', Some('=')) => {
                let width = if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
                (Token::EqEq, width)
            }
            ('!', Some('=')) => {
                let width = if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
                (Token::NotEq, width)
            }
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('?', Some('?')) => (Token::Coalesce, 2),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            (':', _) => (Token::Colon, 1),
            (';', _) => (Token::Semicolon, 1),
            ('.', _) => (Token::Dot, 1),
            ('|', _) => (Token::Pipe, 1),
            ('!', _) => (Token::Bang, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('=', _) => (Token::Assign, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            (other, _) => return Err(err(start_line, format!("unexpected character '{other}'"))),
        };
        tokens.push(Spanned {
            token,
            line: start_line,
        });
        i += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("let x = 1.5;"),
            vec![
                Token::Let,
                Token::Ident("x".into()),
                Token::Assign,
                Token::Number(1.5),
                Token::Semicolon,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a === b != c ?? d || e && !f"),
            vec![
                Token::Ident("a".into()),
                Token::EqEq,
                Token::Ident("b".into()),
                Token::NotEq,
                Token::Ident("c".into()),
                Token::Coalesce,
                Token::Ident("d".into()),
                Token::OrOr,
                Token::Ident("e".into()),
                Token::AndAnd,
                Token::Bang,
                Token::Ident("f".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb""#),
            vec![
                Token::Str("it's".into()),
                Token::Str("a\nb".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = tokenize("// one\n/* two\nthree */ x").unwrap();
        assert_eq!(tokens[0].token, Token::Ident("x".into()));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(tokenize("\"open"), Err(ScriptError::Lex { .. })));
        assert!(matches!(tokenize("a # b"), Err(ScriptError::Lex { .. })));
        assert!(matches!(tokenize("/* open"), Err(ScriptError::Lex { .. })));
    }
}
