//! Expression tokenizer.

use crate::error::{EvalError, EvalResult};
use logos::{Lexer, Logos};
use std::ops::Range;

/// A token in a template expression.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'s> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("=>")]
    FatArrow,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("??")]
    Coalesce,
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("===")]
    Identical,
    #[token("!==")]
    NotIdentical,
    #[token("==")]
    Equal,
    #[token("!=")]
    #[token("<>")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    /// `$name`, without the sigil.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Variable(&'s str),

    /// A bare name: a function, constant or word operator (`and`, `or`).
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'s str),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[token("'", |lex| lex_string(lex, '\''))]
    #[token("\"", |lex| lex_string(lex, '"'))]
    String(String),
}

/// Read the body of a quoted string after its opening quote.
///
/// Single-quoted strings only unescape `\'` and `\\`; double-quoted strings
/// also understand `\n`, `\t`, `\r` and `\$`.
fn lex_string<'s>(lex: &mut Lexer<'s, Token<'s>>, quote: char) -> Option<String> {
    let mut out = String::new();
    let mut chars = lex.remainder().char_indices();

    while let Some((i, c)) = chars.next() {
        if c == quote {
            lex.bump(i + 1);
            return Some(out);
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let (_, escaped) = chars.next()?;
        match (quote, escaped) {
            (_, e) if e == quote || e == '\\' => out.push(e),
            ('"', 'n') => out.push('\n'),
            ('"', 't') => out.push('\t'),
            ('"', 'r') => out.push('\r'),
            ('"', '$') => out.push('$'),
            (_, e) => {
                out.push('\\');
                out.push(e);
            }
        }
    }

    None
}

/// Tokenize an expression, keeping each token's byte range.
pub fn tokenize(source: &str) -> EvalResult<Vec<(Token<'_>, Range<usize>)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with('\'') || slice.starts_with('"') {
                    "unterminated string".to_string()
                } else {
                    format!("unexpected `{}`", slice)
                };
                return Err(EvalError::syntax(source, lexer.span().start, message));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_property_chain() {
        assert_eq!(
            kinds("$this->item?->name ?? 'none'"),
            vec![
                Token::Variable("this"),
                Token::Arrow,
                Token::Ident("item"),
                Token::NullsafeArrow,
                Token::Ident("name"),
                Token::Coalesce,
                Token::String("none".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators_take_longest_match() {
        assert_eq!(
            kinds("$a !== 1.5 . 2"),
            vec![
                Token::Variable("a"),
                Token::NotIdentical,
                Token::Float(1.5),
                Token::Dot,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_exponent_floats() {
        assert_eq!(
            kinds("1e20 + 1.5E-3 - 2e+2"),
            vec![
                Token::Float(1e20),
                Token::Plus,
                Token::Float(1.5e-3),
                Token::Minus,
                Token::Float(2e2),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#"'it\'s \n'"#), vec![Token::String("it's \\n".to_string())]);
        assert_eq!(kinds(r#""a\"b\n""#), vec![Token::String("a\"b\n".to_string())]);
    }

    #[test]
    fn test_errors() {
        let err = tokenize("'open").unwrap_err();
        assert_eq!(
            err,
            EvalError::Syntax {
                expression: "'open".to_string(),
                offset: 0,
                message: "unterminated string".to_string(),
            }
        );
        assert!(tokenize("$a # b").is_err());
    }
}
