//! Lexer for the filter language using logos.

use crate::error::ParseError;
use crate::span::Span;
use logos::Logos;

/// Token types of the filter language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Comparison operators
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Logical operators
    #[token("&&")]
    #[token("and")]
    And,
    #[token("||")]
    #[token("or")]
    Or,
    #[token("!")]
    Bang,
    #[token("not")]
    Not,

    // Keyword operators
    #[token("is")]
    Is,
    #[token("in")]
    In,
    #[token("between")]
    Between,
    #[token("like")]
    Like,
    #[token("startsWith")]
    StartsWith,
    #[token("endsWith")]
    EndsWith,
    #[token("contains")]
    Contains,
    #[token("isEmpty")]
    IsEmpty,
    #[token("isNotEmpty")]
    IsNotEmpty,

    // Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Punctuation
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

impl Token {
    /// How the token appears in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Int(i) => format!("integer {}", i),
            Token::Float(f) => format!("float {}", f),
            other => format!("{:?}", other),
        }
    }
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize a source string, failing on the first unrecognized input.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span: Span = lexer.span().into();
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                let slice = lexer.slice();
                let mut error = ParseError::new(format!("unexpected input '{}'", slice), span);
                if slice == "=" {
                    error = error.with_hint("use '==' for equality");
                } else if slice == "&" || slice == "|" {
                    error = error.with_hint("use '&&' and '||' for logical operators");
                } else if slice.starts_with('"') || slice.starts_with('\'') {
                    error = error.with_hint("string literal is not terminated");
                }
                return Err(error);
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            tokens("age >= 18"),
            vec![Token::Ident("age".to_string()), Token::Ge, Token::Int(18)]
        );
    }

    #[test]
    fn test_word_and_symbol_operators() {
        assert_eq!(
            tokens("a && b and c || d or !e not f"),
            vec![
                Token::Ident("a".to_string()),
                Token::And,
                Token::Ident("b".to_string()),
                Token::And,
                Token::Ident("c".to_string()),
                Token::Or,
                Token::Ident("d".to_string()),
                Token::Or,
                Token::Bang,
                Token::Ident("e".to_string()),
                Token::Not,
                Token::Ident("f".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_do_not_swallow_identifiers() {
        assert_eq!(
            tokens("notes isEmpty"),
            vec![Token::Ident("notes".to_string()), Token::IsEmpty]
        );
        assert_eq!(tokens("android"), vec![Token::Ident("android".to_string())]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            tokens(r#"-3 2.5 "a\"b" 'it\'s' true null"#),
            vec![
                Token::Int(-3),
                Token::Float(2.5),
                Token::String("a\"b".to_string()),
                Token::String("it's".to_string()),
                Token::True,
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("id in [1, 2]").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 5));
        assert_eq!(tokens[2].token, Token::LBracket);
        assert_eq!(tokens[6].token, Token::RBracket);
    }

    #[test]
    fn test_single_equals_rejected_with_hint() {
        let err = tokenize("age = 18").unwrap_err();
        assert_eq!(err.span, Span::new(4, 5));
        assert_eq!(err.hint.as_deref(), Some("use '==' for equality"));
    }
}
