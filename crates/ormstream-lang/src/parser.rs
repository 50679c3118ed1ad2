//! Recursive descent parser for filter expressions.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{tokenize, SpannedToken, Token};
use crate::span::{Span, Spanned};

/// Parser over a tokenized filter expression.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    position: usize,
    end: Span,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(source)?,
            position: 0,
            end: Span::at(source.len()),
        })
    }

    /// Parse a complete condition; trailing input is an error.
    pub fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        if self.peek().is_none() {
            return Err(ParseError::new("empty filter expression", self.end));
        }

        let condition = self.parse_or_condition()?;
        if let Some(tok) = self.peek() {
            return Err(ParseError::new(
                format!("unexpected {} after condition", tok.token.describe()),
                tok.span,
            )
            .with_hint("combine conditions with '&&' or '||'"));
        }
        Ok(condition)
    }

    fn parse_or_condition(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_and_condition()?;

        while self.eat(&Token::Or) {
            let right = self.parse_and_condition()?;
            left = match left {
                Condition::Or(mut conditions) => {
                    conditions.push(right);
                    Condition::Or(conditions)
                }
                _ => Condition::Or(vec![left, right]),
            };
        }

        Ok(left)
    }

    fn parse_and_condition(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_unary_condition()?;

        while self.eat(&Token::And) {
            let right = self.parse_unary_condition()?;
            left = match left {
                Condition::And(mut conditions) => {
                    conditions.push(right);
                    Condition::And(conditions)
                }
                _ => Condition::And(vec![left, right]),
            };
        }

        Ok(left)
    }

    fn parse_unary_condition(&mut self) -> Result<Condition, ParseError> {
        if self.eat(&Token::Bang) || self.eat(&Token::Not) {
            let inner = self.parse_unary_condition()?;
            return Ok(Condition::Not(Box::new(inner)));
        }

        if self.eat(&Token::LParen) {
            let condition = self.parse_or_condition()?;
            self.expect_token(Token::RParen)?;
            return Ok(condition);
        }

        self.parse_primary_condition()
    }

    /// Parse a condition on a single column.
    fn parse_primary_condition(&mut self) -> Result<Condition, ParseError> {
        let field = self.expect_ident()?;
        let op_tok = self.next_token()?;

        match op_tok.token {
            Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                let op = match op_tok.token {
                    Token::Eq => ComparisonOp::Eq,
                    Token::Ne => ComparisonOp::Ne,
                    Token::Lt => ComparisonOp::Lt,
                    Token::Le => ComparisonOp::Le,
                    Token::Gt => ComparisonOp::Gt,
                    _ => ComparisonOp::Ge,
                };
                let value = self.parse_literal()?;
                Ok(Condition::Comparison { field, op, value })
            }

            Token::Is => {
                let negated = self.eat(&Token::Not);
                let null_tok = self.next_token()?;
                if null_tok.token != Token::Null {
                    return Err(ParseError::new(
                        format!("expected 'null' after 'is', found {}", null_tok.token.describe()),
                        null_tok.span,
                    ));
                }
                Ok(Condition::IsNull { field, negated })
            }

            Token::Not => {
                let next = self.next_token()?;
                self.parse_keyword_condition(field, next, true)
            }

            Token::IsEmpty => Ok(Condition::Empty {
                field,
                negated: false,
            }),
            Token::IsNotEmpty => Ok(Condition::Empty {
                field,
                negated: true,
            }),

            _ => self.parse_keyword_condition(field, op_tok, false),
        }
    }

    /// Parse the operators that accept a `not` prefix.
    fn parse_keyword_condition(
        &mut self,
        field: Spanned<String>,
        op_tok: SpannedToken,
        negated: bool,
    ) -> Result<Condition, ParseError> {
        let text_op = match op_tok.token {
            Token::In => {
                let values = self.parse_array_literal()?;
                return Ok(Condition::In {
                    field,
                    values,
                    negated,
                });
            }
            Token::Between => {
                let low = self.parse_literal()?;
                self.expect_token(Token::And)?;
                let high = self.parse_literal()?;
                return Ok(Condition::Between {
                    field,
                    low,
                    high,
                    negated,
                });
            }
            Token::StartsWith => TextOp::StartsWith,
            Token::EndsWith => TextOp::EndsWith,
            Token::Contains => TextOp::Contains,
            Token::Like => TextOp::Like,
            other => {
                let expected = if negated {
                    "expected 'in', 'between', 'startsWith', 'endsWith', 'contains' \
                     or 'like' after 'not'"
                } else {
                    "expected an operator"
                };
                return Err(ParseError::new(
                    format!("{}, found {}", expected, other.describe()),
                    op_tok.span,
                ));
            }
        };

        let pattern = self.parse_string_literal()?;
        Ok(Condition::Text {
            field,
            op: text_op,
            pattern,
            negated,
        })
    }

    /// Parse `[literal, ...]`.
    fn parse_array_literal(&mut self) -> Result<Vec<Spanned<Literal>>, ParseError> {
        self.expect_token(Token::LBracket)?;
        let mut values = Vec::new();

        if self.eat(&Token::RBracket) {
            return Ok(values);
        }

        values.push(self.parse_literal()?);
        while !self.eat(&Token::RBracket) {
            self.expect_token(Token::Comma)?;
            values.push(self.parse_literal()?);
        }

        Ok(values)
    }

    fn parse_literal(&mut self) -> Result<Spanned<Literal>, ParseError> {
        let tok = self.next_token()?;
        let literal = match tok.token {
            Token::Null => Literal::Null,
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Int(i) => Literal::Int(i),
            Token::Float(f) => Literal::Float(f),
            Token::String(s) => Literal::String(s),
            Token::Ident(name) => {
                return Err(ParseError::new(
                    format!("expected a literal, found identifier '{}'", name),
                    tok.span,
                )
                .with_hint("quote string values"))
            }
            other => {
                return Err(ParseError::new(
                    format!("expected a literal, found {}", other.describe()),
                    tok.span,
                ))
            }
        };
        Ok(Spanned::new(literal, tok.span))
    }

    fn parse_string_literal(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::String(s) => Ok(Spanned::new(s, tok.span)),
            other => Err(ParseError::new(
                format!("expected a string, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Ident(name) => Ok(Spanned::new(name, tok.span)),
            other => Err(ParseError::new(
                format!("expected a column name, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<Span, ParseError> {
        let tok = self.next_token()?;
        if tok.token == expected {
            Ok(tok.span)
        } else {
            Err(ParseError::new(
                format!("expected {}, found {}", expected.describe(), tok.token.describe()),
                tok.span,
            ))
        }
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.position)
    }

    /// Consume the next token if it is `token`.
    fn eat(&mut self, token: &Token) -> bool {
        match self.peek() {
            Some(tok) if tok.token == *token => {
                self.position += 1;
                true
            }
            _ => false,
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        let tok = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| ParseError::new("unexpected end of input", self.end))?;
        self.position += 1;
        Ok(tok)
    }
}

/// Parse a filter expression.
pub fn parse(source: &str) -> Result<Condition, ParseError> {
    Parser::new(source)?.parse_condition()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str, start: usize) -> Spanned<String> {
        Spanned::new(name.to_string(), Span::new(start, start + name.len()))
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            parse("age >= 18").unwrap(),
            Condition::Comparison {
                field: field("age", 0),
                op: ComparisonOp::Ge,
                value: Spanned::new(Literal::Int(18), Span::new(7, 9)),
            }
        );
    }

    #[test]
    fn test_precedence() {
        let condition = parse("a == 1 || b == 2 && !c is null").unwrap();
        assert_eq!(condition.to_string(), "(a == 1 || (b == 2 && !(c is null)))");
    }

    #[test]
    fn test_parentheses_and_word_operators() {
        let condition = parse("(a == 1 or b == 2) and not (c > 3)").unwrap();
        assert_eq!(condition.to_string(), "((a == 1 || b == 2) && !(c > 3))");
    }

    #[test]
    fn test_flattened_chains() {
        match parse("a == 1 && b == 2 && c == 3").unwrap() {
            Condition::And(conditions) => assert_eq!(conditions.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_operators() {
        let cases = [
            ("id in [1, 2, 3]", "id in [1, 2, 3]"),
            ("id not in []", "id not in []"),
            ("rating is not null", "rating is not null"),
            ("length between 60 and 120", "length between 60 and 120"),
            ("length not between 1 and 2", "length not between 1 and 2"),
            ("title startsWith 'AC'", "title startsWith \"AC\""),
            ("title not contains \"x\"", "title not contains \"x\""),
            ("title like \"A_E%\"", "title like \"A_E%\""),
            ("notes isEmpty", "notes isEmpty"),
            ("notes isNotEmpty", "notes isNotEmpty"),
            ("price < -2.5", "price < -2.5"),
            ("active == true", "active == true"),
        ];

        for (source, expected) in cases {
            assert_eq!(parse(source).unwrap().to_string(), expected, "{}", source);
        }
    }

    #[test]
    fn test_between_binds_its_and() {
        let condition = parse("x between 1 and 5 && y == 2").unwrap();
        assert_eq!(condition.to_string(), "(x between 1 and 5 && y == 2)");
    }

    #[test]
    fn test_errors() {
        let err = parse("age >").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
        assert_eq!(err.span, Span::new(5, 5));

        let err = parse("age > 1 name == 'x'").unwrap_err();
        assert_eq!(err.span, Span::new(8, 12));
        assert!(err.hint.is_some());

        let err = parse("title == ada").unwrap_err();
        assert_eq!(err.hint.as_deref(), Some("quote string values"));

        let err = parse("id is 3").unwrap_err();
        assert!(err.message.starts_with("expected 'null' after 'is'"));

        let err = parse("(a == 1").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");

        assert!(parse("").is_err());
        assert!(parse("id not == 1").is_err());
    }
}
