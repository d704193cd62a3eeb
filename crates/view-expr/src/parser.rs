//! Expression parser.
//!
//! Precedence, lowest first:
//!
//! | Level | Operators |
//! |---|---|
//! | ternary | `a ? b : c`, `a ?: c` |
//! | coalesce | `??` (right-associative) |
//! | or | `\|\|`, `or` |
//! | and | `&&`, `and` |
//! | equality | `==`, `!=`, `===`, `!==` |
//! | comparison | `<`, `<=`, `>`, `>=` |
//! | concat | `.` |
//! | additive | `+`, `-` |
//! | multiplicative | `*`, `/`, `%` |
//! | unary | `!`, `-` |
//! | postfix | `->name`, `?->name`, `[index]` |

use crate::error::{EvalError, EvalResult};
use crate::lexer::{tokenize, Token};
use crate::value::Value;
use smol_str::SmolStr;
use std::ops::Range;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `$name`, or `$this->name`.
    Variable(SmolStr),
    /// `target->name` or `target?->name`.
    Property { target: Box<Expr>, name: SmolStr },
    /// `target[index]`.
    Index { target: Box<Expr>, index: Box<Expr> },
    /// `name(args…)`.
    Call { function: SmolStr, args: Vec<Expr> },
    /// `[a, b]` or `['k' => v]`.
    Array(Vec<ArrayItem>),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `condition ? then : otherwise`; `then` is absent for `?:`.
    Ternary {
        condition: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
}

/// An entry in an array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Coalesce,
    Or,
    And,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Concat,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    /// The operator as written.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Coalesce => "??",
            Self::Or => "||",
            Self::And => "&&",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Identical => "===",
            Self::NotIdentical => "!==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Concat => ".",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

/// Parse an expression.
pub fn parse_expression(source: &str) -> EvalResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = ExprParser {
        source,
        tokens,
        pos: 0,
    };

    if parser.tokens.is_empty() {
        return Err(EvalError::syntax(source, 0, "empty expression"));
    }

    let expr = parser.parse_ternary()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct ExprParser<'s> {
    source: &'s str,
    tokens: Vec<(Token<'s>, Range<usize>)>,
    pos: usize,
}

impl<'s> ExprParser<'s> {
    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token<'s>> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token<'s>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(word) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, expected: Token<'s>, what: &str) -> EvalResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, range)| range.start)
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::syntax(self.source, self.offset(), message)
    }

    fn unexpected(&self) -> EvalError {
        match self.tokens.get(self.pos) {
            Some((_, range)) => self.error(format!("unexpected `{}`", &self.source[range.clone()])),
            None => self.error("unexpected end of expression"),
        }
    }

    fn parse_ternary(&mut self) -> EvalResult<Expr> {
        let condition = self.parse_coalesce()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }

        let then = if self.eat(&Token::Colon) {
            None
        } else {
            let then = self.parse_ternary()?;
            self.expect(Token::Colon, "`:` in ternary")?;
            Some(Box::new(then))
        };
        let otherwise = self.parse_ternary()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then,
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_coalesce(&mut self) -> EvalResult<Expr> {
        let left = self.parse_or()?;
        if self.eat(&Token::Coalesce) {
            let right = self.parse_coalesce()?;
            return Ok(binary(BinaryOp::Coalesce, left, right));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) || self.eat_word("or") {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::AndAnd) || self.eat_word("and") {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::Equal) => BinaryOp::Equal,
                Some(Token::NotEqual) => BinaryOp::NotEqual,
                Some(Token::Identical) => BinaryOp::Identical,
                Some(Token::NotIdentical) => BinaryOp::NotIdentical,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
    }

    fn parse_comparison(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.peek() {
                Some(Token::Less) => BinaryOp::Less,
                Some(Token::LessEqual) => BinaryOp::LessEqual,
                Some(Token::Greater) => BinaryOp::Greater,
                Some(Token::GreaterEqual) => BinaryOp::GreaterEqual,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_concat()?;
            left = binary(op, left, right);
        }
    }

    fn parse_concat(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_additive()?;
        while self.eat(&Token::Dot) {
            let right = self.parse_additive()?;
            left = binary(BinaryOp::Concat, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::Percent) => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => {
                self.pos += 1;
                return self.parse_unary();
            }
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Arrow) | Some(Token::NullsafeArrow) => {
                    self.pos += 1;
                    let name = self.parse_member_name()?;
                    expr = Expr::Property {
                        target: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_ternary()?;
                    self.expect(Token::RBracket, "`]`")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_member_name(&mut self) -> EvalResult<SmolStr> {
        let name = match self.peek() {
            Some(Token::Ident(name)) => SmolStr::from(*name),
            _ => return Err(self.error("expected a property name")),
        };
        self.pos += 1;
        if self.peek() == Some(&Token::LParen) {
            return Err(self.error(format!("method calls are not supported (`{}()`)", name)));
        }
        Ok(name)
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        let start = self.pos;
        let Some(token) = self.advance() else {
            return Err(self.unexpected());
        };

        match token {
            Token::Variable("this")
                if matches!(self.peek(), Some(Token::Arrow) | Some(Token::NullsafeArrow)) =>
            {
                self.pos += 1;
                Ok(Expr::Variable(self.parse_member_name()?))
            }
            Token::Variable(name) => Ok(Expr::Variable(SmolStr::from(name))),
            Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::String(s) => Ok(Expr::Literal(Value::String(s))),
            Token::LParen => {
                let inner = self.parse_ternary()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => self.parse_array(),
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let args = self.parse_arguments()?;
                Ok(Expr::Call {
                    function: SmolStr::from(name.to_ascii_lowercase()),
                    args,
                })
            }
            Token::Ident(name) => match name.to_ascii_lowercase().as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => {
                    self.pos = start;
                    Err(self.error(format!("undefined constant `{}`", name)))
                }
            },
            _ => {
                self.pos = start;
                Err(self.unexpected())
            }
        }
    }

    /// Parse call arguments after the opening parenthesis.
    fn parse_arguments(&mut self) -> EvalResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_ternary()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma, "`,` or `)`")?;
        }
    }

    /// Parse an array literal after the opening bracket.
    fn parse_array(&mut self) -> EvalResult<Expr> {
        let mut items = Vec::new();
        loop {
            if self.eat(&Token::RBracket) {
                return Ok(Expr::Array(items));
            }
            let first = self.parse_ternary()?;
            let item = if self.eat(&Token::FatArrow) {
                ArrayItem {
                    key: Some(first),
                    value: self.parse_ternary()?,
                }
            } else {
                ArrayItem {
                    key: None,
                    value: first,
                }
            };
            items.push(item);
            if !self.eat(&Token::Comma) {
                self.expect(Token::RBracket, "`,` or `]`")?;
                return Ok(Expr::Array(items));
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Expr {
        Expr::Variable(SmolStr::from(name))
    }

    #[test]
    fn test_this_property_reads_variable() {
        assert_eq!(parse_expression("$this->foo").unwrap(), var("foo"));
        assert_eq!(
            parse_expression("$this->item->show").unwrap(),
            Expr::Property {
                target: Box::new(var("item")),
                name: "show".into(),
            }
        );
    }

    #[test]
    fn test_coalesce_binds_looser_than_property() {
        assert_eq!(
            parse_expression("$item->show ?? null").unwrap(),
            binary(
                BinaryOp::Coalesce,
                Expr::Property {
                    target: Box::new(var("item")),
                    name: "show".into(),
                },
                Expr::Literal(Value::Null),
            )
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_expression("$a || $b && !$c").unwrap(),
            binary(
                BinaryOp::Or,
                var("a"),
                binary(
                    BinaryOp::And,
                    var("b"),
                    Expr::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(var("c")),
                    },
                ),
            )
        );
        assert_eq!(
            parse_expression("'n: ' . 1 + 2").unwrap(),
            binary(
                BinaryOp::Concat,
                Expr::Literal(Value::from("n: ")),
                binary(BinaryOp::Add, Expr::Literal(Value::Int(1)), Expr::Literal(Value::Int(2))),
            )
        );
    }

    #[test]
    fn test_calls_and_arrays() {
        assert_eq!(
            parse_expression("STRTOUPPER($name)").unwrap(),
            Expr::Call {
                function: "strtoupper".into(),
                args: vec![var("name")],
            }
        );
        assert_eq!(
            parse_expression("['a' => 1, 2,]").unwrap(),
            Expr::Array(vec![
                ArrayItem {
                    key: Some(Expr::Literal(Value::from("a"))),
                    value: Expr::Literal(Value::Int(1)),
                },
                ArrayItem {
                    key: None,
                    value: Expr::Literal(Value::Int(2)),
                },
            ])
        );
    }

    #[test]
    fn test_elvis() {
        assert_eq!(
            parse_expression("$title ?: 'Home'").unwrap(),
            Expr::Ternary {
                condition: Box::new(var("title")),
                then: None,
                otherwise: Box::new(Expr::Literal(Value::from("Home"))),
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["", "$a +", "($a", "$a $b", "foo", "$a->b()", "[1 2]", "$a ? 1"] {
            match parse_expression(source) {
                Err(EvalError::Syntax { .. }) => {}
                other => panic!("Expected syntax error for {:?}, got {:?}", source, other),
            }
        }
    }
}
