//! Recursive descent parser producing [`Expr`] trees.

use super::lexer::{Spanned, Token};
use super::{BinaryOp, CompareOp, Expr, LogicOp, UnaryOp, Value};
use crate::errors::ExprError;

/// Cursor over a token stream.
pub(crate) struct Parser {
    /// Tokens of the whole expression.
    tokens: Vec<Spanned>,
    /// Index of the next unread token.
    position: usize,
}

impl Parser {
    /// Start at the first token.
    pub(crate) fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub(crate) fn parse(mut self) -> Result<Expr, ExprError> {
        let expr = self.expression()?;
        match self.tokens.get(self.position) {
            None => Ok(expr),
            Some(extra) => Err(unexpected(extra)),
        }
    }

    /// Next token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|spanned| &spanned.token)
    }

    /// Token after the next one, for two-token operators.
    fn peek_second(&self) -> Option<&Token> {
        self.tokens
            .get(self.position + 1)
            .map(|spanned| &spanned.token)
    }

    /// Consume and return the next token.
    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.position).cloned();
        if spanned.is_some() {
            self.position += 1;
        }
        spanned
    }

    /// Consume the next token when it equals `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume `expected` or fail with the token found instead.
    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(()),
            Some(spanned) => Err(unexpected(&spanned)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    /// `a if cond else b`, the lowest precedence level.
    fn expression(&mut self) -> Result<Expr, ExprError> {
        let value = self.or_test()?;
        if !self.eat(&Token::If) {
            return Ok(value);
        }
        let condition = self.or_test()?;
        self.expect(&Token::Else)?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(value),
            otherwise: Box::new(otherwise),
        })
    }

    /// `or`, left associative.
    fn or_test(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and_test()?;
        while self.eat(&Token::Or) {
            let right = self.and_test()?;
            left = Expr::Logic {
                op: LogicOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `and`, left associative.
    fn and_test(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.not_test()?;
        while self.eat(&Token::And) {
            let right = self.not_test()?;
            left = Expr::Logic {
                op: LogicOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Prefix `not`.
    fn not_test(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    /// A chain such as `a < b <= c`.
    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    /// Consume a comparison operator, including the two-token `not in`.
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            Token::Less => CompareOp::Lt,
            Token::LessEqual => CompareOp::Le,
            Token::Greater => CompareOp::Gt,
            Token::GreaterEqual => CompareOp::Ge,
            Token::EqualEqual => CompareOp::Eq,
            Token::NotEqual => CompareOp::Ne,
            Token::In => CompareOp::In,
            Token::Not if self.peek_second() == Some(&Token::In) => {
                self.position += 2;
                return Some(CompareOp::NotIn);
            }
            _ => return None,
        };
        self.position += 1;
        Some(op)
    }

    /// `+` and `-`, left associative.
    fn arith(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.position += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    /// `*`, `/`, `//` and `%`, left associative.
    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.position += 1;
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    /// Prefix `-` and `+`.
    fn factor(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.position += 1;
        let operand = self.factor()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` binds tighter than unary minus on its left and is right associative.
    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.atom()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.factor()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    /// Literal, name, call or parenthesised expression or tuple.
    fn atom(&mut self) -> Result<Expr, ExprError> {
        let spanned = self.advance().ok_or(ExprError::UnexpectedEnd)?;
        match spanned.token {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Name(name) => {
                if self.eat(&Token::LeftParen) {
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        function: name,
                        args,
                    })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LeftParen => self.parenthesized(),
            _ => Err(unexpected(&spanned)),
        }
    }

    /// Arguments after an opening parenthesis, up to and including `)`.
    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RightParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma)?;
            if self.eat(&Token::RightParen) {
                return Ok(args);
            }
        }
    }

    /// A grouping `(a)` or a tuple `()`, `(a,)`, `(a, b)`.
    fn parenthesized(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::RightParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.expression()?;
        if self.eat(&Token::RightParen) {
            return Ok(first);
        }
        self.expect(&Token::Comma)?;
        let mut items = vec![first];
        while !self.eat(&Token::RightParen) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RightParen)?;
                break;
            }
        }
        Ok(Expr::Tuple(items))
    }
}

/// Boxed binary node.
fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Error for a token that does not fit the grammar.
fn unexpected(spanned: &Spanned) -> ExprError {
    ExprError::UnexpectedToken {
        found: spanned.token.to_string(),
        offset: spanned.offset,
    }
}
