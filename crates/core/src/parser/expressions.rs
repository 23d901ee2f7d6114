use super::{check_arity, Parser};
use crate::ast::{AstNode, BinaryOp, UnaryOp};
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    // -- Expression parsing, lowest precedence first --------------

    pub(super) fn parse_expr(&mut self) -> Result<AstNode, ParseError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.peek() == &TokenKind::Or {
            self.advance();
            let right = self.parse_and_expr()?;
            left = AstNode::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_not_expr()?;
        while self.peek() == &TokenKind::And {
            self.advance();
            let right = self.parse_not_expr()?;
            left = AstNode::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    /// Prefix `NOT`. `NOT(` is the function form and is left to the
    /// primary parser.
    fn parse_not_expr(&mut self) -> Result<AstNode, ParseError> {
        if self.peek() == &TokenKind::Not && self.peek_next() != &TokenKind::LParen {
            self.advance();
            let operand = self.parse_not_expr()?;
            return Ok(AstNode::unary(UnaryOp::Not, operand));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Neq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Lte => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Gte => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = AstNode::binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = AstNode::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_concat()?;
            left = AstNode::binary(op, left, right);
        }
    }

    /// `a & b & c` collapses into one flat [`AstNode::Concat`].
    fn parse_concat(&mut self) -> Result<AstNode, ParseError> {
        let first = self.parse_unary()?;
        if self.peek() != &TokenKind::Amp {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.peek() == &TokenKind::Amp {
            self.advance();
            parts.push(self.parse_unary()?);
        }
        Ok(AstNode::Concat { parts })
    }

    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        if self.peek() == &TokenKind::Minus {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(AstNode::unary(UnaryOp::Neg, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(AstNode::int(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(AstNode::string(s))
            }
            TokenKind::FieldRef(name) => {
                self.advance();
                Ok(AstNode::field(name))
            }
            TokenKind::Bool(b) => {
                self.advance();
                // TRUE and TRUE() are the same literal
                if self.peek() == &TokenKind::LParen {
                    let args = self.parse_args()?;
                    check_arity(if b { "TRUE" } else { "FALSE" }, args.len())?;
                }
                Ok(AstNode::bool(b))
            }
            TokenKind::If => self.parse_keyword_call("IF"),
            TokenKind::And => self.parse_keyword_call("AND"),
            TokenKind::Or => self.parse_keyword_call("OR"),
            TokenKind::Not => self.parse_keyword_call("NOT"),
            TokenKind::Function(name) => {
                self.advance();
                let args = self.parse_args()?;
                Ok(AstNode::call(name, args))
            }
            TokenKind::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(e)
            }
            _ => Err(self.err("expression")),
        }
    }

    fn parse_keyword_call(&mut self, name: &str) -> Result<AstNode, ParseError> {
        self.advance();
        if self.peek() != &TokenKind::LParen {
            return Err(self.err(format!("'(' after {}", name)));
        }
        let args = self.parse_args()?;
        check_arity(name, args.len())?;
        Ok(AstNode::call(name, args))
    }
}
