//! Recursive-descent parser from tokens to [`AstNode`].
//! Purely syntactic: referenced fields are not checked here, that is the
//! dependency resolver's job.
use crate::ast::AstNode;
use crate::error::{Arity, FormulaError, ParseError};
use crate::lexer::{self, Token, TokenKind};

mod expressions;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> &TokenKind {
        self.cur().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn peek_next(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn cur_position(&self) -> usize {
        match self.cur() {
            Some(t) => t.position,
            None => self.tokens.last().map(|t| t.position).unwrap_or(0),
        }
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn err(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.peek().describe(),
            position: self.cur_position(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if *self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.err(expected))
        }
    }

    /// Parse `( arg, arg, ... )` -- the opening paren is the current token.
    fn parse_args(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if *self.peek() == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.err("',' or ')'")),
            }
        }
    }

    fn parse_all(&mut self) -> Result<AstNode, ParseError> {
        let node = self.parse_expr()?;
        if *self.peek() != TokenKind::Eof {
            return Err(self.err("end of input"));
        }
        Ok(node)
    }
}

/// Arity of the keyword functions. Other function names accept any number
/// of arguments at parse time.
pub fn keyword_arity(name: &str) -> Option<Arity> {
    match name {
        "IF" => Some(Arity::Exactly(3)),
        "NOT" => Some(Arity::Exactly(1)),
        "TRUE" | "FALSE" => Some(Arity::Exactly(0)),
        "AND" | "OR" => Some(Arity::AtLeast(1)),
        _ => None,
    }
}

pub(crate) fn check_arity(name: &str, got: usize) -> Result<(), ParseError> {
    match keyword_arity(name) {
        Some(expected) if !expected.accepts(got) => Err(ParseError::ArityMismatch {
            function: name.to_owned(),
            expected,
            got,
        }),
        _ => Ok(()),
    }
}

/// Parse a token stream (as produced by [`lexer::tokenize`]) into an AST.
pub fn parse(tokens: &[Token]) -> Result<AstNode, ParseError> {
    Parser::new(tokens).parse_all()
}

/// Tokenize and parse formula text.
pub fn parse_formula(src: &str) -> Result<AstNode, FormulaError> {
    let tokens = lexer::tokenize(src)?;
    Ok(parse(&tokens)?)
}
