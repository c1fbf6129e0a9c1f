//! Recursive-descent parser producing the script AST.

use std::sync::Arc;

use super::lexer::{Spanned, Token};
use crate::error::ScriptError;

/// Depth limit for the expression tree. Operator and postfix chains count
/// one level per link, since evaluating and dropping the tree recurses the
/// same way.
const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    fn from_token(token: &Token) -> Option<(Self, u8)> {
        Some(match token {
            Token::Coalesce => (BinaryOp::Coalesce, 1),
            Token::OrOr => (BinaryOp::Or, 2),
            Token::AndAnd => (BinaryOp::And, 3),
            Token::EqEq => (BinaryOp::Eq, 4),
            Token::NotEq => (BinaryOp::NotEq, 4),
            Token::Lt => (BinaryOp::Lt, 5),
            Token::LtEq => (BinaryOp::LtEq, 5),
            Token::Gt => (BinaryOp::Gt, 5),
            Token::GtEq => (BinaryOp::GtEq, 5),
            Token::Plus => (BinaryOp::Add, 6),
            Token::Minus => (BinaryOp::Sub, 6),
            Token::Star => (BinaryOp::Mul, 7),
            Token::Slash => (BinaryOp::Div, 7),
            Token::Percent => (BinaryOp::Rem, 7),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    List(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Closure {
        params: Vec<String>,
        body: Arc<Expr>,
    },
    Block {
        bindings: Vec<(String, Expr)>,
        result: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

/// A parsed script: top-level bindings followed by the exported value.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub bindings: Vec<(String, Expr)>,
    pub export: Expr,
}

pub fn parse(tokens: Vec<Spanned>) -> Result<Program, ScriptError> {
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ScriptError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn error(&self, message: String) -> ScriptError {
        ScriptError::Parse {
            line: self.line(),
            message,
        }
    }

    fn ident(&mut self) -> Result<String, ScriptError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(self.error(format!("expected identifier, found {other:?}"))),
        }
    }

    fn program(mut self) -> Result<Program, ScriptError> {
        let mut bindings = Vec::new();
        let mut export = None;

        while *self.peek() != Token::Eof {
            match self.peek() {
                Token::Let => {
                    self.advance();
                    let name = self.ident()?;
                    self.expect(&Token::Assign, "'='")?;
                    let value = self.expr()?;
                    bindings.push((name, value));
                }
                Token::Export => {
                    self.advance();
                    self.expect(&Token::Default, "'default' after 'export'")?;
                    if export.is_some() {
                        return Err(self.error("duplicate 'export default'".to_string()));
                    }
                    export = Some(self.expr()?);
                }
                other => {
                    return Err(self.error(format!(
                        "expected 'let' or 'export default', found {other:?}"
                    )));
                }
            }
            self.eat(&Token::Semicolon);
        }

        let export = export.ok_or_else(|| self.error("missing 'export default'".to_string()))?;
        Ok(Program { bindings, export })
    }

    /// Enters one more level of the expression tree.
    fn nest(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        let depth = self.depth;
        self.nest()?;
        let result = self.binary(0);
        self.depth = depth;
        result
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, ScriptError> {
        let depth = self.depth;
        let mut left = self.unary()?;
        while let Some((op, prec)) = BinaryOp::from_token(self.peek()) {
            if prec <= min_prec {
                break;
            }
            self.advance();
            self.nest()?;
            let right = self.binary(prec)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.advance();
        let depth = self.depth;
        self.nest()?;
        let operand = self.unary();
        self.depth = depth;
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Token::Dot | Token::LBracket | Token::LParen) {
                self.nest()?;
            }
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = match self.advance() {
                        Token::Ident(name) => name,
                        other => match other.keyword_text() {
                            Some(text) => text.to_string(),
                            None => {
                                return Err(
                                    self.error(format!("expected property name, found {other:?}"))
                                );
                            }
                        },
                    };
                    expr = Expr::Member(Box::new(expr), name);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.expr()?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Token::LParen => {
                    self.advance();
                    let args = self.comma_list(&Token::RParen)?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                _ => {
                    self.depth = depth;
                    return Ok(expr);
                }
            }
        }
    }

    fn comma_list(&mut self, close: &Token) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, "',' or closing delimiter")?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.advance() {
            Token::Null => Ok(Expr::Null),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.comma_list(&Token::RBracket)?)),
            Token::LBrace => self.object(),
            Token::Pipe => {
                let mut params = Vec::new();
                while !self.eat(&Token::Pipe) {
                    params.push(self.ident()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::Pipe, "'|' after closure parameters")?;
                        break;
                    }
                }
                let body = self.expr()?;
                Ok(Expr::Closure {
                    params,
                    body: Arc::new(body),
                })
            }
            Token::OrOr => {
                let body = self.expr()?;
                Ok(Expr::Closure {
                    params: Vec::new(),
                    body: Arc::new(body),
                })
            }
            Token::Fn => {
                self.expect(&Token::LParen, "'(' after 'fn'")?;
                let mut params = Vec::new();
                while !self.eat(&Token::RParen) {
                    params.push(self.ident()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RParen, "')' after parameters")?;
                        break;
                    }
                }
                self.expect(&Token::LBrace, "'{' to open function body")?;
                let body = self.block()?;
                Ok(Expr::Closure {
                    params,
                    body: Arc::new(body),
                })
            }
            Token::If => self.if_expr(),
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    fn object(&mut self) -> Result<Expr, ScriptError> {
        let mut entries = Vec::new();
        while !self.eat(&Token::RBrace) {
            let key = match self.advance() {
                Token::Ident(name) => name,
                Token::Str(s) => s,
                other => match other.keyword_text() {
                    Some(text) => text.to_string(),
                    None => return Err(self.error(format!("expected object key, found {other:?}"))),
                },
            };
            let value = if self.eat(&Token::Colon) {
                self.expr()?
            } else {
                Expr::Ident(key.clone())
            };
            entries.push((key, value));
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace, "',' or '}'")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }

    /// Parses the remainder of a `{ ... }` block after its opening brace.
    fn block(&mut self) -> Result<Expr, ScriptError> {
        let mut bindings = Vec::new();
        loop {
            if self.eat(&Token::Let) {
                let name = self.ident()?;
                self.expect(&Token::Assign, "'='")?;
                let value = self.expr()?;
                self.eat(&Token::Semicolon);
                bindings.push((name, value));
                continue;
            }
            if self.eat(&Token::RBrace) {
                return Ok(Expr::Block {
                    bindings,
                    result: Box::new(Expr::Null),
                });
            }
            let result = self.expr()?;
            self.eat(&Token::Semicolon);
            self.expect(&Token::RBrace, "'}' to close block")?;
            return Ok(Expr::Block {
                bindings,
                result: Box::new(result),
            });
        }
    }

    fn if_expr(&mut self) -> Result<Expr, ScriptError> {
        let cond = self.expr()?;
        self.expect(&Token::LBrace, "'{' after if condition")?;
        let then = self.block()?;
        let otherwise = if self.eat(&Token::Else) {
            if self.eat(&Token::If) {
                Some(Box::new(self.if_expr()?))
            } else {
                self.expect(&Token::LBrace, "'{' after else")?;
                Some(Box::new(self.block()?))
            }
        } else {
            None
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise,
        })
    }
}
