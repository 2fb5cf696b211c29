//! Recursive-descent parser for the expression language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expression     := IDENT "=>" expression | comparison
//! comparison     := additive (cmp_op comparison)?          right-associative
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/" | "%") unary)*
//! unary          := "-" unary | power
//! power          := postfix (("^" | "**") unary)?           right-associative
//! postfix        := chainable ("." IDENT | "[" expression "]")*
//!                 | literal
//! chainable      := IDENT "(" args? ")" | IDENT | "[" args? "]" | "(" expression ")"
//! literal        := NUMBER | STRING | null | true | false aliases
//! ```
//!
//! Property and index chains may only follow variables, calls, list literals
//! and parenthesized expressions. A `.` must touch both of its neighbours.

use std::rc::Rc;

use super::ast::{BinaryOperator, Expr};
use super::lexer::{tokenize, SpannedToken, Token};
use crate::core::Variable;
use crate::error::ParseError;

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a formula (without the leading `=`).
pub fn parse(source: &str) -> ParseResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected `{}`", token.describe()))),
    }
}

/// Literal aliases, matched case-insensitively.
fn keyword_literal(ident: &str) -> Option<Variable> {
    match ident.to_ascii_lowercase().as_str() {
        "null" | "none" | "nan" | "na" => Some(Variable::Null),
        "true" | "yes" => Some(Variable::Bool(true)),
        "false" | "no" => Some(Variable::Bool(false)),
        _ => None,
    }
}

fn comparison_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Eq | Token::EqEq => Some(BinaryOperator::Eq),
        Token::NotEq | Token::LtGt => Some(BinaryOperator::NotEq),
        Token::Lt => Some(BinaryOperator::Lt),
        Token::Le => Some(BinaryOperator::Le),
        Token::Gt => Some(BinaryOperator::Gt),
        Token::Ge => Some(BinaryOperator::Ge),
        _ => None,
    }
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::invalid(self.source, reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<SpannedToken> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(spanned),
            Some(spanned) => Err(self.error(format!(
                "expected `{}` but found `{}`",
                expected.describe(),
                spanned.token.describe()
            ))),
            None => Err(self.error(format!("expected `{}` but reached the end", expected.describe()))),
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        if let (Some(Token::Ident(param)), Some(Token::Arrow)) = (self.peek(), self.peek_at(1)) {
            let param = param.to_lowercase();
            self.pos += 2;
            let body = self.parse_expression()?;
            return Ok(Expr::Lambda {
                param,
                body: Rc::new(body),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_additive()?;
        match self.peek().and_then(comparison_operator) {
            Some(op) => {
                self.pos += 1;
                let right = self.parse_comparison()?;
                Ok(Expr::binary(op, left, right))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOperator::Mul,
                Some(Token::Slash) => BinaryOperator::Div,
                Some(Token::Percent) => BinaryOperator::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if let Some(Token::Caret | Token::StarStar) = self.peek() {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(BinaryOperator::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let (mut expr, chainable) = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    if !chainable {
                        return Err(self.error("properties can only be read from variables, calls, lists or parentheses"));
                    }
                    let property = self.parse_property()?;
                    expr = Expr::Property {
                        object: Box::new(expr),
                        property,
                    };
                }
                Some(Token::LBracket) => {
                    if !chainable {
                        return Err(self.error("only variables, calls, lists or parentheses can be indexed"));
                    }
                    self.pos += 1;
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Index {
                        list: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `.IDENT` with no whitespace on either side of the dot.
    fn parse_property(&mut self) -> ParseResult<String> {
        let previous_end = self.tokens[self.pos - 1].span.end;
        let dot = self.expect(&Token::Dot)?;
        let next = self.advance().ok_or_else(|| self.error("expected a property name after `.`"))?;
        match next.token {
            Token::Ident(name) if dot.span.start == previous_end && next.span.start == dot.span.end => {
                Ok(name)
            }
            Token::Ident(_) => Err(self.error("`.` must not be surrounded by spaces")),
            other => Err(self.error(format!("expected a property name but found `{}`", other.describe()))),
        }
    }

    /// Returns the primary and whether a postfix chain may follow it.
    fn parse_primary(&mut self) -> ParseResult<(Expr, bool)> {
        let Some(spanned) = self.advance() else {
            return Err(self.error("unexpected end of expression"));
        };
        match spanned.token {
            Token::Number(n) => Ok((Expr::Literal(Variable::Number(n)), false)),
            Token::Str(s) => Ok((Expr::Literal(Variable::String(s)), false)),
            Token::Ident(name) => {
                if let Some(literal) = keyword_literal(&name) {
                    return Ok((Expr::Literal(literal), false));
                }
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let arguments = self.parse_arguments(&Token::RParen)?;
                    return Ok((
                        Expr::Call {
                            name: name.to_lowercase(),
                            display_name: name,
                            arguments,
                        },
                        true,
                    ));
                }
                Ok((Expr::Variable(name), true))
            }
            Token::LBracket => {
                let items = self.parse_arguments(&Token::RBracket)?;
                Ok((Expr::List(items), true))
            }
            Token::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok((inner, true))
            }
            other => Err(self.error(format!("unexpected `{}`", other.describe()))),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_arguments(&mut self, close: &Token) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                _ => {
                    self.expect(close)?;
                    return Ok(items);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Literal(Variable::Number(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::binary(BinaryOperator::Add, num(1.0), Expr::binary(BinaryOperator::Mul, num(2.0), num(3.0)))
        );
    }

    #[test]
    fn test_comparisons_are_right_associative() {
        assert_eq!(
            parse("a == b != c").unwrap(),
            Expr::binary(
                BinaryOperator::Eq,
                Expr::Variable("a".into()),
                Expr::binary(BinaryOperator::NotEq, Expr::Variable("b".into()), Expr::Variable("c".into()))
            )
        );
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        assert_eq!(
            parse("-2 ^ 2").unwrap(),
            Expr::Negate(Box::new(Expr::binary(BinaryOperator::Pow, num(2.0), num(2.0))))
        );
        assert_eq!(
            parse("2 ** 3 ^ 2").unwrap(),
            Expr::binary(BinaryOperator::Pow, num(2.0), Expr::binary(BinaryOperator::Pow, num(3.0), num(2.0)))
        );
    }

    #[test]
    fn test_keyword_literals_are_case_insensitive() {
        assert_eq!(parse("NULL").unwrap(), Expr::Literal(Variable::Null));
        assert_eq!(parse("None").unwrap(), Expr::Literal(Variable::Null));
        assert_eq!(parse("Yes").unwrap(), Expr::Literal(Variable::Bool(true)));
        assert_eq!(parse("no").unwrap(), Expr::Literal(Variable::Bool(false)));
    }

    #[test]
    fn test_member_chain() {
        assert_eq!(
            parse("Players[1].Hand").unwrap(),
            Expr::Property {
                object: Box::new(Expr::Index {
                    list: Box::new(Expr::Variable("Players".into())),
                    index: Box::new(num(1.0)),
                }),
                property: "Hand".into(),
            }
        );
    }

    #[test]
    fn test_lambda() {
        let Expr::Lambda { param, body } = parse("X => x.value * 2").unwrap() else {
            panic!("expected lambda");
        };
        assert_eq!(param, "x");
        assert!(matches!(body.as_ref(), Expr::Binary { op: BinaryOperator::Mul, .. }));
    }

    #[test]
    fn test_call_keeps_display_name() {
        let Expr::Call { name, display_name, arguments } = parse("SUM([1, 2])").unwrap() else {
            panic!("expected call");
        };
        assert_eq!(name, "sum");
        assert_eq!(display_name, "SUM");
        assert_eq!(arguments.len(), 1);
    }

    #[test]
    fn test_rejected_inputs() {
        for source in ["null[3]", "false[3]", "3[3]", ".", "card . suit", "card. suit", "card .suit", "", "1 +", "(1", "[1, 2", "f(1,)", "1 2"] {
            let err = parse(source).unwrap_err();
            assert!(err.to_string().starts_with("Invalid expression."), "{source}: {err}");
        }
    }

    #[test]
    fn test_empty_list_and_call() {
        assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
        assert!(matches!(parse("or()").unwrap(), Expr::Call { arguments, .. } if arguments.is_empty()));
    }
}
