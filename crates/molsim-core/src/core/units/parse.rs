use super::defs::{DIMENSIONLESS, lookup};
use super::error::UnitError;
use super::unit::Unit;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Symbol(String),
    Integer(i32),
    Mul,
    Div,
    Pow,
    Minus,
    Open,
    Close,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, UnitError> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<Chars> = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Mul);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Div);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Pow);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                let value = digits.parse().map_err(|_| invalid(expression, "exponent out of range"))?;
                tokens.push(Token::Integer(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut symbol = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_alphanumeric() || **d == '_') {
                    symbol.push(d);
                    chars.next();
                }
                tokens.push(Token::Symbol(symbol));
            }
            other => {
                return Err(invalid(expression, &format!("unexpected character '{}'", other)));
            }
        }
    }
    Ok(tokens)
}

fn invalid(expression: &str, reason: &str) -> UnitError {
    UnitError::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn product(&mut self) -> Result<Unit, UnitError> {
        let mut unit = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.pos += 1;
                    unit = unit.checked_mul(&self.power()?)?;
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    unit = unit.checked_div(&self.power()?)?;
                }
                _ => return Ok(unit),
            }
        }
    }

    fn power(&mut self) -> Result<Unit, UnitError> {
        let base = self.primary()?;
        if self.peek() != Some(&Token::Pow) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.exponent()?;
        let exponent =
            i8::try_from(exponent).map_err(|_| invalid(self.expression, "exponent out of range"))?;
        base.checked_powi(exponent)
    }

    fn exponent(&mut self) -> Result<i32, UnitError> {
        match self.next() {
            Some(Token::Integer(n)) => Ok(n),
            Some(Token::Minus) => match self.next() {
                Some(Token::Integer(n)) => Ok(-n),
                _ => Err(invalid(self.expression, "expected integer after '-'")),
            },
            Some(Token::Open) => {
                let value = self.exponent()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(invalid(self.expression, "unbalanced parentheses in exponent")),
                }
            }
            _ => Err(invalid(self.expression, "expected integer exponent")),
        }
    }

    fn primary(&mut self) -> Result<Unit, UnitError> {
        match self.next() {
            Some(Token::Symbol(symbol)) => lookup(&symbol)
                .cloned()
                .ok_or(UnitError::UnknownUnit(symbol)),
            Some(Token::Integer(1)) => Ok(DIMENSIONLESS),
            Some(Token::Open) => {
                let inner = self.product()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(invalid(self.expression, "unbalanced parentheses")),
                }
            }
            Some(token) => Err(invalid(
                self.expression,
                &format!("unexpected token {:?}", token),
            )),
            None => Err(invalid(self.expression, "unexpected end of expression")),
        }
    }
}

/// Parses a unit expression such as `kcal/mol/angstrom^2` or `kg*m**2/s^2`.
///
/// Operators associate left to right; `^` and `**` take an integer exponent. An empty
/// expression denotes the dimensionless unit.
pub fn parse_unit_expression(expression: &str) -> Result<Unit, UnitError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Ok(DIMENSIONLESS);
    }
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
    };
    let unit = parser.product()?;
    if parser.pos != parser.tokens.len() {
        return Err(invalid(expression, "trailing tokens"));
    }
    Ok(unit)
}
