//! Arithmetic expression evaluation for the calculator tool.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := '-' unary | '+' unary | power
//! power  := atom ('^' unary)?
//! atom   := number | constant | function '(' expr ')' | '(' expr ')'
//! ```
//!
//! `**` is accepted as an alias for `^`. Exponentiation is right associative.

use crate::error::{AgentHostError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn err(msg: impl Into<String>) -> AgentHostError {
    AgentHostError::Tool(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| err(format!("Invalid number: {}", literal)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' | '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => return Err(err(format!("Unexpected character '{}'", other))),
                };
                tokens.push(token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(err(format!("Expected {:?}, found {:?}", expected, t))),
            None => Err(err(format!("Expected {:?}, found end of input", expected))),
        }
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(err("Division by zero"));
                    }
                    value /= rhs;
                }
                Token::Percent => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(err("Modulo by zero"));
                    }
                    value %= rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if let Some(Token::Caret) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if let Some(value) = constant(&name) {
                    return Ok(value);
                }
                self.expect(Token::LParen)?;
                let arg = self.expr()?;
                self.expect(Token::RParen)?;
                apply_function(&name, arg)
            }
            Some(t) => Err(err(format!("Unexpected token {:?}", t))),
            None => Err(err("Unexpected end of expression")),
        }
    }
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        _ => None,
    }
}

fn apply_function(name: &str, arg: f64) -> Result<f64> {
    let value = match name {
        "sqrt" => {
            if arg < 0.0 {
                return Err(err("Square root of a negative number"));
            }
            arg.sqrt()
        }
        "abs" => arg.abs(),
        "ln" => arg.ln(),
        "log" | "log10" => arg.log10(),
        "log2" => arg.log2(),
        "exp" => arg.exp(),
        "sin" => arg.sin(),
        "cos" => arg.cos(),
        "tan" => arg.tan(),
        "floor" => arg.floor(),
        "ceil" => arg.ceil(),
        "round" => arg.round(),
        other => return Err(err(format!("Unknown function or constant '{}'", other))),
    };
    Ok(value)
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(err("Empty expression"));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(err(format!("Unexpected trailing token {:?}", extra)));
    }
    if !value.is_finite() {
        return Err(err("Result is not a finite number"));
    }
    Ok(value)
}

/// Format a result, dropping the fractional part of integral values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.10}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Evaluate an expression and render the result for the model.
pub fn calculate(expression: &str) -> Result<String> {
    evaluate(expression).map(format_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(calculate("2 + 3 * 4").unwrap(), "14");
        assert_eq!(calculate("(2 + 3) * 4").unwrap(), "20");
        assert_eq!(calculate("10 - 4 - 3").unwrap(), "3");
        assert_eq!(calculate("7 % 4").unwrap(), "3");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(calculate("2 ^ 3 ^ 2").unwrap(), "512");
        assert_eq!(calculate("2 ** 10").unwrap(), "1024");
        assert_eq!(calculate("-2 ^ 2").unwrap(), "-4");
        assert_eq!(calculate("2 ^ -1").unwrap(), "0.5");
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(calculate("sqrt(16)").unwrap(), "4");
        assert_eq!(calculate("abs(-3.5)").unwrap(), "3.5");
        assert_eq!(calculate("round(pi * 100)").unwrap(), "314");
        assert_eq!(calculate("ln(e)").unwrap(), "1");
        assert_eq!(calculate("1.5e3 / 3").unwrap(), "500");
    }

    #[test]
    fn test_fractional_formatting() {
        assert_eq!(calculate("1 / 3").unwrap(), "0.3333333333");
        assert_eq!(calculate("0.1 + 0.2").unwrap(), "0.3");
    }

    #[test]
    fn test_errors() {
        assert!(calculate("1 / 0").is_err());
        assert!(calculate("").is_err());
        assert!(calculate("2 +").is_err());
        assert!(calculate("(1 + 2").is_err());
        assert!(calculate("1 2").is_err());
        assert!(calculate("foo(2)").is_err());
        assert!(calculate("sqrt(-1)").is_err());
        assert!(calculate("2 $ 3").is_err());
        assert!(calculate("10 ^ 400").is_err());
    }
}
