//! A tiny expression language so the shell has something to evaluate.
//!
//! Statements are `$name = expr` or a bare `expr`. Values are the core
//! [`Value`]s; a failing statement leaves the bindings untouched.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Local;
use tailor_core::interpreter::{Interpreter, InterpreterError, Value};

type EvalResult = Result<Value, InterpreterError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Var(String),
    Ident(String),
    Op(&'static str),
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(code: &str) -> Result<Vec<Token>, InterpreterError> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let is_float = chars.get(i) == Some(&'.')
                && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit());
            if is_float {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let token = if is_float {
                text.parse().map(Token::Float).ok()
            } else {
                text.parse().map(Token::Int).ok()
            };
            tokens.push(
                token.ok_or_else(|| InterpreterError::new(format!("Invalid number '{text}'")))?,
            );
        } else if c == '"' || c == '\'' {
            let (text, end) = read_string(&chars, i)?;
            tokens.push(Token::Str(text));
            i = end;
        } else if c == '$' || c.is_alphabetic() || c == '_' {
            let start = if c == '$' { i + 1 } else { i };
            i = start;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            if c == '$' {
                if name.is_empty() {
                    return Err(InterpreterError::new("Expected a variable name after '$'"));
                }
                tokens.push(Token::Var(name));
            } else {
                tokens.push(Token::Ident(name));
            }
        } else {
            let two = next.map(|n| format!("{c}{n}"));
            let op = match two.as_deref() {
                Some("==") => Some("=="),
                Some("!=") => Some("!="),
                Some("<=") => Some("<="),
                Some(">=") => Some(">="),
                _ => None,
            };
            if let Some(op) = op {
                tokens.push(Token::Op(op));
                i += 2;
                continue;
            }
            tokens.push(match c {
                '+' => Token::Op("+"),
                '-' => Token::Op("-"),
                '*' => Token::Op("*"),
                '/' => Token::Op("/"),
                '%' => Token::Op("%"),
                '.' => Token::Op("."),
                '<' => Token::Op("<"),
                '>' => Token::Op(">"),
                '=' => Token::Assign,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                ';' if i + 1 == chars.len() => {
                    i += 1;
                    continue;
                }
                other => {
                    return Err(InterpreterError::new(format!(
                        "Syntax error, unexpected '{other}'"
                    )))
                }
            });
            i += 1;
        }
    }
    Ok(tokens)
}

/// Reads a quoted string starting at `start`; returns the text and the index
/// after the closing quote.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), InterpreterError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((text, i + 1)),
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                text.push(match escaped {
                    'n' if quote == '"' => '\n',
                    't' if quote == '"' => '\t',
                    other => other,
                });
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(InterpreterError::new("Unterminated string literal"))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    bindings: &'a BTreeMap<String, Value>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), InterpreterError> {
        match self.next() {
            Some(token) if *token == expected => Ok(()),
            Some(token) => Err(InterpreterError::new(format!(
                "Syntax error, unexpected {token:?}"
            ))),
            None => Err(InterpreterError::new("Syntax error, unexpected end of input")),
        }
    }

    fn finish(&self) -> Result<(), InterpreterError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(InterpreterError::new(format!(
                "Syntax error, unexpected {token:?}"
            ))),
        }
    }

    fn expression(&mut self) -> EvalResult {
        let left = self.concat()?;
        match self.eat_op(&["==", "!=", "<", "<=", ">", ">="]) {
            Some(op) => {
                let right = self.concat()?;
                compare(op, &left, &right)
            }
            None => Ok(left),
        }
    }

    fn concat(&mut self) -> EvalResult {
        let mut value = self.additive()?;
        while self.eat_op(&["."]).is_some() {
            let right = self.additive()?;
            value = Value::Str(format!("{}{}", plain(&value), plain(&right)));
        }
        Ok(value)
    }

    fn additive(&mut self) -> EvalResult {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let right = self.term()?;
            value = arithmetic(op, &value, &right)?;
        }
        Ok(value)
    }

    fn term(&mut self) -> EvalResult {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let right = self.unary()?;
            value = arithmetic(op, &value, &right)?;
        }
        Ok(value)
    }

    fn unary(&mut self) -> EvalResult {
        if self.eat_op(&["-"]).is_some() {
            return match self.unary()? {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| InterpreterError::new("Integer overflow")),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(type_error("-", &other)),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> EvalResult {
        let token = self
            .next()
            .cloned()
            .ok_or_else(|| InterpreterError::new("Syntax error, unexpected end of input"))?;

        match token {
            Token::Int(i) => Ok(Value::Int(i)),
            Token::Float(x) => Ok(Value::Float(x)),
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Var(name) => self
                .bindings
                .get(&name)
                .cloned()
                .ok_or_else(|| InterpreterError::new(format!("Undefined variable ${name}"))),
            Token::LParen => {
                let value = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Token::LBracket => {
                let items = self.arguments(Token::RBracket)?;
                Ok(Value::List(items))
            }
            Token::Ident(name) => match name.to_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                _ => {
                    self.expect(Token::LParen)?;
                    let args = self.arguments(Token::RParen)?;
                    call(&name, args)
                }
            },
            other => Err(InterpreterError::new(format!(
                "Syntax error, unexpected {other:?}"
            ))),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn arguments(&mut self, close: Token) -> Result<Vec<Value>, InterpreterError> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(token) if *token == close => return Ok(items),
                Some(token) => {
                    return Err(InterpreterError::new(format!(
                        "Syntax error, unexpected {token:?}"
                    )))
                }
                None => return Err(InterpreterError::new("Syntax error, unexpected end of input")),
            }
        }
    }
}

fn type_error(op: &str, value: &Value) -> InterpreterError {
    InterpreterError::new(format!(
        "Unsupported operand type {} for '{op}'",
        value.type_name()
    ))
}

/// String form used by concatenation: strings without quotes.
fn plain(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn arithmetic(op: &str, left: &Value, right: &Value) -> EvalResult {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        if matches!(op, "/" | "%") && b == 0 {
            return Err(InterpreterError::new("Division by zero"));
        }
        let result = match op {
            "+" => a.checked_add(b),
            "-" => a.checked_sub(b),
            "*" => a.checked_mul(b),
            "%" => a.checked_rem(b),
            _ if a.checked_rem(b) == Some(0) => a.checked_div(b),
            _ => return Ok(Value::Float(a as f64 / b as f64)),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| InterpreterError::new("Integer overflow"));
    }

    let a = as_float(left).ok_or_else(|| type_error(op, left))?;
    let b = as_float(right).ok_or_else(|| type_error(op, right))?;
    match op {
        "+" => Ok(Value::Float(a + b)),
        "-" => Ok(Value::Float(a - b)),
        "*" => Ok(Value::Float(a * b)),
        "/" | "%" if b == 0.0 => Err(InterpreterError::new("Division by zero")),
        "/" => Ok(Value::Float(a / b)),
        _ => Ok(Value::Float(a % b)),
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> EvalResult {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (as_float(left), as_float(right)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    let result = match (op, ordering) {
        ("==", Some(o)) => o == Ordering::Equal,
        ("!=", Some(o)) => o != Ordering::Equal,
        ("==", None) => left == right,
        ("!=", None) => left != right,
        ("<", Some(o)) => o == Ordering::Less,
        ("<=", Some(o)) => o != Ordering::Greater,
        (">", Some(o)) => o == Ordering::Greater,
        (">=", Some(o)) => o != Ordering::Less,
        _ => {
            return Err(InterpreterError::new(format!(
                "Cannot compare {} with {}",
                left.type_name(),
                right.type_name()
            )))
        }
    };
    Ok(Value::Bool(result))
}

fn call(name: &str, args: Vec<Value>) -> EvalResult {
    let arity = |expected: usize| -> Result<(), InterpreterError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(InterpreterError::new(format!(
                "{name}() expects {expected} argument(s), {} given",
                args.len()
            )))
        }
    };

    match name {
        "len" => {
            arity(1)?;
            match &args[0] {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                other => Err(type_error("len", other)),
            }
        }
        "upper" | "lower" => {
            arity(1)?;
            match &args[0] {
                Value::Str(s) if name == "upper" => Ok(Value::Str(s.to_uppercase())),
                Value::Str(s) => Ok(Value::Str(s.to_lowercase())),
                other => Err(type_error(name, other)),
            }
        }
        "now" => {
            arity(0)?;
            Ok(Value::Object {
                class: "DateTime".to_string(),
                display: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            })
        }
        "fail" => {
            let message = args
                .first()
                .map(plain)
                .unwrap_or_else(|| "fail() called".to_string());
            Err(InterpreterError::new(message))
        }
        _ => Err(InterpreterError::new(format!(
            "Call to undefined function {name}()"
        ))),
    }
}

/// The shell's built-in interpreter.
#[derive(Debug, Default)]
pub struct ScratchInterpreter {
    bindings: BTreeMap<String, Value>,
}

impl ScratchInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn evaluate(&self, tokens: &[Token]) -> EvalResult {
        let mut parser = Parser {
            tokens,
            pos: 0,
            bindings: &self.bindings,
        };
        let value = parser.expression()?;
        parser.finish()?;
        Ok(value)
    }
}

impl Interpreter for ScratchInterpreter {
    fn execute(&mut self, code: &str) -> EvalResult {
        let tokens = tokenize(code)?;
        if tokens.is_empty() {
            return Ok(Value::Null);
        }

        if let [Token::Var(name), Token::Assign, rest @ ..] = tokens.as_slice() {
            let value = self.evaluate(rest)?;
            self.bindings.insert(name.clone(), value.clone());
            return Ok(value);
        }
        self.evaluate(&tokens)
    }

    fn variables(&self) -> Vec<(String, Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn version(&self) -> Option<String> {
        Some(format!("tailor-scratch {}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(code: &str) -> Value {
        ScratchInterpreter::new().execute(code).unwrap()
    }

    fn eval_err(code: &str) -> String {
        ScratchInterpreter::new().execute(code).unwrap_err().message
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(eval("-2 * -3"), Value::Int(6));
        assert_eq!(eval("7 % 4"), Value::Int(3));
        assert_eq!(eval("6 / 3"), Value::Int(2));
        assert_eq!(eval("7 / 2"), Value::Float(3.5));
        assert_eq!(eval("1.5 + 1"), Value::Float(2.5));
    }

    #[test]
    fn test_strings_and_builtins() {
        assert_eq!(eval("'a' . \"b\" . 1"), Value::Str("ab1".to_string()));
        assert_eq!(eval("upper('abc')"), Value::Str("ABC".to_string()));
        assert_eq!(eval("lower(\"ABC\")"), Value::Str("abc".to_string()));
        assert_eq!(eval("len('héllo')"), Value::Int(5));
        assert_eq!(eval("len([1, 2, 3])"), Value::Int(3));
        assert_eq!(eval("'it\\'s'"), Value::Str("it's".to_string()));
        assert_eq!(now_class(), "DateTime");
    }

    fn now_class() -> String {
        eval("now()").class_name().unwrap_or_default().to_string()
    }

    #[test]
    fn test_literals_and_comparisons() {
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("null"), Value::Null);
        assert_eq!(eval("[]"), Value::List(vec![]));
        assert_eq!(eval("1 < 2"), Value::Bool(true));
        assert_eq!(eval("2 >= 2.0"), Value::Bool(true));
        assert_eq!(eval("'a' == 'b'"), Value::Bool(false));
        assert_eq!(eval("null == null"), Value::Bool(true));
        assert_eq!(eval("1 + 1;"), Value::Int(2));
    }

    #[test]
    fn test_assignment_and_variables() {
        let mut interpreter = ScratchInterpreter::new();
        assert_eq!(interpreter.execute("$a = 2").unwrap(), Value::Int(2));
        assert_eq!(interpreter.execute("$b = $a * 10").unwrap(), Value::Int(20));
        assert_eq!(interpreter.execute("$a == 2").unwrap(), Value::Bool(true));

        let names: Vec<String> = interpreter.variables().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_failed_assignment_keeps_bindings() {
        let mut interpreter = ScratchInterpreter::new();
        interpreter.execute("$a = 1").unwrap();
        assert!(interpreter.execute("$a = 1 / 0").is_err());
        assert_eq!(interpreter.execute("$a").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval_err("$missing"), "Undefined variable $missing");
        assert_eq!(eval_err("1 / 0"), "Division by zero");
        assert_eq!(eval_err("fail('nope')"), "nope");
        assert_eq!(eval_err("boom()"), "Call to undefined function boom()");
        assert!(eval_err("'a' + 1").contains("Unsupported operand type string"));
        assert!(eval_err("(1 + 2").contains("unexpected end of input"));
        assert!(eval_err("'open").contains("Unterminated"));
        assert!(eval_err("1 2").contains("Syntax error"));
        assert!(eval_err("len(1, 2)").contains("expects 1 argument"));
    }

    #[test]
    fn test_version() {
        assert!(ScratchInterpreter::new()
            .version()
            .unwrap()
            .starts_with("tailor-scratch"));
    }
}
