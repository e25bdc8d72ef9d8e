//! The interpreter seam.
//!
//! The session engine never evaluates code itself. Replays and the shell submit
//! code strings through [`Interpreter`] and only look at the returned [`Value`].

use std::fmt;
use std::io::{self, Write};

use thiserror::Error;

/// A value produced by an interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// An opaque object, described by its class name and a display form.
    Object { class: String, display: String },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object { .. } => "object",
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Value::Object { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object { class, display } => write!(f, "{class} {{ {display} }}"),
        }
    }
}

/// Raised by an interpreter when evaluating a piece of code fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InterpreterError {
    pub message: String,
}

impl InterpreterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<InterpreterError> for crate::TailorError {
    fn from(err: InterpreterError) -> Self {
        crate::TailorError::Interpreter(err.message)
    }
}

/// A live interpreter the shell and the session runner submit code to.
pub trait Interpreter {
    /// Evaluates one command. An `Err` means the command raised.
    fn execute(&mut self, code: &str) -> Result<Value, InterpreterError>;

    /// Renders a return value for the user.
    fn write_return_value(&self, value: &Value, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=> {value}")
    }

    /// Current variable bindings, for snapshots.
    fn variables(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Name and version of the interpreter, stored with saved sessions.
    fn version(&self) -> Option<String> {
        None
    }
}
