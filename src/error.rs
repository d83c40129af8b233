use crate::object::Object;
use crate::token::{Location, Token, Type};

static mut HAD_ERROR: bool = false;
static mut HAD_RUNTIME_ERROR: bool = false;

/// Checks if an error occurred during scanning, parsing, resolving or interpreting.
pub fn did_error() -> bool {
    unsafe { HAD_ERROR || HAD_RUNTIME_ERROR }
}

/// Checks if an error occurred during runtime.
pub fn did_runtime_error() -> bool {
    unsafe { HAD_RUNTIME_ERROR }
}

/// Resets the error flags.
/// This is used to recover the interpreter between prompt lines.
pub fn reset_error() {
    unsafe {
        HAD_ERROR = false;
        HAD_RUNTIME_ERROR = false;
    }
}

/// Every error type must implement this trait.
pub trait Error {
    /// Prints the error message and sets the error flag.
    fn throw(&self);
}

/// Represents an error that occurs during scanning.
#[derive(Debug)]
pub struct ScanError {
    pub location: Location,
    pub message: String,
}

impl Error for ScanError {
    fn throw(&self) {
        eprintln!(
            "[line {location}] Error: {message}",
            location = self.location,
            message = self.message
        );

        unsafe {
            HAD_ERROR = true;
        }
    }
}

/// Represents an error that occurs during parsing.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Error for ParseError {
    fn throw(&self) {
        if self.token.r#type == Type::EOF {
            eprintln!(
                "[line {location}] Error at end: {message}",
                location = self.token.location,
                message = self.message
            );
        } else {
            eprintln!(
                "[line {location}] Error at '{lexeme}': {message}",
                location = self.token.location,
                lexeme = self.token.lexeme,
                message = self.message
            );
        }

        unsafe {
            HAD_ERROR = true;
        }
    }
}

/// Represents an error that occurs during resolution.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Error for ResolveError {
    fn throw(&self) {
        eprintln!(
            "[line {location}] Error at '{lexeme}': {message}",
            location = self.token.location,
            lexeme = self.token.lexeme,
            message = self.message
        );

        unsafe {
            HAD_ERROR = true;
        }
    }
}

/// Represents an error that occurs during runtime.
#[derive(Debug)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Error for RuntimeError {
    fn throw(&self) {
        eprintln!(
            "[line {location}] Error at '{lexeme}': {message}",
            location = self.token.location,
            lexeme = self.token.lexeme,
            message = self.message
        );

        unsafe {
            HAD_RUNTIME_ERROR = true;
        }
    }
}

/// The unwinding carrier of the evaluator. A runtime error propagates to the
/// top level; a return value propagates until the enclosing function call
/// catches it. The return variant is control flow, not a failure.
#[derive(Debug)]
pub enum Exception {
    Runtime(RuntimeError),
    Return(Object),
}

impl From<RuntimeError> for Exception {
    fn from(error: RuntimeError) -> Self {
        Exception::Runtime(error)
    }
}
