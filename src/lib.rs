//! Flint is a tree-walk interpreter for Lox, a small dynamically typed
//! language with first-class functions, closures and single-inheritance
//! classes. The interpreter runs source text directly off the syntax tree;
//! there is no bytecode stage.
//!
//! Execution is a pipeline of four passes, each reporting problems through a
//! shared diagnostic sink:
//!
//! ## Scanning
//! The [`scanner`](scanner) turns the source text into a flat list of
//! [`tokens`](token::Token). It is a small state machine over the character
//! stream with two characters of lookahead, and it keeps scanning after an
//! error so a user sees every lexical problem at once. A token records its
//! kind, its lexeme, an optional literal payload and its line and column.
//!
//! ## Parsing
//! The [`parser`](parser) is a hand-written recursive descent parser that
//! turns the token list into statements and expressions.
//! [`Expressions`](expr::Expr) produce values; [`statements`](stmt::Stmt)
//! have effects. On a
//! syntax error the parser reports it, discards tokens until a statement
//! boundary and keeps going, so one bad statement does not hide the rest of
//! the program. Syntactic sugar is rewritten here: a `for` loop parses into
//! the equivalent block-and-while form.
//!
//! ## Resolving
//! The [`resolver`](resolver) walks the finished tree once and binds every
//! variable use to the static depth of the scope that declares it. The
//! depths drive exact lookups at runtime, which is what makes closures
//! capture the scope they were written in rather than whatever happens to be
//! live when they run. The resolver also rejects code that is syntactically
//! fine but semantically wrong, like `return` at the top level, `this`
//! outside a class, or reading a variable inside its own initializer.
//!
//! ## Interpreting
//! The [`interpreter`](interpreter) executes the resolved tree against a
//! chain of [`environments`](environment::Environment), one per active
//! scope. Values are [`objects`](object::Object): literals, functions
//! carrying their captured environment, classes and instances. Runtime
//! errors carry the token they happened at and unwind to the top of the
//! current run; in file mode they end the process, at the prompt they are
//! printed and the session continues.

use std::fs;
use std::io::Write;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use interpreter::Interpreter;
use literal::Literal;
use object::Object;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// The driver: owns one interpreter and runs the pipeline over a file or a
/// prompt session. Program output goes through the injected writer so tests
/// can capture it.
pub struct Flint<'w> {
    interpreter: Interpreter<'w>,
}

impl<'w> Flint<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        Flint {
            interpreter: Interpreter::new(out),
        }
    }

    /// Runs a script file. Exits with 65 on a compile-time error and 70 on a
    /// runtime error.
    pub fn run_file(&mut self, path: &str) {
        let contents = fs::read_to_string(path)
            .expect("Should have been able to read the file");

        self.run(&contents);

        if error::did_runtime_error() {
            process::exit(70);
        }
        if error::did_error() {
            process::exit(65);
        }
    }

    /// Runs an interactive session. Definitions persist across lines, errors
    /// do not end the session, and the value of an expression statement is
    /// echoed back when it is not nil.
    pub fn run_prompt(&mut self) {
        let mut editor = DefaultEditor::new().expect("prompt to initialize");
        let history = home::home_dir().map(|dir| dir.join(".flint_history"));

        if let Some(path) = &history {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if line.trim() == "exit" {
                        break;
                    }

                    let _ = editor.add_history_entry(&line);

                    self.run(&line);

                    if !error::did_error() {
                        if let Some(result) = self.interpreter.take_result() {
                            if result != Object::from(Literal::Nil) {
                                println!("{result}");
                            }
                        }
                    }

                    error::reset_error();
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(error) => {
                    eprintln!("{error}");
                    break;
                },
            }
        }

        if let Some(path) = &history {
            let _ = editor.save_history(path);
        }
    }

    /// Runs one source unit through the pipeline, stopping at the first
    /// stage that reports an error.
    fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens();

        if error::did_error() {
            return;
        }

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();

        if error::did_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);

        if error::did_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}
