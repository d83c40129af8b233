use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::Exception;
use crate::interpreter::Interpreter;
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{FunctionData, Stmt};
use crate::token::Token;

/// A user-defined function. The declaration's parameters and body are shared
/// between the function value and every binding made from it; the closure is
/// the environment that was active at the declaration site.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    params: Rc<Vec<Token>>,
    body: Rc<Vec<Stmt>>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: &FunctionData,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            name: declaration.name.clone(),
            params: Rc::new(declaration.params.clone()),
            body: Rc::new(declaration.body.clone()),
            closure,
            is_initializer,
        }
    }

    /// Returns a copy of this function whose closure is extended with a
    /// scope binding `this` to the given instance.
    pub fn bind(&self, instance: Object) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", instance);

        Function {
            name: self.name.clone(),
            params: Rc::clone(&self.params),
            body: Rc::clone(&self.body),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Exception> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, argument) in self.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment = Rc::new(RefCell::new(environment));
        match interpreter.execute_block(&self.body, environment) {
            Ok(()) => (),
            // A return unwinds to here and no further.
            Err(Exception::Return(value)) => {
                if !self.is_initializer {
                    return Ok(value);
                }
            },
            Err(exception) => return Err(exception),
        }

        // An initializer always yields the instance under construction, even
        // on a bare `return`.
        if self.is_initializer {
            return Ok(self.closure.borrow().get_at(0, &Token::from("this"))?);
        }

        Ok(Object::from(Literal::Nil))
    }

    fn arity(&self) -> usize {
        self.params.len()
    }
}

// Two function values are the same function only if they share a declaration
// and a captured environment.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

/// A function implemented by the host. Natives live in the global
/// environment and have no closure.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Token,
    pub arity: usize,
    pub function: fn(&mut Interpreter, Vec<Object>) -> Result<Object, Exception>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Exception> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl NativeFunction {
    /// Returns the native functions that populate the global environment.
    pub fn get_globals() -> Vec<NativeFunction> {
        vec![
            // Wall-clock seconds since the Unix epoch.
            NativeFunction {
                name: Token::from("time"),
                arity: 0,
                function: |_, _| {
                    let now = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .expect("system clock to be past the epoch")
                        .as_secs_f64();
                    Ok(Object::from(now))
                },
            },
            // One line from standard input, without the newline.
            NativeFunction {
                name: Token::from("input"),
                arity: 0,
                function: |_, _| {
                    let mut input = String::new();
                    std::io::stdin()
                        .read_line(&mut input)
                        .expect("standard input to be readable");
                    if input.ends_with('\n') {
                        input.pop();
                    }
                    Ok(Object::from(input))
                },
            },
        ]
    }
}

// Native names are unique in the global environment.
impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name.lexeme == other.name.lexeme
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name.lexeme)
    }
}
