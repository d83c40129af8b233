use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::error::{Exception, RuntimeError};
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};
use crate::token::Token;

/// A user-defined class: a name, an optional superclass and a method table.
/// Methods are looked up along the superclass chain.
#[derive(Clone)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<RefCell<Class>>>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<RefCell<Class>>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Class { name, superclass, methods }
    }

    /// Looks up a method by name on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.borrow().find_method(name))
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// Calling a class constructs an instance. The impl lives on the shared
// handle, not on Class, so the new instance references the same class object
// the environment holds.
impl Callable for Rc<RefCell<Class>> {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Exception> {
        let instance = Object::from(Instance::from(self));

        let initializer = self.borrow().find_method("init");
        if let Some(initializer) = initializer {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }

    fn arity(&self) -> usize {
        match self.borrow().find_method("init") {
            Some(initializer) => initializer.arity(),
            None => 0,
        }
    }
}

/// An instance of a class: a class reference plus a field table. Fields are
/// created on first write and shadow methods of the same name on lookup.
#[derive(Debug, Clone)]
pub struct Instance {
    pub class: Rc<RefCell<Class>>,
    pub fields: HashMap<String, Object>,
}

impl Instance {
    /// Reads a property: a field if one exists, otherwise a method from the
    /// class chain bound to this instance. The instance is passed back in as
    /// an object so the binding can share it.
    pub fn get(&self, name: &Token, instance: &Object) -> Result<Object, RuntimeError> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = self.class.borrow().find_method(&name.lexeme) {
            return Ok(Object::from(method.bind(instance.clone())));
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined property '{}'", name.lexeme),
        })
    }

    /// Writes a field, creating it if it does not exist.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl From<&Rc<RefCell<Class>>> for Instance {
    fn from(value: &Rc<RefCell<Class>>) -> Self {
        Instance { class: Rc::clone(value), fields: HashMap::new() }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow().name)
    }
}
