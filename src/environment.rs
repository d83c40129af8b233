use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// A single lexical scope: a mapping from names to values, linked to the
/// scope that encloses it. Closures keep their captured scope alive through
/// the shared pointer.
#[derive(Debug, Clone)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    pub variables: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            enclosing,
            variables: HashMap::new(),
        }
    }

    /// Defines a variable in this scope, shadowing any enclosing definition.
    pub fn define(&mut self, name: &str, value: Object) {
        self.variables.insert(name.to_string(), value);
    }

    /// Returns the scope `distance` hops up the chain. The resolver
    /// guarantees the chain is deep enough for every distance it reports.
    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let mut environment = self.enclosing.clone()
            .unwrap_or_else(|| panic!("enclosing environment to exist at depth 1"));

        for hop in 1..distance {
            let parent = environment.borrow().enclosing.clone()
                .unwrap_or_else(|| panic!("enclosing environment to exist at depth {hop}"));
            environment = parent;
        }

        environment
    }

    /// Assigns to an existing variable, searching up the chain.
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.variables.contains_key(&name.lexeme) {
            self.variables.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'", name.lexeme),
        })
    }

    /// Assigns to the variable at an exact distance up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Object) {
        if distance > 0 {
            self.ancestor(distance)
                .borrow_mut()
                .variables
                .insert(name.lexeme.clone(), value);
        } else {
            self.variables.insert(name.lexeme.clone(), value);
        }
    }

    /// Reads a variable, searching up the chain.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(variable) = self.variables.get(&name.lexeme) {
            return Ok(variable.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'", name.lexeme),
        })
    }

    /// Reads the variable at an exact distance up the chain.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeError> {
        let variable = if distance > 0 {
            self.ancestor(distance).borrow().variables.get(&name.lexeme).cloned()
        } else {
            self.variables.get(&name.lexeme).cloned()
        };

        variable.ok_or_else(|| RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'", name.lexeme),
        })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::literal::Literal;

    fn name(lexeme: &str) -> Token {
        Token::from(lexeme)
    }

    #[test]
    fn define_and_get() {
        let mut environment = Environment::default();
        environment.define("a", Object::from(1.0));

        assert_eq!(environment.get(&name("a")).unwrap(), Object::from(1.0));
        assert!(environment.get(&name("b")).is_err());
    }

    #[test]
    fn get_walks_the_chain() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from("outer"));

        let local = Environment::new(Some(Rc::clone(&global)));
        assert_eq!(local.get(&name("a")).unwrap(), Object::from("outer"));
    }

    #[test]
    fn assign_updates_the_defining_scope() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from(1.0));

        let mut local = Environment::new(Some(Rc::clone(&global)));
        local.assign(&name("a"), Object::from(2.0)).unwrap();

        assert_eq!(global.borrow().get(&name("a")).unwrap(), Object::from(2.0));
        assert!(local.assign(&name("b"), Object::from(0.0)).is_err());
    }

    #[test]
    fn get_at_skips_shadowing_scopes() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from("global"));

        let middle = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&global)))));
        middle.borrow_mut().define("a", Object::from("middle"));

        let inner = Environment::new(Some(Rc::clone(&middle)));

        assert_eq!(inner.get_at(1, &name("a")).unwrap(), Object::from("middle"));
        assert_eq!(inner.get_at(2, &name("a")).unwrap(), Object::from("global"));
        assert_eq!(inner.get(&name("a")).unwrap(), Object::from("middle"));
    }

    #[test]
    fn assign_at_targets_the_exact_scope() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from("global"));

        let mut inner = Environment::new(Some(Rc::clone(&global)));
        inner.define("a", Object::from("inner"));
        inner.assign_at(1, &name("a"), Object::from("changed"));

        assert_eq!(inner.get_at(0, &name("a")).unwrap(), Object::from("inner"));
        assert_eq!(global.borrow().get(&name("a")).unwrap(), Object::from("changed"));
    }

    #[test]
    fn nil_is_a_value_not_an_absence() {
        let mut environment = Environment::default();
        environment.define("a", Object::from(Literal::Nil));

        assert_eq!(environment.get(&name("a")).unwrap(), Object::from(Literal::Nil));
    }
}
