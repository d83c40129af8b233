use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use crate::class::Class;
use crate::environment::Environment;
use crate::error::{Error, Exception, RuntimeError};
use crate::expr::{Expr, ExprVisitor};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::{Token, Type};

type EvalResult = Result<Object, Exception>;
type ExecResult = Result<(), Exception>;

/// Walks the resolved tree and executes it. One interpreter holds the global
/// environment and the resolver's depth table for its whole lifetime, so the
/// prompt can keep definitions across lines. Program output goes through the
/// injected writer.
pub struct Interpreter<'w> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<Token, usize>,
    result: Option<Object>,
    call_depth: usize,
    out: &'w mut dyn Write,
}

impl<'w> Interpreter<'w> {
    /// The deterministic limit on active interpreted calls. Each interpreted
    /// call re-enters the evaluator, so this bounds host stack growth.
    const MAX_CALL_DEPTH: usize = 255;

    pub fn new(out: &'w mut dyn Write) -> Self {
        let globals = Rc::new(RefCell::new(Environment::default()));

        for native in NativeFunction::get_globals() {
            let name = native.name.lexeme.clone();
            globals.borrow_mut().define(&name, Object::from(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            result: None,
            call_depth: 0,
            out,
        }
    }

    /// Executes the program. A runtime error unwinds to here, reports itself
    /// and stops execution.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        self.result = None;

        for statement in statements {
            if let Err(exception) = self.execute(statement) {
                match exception {
                    Exception::Runtime(error) => error.throw(),
                    // The resolver rejects top-level returns.
                    Exception::Return(_) => unreachable!(),
                }
                return;
            }
        }
    }

    /// Records the resolved depth of a name's referencing token.
    pub fn resolve(&mut self, name: &Token, depth: usize) {
        self.locals.insert(name.clone(), depth);
    }

    /// Takes the value of the last executed expression statement, if any.
    /// The prompt uses this to echo results.
    pub fn take_result(&mut self) -> Option<Object> {
        self.result.take()
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    /// Executes statements in the given environment, restoring the previous
    /// one on every exit, including unwinding.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = mem::replace(&mut self.environment, environment);

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;
        result
    }

    /// Reads a name at its resolved depth, or from the globals if the
    /// resolver left it out of the table.
    fn look_up_variable(&self, name: &Token) -> Result<Object, RuntimeError> {
        match self.locals.get(name) {
            Some(distance) => self.environment.borrow().get_at(*distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

impl<'w> ExprVisitor<EvalResult> for Interpreter<'w> {
    fn visit_literal_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Literal(literal) = expr else { unreachable!() };

        Ok(Object::from(literal.clone()))
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Unary(unary) = expr else { unreachable!() };

        let right = self.evaluate(&unary.expr)?;

        match unary.operator.r#type {
            Type::Minus => (-right).ok_or_else(|| RuntimeError {
                token: unary.operator.clone(),
                message: "Operand must be a number".to_string(),
            }.into()),
            Type::Bang => Ok(!right),
            _ => unreachable!(),
        }
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Binary(binary) = expr else { unreachable!() };

        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        let numbers_error = || RuntimeError {
            token: binary.operator.clone(),
            message: "Operands must be numbers".to_string(),
        };

        match binary.operator.r#type {
            Type::Greater | Type::GreaterEqual | Type::Less | Type::LessEqual => {
                let Some(ordering) = left.partial_cmp(&right) else {
                    return Err(numbers_error().into());
                };

                let result = match binary.operator.r#type {
                    Type::Greater => ordering == Ordering::Greater,
                    Type::GreaterEqual => ordering != Ordering::Less,
                    Type::Less => ordering == Ordering::Less,
                    Type::LessEqual => ordering != Ordering::Greater,
                    _ => unreachable!(),
                };

                Ok(Object::from(result))
            },
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),
            Type::Minus => (left - right).ok_or_else(|| numbers_error().into()),
            Type::Star => (left * right).ok_or_else(|| numbers_error().into()),
            Type::Slash => match left / right.clone() {
                Some(_) if right == Object::from(0.0) => Err(RuntimeError {
                    token: binary.operator.clone(),
                    message: "Cannot divide by zero".to_string(),
                }.into()),
                Some(quotient) => Ok(quotient),
                None => Err(numbers_error().into()),
            },
            Type::Plus => {
                let message = format!(
                    "Cannot add a {} and a {}",
                    left.type_str(),
                    right.type_str(),
                );

                (left + right).ok_or_else(|| RuntimeError {
                    token: binary.operator.clone(),
                    message,
                }.into())
            },
            _ => unreachable!(),
        }
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Logical(logical) = expr else { unreachable!() };

        let left = self.evaluate(&logical.left)?;

        // Short-circuit: the result is one of the operand values as-is, not
        // a boolean made from it.
        match logical.operator.r#type {
            Type::Or if left.is_truthy() => Ok(left),
            Type::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(&logical.right),
        }
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Grouping(grouping) = expr else { unreachable!() };

        self.evaluate(&grouping.expr)
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Variable(variable) = expr else { unreachable!() };

        Ok(self.look_up_variable(&variable.name)?)
    }

    fn visit_assign_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Assign(assign) = expr else { unreachable!() };

        let value = self.evaluate(&assign.value)?;

        match self.locals.get(&assign.name) {
            Some(distance) => {
                self.environment.borrow_mut().assign_at(*distance, &assign.name, value.clone());
            },
            None => {
                self.globals.borrow_mut().assign(&assign.name, value.clone())?;
            },
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Call(call) = expr else { unreachable!() };

        let callee = self.evaluate(&call.callee)?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable = match &callee {
            Object::Function(function) => function,
            Object::NativeFunction(native) => native,
            Object::Class(class) => class,
            _ => return Err(RuntimeError {
                token: call.paren.clone(),
                message: "Can only call functions and classes".to_string(),
            }.into()),
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError {
                token: call.paren.clone(),
                message: format!("Expected {} arguments but got {}", callable.arity(), arguments.len()),
            }.into());
        }

        if self.call_depth >= Self::MAX_CALL_DEPTH {
            return Err(RuntimeError {
                token: call.paren.clone(),
                message: "Stack overflow".to_string(),
            }.into());
        }

        self.call_depth += 1;
        let result = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Get(get) = expr else { unreachable!() };

        let object = self.evaluate(&get.object)?;

        match &object {
            Object::Instance(instance) => Ok(instance.borrow().get(&get.name, &object)?),
            _ => Err(RuntimeError {
                token: get.name.clone(),
                message: "Only instances have properties".to_string(),
            }.into()),
        }
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Set(set) = expr else { unreachable!() };

        let object = self.evaluate(&set.object)?;

        let Object::Instance(instance) = object else {
            return Err(RuntimeError {
                token: set.name.clone(),
                message: "Only instances have fields".to_string(),
            }.into());
        };

        let value = self.evaluate(&set.value)?;
        instance.borrow_mut().set(&set.name, value.clone());

        Ok(value)
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::This(this) = expr else { unreachable!() };

        Ok(self.look_up_variable(&this.keyword)?)
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Super(super_expr) = expr else { unreachable!() };

        let distance = *self.locals.get(&super_expr.keyword)
            .expect("resolver to have located 'super'");

        let superclass = self.environment.borrow().get_at(distance, &super_expr.keyword)?;
        let Object::Class(superclass) = superclass else { unreachable!() };

        // `this` always sits exactly one scope inside `super`.
        let object = self.environment.borrow().get_at(distance - 1, &Token::from("this"))?;

        let method = superclass.borrow().find_method(&super_expr.method.lexeme)
            .ok_or_else(|| RuntimeError {
                token: super_expr.method.clone(),
                message: format!("Undefined property '{}'", super_expr.method.lexeme),
            })?;

        Ok(Object::from(method.bind(object)))
    }
}

impl<'w> StmtVisitor<ExecResult> for Interpreter<'w> {
    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Expression(data) = stmt else { unreachable!() };

        self.result = Some(self.evaluate(&data.expr)?);
        Ok(())
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Print(data) = stmt else { unreachable!() };

        let value = self.evaluate(&data.expr)?;
        writeln!(self.out, "{value}").expect("program output to be writable");

        Ok(())
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Var(data) = stmt else { unreachable!() };

        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::from(Literal::Nil),
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Block(data) = stmt else { unreachable!() };

        let environment = Environment::new(Some(Rc::clone(&self.environment)));
        self.execute_block(&data.statements, Rc::new(RefCell::new(environment)))
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::If(data) = stmt else { unreachable!() };

        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::While(data) = stmt else { unreachable!() };

        while self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.body)?;
        }

        Ok(())
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Function(data) = stmt else { unreachable!() };

        let function = Function::new(data, Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));

        Ok(())
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Return(data) = stmt else { unreachable!() };

        let value = match &data.value {
            Some(value) => self.evaluate(value)?,
            None => Object::from(Literal::Nil),
        };

        // Unwinds to the function call that is executing this body.
        Err(Exception::Return(value))
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let superclass = match &data.superclass {
            Some(superclass) => {
                let Expr::Variable(variable) = superclass else { unreachable!() };

                match self.evaluate(superclass)? {
                    Object::Class(class) => Some(class),
                    _ => return Err(RuntimeError {
                        token: variable.name.clone(),
                        message: "Superclass must be a class".to_string(),
                    }.into()),
                }
            },
            None => None,
        };

        // The name is defined up front, as nil, so methods can refer to the
        // class while it is being assembled.
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(Literal::Nil));

        if let Some(superclass) = &superclass {
            let mut environment = Environment::new(Some(Rc::clone(&self.environment)));
            environment.define("super", Object::Class(Rc::clone(superclass)));
            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut methods = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(data) = method else { unreachable!() };

            let is_initializer = data.name.lexeme == "init";
            let function = Function::new(data, Rc::clone(&self.environment), is_initializer);
            methods.insert(data.name.lexeme.clone(), function);
        }

        if superclass.is_some() {
            let enclosing = self.environment.borrow().enclosing.clone()
                .expect("the super scope to have an enclosing environment");
            self.environment = enclosing;
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods);
        self.environment.borrow_mut().assign(&data.name, Object::from(Rc::new(RefCell::new(class))))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    /// Runs a program and returns everything it printed.
    fn run(source: &str) -> String {
        let mut out = Vec::new();

        {
            let mut interpreter = Interpreter::new(&mut out);

            let tokens = Scanner::new(source).scan_tokens();
            let statements = Parser::new(tokens).parse();
            Resolver::new(&mut interpreter).resolve(&statements);
            interpreter.interpret(&statements);
        }

        String::from_utf8(out).expect("program output to be valid utf-8")
    }

    /// Evaluates a single expression against a fresh interpreter.
    fn eval(source: &str) -> EvalResult {
        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);

        let tokens = Scanner::new(&format!("{source};")).scan_tokens();
        let statements = Parser::new(tokens).parse();
        let Stmt::Expression(data) = &statements[0] else { panic!("expected an expression statement") };

        interpreter.evaluate(&data.expr)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
        assert_eq!(run("print (1 + 2) * 3;"), "9\n");
    }

    #[test]
    fn string_concatenation_coerces() {
        assert_eq!(run("print \"n = \" + 4;"), "n = 4\n");
        assert_eq!(run("print 4 + \"!\";"), "4!\n");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let result = eval("1 / 0");
        let Err(Exception::Runtime(error)) = result else { panic!("expected a runtime error") };
        assert_eq!(error.message, "Cannot divide by zero");
    }

    #[test]
    fn type_errors_carry_the_operator() {
        let Err(Exception::Runtime(error)) = eval("\"a\" - 1") else { panic!("expected a runtime error") };
        assert_eq!(error.message, "Operands must be numbers");
        assert_eq!(error.token.lexeme, "-");

        let Err(Exception::Runtime(error)) = eval("-\"a\"") else { panic!("expected a runtime error") };
        assert_eq!(error.message, "Operand must be a number");

        let Err(Exception::Runtime(error)) = eval("true + 1") else { panic!("expected a runtime error") };
        assert_eq!(error.message, "Cannot add a boolean and a number");
    }

    #[test]
    fn equality_follows_value_semantics() {
        assert_eq!(eval("nil == nil").unwrap(), Object::from(true));
        assert_eq!(eval("nil == false").unwrap(), Object::from(false));
        assert_eq!(eval("1 == 1").unwrap(), Object::from(true));
        assert_eq!(eval("\"a\" == \"a\"").unwrap(), Object::from(true));
        assert_eq!(eval("1 == \"1\"").unwrap(), Object::from(false));
    }

    #[test]
    fn logical_operators_yield_operands() {
        assert_eq!(run("print nil or \"fallback\";"), "fallback\n");
        assert_eq!(run("print 1 or 2;"), "1\n");
        assert_eq!(run("print nil and 2;"), "nil\n");
        assert_eq!(run("print 1 and 2;"), "2\n");
    }

    #[test]
    fn short_circuit_skips_the_right_side() {
        let source = "
            fun touch(x) { print x; return x; }
            touch(1) or touch(2);
            touch(nil) and touch(3);
        ";
        assert_eq!(run(source), "1\nnil\n");
    }

    #[test]
    fn truthiness_of_zero_and_empty_string() {
        assert_eq!(run("if (0) print \"zero\";"), "zero\n");
        assert_eq!(run("if (\"\") print \"empty\";"), "empty\n");
        assert_eq!(run("if (nil) print \"nil\"; else print \"falsy\";"), "falsy\n");
    }

    #[test]
    fn block_scopes_shadow_and_restore() {
        let source = "
            var a = \"outer\";
            {
                var a = \"inner\";
                print a;
            }
            print a;
        ";
        assert_eq!(run(source), "inner\nouter\n");
    }

    #[test]
    fn closures_capture_the_environment_not_a_snapshot() {
        let source = "
            var counter = 0;
            fun increment() { counter = counter + 1; }
            increment();
            increment();
            print counter;
        ";
        assert_eq!(run(source), "2\n");
    }

    #[test]
    fn closures_hold_their_declaration_scope() {
        let source = "
            var a = \"global\";
            {
                fun showA() { print a; }
                showA();
                var a = \"block\";
                showA();
            }
        ";
        assert_eq!(run(source), "global\nglobal\n");
    }

    #[test]
    fn functions_without_return_yield_nil() {
        assert_eq!(run("fun noop() { } print noop();"), "nil\n");
    }

    #[test]
    fn initializer_always_yields_the_instance() {
        let source = "
            class Foo { init() { return; } }
            print Foo();
        ";
        assert_eq!(run(source), "Foo instance\n");
    }

    #[test]
    fn super_calls_the_parent_method() {
        let source = "
            class A { m() { print \"A\"; } }
            class B < A { m() { super.m(); print \"B\"; } }
            B().m();
        ";
        assert_eq!(run(source), "A\nB\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let source = "
            class Box { value() { return \"method\"; } }
            var box = Box();
            print box.value();
            box.value = \"field\";
            print box.value;
        ";
        assert_eq!(run(source), "method\nfield\n");
    }

    #[test]
    fn globals_resolve_late_but_locals_resolve_statically() {
        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);

        let source = "var a = 1; { var b = a; print b + a; } print a;";
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();
        Resolver::new(&mut interpreter).resolve(&statements);

        // Only the local `b` is in the depth table; every `a` is global.
        let depths: Vec<(&str, usize)> = interpreter.locals
            .iter()
            .map(|(token, depth)| (token.lexeme.as_str(), *depth))
            .collect();

        assert_eq!(depths, vec![("b", 0)]);
    }

    #[test]
    fn stack_overflow_is_reported() {
        let source = "
            fun loop() { loop(); }
            loop();
        ";
        // The guard trips before the host stack does; the error escapes as a
        // runtime diagnostic, so the program prints nothing.
        assert_eq!(run(source), "");
    }

    #[test]
    fn repl_result_is_the_last_expression_value() {
        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);

        let tokens = Scanner::new("1 + 2;").scan_tokens();
        let statements = Parser::new(tokens).parse();
        Resolver::new(&mut interpreter).resolve(&statements);
        interpreter.interpret(&statements);

        assert_eq!(interpreter.take_result(), Some(Object::from(3.0)));
        assert_eq!(interpreter.take_result(), None);
    }
}
