use crate::expr::{Expr, ExprVisitor};
use crate::literal::Literal;
use crate::stmt::{FunctionData, Stmt, StmtVisitor};

/// Renders a program back into canonical source text.
///
/// The output is valid source for the same program: string literals are
/// re-quoted, statements end in semicolons and blocks keep their braces.
/// Desugared constructs print in their desugared form, so a for loop comes
/// back as the block-and-while it was parsed into. Printing is deterministic,
/// which makes the printed form a fixpoint: parsing the output and printing
/// it again yields the same text.
pub struct Printer;

impl Printer {
    /// Prints a whole program, one statement per line.
    pub fn print(&mut self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| stmt.accept(self))
            .collect::<Vec<String>>()
            .join("\n")
    }

    /// Prints a function declaration without the leading `fun` keyword, the
    /// form shared by named functions and class methods.
    fn function(&mut self, data: &FunctionData) -> String {
        let params = data.params
            .iter()
            .map(|param| param.lexeme.clone())
            .collect::<Vec<String>>()
            .join(", ");

        format!("{}({}) {}", data.name.lexeme, params, self.block(&data.body))
    }

    fn block(&mut self, statements: &[Stmt]) -> String {
        if statements.is_empty() {
            return String::from("{ }");
        }

        let body = statements
            .iter()
            .map(|stmt| stmt.accept(self))
            .collect::<Vec<String>>()
            .join(" ");

        format!("{{ {body} }}")
    }
}

impl ExprVisitor<String> for Printer {
    fn visit_literal_expr(&mut self, expr: &Expr) -> String {
        let Expr::Literal(literal) = expr else { unreachable!() };

        match literal {
            Literal::String(s) => format!("\"{s}\""),
            literal => literal.to_string(),
        }
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> String {
        let Expr::Unary(unary) = expr else { unreachable!() };

        format!("{}{}", unary.operator.lexeme, unary.expr.accept(self))
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> String {
        let Expr::Binary(binary) = expr else { unreachable!() };

        format!(
            "{} {} {}",
            binary.left.accept(self),
            binary.operator.lexeme,
            binary.right.accept(self),
        )
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> String {
        let Expr::Logical(logical) = expr else { unreachable!() };

        format!(
            "{} {} {}",
            logical.left.accept(self),
            logical.operator.lexeme,
            logical.right.accept(self),
        )
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> String {
        let Expr::Grouping(grouping) = expr else { unreachable!() };

        format!("({})", grouping.expr.accept(self))
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> String {
        let Expr::Variable(variable) = expr else { unreachable!() };

        variable.name.lexeme.clone()
    }

    fn visit_assign_expr(&mut self, expr: &Expr) -> String {
        let Expr::Assign(assign) = expr else { unreachable!() };

        format!("{} = {}", assign.name.lexeme, assign.value.accept(self))
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> String {
        let Expr::Call(call) = expr else { unreachable!() };

        let arguments = call.arguments
            .iter()
            .map(|argument| argument.accept(self))
            .collect::<Vec<String>>()
            .join(", ");

        format!("{}({})", call.callee.accept(self), arguments)
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> String {
        let Expr::Get(get) = expr else { unreachable!() };

        format!("{}.{}", get.object.accept(self), get.name.lexeme)
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> String {
        let Expr::Set(set) = expr else { unreachable!() };

        format!(
            "{}.{} = {}",
            set.object.accept(self),
            set.name.lexeme,
            set.value.accept(self),
        )
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> String {
        let Expr::This(_) = expr else { unreachable!() };

        String::from("this")
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> String {
        let Expr::Super(super_expr) = expr else { unreachable!() };

        format!("super.{}", super_expr.method.lexeme)
    }
}

impl StmtVisitor<String> for Printer {
    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Expression(data) = stmt else { unreachable!() };

        format!("{};", data.expr.accept(self))
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Print(data) = stmt else { unreachable!() };

        format!("print {};", data.expr.accept(self))
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Var(data) = stmt else { unreachable!() };

        match &data.initializer {
            Some(initializer) => format!("var {} = {};", data.name.lexeme, initializer.accept(self)),
            None => format!("var {};", data.name.lexeme),
        }
    }

    fn visit_block_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Block(data) = stmt else { unreachable!() };

        self.block(&data.statements)
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::If(data) = stmt else { unreachable!() };

        let mut string = format!(
            "if ({}) {}",
            data.condition.accept(self),
            data.then_branch.accept(self),
        );

        if let Some(else_branch) = &data.else_branch {
            string += &format!(" else {}", else_branch.accept(self));
        }

        string
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::While(data) = stmt else { unreachable!() };

        format!("while ({}) {}", data.condition.accept(self), data.body.accept(self))
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Function(data) = stmt else { unreachable!() };

        format!("fun {}", self.function(data))
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Return(data) = stmt else { unreachable!() };

        match &data.value {
            Some(value) => format!("return {};", value.accept(self)),
            None => String::from("return;"),
        }
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> String {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let mut string = format!("class {}", data.name.lexeme);

        if let Some(Expr::Variable(superclass)) = &data.superclass {
            string += &format!(" < {}", superclass.name.lexeme);
        }

        if data.methods.is_empty() {
            return string + " { }";
        }

        let methods = data.methods
            .iter()
            .map(|method| {
                let Stmt::Function(data) = method else { unreachable!() };
                self.function(data)
            })
            .collect::<Vec<String>>()
            .join(" ");

        format!("{string} {{ {methods} }}")
    }
}
