use crate::error::{Error, ParseError};
use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;
use crate::token::{Token, Type};

type ParseResult<T> = Result<T, ParseError>;

/// Returns if the next token is any of the given types, consuming it if so.
macro_rules! matches {
    ( $self:ident, $( $type:expr ),+ ) => {
        {
            if $( $self.check($type) ) ||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// Parses the tokens and returns the resulting program.
///
/// - Program     -> Declaration* EOF ;
/// - Declaration -> ClassDecl | FunDecl | VarDecl | Statement ;
/// - ClassDecl   -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" Function* "}" ;
/// - FunDecl     -> "fun" Function ;
/// - Function    -> IDENTIFIER "(" Parameters? ")" Block ;
/// - Parameters  -> IDENTIFIER ( "," IDENTIFIER )* ;
/// - VarDecl     -> "var" IDENTIFIER ( "=" Expression )? ";" ;
/// - Statement   -> ExprStmt | ForStmt | IfStmt | PrintStmt | ReturnStmt | WhileStmt | Block ;
/// - Block       -> "{" Declaration* "}" ;
/// - ExprStmt    -> Expression ";" ;
/// - ForStmt     -> "for" "(" ( VarDecl | ExprStmt | ";" ) Expression? ";" Expression? ")" Statement ;
/// - IfStmt      -> "if" "(" Expression ")" Statement ( "else" Statement )? ;
/// - PrintStmt   -> "print" Expression ";" ;
/// - ReturnStmt  -> "return" Expression? ";" ;
/// - WhileStmt   -> "while" "(" Expression ")" Statement ;
/// - Expression  -> Assignment ;
/// - Assignment  -> ( Call "." )? IDENTIFIER "=" Assignment | LogicOr ;
/// - LogicOr     -> LogicAnd ( "or" LogicAnd )* ;
/// - LogicAnd    -> Equality ( "and" Equality )* ;
/// - Equality    -> Comparison ( ( "!=" | "==" ) Comparison )* ;
/// - Comparison  -> Term ( ( ">" | ">=" | "<" | "<=" ) Term )* ;
/// - Term        -> Factor ( ( "+" | "-" ) Factor )* ;
/// - Factor      -> Unary ( ( "*" | "/" ) Unary )* ;
/// - Unary       -> ( "!" | "-" ) Unary | Call ;
/// - Call        -> Primary ( "(" Arguments? ")" | "." IDENTIFIER )* ;
/// - Arguments   -> Expression ( "," Expression )* ;
/// - Primary     -> NUMBER | STRING | "false" | "true" | "nil" | "this" | "(" Expression ")" | IDENTIFIER | "super" "." IDENTIFIER ;
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
        }
    }

    /// Parses the tokens and returns as much of the program as was
    /// recoverable. Errors are reported through the diagnostic sink; the
    /// caller decides whether to proceed.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    /// Returns the next token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Returns the previous token without consuming it.
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Returns if the parser has reached the end of the file.
    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    /// Returns if the next token is of the given type.
    fn check(&self, r#type: Type) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().r#type == r#type
    }

    /// Consumes the next token and returns it.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    /// Consumes the next token if it is of the given type, or reports an
    /// error at the offending token.
    fn consume(&mut self, r#type: Type, message: &str) -> ParseResult<&Token> {
        if self.check(r#type) {
            return Ok(self.advance());
        }

        Err(ParseError {
            token: self.peek().clone(),
            message: message.to_string(),
        })
    }

    /// Parses a declaration. On a parse error, reports it and synchronizes
    /// to the next statement boundary.
    fn declaration(&mut self) -> Option<Stmt> {
        let statement = if matches!(self, Type::Class) {
            self.class_declaration()
        } else if matches!(self, Type::Fun) {
            self.function("function")
        } else if matches!(self, Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.throw();
                self.synchronize();
                None
            }
        }
    }

    /// Parses a class declaration.
    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expected class name")?.clone();

        let superclass = if matches!(self, Type::Less) {
            self.consume(Type::Identifier, "Expected superclass name")?;
            Some(Expr::Variable(VariableData { name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expected '{' before class body")?;

        let mut methods: Vec<Stmt> = vec![];
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Type::RightBrace, "Expected '}' after class body")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    /// Parses a function or method declaration.
    fn function(&mut self, kind: &str) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, &format!("Expected {kind} name"))?.clone();

        self.consume(Type::LeftParen, &format!("Expected '(' after {kind} name"))?;

        let mut params = vec![];

        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= 255 {
                    ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 parameters".to_string(),
                    }.throw();
                }

                params.push(self.consume(Type::Identifier, "Expected parameter name")?.clone());

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expected ')' after parameters")?;

        self.consume(Type::LeftBrace, &format!("Expected '{{' before {kind} body"))?;

        let body = self.block()?;

        Ok(Stmt::Function(FunctionData { name, params, body }))
    }

    /// Parses a variable declaration.
    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expected variable name")?.clone();

        let initializer = if matches!(self, Type::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Type::Semicolon, "Expected ';' after variable declaration")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    /// Parses a statement.
    fn statement(&mut self) -> ParseResult<Stmt> {
        if matches!(self, Type::For) {
            return self.for_statement();
        }

        if matches!(self, Type::If) {
            return self.if_statement();
        }

        if matches!(self, Type::Print) {
            return self.print_statement();
        }

        if matches!(self, Type::Return) {
            return self.return_statement();
        }

        if matches!(self, Type::While) {
            return self.while_statement();
        }

        if matches!(self, Type::LeftBrace) {
            return Ok(Stmt::Block(BlockData { statements: self.block()? }));
        }

        self.expression_statement()
    }

    /// Parses a for statement, desugaring it into a while loop:
    /// `{ init; while (cond) { body; incr; } }`. A missing condition becomes
    /// literal true; a missing initializer or increment drops that clause.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expected '(' after 'for'")?;

        let initializer = if matches!(self, Type::Semicolon) {
            None
        } else if matches!(self, Type::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = match !self.check(Type::Semicolon) {
            true => Some(self.expression()?),
            false => None,
        };
        self.consume(Type::Semicolon, "Expected ';' after loop condition")?;

        let increment = match !self.check(Type::RightParen) {
            true => Some(self.expression()?),
            false => None,
        };
        self.consume(Type::RightParen, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;

        // Execute the increment after the body.
        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![
                    body,
                    Stmt::Expression(ExpressionData { expr: increment }),
                ],
            });
        }

        body = Stmt::While(WhileData {
            condition: condition.unwrap_or(Expr::Literal(Literal::Bool(true))),
            body: Box::new(body),
        });

        // Run the initializer once, before the loop.
        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData {
                statements: vec![initializer, body],
            });
        }

        Ok(body)
    }

    /// Parses an if statement. An else binds to the nearest if.
    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if matches!(self, Type::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    /// Parses a print statement.
    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expected ';' after value")?;

        Ok(Stmt::Print(PrintData { expr }))
    }

    /// Parses a return statement.
    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = match self.check(Type::Semicolon) {
            true => None,
            false => Some(self.expression()?),
        };

        self.consume(Type::Semicolon, "Expected ';' after return value")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    /// Parses a while statement.
    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expected ')' after condition")?;
        let body = self.statement()?;

        Ok(Stmt::While(WhileData {
            condition,
            body: Box::new(body),
        }))
    }

    /// Parses an expression statement.
    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expected ';' after expression")?;

        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    /// Parses a block statement.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(Type::RightBrace, "Expected '}' after block")?;

        Ok(statements)
    }

    /// Parses an expression.
    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    /// Parses an assignment expression. The left side is parsed as a plain
    /// expression first and converted once '=' is seen; a left side that is
    /// neither a variable nor a property access is reported without aborting
    /// the parse.
    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if matches!(self, Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            match expr {
                Expr::Variable(data) => {
                    return Ok(Expr::Assign(AssignData {
                        name: data.name,
                        value: Box::new(value),
                    }));
                },
                Expr::Get(data) => {
                    return Ok(Expr::Set(SetData {
                        object: data.object,
                        name: data.name,
                        value: Box::new(value),
                    }));
                },
                _ => {
                    ParseError {
                        token: equals,
                        message: "Invalid assignment target".to_string(),
                    }.throw();

                    return Ok(expr);
                },
            }
        }

        Ok(expr)
    }

    /// Parses an or expression.
    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while matches!(self, Type::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses an and expression.
    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while matches!(self, Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses an equality expression.
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while matches!(self, Type::BangEqual, Type::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;

            expr = Expr::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses a comparison expression.
    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while matches!(self, Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;

            expr = Expr::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses a term expression.
    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while matches!(self, Type::Minus, Type::Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;

            expr = Expr::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses a factor expression.
    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while matches!(self, Type::Slash, Type::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            expr = Expr::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    /// Parses a unary expression.
    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::Bang, Type::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            return Ok(Expr::Unary(UnaryData {
                operator,
                expr: Box::new(right),
            }));
        }

        self.call()
    }

    /// Parses a call expression.
    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self, Type::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if matches!(self, Type::Dot) {
                let name = self.consume(Type::Identifier, "Expected property name after '.'")?;
                expr = Expr::Get(GetData { object: Box::new(expr), name: name.clone() });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parses the arguments of a call.
    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = vec![];

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 arguments".to_string(),
                    }.throw();
                }

                arguments.push(self.expression()?);

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call(CallData {
            callee: Box::new(callee),
            paren: paren.clone(),
            arguments,
        }))
    }

    /// Parses a primary expression.
    fn primary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::False) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }

        if matches!(self, Type::True) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }

        if matches!(self, Type::Nil) {
            return Ok(Expr::Literal(Literal::Nil));
        }

        if matches!(self, Type::Number, Type::String) {
            return Ok(Expr::Literal(self.previous().clone().literal
                .expect("number or string to have a literal value")));
        }

        if matches!(self, Type::Super) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expected '.' after 'super'")?;
            let method = self.consume(Type::Identifier, "Expected superclass method name")?.clone();

            return Ok(Expr::Super(SuperData { keyword, method }));
        }

        if matches!(self, Type::This) {
            return Ok(Expr::This(ThisData { keyword: self.previous().clone() }));
        }

        if matches!(self, Type::Identifier) {
            return Ok(Expr::Variable(VariableData {
                name: self.previous().clone(),
            }));
        }

        if matches!(self, Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expected ')' after expression")?;

            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }

        Err(ParseError {
            token: self.peek().clone(),
            message: "Expected expression".to_string(),
        })
    }

    /// Tries to recover from a parse error by discarding tokens until a
    /// statement boundary.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().r#type == Type::Semicolon {
                return;
            }

            match self.peek().r#type {
                Type::Class => return,
                Type::Fun => return,
                Type::Var => return,
                Type::For => return,
                Type::If => return,
                Type::While => return,
                Type::Print => return,
                Type::Return => return,
                _ => self.advance(),
            };
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source).scan_tokens();
        Parser::new(tokens).parse()
    }

    fn parse_expr(source: &str) -> Expr {
        let statements = parse(&format!("{source};"));
        let Stmt::Expression(data) = &statements[0] else { panic!("expected an expression statement") };
        data.expr.clone()
    }

    #[test]
    fn precedence_binds_factors_tighter() {
        let Expr::Binary(add) = parse_expr("1 + 2 * 3") else { panic!("expected a binary expression") };
        assert_eq!(add.operator.r#type, Type::Plus);
        assert_eq!(*add.left, Expr::Literal(Literal::Number(1.0)));

        let Expr::Binary(mul) = *add.right else { panic!("expected a binary expression") };
        assert_eq!(mul.operator.r#type, Type::Star);
    }

    #[test]
    fn unary_is_right_associative() {
        let Expr::Unary(outer) = parse_expr("!!true") else { panic!("expected a unary expression") };
        assert_eq!(outer.operator.r#type, Type::Bang);
        assert!(std::matches!(*outer.expr, Expr::Unary(_)));
    }

    #[test]
    fn assignment_converts_variable_and_get() {
        assert!(std::matches!(parse_expr("a = 1"), Expr::Assign(_)));
        assert!(std::matches!(parse_expr("a.b = 1"), Expr::Set(_)));
    }

    #[test]
    fn for_desugars_into_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else { panic!("expected the initializer block") };
        assert!(std::matches!(outer.statements[0], Stmt::Var(_)));

        let Stmt::While(data) = &outer.statements[1] else { panic!("expected the loop") };
        let Stmt::Block(body) = &*data.body else { panic!("expected the increment block") };
        assert!(std::matches!(body.statements[1], Stmt::Expression(_)));
    }

    #[test]
    fn for_without_condition_loops_on_true() {
        let statements = parse("for (;;) print 1;");
        let Stmt::While(data) = &statements[0] else { panic!("expected the loop") };
        assert_eq!(data.condition, Expr::Literal(Literal::Bool(true)));
    }

    #[test]
    fn else_binds_to_nearest_if() {
        let statements = parse("if (a) if (b) print 1; else print 2;");
        let Stmt::If(outer) = &statements[0] else { panic!("expected an if statement") };
        assert!(outer.else_branch.is_none());

        let Stmt::If(inner) = &*outer.then_branch else { panic!("expected a nested if") };
        assert!(inner.else_branch.is_some());
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let statements = parse("class B < A { init() { } m(a, b) { return a; } }");
        let Stmt::Class(data) = &statements[0] else { panic!("expected a class statement") };

        assert_eq!(data.name.lexeme, "B");
        assert!(std::matches!(data.superclass, Some(Expr::Variable(_))));
        assert_eq!(data.methods.len(), 2);
    }

    #[test]
    fn calls_chain_with_property_access() {
        let Expr::Call(call) = parse_expr("a.b(1).c()") else { panic!("expected a call expression") };
        assert!(call.arguments.is_empty());
        assert!(std::matches!(*call.callee, Expr::Get(_)));
    }

    #[test]
    fn recovers_at_statement_boundary() {
        // The bad statement is dropped; the rest of the program survives.
        let statements = parse("var = 1; print 2;");
        assert_eq!(statements.len(), 1);
        assert!(std::matches!(statements[0], Stmt::Print(_)));
    }
}
