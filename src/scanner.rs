use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::{Error, ScanError};
use crate::literal::Literal;
use crate::token::{Location, Token, Type};

pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    column_offset: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner.
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source: source.chars().peekmore(),
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            column_offset: 0,
        }
    }

    /// Scans the source code and returns a vector of tokens, ending with an
    /// EOF sentinel.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            Type::EOF,
            String::from(""),
            None,
            Location::new(self.line, self.current - self.column_offset + 1),
        ));

        self.tokens.clone()
    }

    /// Consumes and returns the next character.
    fn advance(&mut self) -> char {
        match self.source.next() {
            Some(char) => {
                self.current += 1;
                char
            },
            None => panic!("tried to advance past end of the file."),
        }
    }

    /// Returns the next character without consuming it, or '\0' at the end
    /// of the file.
    fn peek(&mut self) -> char {
        self.source.peek().copied().unwrap_or('\0')
    }

    /// Returns the character after the next one without consuming anything,
    /// or '\0' at the end of the file.
    fn peek_next(&mut self) -> char {
        self.source.peek_nth(1).copied().unwrap_or('\0')
    }

    /// Returns if the character after the next one is the expected character.
    fn match_next(&mut self, expected: char) -> bool {
        self.peek_next() == expected
    }

    /// Returns the location of the current token's first character.
    fn location(&self) -> Location {
        Location::new(self.line, self.start - self.column_offset + 1)
    }

    /// Adds a new token to the list of tokens.
    fn add_token(&mut self, r#type: Type, lexeme: String, literal: Option<Literal>) {
        let location = self.location();
        self.tokens.push(Token::new(r#type, lexeme, literal, location));
    }

    /// Consumes one character and adds it as a token.
    fn add_single_char_token(&mut self, r#type: Type) {
        let c = self.advance();
        self.add_token(r#type, c.to_string(), None);
    }

    /// Consumes two characters and adds them as one token.
    fn add_double_char_token(&mut self, r#type: Type) {
        let first = self.advance();
        let second = self.advance();

        self.add_token(r#type, format!("{first}{second}"), None);
    }

    /// Returns if the scanner has reached the end of the file.
    fn is_at_end(&mut self) -> bool {
        self.source.peek().is_none()
    }

    /// Handles a string literal. Strings may span multiple lines and have no
    /// escape sequences.
    fn string(&mut self) {
        let location = self.location();
        self.advance(); // Move past the opening double quote.

        let mut value = Vec::new();
        while !self.is_at_end() && self.peek() != '"' {
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
                self.column_offset = self.current;
            }
            value.push(c);
        }

        if self.is_at_end() {
            ScanError {
                location,
                message: String::from("Unterminated string"),
            }.throw();
            return;
        }

        self.advance(); // Move past the closing double quote.

        let value: String = value.into_iter().collect();

        // The literal does not include the double quotes, unlike the lexeme.
        self.tokens.push(Token::new(
            Type::String,
            format!("\"{value}\""),
            Some(Literal::String(value)),
            location,
        ));
    }

    /// Handles a number literal. A fractional part must have digits on both
    /// sides of the dot.
    fn number(&mut self) {
        let mut value = Vec::new();

        while self.peek().is_ascii_digit() {
            value.push(self.advance());
        }

        if self.peek() == '.' {
            if self.peek_next().is_ascii_digit() {
                value.push(self.advance()); // Consume the dot.

                while self.peek().is_ascii_digit() {
                    value.push(self.advance());
                }
            } else {
                self.advance();

                ScanError {
                    location: self.location(),
                    message: String::from("Unterminated number"),
                }.throw();
                return;
            }
        }

        let value: String = value.into_iter().collect();
        let number: f64 = value.parse().expect("digits to parse as a number");

        self.add_token(Type::Number, value, Some(Literal::Number(number)));
    }

    /// Handles an identifier or a keyword.
    fn identifier(&mut self) {
        let mut value = Vec::new();

        // is_alphanumeric does not include underscores.
        while matches!(self.peek(), c if c.is_alphanumeric() || c == '_') {
            value.push(self.advance());
        }

        let value = String::from_iter(value);
        let token_type = match value.as_str() {
            "and"    => Type::And,
            "class"  => Type::Class,
            "else"   => Type::Else,
            "false"  => Type::False,
            "for"    => Type::For,
            "fun"    => Type::Fun,
            "if"     => Type::If,
            "nil"    => Type::Nil,
            "or"     => Type::Or,
            "print"  => Type::Print,
            "return" => Type::Return,
            "super"  => Type::Super,
            "this"   => Type::This,
            "true"   => Type::True,
            "var"    => Type::Var,
            "while"  => Type::While,
            _        => Type::Identifier,
        };

        self.add_token(token_type, value, None);
    }

    /// Skips a block comment, tracking line breaks. Block comments do not nest.
    fn block_comment(&mut self) {
        let location = self.location();
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.peek() == '*' && self.match_next('/') {
                self.advance();
                self.advance();
                return;
            }

            if self.advance() == '\n' {
                self.line += 1;
                self.column_offset = self.current;
            }
        }

        ScanError {
            location,
            message: String::from("Unterminated block comment"),
        }.throw();
    }

    /// Scans the next token.
    fn scan_token(&mut self) {
        let c = self.peek();
        match c {
            // One character tokens
            '(' => self.add_single_char_token(Type::LeftParen),
            ')' => self.add_single_char_token(Type::RightParen),
            '{' => self.add_single_char_token(Type::LeftBrace),
            '}' => self.add_single_char_token(Type::RightBrace),
            ',' => self.add_single_char_token(Type::Comma),
            '.' => self.add_single_char_token(Type::Dot),
            '-' => self.add_single_char_token(Type::Minus),
            '+' => self.add_single_char_token(Type::Plus),
            ';' => self.add_single_char_token(Type::Semicolon),
            '*' => self.add_single_char_token(Type::Star),

            // Two character tokens
            '!' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::BangEqual);
                } else {
                    self.add_single_char_token(Type::Bang)
                };
            },
            '=' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::EqualEqual);
                } else {
                    self.add_single_char_token(Type::Equal)
                };
            },
            '<' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::LessEqual);
                } else {
                    self.add_single_char_token(Type::Less)
                };
            },
            '>' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::GreaterEqual);
                } else {
                    self.add_single_char_token(Type::Greater)
                };
            },
            '/' => {
                if self.match_next('/') {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                } else if self.match_next('*') {
                    self.block_comment();
                } else {
                    self.add_single_char_token(Type::Slash);
                }
            },

            // Ignore whitespace
            ' ' | '\r' | '\t' => {
                self.advance();
            },

            // Update line counter
            '\n' => {
                self.advance();

                self.line += 1;
                self.column_offset = self.current;
            },

            // String
            '"' => self.string(),

            // Numbers
            c if c.is_ascii_digit() => self.number(),

            // Identifiers
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => {
                self.advance();

                ScanError {
                    location: self.location(),
                    message: format!("Unexpected character '{c}'"),
                }.throw();
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn types(source: &str) -> Vec<Type> {
        Scanner::new(source)
            .scan_tokens()
            .iter()
            .map(|token| token.r#type)
            .collect()
    }

    #[test]
    fn scan_operators() {
        assert_eq!(
            types("( ) { } , . - + ; * / ! = < > != == <= >="),
            vec![
                Type::LeftParen, Type::RightParen, Type::LeftBrace, Type::RightBrace,
                Type::Comma, Type::Dot, Type::Minus, Type::Plus, Type::Semicolon,
                Type::Star, Type::Slash, Type::Bang, Type::Equal, Type::Less,
                Type::Greater, Type::BangEqual, Type::EqualEqual, Type::LessEqual,
                Type::GreaterEqual, Type::EOF,
            ],
        );
    }

    #[test]
    fn scan_keywords_and_identifiers() {
        assert_eq!(
            types("var language = nil; _private superb"),
            vec![
                Type::Var, Type::Identifier, Type::Equal, Type::Nil, Type::Semicolon,
                Type::Identifier, Type::Identifier, Type::EOF,
            ],
        );
    }

    #[test]
    fn scan_number_literal() {
        let tokens = Scanner::new("12.5").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.5)));
        assert_eq!(tokens[0].lexeme, "12.5");
    }

    #[test]
    fn scan_string_literal() {
        let tokens = Scanner::new("\"hello\"").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::String(String::from("hello"))));
        assert_eq!(tokens[0].lexeme, "\"hello\"");
    }

    #[test]
    fn scan_comments() {
        assert_eq!(
            types("1 // line comment\n/* block\ncomment */ 2"),
            vec![Type::Number, Type::Number, Type::EOF],
        );
    }

    #[test]
    fn scan_locations() {
        let tokens = Scanner::new("var a;\n  a = 1;").scan_tokens();
        assert_eq!(tokens[0].location, Location::new(1, 1));
        assert_eq!(tokens[1].location, Location::new(1, 5));
        assert_eq!(tokens[3].location, Location::new(2, 3));
    }

    #[test]
    fn scan_without_trailing_newline() {
        assert_eq!(types("abc"), vec![Type::Identifier, Type::EOF]);
    }
}
