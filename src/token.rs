use crate::position::Span;
use std::fmt;
use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum Keyword {
    #[strum(serialize = "VAR")] Var,
    #[strum(serialize = "AND")] And,
    #[strum(serialize = "OR")] Or,
    #[strum(serialize = "NOT")] Not,
    #[strum(serialize = "IF")] If,
    #[strum(serialize = "THEN")] Then,
    #[strum(serialize = "ELIF")] Elif,
    #[strum(serialize = "ELSE")] Else,
    #[strum(serialize = "FOR")] For,
    #[strum(serialize = "TO")] To,
    #[strum(serialize = "STEP")] Step,
    #[strum(serialize = "WHILE")] While,
    #[strum(serialize = "FUN")] Fun,
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Display)]
pub enum TokenType {
    // Literals.
    #[strum(serialize = "INT")] Int(i64),
    #[strum(serialize = "FLOAT")] Float(f64),
    #[strum(serialize = "STRING")] Str(String),
    #[strum(serialize = "IDENTIFIER")] Identifier(String),
    #[strum(serialize = "KEYWORD")] Keyword(Keyword),

    // Operators.
    #[strum(serialize = "PLUS")] Plus,
    #[strum(serialize = "MINUS")] Minus,
    #[strum(serialize = "MUL")] Star,
    #[strum(serialize = "DIV")] Slash,
    #[strum(serialize = "POW")] Caret,
    #[strum(serialize = "EQ")] Equal,
    #[strum(serialize = "EE")] EqualEqual,
    #[strum(serialize = "NE")] BangEqual,
    #[strum(serialize = "LT")] Less,
    #[strum(serialize = "LTE")] LessEqual,
    #[strum(serialize = "GT")] Greater,
    #[strum(serialize = "GTE")] GreaterEqual,

    // Structure.
    #[strum(serialize = "LPAREN")] LeftParen,
    #[strum(serialize = "RPAREN")] RightParen,
    #[strum(serialize = "COMMA")] Comma,
    #[strum(serialize = "ARROW")] Arrow,

    EOF,
}

impl TokenType {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        match self {
            TokenType::Keyword(k) => *k == keyword,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub span: Span,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tokentype {
            TokenType::Int(x) => write!(f, "{}:{}", self.tokentype, x),
            TokenType::Float(x) => write!(f, "{}:{:?}", self.tokentype, x),
            TokenType::Str(x) => write!(f, "{}:{:?}", self.tokentype, x),
            TokenType::Identifier(x) => write!(f, "{}:{}", self.tokentype, x),
            TokenType::Keyword(x) => write!(f, "{}:{}", self.tokentype, x),
            _ => write!(f, "{}", self.tokentype),
        }
    }
}
