use crate::error::{Error, ErrorKind};
use crate::position::{Position, Source, Span};
use crate::token::{Keyword, Token, TokenType};
use phf::phf_map;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

// Note: the current character is self.iter.peek(), and self.pos is its position.
struct Scanner<'a> {
    iter: Peekable<Chars<'a>>,
    start: Position,
    pos: Position,
}

/// Splits `text` into tokens, ending with EOF. Stops at the first bad character.
pub fn scan_tokens(source_name: &str, text: &str) -> Result<Vec<Token>, Error> {
    let source = Source::new(source_name, text);
    scan_source(&source)
}

pub fn scan_source(source: &Rc<Source>) -> Result<Vec<Token>, Error> {
    let mut scanner = Scanner {
        iter: source.text.chars().peekable(),
        start: Position::start(source),
        pos: Position::start(source),
    };
    let mut tokens: Vec<Token> = Vec::new();

    while scanner.iter.peek().is_some() {
        scanner.start = scanner.pos.clone();
        if let Some(token) = scanner.scan_token()? {
            tokens.push(token);
        }
    }
    tokens.push(Token {
        tokentype: TokenType::EOF,
        span: Span::new(scanner.pos.clone(), scanner.pos.advance(' ')),
    });
    tracing::trace!(source = %source.name, count = tokens.len(), "scanned tokens");
    Ok(tokens)
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(None),
        };
        match c {
            '(' => Ok(Some(self.token(TokenType::LeftParen))),
            ')' => Ok(Some(self.token(TokenType::RightParen))),
            ',' => Ok(Some(self.token(TokenType::Comma))),
            '+' => Ok(Some(self.token(TokenType::Plus))),
            '*' => Ok(Some(self.token(TokenType::Star))),
            '/' => Ok(Some(self.token(TokenType::Slash))),
            '^' => Ok(Some(self.token(TokenType::Caret))),
            '-' => {
                if self.next_if('>') {
                    Ok(Some(self.token(TokenType::Arrow)))
                } else {
                    Ok(Some(self.token(TokenType::Minus)))
                }
            }
            '!' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::BangEqual)))
                } else {
                    Err(self.error(ErrorKind::ExpectedCharacter(
                        "'=' (after '!')".to_string(),
                    )))
                }
            }
            '=' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::EqualEqual)))
                } else {
                    Ok(Some(self.token(TokenType::Equal)))
                }
            }
            '<' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::LessEqual)))
                } else {
                    Ok(Some(self.token(TokenType::Less)))
                }
            }
            '>' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::GreaterEqual)))
                } else {
                    Ok(Some(self.token(TokenType::Greater)))
                }
            }
            ' ' | '\r' | '\t' | '\n' => Ok(None),
            '"' => Ok(Some(self.string()?)),
            '0'..='9' => Ok(Some(self.number(c))),
            'a'..='z' | 'A'..='Z' => Ok(Some(self.identifier(c))),
            _ => Err(self.error(ErrorKind::IllegalCharacter(c))),
        }
    }
    fn token(&self, tokentype: TokenType) -> Token {
        Token {
            tokentype,
            span: Span::new(self.start.clone(), self.pos.clone()),
        }
    }
    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, Span::new(self.start.clone(), self.pos.clone()))
    }
    fn next_if(&mut self, expected: char) -> bool {
        if self.iter.peek() == Some(&expected) {
            self.advance();
            return true;
        }
        false
    }
    fn advance(&mut self) -> Option<char> {
        let c = self.iter.next()?;
        self.pos = self.pos.advance(c);
        Some(c)
    }
    fn string(&mut self) -> Result<Token, Error> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(ErrorKind::UnterminatedString)),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    None => return Err(self.error(ErrorKind::UnterminatedString)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(self.token(TokenType::Str(value)))
    }
    fn number(&mut self, first: char) -> Token {
        let mut text = first.to_string();
        let mut dots = 0;
        while let Some(&c) = self.iter.peek() {
            match c {
                '0'..='9' => text.push(c),
                '.' if dots == 0 => {
                    dots += 1;
                    text.push(c);
                }
                _ => break,
            }
            self.advance();
        }

        if dots == 0 {
            if let Ok(x) = text.parse::<i64>() {
                return self.token(TokenType::Int(x));
            }
        }
        // Digits and at most one dot always parse as f64.
        let x = text.parse::<f64>().unwrap_or(f64::INFINITY);
        self.token(TokenType::Float(x))
    }
    fn identifier(&mut self, first: char) -> Token {
        let mut text = first.to_string();
        while let Some(&c) = self.iter.peek() {
            match c {
                '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => {
                    text.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        match KEYWORDS.get(text.as_str()) {
            None => self.token(TokenType::Identifier(text)),
            Some(x) => self.token(TokenType::Keyword(*x)),
        }
    }
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "VAR" => Keyword::Var,
    "AND" => Keyword::And,
    "OR" => Keyword::Or,
    "NOT" => Keyword::Not,
    "IF" => Keyword::If,
    "THEN" => Keyword::Then,
    "ELIF" => Keyword::Elif,
    "ELSE" => Keyword::Else,
    "FOR" => Keyword::For,
    "TO" => Keyword::To,
    "STEP" => Keyword::Step,
    "WHILE" => Keyword::While,
    "FUN" => Keyword::Fun,
};

#[cfg(test)]
mod scanner_tests {
    use crate::error::ErrorKind;
    use crate::scanner;
    use crate::token::{Keyword, TokenType};
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> Vec<String> {
        scanner::scan_tokens("<test>", source)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn basic_scanner_test() {
        assert_eq!(
            render("1 + 2 * 3"),
            vec!["INT:1", "PLUS", "INT:2", "MUL", "INT:3", "EOF"]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            render("== != < <= > >= = -> - ^ / ( ) ,"),
            vec![
                "EE", "NE", "LT", "LTE", "GT", "GTE", "EQ", "ARROW", "MINUS", "POW", "DIV",
                "LPAREN", "RPAREN", "COMMA", "EOF"
            ]
        );
    }

    #[test]
    fn number_parsing() {
        let tokens = scanner::scan_tokens("<test>", "12 3.5 7.").unwrap();
        assert_eq!(tokens[0].tokentype, TokenType::Int(12));
        assert_eq!(tokens[1].tokentype, TokenType::Float(3.5));
        assert_eq!(tokens[2].tokentype, TokenType::Float(7.0));
        assert_eq!(tokens[3].tokentype, TokenType::EOF);
    }

    #[test]
    fn second_dot_ends_number() {
        let err = scanner::scan_tokens("<test>", "1.2.3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalCharacter('.'));
        assert_eq!(err.span.start.column, 3);
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = scanner::scan_tokens("<test>", "VAR var_1 = FUN").unwrap();
        assert_eq!(tokens[0].tokentype, TokenType::Keyword(Keyword::Var));
        assert_eq!(tokens[1].tokentype, TokenType::Identifier("var_1".to_string()));
        assert_eq!(tokens[2].tokentype, TokenType::Equal);
        assert!(tokens[3].tokentype.is_keyword(Keyword::Fun));
        assert_eq!(tokens[1].span.text(), "var_1");
    }

    #[test]
    fn strings_with_escapes() {
        let tokens = scanner::scan_tokens("<test>", r#""a\"b\n\\""#).unwrap();
        assert_eq!(tokens[0].tokentype, TokenType::Str("a\"b\n\\".to_string()));
    }

    #[test]
    fn unterminated_string() {
        let err = scanner::scan_tokens("<test>", "\"abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
    }

    #[test]
    fn illegal_character_discards_tokens() {
        let err = scanner::scan_tokens("<test>", "1 + $").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalCharacter('$'));
        assert_eq!(err.span.text(), "$");
    }

    #[test]
    fn lone_bang() {
        let err = scanner::scan_tokens("<test>", "1 ! 2").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ExpectedCharacter(_)));
    }

    #[test]
    fn newlines_advance_lines() {
        let tokens = scanner::scan_tokens("<test>", "1\n  2").unwrap();
        assert_eq!(tokens[1].span.start.line, 1);
        assert_eq!(tokens[1].span.start.column, 2);
    }
}
