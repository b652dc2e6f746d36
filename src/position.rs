use std::fmt;
use std::rc::Rc;

/// A named piece of source text. Shared by every position that points into it.
#[derive(Debug, PartialEq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: &str, text: &str) -> Rc<Source> {
        Rc::new(Source {
            name: name.to_string(),
            text: text.to_string(),
        })
    }
}

/// A location in a source. `offset` is in bytes, `line` and `column` are zero-based and
/// counted in characters.
#[derive(Debug, Clone)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub source: Rc<Source>,
}

impl Position {
    pub fn start(source: &Rc<Source>) -> Position {
        Position {
            offset: 0,
            line: 0,
            column: 0,
            source: Rc::clone(source),
        }
    }

    /// The position just past `current`.
    pub fn advance(&self, current: char) -> Position {
        let (line, column) = if current == '\n' {
            (self.line + 1, 0)
        } else {
            (self.line, self.column + 1)
        };
        Position {
            offset: self.offset + current.len_utf8(),
            line,
            column,
            source: Rc::clone(&self.source),
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Position) -> bool {
        self.offset == other.offset
            && (Rc::ptr_eq(&self.source, &other.source) || self.source == other.source)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File {}, line {}", self.source.name, self.line + 1)
    }
}

/// Half-open range `[start, end)` in a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Span {
        Span { start, end }
    }

    /// The span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }

    pub fn text(&self) -> &str {
        let text = &self.start.source.text;
        text.get(self.start.offset..self.end.offset).unwrap_or("")
    }
}
