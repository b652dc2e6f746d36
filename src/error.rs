use crate::context::Context;
use crate::position::{Position, Span};
use std::rc::Rc;
use strum_macros::Display;

/// The pipeline stage an error comes from.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum Stage {
    #[strum(serialize = "Lex Error")]
    Lex,
    #[strum(serialize = "Invalid Syntax")]
    Syntax,
    #[strum(serialize = "Runtime Error")]
    Runtime,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("Illegal Character '{0}'")]
    IllegalCharacter(char),
    #[error("Expected Character {0}")]
    ExpectedCharacter(String),
    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("{0}")]
    InvalidSyntax(String),

    #[error("'{0}' is not defined")]
    NameNotDefined(String),
    #[error("Illegal operation: {0}")]
    IllegalOperation(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("'{name}' expected {expected} argument(s) but received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("Invalid loop bound: {0}")]
    InvalidLoopBound(String),
    #[error("No more input available")]
    InputUnavailable,
}

impl ErrorKind {
    pub fn stage(&self) -> Stage {
        match self {
            ErrorKind::IllegalCharacter(_)
            | ErrorKind::ExpectedCharacter(_)
            | ErrorKind::UnterminatedString => Stage::Lex,
            ErrorKind::InvalidSyntax(_) => Stage::Syntax,
            ErrorKind::NameNotDefined(_)
            | ErrorKind::IllegalOperation(_)
            | ErrorKind::DivisionByZero
            | ErrorKind::ArityMismatch { .. }
            | ErrorKind::InvalidLoopBound(_)
            | ErrorKind::InputUnavailable => Stage::Runtime,
        }
    }
}

/// A failure from any stage of the pipeline, positioned in the source.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{}: {kind}\n{}", .kind.stage(), .span.start)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Span,
    /// Call stack at the failure; set for runtime errors only.
    pub context: Option<Rc<Context>>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Error {
        Error {
            kind,
            span,
            context: None,
        }
    }

    pub fn runtime(kind: ErrorKind, span: Span, context: &Rc<Context>) -> Error {
        Error {
            kind,
            span,
            context: Some(Rc::clone(context)),
        }
    }

    pub fn stage(&self) -> Stage {
        self.kind.stage()
    }

    /// Full diagnostic: traceback for runtime errors, the message, and the offending source
    /// lines with the span underlined.
    pub fn render(&self) -> String {
        let mut result = String::new();
        if let Some(context) = &self.context {
            result.push_str(&self.traceback(context));
            result.push_str(&format!("{}: {}\n", self.stage(), self.kind));
        } else {
            result.push_str(&format!("{}\n", self));
        }
        result.push('\n');
        result.push_str(&underline(&self.span.start, &self.span.end));
        result
    }

    fn traceback(&self, context: &Rc<Context>) -> String {
        let mut frames = Vec::new();
        let mut pos = Some(self.span.start.clone());
        let mut current = Some(Rc::clone(context));
        while let Some(ctx) = current {
            if let Some(p) = &pos {
                frames.push(format!("  {}, in {}", p, ctx.display_name));
            }
            pos = ctx.entry.clone();
            current = ctx.parent.clone();
        }
        frames.reverse();
        let mut result = String::from("Traceback (most recent call last):\n");
        for frame in frames {
            result.push_str(&frame);
            result.push('\n');
        }
        result
    }
}

fn underline(start: &Position, end: &Position) -> String {
    let lines: Vec<&str> = start.source.text.split('\n').collect();
    let last = end.line.max(start.line);
    let mut result = String::new();
    for line_no in start.line..=last {
        let line = lines.get(line_no).copied().unwrap_or("").trim_end_matches('\r');
        let width = line.chars().count();
        let from = if line_no == start.line { start.column } else { 0 };
        let to = if line_no == last { end.column } else { width };
        result.push_str(&line.replace('\t', " "));
        result.push('\n');
        result.push_str(&" ".repeat(from));
        result.push_str(&"^".repeat(to.saturating_sub(from).max(1)));
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, Stage};
    use crate::context::Context;
    use crate::position::{Position, Source, Span};

    fn span_of(source: &str, from: usize, to: usize) -> Span {
        let source = Source::new("<test>", source);
        let mut pos = Position::start(&source);
        let mut start = pos.clone();
        for (i, c) in source.text.chars().enumerate() {
            if i == from {
                start = pos.clone();
            }
            if i == to {
                break;
            }
            pos = pos.advance(c);
        }
        Span::new(start, pos)
    }

    #[test]
    fn stages() {
        assert_eq!(ErrorKind::IllegalCharacter('$').stage(), Stage::Lex);
        assert_eq!(ErrorKind::InvalidSyntax("x".into()).stage(), Stage::Syntax);
        assert_eq!(ErrorKind::DivisionByZero.stage(), Stage::Runtime);
    }

    #[test]
    fn render_underlines_span() {
        let err = Error::new(ErrorKind::IllegalCharacter('$'), span_of("1 + $", 4, 5));
        let rendered = err.render();
        assert!(rendered.starts_with("Lex Error: Illegal Character '$'\nFile <test>, line 1"));
        assert!(rendered.ends_with("1 + $\n    ^\n"));
    }

    #[test]
    fn render_runtime_traceback() {
        let span = span_of("f(1)", 2, 3);
        let root = Context::root("<program>");
        let inner = Context::child(&root, "f", span.start.clone());
        let err = Error::runtime(ErrorKind::DivisionByZero, span, &inner);
        let rendered = err.render();
        assert!(rendered.starts_with("Traceback (most recent call last):\n"));
        assert!(rendered.contains("in <program>\n"));
        assert!(rendered.contains("in f\n"));
        assert!(rendered.contains("Runtime Error: Division by zero\n"));
    }
}
