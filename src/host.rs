//! The I/O collaborator built-ins talk to.
//!
//! - `StdHost`: stdin/stdout, used by the CLI.
//! - `BufferHost`: scripted input and captured output, used by tests and embedders.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Host {
    /// Writes one line of output.
    fn write_line(&mut self, text: &str);

    /// Reads one line of input without its line terminator, or `None` once input is
    /// exhausted.
    fn read_line(&mut self) -> Option<String>;
}

#[derive(Default)]
pub struct StdHost;

impl Host for StdHost {
    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&mut self) -> Option<String> {
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
        }
    }
}

#[derive(Default)]
pub struct BufferHost {
    input: VecDeque<String>,
    output: Vec<String>,
}

impl BufferHost {
    pub fn new() -> BufferHost {
        BufferHost::default()
    }

    pub fn with_input(lines: &[&str]) -> BufferHost {
        BufferHost {
            input: lines.iter().map(|l| l.to_string()).collect(),
            output: Vec::new(),
        }
    }

    /// Every line written so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }
}

impl Host for BufferHost {
    fn write_line(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn read_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }
}
