pub mod ast;
pub mod builtins;
pub mod callable;
pub mod context;
pub mod environment;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod parser;
pub mod position;
pub mod scanner;
pub mod token;
pub mod value;

mod shared_list;

use std::sync::Once;

pub use error::{Error, ErrorKind, Stage};
pub use interpreter::Interpreter;
pub use value::Value;

/// Scans, parses and evaluates `source_text` in the interpreter's current environment.
pub fn run(source_name: &str, source_text: &str, interpreter: &mut Interpreter) -> Result<Value, Error> {
    let tokens = scanner::scan_tokens(source_name, source_text)?;
    let program = parser::parse(&tokens)?;
    interpreter.interpret(&program)
}

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, e.g. `RUST_LOG=rbasic=debug`.
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
