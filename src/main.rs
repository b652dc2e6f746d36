use clap::{crate_version, App, Arg};
use rbasic::ast::AstPrinter;
use rbasic::builtins::global_environment;
use rbasic::host::StdHost;
use rbasic::{parser, scanner, Interpreter, Stage};
use std::fs;
use std::io::{self, BufRead, Write};

enum Mode {
    Run,
    Tokens,
    Ast,
}

fn main() {
    rbasic::init_tracing();

    let matches = App::new("rbasic")
        .version(crate_version!())
        .about("Runs rbasic programs, or starts a prompt when no script is given")
        .arg(Arg::with_name("script").help("Program to run").index(1))
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("Print the token stream instead of running"),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .conflicts_with("tokens")
                .help("Print the syntax tree instead of running"),
        )
        .get_matches();

    let mode = if matches.is_present("tokens") {
        Mode::Tokens
    } else if matches.is_present("ast") {
        Mode::Ast
    } else {
        Mode::Run
    };

    match matches.value_of("script") {
        Some(file) => run_file(file, &mode),
        None => run_prompt(&mode),
    }
}

fn run_file(file: &str, mode: &Mode) {
    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Could not read {}: {}", file, e);
            std::process::exit(74);
        }
    };
    let mut host = StdHost;
    let mut interpreter = Interpreter::new(global_environment(), &mut host);
    if let Err(code) = run(file, &contents, mode, &mut interpreter, false) {
        std::process::exit(code);
    }
}

fn run_prompt(mode: &Mode) {
    let mut host = StdHost;
    let mut interpreter = Interpreter::new(global_environment(), &mut host);
    let stdin = io::stdin();
    loop {
        print!("rbasic > ");
        if io::stdout().flush().is_err() {
            return;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            continue;
        }
        // Errors are already reported; the prompt keeps going.
        let _ = run("<stdin>", &line, mode, &mut interpreter, true);
    }
}

/// Returns the process exit code on failure.
fn run(
    name: &str,
    source: &str,
    mode: &Mode,
    interpreter: &mut Interpreter,
    echo: bool,
) -> Result<(), i32> {
    let result = match mode {
        Mode::Run => rbasic::run(name, source, interpreter).map(|value| {
            if echo {
                println!("{}", value.repr());
            }
        }),
        Mode::Tokens => scanner::scan_tokens(name, source).map(|tokens| {
            let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            println!("[{}]", rendered.join(", "));
        }),
        Mode::Ast => scanner::scan_tokens(name, source)
            .and_then(|tokens| parser::parse(&tokens))
            .map(|program| println!("{}", program.accept(&mut AstPrinter {}))),
    };
    result.map_err(|err| {
        eprintln!("{}", err.render());
        match err.stage() {
            Stage::Lex | Stage::Syntax => 65,
            Stage::Runtime => 70,
        }
    })
}
