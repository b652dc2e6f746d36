use crate::callable::{Builtin, Function};
use crate::environment::Environment;
use crate::error::ErrorKind;
use crate::host::Host;
use crate::value::Value;
use strum::IntoEnumIterator;

/// A fresh root environment holding the constants and every built-in function.
pub fn global_environment() -> Environment {
    let mut env = Environment::new();
    env.define("null", Value::null());
    env.define("True", Value::int(1));
    env.define("False", Value::int(0));
    for builtin in Builtin::iter() {
        env.define(&builtin.to_string(), Value::function(Function::Builtin(builtin)));
    }
    env
}

/// Runs `builtin` with its arguments already bound by parameter name in `env`.
pub fn execute(builtin: Builtin, env: &Environment, host: &mut dyn Host) -> Result<Value, ErrorKind> {
    match builtin {
        Builtin::Print => {
            host.write_line(&argument(env, "value")?.to_string());
            Ok(Value::null())
        }
        Builtin::PrintRet => Ok(Value::string(&argument(env, "value")?.to_string())),
        Builtin::Input => host
            .read_line()
            .map(|line| Value::string(&line))
            .ok_or(ErrorKind::InputUnavailable),
        Builtin::InputInt => loop {
            let line = host.read_line().ok_or(ErrorKind::InputUnavailable)?;
            match line.trim().parse::<i64>() {
                Ok(x) => break Ok(Value::int(x)),
                Err(_) => host.write_line(&format!("'{}' must be an integer. Try again!", line)),
            }
        },
    }
}

fn argument(env: &Environment, name: &str) -> Result<Value, ErrorKind> {
    env.get(name)
        .ok_or_else(|| ErrorKind::NameNotDefined(name.to_string()))
}
