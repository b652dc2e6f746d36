use crate::ast::Node;
use crate::environment::Environment;
use std::fmt;
use std::rc::Rc;
use strum_macros::{Display, EnumIter, IntoStaticStr};

pub enum Function {
    User(UserFunction),
    Builtin(Builtin),
}

pub struct UserFunction {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
    pub closure: Environment,
}

/// The native operations. The serialized name is the global each one is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Display, EnumIter, IntoStaticStr)]
pub enum Builtin {
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "print_ret")]
    PrintRet,
    #[strum(serialize = "input")]
    Input,
    #[strum(serialize = "input_int")]
    InputInt,
}

impl Builtin {
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Builtin::Print | Builtin::PrintRet => &["value"],
            Builtin::Input | Builtin::InputInt => &[],
        }
    }
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::User(f) => f.name.as_deref().unwrap_or("<anonymous>"),
            Function::Builtin(b) => {
                let name: &'static str = (*b).into();
                name
            }
        }
    }

    pub fn params(&self) -> Vec<&str> {
        match self {
            Function::User(f) => f.params.iter().map(String::as_str).collect(),
            Function::Builtin(b) => b.params().to_vec(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::User(f) => f.params.len(),
            Function::Builtin(b) => b.params().len(),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure can contain this function, so it is left out.
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("params", &self.params())
            .finish()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User(_) => write!(f, "<function {}>", self.name()),
            Function::Builtin(_) => write!(f, "<built-in function {}>", self.name()),
        }
    }
}
