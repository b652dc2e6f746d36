use crate::position::Span;
use crate::value::Number;
use std::rc::Rc;
use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")] Add,
    #[strum(serialize = "-")] Subtract,
    #[strum(serialize = "*")] Multiply,
    #[strum(serialize = "/")] Divide,
    #[strum(serialize = "^")] Power,
    #[strum(serialize = "==")] Equal,
    #[strum(serialize = "!=")] NotEqual,
    #[strum(serialize = "<")] Less,
    #[strum(serialize = "<=")] LessEqual,
    #[strum(serialize = ">")] Greater,
    #[strum(serialize = ">=")] GreaterEqual,
    #[strum(serialize = "AND")] And,
    #[strum(serialize = "OR")] Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "NOT")]
    Not,
}

#[derive(Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum NodeKind {
    Number(Number),
    String(String),
    VarAccess(String),
    VarAssign {
        name: String,
        value: Box<Node>,
    },
    BinaryOp {
        left: Box<Node>,
        operator: BinaryOperator,
        right: Box<Node>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    If {
        cases: Vec<(Node, Node)>,
        else_case: Option<Box<Node>>,
    },
    For {
        var_name: String,
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    FuncDef {
        name: Option<String>,
        params: Vec<String>,
        // Shared with every function value created from this definition.
        body: Rc<Node>,
    },
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Node {
        Node { kind, span }
    }

    pub fn accept<T>(&self, v: &mut dyn Visitor<Node, T>) -> T {
        v.visit(self)
    }
}

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

/// Renders a tree as nested s-expressions, e.g. `(+ 1 (* 2 3))`.
pub struct AstPrinter {}

impl AstPrinter {
    fn parenthesize(&mut self, name: &str, args: Vec<&Node>) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(arg.accept(self).as_str());
        }
        x.push(')');
        x
    }
}

impl Visitor<Node, String> for AstPrinter {
    fn visit(&mut self, n: &Node) -> String {
        match &n.kind {
            NodeKind::Number(x) => x.to_string(),
            NodeKind::String(x) => format!("{:?}", x),
            NodeKind::VarAccess(x) => x.clone(),
            NodeKind::VarAssign { name, value } => {
                format!("(VAR {} {})", name, value.accept(self))
            }
            NodeKind::BinaryOp {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.to_string(), vec![left.as_ref(), right.as_ref()]),
            NodeKind::UnaryOp { operator, operand } => {
                self.parenthesize(&operator.to_string(), vec![operand.as_ref()])
            }
            NodeKind::If { cases, else_case } => {
                let mut x = String::from("(IF");
                for (condition, expr) in cases {
                    x.push_str(&format!(" [{} {}]", condition.accept(self), expr.accept(self)));
                }
                if let Some(else_case) = else_case {
                    x.push_str(&format!(" [ELSE {}]", else_case.accept(self)));
                }
                x.push(')');
                x
            }
            NodeKind::For {
                var_name,
                start,
                end,
                step,
                body,
            } => {
                let step = match step {
                    Some(step) => step.accept(self),
                    None => String::from("1"),
                };
                format!(
                    "(FOR {} {} {} {} {})",
                    var_name,
                    start.accept(self),
                    end.accept(self),
                    step,
                    body.accept(self)
                )
            }
            NodeKind::While { condition, body } => {
                self.parenthesize("WHILE", vec![condition.as_ref(), body.as_ref()])
            }
            NodeKind::FuncDef { name, params, body } => format!(
                "(FUN {} ({}) {})",
                name.as_deref().unwrap_or("<anonymous>"),
                params.join(" "),
                body.accept(self)
            ),
            NodeKind::Call { callee, arguments } => {
                let mut args = vec![callee.as_ref()];
                args.extend(arguments.iter());
                self.parenthesize("call", args)
            }
        }
    }
}
