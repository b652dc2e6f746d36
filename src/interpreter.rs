use crate::ast::{BinaryOperator, Node, NodeKind, UnaryOperator, Visitor};
use crate::builtins;
use crate::callable::{Function, UserFunction};
use crate::context::Context;
use crate::environment::Environment;
use crate::error::{Error, ErrorKind};
use crate::host::Host;
use crate::position::Span;
use crate::value::{Value, ValueKind};
use std::mem;
use std::rc::Rc;

type EvalResult = Result<Value, Error>;

/// Tree-walking evaluator. `environment` and `context` always describe the innermost
/// frame being evaluated; calls swap them out and restore them afterwards.
pub struct Interpreter<'h> {
    pub environment: Environment,
    context: Rc<Context>,
    host: &'h mut dyn Host,
}

impl<'h> Visitor<Node, EvalResult> for Interpreter<'h> {
    fn visit(&mut self, node: &Node) -> EvalResult {
        match &node.kind {
            NodeKind::Number(x) => Ok(self.tag(Value::new(ValueKind::Number(*x)), node)),
            NodeKind::String(x) => Ok(self.tag(Value::string(x), node)),
            NodeKind::VarAccess(name) => match self.environment.get(name) {
                Some(value) => Ok(value.with_span(node.span.clone())),
                None => Err(self.error(ErrorKind::NameNotDefined(name.clone()), &node.span)),
            },
            NodeKind::VarAssign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.define(name, value.clone());
                Ok(value)
            }
            NodeKind::BinaryOp {
                left,
                operator,
                right,
            } => {
                let lv = self.evaluate(left)?;
                let rv = self.evaluate(right)?;
                let result = match operator {
                    BinaryOperator::Add => lv.added_to(&rv),
                    BinaryOperator::Subtract => lv.subtracted_by(&rv),
                    BinaryOperator::Multiply => lv.multiplied_by(&rv),
                    BinaryOperator::Divide => lv.divided_by(&rv),
                    BinaryOperator::Power => lv.powed_by(&rv),
                    BinaryOperator::Equal => lv.compared_eq(&rv),
                    BinaryOperator::NotEqual => lv.compared_ne(&rv),
                    BinaryOperator::Less => lv.compared_lt(&rv),
                    BinaryOperator::LessEqual => lv.compared_lte(&rv),
                    BinaryOperator::Greater => lv.compared_gt(&rv),
                    BinaryOperator::GreaterEqual => lv.compared_gte(&rv),
                    BinaryOperator::And => lv.anded_by(&rv),
                    BinaryOperator::Or => lv.ored_by(&rv),
                };
                match result {
                    Ok(value) => Ok(self.tag(value, node)),
                    // The divisor is to blame for a division by zero.
                    Err(ErrorKind::DivisionByZero) => {
                        Err(self.error(ErrorKind::DivisionByZero, &right.span))
                    }
                    Err(kind) => Err(self.error(kind, &node.span)),
                }
            }
            NodeKind::UnaryOp { operator, operand } => {
                let value = self.evaluate(operand)?;
                let result = match operator {
                    UnaryOperator::Plus => Ok(value),
                    UnaryOperator::Minus => value.multiplied_by(&Value::int(-1)),
                    UnaryOperator::Not => value.notted(),
                };
                match result {
                    Ok(value) => Ok(self.tag(value, node)),
                    Err(kind) => Err(self.error(kind, &node.span)),
                }
            }
            NodeKind::If { cases, else_case } => {
                for (condition, expr) in cases {
                    if self.evaluate(condition)?.is_true() {
                        return self.evaluate(expr);
                    }
                }
                match else_case {
                    Some(expr) => self.evaluate(expr),
                    None => Ok(self.tag(Value::null(), node)),
                }
            }
            NodeKind::For {
                var_name,
                start,
                end,
                step,
                body,
            } => {
                let from = self.loop_bound(start, "start")?;
                let to = self.loop_bound(end, "end")?;
                let by = match step {
                    Some(step) => match self.loop_bound(step, "step")? {
                        0 => {
                            return Err(self.error(
                                ErrorKind::InvalidLoopBound("step must not be zero".to_string()),
                                &step.span,
                            ))
                        }
                        by => by,
                    },
                    None => 1,
                };
                tracing::debug!(var = %var_name, from, to, by, "for loop");
                let mut i = from;
                while (by > 0 && i < to) || (by < 0 && i > to) {
                    let counter = self.tag(Value::int(i), node);
                    self.environment.define(var_name, counter);
                    self.evaluate(body)?;
                    i = match i.checked_add(by) {
                        Some(next) => next,
                        None => break,
                    };
                }
                Ok(self.tag(Value::null(), node))
            }
            NodeKind::While { condition, body } => {
                while self.evaluate(condition)?.is_true() {
                    self.evaluate(body)?;
                }
                Ok(self.tag(Value::null(), node))
            }
            NodeKind::FuncDef { name, params, body } => {
                let function = Function::User(UserFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: self.environment.clone(),
                });
                let value = self.tag(Value::function(function), node);
                if let Some(name) = name {
                    self.environment.define(name, value.clone());
                }
                Ok(value)
            }
            NodeKind::Call { callee, arguments } => {
                let callee_value = self.evaluate(callee)?;
                let mut evaluated_arguments: Vec<Value> = Vec::new();
                for argument in arguments {
                    evaluated_arguments.push(self.evaluate(argument)?);
                }
                let function = match &callee_value.kind {
                    ValueKind::Function(function) => Rc::clone(function),
                    _ => {
                        let kind = ErrorKind::IllegalOperation(format!(
                            "{} is not callable",
                            callee_value.type_name()
                        ));
                        return Err(self.error(kind, &callee.span));
                    }
                };
                let result = self.call(&function, evaluated_arguments, node)?;
                Ok(self.tag(result, node))
            }
        }
    }
}

impl<'h> Interpreter<'h> {
    pub fn new(environment: Environment, host: &'h mut dyn Host) -> Interpreter<'h> {
        Interpreter {
            environment,
            context: Context::root("<program>"),
            host,
        }
    }
    pub fn interpret(&mut self, program: &Node) -> EvalResult {
        self.evaluate(program)
    }
    fn evaluate(&mut self, node: &Node) -> EvalResult {
        node.accept(self)
    }
    #[tracing::instrument(level = "debug", skip_all, fields(function = %function.name()))]
    fn call(&mut self, function: &Function, arguments: Vec<Value>, node: &Node) -> EvalResult {
        if arguments.len() != function.arity() {
            let kind = ErrorKind::ArityMismatch {
                name: function.name().to_string(),
                expected: function.arity(),
                received: arguments.len(),
            };
            return Err(self.error(kind, &node.span));
        }
        let context = Context::child(&self.context, function.name(), node.span.start.clone());
        let mut environment = match function {
            Function::User(f) => f.closure.new_child(),
            Function::Builtin(_) => self.environment.new_child(),
        };
        for (param, value) in function.params().into_iter().zip(arguments) {
            environment.define(param, value);
        }
        tracing::trace!(depth = context.depth(), scopes = environment.depth(), "entering call");
        match function {
            Function::User(f) => self.execute_body(&f.body, environment, context),
            Function::Builtin(builtin) => {
                builtins::execute(*builtin, &environment, &mut *self.host)
                    .map(|value| value.with_context(&context))
                    .map_err(|kind| Error::runtime(kind, node.span.clone(), &context))
            }
        }
    }
    fn execute_body(
        &mut self,
        body: &Node,
        environment: Environment,
        context: Rc<Context>,
    ) -> EvalResult {
        let previous_environment = mem::replace(&mut self.environment, environment);
        let previous_context = mem::replace(&mut self.context, context);
        let result = self.evaluate(body);
        self.environment = previous_environment;
        self.context = previous_context;
        result
    }
    fn loop_bound(&mut self, node: &Node, what: &str) -> Result<i64, Error> {
        let value = self.evaluate(node)?;
        match value.as_number().and_then(|n| n.as_integral()) {
            Some(x) => Ok(x),
            None => {
                let kind = ErrorKind::InvalidLoopBound(format!(
                    "{} must be an integer, got {}",
                    what,
                    value.repr()
                ));
                Err(self.error(kind, &node.span))
            }
        }
    }
    fn tag(&self, value: Value, node: &Node) -> Value {
        value
            .with_span(node.span.clone())
            .with_context(&self.context)
    }
    fn error(&self, kind: ErrorKind, span: &Span) -> Error {
        Error::runtime(kind, span.clone(), &self.context)
    }
}

#[cfg(test)]
mod interpreter_tests {
    use super::Interpreter;
    use crate::builtins::global_environment;
    use crate::error::{Error, ErrorKind, Stage};
    use crate::host::BufferHost;
    use crate::parser::parse;
    use crate::scanner::scan_tokens;
    use crate::value::{Number, Value};
    use pretty_assertions::assert_eq;

    fn eval_all(sources: &[&str]) -> Result<Value, Error> {
        let mut host = BufferHost::new();
        let mut interpreter = Interpreter::new(global_environment(), &mut host);
        let mut last = Ok(Value::null());
        for source in sources {
            let program = parse(&scan_tokens("<test>", source)?)?;
            last = interpreter.interpret(&program);
            if last.is_err() {
                break;
            }
        }
        last
    }

    fn number(source: &str) -> Number {
        eval_all(&[source]).unwrap().as_number().unwrap()
    }

    fn runtime_error(sources: &[&str]) -> ErrorKind {
        let err = eval_all(sources).unwrap_err();
        assert_eq!(err.stage(), Stage::Runtime);
        assert!(err.context.is_some());
        err.kind
    }

    #[test]
    fn arithmetic() {
        assert_eq!(number("1 + 2 * 3"), Number::Int(7));
        assert_eq!(number("2 ^ 3 ^ 2"), Number::Int(512));
        assert_eq!(number("(1 + 2) * -3"), Number::Int(-9));
        assert_eq!(number("7 / 2"), Number::Float(3.5));
        assert_eq!(number("+4"), Number::Int(4));
    }

    #[test]
    fn variables() {
        let value = eval_all(&["VAR x = 5", "x"]).unwrap();
        assert_eq!(value.as_number(), Some(Number::Int(5)));
        let value = eval_all(&["VAR x = 5", "VAR x = x + 1"]).unwrap();
        assert_eq!(value.as_number(), Some(Number::Int(6)));
        assert_eq!(
            runtime_error(&["y"]),
            ErrorKind::NameNotDefined("y".to_string())
        );
    }

    #[test]
    fn access_tags_with_access_span() {
        let mut host = BufferHost::new();
        let mut interpreter = Interpreter::new(global_environment(), &mut host);
        let program = parse(&scan_tokens("<test>", "VAR x = 5").unwrap()).unwrap();
        interpreter.interpret(&program).unwrap();
        let program = parse(&scan_tokens("<test>", "  x").unwrap()).unwrap();
        let value = interpreter.interpret(&program).unwrap();
        assert_eq!(value.span.unwrap().start.column, 2);
    }

    #[test]
    fn division_by_zero() {
        let err = eval_all(&["1 / 0"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.span.text(), "0");
    }

    #[test]
    fn type_mismatch() {
        assert!(matches!(
            runtime_error(&["\"a\" - 1"]),
            ErrorKind::IllegalOperation(_)
        ));
        assert!(matches!(runtime_error(&["5(1)"]), ErrorKind::IllegalOperation(_)));
    }

    #[test]
    fn conditionals() {
        assert_eq!(number("IF 0 THEN 1 ELSE 2"), Number::Int(2));
        assert_eq!(number("IF 1 THEN 1 ELIF 1 THEN 2"), Number::Int(1));
        assert_eq!(number("IF 0 THEN 1 ELIF \"x\" THEN 2"), Number::Int(2));
        assert_eq!(number("IF 0 THEN 1"), Number::Int(0));
        // The first matching branch stops evaluation of later conditions.
        assert_eq!(number("IF 1 THEN 1 ELIF 1 / 0 THEN 2"), Number::Int(1));
    }

    #[test]
    fn logic_is_eager() {
        assert_eq!(number("1 AND 2"), Number::Int(1));
        assert_eq!(number("NOT 0"), Number::Int(1));
        assert_eq!(number("0 OR 0"), Number::Int(0));
        assert_eq!(runtime_error(&["0 AND 1 / 0"]), ErrorKind::DivisionByZero);
    }

    #[test]
    fn for_loops() {
        let value = eval_all(&["VAR total = 0", "FOR i = 0 TO 5 THEN VAR total = total + i", "total"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(10)));
        let value = eval_all(&["VAR n = 0", "FOR i = 10 TO 0 STEP -3 THEN VAR n = n + 1", "n"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(4)));
        let value = eval_all(&["FOR i = 0 TO 3 THEN i", "i"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(2)));
        assert!(matches!(
            runtime_error(&["FOR i = 0 TO 1.5 THEN i"]),
            ErrorKind::InvalidLoopBound(_)
        ));
        assert!(matches!(
            runtime_error(&["FOR i = 0 TO 5 STEP 0 THEN i"]),
            ErrorKind::InvalidLoopBound(_)
        ));
    }

    #[test]
    fn while_loops() {
        let value = eval_all(&["VAR x = 0", "WHILE x < 10 THEN VAR x = x + 3", "x"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(12)));
        assert_eq!(
            runtime_error(&["VAR x = 2", "WHILE 1 THEN VAR x = 1 / (x - 1)"]),
            ErrorKind::DivisionByZero
        );
    }

    #[test]
    fn functions() {
        let value = eval_all(&["FUN add(a, b) -> a + b", "add(2, 3)"]).unwrap();
        assert_eq!(value.as_number(), Some(Number::Int(5)));
        assert_eq!(
            runtime_error(&["FUN add(a, b) -> a + b", "add(1)"]),
            ErrorKind::ArityMismatch {
                name: "add".to_string(),
                expected: 2,
                received: 1
            }
        );
        let value = eval_all(&["VAR sq = FUN (x) -> x * x", "sq(9)"]).unwrap();
        assert_eq!(value.as_number(), Some(Number::Int(81)));
    }

    #[test]
    fn recursion_and_closures() {
        let value = eval_all(&[
            "FUN fact(n) -> IF n <= 1 THEN 1 ELSE n * fact(n - 1)",
            "fact(10)",
        ]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(3628800)));
        let value = eval_all(&["FUN adder(n) -> FUN (x) -> x + n", "VAR add5 = adder(5)", "add5(2)"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(7)));
    }

    #[test]
    fn assignment_in_call_shadows() {
        let value = eval_all(&["VAR x = 1", "FUN f() -> VAR x = 99", "f()", "x"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(1)));
    }

    #[test]
    fn rebinding_a_function_name() {
        let value = eval_all(&["FUN f() -> 1", "FUN f() -> 2", "f()"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(2)));
        let value = eval_all(&["VAR h = FUN (x) -> x", "VAR h = 5", "h"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(5)));
    }

    #[test]
    fn named_function_in_loop_body() {
        let value = eval_all(&["FOR i = 0 TO 3 THEN FUN g() -> i", "g()"]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(2)));
        let value = eval_all(&[
            "VAR n = 0",
            "WHILE n < 3 THEN VAR n = (FUN step() -> n + 1)()",
            "n",
        ]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(3)));
    }

    #[test]
    fn for_counter_carries_loop_span() {
        let mut host = BufferHost::new();
        let mut interpreter = Interpreter::new(global_environment(), &mut host);
        let program = parse(&scan_tokens("<test>", "FOR i = 0 TO 2 THEN i").unwrap()).unwrap();
        interpreter.interpret(&program).unwrap();
        let counter = interpreter.environment.get("i").unwrap();
        assert_eq!(counter.as_number(), Some(Number::Int(1)));
        assert_eq!(counter.span.unwrap().text(), "FOR i = 0 TO 2 THEN i");
    }

    #[test]
    fn oversized_string_repetition_is_an_error() {
        assert!(matches!(
            runtime_error(&["\"abc\" * 9223372036854775807"]),
            ErrorKind::IllegalOperation(_)
        ));
    }

    #[test]
    fn lexical_not_dynamic_scope() {
        let value = eval_all(&[
            "VAR y = 1",
            "FUN get() -> y",
            "FUN caller(y) -> get()",
            "caller(50)",
        ]);
        assert_eq!(value.unwrap().as_number(), Some(Number::Int(1)));
    }

    #[test]
    fn call_errors_carry_traceback() {
        let err = eval_all(&["FUN f(x) -> x / 0", "f(1)"]).unwrap_err();
        let context = err.context.as_ref().unwrap();
        assert_eq!(context.display_name, "f");
        assert_eq!(context.depth(), 2);
        assert!(err.render().contains("in f\n"));
    }

    #[test]
    fn builtins() {
        let mut host = BufferHost::with_input(&["world", "x", "3"]);
        {
            let mut interpreter = Interpreter::new(global_environment(), &mut host);
            for source in &[
                "print(\"hi\")",
                "VAR name = input()",
                "print(\"hello \" + name)",
                "print(input_int() * 2)",
                "print(print_ret(1.5) + \"!\")",
            ] {
                let program = parse(&scan_tokens("<test>", source).unwrap()).unwrap();
                interpreter.interpret(&program).unwrap();
            }
        }
        assert_eq!(
            host.output(),
            &[
                "hi".to_string(),
                "hello world".to_string(),
                "'x' must be an integer. Try again!".to_string(),
                "6".to_string(),
                "1.5!".to_string(),
            ][..]
        );
    }
}
