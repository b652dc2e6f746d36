use crate::ast::{BinaryOperator, Node, NodeKind, UnaryOperator};
use crate::error::{Error, ErrorKind};
use crate::token::{Keyword, Token, TokenType};
use crate::value::Number;
use std::rc::Rc;

type ParseResult = Result<Node, Error>;

const EXPECTED_EXPRESSION: &str =
    "Expected 'VAR', 'IF', 'FOR', 'WHILE', 'FUN', int, float, identifier, '+', '-', '(' or 'NOT'";
const EXPECTED_OPERAND: &str =
    "Expected int, float, identifier, '+', '-', '(', 'IF', 'FOR', 'WHILE', 'FUN' or 'NOT'";
const EXPECTED_ATOM: &str =
    "Expected int, float, identifier, '+', '-', '(', 'IF', 'FOR', 'WHILE' or 'FUN'";
const EXPECTED_ARGUMENT: &str =
    "Expected ')', 'VAR', 'IF', 'FOR', 'WHILE', 'FUN', int, float, identifier, '+', '-', '(' or 'NOT'";
const EXPECTED_OPERATOR: &str =
    "Expected '+', '-', '*', '/', '^', '==', '!=', '<', '>', '<=', '>=', 'AND' or 'OR'";

/// Parses a whole token stream, as produced by `scan_tokens`, into one expression.
pub fn parse(tokens: &[Token]) -> ParseResult {
    Parser::new(tokens).parse()
}

/// Recursive descent over a token slice that ends with EOF.
///
/// Rules never backtrack, so the number of tokens a rule consumed is the distance between
/// `current` and the index it started at. A rule may swap a sub-rule's error for its own
/// "expected ..." message only when that distance is zero; otherwise the deepest error wins.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser { tokens, current: 0 }
    }
    pub fn parse(&mut self) -> ParseResult {
        let node = self.expression()?;
        if !self.is_at_end() {
            return Err(self.error(EXPECTED_OPERATOR));
        }
        tracing::trace!(tokens = self.tokens.len(), "parsed program");
        Ok(node)
    }
    fn expression(&mut self) -> ParseResult {
        if self.peek().tokentype.is_keyword(Keyword::Var) {
            let start = self.advance().span.clone();
            let name = self.identifier("Expected identifier")?;
            self.consume(TokenType::Equal, "Expected '='")?;
            let value = self.expression()?;
            let span = start.to(&value.span);
            return Ok(Node::new(
                NodeKind::VarAssign {
                    name,
                    value: Box::new(value),
                },
                span,
            ));
        }
        self.recover(EXPECTED_EXPRESSION, |p| {
            p.binary(Parser::comparison, logical_operator)
        })
    }
    fn comparison(&mut self) -> ParseResult {
        if self.peek().tokentype.is_keyword(Keyword::Not) {
            let start = self.advance().span.clone();
            let operand = self.comparison()?;
            let span = start.to(&operand.span);
            return Ok(Node::new(
                NodeKind::UnaryOp {
                    operator: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.recover(EXPECTED_OPERAND, |p| {
            let left = p.arithmetic()?;
            match comparison_operator(&p.peek().tokentype) {
                Some(op) => {
                    p.advance();
                    let right = p.arithmetic()?;
                    Ok(binary_node(left, op, right))
                }
                None => Ok(left),
            }
        })
    }
    fn arithmetic(&mut self) -> ParseResult {
        self.binary(Parser::term, |t| match t {
            TokenType::Plus => Some(BinaryOperator::Add),
            TokenType::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        })
    }
    fn term(&mut self) -> ParseResult {
        self.binary(Parser::factor, |t| match t {
            TokenType::Star => Some(BinaryOperator::Multiply),
            TokenType::Slash => Some(BinaryOperator::Divide),
            _ => None,
        })
    }
    fn factor(&mut self) -> ParseResult {
        let operator = match self.peek().tokentype {
            TokenType::Plus => UnaryOperator::Plus,
            TokenType::Minus => UnaryOperator::Minus,
            _ => return self.power(),
        };
        let start = self.advance().span.clone();
        let operand = self.factor()?;
        let span = start.to(&operand.span);
        Ok(Node::new(
            NodeKind::UnaryOp {
                operator,
                operand: Box::new(operand),
            },
            span,
        ))
    }
    fn power(&mut self) -> ParseResult {
        let mut expr = self.call()?;
        while let TokenType::Caret = self.peek().tokentype {
            self.advance();
            // A factor on the right makes `^` right-associative and allows `2 ^ -1`.
            let right = self.factor()?;
            expr = binary_node(expr, BinaryOperator::Power, right);
        }
        Ok(expr)
    }
    fn call(&mut self) -> ParseResult {
        let callee = self.atom()?;
        if self.peek().tokentype != TokenType::LeftParen {
            return Ok(callee);
        }
        self.advance();
        let mut arguments = Vec::new();
        if self.peek().tokentype != TokenType::RightParen {
            arguments.push(self.recover(EXPECTED_ARGUMENT, Parser::expression)?);
            while let TokenType::Comma = self.peek().tokentype {
                self.advance();
                arguments.push(self.expression()?);
            }
        }
        let end = self.consume(TokenType::RightParen, "Expected ',' or ')'")?;
        let span = callee.span.to(&end.span);
        Ok(Node::new(
            NodeKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            span,
        ))
    }
    fn atom(&mut self) -> ParseResult {
        let token = self.peek();
        let kind = match &token.tokentype {
            TokenType::Int(x) => NodeKind::Number(Number::Int(*x)),
            TokenType::Float(x) => NodeKind::Number(Number::Float(*x)),
            TokenType::Str(x) => NodeKind::String(x.clone()),
            TokenType::Identifier(x) => NodeKind::VarAccess(x.clone()),
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expected ')'")?;
                return Ok(expr);
            }
            TokenType::Keyword(Keyword::If) => return self.if_expr(),
            TokenType::Keyword(Keyword::For) => return self.for_expr(),
            TokenType::Keyword(Keyword::While) => return self.while_expr(),
            TokenType::Keyword(Keyword::Fun) => return self.func_def(),
            _ => return Err(self.error(EXPECTED_ATOM)),
        };
        self.advance();
        Ok(Node::new(kind, token.span.clone()))
    }
    fn if_expr(&mut self) -> ParseResult {
        let start = self.advance().span.clone();
        let mut cases = Vec::new();
        let mut end;
        loop {
            let condition = self.expression()?;
            self.consume_keyword(Keyword::Then, "Expected 'THEN'")?;
            let expr = self.expression()?;
            end = expr.span.clone();
            cases.push((condition, expr));
            if self.peek().tokentype.is_keyword(Keyword::Elif) {
                self.advance();
            } else {
                break;
            }
        }
        let else_case = if self.peek().tokentype.is_keyword(Keyword::Else) {
            self.advance();
            let expr = self.expression()?;
            end = expr.span.clone();
            Some(Box::new(expr))
        } else {
            None
        };
        Ok(Node::new(NodeKind::If { cases, else_case }, start.to(&end)))
    }
    fn for_expr(&mut self) -> ParseResult {
        let start_span = self.advance().span.clone();
        let var_name = self.identifier("Expected identifier")?;
        self.consume(TokenType::Equal, "Expected '='")?;
        let start = self.expression()?;
        self.consume_keyword(Keyword::To, "Expected 'TO'")?;
        let end = self.expression()?;
        let step = if self.peek().tokentype.is_keyword(Keyword::Step) {
            self.advance();
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.consume_keyword(Keyword::Then, "Expected 'THEN'")?;
        let body = self.expression()?;
        let span = start_span.to(&body.span);
        Ok(Node::new(
            NodeKind::For {
                var_name,
                start: Box::new(start),
                end: Box::new(end),
                step,
                body: Box::new(body),
            },
            span,
        ))
    }
    fn while_expr(&mut self) -> ParseResult {
        let start = self.advance().span.clone();
        let condition = self.expression()?;
        self.consume_keyword(Keyword::Then, "Expected 'THEN'")?;
        let body = self.expression()?;
        let span = start.to(&body.span);
        Ok(Node::new(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            span,
        ))
    }
    fn func_def(&mut self) -> ParseResult {
        let start = self.advance().span.clone();
        let name = match &self.peek().tokentype {
            TokenType::Identifier(x) => {
                let name = x.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        let open_message = if name.is_some() {
            "Expected '('"
        } else {
            "Expected identifier or '('"
        };
        self.consume(TokenType::LeftParen, open_message)?;
        let mut params = Vec::new();
        if let TokenType::Identifier(_) = self.peek().tokentype {
            params.push(self.identifier("Expected identifier")?);
            while let TokenType::Comma = self.peek().tokentype {
                self.advance();
                params.push(self.identifier("Expected identifier")?);
            }
            self.consume(TokenType::RightParen, "Expected ',' or ')'")?;
        } else {
            self.consume(TokenType::RightParen, "Expected identifier or ')'")?;
        }
        self.consume(TokenType::Arrow, "Expected '->'")?;
        let body = self.expression()?;
        let span = start.to(&body.span);
        Ok(Node::new(
            NodeKind::FuncDef {
                name,
                params,
                body: Rc::new(body),
            },
            span,
        ))
    }
    /// `operand (operator operand)*`, folded to the left.
    fn binary(
        &mut self,
        operand: fn(&mut Self) -> ParseResult,
        operator: fn(&TokenType) -> Option<BinaryOperator>,
    ) -> ParseResult {
        let mut expr = operand(self)?;
        while let Some(op) = operator(&self.peek().tokentype) {
            self.advance();
            let right = operand(self)?;
            expr = binary_node(expr, op, right);
        }
        Ok(expr)
    }
    /// Runs `rule`; if it fails without consuming anything, reports `message` instead.
    fn recover<F>(&mut self, message: &str, rule: F) -> ParseResult
    where
        F: FnOnce(&mut Self) -> ParseResult,
    {
        let checkpoint = self.current;
        match rule(self) {
            Err(_) if self.current == checkpoint => Err(self.error(message)),
            result => result,
        }
    }
    fn identifier(&mut self, message: &str) -> Result<String, Error> {
        match &self.peek().tokentype {
            TokenType::Identifier(x) => {
                let name = x.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }
    fn consume(&mut self, expected: TokenType, message: &str) -> Result<&'a Token, Error> {
        if self.peek().tokentype == expected {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }
    fn consume_keyword(&mut self, keyword: Keyword, message: &str) -> Result<&'a Token, Error> {
        self.consume(TokenType::Keyword(keyword), message)
    }
    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }
    fn is_at_end(&self) -> bool {
        match self.peek().tokentype {
            TokenType::EOF => true,
            _ => false,
        }
    }
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current]
    }
    fn error(&self, message: &str) -> Error {
        Error::new(
            ErrorKind::InvalidSyntax(message.to_string()),
            self.peek().span.clone(),
        )
    }
}

fn binary_node(left: Node, operator: BinaryOperator, right: Node) -> Node {
    let span = left.span.to(&right.span);
    Node::new(
        NodeKind::BinaryOp {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        },
        span,
    )
}

fn logical_operator(t: &TokenType) -> Option<BinaryOperator> {
    match t {
        TokenType::Keyword(Keyword::And) => Some(BinaryOperator::And),
        TokenType::Keyword(Keyword::Or) => Some(BinaryOperator::Or),
        _ => None,
    }
}

fn comparison_operator(t: &TokenType) -> Option<BinaryOperator> {
    match t {
        TokenType::EqualEqual => Some(BinaryOperator::Equal),
        TokenType::BangEqual => Some(BinaryOperator::NotEqual),
        TokenType::Less => Some(BinaryOperator::Less),
        TokenType::LessEqual => Some(BinaryOperator::LessEqual),
        TokenType::Greater => Some(BinaryOperator::Greater),
        TokenType::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

#[cfg(test)]
mod parser_tests {
    use super::{parse, EXPECTED_ATOM, EXPECTED_EXPRESSION, EXPECTED_OPERATOR};
    use crate::ast::{AstPrinter, Node, NodeKind};
    use crate::error::{Error, ErrorKind};
    use crate::scanner::scan_tokens;
    use pretty_assertions::assert_eq;

    fn parse_source(source: &str) -> Result<Node, Error> {
        parse(&scan_tokens("<test>", source).unwrap())
    }

    fn print(source: &str) -> String {
        parse_source(source).unwrap().accept(&mut AstPrinter {})
    }

    fn syntax_error(source: &str) -> (String, String) {
        let err = parse_source(source).unwrap_err();
        match err.kind {
            ErrorKind::InvalidSyntax(message) => (message, err.span.text().to_string()),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(print("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(print("(1 + 2) * 3"), "(* (+ 1 2) 3)");
        assert_eq!(print("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(print("-2 ^ 2"), "(- (^ 2 2))");
        assert_eq!(print("1 < 2 AND NOT 3 == 4"), "(AND (< 1 2) (NOT (== 3 4)))");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(print("2 ^ 3 ^ 2"), "(^ 2 (^ 3 2))");
        assert_eq!(print("2 ^ -1"), "(^ 2 (- 1))");
    }

    #[test]
    fn control_flow() {
        assert_eq!(
            print("IF x THEN 1 ELIF y THEN 2 ELSE 3"),
            "(IF [x 1] [y 2] [ELSE 3])"
        );
        assert_eq!(print("FOR i = 0 TO 10 THEN i"), "(FOR i 0 10 1 i)");
        assert_eq!(print("FOR i = 10 TO 0 STEP -2 THEN i"), "(FOR i 10 0 (- 2) i)");
        assert_eq!(print("WHILE x < 3 THEN VAR x = x + 1"), "(WHILE (< x 3) (VAR x (+ x 1)))");
    }

    #[test]
    fn functions_and_calls() {
        assert_eq!(print("FUN add(a, b) -> a + b"), "(FUN add (a b) (+ a b))");
        assert_eq!(print("FUN () -> 1"), "(FUN <anonymous> () 1)");
        assert_eq!(print("add(1, 2 * 3)"), "(call add 1 (* 2 3))");
        assert_eq!(print("f()"), "(call f)");
        assert_eq!(print("(FUN (x) -> x)(7)"), "(call (FUN <anonymous> (x) x) 7)");
    }

    #[test]
    fn node_spans_enclose_children() {
        let node = parse_source("VAR total = 1 + 2").unwrap();
        assert_eq!(node.span.text(), "VAR total = 1 + 2");
        if let NodeKind::VarAssign { value, .. } = &node.kind {
            assert_eq!(value.span.text(), "1 + 2");
        } else {
            panic!("expected an assignment");
        }
        assert_eq!(parse_source("f(1, 2)").unwrap().span.text(), "f(1, 2)");
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "FUN f(a) -> IF a THEN a * 2 ELSE f(a + 1)";
        assert_eq!(parse_source(source).unwrap(), parse_source(source).unwrap());
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert_eq!(syntax_error("1 2"), (EXPECTED_OPERATOR.to_string(), "2".to_string()));
    }

    #[test]
    fn comparisons_do_not_chain() {
        assert_eq!(syntax_error("1 < 2 < 3"), (EXPECTED_OPERATOR.to_string(), "<".to_string()));
        assert_eq!(syntax_error("1 == 1 == 1"), (EXPECTED_OPERATOR.to_string(), "==".to_string()));
        assert_eq!(print("1 < 2 AND 2 < 3"), "(AND (< 1 2) (< 2 3))");
        assert_eq!(print("NOT 1 < 2"), "(NOT (< 1 2))");
    }

    #[test]
    fn zero_consumption_errors_are_replaced() {
        assert_eq!(syntax_error("*").0, EXPECTED_EXPRESSION);
        assert_eq!(syntax_error(")").0, EXPECTED_EXPRESSION);
    }

    #[test]
    fn consuming_errors_are_kept() {
        // `1 +` consumed tokens before the operand went missing.
        assert_eq!(syntax_error("1 +").0, EXPECTED_ATOM);
        assert_eq!(syntax_error("(1 + 2").0, "Expected ')'");
        assert_eq!(syntax_error("VAR = 1").0, "Expected identifier");
        assert_eq!(syntax_error("VAR x 1").0, "Expected '='");
        assert_eq!(syntax_error("IF 1 2").0, "Expected 'THEN'");
        assert_eq!(syntax_error("FOR i = 1 THEN 2").0, "Expected 'TO'");
        assert_eq!(syntax_error("FUN f(a b) -> a").0, "Expected ',' or ')'");
        assert_eq!(syntax_error("FUN f(a) a").0, "Expected '->'");
        assert_eq!(syntax_error("FUN 1").0, "Expected identifier or '('");
        assert_eq!(syntax_error("f(1 2)").0, "Expected ',' or ')'");
    }
}
