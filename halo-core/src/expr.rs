//! Constrained arithmetic expression evaluator.
//!
//! Topology documents, density PDFs, weight maps and distance-field operator
//! strings all carry small numeric expressions. They are parsed once into an
//! AST and evaluated against a read-only variable scope; the namespace is
//! limited to numeric helpers (no filesystem, process or import capability),
//! which is what makes user-supplied topology logic safe to run.
//!
//! Supported syntax: `+ - * / % ^` (with `^` right-associative and binding
//! tighter than unary minus, so `-x^2` is `-(x^2)`), parentheses, numeric
//! literals, variables, and calls to the math helpers listed in
//! [`call_builtin`]. The signed-distance helpers
//! (`sphere`, `box`, `torus`, `union`, `inter`, `sub`) read the sample
//! position from the `x`/`y`/`z` scope variables.

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum ExprError {
    /// The source text could not be tokenized or parsed.
    Parse(String),
    /// Evaluation hit an unknown variable or function.
    Eval(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "expression parse error: {msg}"),
            Self::Eval(msg) => write!(f, "expression eval error: {msg}"),
        }
    }
}

impl std::error::Error for ExprError {}

/// Read-only variable lookup used during evaluation.
pub trait Scope {
    fn get(&self, name: &str) -> Option<f64>;
}

impl<'a> Scope for [(&'a str, f64)] {
    fn get(&self, name: &str) -> Option<f64> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

impl<'a, const N: usize> Scope for [(&'a str, f64); N] {
    fn get(&self, name: &str) -> Option<f64> {
        Scope::get(self.as_slice(), name)
    }
}

impl Scope for std::collections::HashMap<String, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        Self::get(self, name).copied()
    }
}

/// Chains two scopes, trying `first` before `second`.
pub struct Chain<'a, A: Scope + ?Sized, B: Scope + ?Sized> {
    pub first: &'a A,
    pub second: &'a B,
}

impl<A: Scope + ?Sized, B: Scope + ?Sized> Scope for Chain<'_, A, B> {
    fn get(&self, name: &str) -> Option<f64> {
        self.first.get(name).or_else(|| self.second.get(name))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Ast {
    Num(f64),
    Var(String),
    Unary(Box<Ast>),
    Binary(char, Box<Ast>, Box<Ast>),
    Call(String, Vec<Ast>),
}

/// A compiled expression, ready for repeated evaluation.
#[derive(Clone, Debug)]
pub struct Expr {
    ast: Ast,
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(ExprError::Parse(format!(
                "unexpected trailing input at token {}",
                parser.pos
            )));
        }
        Ok(Self { ast })
    }

    pub fn eval(&self, scope: &dyn Scope) -> Result<f64, ExprError> {
        eval_node(&self.ast, scope)
    }
}

/// Evaluates `source` against `scope` with the renderer's forgiving error
/// policy: an empty/blank expression is worth 1.0, any parse or eval
/// failure is worth 0.0.
pub fn eval_or_zero(source: &str, scope: &dyn Scope) -> f64 {
    if source.trim().is_empty() {
        return 1.0;
    }
    match Expr::parse(source) {
        Ok(expr) => expr.eval(scope).unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut out = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation.
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::Parse(format!("bad number literal `{text}`")))?;
                out.push(Token::Num(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                out.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                // Python-style `**` power is accepted as an alias for `^`.
                if c == '*' && i + 1 < chars.len() && chars[i + 1] == '*' {
                    out.push(Token::Op('^'));
                    i += 2;
                } else {
                    out.push(Token::Op(c));
                    i += 1;
                }
            }
            '(' => {
                out.push(Token::LParen);
                i += 1;
            }
            ')' => {
                out.push(Token::RParen);
                i += 1;
            }
            ',' => {
                out.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(ExprError::Parse(format!("unexpected character `{other}`")));
            }
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token) -> Result<(), ExprError> {
        match self.bump() {
            Some(t) if t == token => Ok(()),
            other => Err(ExprError::Parse(format!(
                "expected {token:?}, found {other:?}"
            ))),
        }
    }

    fn parse_expr(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Ast::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Ast::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // Power binds tighter than unary minus (`-x^y` is `-(x^y)`), while the
    // exponent may itself be signed (`x^-y`); recursing through the unary
    // level in the exponent also makes `^` right associative.
    fn parse_unary(&mut self) -> Result<Ast, ExprError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Ast::Unary(Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Ast, ExprError> {
        let base = self.parse_primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Ast::Binary('^', Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Ast, ExprError> {
        match self.bump() {
            Some(Token::Num(value)) => Ok(Ast::Num(value)),
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            match self.peek() {
                                Some(Token::Comma) => {
                                    self.pos += 1;
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Ast::Call(name, args))
                } else {
                    Ok(Ast::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExprError::Parse(format!(
                "expected a value, found {other:?}"
            ))),
        }
    }
}

fn eval_node(ast: &Ast, scope: &dyn Scope) -> Result<f64, ExprError> {
    match ast {
        Ast::Num(value) => Ok(*value),
        Ast::Var(name) => match name.as_str() {
            "pi" => Ok(std::f64::consts::PI),
            "tau" => Ok(std::f64::consts::TAU),
            "e" => Ok(std::f64::consts::E),
            _ => scope
                .get(name)
                .ok_or_else(|| ExprError::Eval(format!("unknown variable `{name}`"))),
        },
        Ast::Unary(inner) => Ok(-eval_node(inner, scope)?),
        Ast::Binary(op, lhs, rhs) => {
            let a = eval_node(lhs, scope)?;
            let b = eval_node(rhs, scope)?;
            Ok(match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => a / b,
                '%' => a % b,
                '^' => a.powf(b),
                _ => unreachable!("parser only emits known operators"),
            })
        }
        Ast::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_node(arg, scope)?);
            }
            call_builtin(name, &values, scope)
        }
    }
}

fn arg(values: &[f64], index: usize, name: &str) -> Result<f64, ExprError> {
    values
        .get(index)
        .copied()
        .ok_or_else(|| ExprError::Eval(format!("`{name}` is missing argument {index}")))
}

/// Dispatches a call to one of the allowed numeric helpers.
///
/// The signed-distance helpers read the sample position from the scope so
/// that `df_ops` strings like `sub(sphere(1.0), box(0.6,0.6,0.6))` stay
/// plain compositions of scalars.
fn call_builtin(name: &str, values: &[f64], scope: &dyn Scope) -> Result<f64, ExprError> {
    let a = |i: usize| arg(values, i, name);
    Ok(match name {
        "sin" => a(0)?.sin(),
        "cos" => a(0)?.cos(),
        "tan" => a(0)?.tan(),
        "asin" => a(0)?.asin(),
        "acos" => a(0)?.acos(),
        "atan" => a(0)?.atan(),
        "atan2" => a(0)?.atan2(a(1)?),
        "sinh" => a(0)?.sinh(),
        "cosh" => a(0)?.cosh(),
        "tanh" => a(0)?.tanh(),
        "sqrt" => a(0)?.sqrt(),
        "abs" => a(0)?.abs(),
        "exp" => a(0)?.exp(),
        "log" => a(0)?.ln(),
        "log10" => a(0)?.log10(),
        "pow" => a(0)?.powf(a(1)?),
        "floor" => a(0)?.floor(),
        "ceil" => a(0)?.ceil(),
        "round" => a(0)?.round(),
        "sign" => a(0)?.signum(),
        "hypot" => a(0)?.hypot(a(1)?),
        "min" => a(0)?.min(a(1)?),
        "max" => a(0)?.max(a(1)?),
        "clamp" => a(0)?.clamp(a(1)?, a(2)?),
        "union" => a(0)?.min(a(1)?),
        "inter" => a(0)?.max(a(1)?),
        "sub" => a(0)?.max(-a(1)?),
        "sphere" | "box" | "torus" => {
            let x = scope.get("x").unwrap_or(0.0);
            let y = scope.get("y").unwrap_or(0.0);
            let z = scope.get("z").unwrap_or(0.0);
            match name {
                "sphere" => (x * x + y * y + z * z).sqrt() - a(0)?,
                "box" => {
                    let dx = x.abs() - a(0)?;
                    let dy = y.abs() - a(1)?;
                    let dz = z.abs() - a(2)?;
                    let outside =
                        (dx.max(0.0).powi(2) + dy.max(0.0).powi(2) + dz.max(0.0).powi(2)).sqrt();
                    let inside = dx.max(dy.max(dz)).min(0.0);
                    outside + inside
                }
                _ => {
                    let q = (x * x + z * z).sqrt() - a(0)?;
                    (q * q + y * y).sqrt() - a(1)?
                }
            }
        }
        other => {
            return Err(ExprError::Eval(format!("unknown function `{other}`")));
        }
    })
}
