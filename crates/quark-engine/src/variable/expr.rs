//! Formula parsing.
//!
//! Precedence, loosest first: `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, unary `- !`, `^` (right associative).

use smallvec::SmallVec;
use thiserror::Error;

use crate::property::Property;

/// Malformed formula text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A character that cannot start a token.
    #[error("Invalid syntax in variable formula: unexpected '{0}'")]
    UnexpectedChar(char),
    /// A token in the wrong place.
    #[error("Invalid syntax in variable formula: unexpected {0}")]
    UnexpectedToken(String),
    /// The formula ended early.
    #[error("Invalid syntax in variable formula: unexpected end")]
    UnexpectedEnd,
    /// A bracket index that is not a positive integer.
    #[error("Invalid index in variable formula: {0}")]
    BadIndex(String),
    /// An unknown math or group function.
    #[error("Invalid math/group function '{0}' in variable formula")]
    UnknownFunction(String),
    /// A function called with the wrong number of arguments.
    #[error("Invalid argument count for function '{0}' in variable formula")]
    Arity(String),
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// Built-in math functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathFn {
    /// Square root.
    Sqrt,
    /// Exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Base-10 logarithm.
    Log,
    /// Absolute value.
    Abs,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Arc sine.
    Asin,
    /// Arc cosine.
    Acos,
    /// Arc tangent.
    Atan,
    /// Two-argument arc tangent `atan2(y, x)`.
    Atan2,
    /// Round up.
    Ceil,
    /// Round down.
    Floor,
    /// Round to nearest.
    Round,
}

impl MathFn {
    fn parse(name: &str) -> Option<(Self, usize)> {
        use MathFn::*;
        let f = match name {
            "sqrt" => Sqrt,
            "exp" => Exp,
            "ln" => Ln,
            "log" => Log,
            "abs" => Abs,
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "asin" => Asin,
            "acos" => Acos,
            "atan" => Atan,
            "atan2" => Atan2,
            "ceil" => Ceil,
            "floor" => Floor,
            "round" => Round,
            _ => return None,
        };
        Some((f, if f == Atan2 { 2 } else { 1 }))
    }
}

/// Group reductions taking a group ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupFn {
    /// Particle count.
    Count,
    /// Total mass.
    Mass,
}

/// Parsed formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal.
    Number(f64),
    /// Unary operation.
    Unary(UnOp, Box<Expr>),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Math function call.
    Math(MathFn, Vec<Expr>),
    /// Group function call.
    Group(GroupFn, String),
    /// `c_ID` or `c_ID[i]` (1-based).
    Compute(String, Option<usize>),
    /// `f_ID` or `f_ID[i]` (1-based).
    Fix(String, Option<usize>),
    /// `v_name`.
    Variable(String),
    /// Per-particle attribute.
    Property(Property),
    /// Thermo keyword.
    Thermo(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Word(String, Option<usize>),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

const OPERATORS: [&str; 17] = [
    "<=", ">=", "==", "!=", "&&", "||", "+", "-", "*", "/", "%", "^", "<", ">", "!", "=", "&",
];

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal = &text[start..i];
            let value = literal
                .parse()
                .map_err(|_| ExprError::UnexpectedToken(literal.to_string()))?;
            tokens.push(Token::Number(value));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = text[start..i].to_string();
            let mut index = None;
            if i < bytes.len() && bytes[i] == b'[' {
                let close = text[i..]
                    .find(']')
                    .map(|k| i + k)
                    .ok_or(ExprError::UnexpectedEnd)?;
                let inner = &text[i + 1..close];
                let n: usize = inner
                    .trim()
                    .parse()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| ExprError::BadIndex(inner.to_string()))?;
                index = Some(n);
                i = close + 1;
            }
            tokens.push(Token::Word(word, index));
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == ',' {
            tokens.push(Token::Comma);
            i += 1;
        } else {
            let op = OPERATORS
                .iter()
                .find(|op| text[i..].starts_with(**op))
                .ok_or(ExprError::UnexpectedChar(c))?;
            if *op == "=" || *op == "&" {
                return Err(ExprError::UnexpectedChar(c));
            }
            tokens.push(Token::Op(*op));
            i += op.len();
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type Levels = SmallVec<[(&'static str, BinOp); 4]>;

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExprError> {
        let t = self.tokens.get(self.pos).cloned().ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(t)
    }

    fn expect(&mut self, want: &Token) -> Result<(), ExprError> {
        match self.next()? {
            ref t if t == want => Ok(()),
            other => Err(ExprError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    fn levels(depth: usize) -> Option<Levels> {
        use BinOp::*;
        let ops: &[(&'static str, BinOp)] = match depth {
            0 => &[("||", Or)],
            1 => &[("&&", And)],
            2 => &[("==", Eq), ("!=", Ne)],
            3 => &[("<", Lt), ("<=", Le), (">", Gt), (">=", Ge)],
            4 => &[("+", Add), ("-", Sub)],
            5 => &[("*", Mul), ("/", Div), ("%", Mod)],
            _ => return None,
        };
        Some(ops.iter().copied().collect())
    }

    fn binary(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let Some(ops) = Self::levels(depth) else {
            return self.unary();
        };
        let mut lhs = self.binary(depth + 1)?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(sym)) => ops.iter().find(|(s, _)| s == sym).map(|(_, op)| *op),
                _ => None,
            };
            let Some(op) = op else { break };
            self.pos += 1;
            let rhs = self.binary(depth + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Op("-")) => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.unary()?)))
            }
            Some(Token::Op("!")) => {
                self.pos += 1;
                Ok(Expr::Unary(UnOp::Not, Box::new(self.unary()?)))
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if let Some(Token::Op("^")) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.next()? {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::LParen => {
                let inner = self.binary(0)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Word(word, index) => {
                if let Some(Token::LParen) = self.peek() {
                    if index.is_some() {
                        return Err(ExprError::UnexpectedToken(word));
                    }
                    self.pos += 1;
                    return self.call(word);
                }
                Ok(classify(word, index))
            }
            other => Err(ExprError::UnexpectedToken(format!("{other:?}"))),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ExprError> {
        let group = match name.as_str() {
            "count" => Some(GroupFn::Count),
            "mass" => Some(GroupFn::Mass),
            _ => None,
        };
        if let Some(g) = group {
            let id = match self.next()? {
                Token::Word(id, None) => id,
                other => return Err(ExprError::UnexpectedToken(format!("{other:?}"))),
            };
            self.expect(&Token::RParen)?;
            return Ok(Expr::Group(g, id));
        }

        let (f, arity) = MathFn::parse(&name).ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;
        let mut args = Vec::with_capacity(arity);
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.binary(0)?);
                match self.next()? {
                    Token::Comma => continue,
                    Token::RParen => break,
                    other => return Err(ExprError::UnexpectedToken(format!("{other:?}"))),
                }
            }
        } else {
            self.pos += 1;
        }
        if args.len() != arity {
            return Err(ExprError::Arity(name));
        }
        Ok(Expr::Math(f, args))
    }
}

/// Atom vectors recognised as bare words in formulas.
const ATOM_VECTORS: [&str; 14] = [
    "id", "mass", "type", "x", "y", "z", "vx", "vy", "vz", "fx", "fy", "fz", "q", "mask",
];

fn classify(word: String, index: Option<usize>) -> Expr {
    if let Some(id) = word.strip_prefix("c_") {
        return Expr::Compute(id.to_string(), index);
    }
    if let Some(id) = word.strip_prefix("f_") {
        return Expr::Fix(id.to_string(), index);
    }
    if let Some(name) = word.strip_prefix("v_") {
        return Expr::Variable(name.to_string());
    }
    if word == "PI" {
        return Expr::Number(std::f64::consts::PI);
    }
    if ATOM_VECTORS.contains(&word.as_str()) {
        if let Some(p) = Property::parse(&word) {
            return Expr::Property(p);
        }
    }
    Expr::Thermo(word)
}

/// Parse formula text.
pub fn parse(text: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let expr = parser.binary(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(t) => Err(ExprError::UnexpectedToken(format!("{t:?}"))),
    }
}
