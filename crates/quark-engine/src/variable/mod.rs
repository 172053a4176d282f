//! Named variables and formula evaluation.
//!
//! `equal` and `atom` variables store a formula that is re-evaluated on
//! every use; nothing is cached. `index`, `string` and `internal`
//! variables store text or a number and exist mainly for `${name}`
//! substitution.

pub mod expr;

use indexmap::IndexMap;
use quark_core::{EngineError, EngineResult, Scope, Shape};

use crate::compute::Computes;
use crate::config::is_identifier;
use crate::context::SystemView;
use crate::fix::Fixes;
use crate::thermo;
use expr::{BinOp, Expr, GroupFn, MathFn, UnOp};

/// Deepest allowed chain of `v_name` references.
const MAX_DEPTH: usize = 32;

// ── Variables ──────────────────────────────────────────────────────

/// Variable style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableStyle {
    /// List of strings, first one current.
    Index,
    /// Single string.
    String,
    /// Formula producing one value.
    Equal,
    /// Formula producing one value per particle.
    Atom,
    /// Number set programmatically.
    Internal,
}

impl VariableStyle {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "index" => Some(Self::Index),
            "string" => Some(Self::String),
            "equal" => Some(Self::Equal),
            "atom" => Some(Self::Atom),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Variable {
    style: VariableStyle,
    data: Vec<String>,
    internal: f64,
}

/// Variable registry keyed by name.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    items: IndexMap<String, Variable>,
}

impl Variables {
    /// Apply a `variable name style args...` or `variable name delete`
    /// command.
    ///
    /// An existing `index` variable is left untouched, so values given on
    /// the command line take precedence over the input script.
    pub fn command(&mut self, args: &[&str]) -> EngineResult<()> {
        let (name, style_word, rest) = match args {
            [name, style, rest @ ..] => (*name, *style, rest),
            _ => return Err(EngineError::all("Illegal variable command")),
        };
        if style_word == "delete" {
            self.items.shift_remove(name);
            return Ok(());
        }
        if !is_identifier(name) {
            return Err(EngineError::all(format!(
                "Variable name '{name}' must have only alphanumeric characters or underscores"
            )));
        }
        let style = VariableStyle::parse(style_word)
            .ok_or_else(|| EngineError::all(format!("Unknown variable style '{style_word}'")))?;
        if rest.is_empty() {
            return Err(EngineError::all("Illegal variable command"));
        }

        if let Some(existing) = self.items.get(name) {
            if style == VariableStyle::Index && existing.style == VariableStyle::Index {
                return Ok(());
            }
            if existing.style != style {
                return Err(EngineError::all(format!(
                    "Cannot redefine variable {name} as a different style"
                )));
            }
        }

        let variable = match style {
            VariableStyle::Index => Variable {
                style,
                data: rest.iter().map(|s| s.to_string()).collect(),
                internal: 0.0,
            },
            VariableStyle::Internal => {
                let [value] = rest else {
                    return Err(EngineError::all("Illegal variable command"));
                };
                let internal = value
                    .parse()
                    .map_err(|_| EngineError::all(format!("Expected floating point parameter instead of '{value}'")))?;
                Variable {
                    style,
                    data: Vec::new(),
                    internal,
                }
            }
            VariableStyle::String | VariableStyle::Equal | VariableStyle::Atom => {
                if rest.len() != 1 {
                    return Err(EngineError::all("Illegal variable command"));
                }
                Variable {
                    style,
                    data: vec![rest[0].to_string()],
                    internal: 0.0,
                }
            }
        };
        self.items.insert(name.to_string(), variable);
        Ok(())
    }

    /// Define an `index` variable unless one of that name exists.
    pub fn define_index(&mut self, name: &str, values: &[String]) -> EngineResult<()> {
        let mut args: Vec<&str> = vec![name, "index"];
        args.extend(values.iter().map(String::as_str));
        self.command(&args)
    }

    /// Move an `index` variable to its next value. An exhausted variable
    /// is deleted.
    pub fn advance(&mut self, name: &str) -> EngineResult<()> {
        let variable = self
            .items
            .get_mut(name)
            .ok_or_else(|| EngineError::all(format!("Invalid variable name {name} in next command")))?;
        if variable.style != VariableStyle::Index {
            return Err(EngineError::all("Invalid variable style with next command"));
        }
        variable.data.remove(0);
        if variable.data.is_empty() {
            self.items.shift_remove(name);
        }
        Ok(())
    }

    /// Style of variable `name`.
    pub fn style(&self, name: &str) -> Option<VariableStyle> {
        self.items.get(name).map(|v| v.style)
    }

    /// Replace the text of a `string` variable. Fails if `name` is
    /// unknown or not `string` style.
    pub fn set_string(&mut self, name: &str, value: &str) -> EngineResult<()> {
        match self.items.get_mut(name) {
            Some(v) if v.style == VariableStyle::String => {
                v.data = vec![value.to_string()];
                Ok(())
            }
            Some(_) => Err(EngineError::all(format!("Variable {name} is not string style"))),
            None => Err(EngineError::all(format!("Variable {name} does not exist"))),
        }
    }

    /// Set an `internal` variable, creating it if absent.
    pub fn set_internal(&mut self, name: &str, value: f64) -> EngineResult<()> {
        match self.items.get_mut(name) {
            Some(v) if v.style == VariableStyle::Internal => v.internal = value,
            Some(_) => {
                return Err(EngineError::all(format!(
                    "Cannot redefine variable {name} as a different style"
                )))
            }
            None => {
                self.items.insert(
                    name.to_string(),
                    Variable {
                        style: VariableStyle::Internal,
                        data: Vec::new(),
                        internal: value,
                    },
                );
            }
        }
        Ok(())
    }

    /// Current text of an `index` or `string` variable, or the formula
    /// of an `equal`/`atom` variable.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.items
            .get(name)
            .and_then(|v| v.data.first())
            .map(String::as_str)
    }

    /// Value of an `internal` variable.
    pub fn internal(&self, name: &str) -> Option<f64> {
        self.items
            .get(name)
            .filter(|v| v.style == VariableStyle::Internal)
            .map(|v| v.internal)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no variables exist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ── Evaluation ─────────────────────────────────────────────────────

/// Result of a formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// One value.
    Scalar(f64),
    /// One value per local particle.
    PerParticle(Vec<f64>),
}

/// Evaluation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Equal,
    Atom,
}

/// Formula evaluator over borrowed engine state.
///
/// References to computes may recompute them; references to fixes may
/// trigger their global reductions. Both are collective.
pub struct Evaluator<'a> {
    /// System state.
    pub sys: SystemView<'a>,
    /// Compute registry.
    pub computes: &'a mut Computes,
    /// Fix registry.
    pub fixes: &'a mut Fixes,
    /// Variable registry.
    pub variables: &'a Variables,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Bundle the state needed for evaluation.
    pub fn new(
        sys: SystemView<'a>,
        computes: &'a mut Computes,
        fixes: &'a mut Fixes,
        variables: &'a Variables,
    ) -> Self {
        Self {
            sys,
            computes,
            fixes,
            variables,
            depth: 0,
        }
    }

    /// Evaluate the `equal`-style variable `name`.
    pub fn equal(&mut self, name: &str) -> EngineResult<f64> {
        match self.variables.style(name) {
            Some(VariableStyle::Equal) => {}
            Some(_) => return Err(EngineError::all(format!("Variable {name} is not equal-style"))),
            None => return Err(EngineError::all(format!("Variable {name} does not exist"))),
        }
        match self.variable(name, Mode::Equal)? {
            Value::Scalar(v) => Ok(v),
            Value::PerParticle(_) => Err(per_particle_in_equal()),
        }
    }

    /// Evaluate the `atom`-style variable `name` for particles in
    /// `group_bit`; other particles get zero.
    pub fn atom(&mut self, name: &str, group_bit: i32) -> EngineResult<Vec<f64>> {
        match self.variables.style(name) {
            Some(VariableStyle::Atom) => {}
            Some(_) => return Err(EngineError::all(format!("Variable {name} is not atom-style"))),
            None => return Err(EngineError::all(format!("Variable {name} does not exist"))),
        }
        let value = self.variable(name, Mode::Atom)?;
        Ok(self.mask(value, group_bit))
    }

    /// Evaluate formula text as an equal-style expression.
    pub fn formula(&mut self, text: &str) -> EngineResult<f64> {
        let expr = expr::parse(text).map_err(|e| EngineError::all(e.to_string()))?;
        match self.eval(&expr, Mode::Equal)? {
            Value::Scalar(v) => Ok(v),
            Value::PerParticle(_) => Err(per_particle_in_equal()),
        }
    }

    /// Text substituted for `${name}`: the current string of an `index` or
    /// `string` variable, or the formatted value of an `equal` or
    /// `internal` variable. `None` if the variable cannot be substituted.
    pub fn substitution(&mut self, name: &str) -> EngineResult<Option<String>> {
        Ok(match self.variables.style(name) {
            Some(VariableStyle::Index | VariableStyle::String) => {
                self.variables.text(name).map(str::to_string)
            }
            Some(VariableStyle::Equal) => Some(format_number(self.equal(name)?)),
            Some(VariableStyle::Internal) => self.variables.internal(name).map(format_number),
            Some(VariableStyle::Atom) | None => None,
        })
    }

    fn mask(&self, value: Value, group_bit: i32) -> Vec<f64> {
        let masks = self.sys.particles.masks();
        let full = match value {
            Value::Scalar(v) => vec![v; masks.len()],
            Value::PerParticle(values) => values,
        };
        full.into_iter()
            .zip(masks)
            .map(|(v, &m)| if m & group_bit != 0 { v } else { 0.0 })
            .collect()
    }

    fn variable(&mut self, name: &str, mode: Mode) -> EngineResult<Value> {
        let style = self
            .variables
            .style(name)
            .ok_or_else(|| EngineError::all(format!("Invalid variable reference v_{name} in variable formula")))?;
        if style == VariableStyle::Internal {
            return Ok(Value::Scalar(self.variables.internal(name).unwrap_or(0.0)));
        }
        if style == VariableStyle::Atom && mode == Mode::Equal {
            return Err(EngineError::all(
                "Atom-style variable in equal-style variable formula",
            ));
        }
        if self.depth >= MAX_DEPTH {
            return Err(EngineError::all("Variable evaluation recursion too deep"));
        }
        let text = self.variables.text(name).unwrap_or_default();
        let expr = expr::parse(text).map_err(|e| EngineError::all(e.to_string()))?;
        self.depth += 1;
        let result = self.eval(&expr, mode);
        self.depth -= 1;
        result
    }

    fn eval(&mut self, expr: &Expr, mode: Mode) -> EngineResult<Value> {
        match expr {
            Expr::Number(v) => Ok(Value::Scalar(*v)),
            Expr::Unary(op, inner) => {
                let v = self.eval(inner, mode)?;
                Ok(map(v, |x| match op {
                    UnOp::Neg => -x,
                    UnOp::Not => f64::from(x == 0.0),
                }))
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs, mode)?;
                let b = self.eval(rhs, mode)?;
                zip(a, b, |x, y| binary(*op, x, y))
            }
            Expr::Math(f, args) => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval(a, mode)?);
                }
                match (values.pop(), values.pop()) {
                    (Some(x), None) => try_map(x, |x| math(*f, x, 0.0)),
                    (Some(x), Some(y)) => zip(y, x, |y, x| math(*f, y, x)),
                    _ => Err(EngineError::all("Invalid math function in variable formula")),
                }
            }
            Expr::Group(f, id) => {
                let bit = self.sys.groups.require(id, "variable")?;
                let p = self.sys.particles;
                let value = match f {
                    GroupFn::Count => self.sys.groups.count(bit, p, self.sys.comm) as f64,
                    GroupFn::Mass => {
                        let local: f64 = p
                            .masks()
                            .iter()
                            .enumerate()
                            .filter(|(_, &m)| m & bit != 0)
                            .map(|(i, _)| p.mass_of(i))
                            .sum();
                        self.sys.comm.sum_f64(local)
                    }
                };
                Ok(Value::Scalar(value))
            }
            Expr::Compute(id, index) => self.compute(id, *index, mode),
            Expr::Fix(id, index) => self.fix(id, *index, mode),
            Expr::Variable(name) => self.variable(name, mode),
            Expr::Property(prop) => {
                if mode == Mode::Equal {
                    return Err(EngineError::all("Atom vector in equal-style variable formula"));
                }
                if prop.needs_charge() && self.sys.particles.q_flag == 0 {
                    return Err(EngineError::all("Variable uses atom property that isn't allocated"));
                }
                let p = self.sys.particles;
                let values = (0..p.len()).map(|i| prop.value(p, self.sys.domain, i)).collect();
                Ok(Value::PerParticle(values))
            }
            Expr::Thermo(word) => thermo::evaluate(word, &self.sys, self.computes)?
                .map(Value::Scalar)
                .ok_or_else(|| EngineError::all(format!("Invalid thermo keyword '{word}' in variable formula"))),
        }
    }

    fn compute(&mut self, id: &str, index: Option<usize>, mode: Mode) -> EngineResult<Value> {
        let sys = self.sys;
        let compute = self
            .computes
            .get_mut(id)
            .ok_or_else(|| EngineError::all(format!("Invalid compute ID '{id}' in variable formula")))?;
        let mismatched = || EngineError::all(format!("Mismatched compute {id} in variable formula"));
        match index {
            None if compute.supports(Scope::Global, Shape::Scalar) => {
                compute.refresh(Scope::Global, Shape::Scalar, &sys)?;
                let v = compute.data(Scope::Global, Shape::Scalar).and_then(|d| d.as_scalar());
                v.map(Value::Scalar).ok_or_else(mismatched)
            }
            None if mode == Mode::Atom && compute.supports(Scope::PerParticle, Shape::Vector) => {
                compute.refresh(Scope::PerParticle, Shape::Vector, &sys)?;
                let v = compute.data(Scope::PerParticle, Shape::Vector).and_then(|d| d.as_vector());
                v.map(|v| Value::PerParticle(v.to_vec())).ok_or_else(mismatched)
            }
            Some(i) if compute.supports(Scope::Global, Shape::Vector) => {
                compute.refresh(Scope::Global, Shape::Vector, &sys)?;
                let v = compute.data(Scope::Global, Shape::Vector).and_then(|d| d.as_vector());
                let element = v.and_then(|v| v.get(i - 1).copied()).ok_or_else(|| {
                    EngineError::all("Variable formula compute vector is accessed out-of-range")
                })?;
                Ok(Value::Scalar(element))
            }
            Some(i) if mode == Mode::Atom && compute.supports(Scope::PerParticle, Shape::Array) => {
                compute.refresh(Scope::PerParticle, Shape::Array, &sys)?;
                let array = compute
                    .data(Scope::PerParticle, Shape::Array)
                    .and_then(|d| d.as_array())
                    .ok_or_else(mismatched)?;
                if i > array.cols() {
                    return Err(EngineError::all(
                        "Variable formula compute array is accessed out-of-range",
                    ));
                }
                let column = (0..array.rows()).filter_map(|r| array.get(r, i - 1)).collect();
                Ok(Value::PerParticle(column))
            }
            _ => Err(mismatched()),
        }
    }

    fn fix(&mut self, id: &str, index: Option<usize>, mode: Mode) -> EngineResult<Value> {
        let comm = self.sys.comm;
        let fix = self
            .fixes
            .get_mut(id)
            .ok_or_else(|| EngineError::all(format!("Invalid fix ID '{id}' in variable formula")))?;
        let caps = fix.capabilities();
        match index {
            None if caps.scalar => Ok(Value::Scalar(fix.global_value(Shape::Scalar, 0, 0, comm)?)),
            Some(i) if caps.vector.is_some() => {
                Ok(Value::Scalar(fix.global_value(Shape::Vector, i - 1, 0, comm)?))
            }
            None if mode == Mode::Atom => fix
                .data(Scope::PerParticle, Shape::Vector)
                .and_then(|d| d.as_vector())
                .map(|v| Value::PerParticle(v.to_vec()))
                .ok_or_else(|| EngineError::all(format!("Mismatched fix {id} in variable formula"))),
            Some(i) if mode == Mode::Atom => {
                let array = fix
                    .data(Scope::PerParticle, Shape::Array)
                    .and_then(|d| d.as_array())
                    .filter(|a| i <= a.cols())
                    .ok_or_else(|| EngineError::all(format!("Mismatched fix {id} in variable formula")))?;
                Ok(Value::PerParticle(
                    (0..array.rows()).filter_map(|r| array.get(r, i - 1)).collect(),
                ))
            }
            _ => Err(EngineError::all(format!("Mismatched fix {id} in variable formula"))),
        }
    }
}

fn per_particle_in_equal() -> EngineError {
    EngineError::all("Per-atom quantity in equal-style variable formula")
}

fn map(v: Value, f: impl Fn(f64) -> f64) -> Value {
    match v {
        Value::Scalar(x) => Value::Scalar(f(x)),
        Value::PerParticle(xs) => Value::PerParticle(xs.into_iter().map(f).collect()),
    }
}

fn try_map(v: Value, f: impl Fn(f64) -> EngineResult<f64>) -> EngineResult<Value> {
    Ok(match v {
        Value::Scalar(x) => Value::Scalar(f(x)?),
        Value::PerParticle(xs) => Value::PerParticle(xs.into_iter().map(f).collect::<EngineResult<_>>()?),
    })
}

fn zip(a: Value, b: Value, f: impl Fn(f64, f64) -> EngineResult<f64>) -> EngineResult<Value> {
    Ok(match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(f(x, y)?),
        (Value::Scalar(x), Value::PerParticle(ys)) => {
            Value::PerParticle(ys.into_iter().map(|y| f(x, y)).collect::<EngineResult<_>>()?)
        }
        (Value::PerParticle(xs), Value::Scalar(y)) => {
            Value::PerParticle(xs.into_iter().map(|x| f(x, y)).collect::<EngineResult<_>>()?)
        }
        (Value::PerParticle(xs), Value::PerParticle(ys)) => Value::PerParticle(
            xs.into_iter()
                .zip(ys)
                .map(|(x, y)| f(x, y))
                .collect::<EngineResult<_>>()?,
        ),
    })
}

fn binary(op: BinOp, x: f64, y: f64) -> EngineResult<f64> {
    let truth = |b: bool| f64::from(b);
    Ok(match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(EngineError::all("Divide by 0 in variable formula"));
            }
            x / y
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(EngineError::all("Modulo 0 in variable formula"));
            }
            x % y
        }
        BinOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(EngineError::all("Power by 0 in variable formula"));
            }
            x.powf(y)
        }
        BinOp::Lt => truth(x < y),
        BinOp::Le => truth(x <= y),
        BinOp::Gt => truth(x > y),
        BinOp::Ge => truth(x >= y),
        BinOp::Eq => truth(x == y),
        BinOp::Ne => truth(x != y),
        BinOp::And => truth(x != 0.0 && y != 0.0),
        BinOp::Or => truth(x != 0.0 || y != 0.0),
    })
}

fn math(f: MathFn, x: f64, y: f64) -> EngineResult<f64> {
    Ok(match f {
        MathFn::Sqrt => {
            if x < 0.0 {
                return Err(EngineError::all("Sqrt of negative value in variable formula"));
            }
            x.sqrt()
        }
        MathFn::Exp => x.exp(),
        MathFn::Ln | MathFn::Log => {
            if x <= 0.0 {
                return Err(EngineError::all("Log of zero/negative value in variable formula"));
            }
            if f == MathFn::Ln {
                x.ln()
            } else {
                x.log10()
            }
        }
        MathFn::Abs => x.abs(),
        MathFn::Sin => x.sin(),
        MathFn::Cos => x.cos(),
        MathFn::Tan => x.tan(),
        MathFn::Asin | MathFn::Acos => {
            if !(-1.0..=1.0).contains(&x) {
                return Err(EngineError::all("Arcsin or arccos of invalid value in variable formula"));
            }
            if f == MathFn::Asin {
                x.asin()
            } else {
                x.acos()
            }
        }
        MathFn::Atan => x.atan(),
        MathFn::Atan2 => x.atan2(y),
        MathFn::Ceil => x.ceil(),
        MathFn::Floor => x.floor(),
        MathFn::Round => x.round(),
    })
}

/// Format a number the way `${name}` substitution prints it: integral
/// values without a fractional part, others in shortest round-trip form.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_variables_are_not_redefined() {
        let mut vars = Variables::default();
        vars.command(&["n", "index", "5"]).unwrap();
        vars.command(&["n", "index", "7"]).unwrap();
        assert_eq!(vars.text("n"), Some("5"));
    }

    #[test]
    fn string_variables_are_replaced() {
        let mut vars = Variables::default();
        vars.command(&["s", "string", "a"]).unwrap();
        vars.command(&["s", "string", "b"]).unwrap();
        assert_eq!(vars.text("s"), Some("b"));
        vars.set_string("s", "c").unwrap();
        assert_eq!(vars.text("s"), Some("c"));
    }

    #[test]
    fn style_changes_are_rejected() {
        let mut vars = Variables::default();
        vars.command(&["a", "equal", "1+1"]).unwrap();
        assert!(vars.command(&["a", "string", "x"]).is_err());
        assert!(vars.set_string("a", "x").is_err());
        assert!(vars.set_string("missing", "x").is_err());
    }

    #[test]
    fn next_walks_index_values() {
        let mut vars = Variables::default();
        vars.command(&["i", "index", "a", "b"]).unwrap();
        vars.advance("i").unwrap();
        assert_eq!(vars.text("i"), Some("b"));
        vars.advance("i").unwrap();
        assert!(vars.style("i").is_none());
        assert!(vars.advance("i").is_err());
        vars.command(&["s", "string", "x"]).unwrap();
        assert!(vars.advance("s").is_err());
    }

    #[test]
    fn delete_removes() {
        let mut vars = Variables::default();
        vars.command(&["a", "string", "x"]).unwrap();
        vars.command(&["a", "delete"]).unwrap();
        assert!(vars.style("a").is_none());
    }

    #[test]
    fn internal_variables() {
        let mut vars = Variables::default();
        vars.set_internal("k", 2.5).unwrap();
        assert_eq!(vars.internal("k"), Some(2.5));
        vars.command(&["k", "internal", "3"]).unwrap();
        assert_eq!(vars.internal("k"), Some(3.0));
        assert!(vars.command(&["j", "internal", "x"]).is_err());
    }

    #[test]
    fn bad_names_and_styles() {
        let mut vars = Variables::default();
        assert!(vars.command(&["a-b", "string", "x"]).is_err());
        assert!(vars.command(&["a", "loop", "3"]).is_err());
        assert!(vars.command(&["a", "equal"]).is_err());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn binary_operator_errors() {
        assert!(binary(BinOp::Div, 1.0, 0.0).is_err());
        assert!(binary(BinOp::Mod, 1.0, 0.0).is_err());
        assert_eq!(binary(BinOp::Pow, 2.0, 10.0).unwrap(), 1024.0);
        assert_eq!(binary(BinOp::And, 1.0, 0.0).unwrap(), 0.0);
        assert_eq!(binary(BinOp::Or, 1.0, 0.0).unwrap(), 1.0);
    }
}
