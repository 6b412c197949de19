//! Reference evaluator of the default textual format.
//!
//! [`FormatMachine`] runs the bodies built by the
//! [`SerializationSynthesizer`](crate::SerializationSynthesizer) against
//! runtime [`Value`]s and an in-memory text channel. Nested enum and aggregate
//! fields recurse into their own synthesized bodies, so the machine observes
//! exactly the statement sequences the compiler emits.
//!
//! Token rules: insignificant whitespace is skipped before every token, and a
//! token ends at whitespace or at one of `{ } ( ) , =`.

use cinder_ast::{Callee, Literal, NodeIndex, NodeKind, Prim};
use cinder_binder::{Immediate, SymbolKind, VarFlags};
use cinder_common::{InternalError, InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{ClassKind, PrimitiveKind, TypeKind, Universe};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::synthesizer::SerializationSynthesizer;

const TOKEN_DELIMITERS: &[char] = &['{', '}', '(', ')', ',', '='];

/// A runtime value of the generated program.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The null reference, and the result of statements with no value.
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// The text channel a body reads from or writes to.
    File,
    Enum {
        ty: TypeId,
        constant: SymbolId,
    },
    Aggregate {
        ty: TypeId,
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    pub fn aggregate(ty: TypeId, fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
        Value::Aggregate {
            ty,
            fields: fields
                .into_iter()
                .map(|(name, v)| (name.to_string(), v))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Aggregate { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    fn truthy(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::UInt(u) => Some(*u != 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::File => f.write_str("<file>"),
            Value::Enum { constant, .. } => write!(f, "{constant:?}"),
            Value::Aggregate { ty, .. } => write!(f, "<{ty:?} instance>"),
        }
    }
}

/// A failure of the generated program (bad input, `halt`).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl MachineError {
    fn runtime(message: impl Into<String>) -> Self {
        MachineError::Runtime(RuntimeError {
            message: message.into(),
        })
    }

    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            MachineError::Runtime(e) => Some(e),
            MachineError::Internal(_) => None,
        }
    }
}

type MachineResult<T> = Result<T, MachineError>;

#[derive(Clone, Debug)]
struct Body {
    file_arg: SymbolId,
    arg: SymbolId,
    stmts: Vec<NodeIndex>,
}

#[derive(Debug, Default)]
struct Channel {
    out: String,
    input: Vec<char>,
    pos: usize,
}

impl Channel {
    fn skip_whitespace(&mut self) {
        while self.input.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn token(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(&c) = self.input.get(self.pos) {
            if c.is_whitespace() || TOKEN_DELIMITERS.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start && self.pos >= self.input.len() {
            return None;
        }
        Some(self.input[start..self.pos].iter().collect())
    }

    fn read_lit_char(&mut self, c: char, ignore_ws: bool) -> bool {
        if ignore_ws {
            self.skip_whitespace();
        }
        if self.input.get(self.pos) == Some(&c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

enum Flow {
    Normal,
    Return,
}

type Env = FxHashMap<SymbolId, Value>;

pub struct FormatMachine<'u> {
    u: &'u mut Universe,
    bodies: FxHashMap<(TypeId, bool), Body>,
    channel: Channel,
}

impl<'u> FormatMachine<'u> {
    pub fn new(u: &'u mut Universe) -> Self {
        FormatMachine {
            u,
            bodies: FxHashMap::default(),
            channel: Channel::default(),
        }
    }

    /// Serialize `value` as a `ty`.
    pub fn write(&mut self, ty: TypeId, value: &Value) -> MachineResult<String> {
        self.channel = Channel::default();
        self.write_value(ty, value.clone())?;
        Ok(std::mem::take(&mut self.channel.out))
    }

    /// Deserialize a `ty` from `text`.
    pub fn read(&mut self, ty: TypeId, text: &str) -> MachineResult<Value> {
        self.channel = Channel {
            out: String::new(),
            input: text.chars().collect(),
            pos: 0,
        };
        let initial = self.fresh_object(ty)?;
        self.read_value(ty, initial)
    }

    fn body(&mut self, ty: TypeId, is_read: bool) -> InternalResult<Body> {
        if let Some(body) = self.bodies.get(&(ty, is_read)) {
            return Ok(body.clone());
        }
        let file_ty = self.u.builtins.file;
        let file_arg = self.formal("f", file_ty);
        let arg = self.formal("arg", ty);
        let mut synth = SerializationSynthesizer::new(self.u);
        let stmts = if is_read {
            synth.build_read_body(ty, file_arg, arg)?
        } else {
            synth.build_write_body(ty, file_arg, arg)?
        };
        let body = Body {
            file_arg,
            arg,
            stmts,
        };
        self.bodies.insert((ty, is_read), body.clone());
        Ok(body)
    }

    fn formal(&mut self, name: &str, ty: TypeId) -> SymbolId {
        let sym = self.u.symbols.new_var(name, VarFlags::empty(), Some(ty), Span::SYNTHETIC);
        trace!(name, sym = ?sym, "machine formal");
        sym
    }

    fn has_body(&self, ty: TypeId) -> bool {
        self.u
            .types
            .get(ty)
            .is_some_and(|t| t.has_default_write())
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Default value a variable of type `ty` starts with.
    fn default_of(&self, ty: TypeId) -> MachineResult<Value> {
        let t = self.u.types.ty(ty)?;
        match &t.kind {
            TypeKind::Aggregate(shape) if shape.class_kind == ClassKind::Value => {
                self.fresh_object(ty)
            }
            _ => match t.default_value.symbol() {
                Some(sym) => self.constant(sym),
                None => Ok(Value::Nil),
            },
        }
    }

    /// A new instance with every data field at its default; reading into an
    /// aggregate starts from one of these.
    fn fresh_object(&self, ty: TypeId) -> MachineResult<Value> {
        let t = self.u.types.ty(ty)?;
        if t.as_aggregate().is_none() {
            return self.default_of(ty);
        }
        let mut fields = IndexMap::new();
        for field in self.u.data_fields(ty)? {
            let name = self.u.symbols.name(field).to_string();
            let field_ty = self.u.symbols.get(field).and_then(|s| s.ty).ok_or_else(|| {
                int_fatal!(t.span, "field '{}' has no type", name)
            })?;
            fields.insert(name, self.default_of(field_ty)?);
        }
        Ok(Value::Aggregate { ty, fields })
    }

    /// Value of a constant symbol (enum constants, `nil`, immediates).
    fn constant(&self, sym: SymbolId) -> MachineResult<Value> {
        let b = self.u.builtins;
        if sym == b.g_nil {
            return Ok(Value::Nil);
        }
        let symbol = self
            .u
            .symbols
            .get(sym)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no symbol {:?}", sym))?;
        match &symbol.kind {
            SymbolKind::EnumConst => {
                let ty = symbol
                    .ty
                    .ok_or_else(|| int_fatal!(symbol.span, "enum constant without a type"))?;
                Ok(Value::Enum { ty, constant: sym })
            }
            SymbolKind::Var {
                immediate: Some(imm),
                ..
            } => Ok(match imm {
                Immediate::Bool(v) => Value::Bool(*v),
                Immediate::Int { value, .. } => Value::Int(*value),
                Immediate::UInt { value, .. } => Value::UInt(*value),
                Immediate::Float { text, .. } => Value::Float(text.parse().unwrap_or(0.0)),
                Immediate::Complex { .. } => Value::Nil,
                Immediate::Str(s) => Value::Str(s.clone()),
            }),
            _ => Ok(Value::Nil),
        }
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    fn write_value(&mut self, ty: TypeId, value: Value) -> MachineResult<()> {
        if !self.has_body(ty) {
            let text = match &value {
                Value::Enum { constant, .. } => self.u.symbols.name(*constant).to_string(),
                other => other.to_string(),
            };
            self.channel.out.push_str(&text);
            return Ok(());
        }
        let body = self.body(ty, false)?;
        let mut env = Env::default();
        env.insert(body.file_arg, Value::File);
        env.insert(body.arg, value);
        self.exec_all(&mut env, &body.stmts)?;
        Ok(())
    }

    fn read_value(&mut self, ty: TypeId, initial: Value) -> MachineResult<Value> {
        if !self.has_body(ty) {
            return self.read_primitive(ty);
        }
        let body = self.body(ty, true)?;
        let mut env = Env::default();
        env.insert(body.file_arg, Value::File);
        env.insert(body.arg, initial);
        self.exec_all(&mut env, &body.stmts)?;
        env.remove(&body.arg)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "read body dropped its argument").into())
    }

    fn read_primitive(&mut self, ty: TypeId) -> MachineResult<Value> {
        let t = self.u.types.ty(ty)?;
        let Some(kind) = t.primitive() else {
            return Err(int_fatal!(t.span, "{} type has no default read function", t.variant()).into());
        };
        let type_name = self.u.type_name(ty).to_string();
        let token = self
            .channel
            .token()
            .ok_or_else(|| MachineError::runtime(format!("unexpected end of input reading {type_name}")))?;
        let bad = || MachineError::runtime(format!("\"{token}\" is not a valid {type_name}"));
        Ok(match kind {
            PrimitiveKind::Bool => match token.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(bad()),
            },
            PrimitiveKind::Int(_) => Value::Int(token.parse().map_err(|_| bad())?),
            PrimitiveKind::UInt(_) => Value::UInt(token.parse().map_err(|_| bad())?),
            PrimitiveKind::Float(_) => Value::Float(token.parse().map_err(|_| bad())?),
            PrimitiveKind::String => Value::Str(token),
            _ => {
                return Err(int_fatal!(t.span, "no default read function for {}", type_name).into());
            }
        })
    }

    fn exec_all(&mut self, env: &mut Env, stmts: &[NodeIndex]) -> MachineResult<Flow> {
        for &stmt in stmts {
            if let Flow::Return = self.exec(env, stmt)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Normal)
    }

    fn kind(&self, idx: NodeIndex) -> InternalResult<NodeKind> {
        self.u
            .nodes
            .kind(idx)
            .cloned()
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no node {:?}", idx))
    }

    fn exec(&mut self, env: &mut Env, idx: NodeIndex) -> MachineResult<Flow> {
        match self.kind(idx)? {
            NodeKind::Def { sym, init, .. } => {
                let value = if init.is_some() {
                    self.eval(env, init)?
                } else {
                    let ty = self.u.symbols.get(sym).and_then(|s| s.ty);
                    match ty {
                        Some(ty) => self.default_of(ty)?,
                        None => Value::Nil,
                    }
                };
                env.insert(sym, value);
                Ok(Flow::Normal)
            }
            NodeKind::Cond {
                cond,
                then_branch,
                else_branch,
            } => {
                let test = self.eval(env, cond)?;
                let taken = test.truthy().ok_or_else(|| {
                    int_fatal!(self.u.nodes.span(cond), "condition is not boolean: {:?}", test)
                })?;
                if taken {
                    self.exec(env, then_branch)
                } else if else_branch.is_some() {
                    self.exec(env, else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            NodeKind::Block(stmts) => self.exec_all(env, &stmts),
            NodeKind::Return(_) => Ok(Flow::Return),
            NodeKind::ExprStmt(e) => {
                self.eval(env, e)?;
                Ok(Flow::Normal)
            }
            _ => {
                self.eval(env, idx)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval(&mut self, env: &mut Env, idx: NodeIndex) -> MachineResult<Value> {
        let span = self.u.nodes.span(idx);
        match self.kind(idx)? {
            NodeKind::SymRef(sym) => match env.get(&sym) {
                Some(v) => Ok(v.clone()),
                None => self.constant(sym),
            },
            NodeKind::Literal(Literal::Int(v)) => Ok(Value::Int(v)),
            NodeKind::Literal(Literal::Bool(v)) => Ok(Value::Bool(v)),
            NodeKind::Literal(Literal::Str(s)) => Ok(Value::Str(s)),
            NodeKind::Member { base, field } => {
                let base_value = self.eval(env, base)?;
                let name = self.u.symbols.resolve_atom(field).to_string();
                match base_value {
                    Value::File => Ok(Value::File),
                    Value::Aggregate { fields, .. } => fields
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| int_fatal!(span, "no field '{}'", name).into()),
                    Value::Nil => Err(MachineError::runtime(format!(
                        "attempt to access field '{name}' of nil"
                    ))),
                    other => Err(int_fatal!(span, "member access on {:?}", other).into()),
                }
            }
            NodeKind::Call { callee, args } => match callee {
                Callee::Prim(prim) => self.prim(env, prim, &args, span),
                Callee::Sym(sym) => Err(int_fatal!(
                    span,
                    "call to '{}' cannot be evaluated",
                    self.u.symbols.name(sym)
                )
                .into()),
                Callee::Name(atom) => Err(int_fatal!(
                    span,
                    "unresolved call '{}'",
                    self.u.symbols.resolve_atom(atom)
                )
                .into()),
            },
            other => Err(int_fatal!(span, "cannot evaluate {:?}", other).into()),
        }
    }

    fn static_type(&self, idx: NodeIndex) -> InternalResult<TypeId> {
        self.u
            .expr_type(idx)
            .ok_or_else(|| int_fatal!(self.u.nodes.span(idx), "cannot determine the type of {:?}", idx))
    }

    fn prim(&mut self, env: &mut Env, prim: Prim, args: &[NodeIndex], span: Span) -> MachineResult<Value> {
        let arg = |i: usize| {
            args.get(i)
                .copied()
                .ok_or_else(|| MachineError::from(int_fatal!(span, "'{}' is missing argument {}", prim.name(), i)))
        };
        match prim {
            Prim::Write => {
                let value_node = arg(1)?;
                let ty = self.static_type(value_node)?;
                let value = self.eval(env, value_node)?;
                self.write_value(ty, value)?;
                Ok(Value::Nil)
            }
            Prim::Read => {
                let target = arg(1)?;
                let ty = self.static_type(target)?;
                let initial = self.fresh_object(ty)?;
                let value = self.read_value(ty, initial)?;
                self.assign(env, target, value)?;
                Ok(Value::Nil)
            }
            Prim::Assign => {
                let value = self.eval(env, arg(1)?)?;
                self.assign(env, arg(0)?, value)?;
                Ok(Value::Nil)
            }
            Prim::Eq | Prim::Ne => {
                let lhs = self.eval(env, arg(0)?)?;
                let rhs = self.eval(env, arg(1)?)?;
                let equal = lhs == rhs;
                Ok(Value::Bool(if prim == Prim::Eq { equal } else { !equal }))
            }
            Prim::Not => {
                let v = self.eval(env, arg(0)?)?;
                let b = v
                    .truthy()
                    .ok_or_else(|| int_fatal!(span, "'!' applied to {:?}", v))?;
                Ok(Value::Bool(!b))
            }
            Prim::Halt => {
                let mut message = String::new();
                for &a in args {
                    message.push_str(&self.eval(env, a)?.to_string());
                }
                Err(MachineError::runtime(message))
            }
            Prim::ReadLitChar => {
                let lit = match self.eval(env, arg(1)?)? {
                    Value::Str(s) => s,
                    other => return Err(int_fatal!(span, "_readLitChar expects a string, found {:?}", other).into()),
                };
                let ignore_ws = self.eval(env, arg(2)?)?.truthy().unwrap_or(true);
                let Some(c) = lit.chars().next() else {
                    return Err(int_fatal!(span, "_readLitChar with an empty literal").into());
                };
                Ok(Value::Int(i64::from(self.channel.read_lit_char(c, ignore_ws))))
            }
            Prim::GetErrno => Ok(Value::Int(0)),
            Prim::UnionCheck => Ok(Value::Nil),
        }
    }

    /// Store `value` into the location named by `target`.
    fn assign(&mut self, env: &mut Env, target: NodeIndex, value: Value) -> MachineResult<()> {
        let span = self.u.nodes.span(target);
        match self.kind(target)? {
            NodeKind::SymRef(sym) => {
                env.insert(sym, value);
                Ok(())
            }
            NodeKind::Member { base, field } => {
                let name = self.u.symbols.resolve_atom(field).to_string();
                let mut base_value = self.eval(env, base)?;
                match &mut base_value {
                    Value::Aggregate { fields, .. } => match fields.get_mut(&name) {
                        Some(slot) => *slot = value,
                        None => return Err(int_fatal!(span, "no field '{}'", name).into()),
                    },
                    Value::Nil => {
                        return Err(MachineError::runtime(format!(
                            "attempt to assign field '{name}' of nil"
                        )));
                    }
                    other => return Err(int_fatal!(span, "member assignment on {:?}", other).into()),
                }
                self.assign(env, base, base_value)
            }
            other => Err(int_fatal!(span, "cannot assign to {:?}", other).into()),
        }
    }
}
