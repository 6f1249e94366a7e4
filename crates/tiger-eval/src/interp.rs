//! The tree-walk evaluator.
//!
//! Every AST variant has one deterministic evaluation rule, dispatched in
//! [`Interpreter::eval`]. Two pieces of state thread through a run:
//!
//! - the current [`Environment`] handle, passed down the walk;
//! - the activation table, mapping each resolved scope to the stack of its
//!   live frames. Entering a `let` or a call pushes the new frame onto its
//!   scope's stack; every exit path pops it, including `break` propagation.
//!   A use site annotated with `Binding { scope, index }` reads slot `index`
//!   of the scope's innermost live frame.
//!
//! `break` is not an exception: evaluation returns
//! `Result<Value, Interrupt>`, a `while` consumes [`Interrupt::Break`], and
//! everything else propagates it. A `Break` that reaches the top level
//! becomes the break-outside-loop error.

use std::rc::Rc;

use thiserror::Error;
use tiger_par::{
    Access, AssignExpr, BinOp, BinaryExpr, CallExpr, Decl, Expr, LValueExpr, LetExpr, RecordExpr,
    ScopeId, Ty, TypeDecl,
};
use tiger_util::Symbol;

use crate::env::{Environment, Frame};
use crate::natives::{NativeCtx, NativeError, NativeImpl, RootEntry, RootInit};
use crate::types::{RecordType, TypeValue};
use crate::value::{ArrayValue, Closure, NativeFunction, RecordValue, Value};

/// Errors raised during evaluation. All are fatal.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("operands of '{op}' must be integers, got {found}")]
    BinaryType { op: BinOp, found: &'static str },

    #[error("expected an integer {context}, got {found}")]
    IntegerExpected {
        context: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{name}' expects {expected} arguments but was called with {given}")]
    ArityMismatch {
        name: Symbol,
        expected: usize,
        given: usize,
    },

    #[error("'{name}' is {found}, not a function")]
    NotCallable { name: Symbol, found: &'static str },

    #[error("the name '{name}' is used before its declaration has been evaluated")]
    Uninitialized { name: Symbol },

    #[error("the type '{name}' is used before its declaration has been evaluated")]
    UninitializedType { name: Symbol },

    #[error("array index {index} is out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("array length must be non-negative, got {length}")]
    NegativeLength { length: i64 },

    #[error("cannot index {found}; an array is required")]
    NotAnArray { found: &'static str },

    #[error("cannot access field '{field}' of {found}; a record is required")]
    NotARecord {
        field: Symbol,
        found: &'static str,
    },

    #[error("record type has no field '{field}'")]
    NoSuchField { field: Symbol },

    #[error("record literal is missing the field '{field}'")]
    MissingField { field: Symbol },

    #[error("record literal names '{field}', which the record type does not declare")]
    ExtraField { field: Symbol },

    #[error("'{name}' is not a record type")]
    NotARecordType { name: Symbol },

    #[error("'break' outside of a loop")]
    BreakOutsideLoop,

    #[error("native function error: {0}")]
    Native(#[from] NativeError),

    #[error("the name '{name}' was never resolved")]
    Unresolved { name: Symbol },

    #[error("no active frame for the scope of '{name}'")]
    ScopeNotActive { name: Symbol },

    #[error("native declarations cannot appear in source")]
    NativeInSource,
}

/// The non-value outcomes of evaluating an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Interrupt {
    /// A `break` travelling to the nearest enclosing `while`.
    Break,
    /// A fatal evaluation error.
    Error(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(err: EvalError) -> Self {
        Interrupt::Error(err)
    }
}

impl From<NativeError> for Interrupt {
    fn from(err: NativeError) -> Self {
        Interrupt::Error(EvalError::Native(err))
    }
}

pub type EvalResult<T> = Result<T, Interrupt>;

/// The AST evaluator.
pub struct Interpreter {
    /// Stack of live frames per scope, indexed by `ScopeId`.
    activations: Vec<Vec<Rc<Frame>>>,
    /// Resources for native functions.
    ctx: NativeCtx,
}

impl Interpreter {
    /// Creates an interpreter for a program resolved into `scopes` scopes.
    pub fn new(scopes: usize, ctx: NativeCtx) -> Self {
        Self {
            activations: (0..scopes).map(|_| Vec::new()).collect(),
            ctx,
        }
    }

    /// Evaluates a resolved program against the ambient root entries. The
    /// entries must be the same list (in the same order) whose declarations
    /// the resolver saw as the ambient scope.
    pub fn run(&mut self, program: &Expr, root: &[RootEntry]) -> Result<Value, EvalError> {
        let env = Environment::empty().push(root.len());
        for (index, entry) in root.iter().enumerate() {
            match &entry.init {
                RootInit::Value(value) => env.set(index, value.clone()),
                RootInit::Type(ty) => env.set_type(index, Rc::clone(ty)),
            }
        }

        self.enter_scope(ScopeId::ROOT, Rc::clone(env.frame()));
        let result = self.eval(program, &env);
        self.exit_scope(ScopeId::ROOT);

        match result {
            Ok(value) => Ok(value),
            Err(Interrupt::Break) => Err(EvalError::BreakOutsideLoop),
            Err(Interrupt::Error(err)) => Err(err),
        }
    }

    /// Total number of live frames across every scope; zero between runs.
    pub fn active_frames(&self) -> usize {
        self.activations.iter().map(Vec::len).sum()
    }

    fn eval(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Str(s) => Ok(Value::string(s)),

            Expr::Binary(binary) => self.eval_binary(binary, env),

            Expr::Seq(exprs) => {
                let mut last = Value::Nil;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }

            Expr::If(if_expr) => {
                let cond = self.eval(&if_expr.cond, env)?;
                let taken = self.int_value(cond, "as the condition of 'if'")? != 0;
                if taken {
                    self.eval(&if_expr.then_branch, env)
                } else if let Some(else_branch) = &if_expr.else_branch {
                    self.eval(else_branch, env)
                } else {
                    Ok(Value::Nil)
                }
            }

            Expr::While(while_expr) => {
                loop {
                    let cond = self.eval(&while_expr.cond, env)?;
                    if self.int_value(cond, "as the condition of 'while'")? == 0 {
                        return Ok(Value::Nil);
                    }
                    match self.eval(&while_expr.body, env) {
                        Ok(_) => {}
                        Err(Interrupt::Break) => return Ok(Value::Nil),
                        Err(err) => return Err(err),
                    }
                }
            }

            Expr::Break => Err(Interrupt::Break),

            Expr::LValue(lvalue) => self.eval_lvalue(lvalue, env),
            Expr::Assign(assign) => self.eval_assign(assign, env),
            Expr::Call(call) => self.eval_call(call, env),

            Expr::Array(array) => {
                let length = self.eval(&array.length, env)?;
                let length = self.int_value(length, "as an array length")?;
                let init = self.eval(&array.init, env)?;
                if length < 0 {
                    return Err(EvalError::NegativeLength { length }.into());
                }
                // Cloning the value clones aggregate handles, so every cell
                // aliases one record/array and mutation through any index is
                // visible through all.
                let cells = vec![init; length as usize];
                Ok(Value::Array(Rc::new(ArrayValue::new(cells))))
            }

            Expr::Record(record) => self.eval_record(record, env),
            Expr::Let(let_expr) => self.eval_let(let_expr, env),
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn eval_binary(&mut self, binary: &BinaryExpr, env: &Environment) -> EvalResult<Value> {
        let left = self.eval(&binary.left, env)?;
        let right = self.eval(&binary.right, env)?;
        let op = binary.op;

        // Equality is structural over any pair of values; everything else
        // requires integers.
        match op {
            BinOp::Eq => return Ok(Value::Int((left == right) as i64)),
            BinOp::Ne => return Ok(Value::Int((left != right) as i64)),
            _ => {}
        }

        let (a, b) = self.int_operands(op, &left, &right)?;
        let result = match op {
            BinOp::Add => Value::Int(a.wrapping_add(b)),
            BinOp::Sub => Value::Int(a.wrapping_sub(b)),
            BinOp::Mul => Value::Int(a.wrapping_mul(b)),
            BinOp::Div => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero.into());
                }
                Value::Int(a.wrapping_div(b))
            }
            BinOp::Gt => Value::Int((a > b) as i64),
            BinOp::Lt => Value::Int((a < b) as i64),
            BinOp::Ge => Value::Int((a >= b) as i64),
            BinOp::Le => Value::Int((a <= b) as i64),
            // Both sides are already evaluated; '&' and '|' are strict.
            BinOp::And => Value::Int((a != 0 && b != 0) as i64),
            BinOp::Or => Value::Int((a != 0 || b != 0) as i64),
            BinOp::Eq | BinOp::Ne => unreachable!("handled above"),
        };
        Ok(result)
    }

    fn int_operands(&self, op: BinOp, left: &Value, right: &Value) -> EvalResult<(i64, i64)> {
        let Some(a) = left.as_int() else {
            return Err(EvalError::BinaryType {
                op,
                found: left.type_name(),
            }
            .into());
        };
        let Some(b) = right.as_int() else {
            return Err(EvalError::BinaryType {
                op,
                found: right.type_name(),
            }
            .into());
        };
        Ok((a, b))
    }

    fn int_value(&self, value: Value, context: &'static str) -> EvalResult<i64> {
        value.as_int().ok_or_else(|| {
            EvalError::IntegerExpected {
                context,
                found: value.type_name(),
            }
            .into()
        })
    }

    // =========================================================================
    // Locators
    // =========================================================================

    /// Reads the frame slot an annotated use site points at.
    fn read_slot(&self, name: Symbol, binding: Option<tiger_par::Binding>) -> EvalResult<Value> {
        let Some(binding) = binding else {
            return Err(EvalError::Unresolved { name }.into());
        };
        let frame = self.frame_for(binding.scope, name)?;
        frame
            .get(binding.index as usize)
            .ok_or_else(|| EvalError::Uninitialized { name }.into())
    }

    /// The innermost live frame of a scope.
    fn frame_for(&self, scope: ScopeId, name: Symbol) -> EvalResult<Rc<Frame>> {
        self.activations
            .get(scope.index())
            .and_then(|stack| stack.last())
            .cloned()
            .ok_or_else(|| EvalError::ScopeNotActive { name }.into())
    }

    fn eval_lvalue(&mut self, lvalue: &LValueExpr, env: &Environment) -> EvalResult<Value> {
        let mut value = self.read_slot(lvalue.name, lvalue.binding.get())?;
        for access in &lvalue.accesses {
            value = self.eval_access(value, access, env)?;
        }
        Ok(value)
    }

    /// Applies one locator step to a value.
    fn eval_access(
        &mut self,
        value: Value,
        access: &Access,
        env: &Environment,
    ) -> EvalResult<Value> {
        match access {
            Access::Field(field) => {
                let Value::Record(record) = value else {
                    return Err(EvalError::NotARecord {
                        field: *field,
                        found: value.type_name(),
                    }
                    .into());
                };
                let Some(index) = record.ty.index_of(*field) else {
                    return Err(EvalError::NoSuchField { field: *field }.into());
                };
                let value = record.fields.borrow()[index].clone();
                Ok(value)
            }
            Access::Index(index_expr) => {
                let index = self.eval(index_expr, env)?;
                let index = self.int_value(index, "as an array index")?;
                let Value::Array(array) = value else {
                    return Err(EvalError::NotAnArray {
                        found: value.type_name(),
                    }
                    .into());
                };
                let cells = array.cells.borrow();
                if index < 0 || index as usize >= cells.len() {
                    return Err(EvalError::IndexOutOfBounds {
                        index,
                        length: cells.len(),
                    }
                    .into());
                }
                Ok(cells[index as usize].clone())
            }
        }
    }

    /// `lvalue := expr`: the right-hand side evaluates first, then the
    /// locator chain is walked to the penultimate step and the final cell is
    /// written. Plain names store straight into the resolved slot.
    fn eval_assign(&mut self, assign: &AssignExpr, env: &Environment) -> EvalResult<Value> {
        let value = self.eval(&assign.value, env)?;
        let target = &assign.target;

        let Some((last, walk)) = target.accesses.split_last() else {
            let Some(binding) = target.binding.get() else {
                return Err(EvalError::Unresolved { name: target.name }.into());
            };
            let frame = self.frame_for(binding.scope, target.name)?;
            frame.set(binding.index as usize, value);
            return Ok(Value::Nil);
        };

        let mut container = self.read_slot(target.name, target.binding.get())?;
        for access in walk {
            container = self.eval_access(container, access, env)?;
        }

        match last {
            Access::Field(field) => {
                let Value::Record(record) = container else {
                    return Err(EvalError::NotARecord {
                        field: *field,
                        found: container.type_name(),
                    }
                    .into());
                };
                let Some(index) = record.ty.index_of(*field) else {
                    return Err(EvalError::NoSuchField { field: *field }.into());
                };
                record.fields.borrow_mut()[index] = value;
            }
            Access::Index(index_expr) => {
                let index = self.eval(index_expr, env)?;
                let index = self.int_value(index, "as an array index")?;
                let Value::Array(array) = container else {
                    return Err(EvalError::NotAnArray {
                        found: container.type_name(),
                    }
                    .into());
                };
                let mut cells = array.cells.borrow_mut();
                if index < 0 || index as usize >= cells.len() {
                    return Err(EvalError::IndexOutOfBounds {
                        index,
                        length: cells.len(),
                    }
                    .into());
                }
                cells[index as usize] = value;
            }
        }
        Ok(Value::Nil)
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn eval_call(&mut self, call: &CallExpr, env: &Environment) -> EvalResult<Value> {
        let callee = self.read_slot(call.name, call.binding.get())?;

        // Arguments evaluate in the caller's environment, left to right.
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval(arg, env)?);
        }

        match callee {
            Value::Func(closure) => self.call_function(call.name, &closure, args),
            Value::Native(native) => self.call_native(call.name, &native, &args),
            other => Err(EvalError::NotCallable {
                name: call.name,
                found: other.type_name(),
            }
            .into()),
        }
    }

    fn call_function(
        &mut self,
        name: Symbol,
        closure: &Closure,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let decl = &closure.decl;
        if args.len() != decl.params.len() {
            return Err(EvalError::ArityMismatch {
                name,
                expected: decl.params.len(),
                given: args.len(),
            }
            .into());
        }
        let Some(scope) = decl.scope.get() else {
            return Err(EvalError::Unresolved { name }.into());
        };

        // A fresh frame of parameter_count slots on top of the environment
        // captured at declaration time.
        let fn_env = closure.env.push(decl.params.len());
        for (index, arg) in args.into_iter().enumerate() {
            fn_env.set(index, arg);
        }

        self.enter_scope(scope, Rc::clone(fn_env.frame()));
        let result = self.eval(&decl.body, &fn_env);
        self.exit_scope(scope);
        result
    }

    fn call_native(
        &mut self,
        name: Symbol,
        native: &NativeFunction,
        args: &[Value],
    ) -> EvalResult<Value> {
        if args.len() != native.imp.arity() {
            return Err(EvalError::ArityMismatch {
                name,
                expected: native.imp.arity(),
                given: args.len(),
            }
            .into());
        }
        let result = match native.imp {
            NativeImpl::Zero(f) => f(&mut self.ctx),
            NativeImpl::One(f) => f(&mut self.ctx, &args[0]),
            NativeImpl::Two(f) => f(&mut self.ctx, &args[0], &args[1]),
        };
        result.map_err(Interrupt::from)
    }

    // =========================================================================
    // Scopes and declarations
    // =========================================================================

    fn eval_let(&mut self, let_expr: &LetExpr, env: &Environment) -> EvalResult<Value> {
        let Some(scope) = let_expr.scope.get() else {
            return Err(EvalError::Unresolved {
                name: Symbol::intern("let"),
            }
            .into());
        };

        let let_env = env.push(let_expr.decls.len());
        self.enter_scope(scope, Rc::clone(let_env.frame()));
        let result = self.eval_let_inner(let_expr, &let_env);
        self.exit_scope(scope);
        result
    }

    fn eval_let_inner(&mut self, let_expr: &LetExpr, let_env: &Environment) -> EvalResult<Value> {
        // Declarations evaluate in order against the already-extended frame,
        // so later declarations see earlier ones. Function slots are written
        // before any body runs, which is what makes recursion work.
        for (index, decl) in let_expr.decls.iter().enumerate() {
            match decl {
                Decl::Var(var) => {
                    let value = self.eval(&var.init, let_env)?;
                    let_env.set(index, value);
                }
                Decl::Type(type_decl) => {
                    let ty = self.make_type(type_decl)?;
                    let_env.set_type(index, ty);
                }
                Decl::Func(func) => {
                    let closure = Closure {
                        decl: Rc::clone(func),
                        env: let_env.clone(),
                    };
                    let_env.set(index, Value::Func(Rc::new(closure)));
                }
                Decl::Native(_) => return Err(EvalError::NativeInSource.into()),
            }
        }

        let mut last = Value::Nil;
        for expr in &let_expr.body {
            last = self.eval(expr, let_env)?;
        }
        Ok(last)
    }

    /// Builds the runtime type for a type declaration. Aliases share the
    /// referent's `Rc`; a forward alias whose referent has not been
    /// evaluated yet is an error (recursive type declarations are not
    /// supported).
    fn make_type(&mut self, type_decl: &TypeDecl) -> EvalResult<Rc<TypeValue>> {
        match &type_decl.ty {
            Ty::Array(element) => Ok(Rc::new(TypeValue::Array { element: *element })),
            Ty::Record(fields) => {
                let layout = fields
                    .iter()
                    .map(|(name, type_ref)| (*name, type_ref.name))
                    .collect();
                Ok(Rc::new(TypeValue::Record(Rc::new(RecordType::new(layout)))))
            }
            Ty::Name(type_ref) => {
                let Some(binding) = type_ref.binding.get() else {
                    return Err(EvalError::Unresolved {
                        name: type_ref.name,
                    }
                    .into());
                };
                let frame = self.frame_for(binding.scope, type_ref.name)?;
                frame.get_type(binding.index as usize).ok_or_else(|| {
                    EvalError::UninitializedType {
                        name: type_ref.name,
                    }
                    .into()
                })
            }
        }
    }

    fn eval_record(&mut self, record: &RecordExpr, env: &Environment) -> EvalResult<Value> {
        let Some(binding) = record.type_id.binding.get() else {
            return Err(EvalError::Unresolved {
                name: record.type_id.name,
            }
            .into());
        };
        let frame = self.frame_for(binding.scope, record.type_id.name)?;
        let Some(ty) = frame.get_type(binding.index as usize) else {
            return Err(EvalError::UninitializedType {
                name: record.type_id.name,
            }
            .into());
        };
        let TypeValue::Record(record_ty) = &*ty else {
            return Err(EvalError::NotARecordType {
                name: record.type_id.name,
            }
            .into());
        };

        for field in record.fields.keys() {
            if !record_ty.has_field(*field) {
                return Err(EvalError::ExtraField { field: *field }.into());
            }
        }

        // Field expressions evaluate in the *type's* declared order, not the
        // literal's, producing the positional value vector.
        let mut values = Vec::with_capacity(record_ty.len());
        for field in record_ty.field_names().collect::<Vec<_>>() {
            let Some(expr) = record.fields.get(&field) else {
                return Err(EvalError::MissingField { field }.into());
            };
            values.push(self.eval(expr, env)?);
        }

        Ok(Value::Record(Rc::new(RecordValue::new(
            Rc::clone(record_ty),
            values,
        ))))
    }

    fn enter_scope(&mut self, scope: ScopeId, frame: Rc<Frame>) {
        if scope.index() >= self.activations.len() {
            self.activations.resize_with(scope.index() + 1, Vec::new);
        }
        self.activations[scope.index()].push(frame);
    }

    fn exit_scope(&mut self, scope: ScopeId) {
        if let Some(stack) = self.activations.get_mut(scope.index()) {
            stack.pop();
        }
    }
}
