//! The native-function interface and the standard bindings.
//!
//! A native function is a host callable of fixed arity (0, 1, or 2) exposed
//! to Tiger source under a name. The evaluator hands it already-evaluated
//! argument values plus a [`NativeCtx`] (the output streams and the
//! monotonic timer) and uses its return value directly. Natives never touch
//! the interpreter environment.
//!
//! [`standard_bindings`] produces the ambient root entries every program
//! runs against: the primitive type declarations `int` and `string` plus the
//! natives `print`, `timeGo`, and `timeStop`. The declarations go to the
//! resolver as the outermost scope; the paired seed values populate the root
//! frame, so source programs see the natives as ordinary functions.

use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

use thiserror::Error;
use tiger_par::{Decl, NativeDecl, Param, Ty, TypeDecl, TypeRef};
use tiger_util::Symbol;

use crate::types::TypeValue;
use crate::value::{NativeFunction, Value};

/// A failure inside a native function; the evaluator wraps it as an
/// evaluation error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct NativeError(pub String);

impl From<io::Error> for NativeError {
    fn from(err: io::Error) -> Self {
        NativeError(format!("i/o error: {err}"))
    }
}

pub type NativeResult = Result<Value, NativeError>;

/// The host side of a native declaration, at its declared arity.
#[derive(Clone, Copy, Debug)]
pub enum NativeImpl {
    Zero(fn(&mut NativeCtx) -> NativeResult),
    One(fn(&mut NativeCtx, &Value) -> NativeResult),
    Two(fn(&mut NativeCtx, &Value, &Value) -> NativeResult),
}

impl NativeImpl {
    /// The number of arguments the callable takes.
    pub fn arity(&self) -> usize {
        match self {
            NativeImpl::Zero(_) => 0,
            NativeImpl::One(_) => 1,
            NativeImpl::Two(_) => 2,
        }
    }
}

/// The resources natives run against: the process streams, the DEBUG flag,
/// and the tick counter shared by `timeGo`/`timeStop`.
pub struct NativeCtx {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    debug: bool,
    timer: Option<Instant>,
}

impl NativeCtx {
    /// A context writing to the real standard streams. `debug` enables the
    /// `ticks=<N>` trace on stderr.
    pub fn new(debug: bool) -> Self {
        Self::with_streams(Box::new(io::stdout()), Box::new(io::stderr()), debug)
    }

    /// A context with injected streams; tests capture output this way.
    pub fn with_streams(stdout: Box<dyn Write>, stderr: Box<dyn Write>, debug: bool) -> Self {
        Self {
            stdout,
            stderr,
            debug,
            timer: None,
        }
    }
}

/// A `Write` handle over a shared growable buffer. Used to capture native
/// output in tests and by embedders that redirect the interpreter's streams.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<std::cell::RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes written so far, as lossy UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// How one ambient entry seeds the root frame.
pub enum RootInit {
    Value(Value),
    Type(Rc<TypeValue>),
}

/// One ambient binding: a declaration for the resolver plus the seed for the
/// root frame, at the same slot.
pub struct RootEntry {
    pub decl: Decl,
    pub init: RootInit,
}

/// The declarations of a root-entry list, in slot order, for resolution.
pub fn root_decls(entries: &[RootEntry]) -> Vec<Decl> {
    entries.iter().map(|entry| entry.decl.clone()).collect()
}

/// The standard ambient bindings: `int`, `string`, `print`, `timeGo`,
/// `timeStop`.
pub fn standard_bindings() -> Vec<RootEntry> {
    let int = Symbol::intern("int");
    let string = Symbol::intern("string");

    let mut entries = vec![
        RootEntry {
            decl: Decl::Type(TypeDecl::new(int, Ty::Name(TypeRef::new(int)))),
            init: RootInit::Type(Rc::new(TypeValue::Name(int))),
        },
        RootEntry {
            decl: Decl::Type(TypeDecl::new(string, Ty::Name(TypeRef::new(string)))),
            init: RootInit::Type(Rc::new(TypeValue::Name(string))),
        },
    ];

    entries.push(native_entry(
        "print",
        vec![Param::new(Symbol::intern("message"), TypeRef::new(string))],
        None,
        NativeImpl::One(native_print),
    ));
    entries.push(native_entry(
        "timeGo",
        vec![],
        Some(TypeRef::new(int)),
        NativeImpl::Zero(native_time_go),
    ));
    entries.push(native_entry(
        "timeStop",
        vec![],
        Some(TypeRef::new(int)),
        NativeImpl::Zero(native_time_stop),
    ));

    entries
}

/// Builds a root entry for one native function. Public so embedders and
/// tests can register their own natives next to the standard ones.
pub fn native_entry(
    name: &str,
    params: Vec<Param>,
    return_type: Option<TypeRef>,
    imp: NativeImpl,
) -> RootEntry {
    let decl = Rc::new(NativeDecl::new(Symbol::intern(name), params, return_type));
    RootEntry {
        decl: Decl::Native(Rc::clone(&decl)),
        init: RootInit::Value(Value::Native(Rc::new(NativeFunction { decl, imp }))),
    }
}

/// `print(value)`: writes an integer or string to stdout, no newline.
fn native_print(ctx: &mut NativeCtx, value: &Value) -> NativeResult {
    match value {
        Value::Int(n) => write!(ctx.stdout, "{n}")?,
        Value::Str(s) => write!(ctx.stdout, "{s}")?,
        other => {
            return Err(NativeError(format!(
                "print expects an integer or a string, got {}",
                other.type_name()
            )))
        }
    }
    ctx.stdout.flush()?;
    Ok(Value::Nil)
}

/// `timeGo()`: starts the monotonic tick counter.
fn native_time_go(ctx: &mut NativeCtx) -> NativeResult {
    ctx.timer = Some(Instant::now());
    Ok(Value::Int(0))
}

/// `timeStop()`: returns the ticks since `timeGo()`; with DEBUG enabled
/// also writes `ticks=<N>` to stderr.
fn native_time_stop(ctx: &mut NativeCtx) -> NativeResult {
    let Some(start) = ctx.timer else {
        return Err(NativeError("timeStop() called before timeGo()".to_string()));
    };
    let ticks = start.elapsed().as_nanos() as i64;
    if ctx.debug {
        writeln!(ctx.stderr, "ticks={ticks}")?;
        ctx.stderr.flush()?;
    }
    Ok(Value::Int(ticks))
}
