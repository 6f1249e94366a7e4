//! Runtime values.
//!
//! Integers and strings are immutable; arrays and records are `Rc`-shared
//! aggregates whose cells sit behind a `RefCell`, so every alias of an
//! aggregate observes mutation through any other alias. Equality is
//! structural across the board except for functions, which compare by
//! identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tiger_par::{FuncDecl, NativeDecl};

use crate::env::Environment;
use crate::natives::NativeImpl;
use crate::types::RecordType;

/// A Tiger runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Int(i64),
    Str(Rc<str>),
    Array(Rc<ArrayValue>),
    Record(Rc<RecordValue>),
    Func(Rc<Closure>),
    Native(Rc<NativeFunction>),
}

impl Value {
    /// Builds a string value.
    pub fn string(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    /// What kind of value this is, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "an integer",
            Value::Str(_) => "a string",
            Value::Array(_) => "an array",
            Value::Record(_) => "a record",
            Value::Func(_) => "a function",
            Value::Native(_) => "a native function",
        }
    }

    /// The integer inside, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality: nil equals nil, integers by value, strings
    /// byte-wise, arrays element-wise, records field-wise on the positional
    /// vectors (`nil = record` is false). Functions compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.cells.borrow() == *b.cells.borrow()
            }
            (Value::Record(a), Value::Record(b)) => {
                Rc::ptr_eq(a, b) || *a.fields.borrow() == *b.fields.borrow()
            }
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(array) => {
                write!(f, "[")?;
                for (i, cell) in array.cells.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{cell}")?;
                }
                write!(f, "]")
            }
            Value::Record(record) => {
                write!(f, "{{")?;
                let fields = record.fields.borrow();
                for (i, name) in record.ty.field_names().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={}", fields[i])?;
                }
                write!(f, "}}")
            }
            Value::Func(closure) => write!(f, "<function {}>", closure.decl.name),
            Value::Native(native) => write!(f, "<native {}>", native.decl.name),
        }
    }
}

/// An array: a fixed number of mutable cells.
#[derive(Debug)]
pub struct ArrayValue {
    pub cells: RefCell<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(cells: Vec<Value>) -> Self {
        Self {
            cells: RefCell::new(cells),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.borrow().is_empty()
    }
}

/// A record: its type (for the field layout) plus values in field-position
/// order. The invariant `ty.len() == fields.len()` is established at
/// creation and never broken.
#[derive(Debug)]
pub struct RecordValue {
    pub ty: Rc<RecordType>,
    pub fields: RefCell<Vec<Value>>,
}

impl RecordValue {
    pub fn new(ty: Rc<RecordType>, fields: Vec<Value>) -> Self {
        debug_assert_eq!(ty.len(), fields.len());
        Self {
            ty,
            fields: RefCell::new(fields),
        }
    }
}

/// A Tiger function value: the declaration plus the environment in effect
/// at its declaration site. Calls push their frame onto this environment.
#[derive(Debug)]
pub struct Closure {
    pub decl: Rc<FuncDecl>,
    pub env: Environment,
}

/// A native function value: the declaration Tiger source resolved against,
/// paired with the host callable.
#[derive(Debug)]
pub struct NativeFunction {
    pub decl: Rc<NativeDecl>,
    pub imp: NativeImpl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tiger_util::Symbol;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn point_type() -> Rc<RecordType> {
        let mut fields = IndexMap::new();
        fields.insert(sym("x"), sym("int"));
        fields.insert(sym("y"), sym("int"));
        Rc::new(RecordType::new(fields))
    }

    #[test]
    fn every_value_equals_itself() {
        let values = [
            Value::Nil,
            Value::Int(42),
            Value::string("tiger"),
            Value::Array(Rc::new(ArrayValue::new(vec![Value::Int(1), Value::Int(2)]))),
            Value::Record(Rc::new(RecordValue::new(
                point_type(),
                vec![Value::Int(1), Value::Int(2)],
            ))),
        ];
        for value in &values {
            assert_eq!(value, &value.clone());
        }
    }

    #[test]
    fn integers_compare_by_value() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Int(4));
    }

    #[test]
    fn strings_compare_byte_wise() {
        assert_eq!(Value::string("abc"), Value::string("abc"));
        assert_ne!(Value::string("abc"), Value::string("abd"));
    }

    #[test]
    fn arrays_compare_element_wise() {
        let a = Value::Array(Rc::new(ArrayValue::new(vec![Value::Int(1), Value::Int(2)])));
        let b = Value::Array(Rc::new(ArrayValue::new(vec![Value::Int(1), Value::Int(2)])));
        let c = Value::Array(Rc::new(ArrayValue::new(vec![Value::Int(1)])));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn records_compare_field_wise() {
        let a = Value::Record(Rc::new(RecordValue::new(
            point_type(),
            vec![Value::Int(1), Value::Int(2)],
        )));
        let b = Value::Record(Rc::new(RecordValue::new(
            point_type(),
            vec![Value::Int(1), Value::Int(2)],
        )));
        let c = Value::Record(Rc::new(RecordValue::new(
            point_type(),
            vec![Value::Int(9), Value::Int(2)],
        )));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn nil_never_equals_a_record() {
        let record = Value::Record(Rc::new(RecordValue::new(
            point_type(),
            vec![Value::Int(1), Value::Int(2)],
        )));
        assert_ne!(Value::Nil, record);
        assert_ne!(record, Value::Nil);
    }

    #[test]
    fn nil_never_equals_other_kinds() {
        assert_ne!(Value::Nil, Value::Int(0));
        assert_ne!(Value::Nil, Value::string(""));
    }

    #[test]
    fn aliased_arrays_share_storage() {
        let array = Rc::new(ArrayValue::new(vec![Value::Int(1), Value::Int(2)]));
        let alias = Value::Array(Rc::clone(&array));
        array.cells.borrow_mut()[0] = Value::Int(99);
        let Value::Array(seen) = &alias else {
            unreachable!();
        };
        assert_eq!(seen.cells.borrow()[0], Value::Int(99));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::string("hi").to_string(), "hi");
        let array = Value::Array(Rc::new(ArrayValue::new(vec![Value::Int(1), Value::Int(2)])));
        assert_eq!(array.to_string(), "[1, 2]");
        let record = Value::Record(Rc::new(RecordValue::new(
            point_type(),
            vec![Value::Int(3), Value::Int(4)],
        )));
        assert_eq!(record.to_string(), "{x=3, y=4}");
    }
}
