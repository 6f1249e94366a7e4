//! Runtime representations of declared types.
//!
//! The interpreter performs no type checking; the only type information the
//! runtime actually consumes is a record type's field layout, which makes
//! record creation and field access positional. Types are stored by
//! reference: an alias declaration shares the referent's `Rc`, never copies.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tiger_util::Symbol;

/// A type as it exists at run time.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeValue {
    /// A primitive or otherwise opaque named type (`int`, `string`).
    Name(Symbol),
    /// `array of element`.
    Array { element: Symbol },
    /// A record layout.
    Record(Rc<RecordType>),
}

impl TypeValue {
    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeValue::Name(name) => name.as_str().to_owned(),
            TypeValue::Array { element } => format!("array of {element}"),
            TypeValue::Record(record) => format!("{record}"),
        }
    }
}

/// The layout of a record type: field names in declared order, each with its
/// declared type name. The field→position map makes record access a single
/// vector index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordType {
    fields: IndexMap<Symbol, Symbol>,
}

impl RecordType {
    pub fn new(fields: IndexMap<Symbol, Symbol>) -> Self {
        Self { fields }
    }

    /// The position of `field` in the value vector, if the field exists.
    #[inline]
    pub fn index_of(&self, field: Symbol) -> Option<usize> {
        self.fields.get_index_of(&field)
    }

    /// True if the type declares `field`.
    pub fn has_field(&self, field: Symbol) -> bool {
        self.fields.contains_key(&field)
    }

    /// Field names in declared order, which is also the order record
    /// creation evaluates its expressions in.
    pub fn field_names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.fields.keys().copied()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, (name, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} : {ty}")?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn point_type() -> RecordType {
        let mut fields = IndexMap::new();
        fields.insert(sym("x"), sym("int"));
        fields.insert(sym("y"), sym("int"));
        RecordType::new(fields)
    }

    #[test]
    fn field_indices_follow_declaration_order() {
        let ty = point_type();
        assert_eq!(ty.index_of(sym("x")), Some(0));
        assert_eq!(ty.index_of(sym("y")), Some(1));
        assert_eq!(ty.index_of(sym("z")), None);
    }

    #[test]
    fn field_names_iterate_in_order() {
        let ty = point_type();
        let names: Vec<_> = ty.field_names().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn display_shows_layout() {
        assert_eq!(point_type().to_string(), "{ x : int, y : int }");
    }

    #[test]
    fn aliases_share_the_referent() {
        let original = Rc::new(TypeValue::Record(Rc::new(point_type())));
        let alias = Rc::clone(&original);
        assert!(Rc::ptr_eq(&original, &alias));
    }
}
