//! The scope (rib) stack used during resolution.
//!
//! One rib per active scope; a rib's entries are the declarations the scope
//! introduces, in declaration order, so an entry's position *is* its frame
//! slot index. Lookup walks the stack inside-out.

use tiger_par::{Binding, ScopeId};
use tiger_util::Symbol;

/// What kind of declaration a name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Type,
    Var,
    Param,
    Func,
    Native,
}

impl DeclKind {
    /// Human-readable description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            DeclKind::Type => "a type",
            DeclKind::Var => "a variable",
            DeclKind::Param => "a function parameter",
            DeclKind::Func => "a function",
            DeclKind::Native => "a native function",
        }
    }

    /// True for declarations an lvalue head may refer to.
    pub fn is_value(self) -> bool {
        matches!(self, DeclKind::Var | DeclKind::Param)
    }

    /// True for declarations a call may refer to.
    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Func | DeclKind::Native)
    }
}

/// One scope level.
#[derive(Debug)]
pub struct Rib {
    /// The scope this rib belongs to.
    pub scope: ScopeId,
    /// Declared names in slot order.
    entries: Vec<(Symbol, DeclKind)>,
}

impl Rib {
    fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            entries: Vec::new(),
        }
    }

    /// Adds a name, returning its slot index, or `None` if the name is
    /// already declared in this rib.
    pub fn declare(&mut self, name: Symbol, kind: DeclKind) -> Option<u32> {
        if self.entries.iter().any(|(n, _)| *n == name) {
            return None;
        }
        let index = self.entries.len() as u32;
        self.entries.push((name, kind));
        Some(index)
    }

    fn lookup(&self, name: Symbol) -> Option<(u32, DeclKind)> {
        self.entries
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| (i as u32, self.entries[i].1))
    }

    /// Number of slots this scope's frame will need.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The stack of active scopes, allocating `ScopeId`s in entry order.
#[derive(Debug, Default)]
pub struct ScopeStack {
    ribs: Vec<Rib>,
    next_scope: u32,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a fresh rib and returns its scope id.
    pub fn enter(&mut self) -> ScopeId {
        let scope = ScopeId(self.next_scope);
        self.next_scope += 1;
        self.ribs.push(Rib::new(scope));
        scope
    }

    /// Pops the innermost rib.
    pub fn exit(&mut self) {
        self.ribs.pop();
    }

    /// The innermost rib.
    pub fn current(&mut self) -> &mut Rib {
        self.ribs.last_mut().expect("scope stack is empty")
    }

    /// Searches the active scopes inside-out.
    pub fn resolve(&self, name: Symbol) -> Option<(Binding, DeclKind)> {
        for rib in self.ribs.iter().rev() {
            if let Some((index, kind)) = rib.lookup(name) {
                return Some((Binding::new(rib.scope, index), kind));
            }
        }
        None
    }

    /// Total number of scopes allocated so far.
    pub fn scope_count(&self) -> usize {
        self.next_scope as usize
    }
}
