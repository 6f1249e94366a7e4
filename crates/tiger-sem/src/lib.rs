//! tiger-sem - Name resolution (the scope-binding pass).
//!
//! A single depth-first walk over the parsed tree that binds every use site
//! to its declaration and assigns frame slot indices. Entering a `let` or a
//! function declaration pushes a scope; leaving it pops. For every use site
//! the resolver searches the active scopes inside-out and records the frame
//! coordinate ([`tiger_par::Binding`]) in the node's annotation cell.
//!
//! Accepted declaration kinds by use site:
//!
//! | site            | accepted                         |
//! |-----------------|----------------------------------|
//! | lvalue head     | variable, function parameter     |
//! | call            | function, native function        |
//! | type reference  | type                             |
//!
//! Anything else is a [`ScopeError`] naming the kind actually found.
//!
//! Pre-existing declarations (the native bindings and primitive types) are
//! passed in as the ambient list and become scope 0, slotted exactly like a
//! `let`'s declarations, so source programs see `print` and the timers as
//! ordinary functions.
//!
//! All declarations of a `let` are in scope throughout the `let`, including
//! inside function bodies declared earlier in the same `let`; reading a slot
//! whose declaration has not yet executed is caught at run time.

pub mod scope;

use thiserror::Error;
use tiger_par::{Access, Decl, Expr, FuncDecl, LValueExpr, NativeDecl, Ty, TypeRef};
use tiger_util::Symbol;

pub use scope::{DeclKind, Rib, ScopeStack};

/// Errors raised during resolution.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("unable to find the name '{name}' in any enclosing scope")]
    Undefined { name: Symbol },

    #[error("'{name}' is {found}, but {expected} is required here")]
    KindMismatch {
        name: Symbol,
        expected: &'static str,
        found: &'static str,
    },

    #[error("the name '{name}' is declared more than once in the same scope")]
    Duplicate { name: Symbol },
}

pub type ScopeResult<T> = Result<T, ScopeError>;

/// Summary of a successful resolution pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Number of scopes assigned, counting the ambient root scope. The
    /// evaluator sizes its activation table with this.
    pub scopes: usize,
}

/// Resolves `program` against the ambient declarations, writing binding
/// annotations into the tree.
///
/// # Example
///
/// ```
/// use tiger_par::Parser;
///
/// let program = Parser::new("let var x := 1 in x end", None).parse().unwrap();
/// let resolved = tiger_sem::resolve(&program, &[]).unwrap();
/// assert_eq!(resolved.scopes, 2); // the root scope and the let
/// ```
pub fn resolve(program: &Expr, ambient: &[Decl]) -> ScopeResult<Resolved> {
    let mut resolver = Resolver {
        scopes: ScopeStack::new(),
    };

    let root = resolver.scopes.enter();
    debug_assert_eq!(root, tiger_par::ScopeId::ROOT);
    resolver.declare_all(ambient)?;
    for decl in ambient {
        resolver.resolve_decl_body(decl)?;
    }

    resolver.resolve_expr(program)?;
    resolver.scopes.exit();

    Ok(Resolved {
        scopes: resolver.scopes.scope_count(),
    })
}

struct Resolver {
    scopes: ScopeStack,
}

impl Resolver {
    fn resolve_expr(&mut self, expr: &Expr) -> ScopeResult<()> {
        match expr {
            Expr::Nil | Expr::Int(_) | Expr::Str(_) | Expr::Break => Ok(()),

            Expr::Array(array) => {
                self.resolve_type_ref(&array.type_id)?;
                self.resolve_expr(&array.length)?;
                self.resolve_expr(&array.init)
            }

            Expr::Record(record) => {
                self.resolve_type_ref(&record.type_id)?;
                for value in record.fields.values() {
                    self.resolve_expr(value)?;
                }
                Ok(())
            }

            Expr::LValue(lvalue) => self.resolve_lvalue(lvalue),

            Expr::Call(call) => {
                let (binding, kind) = self.lookup(call.name)?;
                if !kind.is_callable() {
                    return Err(ScopeError::KindMismatch {
                        name: call.name,
                        expected: "a function",
                        found: kind.describe(),
                    });
                }
                call.binding.set(Some(binding));
                for arg in &call.args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }

            Expr::Assign(assign) => {
                self.resolve_lvalue(&assign.target)?;
                self.resolve_expr(&assign.value)
            }

            Expr::Seq(exprs) => {
                for expr in exprs {
                    self.resolve_expr(expr)?;
                }
                Ok(())
            }

            Expr::If(if_expr) => {
                self.resolve_expr(&if_expr.cond)?;
                self.resolve_expr(&if_expr.then_branch)?;
                if let Some(else_branch) = &if_expr.else_branch {
                    self.resolve_expr(else_branch)?;
                }
                Ok(())
            }

            Expr::While(while_expr) => {
                self.resolve_expr(&while_expr.cond)?;
                self.resolve_expr(&while_expr.body)
            }

            Expr::Let(let_expr) => {
                let scope = self.scopes.enter();
                let_expr.scope.set(Some(scope));

                // Declare every name first so all of the let's declarations
                // are visible throughout the let, then walk declaration
                // bodies and initializers.
                self.declare_all(&let_expr.decls)?;
                for decl in &let_expr.decls {
                    self.resolve_decl_body(decl)?;
                }
                for expr in &let_expr.body {
                    self.resolve_expr(expr)?;
                }

                self.scopes.exit();
                Ok(())
            }

            Expr::Binary(binary) => {
                self.resolve_expr(&binary.left)?;
                self.resolve_expr(&binary.right)
            }
        }
    }

    /// Declares a scope's names in order, writing each declaration's own
    /// slot annotation.
    fn declare_all(&mut self, decls: &[Decl]) -> ScopeResult<()> {
        for decl in decls {
            let kind = match decl {
                Decl::Type(_) => DeclKind::Type,
                Decl::Var(_) => DeclKind::Var,
                Decl::Func(_) => DeclKind::Func,
                Decl::Native(_) => DeclKind::Native,
            };
            let scope = self.scopes.current().scope;
            let Some(index) = self.scopes.current().declare(decl.name(), kind) else {
                return Err(ScopeError::Duplicate { name: decl.name() });
            };
            decl.slot().set(Some(tiger_par::Binding::new(scope, index)));
        }
        Ok(())
    }

    /// Resolves the inside of a declaration: type bodies, annotations,
    /// initializers, and function bodies.
    fn resolve_decl_body(&mut self, decl: &Decl) -> ScopeResult<()> {
        match decl {
            Decl::Type(type_decl) => self.resolve_ty(&type_decl.ty),
            Decl::Var(var) => {
                if let Some(ty) = &var.ty {
                    self.resolve_type_ref(ty)?;
                }
                self.resolve_expr(&var.init)
            }
            Decl::Func(func) => self.resolve_function(func),
            Decl::Native(native) => self.resolve_native(native),
        }
    }

    fn resolve_function(&mut self, func: &FuncDecl) -> ScopeResult<()> {
        // Annotations resolve in the enclosing scope; the function's own
        // scope holds only its parameters.
        for param in &func.params {
            self.resolve_type_ref(&param.ty)?;
        }
        if let Some(return_type) = &func.return_type {
            self.resolve_type_ref(return_type)?;
        }

        let scope = self.scopes.enter();
        func.scope.set(Some(scope));
        for param in &func.params {
            let Some(index) = self.scopes.current().declare(param.name, DeclKind::Param) else {
                return Err(ScopeError::Duplicate { name: param.name });
            };
            param
                .slot
                .set(Some(tiger_par::Binding::new(scope, index)));
        }

        self.resolve_expr(&func.body)?;
        self.scopes.exit();
        Ok(())
    }

    fn resolve_native(&mut self, native: &NativeDecl) -> ScopeResult<()> {
        for param in &native.params {
            self.resolve_type_ref(&param.ty)?;
        }
        if let Some(return_type) = &native.return_type {
            self.resolve_type_ref(return_type)?;
        }
        Ok(())
    }

    fn resolve_lvalue(&mut self, lvalue: &LValueExpr) -> ScopeResult<()> {
        let (binding, kind) = self.lookup(lvalue.name)?;
        if !kind.is_value() {
            return Err(ScopeError::KindMismatch {
                name: lvalue.name,
                expected: "a variable",
                found: kind.describe(),
            });
        }
        lvalue.binding.set(Some(binding));

        // Record-field steps are addressed through the record value's own
        // field map at run time; only index expressions resolve here.
        for access in &lvalue.accesses {
            if let Access::Index(index) = access {
                self.resolve_expr(index)?;
            }
        }
        Ok(())
    }

    fn resolve_ty(&mut self, ty: &Ty) -> ScopeResult<()> {
        match ty {
            Ty::Name(type_ref) => self.resolve_type_ref(type_ref),
            // The element type of an array is carried by name and looked up
            // when values are created; nothing to bind here.
            Ty::Array(_) => Ok(()),
            Ty::Record(fields) => {
                for type_ref in fields.values() {
                    self.resolve_type_ref(type_ref)?;
                }
                Ok(())
            }
        }
    }

    fn resolve_type_ref(&mut self, type_ref: &TypeRef) -> ScopeResult<()> {
        let (binding, kind) = self.lookup(type_ref.name)?;
        if kind != DeclKind::Type {
            return Err(ScopeError::KindMismatch {
                name: type_ref.name,
                expected: "a type",
                found: kind.describe(),
            });
        }
        type_ref.binding.set(Some(binding));
        Ok(())
    }

    fn lookup(&self, name: Symbol) -> ScopeResult<(tiger_par::Binding, DeclKind)> {
        self.scopes
            .resolve(name)
            .ok_or(ScopeError::Undefined { name })
    }
}
