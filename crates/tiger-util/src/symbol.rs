//! String interning.
//!
//! Identifiers, keywords-as-text, record field names, and type names all
//! repeat constantly in a Tiger program; interning them collapses every
//! occurrence to a 4-byte handle with O(1) equality and hashing. The
//! interner is a process-global table; interned strings live for the life of
//! the process, which is also the life of one interpreter run.

use std::fmt;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

static INTERNER: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::default()));

/// An interned string.
///
/// Symbols are cheap to copy and compare; the underlying text is retrieved
/// with [`Symbol::as_str`].
///
/// # Examples
///
/// ```
/// use tiger_util::Symbol;
///
/// let a = Symbol::intern("collatz");
/// let b = Symbol::intern("collatz");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "collatz");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Interns a string, returning its handle.
    ///
    /// Interning the same text twice returns the same handle.
    pub fn intern(string: &str) -> Self {
        INTERNER
            .lock()
            .expect("symbol interner poisoned")
            .intern(string)
    }

    /// Returns the interned text.
    ///
    /// The `'static` lifetime is real: interned strings are kept alive for
    /// the remainder of the process.
    pub fn as_str(self) -> &'static str {
        INTERNER
            .lock()
            .expect("symbol interner poisoned")
            .get(self)
    }

    /// Returns the raw handle value.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

#[derive(Default)]
struct Interner {
    map: FxHashMap<&'static str, Symbol>,
    strings: Vec<&'static str>,
}

impl Interner {
    fn intern(&mut self, string: &str) -> Symbol {
        if let Some(&symbol) = self.map.get(string) {
            return symbol;
        }

        // Leak one copy per distinct string; the table owns it from here on.
        let owned: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let symbol = Symbol(self.strings.len() as u32);
        self.strings.push(owned);
        self.map.insert(owned, symbol);
        symbol
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        self.strings[symbol.0 as usize]
    }
}
