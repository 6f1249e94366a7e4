//! The lexical environment: a linked spine of reference-counted frames.
//!
//! A frame is one lexical scope instance: two fixed-size slot vectors (one
//! for values, one for types) sized at creation to hold exactly the
//! declarations the scope introduces, plus a parent pointer. `push` and
//! `pop` return a different environment handle rather than mutating in
//! place; cloning an [`Environment`] is one `Rc` bump, which is what makes
//! closure capture cheap.
//!
//! Slots start unset; reading a slot before its declaration has been
//! evaluated is reported by the caller, not papered over.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::TypeValue;
use crate::value::Value;

/// One lexical scope instance.
#[derive(Debug)]
pub struct Frame {
    parent: Option<Rc<Frame>>,
    values: RefCell<Vec<Option<Value>>>,
    types: RefCell<Vec<Option<Rc<TypeValue>>>>,
}

impl Frame {
    fn new(parent: Option<Rc<Frame>>, slots: usize) -> Self {
        Self {
            parent,
            values: RefCell::new(vec![None; slots]),
            types: RefCell::new(vec![None; slots]),
        }
    }

    /// The enclosing frame, if any.
    pub fn parent(&self) -> Option<&Rc<Frame>> {
        self.parent.as_ref()
    }

    /// Number of slots in this frame.
    pub fn size(&self) -> usize {
        self.values.borrow().len()
    }

    /// Reads a value slot; `None` if the slot is out of range or unset.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.values.borrow().get(index).cloned().flatten()
    }

    /// Writes a value slot.
    pub fn set(&self, index: usize, value: Value) {
        if let Some(slot) = self.values.borrow_mut().get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Reads a type slot; `None` if the slot is out of range or unset.
    pub fn get_type(&self, index: usize) -> Option<Rc<TypeValue>> {
        self.types.borrow().get(index).cloned().flatten()
    }

    /// Writes a type slot.
    pub fn set_type(&self, index: usize, ty: Rc<TypeValue>) {
        if let Some(slot) = self.types.borrow_mut().get_mut(index) {
            *slot = Some(ty);
        }
    }
}

/// A handle onto the current frame of a frame chain.
#[derive(Clone, Debug)]
pub struct Environment {
    frame: Rc<Frame>,
}

impl Environment {
    /// A root environment: a single frame with no slots and no parent.
    pub fn empty() -> Self {
        Self {
            frame: Rc::new(Frame::new(None, 0)),
        }
    }

    /// Creates a child frame with `slots` slots; the current frame becomes
    /// its parent.
    pub fn push(&self, slots: usize) -> Environment {
        Environment {
            frame: Rc::new(Frame::new(Some(Rc::clone(&self.frame)), slots)),
        }
    }

    /// Returns the parent environment. The caller keeps its own handle if
    /// the popped frame is still needed.
    pub fn pop(&self) -> Option<Environment> {
        self.frame
            .parent()
            .map(|parent| Environment {
                frame: Rc::clone(parent),
            })
    }

    /// The current frame.
    pub fn frame(&self) -> &Rc<Frame> {
        &self.frame
    }

    /// Reads a value slot of the current frame.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.frame.get(index)
    }

    /// Writes a value slot of the current frame.
    pub fn set(&self, index: usize, value: Value) {
        self.frame.set(index, value);
    }

    /// Reads a type slot of the current frame.
    pub fn get_type(&self, index: usize) -> Option<Rc<TypeValue>> {
        self.frame.get_type(index)
    }

    /// Writes a type slot of the current frame.
    pub fn set_type(&self, index: usize, ty: Rc<TypeValue>) {
        self.frame.set_type(index, ty);
    }

    /// Number of frames from here to the root, counting this one.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = Rc::clone(&self.frame);
        while let Some(parent) = frame.parent() {
            depth += 1;
            let parent = Rc::clone(parent);
            frame = parent;
        }
        depth
    }
}
