//! Lexically nested name environments.
//!
//! Two parallel stacks are kept per check: one for values, one for types.
//! A frame is pushed on every lexical scope (function, block, `if`
//! binding, loop body, composite body) and popped when the region is left.
//! Declaration into the current frame detects same-frame redeclaration;
//! lookup searches outward.

use cairn_ast::Access;
use cairn_common::span::Span;
use rustc_hash::FxHashMap;

use crate::types::TypeId;

/// How a value binding was introduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    /// `let` binding.
    Constant,
    /// `var` binding.
    Variable,
    Parameter,
    Function,
    /// A composite constructor in value position.
    Constructor,
    /// The `self` binding of a composite body.
    SelfBinding,
    /// A built-in from the base activation.
    Builtin,
}

/// An entry in the value activation.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub type_id: TypeId,
    pub kind: BindingKind,
    pub access: Access,
    /// Declaration site; dummy for built-ins.
    pub span: Span,
    /// Unique id within one check, used as the resource-tracking key.
    pub variable_id: u32,
    /// Activation depth at declaration; used for locality decisions
    /// (purity, jump boundaries).
    pub depth: usize,
}

/// An entry in the type activation.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    pub name: String,
    pub type_id: TypeId,
    pub span: Span,
}

/// A stack of lexical frames mapping names to entries.
#[derive(Clone, Debug)]
pub struct Activations<T> {
    frames: Vec<FxHashMap<String, T>>,
}

impl<T> Activations<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "popping the base activation");
        self.frames.pop();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declare into the current frame. Returns `false` if the name is
    /// already declared in this frame (redeclaration).
    pub fn declare(&mut self, name: String, entry: T) -> bool {
        let frame = self
            .frames
            .last_mut()
            .unwrap_or_else(|| unreachable!("activations always hold the base frame"));
        if frame.contains_key(&name) {
            return false;
        }
        frame.insert(name, entry);
        true
    }

    /// Overwrite or insert into the current frame unconditionally.
    pub fn declare_forced(&mut self, name: String, entry: T) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, entry);
        }
    }

    /// Look up a name, searching from the innermost frame outward.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    #[must_use]
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
    }

    /// Entries of the current (innermost) frame.
    pub fn current_frame(&self) -> impl Iterator<Item = (&String, &T)> {
        self.frames.last().into_iter().flat_map(|f| f.iter())
    }
}

impl<T> Default for Activations<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_frame_redeclaration_detected() {
        let mut activations: Activations<u32> = Activations::new();
        assert!(activations.declare("x".to_string(), 1));
        assert!(!activations.declare("x".to_string(), 2));
        activations.push();
        // Shadowing in an inner frame is fine.
        assert!(activations.declare("x".to_string(), 3));
        assert_eq!(activations.lookup("x"), Some(&3));
        activations.pop();
        assert_eq!(activations.lookup("x"), Some(&1));
    }
}
