//! Variable scopes.

use crate::value::Value;
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Name/value bindings passed into a render.
pub type Bindings = IndexMap<SmolStr, Value>;

/// One frame of variable bindings, chained to the frame it was pushed onto.
///
/// Frames only ever borrow their parent, so a loop iteration or component
/// can add names without touching the scope it was entered from.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    vars: Bindings,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'static> {
    /// Create an empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root scope holding the given bindings.
    pub fn root(bindings: Bindings) -> Self {
        Self {
            vars: bindings,
            parent: None,
        }
    }
}

impl<'a> Scope<'a> {
    /// Push a new, empty frame on top of this one.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            vars: Bindings::default(),
            parent: Some(self),
        }
    }

    /// Bind a name in this frame, shadowing any outer binding.
    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Resolve a name, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some(value) = scope.vars.get(name) {
                return Some(value);
            }
            frame = scope.parent;
        }
        None
    }

    /// Resolve a name, yielding null when it is bound nowhere.
    pub fn get(&self, name: &str) -> Value {
        self.lookup(name).cloned().unwrap_or_default()
    }

    /// Check whether a name is bound in any frame.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Bindings in this frame only.
    pub fn frame(&self) -> &Bindings {
        &self.vars
    }

    /// Number of frames, counting this one.
    pub fn depth(&self) -> usize {
        1 + self.parent.map_or(0, Scope::depth)
    }
}
