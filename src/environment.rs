use crate::shared_list::SharedList;
use crate::value::Value;
use std::collections::BTreeMap;

type Scope = BTreeMap<String, Value>;

/// A chain of scopes. `define` always writes the innermost scope; `get` searches outward.
/// Clones share scopes, which is how closures see later definitions in their defining scope.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: SharedList<Scope>,
}

impl Environment {
    pub fn new() -> Environment {
        let mut scopes = SharedList::new();
        scopes.push(Scope::new());
        Environment { scopes }
    }

    /// A new innermost scope whose parent is `self`.
    pub fn new_child(&self) -> Environment {
        let mut scopes = self.scopes.clone();
        scopes.push(Scope::new());
        Environment { scopes }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        let previous = self
            .scopes
            .peek_mut()
            .and_then(|mut scope| scope.insert(name.to_string(), value));
        // The old value may own a closure over this very scope, so it must not be dropped
        // while the scope is borrowed.
        drop(previous);
    }

    /// A copy of the nearest binding of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.scopes.find_map(|scope| scope.get(name).cloned())
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
