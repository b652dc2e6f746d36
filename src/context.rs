use crate::position::Position;
use std::rc::Rc;

/// One frame of the call stack, kept only to build tracebacks.
#[derive(Debug)]
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    /// Where `parent` was when it entered this frame.
    pub entry: Option<Position>,
}

impl Context {
    pub fn root(display_name: &str) -> Rc<Context> {
        Rc::new(Context {
            display_name: display_name.to_string(),
            parent: None,
            entry: None,
        })
    }

    pub fn child(parent: &Rc<Context>, display_name: &str, entry: Position) -> Rc<Context> {
        Rc::new(Context {
            display_name: display_name.to_string(),
            parent: Some(Rc::clone(parent)),
            entry: Some(entry),
        })
    }

    /// Number of frames from this one up to the root, inclusive.
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |p| p.depth())
    }
}
