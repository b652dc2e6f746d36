use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// A persistent stack whose nodes are shared between clones. Pushing onto a clone never
/// affects the original, but mutation through `peek_mut` is visible to every list that
/// shares the node.
#[derive(Debug)]
pub struct SharedList<T> {
    head: Link<T>,
}

type Link<T> = Option<Rc<RefCell<Node<T>>>>;

#[derive(Debug)]
struct Node<T> {
    elem: T,
    next: Link<T>,
}

impl<T> Node<T> {
    fn new(elem: T, next: Link<T>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Node { elem, next }))
    }
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> SharedList<T> {
        SharedList {
            head: self.head.as_ref().map(Rc::clone),
        }
    }
}

impl<T> SharedList<T> {
    pub fn new() -> Self {
        SharedList { head: None }
    }

    pub fn push(&mut self, elem: T) {
        self.head = Some(Node::new(elem, self.head.take()));
    }

    pub fn peek_mut(&mut self) -> Option<RefMut<T>> {
        self.head
            .as_ref()
            .map(|node| RefMut::map(node.borrow_mut(), |node| &mut node.elem))
    }

    /// Walks from the head towards the tail and returns the first `Some` produced by `f`.
    pub fn find_map<R>(&self, mut f: impl FnMut(&T) -> Option<R>) -> Option<R> {
        let mut cur = self.head.clone();
        while let Some(node) = cur {
            let node = node.borrow();
            if let Some(found) = f(&node.elem) {
                return Some(found);
            }
            cur = node.next.clone();
        }
        None
    }

    pub fn len(&self) -> usize {
        let mut count = 0;
        self.find_map(|_| -> Option<()> {
            count += 1;
            None
        });
        count
    }
}

// Unlink node by node so long chains don't recurse in drop. Stops at the first node that
// another list still owns.
impl<T> Drop for SharedList<T> {
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            cur = match Rc::try_unwrap(node) {
                Ok(node) => node.into_inner().next,
                Err(_) => None,
            };
        }
    }
}
