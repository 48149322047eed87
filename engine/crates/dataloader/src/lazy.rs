use std::{cell::RefCell, fmt, rc::Rc};

/// A deferred computation that runs at most once.
///
/// Errors returned by the thunk are memoized like any other result, so a chain of lazies
/// carries an error as a value until someone decides to surface it. Clones share the same
/// state: forcing one forces them all.
pub struct Lazy<T, E>(Rc<RefCell<State<T, E>>>);

enum State<T, E> {
    Pending(Box<dyn FnOnce() -> Result<T, E>>),
    Forcing,
    Resolved(Result<T, E>),
}

impl<T, E> Clone for Lazy<T, E> {
    fn clone(&self) -> Self {
        Lazy(Rc::clone(&self.0))
    }
}

impl<T, E> fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy")
            .field(&if self.is_resolved() { "resolved" } else { "pending" })
            .finish()
    }
}

impl<T, E> Lazy<T, E> {
    pub fn new(thunk: impl FnOnce() -> Result<T, E> + 'static) -> Self {
        Lazy(Rc::new(RefCell::new(State::Pending(Box::new(thunk)))))
    }

    /// An already resolved lazy.
    pub fn ready(result: Result<T, E>) -> Self {
        Lazy(Rc::new(RefCell::new(State::Resolved(result))))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.0.borrow(), State::Resolved(_))
    }

    /// Whether both handles share the same computation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Runs the thunk if it has not run yet.
    ///
    /// # Panics
    ///
    /// A thunk must not force the lazy it belongs to, directly or through another lazy
    /// depending on it. Such a cycle panics.
    pub fn force(&self) {
        let state = std::mem::replace(&mut *self.0.borrow_mut(), State::Forcing);
        let resolved = match state {
            State::Pending(thunk) => thunk(),
            State::Resolved(result) => result,
            State::Forcing => unreachable!("a lazy value was forced from its own thunk"),
        };
        *self.0.borrow_mut() = State::Resolved(resolved);
    }
}

impl<T: Clone, E: Clone> Lazy<T, E> {
    /// The result of the computation, running it first if needed.
    ///
    /// # Panics
    ///
    /// When called from the lazy's own thunk, see [`Lazy::force`].
    pub fn value(&self) -> Result<T, E> {
        self.force();
        match &*self.0.borrow() {
            State::Resolved(result) => result.clone(),
            State::Pending(_) | State::Forcing => unreachable!("a forced lazy value is resolved"),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Lazy<T, E> {
    /// A new lazy applying `f` to the result of this one. Nothing runs until the new lazy is
    /// forced.
    pub fn then<U, F>(&self, f: impl FnOnce(Result<T, E>) -> Result<U, F> + 'static) -> Lazy<U, F> {
        let source = self.clone();
        Lazy::new(move || f(source.value()))
    }
}

/// A value that may be, or may contain, lazies.
pub trait LazyTree<E>: Sized {
    /// Hands out the lazy this value is, or gives the value back if it is not one.
    fn into_lazy(self) -> Result<Lazy<Self, E>, Self>;

    /// Rebuilds the value with `f` applied to each direct child.
    fn try_map_children(self, f: &mut dyn FnMut(Self) -> Result<Self, E>) -> Result<Self, E>;
}

impl<T: LazyTree<E> + Clone, E: Clone> Lazy<T, E> {
    /// Replaces every lazy in `value` with its result, at any depth. A lazy producing another
    /// lazy is forced again until a plain value comes out.
    pub fn resolve_deep(value: T) -> Result<T, E> {
        let mut value = value;
        loop {
            match value.into_lazy() {
                Ok(lazy) => value = lazy.value()?,
                Err(plain) => {
                    value = plain;
                    break;
                }
            }
        }
        value.try_map_children(&mut |child| Self::resolve_deep(child))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn thunk_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let lazy = {
            let calls = calls.clone();
            Lazy::<_, ()>::new(move || {
                calls.set(calls.get() + 1);
                Ok(42)
            })
        };
        assert_eq!(calls.get(), 0);

        let doubled = lazy.then(|value| value.map(|n| n * 2));
        let plus_one = lazy.then(|value| value.map(|n| n + 1));
        assert_eq!(calls.get(), 0);

        assert_eq!(doubled.value(), Ok(84));
        assert_eq!(plus_one.value(), Ok(43));
        assert_eq!(lazy.value(), Ok(42));
        assert_eq!(lazy.clone().value(), Ok(42));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn errors_are_memoized() {
        let calls = Rc::new(Cell::new(0));
        let lazy = {
            let calls = calls.clone();
            Lazy::<i32, String>::new(move || {
                calls.set(calls.get() + 1);
                Err("boom".into())
            })
        };

        assert_eq!(lazy.value(), Err("boom".to_string()));
        assert_eq!(lazy.value(), Err("boom".to_string()));
        assert_eq!(calls.get(), 1);

        let recovered = lazy.then(|result| Ok::<_, String>(result.unwrap_or(0)));
        assert_eq!(recovered.value(), Ok(0));
    }

    #[test]
    fn then_is_lazy() {
        let ran = Rc::new(Cell::new(false));
        let chained = {
            let ran = ran.clone();
            Lazy::<_, ()>::ready(Ok(1)).then(move |value| {
                ran.set(true);
                value
            })
        };
        assert!(!ran.get());
        assert!(!chained.is_resolved());
        assert_eq!(chained.value(), Ok(1));
        assert!(ran.get());
    }

    #[test]
    #[should_panic(expected = "a lazy value was forced from its own thunk")]
    fn forcing_from_its_own_thunk_panics() {
        let slot: Rc<RefCell<Option<Lazy<i32, ()>>>> = Rc::default();
        let lazy = {
            let slot = Rc::clone(&slot);
            Lazy::new(move || slot.borrow().as_ref().map_or(Ok(0), Lazy::value))
        };
        *slot.borrow_mut() = Some(lazy.clone());
        lazy.force();
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Tree {
        Leaf(i32),
        List(Vec<Tree>),
        Lazy(Lazy<Tree, String>),
    }

    impl PartialEq for Lazy<Tree, String> {
        fn eq(&self, other: &Self) -> bool {
            self.ptr_eq(other)
        }
    }

    impl LazyTree<String> for Tree {
        fn into_lazy(self) -> Result<Lazy<Self, String>, Self> {
            match self {
                Tree::Lazy(lazy) => Ok(lazy),
                other => Err(other),
            }
        }

        fn try_map_children(self, f: &mut dyn FnMut(Self) -> Result<Self, String>) -> Result<Self, String> {
            match self {
                Tree::List(items) => Ok(Tree::List(items.into_iter().map(f).collect::<Result<_, _>>()?)),
                other => Ok(other),
            }
        }
    }

    #[test]
    fn resolve_deep_forces_nested_chains() {
        let inner = Lazy::new(|| Ok(Tree::Lazy(Lazy::new(|| Ok(Tree::Leaf(3))))));
        let tree = Tree::List(vec![
            Tree::Leaf(1),
            Tree::Lazy(Lazy::new(|| Ok(Tree::List(vec![Tree::Leaf(2), Tree::Lazy(inner)])))),
        ]);

        assert_eq!(
            Lazy::resolve_deep(tree),
            Ok(Tree::List(vec![
                Tree::Leaf(1),
                Tree::List(vec![Tree::Leaf(2), Tree::Leaf(3)])
            ]))
        );
    }

    #[test]
    fn resolve_deep_stops_at_the_first_error() {
        let tree = Tree::List(vec![Tree::Lazy(Lazy::new(|| Err("nope".to_string())))]);
        assert_eq!(Lazy::resolve_deep(tree), Err("nope".to_string()));
    }
}
