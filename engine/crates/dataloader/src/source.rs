use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    hash::Hash,
    rc::{Rc, Weak},
};

use indexmap::IndexSet;

use crate::{Dataloader, Lazy};

/// Loads a batch of keys at once.
///
/// Keys missing from the returned map resolve to `None`.
pub trait Loader<K: Eq + Hash + Clone + 'static>: 'static {
    /// Type of value.
    type Value: Clone + 'static;
    /// Type of error.
    type Error: Clone + 'static;

    /// Load the data set specified by the `keys`.
    fn load(&self, keys: &[K]) -> Result<HashMap<K, Self::Value>, Self::Error>;
}

/// The batching cache of one [`Loader`] for the lifetime of a [`Dataloader`].
///
/// Keys requested with [`Source::load`] are queued and loaded together, either by the flush job
/// scheduled on the dataloader or by the first lazy that gets forced, whichever comes first.
/// Each key is loaded at most once.
pub struct Source<K, L>
where
    K: Eq + Hash + Clone + 'static,
    L: Loader<K>,
{
    loader: L,
    dataloader: Weak<Dataloader>,
    pending: RefCell<IndexSet<K>>,
    results: RefCell<HashMap<K, LoadResult<K, L>>>,
    scheduled: Cell<bool>,
}

type LoadResult<K, L> = Result<Option<<L as Loader<K>>::Value>, <L as Loader<K>>::Error>;

impl<K, L> Source<K, L>
where
    K: Eq + Hash + Clone + 'static,
    L: Loader<K>,
{
    pub(crate) fn new(loader: L, dataloader: Weak<Dataloader>) -> Self {
        Source {
            loader,
            dataloader,
            pending: RefCell::new(IndexSet::new()),
            results: RefCell::new(HashMap::new()),
            scheduled: Cell::new(false),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Requests `key`. The returned lazy resolves once the key has been loaded.
    pub fn load(self: &Rc<Self>, key: K) -> Lazy<Option<L::Value>, L::Error> {
        if !self.results.borrow().contains_key(&key) {
            self.pending.borrow_mut().insert(key.clone());
            self.schedule();
        }

        let source = Rc::clone(self);
        Lazy::new(move || {
            // Flushing for a key that is already loaded would split the keys queued since then
            // out of the next wave's batch.
            if !source.results.borrow().contains_key(&key) {
                source.sync();
            }
            source.result(&key)
        })
    }

    /// Requests several keys. The returned lazy resolves to their values in the same order.
    pub fn load_many(self: &Rc<Self>, keys: impl IntoIterator<Item = K>) -> Lazy<Vec<Option<L::Value>>, L::Error> {
        let lazies = keys.into_iter().map(|key| self.load(key)).collect::<Vec<_>>();
        Lazy::new(move || lazies.iter().map(Lazy::value).collect())
    }

    /// Whether keys are waiting to be loaded.
    pub fn is_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Loads every pending key with a single call to the loader.
    pub fn sync(&self) {
        self.scheduled.set(false);

        let keys = std::mem::take(&mut *self.pending.borrow_mut())
            .into_iter()
            .collect::<Vec<_>>();
        if keys.is_empty() {
            return;
        }

        tracing::debug!(
            loader = std::any::type_name::<L>(),
            keys = keys.len(),
            "loading batch"
        );
        let loaded = self.loader.load(&keys);

        let mut results = self.results.borrow_mut();
        match loaded {
            Ok(mut values) => {
                for key in keys {
                    let value = values.remove(&key);
                    results.insert(key, Ok(value));
                }
            }
            Err(error) => {
                for key in keys {
                    results.insert(key, Err(error.clone()));
                }
            }
        }
    }

    fn schedule(self: &Rc<Self>) {
        if self.scheduled.replace(true) {
            return;
        }
        if let Some(dataloader) = self.dataloader.upgrade() {
            let source = Rc::clone(self);
            dataloader.append_job(move || source.sync());
        }
    }

    fn result(&self, key: &K) -> LoadResult<K, L> {
        self.results.borrow().get(key).cloned().unwrap_or(Ok(None))
    }
}
