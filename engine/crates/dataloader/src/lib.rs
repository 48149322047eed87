//! Deferred values and batched loading for the execution engine.
//!
//! A [`Lazy`] is a computation that runs at most once. A [`Dataloader`] is a queue of jobs that
//! catch up on deferred work; [`Source`]s built on top of it gather the keys requested by every
//! field of every query in a multiplex and load them with a single call to their [`Loader`].
//!
//! Everything here is single threaded: "concurrency" is the interleaving of deferred work.

mod lazy;
mod source;

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::{HashMap, VecDeque},
    hash::Hash,
    rc::Rc,
};

pub use lazy::{Lazy, LazyTree};
pub use source::{Loader, Source};

type Job = Box<dyn FnOnce()>;

/// A FIFO queue of jobs plus the batch sources of one multiplex run.
#[derive(Default)]
pub struct Dataloader {
    jobs: RefCell<VecDeque<Job>>,
    sources: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Dataloader {
    /// Queues a job for the next [`Dataloader::run`].
    pub fn append_job(&self, job: impl FnOnce() + 'static) {
        self.jobs.borrow_mut().push_back(Box::new(job));
    }

    pub fn has_pending_jobs(&self) -> bool {
        !self.jobs.borrow().is_empty()
    }

    /// Runs jobs in the order they were queued until none are left, including the ones queued
    /// by jobs run during this call. Every job runs exactly once.
    pub fn run(&self) {
        let mut ran = 0usize;
        loop {
            // The queue must not stay borrowed while a job runs: jobs queue more jobs.
            let job = self.jobs.borrow_mut().pop_front();
            match job {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => break,
            }
        }
        tracing::debug!(jobs = ran, "dataloader drained");
    }

    /// The source for loaders of type `L`, created from `loader` on first use. Later calls
    /// return the existing source and drop `loader`.
    pub fn with<K, L>(self: &Rc<Self>, loader: L) -> Rc<Source<K, L>>
    where
        K: Eq + Hash + Clone + 'static,
        L: Loader<K>,
    {
        let type_id = TypeId::of::<Source<K, L>>();

        let existing = self.sources.borrow().get(&type_id).cloned();
        if let Some(source) = existing.and_then(|source| source.downcast::<Source<K, L>>().ok()) {
            return source;
        }

        let source = Rc::new(Source::new(loader, Rc::downgrade(self)));
        self.sources
            .borrow_mut()
            .insert(type_id, Rc::clone(&source) as Rc<dyn Any>);
        source
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn run_drains_jobs_queued_by_jobs() {
        let dataloader = Rc::new(Dataloader::default());
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["a", "b"] {
            let log = log.clone();
            let inner = Rc::downgrade(&dataloader);
            dataloader.append_job(move || {
                log.borrow_mut().push(name.to_string());
                if let Some(dataloader) = inner.upgrade() {
                    let log = log.clone();
                    dataloader.append_job(move || log.borrow_mut().push(format!("{name}-child")));
                }
            });
        }

        dataloader.run();
        assert_eq!(*log.borrow(), vec!["a", "b", "a-child", "b-child"]);
        assert!(!dataloader.has_pending_jobs());

        // Nothing runs twice.
        dataloader.run();
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn deep_job_chains_do_not_recurse() {
        fn chain(dataloader: Rc<Dataloader>, remaining: usize, count: Rc<RefCell<usize>>) {
            *count.borrow_mut() += 1;
            if remaining > 0 {
                let next = dataloader.clone();
                dataloader.append_job(move || chain(next, remaining - 1, count));
            }
        }

        let dataloader = Rc::new(Dataloader::default());
        let count = Rc::new(RefCell::new(0));
        let (next, counter) = (dataloader.clone(), count.clone());
        dataloader.append_job(move || chain(next, 100_000, counter));
        dataloader.run();

        assert_eq!(*count.borrow(), 100_001);
    }
}
