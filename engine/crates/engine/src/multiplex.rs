//! Running several queries together.
//!
//! Every query of a multiplex shares one [`Dataloader`]. All queries begin first, then the
//! deferred work of all of them is completed wave after wave, so that a [`dataloader::Source`]
//! sees the keys requested by every query before it loads anything.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use dataloader::Dataloader;

use crate::{
    execution::{QueryEnv, QueryExecution},
    query::{complexity_error, prepare},
    Data, GraphqlError, MultiplexError, Request, Response, Schema,
};

/// A batch of requests executed against the same schema.
pub struct Multiplex {
    schema: Schema,
    requests: Vec<Request>,
    data: Data,
    max_complexity: Option<usize>,
}

impl Multiplex {
    pub fn new(schema: Schema, requests: impl IntoIterator<Item = Request>) -> Self {
        Multiplex {
            schema,
            requests: requests.into_iter().collect(),
            data: Data::default(),
            max_complexity: None,
        }
    }

    /// Data shared by every query of the multiplex, looked up after the data of the request.
    #[must_use]
    pub fn data<D: Any>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Limits the complexity of all queries together. When the sum goes over, none of them
    /// begins.
    #[must_use]
    pub fn max_complexity(mut self, max_complexity: Option<usize>) -> Self {
        self.max_complexity = max_complexity;
        self
    }

    /// Runs every query and returns their responses in order.
    ///
    /// A [`crate::FieldError::Internal`] raised anywhere fails the whole multiplex.
    pub fn run(self) -> Result<Vec<Response>, MultiplexError> {
        let span = tracing::info_span!("execute_multiplex", queries = self.requests.len());
        let _guard = span.enter();

        let dataloader = Rc::new(Dataloader::default());
        let multiplex_data = Rc::new(self.data);

        let mut runs = self
            .requests
            .into_iter()
            .map(|request| match prepare(&self.schema, &request) {
                Err(errors) => QueryRun::Invalid(errors),
                Ok(None) => QueryRun::NoOperation,
                Ok(Some(prepared)) => {
                    let env = QueryEnv {
                        schema: self.schema.clone(),
                        variables: prepared.variables,
                        request_data: request.data,
                        multiplex_data: Rc::clone(&multiplex_data),
                        dataloader: Rc::clone(&dataloader),
                        extensions: RefCell::default(),
                    };
                    QueryRun::Running(Box::new(QueryExecution::new(env, prepared.irep)))
                }
            })
            .collect::<Vec<_>>();

        if let Some(max_complexity) = self.max_complexity {
            let complexity = runs.iter().map(QueryRun::complexity).sum::<usize>();
            if complexity > max_complexity {
                tracing::debug!(complexity, max_complexity, "multiplex rejected");
                for run in &mut runs {
                    if matches!(run, QueryRun::Running(_)) {
                        *run = QueryRun::Invalid(vec![complexity_error(complexity, max_complexity)]);
                    }
                }
            }
        }

        let state = Rc::new(RunState {
            runs: runs.into_iter().map(RefCell::new).collect(),
            fatal: RefCell::new(None),
            waves: Cell::new(0),
        });

        for index in 0..state.runs.len() {
            let state = Rc::clone(&state);
            dataloader.append_job(move || state.begin(index));
        }
        dataloader.run();

        schedule_wave(Rc::downgrade(&dataloader), Rc::clone(&state));
        dataloader.run();

        if let Some(error) = state.fatal.take() {
            return Err(error);
        }

        let responses = state
            .runs
            .iter()
            .enumerate()
            .map(|(index, run)| {
                let response = run.replace(QueryRun::NoOperation).finish();
                tracing::debug!(query = index, errors = response.errors.len(), "query finished");
                response
            })
            .collect();
        Ok(responses)
    }
}

enum QueryRun {
    /// Rejected before it could begin.
    Invalid(Vec<GraphqlError>),
    NoOperation,
    Running(Box<QueryExecution>),
}

impl QueryRun {
    fn complexity(&self) -> usize {
        match self {
            QueryRun::Running(execution) => execution.complexity(),
            QueryRun::Invalid(_) | QueryRun::NoOperation => 0,
        }
    }

    fn finish(self) -> Response {
        match self {
            QueryRun::Invalid(errors) => Response::from_errors(errors),
            QueryRun::NoOperation => Response::default(),
            QueryRun::Running(execution) => execution.finish(),
        }
    }
}

struct RunState {
    runs: Vec<RefCell<QueryRun>>,
    fatal: RefCell<Option<MultiplexError>>,
    waves: Cell<usize>,
}

impl RunState {
    fn begin(&self, index: usize) {
        if self.fatal.borrow().is_some() {
            return;
        }
        if let QueryRun::Running(execution) = &mut *self.runs[index].borrow_mut() {
            tracing::debug!(query = index, "query began");
            if let Err(error) = execution.begin() {
                self.fail(error);
            }
        }
    }

    /// Completes the lazy values of every query, one query after the other.
    fn wave(&self) {
        let wave = self.waves.get() + 1;
        self.waves.set(wave);
        tracing::debug!(wave, "lazy wave");

        for run in &self.runs {
            if self.fatal.borrow().is_some() {
                return;
            }
            if let QueryRun::Running(execution) = &mut *run.borrow_mut() {
                if let Err(error) = execution.resolve_wave() {
                    self.fail(error);
                }
            }
        }
    }

    fn has_pending(&self) -> bool {
        self.fatal.borrow().is_none()
            && self
                .runs
                .iter()
                .any(|run| matches!(&*run.borrow(), QueryRun::Running(execution) if execution.has_pending()))
    }

    fn fail(&self, error: MultiplexError) {
        tracing::warn!(%error, "multiplex failed");
        self.fatal.borrow_mut().get_or_insert(error);
    }
}

/// Queues a job completing the current wave of lazy values, which queues the next one for as
/// long as there are any. Loads requested during a wave are flushed by jobs queued before it.
fn schedule_wave(dataloader: Weak<Dataloader>, state: Rc<RunState>) {
    let Some(loader) = dataloader.upgrade() else {
        return;
    };
    loader.append_job(move || {
        state.wave();
        if state.has_pending() {
            schedule_wave(dataloader, state);
        }
    });
}
