use std::{any::Any, ops::Deref, rc::Rc};

use crate::{
    registry::{MetaType, Registry},
    Data, ExecutionConfig, FieldMiddleware, Multiplex, MultiplexError, Request, Response, SchemaError,
};

/// Schema builder
pub struct SchemaBuilder {
    registry: Registry,
    config: ExecutionConfig,
    middleware: Vec<Rc<dyn FieldMiddleware>>,
    data: Data,
}

impl SchemaBuilder {
    /// Register a type, replacing any type of the same name.
    #[must_use]
    pub fn register(mut self, ty: impl Into<MetaType>) -> Self {
        self.registry.insert_type(ty);
        self
    }

    /// Name the type that holds the query root fields. Defaults to `Query`.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.registry.query_type = name.into();
        self
    }

    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.registry.mutation_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.registry.subscription_type = Some(name.into());
        self
    }

    /// Add a middleware around every resolver call. Middlewares run in the order they are added.
    #[must_use]
    pub fn middleware(mut self, middleware: impl FieldMiddleware + 'static) -> Self {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// Set the maximum complexity a query can have. By default, there is no limit.
    #[must_use]
    pub fn limit_complexity(mut self, complexity: usize) -> Self {
        self.config.max_complexity = Some(complexity);
        self
    }

    /// Set the maximum depth a query can have. By default, there is no limit.
    #[must_use]
    pub fn limit_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a global data that can be accessed in the `Schema`. You access it with
    /// `ResolverContext::data`.
    #[must_use]
    pub fn data<D: Any>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Build schema.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        self.registry.check()?;
        Ok(Schema(Rc::new(SchemaInner {
            registry: self.registry,
            config: self.config,
            middleware: self.middleware,
            data: self.data,
        })))
    }
}

pub struct SchemaInner {
    pub(crate) registry: Registry,
    pub(crate) config: ExecutionConfig,
    pub(crate) middleware: Vec<Rc<dyn FieldMiddleware>>,
    pub(crate) data: Data,
}

/// GraphQL schema.
///
/// Cloning a schema is cheap, clones share the same content.
#[derive(Clone)]
pub struct Schema(Rc<SchemaInner>);

impl Deref for Schema {
    type Target = SchemaInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Schema {
    /// Create a schema builder around `registry`.
    pub fn build(registry: Registry) -> SchemaBuilder {
        SchemaBuilder {
            registry,
            config: ExecutionConfig::default(),
            middleware: Vec::new(),
            data: Data::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Execute a single request in a multiplex of its own.
    pub fn execute(&self, request: impl Into<Request>) -> Result<Response, MultiplexError> {
        let mut responses = self.multiplex([request.into()]).run()?;
        Ok(responses.pop().unwrap_or_default())
    }

    /// Execute several requests together so that their lazy values are loaded in shared
    /// batches. Responses come back in the order of the requests.
    pub fn run_all(&self, requests: impl IntoIterator<Item = Request>) -> Result<Vec<Response>, MultiplexError> {
        self.multiplex(requests).run()
    }

    /// A multiplex of `requests`, to add shared data or a complexity budget before running it.
    pub fn multiplex(&self, requests: impl IntoIterator<Item = Request>) -> Multiplex {
        Multiplex::new(self.clone(), requests)
    }
}
