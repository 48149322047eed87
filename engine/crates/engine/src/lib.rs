//! Executes GraphQL documents against a [`Registry`] of types.
//!
//! A [`Schema`] is built from a registry, then runs [`Request`]s, alone with
//! [`Schema::execute`] or together with [`Schema::run_all`]. Requests run together form a
//! [`Multiplex`]: they share a [`Dataloader`], so that values deferred as [`Lazy`] by resolvers
//! of any of them are loaded in common batches.
//!
//! Before it begins, every query is parsed, its operation selected, its variables coerced and
//! its selections rewritten into an [`Irep`]. Execution then walks the irep, calling resolvers
//! through the [`FieldMiddleware`] chain and bubbling nulls up to the closest nullable field.
#![forbid(unsafe_code)]

mod config;
mod data;
mod error;
mod execution;
mod input;
mod multiplex;
mod path;
mod query;
pub mod registry;
mod request;
mod response;
mod rewrite;
mod schema;

pub use dataloader::{Dataloader, Lazy, Loader, Source};
pub use engine_parser as parser;
pub use engine_value::{ConstValue, Name, Variables};

pub use self::{
    config::ExecutionConfig,
    data::Data,
    error::{FieldError, GraphqlError, GraphqlResult, MultiplexError, SchemaError},
    execution::{FieldMiddleware, FieldValue, Next, ResolverContext},
    input::coerce_input_value,
    multiplex::Multiplex,
    path::{ErrorPath, ErrorPathSegment},
    registry::Registry,
    request::Request,
    response::Response,
    rewrite::{rewrite, Irep, IrepChildren, IrepNode},
    schema::{Schema, SchemaBuilder, SchemaInner},
};
