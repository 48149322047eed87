//! Resolving fields and assembling the response of a query.

mod context;
mod executor;
mod middleware;
mod response_tree;
mod value;

pub(crate) use self::{context::QueryEnv, executor::QueryExecution};
pub use self::{
    context::ResolverContext,
    middleware::{FieldMiddleware, Next},
    value::FieldValue,
};
