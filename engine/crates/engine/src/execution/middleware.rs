use std::rc::Rc;

use super::{FieldValue, ResolverContext};
use crate::FieldError;

/// Wraps every resolver call of a schema.
///
/// Middlewares run in registration order. Each one either hands the call on with
/// [`Next::run`] or returns a value of its own, in which case the resolver never runs.
pub trait FieldMiddleware {
    fn resolve(&self, ctx: &ResolverContext<'_>, next: Next<'_>) -> Result<FieldValue, FieldError>;
}

impl<F> FieldMiddleware for F
where
    F: Fn(&ResolverContext<'_>, Next<'_>) -> Result<FieldValue, FieldError>,
{
    fn resolve(&self, ctx: &ResolverContext<'_>, next: Next<'_>) -> Result<FieldValue, FieldError> {
        self(ctx, next)
    }
}

type Resolve<'a> = &'a dyn Fn(&ResolverContext<'_>) -> Result<FieldValue, FieldError>;

/// The rest of the chain.
pub struct Next<'a> {
    chain: &'a [Rc<dyn FieldMiddleware>],
    resolver: Resolve<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Rc<dyn FieldMiddleware>], resolver: Resolve<'a>) -> Self {
        Next { chain, resolver }
    }

    pub fn run(self, ctx: &ResolverContext<'_>) -> Result<FieldValue, FieldError> {
        match self.chain.split_first() {
            Some((first, rest)) => first.resolve(
                ctx,
                Next {
                    chain: rest,
                    resolver: self.resolver,
                },
            ),
            None => (self.resolver)(ctx),
        }
    }
}
