use std::{any::Any, cell::RefCell, hash::Hash, rc::Rc};

use dataloader::{Dataloader, Loader, Source};
use engine_parser::{types::Field, Positioned};
use engine_value::{ConstValue, Name, Variables};
use indexmap::IndexMap;

use crate::{registry::MetaField, Data, ErrorPath, FieldError, Schema};

/// State shared by every field of one query.
pub(crate) struct QueryEnv {
    pub schema: Schema,
    pub variables: Variables,
    pub request_data: Data,
    pub multiplex_data: Rc<Data>,
    pub dataloader: Rc<Dataloader>,
    pub extensions: RefCell<IndexMap<String, serde_json::Value>>,
}

/// What a resolver gets to know about the field it resolves.
pub struct ResolverContext<'a> {
    /// The object type the field is selected on.
    pub parent_type: &'a str,
    pub field: &'a MetaField,
    /// The value of the parent object.
    pub parent: &'a serde_json::Value,
    /// Coerced arguments, with defaults applied.
    pub args: &'a IndexMap<Name, ConstValue>,
    pub path: &'a ErrorPath,
    /// The first field of the document merged into this one.
    pub item: &'a Positioned<Field>,
    pub(crate) env: &'a QueryEnv,
}

impl<'a> ResolverContext<'a> {
    /// Data of type `D`, looked up in the request, then the multiplex, then the schema.
    pub fn data<D: Any>(&self) -> Result<&'a D, FieldError> {
        self.data_opt::<D>()
            .ok_or_else(|| FieldError::new(format!("Data `{}` does not exist.", std::any::type_name::<D>())))
    }

    pub fn data_opt<D: Any>(&self) -> Option<&'a D> {
        self.env
            .request_data
            .get::<D>()
            .or_else(|| self.env.multiplex_data.get::<D>())
            .or_else(|| self.env.schema.data.get::<D>())
    }

    /// The dataloader of the running multiplex.
    pub fn dataloader(&self) -> &'a Rc<Dataloader> {
        &self.env.dataloader
    }

    /// The batch source for loaders of type `L`, shared by every query of the multiplex.
    pub fn loader<K, L>(&self, loader: L) -> Rc<Source<K, L>>
    where
        K: Eq + Hash + Clone + 'static,
        L: Loader<K>,
    {
        self.env.dataloader.with(loader)
    }

    pub fn arg(&self, name: &str) -> Option<&'a ConstValue> {
        self.args.get(name)
    }

    pub fn variables(&self) -> &'a Variables {
        &self.env.variables
    }

    pub fn field_name(&self) -> &'a str {
        &self.item.node.name.node
    }

    pub fn response_key(&self) -> &'a str {
        &self.item.node.response_key().node
    }

    /// Adds an entry to the `extensions` of the response, replacing any previous value.
    pub fn add_extension(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.env.extensions.borrow_mut().insert(key.into(), value.into());
    }
}
