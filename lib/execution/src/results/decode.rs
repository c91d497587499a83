use crate::QueryError;
use quadlite_model::{vocab, Literal, LiteralTag, Resource, ResourceId, Term};
use quadlite_storage::encoding::literal_from_sql;
use quadlite_storage::QuadStore;
use rusqlite::types::ValueRef;
use rusqlite::Row;
use rustc_hash::FxHashMap;

/// A value of a result column before its resources have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Binding {
    Resource(ResourceId),
    Literal(Literal),
}

impl Binding {
    /// Decodes the value and tag columns of a variable. A `NULL` value is an unbound variable and
    /// a `NULL` tag marks a resource.
    pub(crate) fn from_sql(
        value: ValueRef<'_>,
        tag: ValueRef<'_>,
    ) -> Result<Option<Self>, QueryError> {
        match (value, tag) {
            (ValueRef::Null, _) => Ok(None),
            (ValueRef::Integer(id), ValueRef::Null) => {
                Ok(Some(Binding::Resource(ResourceId::new(id))))
            }
            (_, ValueRef::Null) => Err(QueryError::InternalError(
                "A resource column holds a value that is not an id.".to_owned(),
            )),
            (value, tag) => Ok(literal_from_sql(value, tag)?.map(Binding::Literal)),
        }
    }

    /// Decodes the columns `2 * i` and `2 * i + 1` for every variable `i` of a row.
    pub(crate) fn from_row(row: &Row<'_>, width: usize) -> Result<Vec<Option<Self>>, QueryError> {
        (0..width)
            .map(|i| Binding::from_sql(row.get_ref(2 * i)?, row.get_ref(2 * i + 1)?))
            .collect()
    }
}

/// Turns bindings into terms by resolving their resources. Identifier strings are cached for
/// the lifetime of the decoder.
pub(crate) struct RowDecoder<'store> {
    store: &'store QuadStore,
    iris: FxHashMap<ResourceId, String>,
}

impl<'store> RowDecoder<'store> {
    pub(crate) fn new(store: &'store QuadStore) -> Self {
        Self {
            store,
            iris: FxHashMap::default(),
        }
    }

    pub(crate) fn term(&mut self, binding: Binding) -> Result<Term, QueryError> {
        match binding {
            Binding::Resource(id) if id.is_blank_node() => Ok(Term::BlankNode(id)),
            Binding::Resource(id) => Ok(Term::Resource(Resource::new(id, self.iri(id)?))),
            Binding::Literal(literal) => {
                if let LiteralTag::Datatype(datatype) = literal.tag() {
                    if vocab::builtin_iri(*datatype).is_none() {
                        self.iri(*datatype)?;
                    }
                }
                Ok(Term::Literal(literal))
            }
        }
    }

    fn iri(&mut self, id: ResourceId) -> Result<String, QueryError> {
        if let Some(iri) = self.iris.get(&id) {
            return Ok(iri.clone());
        }
        let iri = self.store.resolve(id)?;
        self.iris.insert(id, iri.clone());
        Ok(iri)
    }

    /// Returns the identifier strings of all decoded resources.
    pub(crate) fn into_iris(self) -> FxHashMap<ResourceId, String> {
        self.iris
    }
}
