use quadlite_logical::{builtin_predicate_kind, PatternError, PredicateKind, TermResolver};
use quadlite_model::vocab::{owl, rdf};
use quadlite_model::{ContextId, ResourceId};
use quadlite_storage::{QuadStore, ReferencePattern, StorageError};

/// Resolves the identifiers of a query against the dictionary of a [QuadStore].
///
/// Besides the built-in vocabulary, a predicate that is declared an `owl:ObjectProperty` or an
/// `owl:DatatypeProperty` in any context has a known kind.
pub struct StoreResolver<'store> {
    store: &'store QuadStore,
}

impl<'store> StoreResolver<'store> {
    pub fn new(store: &'store QuadStore) -> Self {
        Self { store }
    }

    fn is_declared(&self, predicate: ResourceId, class: ResourceId) -> Result<bool, PatternError> {
        let pattern = ReferencePattern::new()
            .with_subject(predicate)
            .with_predicate(rdf::TYPE)
            .with_object(class);
        self.store.contains_reference(&pattern).map_err(storage_error)
    }
}

impl TermResolver for StoreResolver<'_> {
    fn resolve_iri(&self, iri: &str) -> Result<Option<ResourceId>, PatternError> {
        self.store.lookup(iri).map_err(storage_error)
    }

    fn resolve_context(&self, iri: &str) -> Result<Option<ContextId>, PatternError> {
        self.store.lookup_context(iri).map_err(storage_error)
    }

    fn predicate_kind(&self, predicate: ResourceId) -> Result<PredicateKind, PatternError> {
        let kind = builtin_predicate_kind(predicate);
        if kind != PredicateKind::Unknown || predicate.is_unknown() {
            return Ok(kind);
        }

        if self.is_declared(predicate, owl::OBJECT_PROPERTY)? {
            Ok(PredicateKind::Reference)
        } else if self.is_declared(predicate, owl::DATATYPE_PROPERTY)? {
            Ok(PredicateKind::Literal)
        } else {
            Ok(PredicateKind::Unknown)
        }
    }
}

fn storage_error(error: StorageError) -> PatternError {
    PatternError::Resolver(Box::new(error))
}
