use crate::PatternError;
use quadlite_model::{vocab, ContextId, ResourceId};

/// What a predicate says about the kind of its objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    /// The objects are always resources.
    Reference,
    /// The objects are always literals.
    Literal,
    Unknown,
}

/// Resolves the identifiers of a query against a resource dictionary.
pub trait TermResolver {
    /// Returns the id of `iri` or [None] if it is not known.
    fn resolve_iri(&self, iri: &str) -> Result<Option<ResourceId>, PatternError>;

    /// Returns the context named `iri` or [None] if it does not exist.
    fn resolve_context(&self, iri: &str) -> Result<Option<ContextId>, PatternError>;

    /// Returns the kind of the objects of `predicate`.
    ///
    /// The default implementation only knows the built-in vocabulary.
    fn predicate_kind(&self, predicate: ResourceId) -> Result<PredicateKind, PatternError> {
        Ok(builtin_predicate_kind(predicate))
    }
}

pub fn builtin_predicate_kind(predicate: ResourceId) -> PredicateKind {
    if vocab::is_reference_predicate(predicate) {
        PredicateKind::Reference
    } else if vocab::is_literal_predicate(predicate) {
        PredicateKind::Literal
    } else {
        PredicateKind::Unknown
    }
}

/// Resolves only the built-in vocabulary. Useful for inspecting the algebra of a query without a
/// store.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolver;

impl TermResolver for BuiltinResolver {
    fn resolve_iri(&self, iri: &str) -> Result<Option<ResourceId>, PatternError> {
        Ok(vocab::builtin_id(iri))
    }

    fn resolve_context(&self, _iri: &str) -> Result<Option<ContextId>, PatternError> {
        Ok(None)
    }
}
