use crate::{Literal, ResourceId};
use std::fmt::{Display, Formatter};

/// A resource of the dictionary together with its identifier string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    id: ResourceId,
    iri: String,
}

impl Resource {
    pub fn new(id: ResourceId, iri: impl Into<String>) -> Self {
        Self {
            id,
            iri: iri.into(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn into_iri(self) -> String {
        self.iri
    }
}

/// A decoded value of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Resource(Resource),
    BlankNode(ResourceId),
    Literal(Literal),
}

impl Term {
    /// Returns the resource id of a resource or blank node.
    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            Term::Resource(resource) => Some(resource.id()),
            Term::BlankNode(id) => Some(*id),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn iri(&self) -> Option<&str> {
        match self {
            Term::Resource(resource) => Some(resource.iri()),
            _ => None,
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Resource(resource) => write!(f, "<{}>", resource.iri()),
            Term::BlankNode(id) => write!(f, "{id}"),
            Term::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

/// A runtime parameter of a prepared query.
///
/// Parameters are either an explicit resource id or a literal. The literal's tag is bound as a
/// second, implicit parameter wherever the compiled statement needs it.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Resource(ResourceId),
    Literal(Literal),
}

impl From<ResourceId> for Parameter {
    fn from(value: ResourceId) -> Self {
        Parameter::Resource(value)
    }
}

impl From<Literal> for Parameter {
    fn from(value: Literal) -> Self {
        Parameter::Literal(value)
    }
}

macro_rules! literal_parameter {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Parameter {
                fn from(value: $t) -> Self {
                    Parameter::Literal(Literal::from(value))
                }
            }
        )*
    };
}

literal_parameter!(i64, f64, bool, &str, String);
