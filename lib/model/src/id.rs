use std::fmt::{Display, Formatter};

/// Ids below this value are reserved for the built-in vocabulary.
///
/// The first resource interned by a store receives exactly this id.
pub const RESERVED_RESOURCE_LIMIT: i64 = 300;

/// The id of a resource in the resource dictionary.
///
/// # Blank Nodes
///
/// Negative ids denote blank nodes. They are minted from a separate counter and have no entry in
/// the dictionary. A blank node id is only meaningful for the store that created it.
///
/// # Unknown Resources
///
/// [ResourceId::UNKNOWN] is substituted for identifiers that could not be resolved while compiling
/// a query in permissive mode. No stored row ever refers to it.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct ResourceId(i64);

impl ResourceId {
    pub const UNKNOWN: ResourceId = ResourceId(0);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    pub const fn is_blank_node(self) -> bool {
        self.0 < 0
    }

    pub const fn is_builtin(self) -> bool {
        self.0 > 0 && self.0 < RESERVED_RESOURCE_LIMIT
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_blank_node() {
            write!(f, "_:b{}", -self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The id of a context (a named partition of the triples).
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct ContextId(i64);

impl ContextId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for ContextId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
