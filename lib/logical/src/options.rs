use quadlite_model::vocab::DEFAULT_PREFIXES;
use std::collections::BTreeMap;

/// Options that influence how a query is parsed and compiled.
///
/// Two queries with the same text and equal options compile to the same statement, which makes
/// the options part of the key of prepared-query caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryOptions {
    /// Unknown identifiers are an error if set. Otherwise they are replaced by
    /// [ResourceId::UNKNOWN](quadlite_model::ResourceId::UNKNOWN), which matches nothing.
    pub strict: bool,
    /// Prefixes that are available without a `PREFIX` declaration.
    pub prefixes: BTreeMap<String, String>,
    /// Joins a single-row table into queries with `EXISTS` filters so that SQLite evaluates the
    /// correlated subqueries after the other joins.
    pub deprioritize_exists: bool,
    /// Caps the number of steps recursive property paths follow.
    pub max_path_depth: Option<u32>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            strict: true,
            prefixes: DEFAULT_PREFIXES
                .iter()
                .map(|(prefix, iri)| ((*prefix).to_owned(), (*iri).to_owned()))
                .collect(),
            deprioritize_exists: true,
            max_path_depth: None,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), iri.into());
        self
    }

    #[must_use]
    pub fn with_deprioritize_exists(mut self, deprioritize_exists: bool) -> Self {
        self.deprioritize_exists = deprioritize_exists;
        self
    }

    #[must_use]
    pub fn with_max_path_depth(mut self, max_path_depth: Option<u32>) -> Self {
        self.max_path_depth = max_path_depth;
        self
    }
}
