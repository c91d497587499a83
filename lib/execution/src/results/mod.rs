//! Query results and their serializations.
//!
//! All encodings are views over the same decoded rows: [QuerySolutions::into_rows] returns the
//! typed values of each row, [QuerySolutions::into_scalars] flattens them into a single stream,
//! and [QueryResults::write] serializes them with [sparesults].

mod decode;
mod solution;

use crate::QueryError;
use quadlite_model::{vocab, LiteralTag, ResourceId, Term, Variable};
use rustc_hash::FxHashMap;
use sparesults::QueryResultsSerializer;
use std::io::Write;
use std::sync::Arc;

pub(crate) use decode::{Binding, RowDecoder};
pub use solution::QuerySolution;
pub use sparesults::QueryResultsFormat;

/// The result of executing a prepared query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    /// Results of a `SELECT` query.
    Solutions(QuerySolutions),
    /// Result of an `ASK` query.
    Boolean(bool),
    /// Result of an update. Holds the number of matched rows.
    Modified(usize),
}

impl QueryResults {
    pub fn into_solutions(self) -> Option<QuerySolutions> {
        match self {
            QueryResults::Solutions(solutions) => Some(solutions),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            QueryResults::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn modified(&self) -> Option<usize> {
        match self {
            QueryResults::Modified(count) => Some(*count),
            _ => None,
        }
    }

    /// Writes the results (solutions or boolean) in one of the standard result formats.
    ///
    /// This method fails if it is called on the results of an update.
    pub fn write<W: Write>(self, writer: W, format: QueryResultsFormat) -> Result<W, QueryError> {
        let serializer = QueryResultsSerializer::from_format(format);
        match self {
            Self::Boolean(value) => serializer.serialize_boolean_to_writer(writer, value),
            Self::Solutions(solutions) => {
                let mut serializer = serializer
                    .serialize_solutions_to_writer(writer, solutions.variables.to_vec())
                    .map_err(QueryError::ResultsSerialization)?;
                for row in &solutions.rows {
                    let values = row
                        .iter()
                        .map(|value| {
                            value
                                .as_ref()
                                .map(|term| solutions.rdf_term(term))
                                .transpose()
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let solution =
                        sparesults::QuerySolution::from((Arc::clone(&solutions.variables), values));
                    serializer
                        .serialize(&solution)
                        .map_err(QueryError::ResultsSerialization)?;
                }
                serializer.finish()
            }
            Self::Modified(_) => return Err(QueryError::NotSerializable),
        }
        .map_err(QueryError::ResultsSerialization)
    }
}

/// The solutions of a `SELECT` query.
///
/// The rows are decoded eagerly because the statement that produced them borrows the
/// connection of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySolutions {
    variables: Arc<[Variable]>,
    rows: Vec<Vec<Option<Term>>>,
    /// Identifier strings of the resources that were decoded, including datatypes.
    iris: FxHashMap<ResourceId, String>,
}

impl QuerySolutions {
    pub(crate) fn new(
        variables: Arc<[Variable]>,
        rows: Vec<Vec<Option<Term>>>,
        iris: FxHashMap<ResourceId, String>,
    ) -> Self {
        Self {
            variables,
            rows,
            iris,
        }
    }

    /// The variables of the solutions, in the order of the columns of each row.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Option<Term>>] {
        &self.rows
    }

    /// Returns the typed values of each row. Unbound variables are [None].
    pub fn into_rows(self) -> Vec<Vec<Option<Term>>> {
        self.rows
    }

    /// Returns the values of all rows as a single stream, row by row.
    pub fn into_scalars(self) -> impl Iterator<Item = Option<Term>> {
        self.rows.into_iter().flatten()
    }

    /// Returns the values of the first column.
    pub fn into_column(self) -> impl Iterator<Item = Option<Term>> {
        self.rows.into_iter().filter_map(|row| row.into_iter().next())
    }

    fn rdf_term(&self, term: &Term) -> Result<oxrdf::Term, QueryError> {
        Ok(match term {
            Term::Resource(resource) => oxrdf::NamedNode::new_unchecked(resource.iri()).into(),
            Term::BlankNode(id) => {
                oxrdf::BlankNode::new_unchecked(format!("b{}", -id.as_i64())).into()
            }
            Term::Literal(literal) => {
                let lexical = literal.lexical_form().into_owned();
                match literal.tag() {
                    LiteralTag::Plain => oxrdf::Literal::new_simple_literal(lexical),
                    LiteralTag::Language(language) => {
                        oxrdf::Literal::new_language_tagged_literal_unchecked(lexical, language)
                    }
                    LiteralTag::Datatype(datatype) => {
                        let iri = vocab::builtin_iri(*datatype)
                            .or_else(|| self.iris.get(datatype).map(String::as_str))
                            .ok_or_else(|| {
                                QueryError::InternalError(format!(
                                    "Datatype {datatype} was not decoded."
                                ))
                            })?;
                        oxrdf::Literal::new_typed_literal(
                            lexical,
                            oxrdf::NamedNode::new_unchecked(iri),
                        )
                    }
                }
                .into()
            }
        })
    }
}

impl IntoIterator for QuerySolutions {
    type Item = QuerySolution;
    type IntoIter = std::vec::IntoIter<QuerySolution>;

    fn into_iter(self) -> Self::IntoIter {
        let variables = self.variables;
        self.rows
            .into_iter()
            .map(|values| QuerySolution::new(Arc::clone(&variables), values))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
