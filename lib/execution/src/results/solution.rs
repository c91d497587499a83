use quadlite_model::{Term, Variable};
use std::sync::Arc;

/// A single row of [QuerySolutions](crate::results::QuerySolutions).
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySolution {
    variables: Arc<[Variable]>,
    values: Vec<Option<Term>>,
}

impl QuerySolution {
    pub(crate) fn new(variables: Arc<[Variable]>, values: Vec<Option<Term>>) -> Self {
        Self { variables, values }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn values(&self) -> &[Option<Term>] {
        &self.values
    }

    /// Returns the value of the variable with the given name (without `?`).
    pub fn get(&self, variable: &str) -> Option<&Term> {
        let index = self
            .variables
            .iter()
            .position(|candidate| candidate.as_str() == variable)?;
        self.get_index(index)
    }

    pub fn get_index(&self, index: usize) -> Option<&Term> {
        self.values.get(index)?.as_ref()
    }

    /// Iterates over the bound variables and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.variables
            .iter()
            .zip(&self.values)
            .filter_map(|(variable, value)| Some((variable, value.as_ref()?)))
    }

    pub fn into_values(self) -> Vec<Option<Term>> {
        self.values
    }
}
