use crate::results::{Binding, QueryResults, QuerySolutions, RowDecoder};
use crate::update::Modifier;
use crate::{QueryError, StoreResolver};
use quadlite_logical::{infer, parse_query, QueryOptions};
use quadlite_model::{ContextId, Parameter, Variable};
use quadlite_physical::{compile, CompiledForm, CompiledQuery, ParamSlot};
use quadlite_storage::encoding::{literal_value_to_sql, tag_to_sql};
use quadlite_storage::QuadStore;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};
use std::sync::Arc;
use tracing::trace;

/// A query or update that was parsed and compiled once and can be executed many times.
///
/// A prepared query depends on the dictionary of the store it was prepared against. It must be
/// prepared again after resources were interned, renamed, or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    operations: Vec<CompiledQuery>,
    parameter_count: usize,
}

impl PreparedQuery {
    /// The compiled statements. Queries have exactly one, updates one per operation.
    pub fn operations(&self) -> &[CompiledQuery] {
        &self.operations
    }

    /// The number of runtime parameters that must be passed to [Executor::execute].
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    pub fn is_update(&self) -> bool {
        self.operations
            .iter()
            .all(|operation| matches!(operation.form, CompiledForm::Modify(_)))
    }
}

/// Prepares and executes queries against a [QuadStore].
///
/// Updates write triples without an explicit context into the default context of the executor.
///
/// Usage example:
/// ```
/// use quadlite_execution::Executor;
/// use quadlite_logical::QueryOptions;
/// use quadlite_storage::{QuadStore, StoreOptions};
///
/// let store = QuadStore::open_in_memory(StoreOptions::default())?;
/// let transaction = store.transaction()?;
/// let context = store.context("http://example.com/graph")?;
/// transaction.commit()?;
///
/// let executor = Executor::new(&store).with_default_context(context);
/// let options = QueryOptions::default().with_prefix("ex", "http://example.com/");
///
/// let update = executor.prepare("INSERT DATA { ex:paris ex:label \"Paris\" }", &options)?;
/// executor.execute(&update, &[])?;
///
/// let query = executor.prepare("SELECT ?label WHERE { ex:paris ex:label ?label }", &options)?;
/// let solutions = executor
///     .execute(&query, &[])?
///     .into_solutions()
///     .ok_or("expected solutions")?;
/// assert_eq!(solutions.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct Executor<'store> {
    store: &'store QuadStore,
    default_context: Option<ContextId>,
}

impl<'store> Executor<'store> {
    pub fn new(store: &'store QuadStore) -> Self {
        Self {
            store,
            default_context: None,
        }
    }

    #[must_use]
    pub fn with_default_context(mut self, context: ContextId) -> Self {
        self.default_context = Some(context);
        self
    }

    /// Parses, type checks, and compiles `text`.
    pub fn prepare(
        &self,
        text: &str,
        options: &QueryOptions,
    ) -> Result<PreparedQuery, QueryError> {
        let resolver = StoreResolver::new(self.store);
        let operations = parse_query(text, options, &resolver)?
            .into_iter()
            .map(|mut query| {
                let types = infer(&mut query, &resolver)?;
                Ok(compile(&query, &types, options)?)
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        let prepared = PreparedQuery {
            parameter_count: operations
                .iter()
                .map(|operation| operation.parameter_count)
                .max()
                .unwrap_or_default(),
            operations,
        };
        if prepared.operations.len() > 1 && !prepared.is_update() {
            return Err(QueryError::MixedRequest);
        }
        Ok(prepared)
    }

    /// Executes `prepared` with the given runtime parameters.
    ///
    /// The operations of an update are applied in a single transaction.
    pub fn execute(
        &self,
        prepared: &PreparedQuery,
        parameters: &[Parameter],
    ) -> Result<QueryResults, QueryError> {
        if parameters.len() != prepared.parameter_count {
            return Err(QueryError::ParameterCount {
                expected: prepared.parameter_count,
                found: parameters.len(),
            });
        }

        match prepared.operations.as_slice() {
            [query] if query.form == CompiledForm::Select => self.select(query, parameters),
            [query] if query.form == CompiledForm::Ask => self.ask(query, parameters),
            operations => self.update(operations, parameters),
        }
    }

    fn select(
        &self,
        query: &CompiledQuery,
        parameters: &[Parameter],
    ) -> Result<QueryResults, QueryError> {
        let width = query.columns.len();
        let bindings = self.rows(query, parameters, |row| Binding::from_row(row, width))?;

        let mut decoder = RowDecoder::new(self.store);
        let rows = bindings
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|binding| binding.map(|binding| decoder.term(binding)).transpose())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let variables: Arc<[Variable]> = query.columns.clone().into();
        Ok(QueryResults::Solutions(QuerySolutions::new(
            variables,
            rows,
            decoder.into_iris(),
        )))
    }

    fn ask(
        &self,
        query: &CompiledQuery,
        parameters: &[Parameter],
    ) -> Result<QueryResults, QueryError> {
        let rows = self.rows(query, parameters, |row| Ok(row.get::<_, bool>(0)?))?;
        Ok(QueryResults::Boolean(rows.first().copied().unwrap_or_default()))
    }

    fn update(
        &self,
        operations: &[CompiledQuery],
        parameters: &[Parameter],
    ) -> Result<QueryResults, QueryError> {
        let transaction = self.store.transaction()?;
        let modifier = Modifier::new(self.store, parameters, self.default_context);
        let mut matched = 0;
        for operation in operations {
            let CompiledForm::Modify(modification) = &operation.form else {
                return Err(QueryError::MixedRequest);
            };
            let width = operation.columns.len();
            let rows = self.rows(operation, parameters, |row| Binding::from_row(row, width))?;
            matched += modifier.apply(modification, &operation.columns, &rows)?;
        }
        transaction.commit()?;
        Ok(QueryResults::Modified(matched))
    }

    /// Runs the statement of `query` and maps every row. All rows are read before the statement
    /// is reset, so the store may be modified afterwards.
    fn rows<T>(
        &self,
        query: &CompiledQuery,
        parameters: &[Parameter],
        mut map: impl FnMut(&Row<'_>) -> Result<T, QueryError>,
    ) -> Result<Vec<T>, QueryError> {
        let values = bind(&query.slots, parameters)?;
        trace!(parameters = values.len(), "Executing statement:\n{}", query.sql);

        let mut statement = self.store.connection().prepare_cached(&query.sql)?;
        let mut rows = statement.query(params_from_iter(values.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(map(row)?);
        }
        Ok(result)
    }
}

/// Resolves the parameter slots of a compiled statement. A literal parameter binds its value and,
/// where the statement compares tags, its tag. A resource parameter binds its id and a `NULL`
/// tag.
fn bind(slots: &[ParamSlot], parameters: &[Parameter]) -> Result<Vec<Value>, QueryError> {
    slots
        .iter()
        .map(|slot| match slot {
            ParamSlot::Value(value) => Ok(value.clone()),
            ParamSlot::Argument(index) => Ok(match parameter(parameters, *index)? {
                Parameter::Resource(id) => Value::Integer(id.as_i64()),
                Parameter::Literal(literal) => literal_value_to_sql(literal.value()),
            }),
            ParamSlot::ArgumentTag(index) => Ok(match parameter(parameters, *index)? {
                Parameter::Resource(_) => Value::Null,
                Parameter::Literal(literal) => tag_to_sql(literal.tag()),
            }),
        })
        .collect()
}

fn parameter(parameters: &[Parameter], index: usize) -> Result<&Parameter, QueryError> {
    parameters.get(index).ok_or(QueryError::ParameterCount {
        expected: index + 1,
        found: parameters.len(),
    })
}
