use quadlite_execution::{Executor, QueryError, QueryResults, QuerySolutions};
use quadlite_logical::QueryOptions;
use quadlite_model::{ContextId, Parameter, Term};
use quadlite_storage::{QuadStore, StoreOptions};

mod encodings;
mod queries;
mod updates;

struct TestStore {
    store: QuadStore,
    context: ContextId,
}

impl TestStore {
    fn new() -> Self {
        let store = QuadStore::open_in_memory(StoreOptions::default()).unwrap();
        let transaction = store.transaction().unwrap();
        let context = store.context("http://example.com/default").unwrap();
        transaction.commit().unwrap();
        Self { store, context }
    }

    fn with_data(data: &str) -> Self {
        let store = Self::new();
        store.run(&format!("INSERT DATA {{ {data} }}"));
        store
    }

    fn executor(&self) -> Executor<'_> {
        Executor::new(&self.store).with_default_context(self.context)
    }

    fn try_run_with(
        &self,
        text: &str,
        parameters: &[Parameter],
    ) -> Result<QueryResults, QueryError> {
        let executor = self.executor();
        let prepared = executor.prepare(text, &options())?;
        executor.execute(&prepared, parameters)
    }

    fn run(&self, text: &str) -> QueryResults {
        self.try_run_with(text, &[]).unwrap()
    }

    fn select(&self, text: &str) -> QuerySolutions {
        self.run(text).into_solutions().unwrap()
    }

    /// The identifier strings or lexical forms of the first column.
    fn column(&self, text: &str) -> Vec<String> {
        self.select(text)
            .into_column()
            .map(|term| term.map(|term| display(&term)).unwrap_or_default())
            .collect()
    }
}

fn options() -> QueryOptions {
    QueryOptions::default().with_prefix("ex", "http://example.com/")
}

fn example_iri(name: &str) -> String {
    format!("http://example.com/{name}")
}

fn display(term: &Term) -> String {
    match term {
        Term::Resource(resource) => resource.iri().to_owned(),
        Term::BlankNode(id) => id.to_string(),
        Term::Literal(literal) => literal.lexical_form().into_owned(),
    }
}
