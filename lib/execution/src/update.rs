use crate::results::Binding;
use crate::QueryError;
use quadlite_logical::algebra::{Modification, TemplateTerm, TemplateTriple};
use quadlite_model::{ContextId, Literal, Parameter, ResourceId, Variable};
use quadlite_storage::{LiteralPattern, QuadStore, ReferencePattern};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// Applies the templates of a [Modification] to the rows matched by its pattern.
///
/// For every row, the delete templates are applied before the insert templates. A template
/// triple that refers to an unbound variable, or whose subject or predicate is not a resource,
/// is skipped for that row. Deleting a triple whose resources are not in the dictionary is a
/// no-op; inserting one interns them.
pub(crate) struct Modifier<'a> {
    store: &'a QuadStore,
    parameters: &'a [Parameter],
    default_context: Option<ContextId>,
}

/// The position of a resolved template triple.
struct Target {
    context: Option<ContextId>,
    subject: ResourceId,
    predicate: ResourceId,
    object: Binding,
}

impl<'a> Modifier<'a> {
    pub(crate) fn new(
        store: &'a QuadStore,
        parameters: &'a [Parameter],
        default_context: Option<ContextId>,
    ) -> Self {
        Self {
            store,
            parameters,
            default_context,
        }
    }

    /// Returns the number of matched rows.
    pub(crate) fn apply(
        &self,
        modification: &Modification,
        columns: &[Variable],
        rows: &[Vec<Option<Binding>>],
    ) -> Result<usize, QueryError> {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(index, variable)| (variable, index))
            .collect::<FxHashMap<_, _>>();

        for row in rows {
            let solution = Solution { columns: &columns, row };
            for triple in &modification.delete {
                if let Some(target) = self.delete_target(triple, &solution)? {
                    self.delete(&target)?;
                }
            }

            let mut blank_nodes = FxHashMap::default();
            for triple in &modification.insert {
                if let Some(target) = self.insert_target(triple, &solution, &mut blank_nodes)? {
                    self.insert(&target)?;
                }
            }
        }
        trace!(rows = rows.len(), "Applied modification");
        Ok(rows.len())
    }

    fn delete(&self, target: &Target) -> Result<(), QueryError> {
        match &target.object {
            Binding::Resource(object) => {
                let mut pattern = ReferencePattern::new()
                    .with_subject(target.subject)
                    .with_predicate(target.predicate)
                    .with_object(*object);
                if let Some(context) = target.context {
                    pattern = pattern.with_context(context);
                }
                self.store.delete_references(&pattern)?;
            }
            Binding::Literal(literal) => {
                let mut pattern = LiteralPattern::new()
                    .with_subject(target.subject)
                    .with_predicate(target.predicate)
                    .with_literal(literal);
                if let Some(context) = target.context {
                    pattern = pattern.with_context(context);
                }
                self.store.delete_literals(&pattern)?;
            }
        }
        Ok(())
    }

    fn insert(&self, target: &Target) -> Result<(), QueryError> {
        let context = target
            .context
            .or(self.default_context)
            .ok_or(QueryError::NoDefaultContext)?;
        match &target.object {
            Binding::Resource(object) => {
                self.store
                    .insert_reference(context, target.subject, target.predicate, *object)?;
            }
            Binding::Literal(literal) => {
                self.store
                    .insert_literal(context, target.subject, target.predicate, literal)?;
            }
        }
        Ok(())
    }

    /// Resolves a delete template. A template without a context deletes from every context.
    fn delete_target(
        &self,
        triple: &TemplateTriple,
        solution: &Solution<'_>,
    ) -> Result<Option<Target>, QueryError> {
        let context = match &triple.context {
            Some(iri) => match self.store.lookup_context(iri)? {
                Some(context) => Some(context),
                None => return Ok(None),
            },
            None => None,
        };
        let (Some(Binding::Resource(subject)), Some(Binding::Resource(predicate)), Some(object)) = (
            self.lookup(&triple.subject, solution)?,
            self.lookup(&triple.predicate, solution)?,
            self.lookup(&triple.object, solution)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Target {
            context,
            subject,
            predicate,
            object,
        }))
    }

    fn insert_target(
        &self,
        triple: &TemplateTriple,
        solution: &Solution<'_>,
        blank_nodes: &mut FxHashMap<String, ResourceId>,
    ) -> Result<Option<Target>, QueryError> {
        let (Some(Binding::Resource(subject)), Some(Binding::Resource(predicate)), Some(object)) = (
            self.intern(&triple.subject, solution, blank_nodes)?,
            self.intern(&triple.predicate, solution, blank_nodes)?,
            self.intern(&triple.object, solution, blank_nodes)?,
        ) else {
            return Ok(None);
        };
        let context = match &triple.context {
            Some(iri) => Some(self.store.context(iri)?),
            None => None,
        };
        Ok(Some(Target {
            context,
            subject,
            predicate,
            object,
        }))
    }

    /// Resolves a template term without changing the dictionary.
    fn lookup(
        &self,
        term: &TemplateTerm,
        solution: &Solution<'_>,
    ) -> Result<Option<Binding>, QueryError> {
        Ok(match term {
            TemplateTerm::Variable(variable) => solution.get(variable).cloned(),
            TemplateTerm::Iri(iri) => self.store.lookup(iri)?.map(Binding::Resource),
            TemplateTerm::BlankNode(_) => None,
            TemplateTerm::Literal(literal) => {
                let datatype = match literal.language() {
                    Some(_) => None,
                    None => match self.store.lookup(literal.datatype().as_str())? {
                        Some(datatype) => Some(datatype),
                        None => return Ok(None),
                    },
                };
                Some(Binding::Literal(convert_literal(literal, datatype)))
            }
            TemplateTerm::Parameter(index) => Some(self.parameter(*index)?),
        })
    }

    /// Resolves a template term, interning its resources and minting one blank node per label.
    fn intern(
        &self,
        term: &TemplateTerm,
        solution: &Solution<'_>,
        blank_nodes: &mut FxHashMap<String, ResourceId>,
    ) -> Result<Option<Binding>, QueryError> {
        Ok(match term {
            TemplateTerm::Variable(variable) => solution.get(variable).cloned(),
            TemplateTerm::Iri(iri) => Some(Binding::Resource(self.store.intern(iri)?)),
            TemplateTerm::BlankNode(label) => {
                let id = match blank_nodes.entry(label.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => *entry.insert(self.store.new_blank_node()?),
                };
                Some(Binding::Resource(id))
            }
            TemplateTerm::Literal(literal) => {
                let datatype = match literal.language() {
                    Some(_) => None,
                    None => Some(self.store.intern(literal.datatype().as_str())?),
                };
                Some(Binding::Literal(convert_literal(literal, datatype)))
            }
            TemplateTerm::Parameter(index) => Some(self.parameter(*index)?),
        })
    }

    fn parameter(&self, index: usize) -> Result<Binding, QueryError> {
        match self.parameters.get(index) {
            Some(Parameter::Resource(id)) => Ok(Binding::Resource(*id)),
            Some(Parameter::Literal(literal)) => Ok(Binding::Literal(literal.clone())),
            None => Err(QueryError::ParameterCount {
                expected: index + 1,
                found: self.parameters.len(),
            }),
        }
    }
}

/// A row of the selecting statement of a modification.
struct Solution<'a> {
    columns: &'a FxHashMap<&'a Variable, usize>,
    row: &'a [Option<Binding>],
}

impl Solution<'_> {
    fn get(&self, variable: &Variable) -> Option<&Binding> {
        let index = *self.columns.get(variable)?;
        self.row.get(index)?.as_ref()
    }
}

/// Converts a literal of the query text. `datatype` is the id of the literal's datatype and
/// [None] for language-tagged literals.
fn convert_literal(literal: &oxrdf::Literal, datatype: Option<ResourceId>) -> Literal {
    match (literal.language(), datatype) {
        (Some(language), _) => Literal::language_tagged(literal.value(), language),
        (None, Some(datatype)) => Literal::from_lexical(literal.value(), datatype),
        (None, None) => Literal::simple(literal.value()),
    }
}
