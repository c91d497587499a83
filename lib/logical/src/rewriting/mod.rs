//! Translation of parsed SPARQL into the pattern algebra.

mod expression;
mod path;
mod pattern;
mod update;

use crate::algebra::{PatternTerm, Query};
use crate::parameters::{parameter_index, rewrite_parameters};
use crate::{PatternError, QueryOptions, TermResolver};
use quadlite_model::vocab::xsd;
use quadlite_model::{ContextId, Literal, ResourceId, Variable};
use oxrdf::NamedNode;
use spargebra::term::BlankNode;
use spargebra::{Query as SparqlQuery, Update};
use std::cell::RefCell;
use tracing::debug;

/// Variables whose name starts with this prefix are introduced by the rewriter. They are never
/// projected by `SELECT *`.
pub const HIDDEN_VARIABLE_PREFIX: &str = "__";

pub fn is_hidden_variable(variable: &Variable) -> bool {
    variable.as_str().starts_with(HIDDEN_VARIABLE_PREFIX)
}

/// Parses a query or an update and translates it into the pattern algebra.
///
/// Queries produce a single [Query]. Updates produce one [Query] per operation.
pub fn parse_query(
    text: &str,
    options: &QueryOptions,
    resolver: &dyn TermResolver,
) -> Result<Vec<Query>, PatternError> {
    let parameterized = rewrite_parameters(text)?;
    let rewriter = PatternRewriter::new(resolver, options, parameterized.parameter_count);

    let text = format!("{}{}", prologue(options)?, parameterized.text);
    match SparqlQuery::parse(&text, None) {
        Ok(query) => Ok(vec![rewriter.rewrite_query(&query)?]),
        Err(query_error) => match Update::parse(&text, None) {
            Ok(update) => rewriter.rewrite_update(&update),
            Err(_) => Err(query_error.into()),
        },
    }
}

/// Declares the default prefixes of `options` ahead of the query text. Declarations in the query
/// itself come later and take precedence.
fn prologue(options: &QueryOptions) -> Result<String, PatternError> {
    let declarations = options
        .prefixes
        .iter()
        .map(|(prefix, iri)| {
            let invalid = |message: String| PatternError::InvalidPrefix {
                prefix: prefix.clone(),
                message,
            };
            if !is_prefix_name(prefix) {
                return Err(invalid("not a valid prefix name".to_owned()));
            }
            let iri = NamedNode::new(iri).map_err(|error| invalid(error.to_string()))?;
            Ok(format!("PREFIX {prefix}: {iri}\n"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(declarations.concat())
}

fn is_prefix_name(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        None => true,
        Some(first) if first.is_alphabetic() => {
            !prefix.ends_with('.')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        Some(_) => false,
    }
}

/// Translates spargebra queries into the pattern algebra.
pub struct PatternRewriter<'a> {
    resolver: &'a dyn TermResolver,
    options: &'a QueryOptions,
    parameter_count: usize,
    state: RefCell<RewritingState>,
}

#[derive(Debug, Clone, Default)]
struct RewritingState {
    /// The context of the enclosing `GRAPH <iri> { }` block.
    active_context: Option<ContextId>,
    next_hidden_variable: usize,
}

impl<'a> PatternRewriter<'a> {
    pub fn new(
        resolver: &'a dyn TermResolver,
        options: &'a QueryOptions,
        parameter_count: usize,
    ) -> Self {
        Self {
            resolver,
            options,
            parameter_count,
            state: RefCell::default(),
        }
    }

    /// Returns the id of `iri`.
    ///
    /// Unknown iris are an error in strict mode and [ResourceId::UNKNOWN] otherwise.
    fn resource(&self, iri: &str) -> Result<ResourceId, PatternError> {
        match self.resolver.resolve_iri(iri)? {
            Some(id) => Ok(id),
            None if self.options.strict => Err(PatternError::UnknownIdentifier(iri.to_owned())),
            None => {
                debug!(iri, "Substituting unknown identifier");
                Ok(ResourceId::UNKNOWN)
            }
        }
    }

    fn context(&self, iri: &str) -> Result<ContextId, PatternError> {
        match self.resolver.resolve_context(iri)? {
            Some(context) => Ok(context),
            None if self.options.strict => Err(PatternError::UnknownContext(iri.to_owned())),
            None => {
                debug!(iri, "Substituting unknown context");
                Ok(ContextId::new(0))
            }
        }
    }

    fn literal(&self, literal: &oxrdf::Literal) -> Result<Literal, PatternError> {
        if let Some(language) = literal.language() {
            return Ok(Literal::language_tagged(literal.value(), language));
        }
        let datatype = self.resource(literal.datatype().as_str())?;
        if datatype == xsd::STRING {
            return Ok(Literal::simple(literal.value()));
        }
        Ok(Literal::from_lexical(literal.value(), datatype))
    }

    fn active_context(&self) -> Option<ContextId> {
        self.state.borrow().active_context
    }

    /// Evaluates `f` with `context` as the active context.
    fn with_context<T>(
        &self,
        context: ContextId,
        f: impl FnOnce() -> Result<T, PatternError>,
    ) -> Result<T, PatternError> {
        let previous = self.state.borrow_mut().active_context.replace(context);
        let result = f();
        self.state.borrow_mut().active_context = previous;
        result
    }

    fn hidden_variable(&self, kind: &str) -> Variable {
        let mut state = self.state.borrow_mut();
        let index = state.next_hidden_variable;
        state.next_hidden_variable += 1;
        Variable::new_unchecked(format!("{HIDDEN_VARIABLE_PREFIX}{kind}{index}"))
    }
}

/// Returns the term of a query variable, which may be a rewritten parameter reference.
fn variable_term(variable: &Variable) -> PatternTerm {
    match parameter_index(variable.as_str()) {
        Some(index) => PatternTerm::Parameter(index),
        None => PatternTerm::Variable(variable.clone()),
    }
}

/// Blank nodes in patterns behave like variables that cannot be projected.
fn blank_node_variable(node: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("{HIDDEN_VARIABLE_PREFIX}b{}", node.as_str()))
}
