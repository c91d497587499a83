use super::{variable_term, PatternRewriter};
use crate::algebra::{
    GroupPattern, Modification, PatternTerm, Query, QueryForm, TemplateTerm, TemplateTriple,
};
use crate::PatternError;
use spargebra::term::{
    GraphName, GraphNamePattern, GroundQuad, GroundQuadPattern, GroundSubject, GroundTerm,
    GroundTermPattern, NamedNodePattern, Quad, QuadPattern, Subject, Term, TermPattern, Variable,
};
use spargebra::{GraphUpdateOperation, Update};

impl PatternRewriter<'_> {
    pub(super) fn rewrite_update(&self, update: &Update) -> Result<Vec<Query>, PatternError> {
        update
            .operations
            .iter()
            .map(|operation| self.rewrite_operation(operation))
            .collect()
    }

    fn rewrite_operation(&self, operation: &GraphUpdateOperation) -> Result<Query, PatternError> {
        match operation {
            GraphUpdateOperation::InsertData { data } => {
                let insert = data.iter().map(quad_template).collect::<Result<_, _>>()?;
                Ok(self.modification(Vec::new(), insert, GroupPattern::default()))
            }
            GraphUpdateOperation::DeleteData { data } => {
                let delete = data
                    .iter()
                    .map(ground_quad_template)
                    .collect::<Result<_, _>>()?;
                Ok(self.modification(delete, Vec::new(), GroupPattern::default()))
            }
            GraphUpdateOperation::DeleteInsert {
                delete,
                insert,
                using,
                pattern,
            } => {
                let pattern = self.with_dataset(using.as_ref(), || self.rewrite_group(pattern))?;
                let delete = delete
                    .iter()
                    .map(ground_quad_pattern_template)
                    .collect::<Result<_, _>>()?;
                let insert = insert
                    .iter()
                    .map(quad_pattern_template)
                    .collect::<Result<_, _>>()?;
                Ok(self.modification(delete, insert, pattern))
            }
            GraphUpdateOperation::Load { .. } => {
                Err(PatternError::NotImplemented("LOAD".to_owned()))
            }
            GraphUpdateOperation::Clear { .. } => {
                Err(PatternError::NotImplemented("CLEAR".to_owned()))
            }
            GraphUpdateOperation::Create { .. } => {
                Err(PatternError::NotImplemented("CREATE".to_owned()))
            }
            GraphUpdateOperation::Drop { .. } => {
                Err(PatternError::NotImplemented("DROP".to_owned()))
            }
        }
    }

    fn modification(
        &self,
        delete: Vec<TemplateTriple>,
        insert: Vec<TemplateTriple>,
        pattern: GroupPattern,
    ) -> Query {
        self.query(QueryForm::Modify(Modification { delete, insert }), pattern)
    }
}

fn quad_template(quad: &Quad) -> Result<TemplateTriple, PatternError> {
    Ok(TemplateTriple {
        subject: match &quad.subject {
            Subject::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
            Subject::BlankNode(node) => TemplateTerm::BlankNode(node.as_str().to_owned()),
        },
        predicate: TemplateTerm::Iri(quad.predicate.as_str().to_owned()),
        object: match &quad.object {
            Term::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
            Term::BlankNode(node) => TemplateTerm::BlankNode(node.as_str().to_owned()),
            Term::Literal(literal) => TemplateTerm::Literal(literal.clone()),
        },
        context: graph_name(&quad.graph_name),
    })
}

fn ground_quad_template(quad: &GroundQuad) -> Result<TemplateTriple, PatternError> {
    Ok(TemplateTriple {
        subject: match &quad.subject {
            GroundSubject::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
        },
        predicate: TemplateTerm::Iri(quad.predicate.as_str().to_owned()),
        object: match &quad.object {
            GroundTerm::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
            GroundTerm::Literal(literal) => TemplateTerm::Literal(literal.clone()),
        },
        context: graph_name(&quad.graph_name),
    })
}

fn quad_pattern_template(quad: &QuadPattern) -> Result<TemplateTriple, PatternError> {
    Ok(TemplateTriple {
        subject: term_pattern_template(&quad.subject),
        predicate: named_node_pattern_template(&quad.predicate),
        object: term_pattern_template(&quad.object),
        context: graph_name_pattern(&quad.graph_name)?,
    })
}

fn ground_quad_pattern_template(quad: &GroundQuadPattern) -> Result<TemplateTriple, PatternError> {
    Ok(TemplateTriple {
        subject: ground_term_pattern_template(&quad.subject),
        predicate: named_node_pattern_template(&quad.predicate),
        object: ground_term_pattern_template(&quad.object),
        context: graph_name_pattern(&quad.graph_name)?,
    })
}

fn term_pattern_template(term: &TermPattern) -> TemplateTerm {
    match term {
        TermPattern::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
        TermPattern::BlankNode(node) => TemplateTerm::BlankNode(node.as_str().to_owned()),
        TermPattern::Literal(literal) => TemplateTerm::Literal(literal.clone()),
        TermPattern::Variable(variable) => variable_template(variable),
    }
}

fn ground_term_pattern_template(term: &GroundTermPattern) -> TemplateTerm {
    match term {
        GroundTermPattern::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
        GroundTermPattern::Literal(literal) => TemplateTerm::Literal(literal.clone()),
        GroundTermPattern::Variable(variable) => variable_template(variable),
    }
}

fn named_node_pattern_template(term: &NamedNodePattern) -> TemplateTerm {
    match term {
        NamedNodePattern::NamedNode(node) => TemplateTerm::Iri(node.as_str().to_owned()),
        NamedNodePattern::Variable(variable) => variable_template(variable),
    }
}

fn variable_template(variable: &Variable) -> TemplateTerm {
    match variable_term(variable) {
        PatternTerm::Parameter(index) => TemplateTerm::Parameter(index),
        _ => TemplateTerm::Variable(variable.clone()),
    }
}

fn graph_name(graph_name: &GraphName) -> Option<String> {
    match graph_name {
        GraphName::NamedNode(node) => Some(node.as_str().to_owned()),
        GraphName::DefaultGraph => None,
    }
}

fn graph_name_pattern(graph_name: &GraphNamePattern) -> Result<Option<String>, PatternError> {
    match graph_name {
        GraphNamePattern::NamedNode(node) => Ok(Some(node.as_str().to_owned())),
        GraphNamePattern::DefaultGraph => Ok(None),
        GraphNamePattern::Variable(_) => Err(PatternError::NotImplemented(
            "templates with a variable graph name".to_owned(),
        )),
    }
}
