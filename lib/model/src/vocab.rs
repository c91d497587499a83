//! The built-in vocabulary.
//!
//! Every store seeds its resource dictionary with these terms. Their ids are fixed and lie below
//! [RESERVED_RESOURCE_LIMIT](crate::RESERVED_RESOURCE_LIMIT), so compiled queries can refer to them
//! without consulting the dictionary.

use crate::ResourceId;
use std::collections::HashMap;
use std::sync::LazyLock;

macro_rules! vocabulary {
    ($($module:ident { $($name:ident = $id:literal => $iri:literal,)* })*) => {
        $(
            pub mod $module {
                use crate::ResourceId;
                $(
                    #[doc = concat!("`", $iri, "`")]
                    pub const $name: ResourceId = ResourceId::new($id);
                )*
            }
        )*

        /// All built-in resources with their ids.
        pub const BUILTIN_RESOURCES: &[(ResourceId, &str)] = &[
            $($(($module::$name, $iri),)*)*
        ];
    };
}

vocabulary! {
    rdf {
        TYPE = 1 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
        PROPERTY = 2 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property",
        FIRST = 3 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#first",
        REST = 4 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest",
        NIL = 5 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil",
        LANG_STRING = 6 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString",
        PLAIN_LITERAL = 7 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#PlainLiteral",
        XML_LITERAL = 8 => "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral",
    }
    rdfs {
        SUB_CLASS_OF = 10 => "http://www.w3.org/2000/01/rdf-schema#subClassOf",
        SUB_PROPERTY_OF = 11 => "http://www.w3.org/2000/01/rdf-schema#subPropertyOf",
        DOMAIN = 12 => "http://www.w3.org/2000/01/rdf-schema#domain",
        RANGE = 13 => "http://www.w3.org/2000/01/rdf-schema#range",
        LABEL = 14 => "http://www.w3.org/2000/01/rdf-schema#label",
        COMMENT = 15 => "http://www.w3.org/2000/01/rdf-schema#comment",
        SEE_ALSO = 16 => "http://www.w3.org/2000/01/rdf-schema#seeAlso",
        IS_DEFINED_BY = 17 => "http://www.w3.org/2000/01/rdf-schema#isDefinedBy",
        CLASS = 18 => "http://www.w3.org/2000/01/rdf-schema#Class",
        RESOURCE = 19 => "http://www.w3.org/2000/01/rdf-schema#Resource",
        LITERAL = 20 => "http://www.w3.org/2000/01/rdf-schema#Literal",
        DATATYPE = 21 => "http://www.w3.org/2000/01/rdf-schema#Datatype",
    }
    owl {
        CLASS = 30 => "http://www.w3.org/2002/07/owl#Class",
        THING = 31 => "http://www.w3.org/2002/07/owl#Thing",
        NOTHING = 32 => "http://www.w3.org/2002/07/owl#Nothing",
        OBJECT_PROPERTY = 33 => "http://www.w3.org/2002/07/owl#ObjectProperty",
        DATATYPE_PROPERTY = 34 => "http://www.w3.org/2002/07/owl#DatatypeProperty",
        ANNOTATION_PROPERTY = 35 => "http://www.w3.org/2002/07/owl#AnnotationProperty",
        NAMED_INDIVIDUAL = 36 => "http://www.w3.org/2002/07/owl#NamedIndividual",
        EQUIVALENT_CLASS = 37 => "http://www.w3.org/2002/07/owl#equivalentClass",
        EQUIVALENT_PROPERTY = 38 => "http://www.w3.org/2002/07/owl#equivalentProperty",
        INVERSE_OF = 39 => "http://www.w3.org/2002/07/owl#inverseOf",
        SAME_AS = 40 => "http://www.w3.org/2002/07/owl#sameAs",
        DIFFERENT_FROM = 41 => "http://www.w3.org/2002/07/owl#differentFrom",
        DISJOINT_WITH = 42 => "http://www.w3.org/2002/07/owl#disjointWith",
        ON_PROPERTY = 43 => "http://www.w3.org/2002/07/owl#onProperty",
        SOME_VALUES_FROM = 44 => "http://www.w3.org/2002/07/owl#someValuesFrom",
        ALL_VALUES_FROM = 45 => "http://www.w3.org/2002/07/owl#allValuesFrom",
        HAS_VALUE = 46 => "http://www.w3.org/2002/07/owl#hasValue",
        RESTRICTION = 47 => "http://www.w3.org/2002/07/owl#Restriction",
        ONTOLOGY = 48 => "http://www.w3.org/2002/07/owl#Ontology",
        IMPORTS = 49 => "http://www.w3.org/2002/07/owl#imports",
        FUNCTIONAL_PROPERTY = 50 => "http://www.w3.org/2002/07/owl#FunctionalProperty",
        TRANSITIVE_PROPERTY = 51 => "http://www.w3.org/2002/07/owl#TransitiveProperty",
        SYMMETRIC_PROPERTY = 52 => "http://www.w3.org/2002/07/owl#SymmetricProperty",
        INTERSECTION_OF = 53 => "http://www.w3.org/2002/07/owl#intersectionOf",
        UNION_OF = 54 => "http://www.w3.org/2002/07/owl#unionOf",
        COMPLEMENT_OF = 55 => "http://www.w3.org/2002/07/owl#complementOf",
        ONE_OF = 56 => "http://www.w3.org/2002/07/owl#oneOf",
        VERSION_INFO = 57 => "http://www.w3.org/2002/07/owl#versionInfo",
        MEMBERS = 58 => "http://www.w3.org/2002/07/owl#members",
        ALL_DISJOINT_CLASSES = 59 => "http://www.w3.org/2002/07/owl#AllDisjointClasses",
    }
    xsd {
        STRING = 70 => "http://www.w3.org/2001/XMLSchema#string",
        BOOLEAN = 71 => "http://www.w3.org/2001/XMLSchema#boolean",
        DECIMAL = 72 => "http://www.w3.org/2001/XMLSchema#decimal",
        INTEGER = 73 => "http://www.w3.org/2001/XMLSchema#integer",
        DOUBLE = 74 => "http://www.w3.org/2001/XMLSchema#double",
        FLOAT = 75 => "http://www.w3.org/2001/XMLSchema#float",
        INT = 76 => "http://www.w3.org/2001/XMLSchema#int",
        LONG = 77 => "http://www.w3.org/2001/XMLSchema#long",
        SHORT = 78 => "http://www.w3.org/2001/XMLSchema#short",
        BYTE = 79 => "http://www.w3.org/2001/XMLSchema#byte",
        NON_NEGATIVE_INTEGER = 80 => "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
        POSITIVE_INTEGER = 81 => "http://www.w3.org/2001/XMLSchema#positiveInteger",
        NON_POSITIVE_INTEGER = 82 => "http://www.w3.org/2001/XMLSchema#nonPositiveInteger",
        NEGATIVE_INTEGER = 83 => "http://www.w3.org/2001/XMLSchema#negativeInteger",
        UNSIGNED_INT = 84 => "http://www.w3.org/2001/XMLSchema#unsignedInt",
        DATE_TIME = 85 => "http://www.w3.org/2001/XMLSchema#dateTime",
        DATE = 86 => "http://www.w3.org/2001/XMLSchema#date",
        TIME = 87 => "http://www.w3.org/2001/XMLSchema#time",
        DURATION = 88 => "http://www.w3.org/2001/XMLSchema#duration",
        ANY_URI = 89 => "http://www.w3.org/2001/XMLSchema#anyURI",
        NORMALIZED_STRING = 90 => "http://www.w3.org/2001/XMLSchema#normalizedString",
    }
}

/// Common prefixes that every query may use without declaring them.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Namespace of the functions specific to quadlite.
pub const FUNCTION_NAMESPACE: &str = "urn:quadlite:fn#";

/// The full-text matching function `<urn:quadlite:fn#fts>(?value, "query")`.
pub const FULL_TEXT_FUNCTION: &str = "urn:quadlite:fn#fts";

static BUILTIN_BY_IRI: LazyLock<HashMap<&'static str, ResourceId>> =
    LazyLock::new(|| BUILTIN_RESOURCES.iter().map(|(id, iri)| (*iri, *id)).collect());

/// Returns the id of a built-in resource.
pub fn builtin_id(iri: &str) -> Option<ResourceId> {
    BUILTIN_BY_IRI.get(iri).copied()
}

/// Returns the iri of a built-in resource.
pub fn builtin_iri(id: ResourceId) -> Option<&'static str> {
    BUILTIN_RESOURCES
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .map(|(_, iri)| *iri)
}

/// Predicates whose values are always resources.
pub fn is_reference_predicate(predicate: ResourceId) -> bool {
    matches!(
        predicate,
        rdf::TYPE
            | rdf::REST
            | rdfs::SUB_CLASS_OF
            | rdfs::SUB_PROPERTY_OF
            | rdfs::DOMAIN
            | rdfs::RANGE
            | owl::EQUIVALENT_CLASS
            | owl::EQUIVALENT_PROPERTY
            | owl::INVERSE_OF
            | owl::SAME_AS
            | owl::DIFFERENT_FROM
            | owl::DISJOINT_WITH
            | owl::ON_PROPERTY
            | owl::SOME_VALUES_FROM
            | owl::ALL_VALUES_FROM
            | owl::IMPORTS
            | owl::INTERSECTION_OF
            | owl::UNION_OF
            | owl::COMPLEMENT_OF
            | owl::ONE_OF
            | owl::MEMBERS
    )
}

/// Predicates whose values are always literals.
pub fn is_literal_predicate(predicate: ResourceId) -> bool {
    matches!(
        predicate,
        rdfs::LABEL | rdfs::COMMENT | owl::VERSION_INFO
    )
}

/// Datatypes whose values are stored as SQL integers.
pub fn is_integer_datatype(datatype: ResourceId) -> bool {
    matches!(
        datatype,
        xsd::INTEGER
            | xsd::INT
            | xsd::LONG
            | xsd::SHORT
            | xsd::BYTE
            | xsd::NON_NEGATIVE_INTEGER
            | xsd::POSITIVE_INTEGER
            | xsd::NON_POSITIVE_INTEGER
            | xsd::NEGATIVE_INTEGER
            | xsd::UNSIGNED_INT
    )
}

/// Datatypes whose values are stored as SQL reals.
pub fn is_float_datatype(datatype: ResourceId) -> bool {
    matches!(datatype, xsd::DECIMAL | xsd::DOUBLE | xsd::FLOAT)
}
