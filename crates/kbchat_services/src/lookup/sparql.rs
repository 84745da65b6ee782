use std::collections::HashMap;

use serde::Deserialize;

pub(crate) const SPARQL_RESULTS_FORMAT: &str = "application/sparql-results+json";

/// English `dbo:abstract` of `uri`.
pub(crate) fn abstract_query(uri: &str) -> String {
    format!(
        "SELECT ?abstract WHERE {{ <{uri}> dbo:abstract ?abstract . \
         FILTER (lang(?abstract) = 'en') }} LIMIT 1"
    )
}

/// Ontology and resource properties of `uri`.
pub(crate) fn properties_query(uri: &str) -> String {
    format!(
        "SELECT ?p ?o WHERE {{ <{uri}> ?p ?o . FILTER ( \
         STRSTARTS(STR(?p), \"http://dbpedia.org/ontology/\") || \
         STRSTARTS(STR(?p), \"http://dbpedia.org/resource/\") ) }} LIMIT 50"
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SparqlTerm {
    pub value: String,
}

impl SparqlResults {
    pub fn first_value(&self, variable: &str) -> Option<&str> {
        self.bindings
            .first()
            .and_then(|binding| binding.get(variable))
            .map(|term| term.value.as_str())
    }

    /// `(a, b)` value pairs of every binding that has both variables.
    pub fn pairs(&self, a: &str, b: &str) -> Vec<(String, String)> {
        self.bindings
            .iter()
            .filter_map(|binding| {
                let first = binding.get(a)?;
                let second = binding.get(b)?;
                Some((first.value.clone(), second.value.clone()))
            })
            .collect()
    }
}
