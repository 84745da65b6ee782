use std::time::Duration;

use anyhow::{Context as _, bail};
use indexmap::IndexMap;
use kbchat_app::EntityLookupService;
use kbchat_domain::{EntityRecord, LookupOutcome, group_properties};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::sparql::{
    SPARQL_RESULTS_FORMAT, SparqlResponse, SparqlResults, abstract_query, properties_query,
};
use crate::utils::format_http_context;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Entity lookup against the DBpedia keyword search and SPARQL endpoints.
#[derive(Clone)]
pub struct DbpediaLookup {
    client: Client,
    search_url: Url,
    sparql_url: Url,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

/// Every field of a search hit is an array, only the first value is used.
#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    resource: Vec<String>,
    #[serde(default)]
    label: Vec<String>,
    #[serde(default)]
    description: Vec<String>,
}

impl DbpediaLookup {
    pub fn new(client: Client, search_url: Url, sparql_url: Url) -> Self {
        Self { client, search_url, sparql_url, timeout: DEFAULT_LOOKUP_TIMEOUT }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchDoc>> {
        let max_hits = max_results.to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[("QueryString", query), ("MaxHits", max_hits.as_str())])
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format_http_context(None, "GET", &self.search_url))?;

        let status = response.status();
        let context = format_http_context(Some(status), "GET", &self.search_url);
        let body = response.text().await.with_context(|| context.clone())?;
        if !status.is_success() {
            bail!("Keyword search failed ({context}): {body}");
        }

        let search: SearchResponse = serde_json::from_str(&body)
            .with_context(|| context.clone())
            .context("Failed to parse keyword search response")?;
        Ok(search.docs)
    }

    /// Runs a SPARQL query. Only transport failures are errors; a non-success
    /// status or an unparsable body yields an empty result set.
    async fn sparql(&self, query: &str) -> anyhow::Result<SparqlResults> {
        let response = self
            .client
            .get(self.sparql_url.clone())
            .query(&[("query", query), ("format", SPARQL_RESULTS_FORMAT)])
            .header(ACCEPT, SPARQL_RESULTS_FORMAT)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format_http_context(None, "GET", &self.sparql_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format_http_context(Some(status), "GET", &self.sparql_url))?;
        if !status.is_success() {
            debug!(status = %status, "SPARQL query rejected, treating as empty");
            return Ok(SparqlResults::default());
        }

        match serde_json::from_str::<SparqlResponse>(&body) {
            Ok(response) => Ok(response.results),
            Err(error) => {
                debug!(error = %error, "Unparsable SPARQL response, treating as empty");
                Ok(SparqlResults::default())
            }
        }
    }

    async fn abstract_of(&self, uri: &str) -> anyhow::Result<String> {
        let results = self.sparql(&abstract_query(uri)).await?;
        Ok(results.first_value("abstract").unwrap_or_default().to_string())
    }

    async fn properties_of(&self, uri: &str) -> anyhow::Result<IndexMap<String, Vec<String>>> {
        let results = self.sparql(&properties_query(uri)).await?;
        Ok(group_properties(results.pairs("p", "o")))
    }

    async fn try_lookup(&self, query: &str, max_results: usize) -> anyhow::Result<LookupOutcome> {
        let docs = self.search(query, max_results).await?;
        if docs.is_empty() {
            return Ok(LookupOutcome::NoResult);
        }

        let mut records = Vec::with_capacity(docs.len().min(max_results));
        for doc in docs.into_iter().take(max_results) {
            let Some(uri) = doc.resource.into_iter().next() else {
                bail!("Keyword search hit without a resource");
            };
            let abstract_text = self.abstract_of(&uri).await?;
            let properties = self.properties_of(&uri).await?;
            debug!(entity = %uri, properties = properties.len(), "Entity resolved");

            records.push(
                EntityRecord::new(uri)
                    .label(doc.label.into_iter().next().unwrap_or_default())
                    .description(doc.description.into_iter().next().unwrap_or_default())
                    .abstract_text(abstract_text)
                    .properties(properties),
            );
        }
        Ok(LookupOutcome::Found(records))
    }
}

#[async_trait::async_trait]
impl EntityLookupService for DbpediaLookup {
    async fn lookup(&self, query: &str, max_results: usize) -> LookupOutcome {
        info!(query = %query, max_results, "Looking up entities");
        match self.try_lookup(query, max_results).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = ?error, "Entity lookup failed");
                LookupOutcome::Failed(format!("{error:#}"))
            }
        }
    }
}
