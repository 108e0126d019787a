use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::utils::make_url;
use crate::Error;

/// Status and body of a write request, as reported by the cluster.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub status: u16,
    pub body: String,
}

/// One page of a scrolled search. Only the fields we use are deserialized.
#[derive(Debug, Deserialize)]
pub struct ScrollResponse {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    #[serde(default)]
    pub hits: ScrollHits,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrollHits {
    #[serde(default)]
    pub hits: Vec<Value>,
}

/// The administrative operations used to transfer mappings and documents.
///
/// `HttpCluster` is the production implementation; the dump and upload
/// paths only ever see this trait, so tests drive them with an in-memory
/// stand-in.
pub trait Cluster {
    /// `GET {uri}/{index}/_mapping`, or all indices when no index is given.
    fn get_mappings(&self, index: Option<&str>) -> Result<Value, Error>;

    /// `PUT {uri}/{index}/_mapping/{doc_type}` with a `{"properties": ...}` body.
    fn put_mapping(
        &self,
        index: Option<&str>,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<Receipt, Error>;

    /// Open a scan over all documents of a type, returning the first scroll
    /// cursor.
    fn scroll_begin(&self, index: &str, doc_type: &str, ttl: &str)
        -> Result<ScrollResponse, Error>;

    /// Fetch the next batch for a live cursor, renewing it for `ttl`.
    fn scroll_next(&self, scroll_id: &str, ttl: &str) -> Result<ScrollResponse, Error>;

    /// Create-only write of one document source; the cluster rejects ids
    /// that already exist.
    fn create_document(
        &self,
        index: Option<&str>,
        doc_type: &str,
        id: &str,
        source: &Value,
    ) -> Result<Receipt, Error>;
}

/// Blocking client over the administrative API.
///
/// The inner reqwest client is the only shared resource of the process: it
/// keeps its connection pool alive across every request of a dump or upload
/// run, and applies the configured timeout to each of them.
pub struct HttpCluster {
    uri: String,
    client: reqwest::blocking::Client,
}

impl HttpCluster {
    pub fn new(uri: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(HttpCluster {
            uri: uri.to_string(),
            client,
        })
    }

    fn receipt(response: reqwest::blocking::Response) -> Result<Receipt, Error> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Receipt { status, body })
    }
}

impl Cluster for HttpCluster {
    fn get_mappings(&self, index: Option<&str>) -> Result<Value, Error> {
        let url = make_url(&self.uri, &[index.unwrap_or(""), "_mapping"], &[]);
        Ok(self.client.get(&url).send()?.json()?)
    }

    fn put_mapping(
        &self,
        index: Option<&str>,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<Receipt, Error> {
        let url = make_url(&self.uri, &[index.unwrap_or(""), "_mapping", doc_type], &[]);
        Self::receipt(self.client.put(&url).json(mapping).send()?)
    }

    fn scroll_begin(
        &self,
        index: &str,
        doc_type: &str,
        ttl: &str,
    ) -> Result<ScrollResponse, Error> {
        let url = make_url(
            &self.uri,
            &[index, doc_type, "_search"],
            &[("scroll", ttl), ("search_type", "scan")],
        );
        Ok(self.client.get(&url).send()?.json()?)
    }

    fn scroll_next(&self, scroll_id: &str, ttl: &str) -> Result<ScrollResponse, Error> {
        let url = make_url(
            &self.uri,
            &["_search", "scroll"],
            &[("search_type", "scan"), ("scroll", ttl), ("scroll_id", scroll_id)],
        );
        Ok(self.client.get(&url).send()?.json()?)
    }

    fn create_document(
        &self,
        index: Option<&str>,
        doc_type: &str,
        id: &str,
        source: &Value,
    ) -> Result<Receipt, Error> {
        let url = make_url(
            &self.uri,
            &[index.unwrap_or(""), doc_type, id],
            &[("op_type", "create")],
        );
        Self::receipt(self.client.put(&url).json(source).send()?)
    }
}
