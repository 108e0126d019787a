use serde_json::Value;
use snafu::ensure;

use crate::cluster::Cluster;
use crate::error::{InvalidRequest, MappingNotFound};
use crate::Error;

/// Index-level mapping keys that do not name a document type.
const EXCLUDED_KEYS: [&str; 3] = ["_default_", "_all", "properties"];

/// The schema of one document type of one index.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRecord {
    pub index: String,
    pub doc_type: String,
    pub schema: Option<Value>,
}

/// Query the mapping endpoint and validate the response.
///
/// The cluster answers an invalid index name with an `error` body, and a
/// known index without mappings with an empty `mappings` object; both are
/// turned into errors here so callers only ever see usable mapping
/// documents.
pub fn fetch_mappings<C: Cluster>(cluster: &C, index: Option<&str>) -> Result<Value, Error> {
    let data = cluster.get_mappings(index)?;

    if let Some(reason) = data.get("error") {
        return InvalidRequest {
            reason: reason.to_string(),
        }
        .fail();
    }

    if let Some(index) = index {
        let empty = data
            .get(index)
            .and_then(|body| body.get("mappings"))
            .and_then(Value::as_object)
            .map_or(true, |mappings| mappings.is_empty());
        ensure!(!empty, MappingNotFound { index });
    }

    Ok(data)
}

/// Iterate over every (index, type) mapping of a raw mapping document,
/// skipping the index-level keys that do not name a type. The schema may be
/// absent when the type was created without properties.
pub fn mapping_records(data: Value) -> impl Iterator<Item = MappingRecord> {
    let indices = match data {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    indices.into_iter().flat_map(|(index, mut body)| {
        let mappings = match body.get_mut("mappings").map(Value::take) {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        mappings
            .into_iter()
            .filter(|(doc_type, _)| !EXCLUDED_KEYS.contains(&doc_type.as_str()))
            .map(move |(doc_type, mut definition)| MappingRecord {
                index: index.clone(),
                doc_type,
                schema: definition.get_mut("properties").map(Value::take),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Receipt, ScrollResponse};
    use serde_json::json;

    struct CannedCluster {
        mappings: Value,
    }

    impl Cluster for CannedCluster {
        fn get_mappings(&self, _index: Option<&str>) -> Result<Value, Error> {
            Ok(self.mappings.clone())
        }

        fn put_mapping(
            &self,
            _index: Option<&str>,
            _doc_type: &str,
            _mapping: &Value,
        ) -> Result<Receipt, Error> {
            unreachable!("mapping reader never writes")
        }

        fn scroll_begin(
            &self,
            _index: &str,
            _doc_type: &str,
            _ttl: &str,
        ) -> Result<ScrollResponse, Error> {
            unreachable!("mapping reader never scrolls")
        }

        fn scroll_next(&self, _scroll_id: &str, _ttl: &str) -> Result<ScrollResponse, Error> {
            unreachable!("mapping reader never scrolls")
        }

        fn create_document(
            &self,
            _index: Option<&str>,
            _doc_type: &str,
            _id: &str,
            _source: &Value,
        ) -> Result<Receipt, Error> {
            unreachable!("mapping reader never writes")
        }
    }

    fn test_mappings() -> Value {
        json!({
            "test": {
                "mappings": {
                    "_default_": {},
                    "_all": {},
                    "properties": {},
                    "data": {
                        "properties": {
                            "content": {},
                            "env": {}
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn mapping_records_skips_index_level_keys() {
        let records: Vec<_> = mapping_records(test_mappings()).collect();

        assert_eq!(
            records,
            vec![MappingRecord {
                index: "test".to_string(),
                doc_type: "data".to_string(),
                schema: Some(json!({"content": {}, "env": {}})),
            }]
        );
    }

    #[test]
    fn mapping_records_keeps_schemaless_types() {
        let records: Vec<_> =
            mapping_records(json!({"test": {"mappings": {"data": {}}}})).collect();

        assert_eq!(records.len(), 1);
        assert!(records[0].schema.is_none());
    }

    #[test]
    fn fetch_mappings_accepts_a_valid_response() {
        let cluster = CannedCluster {
            mappings: test_mappings(),
        };

        let data = fetch_mappings(&cluster, Some("test")).unwrap();
        assert!(data.get("test").is_some());
    }

    #[test]
    fn fetch_mappings_rejects_an_error_response() {
        let cluster = CannedCluster {
            mappings: json!({"error": "err_msg", "status": 404}),
        };

        let err = fetch_mappings(&cluster, Some("test")).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn fetch_mappings_rejects_an_index_without_mappings() {
        let cluster = CannedCluster {
            mappings: json!({"test": {"mappings": {}}}),
        };

        let err = fetch_mappings(&cluster, Some("test")).unwrap_err();
        assert!(matches!(err, Error::MappingNotFound { .. }));
    }

    #[test]
    fn fetch_mappings_without_index_skips_the_mapping_check() {
        let cluster = CannedCluster {
            mappings: json!({"test": {"mappings": {}}}),
        };

        assert!(fetch_mappings(&cluster, None).is_ok());
    }
}
