//! Cursor-based pagination over a type's documents.
//!
//! The scroll protocol is server-driven: each response hands back the
//! cursor for the next batch, and termination is signaled by the absence
//! of further results rather than by a known total count.

use serde_json::Value;
use std::collections::VecDeque;

use crate::cluster::Cluster;
use crate::Error;

enum State {
    Begin,
    Cursor(String),
    Done,
}

/// Lazy iterator over every document hit of one (index, type).
///
/// Hits are yielded in response order. The consumer may stop early;
/// batches that were never requested are simply never fetched, and
/// dropping the iterator releases the connection back to the pool.
pub struct Scroll<'a, C: Cluster> {
    cluster: &'a C,
    index: String,
    doc_type: String,
    ttl: String,
    state: State,
    pending: VecDeque<Value>,
}

impl<'a, C: Cluster> Scroll<'a, C> {
    pub fn new(cluster: &'a C, index: &str, doc_type: &str, ttl: &str) -> Self {
        Scroll {
            cluster,
            index: index.to_string(),
            doc_type: doc_type.to_string(),
            ttl: ttl.to_string(),
            state: State::Begin,
            pending: VecDeque::new(),
        }
    }
}

impl<'a, C: Cluster> Iterator for Scroll<'a, C> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(Ok(hit));
            }

            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Begin => {
                    let response =
                        match self
                            .cluster
                            .scroll_begin(&self.index, &self.doc_type, &self.ttl)
                        {
                            Ok(response) => response,
                            Err(err) => return Some(Err(err)),
                        };
                    // No cursor on the initial response means the type
                    // holds no matching documents.
                    match response.scroll_id {
                        Some(id) => self.state = State::Cursor(id),
                        None => return None,
                    }
                }
                State::Cursor(id) => {
                    let response = match self.cluster.scroll_next(&id, &self.ttl) {
                        Ok(response) => response,
                        Err(err) => return Some(Err(err)),
                    };
                    let exhausted = response.hits.hits.is_empty();
                    self.pending.extend(response.hits.hits);
                    // The cursor we just used must not be replayed: either
                    // adopt the renewed one, or stop once the pending hits
                    // drain.
                    if let Some(next_id) = response.scroll_id {
                        if !exhausted {
                            self.state = State::Cursor(next_id);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Receipt, ScrollHits, ScrollResponse};
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves scripted scroll pages and records which cursors were used.
    struct ScriptedCluster {
        begin_cursor: Option<String>,
        pages: RefCell<Vec<ScrollResponse>>,
        used_cursors: RefCell<Vec<String>>,
    }

    impl ScriptedCluster {
        fn new(begin_cursor: Option<&str>, pages: Vec<ScrollResponse>) -> Self {
            ScriptedCluster {
                begin_cursor: begin_cursor.map(str::to_string),
                pages: RefCell::new(pages),
                used_cursors: RefCell::new(Vec::new()),
            }
        }
    }

    impl Cluster for ScriptedCluster {
        fn get_mappings(&self, _index: Option<&str>) -> Result<Value, Error> {
            unreachable!("scroll never reads mappings")
        }

        fn put_mapping(
            &self,
            _index: Option<&str>,
            _doc_type: &str,
            _mapping: &Value,
        ) -> Result<Receipt, Error> {
            unreachable!("scroll never writes")
        }

        fn scroll_begin(
            &self,
            _index: &str,
            _doc_type: &str,
            _ttl: &str,
        ) -> Result<ScrollResponse, Error> {
            Ok(ScrollResponse {
                scroll_id: self.begin_cursor.clone(),
                hits: ScrollHits::default(),
            })
        }

        fn scroll_next(&self, scroll_id: &str, _ttl: &str) -> Result<ScrollResponse, Error> {
            self.used_cursors.borrow_mut().push(scroll_id.to_string());
            Ok(self.pages.borrow_mut().remove(0))
        }

        fn create_document(
            &self,
            _index: Option<&str>,
            _doc_type: &str,
            _id: &str,
            _source: &Value,
        ) -> Result<Receipt, Error> {
            unreachable!("scroll never writes")
        }
    }

    fn page(scroll_id: Option<&str>, hits: Vec<Value>) -> ScrollResponse {
        ScrollResponse {
            scroll_id: scroll_id.map(str::to_string),
            hits: ScrollHits { hits },
        }
    }

    #[test]
    fn scroll_without_initial_cursor_is_empty() {
        let cluster = ScriptedCluster::new(None, vec![]);

        let hits: Vec<_> = Scroll::new(&cluster, "test", "data", "1m").collect();

        assert!(hits.is_empty());
        assert!(cluster.used_cursors.borrow().is_empty());
    }

    #[test]
    fn scroll_drains_every_batch_in_order() {
        let cluster = ScriptedCluster::new(
            Some("c0"),
            vec![
                page(Some("c1"), vec![json!({"_id": "1"}), json!({"_id": "2"})]),
                page(Some("c2"), vec![json!({"_id": "3"})]),
                page(None, vec![]),
            ],
        );

        let hits: Vec<_> = Scroll::new(&cluster, "test", "data", "1m")
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            hits,
            vec![json!({"_id": "1"}), json!({"_id": "2"}), json!({"_id": "3"})]
        );
        // Each cursor is consumed exactly once, in the order issued.
        assert_eq!(*cluster.used_cursors.borrow(), vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn scroll_stops_when_the_cursor_disappears() {
        let cluster = ScriptedCluster::new(
            Some("c0"),
            vec![page(None, vec![json!({"_id": "1"})])],
        );

        let hits: Vec<_> = Scroll::new(&cluster, "test", "data", "1m")
            .collect::<Result<_, _>>()
            .unwrap();

        // The last batch is still yielded before termination.
        assert_eq!(hits, vec![json!({"_id": "1"})]);
        assert_eq!(*cluster.used_cursors.borrow(), vec!["c0"]);
    }

    #[test]
    fn scroll_supports_early_termination() {
        let cluster = ScriptedCluster::new(
            Some("c0"),
            vec![page(Some("c1"), vec![json!({"_id": "1"}), json!({"_id": "2"})])],
        );

        let first = Scroll::new(&cluster, "test", "data", "1m").next();

        assert_eq!(first.unwrap().unwrap(), json!({"_id": "1"}));
        // Only the first batch was ever requested.
        assert_eq!(*cluster.used_cursors.borrow(), vec!["c0"]);
    }
}
