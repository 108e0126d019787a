use serde_json::json;
use slog_scope::info;
use snafu::{ensure, ResultExt};
use std::fs::File;
use std::path::PathBuf;

use crate::cluster::Cluster;
use crate::error::{DirectoryNotFound, Io, Json};
use crate::mapping::{fetch_mappings, mapping_records};
use crate::scroll::Scroll;
use crate::utils::{make_file_path, JSON_EXT};
use crate::Error;

/// Exports every type's mapping and document set to local files.
pub struct Dumper<'a, C: Cluster> {
    cluster: &'a C,
    index: Option<String>,
    dirname: PathBuf,
    scroll_ttl: String,
}

impl<'a, C: Cluster> Dumper<'a, C> {
    pub fn new(
        cluster: &'a C,
        index: Option<String>,
        dirname: PathBuf,
        scroll_ttl: String,
    ) -> Self {
        Dumper {
            cluster,
            index,
            dirname,
            scroll_ttl,
        }
    }

    /// Persist the mapping of every type as `<index>.<type>.mapping.json`.
    pub fn dump_mappings(&self) -> Result<(), Error> {
        let data = fetch_mappings(self.cluster, self.index.as_deref())?;
        for record in mapping_records(data) {
            let path = make_file_path(
                &self.dirname,
                &[&record.index, &record.doc_type, "mapping"],
                JSON_EXT,
            );

            info!("dumping mapping of {}.{}", record.index, record.doc_type);
            let file = File::create(&path).context(Io { path: path.clone() })?;
            serde_json::to_writer(file, &json!({ "properties": record.schema }))
                .context(Json { path })?;
            info!("mapping of {}.{} dumped", record.index, record.doc_type);
        }
        Ok(())
    }

    /// Persist every document of every type as `<index>.<type>.json`.
    ///
    /// The whole scroll is drained in memory before writing; per-type
    /// document sets are expected to stay small.
    pub fn dump_documents(&self) -> Result<(), Error> {
        let data = fetch_mappings(self.cluster, self.index.as_deref())?;
        for record in mapping_records(data) {
            let path = make_file_path(&self.dirname, &[&record.index, &record.doc_type], JSON_EXT);

            info!("dumping documents of {}.{}", record.index, record.doc_type);
            let hits = Scroll::new(
                self.cluster,
                &record.index,
                &record.doc_type,
                &self.scroll_ttl,
            )
            .collect::<Result<Vec<_>, _>>()?;
            let file = File::create(&path).context(Io { path: path.clone() })?;
            serde_json::to_writer(file, &hits).context(Json { path })?;
            info!("documents of {}.{} dumped", record.index, record.doc_type);
        }
        Ok(())
    }

    /// Dump mappings, then documents. The target directory must exist.
    pub fn save(&self) -> Result<(), Error> {
        ensure!(
            self.dirname.exists(),
            DirectoryNotFound {
                path: self.dirname.clone(),
            }
        );

        self.dump_mappings()?;
        self.dump_documents()
    }
}
