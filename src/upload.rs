use serde::de::DeserializeOwned;
use serde_json::Value;
use slog_scope::info;
use snafu::{ensure, ResultExt};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cluster::Cluster;
use crate::error::{DirectoryNotFound, FileNotFound, Io, Json};
use crate::utils::{make_file_path, JSON_EXT};
use crate::Error;

/// Re-creates mappings and documents from the files written by the dumper.
///
/// Documents are written create-only: re-running an upload leaves existing
/// ids untouched, the cluster rejects them server-side.
pub struct Uploader<'a, C: Cluster> {
    cluster: &'a C,
    index: Option<String>,
    dirname: PathBuf,
}

impl<'a, C: Cluster> Uploader<'a, C> {
    pub fn new(cluster: &'a C, index: Option<String>, dirname: PathBuf) -> Self {
        Uploader {
            cluster,
            index,
            dirname,
        }
    }

    fn index_str(&self) -> &str {
        self.index.as_deref().unwrap_or("")
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, Error> {
        ensure!(path.exists(), FileNotFound { path });
        let file = File::open(path).context(Io { path })?;
        serde_json::from_reader(file).context(Json { path })
    }

    /// PUT the persisted mapping of `doc_type` to the type's mapping
    /// endpoint and log the cluster's answer.
    pub fn upload_mapping(&self, doc_type: &str) -> Result<(), Error> {
        let path = make_file_path(
            &self.dirname,
            &[self.index_str(), doc_type, "mapping"],
            JSON_EXT,
        );
        let mapping: Value = self.read_json(&path)?;

        info!("uploading mapping of {}.{}", self.index_str(), doc_type);
        let receipt = self
            .cluster
            .put_mapping(self.index.as_deref(), doc_type, &mapping)?;
        info!("{} {}", receipt.status, receipt.body);
        Ok(())
    }

    /// Create every persisted document of `doc_type`, one request per hit.
    pub fn upload_documents(&self, doc_type: &str) -> Result<(), Error> {
        let path = make_file_path(&self.dirname, &[self.index_str(), doc_type], JSON_EXT);
        let hits: Vec<Value> = self.read_json(&path)?;

        let null = Value::Null;
        for hit in &hits {
            let id = hit.get("_id").and_then(Value::as_str).unwrap_or("");
            let source = hit.get("_source").unwrap_or(&null);

            info!("uploading document of {}.{}", self.index_str(), doc_type);
            let receipt = self
                .cluster
                .create_document(self.index.as_deref(), doc_type, id, source)?;
            info!("{} {}", receipt.status, receipt.body);
        }
        Ok(())
    }

    /// Upload one type, or scan the directory and upload every type found.
    ///
    /// The scan derives a type name from each `*.json` file, so a type with
    /// both a mapping file and a document file is visited twice. Mapping
    /// PUTs are idempotent and document creates are rejected on replay, so
    /// the second visit is redundant but harmless.
    pub fn upload(&self, doc_type: Option<&str>) -> Result<(), Error> {
        ensure!(
            self.dirname.exists(),
            DirectoryNotFound {
                path: self.dirname.clone(),
            }
        );

        match doc_type {
            Some(doc_type) => {
                self.upload_mapping(doc_type)?;
                self.upload_documents(doc_type)
            }
            None => {
                for entry in WalkDir::new(&self.dirname) {
                    let entry = entry.map_err(std::io::Error::from).context(Io {
                        path: self.dirname.clone(),
                    })?;
                    if !entry.file_type().is_file() {
                        continue;
                    }

                    let name = entry.file_name().to_string_lossy();
                    if let Some(doc_type) = doc_type_from_file_name(&name) {
                        self.upload_mapping(doc_type)?;
                        self.upload_documents(doc_type)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Derive the type name from a persisted file name: the second
/// dot-separated component of the stem. `test.data.mapping.json` and
/// `test.data.json` both name the type `data`; anything shorter carries no
/// type name.
fn doc_type_from_file_name(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(JSON_EXT)?;
    stem.split('.').nth(1)
}
