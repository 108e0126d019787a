use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid request: {}", reason))]
    InvalidRequest { reason: String },

    #[snafu(display("mapping of index `{}` has not been set", index))]
    MappingNotFound { index: String },

    #[snafu(display("directory `{}` does not exist", path.display()))]
    DirectoryNotFound { path: PathBuf },

    #[snafu(display("file `{}` does not exist", path.display()))]
    FileNotFound { path: PathBuf },

    #[snafu(display("elasticsearch transport error: {}", source))]
    #[snafu(context(false))]
    Transport { source: reqwest::Error },

    #[snafu(display("could not access `{}`: {}", path.display(), source))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid json in `{}`: {}", path.display(), source))]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
