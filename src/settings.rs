//! Program configuration: compiled-in defaults, optionally layered with a
//! configuration directory, finally overridden by command-line arguments.

use config::{Config, ConfigError, File, FileFormat, Source, Value};
use serde::{Deserialize, Serialize};
use slog_scope::{info, warn};
use snafu::{ResultExt, Snafu};
use std::path::PathBuf;
use structopt::StructOpt;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not merge configuration: {}", source))]
    ConfigMerge { source: ConfigError },

    #[snafu(display("invalid configuration: {}", msg))]
    Invalid { msg: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elasticsearch {
    pub connection_string: String,
    /// Per-request timeout, in seconds.
    pub timeout: u64,
    /// Scroll cursor time-to-live, eg. "1m".
    pub scroll: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub elasticsearch: Elasticsearch,
}

#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "ratatosk",
    about = "Dump and restore Elasticsearch mappings and documents",
    version = VERSION,
    author = AUTHORS
)]
pub struct Args {
    /// Elasticsearch parameters.
    #[structopt(short = "c", long = "connection-string")]
    pub connection_string: Option<String>,

    /// Index to work on. Without it, a dump walks every index of the
    /// cluster.
    #[structopt(short = "i", long = "index")]
    pub index: Option<String>,

    /// Local directory holding the dumped files.
    #[structopt(short = "d", long = "dir", parse(from_os_str))]
    pub dir: PathBuf,

    /// Path to the config directory. ratatosk reads <config-dir>/default
    /// instead of the compiled-in defaults.
    #[structopt(short = "D", long = "config-dir", parse(from_os_str))]
    pub config_dir: Option<PathBuf>,

    /// Specific configuration, on top of the default one. You should
    /// provide the basename of a file in the config directory. (Requires
    /// config_dir to be set.)
    #[structopt(short = "s", long = "settings")]
    pub settings: Option<String>,

    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, StructOpt)]
pub enum Command {
    /// Dump every type's mapping and documents into the local directory
    Dump,
    /// Re-create mappings and documents from the local directory
    Upload {
        /// Restrict the upload to one type
        #[structopt(short = "t", long = "doc-type")]
        doc_type: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

impl Settings {
    // To create settings, we first retrieve default settings, merge in
    // specific settings if needed, and finally override them with command
    // line arguments.
    pub fn new(args: &Args) -> Result<Self, Error> {
        let mut builder = Config::builder();

        builder = match &args.config_dir {
            Some(config_dir) => {
                let mut dir = config_dir.clone();
                dir.push("default");

                let path = dir.to_string_lossy().to_string();
                info!("using configuration from {}", path);
                let mut builder = builder.add_source(File::with_name(&path));
                dir.pop();

                // If we provided a special configuration, merge it.
                if let Some(name) = &args.settings {
                    dir.push(name);
                    let path = dir.to_string_lossy().to_string();
                    info!("using configuration from {}", path);
                    builder = builder.add_source(File::with_name(&path).required(true));
                }
                builder
            }
            None => {
                if args.settings.is_some() {
                    // If the user set the 'settings' at the command line,
                    // he should also have used the 'config_dir' option.
                    warn!("settings option used without the 'config-dir' option. Please set the config directory with --config-dir.");
                    return Invalid {
                        msg: "could not build program settings",
                    }
                    .fail();
                }
                builder.add_source(File::from_str(
                    include_str!("../config/default.toml"),
                    FileFormat::Toml,
                ))
            }
        };

        // Now override with command line values
        builder = builder.add_source(args.clone());

        builder
            .build()
            .context(ConfigMerge)?
            .try_deserialize()
            .context(ConfigMerge)
    }
}

// Command line values override whatever the configuration files set.
impl Source for Args {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, Value>, ConfigError> {
        let mut m = config::Map::new();

        if let Some(connection_string) = self.connection_string.clone() {
            m.insert(
                String::from("elasticsearch.connection_string"),
                Value::new(None, connection_string),
            );
        }

        Ok(m)
    }
}
