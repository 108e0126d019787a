use snafu::{ResultExt, Snafu};
use std::time::Duration;
use structopt::StructOpt;

use ratatosk::cluster::HttpCluster;
use ratatosk::dump::Dumper;
use ratatosk::settings::{Args, Command, Settings};
use ratatosk::upload::Uploader;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("settings error: {}", source))]
    Configuration { source: ratatosk::settings::Error },

    #[snafu(display("{}", source))]
    Execution { source: ratatosk::Error },
}

fn main() -> Result<(), Error> {
    let args = Args::from_args();
    let _guard = ratatosk::logger::logger_init();

    let settings = Settings::new(&args).context(Configuration)?;

    match &args.cmd {
        Command::Dump => run_dump(&args, &settings).context(Execution),
        Command::Upload { doc_type } => {
            run_upload(&args, &settings, doc_type.as_deref()).context(Execution)
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings).unwrap());
            Ok(())
        }
    }
}

fn connect(settings: &Settings) -> Result<HttpCluster, ratatosk::Error> {
    HttpCluster::new(
        &settings.elasticsearch.connection_string,
        Duration::from_secs(settings.elasticsearch.timeout),
    )
}

fn run_dump(args: &Args, settings: &Settings) -> Result<(), ratatosk::Error> {
    let cluster = connect(settings)?;
    Dumper::new(
        &cluster,
        args.index.clone(),
        args.dir.clone(),
        settings.elasticsearch.scroll.clone(),
    )
    .save()
}

fn run_upload(
    args: &Args,
    settings: &Settings,
    doc_type: Option<&str>,
) -> Result<(), ratatosk::Error> {
    let cluster = connect(settings)?;
    Uploader::new(&cluster, args.index.clone(), args.dir.clone()).upload(doc_type)
}
