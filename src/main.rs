use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_address_etl::errors::Result;
use osm_address_etl::etl::audit_streets::StreetAuditEtl;
use osm_address_etl::etl::export_json::JsonExportEtl;
use osm_address_etl::etl::Etl;
use osm_address_etl::resolve_user_config;

#[derive(Parser)]
#[command(
    name = "osm_address_etl",
    version,
    about = "Clean up the street names and postcodes of an OSM extract and export it as JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file.
    #[arg(long, value_name = "PATH", default_value = "config/boulder.json")]
    config: PathBuf,

    /// .osm (or .osm.xz) file to read, overrides `data_path` from the config.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print street names whose street type is not canonical, grouped by type.
    Audit,

    /// Write one JSON document per node and way to `<input>.json`.
    Transform {
        /// Indent the JSON documents.
        #[arg(long)]
        pretty: bool,
    },
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let user_config = resolve_user_config(&cli.config, cli.input.as_deref())?;
    setup_logging(&user_config.log_level);

    let input_path = PathBuf::from(&user_config.data_path);
    match cli.command {
        Command::Audit => {
            StreetAuditEtl::new(input_path, io::stdout().lock()).process()
        },
        Command::Transform { pretty } => {
            JsonExportEtl::new(input_path, pretty || user_config.pretty)
                .with_progress(user_config.progress)
                .process()
        },
    }
}
