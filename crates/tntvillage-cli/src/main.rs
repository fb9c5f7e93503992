//! `tntvillage-search`: run one TNTVillage search and print the results as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tntvillage_core::{
    load_config, proper_search_strings, Config, EpisodeCounter, EpisodeIndex, SceneNameParser,
    SearchMode, SearchParams, SqliteEpisodeIndex, TntClient, TntVillageProvider,
};

/// Search the TNTVillage release list
#[derive(Debug, Parser)]
#[command(name = "tntvillage-search", version)]
struct Args {
    /// Search strings, e.g. "Show S01"
    #[arg(required = true)]
    queries: Vec<String>,

    /// Search mode the strings belong to
    #[arg(short, long, value_enum, default_value_t = ModeArg::Season)]
    mode: ModeArg,

    /// Configuration file
    #[arg(short, long, env = "TNTVILLAGE_CONFIG", default_value = "tntvillage.toml")]
    config: PathBuf,

    /// Keep releases that are only subtitled in Italian
    #[arg(long)]
    subtitle: bool,

    /// Search for PROPER/REPACK re-releases of each query instead
    #[arg(long)]
    proper: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Rss,
    Season,
    Episode,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rss => SearchMode::Rss,
            ModeArg::Season => SearchMode::Season,
            ModeArg::Episode => SearchMode::Episode,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = read_config(&args.config)?;
    if args.subtitle {
        config.provider.subtitle = true;
    }

    let client = TntClient::with_config(config.client.clone()).context("Failed to build HTTP client")?;
    let names = SceneNameParser::new(config.library.shows.clone());
    let episodes = open_library(config.library.database.as_deref())?;
    let provider = TntVillageProvider::new(client, names, episodes, config.provider);

    let params = search_params(args.mode, args.queries, args.proper);
    let results = provider.search(&params, 0, None).await;
    info!(count = results.len(), "Search finished");

    let json = if args.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{}", json);

    Ok(())
}

fn search_params(mode: ModeArg, queries: Vec<String>, proper: bool) -> SearchParams {
    let queries = if proper {
        queries.iter().flat_map(|q| proper_search_strings(q)).collect()
    } else {
        queries
    };
    SearchParams::new().mode(mode.into(), queries)
}

/// Load the config file, falling back to defaults when it does not exist.
fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!("Config file {:?} not found, using defaults", path);
        return Ok(Config::default());
    }

    info!("Loading configuration from {:?}", path);
    load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
}

fn open_library(database: Option<&Path>) -> Result<Box<dyn EpisodeCounter>> {
    match database {
        Some(path) => {
            let index = SqliteEpisodeIndex::open(path)
                .with_context(|| format!("Failed to open episode database {:?}", path))?;
            Ok(Box::new(index))
        }
        None => Ok(Box::new(EpisodeIndex::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["tntvillage-search", "Show S01"]).unwrap();
        assert_eq!(args.queries, vec!["Show S01"]);
        assert_eq!(args.mode, ModeArg::Season);
        assert!(!args.subtitle);
        assert!(!args.proper);
        assert!(!args.pretty);
    }

    #[test]
    fn test_args_mode_and_flags() {
        let args = Args::try_parse_from([
            "tntvillage-search",
            "--mode",
            "rss",
            "--subtitle",
            "--config",
            "/tmp/tnt.toml",
            "Show S01",
            "Show S02",
        ])
        .unwrap();
        assert_eq!(SearchMode::from(args.mode), SearchMode::Rss);
        assert!(args.subtitle);
        assert_eq!(args.config, PathBuf::from("/tmp/tnt.toml"));
        assert_eq!(args.queries.len(), 2);
    }

    #[test]
    fn test_search_params_proper_variants() {
        let params = search_params(ModeArg::Episode, vec!["Show S01E02".to_string()], true);
        assert_eq!(
            params.modes,
            vec![(
                SearchMode::Episode,
                vec!["Show S01E02 PROPER".to_string(), "Show S01E02 REPACK".to_string()]
            )]
        );

        let params = search_params(ModeArg::Season, vec!["Show S01".to_string()], false);
        assert_eq!(params.modes, vec![(SearchMode::Season, vec!["Show S01".to_string()])]);
    }

    #[test]
    fn test_args_require_a_query() {
        assert!(Args::try_parse_from(["tntvillage-search"]).is_err());
    }

    #[test]
    fn test_read_config_missing_file_uses_defaults() {
        let config = read_config(Path::new("/nonexistent/tntvillage.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_open_library_without_database() {
        let library = open_library(None).unwrap();
        assert_eq!(library.count_episodes(1, 1).unwrap(), 0);
    }
}
