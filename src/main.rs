use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use graphkb::config::{CliConfig, TranslatorConfig};
use graphkb::open_cypher_parser::parse_query;
use graphkb::query_planner::Translator;
use validator::Validate;

/// graphkb-sql - translate Cypher queries over the knowledge base into SQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file. Environment variables are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Table holding assets (id, value, type)
    #[arg(long)]
    assets_table: Option<String>,

    /// Table holding relations (id, from_id, to_id, type)
    #[arg(long)]
    relations_table: Option<String>,

    /// Always match both orientations of undirected relationships
    #[arg(long)]
    no_either_optimization: bool,

    /// Print the translation as JSON, including projection metadata
    #[arg(long)]
    json: bool,

    /// Cypher query. Read from stdin when omitted
    query: Option<String>,
}

impl Cli {
    /// CLI overrides applied on top of `base`.
    fn overrides(&self, base: &TranslatorConfig) -> CliConfig {
        CliConfig {
            assets_table: self
                .assets_table
                .clone()
                .unwrap_or_else(|| base.assets_table.clone()),
            relations_table: self
                .relations_table
                .clone()
                .unwrap_or_else(|| base.relations_table.clone()),
            optimize_either_direction: base.optimize_either_direction && !self.no_either_optimization,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TranslatorConfig> {
    let mut config = match &cli.config {
        Some(path) => TranslatorConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => TranslatorConfig::from_env().context("reading configuration from environment")?,
    };
    config.merge(cli.overrides(&config));
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_query(cli: &Cli) -> anyhow::Result<String> {
    match &cli.query {
        Some(query) => Ok(query.clone()),
        None => {
            let mut query = String::new();
            std::io::stdin()
                .read_to_string(&mut query)
                .context("reading query from stdin")?;
            Ok(query)
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let cypher = read_query(&cli)?;

    let query = parse_query(&cypher).map_err(|e| anyhow!("failed to parse query:\n{}", e))?;
    let translation = Translator::new(config)
        .translate(&query)
        .context("failed to translate query")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&translation)?);
    } else {
        println!("{}", translation.query);
    }
    Ok(())
}
