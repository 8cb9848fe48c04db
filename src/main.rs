use anyhow::Result;
use clap::{Parser, Subcommand};
use crime_choropleth::aggregate::aggregate;
use crime_choropleth::sort::{self, RegionColumn, SortSpec};
use crime_choropleth::{config, data, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the crime statistics API and map client
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the ranked per-region summary table
    Summary {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Column to sort by (e.g. state, total_crimes, dowry_deaths)
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
        Commands::Summary { config, sort, dir } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let names = app_config.name_map()?;
            let records = data::load_records(&app_config.input.data_csv, &names)?;

            let spec = SortSpec::<RegionColumn>::parse(sort.as_deref(), dir.as_deref())?;
            let summaries = sort::apply(&aggregate(&records), spec);

            println!("{:>4}  {:<28} {:>10}  {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
                "rank", "state", "total", "rape", "kidnap", "dowry", "assault", "modesty", "domestic", "traffic");
            for s in &summaries {
                let b = &s.breakdown;
                println!("{:>4}  {:<28} {:>10}  {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1}",
                    s.rank, s.region, s.total,
                    b.rape, b.kidnap, b.dowry, b.assault, b.modesty, b.domestic, b.trafficking);
            }
        }
    }

    Ok(())
}
