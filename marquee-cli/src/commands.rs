//! CLI command implementations

use std::fmt::Display;

use anyhow::Context;
use clap::Subcommand;
use marquee_core::config::MarqueeConfig;
use marquee_sources::{
    DEFAULT_CAST_LIMIT, DEFAULT_DIRECTOR_LIMIT, DEFAULT_GENRE_LIMIT, MovieAggregator, MovieSource,
    Session, SourceKind, SourceProviders, search_imdb_movies, search_tmdb_movies,
    streaming_providers,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show a movie's details from each source
    Info {
        /// Movie title
        title: String,
        /// Release year, improves matching
        #[arg(short, long)]
        year: Option<i32>,
        /// IMDb id, looked up directly instead of searching
        #[arg(long)]
        imdb_id: Option<String>,
        /// TMDB id, looked up directly instead of searching
        #[arg(long)]
        tmdb_id: Option<String>,
        /// Sources to load (imdb, mtc, rt, tmdb); IMDb and TMDB are included
        /// by default only when their API keys are configured
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<String>,
        /// TMDB API key, overrides TMDB_API_KEY
        #[arg(long)]
        tmdb_api_key: Option<String>,
    },
    /// Search for movies by title
    Search {
        /// Search query
        query: String,
        /// Search TMDB instead of IMDb
        #[arg(long)]
        tmdb: bool,
        /// Region for TMDB searches (ISO 3166-1, e.g. us or gb)
        #[arg(long, default_value = "us")]
        region: String,
        /// TMDB API key, overrides TMDB_API_KEY
        #[arg(long)]
        tmdb_api_key: Option<String>,
    },
    /// List streaming providers for a TMDB movie
    Providers {
        /// TMDB movie id
        tmdb_id: String,
        /// Regions to include (repeatable)
        #[arg(short, long = "region", default_value = "us")]
        regions: Vec<String>,
        /// TMDB API key, overrides TMDB_API_KEY
        #[arg(long)]
        tmdb_api_key: Option<String>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the error of whichever lookup fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = MarqueeConfig::from_env();

    match command {
        Commands::Info {
            title,
            year,
            imdb_id,
            tmdb_id,
            sources,
            tmdb_api_key,
        } => {
            let mut config = config;
            config.api_keys.tmdb = config.api_keys.resolve_tmdb(tmdb_api_key);
            show_info(&config, title, year, imdb_id, tmdb_id, sources).await
        }
        Commands::Search {
            query,
            tmdb,
            region,
            tmdb_api_key,
        } => search_movies(&config, &query, tmdb, &region, tmdb_api_key).await,
        Commands::Providers {
            tmdb_id,
            regions,
            tmdb_api_key,
        } => show_providers(&config, &tmdb_id, &regions, tmdb_api_key).await,
    }
}

/// Load the requested sources and print what each one found
///
/// Sources that loaded are printed even when another source failed.
///
/// # Errors
/// - `SourceError` - Unrecognized source name or a failed source load
pub async fn show_info(
    config: &MarqueeConfig,
    title: String,
    year: Option<i32>,
    imdb_id: Option<String>,
    tmdb_id: Option<String>,
    sources: Vec<String>,
) -> anyhow::Result<()> {
    let sources = if sources.is_empty() {
        default_sources(config)
    } else {
        sources
    };

    let mut aggregator = MovieAggregator::with_config(title, config)
        .with_year(year)
        .with_imdb_id(imdb_id)
        .with_tmdb_id(tmdb_id);

    tracing::info!("Loading {sources:?} for '{}'", aggregator.title());
    let load_result = aggregator.load_sources(sources.as_slice()).await.map(|_| ());

    println!("{aggregator}");

    if let Ok(imdb) = aggregator.imdb_mut() {
        let session = Session::open(&config.http)?;
        let plot = imdb.plot(&session).await;
        session.close();

        print_header(&*imdb);
        print_field("Year", imdb.year());
        print_field("Rating", imdb.rating());
        print_field("Runtime", imdb.runtime().map(|r| format!("{r} min")));
        print_common(&*imdb);
        print_field("Plot", plot);
    }

    if let Ok(mtc) = aggregator.mtc() {
        print_header(mtc);
        print_field("Year", mtc.year());
        print_field("Metascore", mtc.rating());
    }

    if let Ok(rt) = aggregator.rt() {
        print_header(rt);
        print_field("Year", rt.year());
        print_field("Tomatometer", rt.score());
    }

    if let Ok(tmdb) = aggregator.tmdb() {
        print_header(tmdb);
        print_field("Release date", tmdb.release_date());
        print_field("Rating", tmdb.rating());
        print_field("Runtime", tmdb.runtime().map(|r| format!("{r} min")));
        print_field("IMDb id", tmdb.imdb_id());
        print_common(tmdb);
        print_field("Plot", tmdb.plot());
    }

    load_result.context("Not every source could be loaded")
}

/// Search IMDb (or TMDB) and print every hit
///
/// # Errors
/// - `SourceError::MissingApiKey` - TMDB search without an API key
/// - `SourceError` - Provider request failed
pub async fn search_movies(
    config: &MarqueeConfig,
    query: &str,
    tmdb: bool,
    region: &str,
    tmdb_api_key: Option<String>,
) -> anyhow::Result<()> {
    let session = Session::open(&config.http)?;

    let result = if tmdb {
        search_tmdb_movies(config, &session, query, tmdb_api_key, region)
            .await
            .map(|results| {
                println!("Found {} TMDB results for '{query}':", results.len());
                for movie in results {
                    println!(
                        "  [{}] {} ({})",
                        movie.text("id").unwrap_or_default(),
                        movie.title().unwrap_or_default(),
                        movie.text("release_date").unwrap_or_else(|| "n/a".to_string())
                    );
                }
            })
    } else {
        let providers = SourceProviders::from_config(config);
        search_imdb_movies(providers.imdb.as_ref(), &session, query)
            .await
            .map(|results| {
                println!("Found {} IMDb results for '{query}':", results.len());
                for movie in results {
                    println!(
                        "  [{}] {} ({}) {}",
                        movie.imdb_id.unwrap_or_default(),
                        movie.title.unwrap_or_default(),
                        movie.year.map_or_else(|| "n/a".to_string(), |y| y.to_string()),
                        movie.kind.unwrap_or_default()
                    );
                }
            })
    };

    session.close();
    Ok(result?)
}

/// Print streaming providers per region as JSON
///
/// # Errors
/// - `SourceError::MissingApiKey` - No TMDB API key available
/// - `SourceError::Provider` - Unknown TMDB movie id
pub async fn show_providers(
    config: &MarqueeConfig,
    tmdb_id: &str,
    regions: &[String],
    tmdb_api_key: Option<String>,
) -> anyhow::Result<()> {
    let session = Session::open(&config.http)?;
    let result = streaming_providers(config, &session, tmdb_id, regions, tmdb_api_key).await;
    session.close();

    let providers = result?;
    println!("{}", serde_json::to_string_pretty(&providers)?);
    Ok(())
}

fn default_sources(config: &MarqueeConfig) -> Vec<String> {
    SourceKind::ALL
        .into_iter()
        .filter(|kind| match kind {
            SourceKind::Imdb => config.api_keys.omdb.is_some(),
            SourceKind::Tmdb => config.api_keys.tmdb.is_some(),
            _ => true,
        })
        .map(|kind| kind.key().to_string())
        .collect()
}

fn print_header(source: &dyn MovieSource) {
    println!();
    let confidence = if source.low_confidence() {
        " (low confidence)"
    } else {
        ""
    };
    println!("{}{confidence}", source.kind());
    match source.title() {
        Some(title) => println!("  Title: {title}"),
        None => println!("  No match found"),
    }
}

fn print_common(source: &dyn MovieSource) {
    print_list("Genres", source.genres(DEFAULT_GENRE_LIMIT));
    print_list("Directors", source.directors(DEFAULT_DIRECTOR_LIMIT));
    print_list("Cast", source.cast(DEFAULT_CAST_LIMIT));
}

fn print_field(label: &str, value: Option<impl Display>) {
    if let Some(value) = value {
        println!("  {label}: {value}");
    }
}

fn print_list(label: &str, values: Vec<String>) {
    if !values.is_empty() {
        println!("  {label}: {}", values.join(", "));
    }
}
