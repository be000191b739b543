use caseharvest::config::{
    Config, DEFAULT_CASE_URL_PREFIX, DEFAULT_ORIGIN, DEFAULT_REFERER, DEFAULT_SEARCH_QUERY,
    DEFAULT_SEARCH_URL,
};
use caseharvest::{run_pipeline, CsvSink, FatalError, RemoteClient, SearchCasesResponse};
use clap::{value_parser, Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("caseharvest")
        .version("0.1.0")
        .about("Harvest missing-child case records into a CSV export")
        .arg(
            Arg::new("url")
                .long("url")
                .default_value(DEFAULT_SEARCH_URL)
                .help("Search URL for the case listing"),
        )
        .arg(
            Arg::new("urlcase")
                .long("urlcase")
                .default_value(DEFAULT_CASE_URL_PREFIX)
                .help("URL prefix for per-case detail lookups"),
        )
        .arg(
            Arg::new("search")
                .long("search")
                .default_value(DEFAULT_SEARCH_QUERY)
                .help("Search query payload"),
        )
        .arg(
            Arg::new("origin")
                .long("origin")
                .default_value(DEFAULT_ORIGIN)
                .help("Value for the HTTP Origin header"),
        )
        .arg(
            Arg::new("referer")
                .long("referer")
                .default_value(DEFAULT_REFERER)
                .help("Value for the HTTP Referer header"),
        )
        .arg(
            Arg::new("indatafile")
                .long("indatafile")
                .help("Use this file as input instead of a network request"),
        )
        .arg(
            Arg::new("outdatafile")
                .long("outdatafile")
                .help("Save the raw list response into this file"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .default_value("../output/output.csv")
                .help("Name of the resulting CSV file"),
        )
        .arg(
            Arg::new("cachedir")
                .long("cachedir")
                .default_value("../output/cache")
                .help("Directory for the image cache (empty disables caching)"),
        )
        .arg(
            Arg::new("numconn")
                .long("numconn")
                .default_value("10")
                .value_parser(value_parser!(usize))
                .help("Number of simultaneous case resolvers"),
        )
}

fn config_from_matches(matches: &clap::ArgMatches) -> Config {
    let cache_dir = matches
        .get_one::<String>("cachedir")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    Config {
        search_url: matches.get_one::<String>("url").cloned().unwrap_or_default(),
        case_url_prefix: matches
            .get_one::<String>("urlcase")
            .cloned()
            .unwrap_or_default(),
        search_query: matches
            .get_one::<String>("search")
            .cloned()
            .unwrap_or_default(),
        origin: matches
            .get_one::<String>("origin")
            .cloned()
            .unwrap_or_default(),
        referer: matches
            .get_one::<String>("referer")
            .cloned()
            .unwrap_or_default(),
        in_data_file: matches.get_one::<String>("indatafile").map(PathBuf::from),
        out_data_file: matches.get_one::<String>("outdatafile").map(PathBuf::from),
        output: matches
            .get_one::<String>("output")
            .map(PathBuf::from)
            .unwrap_or_default(),
        cache_dir,
        workers: matches.get_one::<usize>("numconn").copied().unwrap_or(10),
    }
}

/// Raw list response: from the input file when configured, otherwise
/// one POST to the search endpoint.
async fn fetch_list(config: &Config, client: &RemoteClient) -> Result<String, FatalError> {
    if let Some(path) = &config.in_data_file {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source| FatalError::InputFile {
                path: path.display().to_string(),
                source,
            });
    }

    let body = client.list_cases().await.map_err(FatalError::ListRequest)?;

    if let Some(path) = &config.out_data_file {
        // Debugging convenience; a failed save never aborts the run.
        if let Err(err) = tokio::fs::write(path, &body).await {
            warn!(path = %path.display(), %err, "cannot save raw list response");
        }
    }

    Ok(body)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();
    let config = Arc::new(config_from_matches(&matches));
    let client = RemoteClient::new(Arc::clone(&config));

    let body = fetch_list(&config, &client).await?;
    let listing: SearchCasesResponse =
        serde_json::from_str(&body).map_err(FatalError::MalformedList)?;
    info!(
        total = listing.cases.total,
        listed = listing.cases.results.len(),
        "case list loaded"
    );

    let mut sink = CsvSink::create(&config.output)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("terminate requested, winding down");
            interrupt.cancel();
        }
    });

    let report = run_pipeline(
        Arc::clone(&config),
        client,
        listing.cases.results,
        &mut sink,
        cancel,
    )
    .await?;

    if report.cancelled && report.completed() < report.total {
        error!(
            completed = report.completed(),
            total = report.total,
            "run cancelled before completion"
        );
        std::process::exit(1);
    }

    Ok(())
}
