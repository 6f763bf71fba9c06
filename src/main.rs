use std::error::Error;
use std::pin::Pin;
use std::process::ExitCode;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_feed::configuration::{load_settings, FeedKind, FeedSettings};
use transit_feed::{
    CarParkExtractor, CarParkRecord, Extractor, FeedParser, RecordFactory, RunState,
    TrafficExtractor, TrafficRecord,
};

type Source = Pin<Box<dyn AsyncRead + Send>>;

/// Usage: `transit-feed [CONFIG]`
///
/// Settings come from the optional config file and `TRANSIT_FEED_*`
/// variables, e.g. `TRANSIT_FEED_FEED=traffic TRANSIT_FEED_SOURCE=events.json`.
/// Records are written to stdout as JSON lines.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args().nth(1);
    let settings = match load_settings(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid settings");
            return ExitCode::from(2);
        }
    };

    match run(&settings).await {
        Ok(RunState::Done) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, source = %settings.source, "feed failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &FeedSettings) -> Result<RunState, Box<dyn Error>> {
    let source = open(settings).await?;
    let parser = FeedParser::with_config(settings.parser.clone().into());
    match settings.feed {
        FeedKind::CarPark => {
            fetch(parser, source, &CarParkRecord::default, CarParkExtractor::new()).await
        }
        FeedKind::Traffic => {
            fetch(parser, source, &TrafficRecord::default, TrafficExtractor::new()).await
        }
    }
}

async fn open(settings: &FeedSettings) -> Result<Source, Box<dyn Error>> {
    if settings.is_remote() {
        #[cfg(feature = "http")]
        {
            use transit_feed::{FeedConnector, HttpConfig, HttpConnector};

            let config = HttpConfig {
                timeout: std::time::Duration::from_secs(settings.http_timeout_secs),
                ..Default::default()
            };
            let connector = HttpConnector::new(&settings.source, config)?;
            return Ok(Box::pin(connector.open().await?));
        }
        #[cfg(not(feature = "http"))]
        return Err("remote sources need the `http` feature".into());
    }

    let file = tokio::fs::File::open(&settings.source).await?;
    Ok(Box::pin(BufReader::new(file)))
}

async fn fetch<E, F>(
    mut parser: FeedParser,
    source: Source,
    factory: &F,
    mut extractor: E,
) -> Result<RunState, Box<dyn Error>>
where
    E: Extractor,
    E::Record: Serialize,
    F: RecordFactory<E::Record>,
{
    let cancel = parser.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut records = Vec::new();
    let state = parser.run(source, &mut records, factory, &mut extractor).await;

    let mut stdout = tokio::io::stdout();
    for record in &records {
        let mut line = simd_json::to_string(record)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
    }
    stdout.flush().await?;

    match parser.last_error() {
        Some(e) => warn!(%state, records = records.len(), error = %e, "feed stopped early"),
        None => info!(%state, records = records.len(), "feed processed"),
    }
    Ok(state)
}
