use std::{
    io::{self, Write},
    process,
};

use axum::{
    body::Body,
    http::{Request, Response, header},
};
use edgecache::{
    config::{self, Command, HeadersArgs, PurgeTarget, Settings},
    directives::{CACHE_TAGS_HEADER, DirectiveResolver},
    edge::{CachePurge, EdgeCache, EdgeClient, PurgeOutcome, SkipReason},
    error::AppError,
    infra::{error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Purge(args) => run_purge(&settings, args.target).await,
        Command::Setting(args) => run_setting(&settings, &args.name).await,
        Command::Headers(args) => run_headers(&settings, args).await,
    }
}

fn edge_cache(settings: &Settings) -> Result<EdgeCache, AppError> {
    let client = EdgeClient::new(&settings.edge)?;
    Ok(EdgeCache::new(client, settings.edge.purge_enabled))
}

async fn run_purge(settings: &Settings, target: PurgeTarget) -> Result<(), AppError> {
    let cache = edge_cache(settings)?;

    let outcome = match target {
        PurgeTarget::Everything => cache.purge_everything().await?,
        PurgeTarget::Tags { tags } => cache.purge_by_tags(tags.into()).await?,
        PurgeTarget::Urls { urls } => cache.purge_by_urls(urls).await?,
        PurgeTarget::Hosts { hosts } => cache.purge_by_hosts(hosts).await?,
        PurgeTarget::Prefixes { prefixes } => cache.purge_by_prefixes(prefixes).await?,
    };

    let line = match outcome {
        PurgeOutcome::Purged { id: Some(id) } => format!("purged (id {id})"),
        PurgeOutcome::Purged { id: None } => "purged".to_string(),
        PurgeOutcome::Skipped(SkipReason::Disabled) => {
            "skipped: purging is disabled for this deployment".to_string()
        }
        PurgeOutcome::Skipped(SkipReason::NoTargets) => {
            "skipped: nothing left to purge after normalization".to_string()
        }
    };
    print_line(&line)
}

async fn run_setting(settings: &Settings, name: &str) -> Result<(), AppError> {
    let cache = edge_cache(settings)?;
    let value = cache.zone_setting(name).await?;
    let rendered = serde_json::to_string_pretty(&value)
        .map_err(|err| AppError::unexpected(format!("failed to render setting: {err}")))?;
    print_line(&rendered)
}

async fn run_headers(settings: &Settings, args: HeadersArgs) -> Result<(), AppError> {
    let resolver = DirectiveResolver::new(settings.cache.default_ttl);
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    let response = resolver
        .handle(
            request,
            |_| async { Response::new(Body::empty()) },
            args.ttl.as_deref(),
            args.tags.as_deref(),
        )
        .await;

    info!(
        default_ttl = resolver.default_ttl(),
        "resolved route directives"
    );

    for name in [header::CACHE_CONTROL, CACHE_TAGS_HEADER] {
        if let Some(value) = response.headers().get(&name) {
            let value = value
                .to_str()
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            print_line(&format!("{name}: {value}"))?;
        }
    }
    Ok(())
}

fn print_line(line: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").map_err(|err| AppError::from(InfraError::from(err)))
}
