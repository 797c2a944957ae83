use std::process;
use std::sync::Arc;

use perf_tooling::{
    catalog::{self, CatalogState, Engine, UpdateQueue},
    config,
    enrichment::{
        CodeHost, EnrichmentService, Providers, RepoRef, SocialSource, VideoSource,
        refresh_schedule, spawn_refresh_monitor,
    },
    infra::{
        assets, error::InfraError,
        http::{self, HttpState},
        providers::{GitHubClient, TwitterClient, VimeoClient, YouTubeClient, build_http_client},
        telemetry,
    },
    render::{AskamaRenderer, cache::PageCache, context::{PageKind, SiteMeta}},
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("{0}")]
    Startup(String),
}

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

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CheckStore(_) => run_check(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let engine = build_engine(&settings).await;
    warm_pages(&engine);

    let (providers, repository) = build_providers(&settings.providers)?;
    let service = Arc::new(EnrichmentService::new(
        engine.clone(),
        providers,
        repository,
    ));

    let schedule = refresh_schedule(&settings.scheduler.refresh_cron).map_err(AppError::Startup)?;

    // First enrichment cycle starts immediately; the cron stream owns every
    // cycle after that.
    let startup_refresh = {
        let service = service.clone();
        tokio::spawn(async move {
            service.refresh().await;
        })
    };
    let monitor_handle = spawn_refresh_monitor(service, schedule);

    // Backstop consume tick for updates published without an immediate
    // consume.
    let consume_handle = {
        let engine = engine.clone();
        let interval = settings.scheduler.consume_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip the first immediate tick
            loop {
                ticker.tick().await;
                engine.consume();
            }
        })
    };

    let result = serve_http(&settings, engine).await;

    startup_refresh.abort();
    monitor_handle.abort();
    consume_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let data_dir = &settings.store.data_dir;
    if tokio::fs::metadata(data_dir).await.is_err() {
        return Err(AppError::Startup(format!(
            "store directory `{}` does not exist",
            data_dir.display()
        )));
    }

    let (_store, reports) = catalog::load_store(data_dir, &settings.platforms).await;

    let mut total_skipped = 0usize;
    for report in &reports {
        println!(
            "{:<10} {:>4} loaded {:>4} skipped",
            report.category, report.loaded, report.skipped
        );
        total_skipped += report.skipped;
    }

    if total_skipped > 0 {
        warn!(total_skipped, "Store contains malformed records");
    }
    Ok(())
}

async fn build_engine(settings: &config::Settings) -> Arc<Engine> {
    let (store, reports) =
        catalog::load_store(&settings.store.data_dir, &settings.platforms).await;
    for report in &reports {
        info!(
            category = %report.category,
            loaded = report.loaded,
            skipped = report.skipped,
            "Loaded category store"
        );
    }

    let state = Arc::new(CatalogState::new(store));

    let fingerprints = assets::fingerprints();
    let site = SiteMeta {
        name: settings.site.name.clone(),
        cdn: settings.site.cdn.clone(),
        css_version: fingerprints.css,
        js_version: fingerprints.js,
    };

    let pages = Arc::new(PageCache::new(
        Arc::new(AskamaRenderer),
        state.clone(),
        site,
        settings.platforms.clone(),
    ));

    Arc::new(Engine::new(state, Arc::new(UpdateQueue::new()), pages))
}

fn warm_pages(engine: &Engine) {
    for kind in PageKind::ALL {
        if let Err(err) = engine.pages().page(kind) {
            error!(page = %kind, error = %err, "Startup render failed");
        }
    }
}

fn build_providers(
    settings: &config::ProviderSettings,
) -> Result<(Providers, Option<RepoRef>), AppError> {
    let http = build_http_client(&settings.user_agent, settings.timeout)
        .map_err(|err| AppError::Startup(format!("failed to build HTTP client: {err}")))?;

    let code_host = match settings.github_token.clone() {
        Some(token) => {
            Some(Arc::new(GitHubClient::new(http.clone(), token)) as Arc<dyn CodeHost>)
        }
        None => {
            info!("GitHub token not set; star counts and contributors disabled");
            None
        }
    };

    let youtube = match settings.youtube_api_key.clone() {
        Some(key) => Some(Arc::new(YouTubeClient::new(http.clone(), key)) as Arc<dyn VideoSource>),
        None => {
            info!("YouTube API key not set; YouTube metadata disabled");
            None
        }
    };

    let vimeo = match settings.vimeo_access_token.clone() {
        Some(token) => {
            Some(Arc::new(VimeoClient::new(http.clone(), token)) as Arc<dyn VideoSource>)
        }
        None => {
            info!("Vimeo access token not set; Vimeo metadata disabled");
            None
        }
    };

    let social = match settings.twitter_bearer_token.clone() {
        Some(token) => {
            Some(Arc::new(TwitterClient::new(http, token)) as Arc<dyn SocialSource>)
        }
        None => {
            info!("Social bearer token not set; person profiles disabled");
            None
        }
    };

    let repository = match settings.github_repository.as_deref() {
        Some(slug) => {
            let parsed = RepoRef::from_slug(slug);
            if parsed.is_none() {
                warn!(slug, "Configured repository is not an `owner/name` slug; contributors disabled");
            }
            parsed
        }
        None => None,
    };

    Ok((
        Providers {
            code_host,
            youtube,
            vimeo,
            social,
        },
        repository,
    ))
}

async fn serve_http(settings: &config::Settings, engine: Arc<Engine>) -> Result<(), AppError> {
    let router = http::build_router(HttpState {
        pages: engine.pages().clone(),
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(addr = %settings.server.addr, "Serving");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::Startup(format!("server error: {err}")))?;

    Ok(())
}
