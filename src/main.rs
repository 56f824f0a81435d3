mod api;
mod app_state;
mod db;
mod env_config;
mod layers;
mod logger;
mod services;

#[cfg(test)]
mod test_support;

use app_state::models::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use db::clickhouse::clickhouse_service::ClickhouseService;
use env_config::{
    error::ConfigError,
    models::{app_config::AppConfig, app_env::AppEnv, app_setting::AppSettings},
};
use layers::{create_cors, create_trace};
use services::ingestion::{
    pipeline::SymbolPipeline, pool::IngestionPool, resolver::StartResolver, writer::PointWriter,
};
use services::quotes::fetcher::QuoteFetcher;
use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Инициализация приложения
    let settings: Arc<AppSettings> = match initialize_application() {
        Ok(settings) => Arc::new(settings),
        Err(err) => {
            // No config means no log settings, fall back to defaults to report
            let _ = logger::init_logger("info", "json", false);
            error!("Configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    // Подключение к базе данных
    let clickhouse_service = match ClickhouseService::new(&settings).await {
        Ok(service) => service,
        Err(err) => {
            error!("Cannot continue without ClickHouse connection: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let server_address: SocketAddr = match format!(
        "{}:{}",
        settings.app_env.server_address, settings.app_env.server_port,
    )
    .parse()
    {
        Ok(address) => address,
        Err(err) => {
            error!("Invalid server address configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    info!("Server will listen on: {}", server_address);

    // Сборка пайплайна загрузки котировок
    let ingestion_pool = match build_ingestion_pool(&settings, &clickhouse_service) {
        Ok(pool) => Arc::new(pool),
        Err(err) => {
            error!("Failed to build quote HTTP client: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // Создание глобального состояния приложения
    let app_state: Arc<AppState> = Arc::new(AppState::new(
        settings.clone(),
        clickhouse_service.repository_price.clone(),
        ingestion_pool,
    ));

    let app_router = create_application_router(app_state);

    match start_http_server(app_router, server_address).await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Server error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Загружает окружение, конфигурацию и настраивает логирование
fn initialize_application() -> Result<AppSettings, ConfigError> {
    let environment = AppEnv::new()?;
    let config = AppConfig::new(&environment.config_dir, &environment.env)?;

    if let Err(err) = logger::init_logger(
        &config.log.level,
        &config.log.format,
        environment.is_local(),
    ) {
        eprintln!("Failed to initialize logger: {err}");
    }

    info!("Starting finance-data application...");
    info!("Current environment: {}", environment.env);

    if environment.is_local() {
        info!("Running in local development mode");
        debug!("Configuration details: {:#?}", config);
    } else {
        info!("Running in production mode");
    }

    Ok(AppSettings {
        app_config: config,
        app_env: environment,
    })
}

/// Собирает пул воркеров: resolver -> fetcher -> writer
fn build_ingestion_pool(
    settings: &AppSettings,
    clickhouse_service: &ClickhouseService,
) -> Result<IngestionPool, reqwest::Error> {
    let quotes = &settings.app_config.quotes;
    let ingestion = &settings.app_config.ingestion;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(quotes.timeout_seconds))
        .build()?;

    let repository = clickhouse_service.repository_price.clone();
    let pipeline = SymbolPipeline::new(
        StartResolver::new(repository.clone(), ingestion.lookback_days),
        QuoteFetcher::new(
            Arc::new(http_client),
            quotes.base_url.clone(),
            quotes.user_agent.clone(),
        ),
        PointWriter::new(repository),
    );

    let pool = IngestionPool::new(Arc::new(pipeline), ingestion.workers);
    info!("Ingestion pool configured with {} workers", pool.workers());
    Ok(pool)
}

fn data_routes() -> Router {
    Router::new()
        .route("/fetch", post(api::fetch_data))
        .route("/query", post(api::query_data))
}

/// Создает API роутер со всеми эндпоинтами и middleware
fn create_application_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health_api))
        .route("/db-health", get(api::health_db))
        .merge(data_routes())
        .nest("/v1/data", data_routes())
        .layer(axum::Extension(app_state))
        .layer(create_cors())
        .layer(create_trace())
}

/// Запускает HTTP сервер на указанном адресе
async fn start_http_server(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await.map_err(|err| {
        error!("Failed to bind to address {}: {}", addr, err);
        err
    })?;

    info!("Server started successfully, now accepting connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
