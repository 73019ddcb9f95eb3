use actix_web::{App, HttpServer, middleware::Logger, web};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debitdesk::{
  adapters::http::{
    PrelevementRouteDependencies, RequestIdMiddleware, TemplateEngine,
    configure_prelevement_routes,
    handlers::system::{health_check, metrics_handler},
  },
  application::direct_debit::{
    ChangeDebitStatusUseCase, GenerateSepaFileUseCase, GetCreditorProfileUseCase,
    ListDirectDebitsUseCase,
  },
  domain::direct_debit::{
    ClientRepository, Clock, DirectDebitService, DirectDebitServiceDependencies,
    InvoiceRepository,
  },
  infrastructure::{
    clock::SystemClock,
    config::{Config, DatabaseConfig, StorageBackend},
    metrics,
    persistence::{
      InMemoryClientRepository, InMemoryInvoiceRepository,
      memory::seed_demo_data,
      postgres::{PostgresClientRepository, PostgresInvoiceRepository},
    },
    sepa::Pain008Renderer,
  },
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // Initialize tracing subscriber for logging
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "debitdesk=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting Debitdesk");

  // Load configuration
  let config = Config::load().map_err(|e| {
    tracing::error!("Failed to load configuration: {}", e);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
  })?;

  // Creditor and export settings are validated before anything else starts
  let creditor = config.creditor_profile().map_err(invalid_config)?;
  let settings = config.direct_debit_settings().map_err(invalid_config)?;
  tracing::info!(
    creditor = %creditor.name,
    ics = %creditor.identifier,
    lead_days = settings.calendar.lead_days(),
    "Configuration loaded successfully"
  );

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);

  let (invoice_repo, client_repo): (Arc<dyn InvoiceRepository>, Arc<dyn ClientRepository>) =
    match config.storage.backend {
      StorageBackend::Postgres => {
        let db_pool = connect_database(&config.database).await?;

        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations")
          .run(&db_pool)
          .await
          .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            std::io::Error::other(format!("Migration error: {}", e))
          })?;
        tracing::info!("Database migrations completed");

        (
          Arc::new(PostgresInvoiceRepository::new(db_pool.clone())),
          Arc::new(PostgresClientRepository::new(db_pool)),
        )
      }
      StorageBackend::Memory => {
        tracing::warn!("Using in-memory storage with demo data; nothing is persisted");
        let invoices = InMemoryInvoiceRepository::new();
        let clients = InMemoryClientRepository::new();
        seed_demo_data(&invoices, &clients, clock.today())
          .await
          .map_err(|e| std::io::Error::other(e.to_string()))?;
        (Arc::new(invoices), Arc::new(clients))
      }
    };

  let direct_debit_service = Arc::new(DirectDebitService::new(DirectDebitServiceDependencies {
    invoice_repo,
    client_repo,
    renderer: Arc::new(Pain008Renderer::new()),
    clock,
    creditor,
    settings,
  }));

  let route_deps = PrelevementRouteDependencies {
    list_use_case: Arc::new(ListDirectDebitsUseCase::new(direct_debit_service.clone())),
    generate_use_case: Arc::new(GenerateSepaFileUseCase::new(direct_debit_service.clone())),
    change_status_use_case: Arc::new(ChangeDebitStatusUseCase::new(
      direct_debit_service.clone(),
    )),
    creditor_use_case: Arc::new(GetCreditorProfileUseCase::new(direct_debit_service)),
  };

  let templates = TemplateEngine::new().map_err(|e| {
    tracing::error!("Failed to load templates: {}", e);
    std::io::Error::other(format!("Template error: {}", e))
  })?;

  metrics::register();

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    App::new()
      .wrap(RequestIdMiddleware::new())
      .wrap(Logger::default())
      .service(web::scope("/prelevements").configure(|cfg| {
        configure_prelevement_routes(cfg, route_deps.clone(), templates.clone())
      }))
      .route("/health", web::get().to(health_check))
      .route("/metrics", web::get().to(metrics_handler))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await
}

fn invalid_config(e: debitdesk::domain::direct_debit::DebitError) -> std::io::Error {
  tracing::error!("Invalid configuration: {}", e);
  std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

/// Set up the connection pool, failing fast when PostgreSQL is unreachable
async fn connect_database(database: &DatabaseConfig) -> std::io::Result<PgPool> {
  tracing::info!("Connecting to database");

  let db_pool = tokio::time::timeout(
    Duration::from_secs(database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(database.max_connections)
      .acquire_timeout(Duration::from_secs(database.acquire_timeout_seconds))
      .connect(&database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      database.connect_timeout_seconds
    );
    std::io::Error::new(
      std::io::ErrorKind::TimedOut,
      format!(
        "Database connection timed out after {} seconds",
        database.connect_timeout_seconds
      ),
    )
  })?
  .map_err(|e| {
    tracing::error!("Failed to connect to database: {}", e);
    match e {
      sqlx::Error::Io(_) => std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Could not connect to database. Is PostgreSQL running?",
      ),
      _ => std::io::Error::other(format!("Database error: {}", e)),
    }
  })?;

  tracing::info!("Database connection pool created");
  Ok(db_pool)
}
