use std::error::Error;
use std::process;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use campus_subscriptions::adapters::auth::{JwtConfig, JwtSessionValidator};
use campus_subscriptions::adapters::http::{
    app_router, AppState, BillingAppState, IdentityAppState, NotificationsAppState, RouterSettings,
};
use campus_subscriptions::adapters::memory::{
    InMemoryAuditLog, InMemoryStudentDirectory, InMemoryTransactionLedger,
};
use campus_subscriptions::adapters::nkwa::{NkwaConfig, NkwaEnvironment, NkwaPaymentAdapter};
use campus_subscriptions::adapters::postgres::{
    PostgresAuditLog, PostgresStudentDirectory, PostgresTransactionLedger,
};
use campus_subscriptions::adapters::push::{DisabledPushNotifier, FcmConfig, FcmNotifier};
use campus_subscriptions::application::handlers::billing::{
    HandlePaymentWebhookHandler, InitiatePaymentHandler, SubscriptionPrice,
};
use campus_subscriptions::application::handlers::identity::EnforceMatriculeUniquenessHandler;
use campus_subscriptions::config::{
    AppConfig, DatabaseConfig, NotificationConfig, PaymentConfig, ProviderEnvironment,
    ServerConfig,
};
use campus_subscriptions::domain::billing::WebhookVerifier;
use campus_subscriptions::ports::{AuditLog, PushNotifier, StudentDirectory, TransactionLedger};

type StartupError = Box<dyn Error + Send + Sync>;

struct Stores {
    ledger: Arc<dyn TransactionLedger>,
    directory: Arc<dyn StudentDirectory>,
    audit_log: Arc<dyn AuditLog>,
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&config.server) {
        eprintln!("Failed to initialise logging: {}", err);
        process::exit(1);
    }

    if let Err(err) = config.validate() {
        tracing::error!(error = %err, "Invalid configuration");
        process::exit(1);
    }

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "Server stopped");
        process::exit(1);
    }
}

fn init_tracing(server: &ServerConfig) -> Result<(), StartupError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&server.log_level)?,
    };

    let json_layer = server.log_json.then(|| fmt::layer().json());
    let text_layer = (!server.log_json).then(fmt::layer);

    Registry::default()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;
    Ok(())
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let stores = match &config.database {
        Some(database) => connect_database(database).await?,
        None => {
            tracing::warn!("No database configured, using in-memory stores");
            Stores {
                ledger: Arc::new(InMemoryTransactionLedger::new()),
                directory: Arc::new(InMemoryStudentDirectory::new()),
                audit_log: Arc::new(InMemoryAuditLog::new()),
            }
        }
    };

    let notifier = build_notifier(&config.notification)?;
    let state = build_state(&config, stores, notifier)?;

    let settings = RouterSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let router = app_router(state, &settings);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Listening"
    );

    axum::serve(listener, router).await?;
    Ok(())
}

async fn connect_database(database: &DatabaseConfig) -> Result<Stores, StartupError> {
    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(&database.url)
        .await?;
    tracing::info!("Connected to database");

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    Ok(Stores {
        ledger: Arc::new(PostgresTransactionLedger::new(pool.clone())),
        directory: Arc::new(PostgresStudentDirectory::new(pool.clone())),
        audit_log: Arc::new(PostgresAuditLog::new(pool)),
    })
}

fn build_notifier(
    notification: &NotificationConfig,
) -> Result<Arc<dyn PushNotifier>, StartupError> {
    let Some((project_id, access_token)) = notification.fcm_credentials() else {
        tracing::warn!("FCM not configured, push notifications disabled");
        let disabled: Arc<dyn PushNotifier> = Arc::new(DisabledPushNotifier);
        return Ok(disabled);
    };

    let mut fcm = FcmConfig::new(project_id, access_token).with_timeout(notification.timeout());
    if let Some(url) = &notification.fcm_base_url {
        fcm = fcm.with_base_url(url.clone());
    }
    let notifier: Arc<dyn PushNotifier> = Arc::new(FcmNotifier::new(fcm)?);
    Ok(notifier)
}

fn build_payment_provider(payment: &PaymentConfig) -> Result<NkwaPaymentAdapter, StartupError> {
    let environment = match payment.environment {
        ProviderEnvironment::Sandbox => NkwaEnvironment::Sandbox,
        ProviderEnvironment::Production => NkwaEnvironment::Production,
    };

    let mut nkwa = NkwaConfig::new(payment.nkwa_api_key.clone(), environment)
        .with_timeout(payment.timeout());
    if let Some(url) = &payment.base_url {
        nkwa = nkwa.with_base_url(url.clone());
    }
    Ok(NkwaPaymentAdapter::new(nkwa)?)
}

fn build_state(
    config: &AppConfig,
    stores: Stores,
    notifier: Arc<dyn PushNotifier>,
) -> Result<AppState, StartupError> {
    let payment = &config.payment;
    let provider = build_payment_provider(payment)?;
    let verifier = WebhookVerifier::new(
        payment.webhook_callback_url.clone(),
        payment.webhook_public_key_pem()?,
    );

    let initiate = InitiatePaymentHandler::new(
        stores.ledger.clone(),
        Arc::new(provider),
        SubscriptionPrice {
            amount: payment.amount,
            currency: payment.currency.clone(),
        },
    )
    .with_provider_timeout(payment.timeout());

    let webhook = HandlePaymentWebhookHandler::new(
        verifier,
        stores.ledger.clone(),
        stores.directory.clone(),
        notifier.clone(),
    )
    .with_notification_timeout(config.notification.timeout());

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.clone());
    if let Some(issuer) = &config.auth.jwt_issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }

    Ok(AppState {
        billing: BillingAppState::new(
            stores.ledger,
            stores.directory.clone(),
            initiate,
            webhook,
        ),
        identity: IdentityAppState::new(EnforceMatriculeUniquenessHandler::new(
            stores.directory.clone(),
        )),
        notifications: NotificationsAppState {
            directory: stores.directory,
            notifier,
            audit_log: stores.audit_log,
        },
        session_validator: Arc::new(JwtSessionValidator::new(jwt)),
    })
}
