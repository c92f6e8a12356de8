mod config;

use common::auth::{AuthConfig, JwksTokenVerifier};
use common::aws::load_sdk_config;
use common::cognito::{cognito_client, CognitoIdentityProvider};
use common::domain::{
    streams, AuthInfoRepository, ConnectionRepository, EnvelopePublisher, IdentityProvider,
    SiloConfigRepository, TenantConnectionMap, TenantRepository,
};
use common::dynamodb::{
    dynamodb_client, DynamoAuthInfoRepository, DynamoConnectionRepository, DynamoDbConfig,
    DynamoSiloConfigRepository, DynamoTenantRepository,
};
use common::http::{build_app, run_http_server, AuthState, CorsConfig, HttpLoggingConfig, HttpServerConfig};
use common::nats::{listen, EnvelopeHandler, ListenBinding, ListenOptions, NatsClient, NatsEnvelopePublisher, NatsTracingConfig};
use common::postgres::{run_migrations, PostgresClient, PostgresConfig};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use crate::config::ServiceConfig;
use project::{PostgresMembershipRepository, PostgresProjectRepository, Projects, PROJECT_MIGRATIONS};
use registration::Registration;
use saas_runner::{Runner, ShutdownSignal};
use std::sync::Arc;
use std::time::Duration;
use tenant::{Tenant, TenantDeps};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        production = config.production,
        "Starting saas-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let shutdown = ShutdownSignal::new();

    let deps = match initialize_shared_dependencies(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!("Failed to initialize shared dependencies: {:#}", e);
            std::process::exit(1);
        }
    };

    let auth = match build_auth_state(&config) {
        Ok(auth) => auth,
        Err(e) => {
            error!("Failed to initialize authentication: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize application modules
    let registration = Registration::new(
        Arc::clone(&deps.identity_provider),
        Arc::clone(&deps.auth_info_repository),
        Arc::clone(&deps.publisher),
        auth.clone(),
        shutdown.clone(),
        config.production,
    );

    let tenant = Tenant::new(
        TenantDeps {
            identity_provider: Arc::clone(&deps.identity_provider),
            auth_info_repository: Arc::clone(&deps.auth_info_repository),
            tenant_repository: Arc::clone(&deps.tenant_repository),
            connection_repository: Arc::clone(&deps.connection_repository),
            silo_config_repository: Arc::clone(&deps.silo_config_repository),
            publisher: Arc::clone(&deps.publisher),
        },
        config.cognito_region.clone(),
        config.cognito_shared_pool_id.clone(),
    );

    let projects = Projects::new(
        Arc::new(PostgresProjectRepository::new(deps.postgres_client.clone())),
        Arc::new(PostgresMembershipRepository::new(deps.postgres_client.clone())),
        auth,
    );

    let http_config = HttpServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
        request_timeout: Duration::from_secs(config.http_request_timeout_secs),
        logging_config: HttpLoggingConfig::new(config.ignored_paths()),
        cors_config: CorsConfig::from_comma_separated(&config.http_cors_allowed_origins),
    };
    let app = build_app(
        &http_config,
        vec![registration.router(), tenant.router(), projects.router()],
        shutdown.clone(),
    );

    // Build runner with all processes
    let mut runner = Runner::new().with_shutdown_signal(shutdown.clone());

    runner = runner.with_named_process("http_server", move |ctx| {
        run_http_server(http_config, app, ctx)
    });

    let listen_options = ListenOptions {
        ack_wait: Duration::from_secs(config.nats_ack_wait_secs),
        max_wait: Duration::from_secs(config.nats_batch_wait_secs),
        ..Default::default()
    };
    let listeners: Vec<(ListenBinding, Arc<dyn EnvelopeHandler>)> = tenant
        .listeners()
        .into_iter()
        .chain(projects.listeners())
        .collect();

    let consumer_client = deps.nats_client.create_consumer_client();
    for (binding, handler) in listeners {
        let name = format!("listener_{}", binding.durable_name());
        let consumer = match listen(
            Arc::clone(&consumer_client),
            binding,
            handler,
            shutdown.clone(),
            listen_options.clone(),
        )
        .await
        {
            Ok(consumer) => consumer,
            Err(e) => {
                error!(listener = %name, "Failed to start listener: {:#}", e);
                std::process::exit(1);
            }
        };
        runner = runner.with_named_process(name, move |ctx| consumer.run(ctx));
    }

    // Add cleanup handlers
    let nats_for_close = deps.nats_client;
    let postgres_for_close = deps.postgres_client;
    runner = runner
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            postgres_for_close.close();
            match Arc::try_unwrap(nats_for_close) {
                Ok(client) => {
                    if let Err(e) = client.close().await {
                        warn!("Failed to close NATS connection: {:#}", e);
                    }
                }
                Err(_) => warn!("NATS client still shared, skipping flush"),
            }

            // Shutdown telemetry and flush pending traces
            shutdown_telemetry(telemetry_providers);

            info!("Cleanup complete");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(config.shutdown_timeout_secs));

    // Run the service
    runner.run().await;
}

struct SharedDependencies {
    nats_client: Arc<NatsClient>,
    publisher: Arc<dyn EnvelopePublisher>,
    identity_provider: Arc<dyn IdentityProvider>,
    auth_info_repository: Arc<dyn AuthInfoRepository>,
    tenant_repository: Arc<dyn TenantRepository>,
    connection_repository: Arc<dyn ConnectionRepository>,
    silo_config_repository: Arc<dyn SiloConfigRepository>,
    postgres_client: PostgresClient,
}

async fn initialize_shared_dependencies(config: &ServiceConfig) -> anyhow::Result<SharedDependencies> {
    // NATS initialization
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );
    for stream in [streams::TENANTS, streams::PROJECTS, streams::MEMBERSHIPS] {
        if let Err(e) = nats_client.create_stream(stream).await {
            error!(stream = %stream, "Failed to create stream: {:#}", e);
        }
    }
    let publisher: Arc<dyn EnvelopePublisher> = Arc::new(NatsEnvelopePublisher::new(
        nats_client.create_publisher_client(),
        NatsTracingConfig::new(config.otel_service_name.clone()),
    ));

    // AWS initialization
    info!("Initializing AWS clients...");
    let sdk_config = load_sdk_config(&config.cognito_region).await;
    let dynamodb_config = DynamoDbConfig {
        endpoint_url: config.dynamodb_endpoint.clone(),
        auth_table: config.dynamodb_auth_table.clone(),
        config_table: config.dynamodb_config_table.clone(),
        tenant_table: config.dynamodb_tenant_table.clone(),
        connection_table: config.dynamodb_connection_table.clone(),
    };
    let dynamodb = dynamodb_client(&sdk_config, &dynamodb_config);
    let cognito = cognito_client(&sdk_config, config.cognito_endpoint.as_deref());

    // PostgreSQL initialization
    info!("Initializing PostgreSQL...");
    let postgres_client = PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
    })?;
    let applied = run_migrations(&postgres_client, PROJECT_MIGRATIONS).await?;
    info!(applied, "PostgreSQL migrations complete");

    Ok(SharedDependencies {
        nats_client,
        publisher,
        identity_provider: Arc::new(CognitoIdentityProvider::new(cognito)),
        auth_info_repository: Arc::new(DynamoAuthInfoRepository::new(
            dynamodb.clone(),
            dynamodb_config.auth_table.clone(),
        )),
        tenant_repository: Arc::new(DynamoTenantRepository::new(
            dynamodb.clone(),
            dynamodb_config.tenant_table.clone(),
        )),
        connection_repository: Arc::new(DynamoConnectionRepository::new(
            dynamodb.clone(),
            dynamodb_config.connection_table.clone(),
        )),
        silo_config_repository: Arc::new(DynamoSiloConfigRepository::new(
            dynamodb,
            dynamodb_config.config_table,
        )),
        postgres_client,
    })
}

fn build_auth_state(config: &ServiceConfig) -> anyhow::Result<AuthState> {
    let mut auth_config = AuthConfig::new(&config.cognito_region, &config.cognito_user_pool_id);
    auth_config.jwks_url = config.cognito_jwks_url.clone();
    auth_config.jwks_cache_ttl = Duration::from_secs(config.cognito_jwks_cache_ttl_secs);
    auth_config.routing_header = config.routing_header.clone();

    let connections = TenantConnectionMap::from_json(&config.tenant_connection_map)?;
    info!(routes = connections.len(), "tenant connection map loaded");

    Ok(AuthState::new(
        Arc::new(JwksTokenVerifier::new(&auth_config)),
        Arc::new(connections),
        auth_config.routing_header,
    ))
}
