use std::sync::Arc;

use anyhow::Context;

use tablebook_api::app::{AppState, SharedIdentity, build_app};
use tablebook_api::config::{AppConfig, BootstrapAdmin};
use tablebook_auth::{PasswordHasher, Role, TokenService};
use tablebook_core::IdentityError;
use tablebook_infra::{IdentityService, InMemoryUserStore, PostgresUserStore, RegisterUser, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tablebook_observability::init(config.env.log_format());

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresUserStore::connect(url, config.db_query_timeout)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.ensure_schema().await.context("failed to prepare users table")?;
            tracing::info!("using postgres credential store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory credential store");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)?);
    let identity: SharedIdentity =
        Arc::new(IdentityService::new(store, PasswordHasher::new(), Arc::clone(&tokens))?);

    if let Some(admin) = &config.bootstrap_admin {
        seed_admin(&identity, admin).await?;
    }

    let app = build_app(AppState { identity, tokens });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, env = ?config.env, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(tablebook_api::shutdown::signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn seed_admin(identity: &SharedIdentity, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let req = RegisterUser {
        name: admin.name.clone(),
        login: admin.login.clone(),
        password: admin.password.clone(),
    };
    match identity.register_with_role(req, Role::ADMIN).await {
        Ok(id) => tracing::info!(user_id = %id, login = %admin.login, "bootstrap admin created"),
        Err(IdentityError::AlreadyExists) => {
            tracing::info!(login = %admin.login, "bootstrap admin already present")
        }
        Err(e) => return Err(e).context("failed to create bootstrap admin"),
    }
    Ok(())
}
