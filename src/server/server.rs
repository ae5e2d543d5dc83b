use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub credential_service: Arc<dyn CredentialService>,
    store_timeout: Duration,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut pool = None;

        let record_store: Arc<dyn RefreshRecordStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryRefreshRecordStore::new()),
            "redis" => {
                let dsn = settings.store.redis_dsn.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("store.redis_dsn is required for redis backend")
                })?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisRefreshRecordStore::new(
                    redis_manager,
                    settings.store.key_prefix.clone(),
                ))
            }
            "mysql" => {
                let dsn = settings.store.mysql_dsn.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("store.mysql_dsn is required for mysql backend")
                })?;
                let mysql_pool = Pool::<MySql>::connect(dsn).await?;
                let store = MySqlRefreshRecordStore::new(mysql_pool.clone());
                store.ensure_schema().await?;
                pool = Some(mysql_pool);
                Arc::new(store)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: chrono::Duration::seconds(settings.auth.access_ttl_secs),
            refresh_ttl: chrono::Duration::seconds(settings.auth.refresh_ttl_secs),
            signing_key: settings.auth.signing_key.clone().into_bytes(),
        })?);
        let token_hasher: Arc<dyn TokenHasher> = Arc::new(Sha512TokenHasher);

        let credential_service: Arc<dyn CredentialService> = Arc::new(
            RealCredentialService::new(token_codec, token_hasher, record_store),
        );

        info!(
            store_backend = %settings.store.backend,
            "server started"
        );

        Ok(Self {
            credential_service,
            store_timeout: Duration::from_millis(settings.store.timeout_ms),
            cancel: CancellationToken::new(),
            pool,
        })
    }

    /// Builds a server around an already-wired service.
    pub fn with_service(
        credential_service: Arc<dyn CredentialService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            credential_service,
            store_timeout,
            cancel: CancellationToken::new(),
            pool: None,
        }
    }

    /// Per-request bound for store calls; cancelled when the server shuts down.
    pub fn call_context(&self) -> CallContext {
        CallContext::new(self.store_timeout, self.cancel.child_token())
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
