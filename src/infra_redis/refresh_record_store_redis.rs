use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::debug;

const REFRESH_CAS: &str = include_str!("refresh_cas.lua");

/// One string key per principal, `<prefix>:<principal id>`, holding the hex
/// verifier. Rotation runs as a Lua script so the compare and the write are a
/// single server-side step.
pub struct RedisRefreshRecordStore {
    conn: ConnectionManager,
    prefix: String,
    cas: Script,
}

impl RedisRefreshRecordStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshRecordStore {
            conn,
            prefix: prefix.into(),
            cas: Script::new(REFRESH_CAS),
        }
    }

    fn key(&self, principal_id: PrincipalId) -> String {
        format!("{}:{}", self.prefix, principal_id)
    }
}

#[async_trait::async_trait]
impl RefreshRecordStore for RedisRefreshRecordStore {
    async fn get(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Option<RefreshRecord>, RecordStoreError> {
        let key = self.key(principal_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| RecordStoreError::Unavailable(e.to_string()))?;
        val.map(|hex| {
            let verifier = Verifier::from_hex(&hex)
                .map_err(|e| RecordStoreError::Corrupt(format!("{}: {}", key, e)))?;
            Ok(RefreshRecord {
                principal_id,
                verifier,
            })
        })
        .transpose()
    }

    async fn insert(&self, record: &RefreshRecord) -> Result<(), RecordStoreError> {
        let key = self.key(record.principal_id);
        let mut conn = self.conn.clone();
        let created: bool = conn
            .set_nx(&key, record.verifier.to_hex())
            .await
            .map_err(|e| RecordStoreError::Unavailable(e.to_string()))?;
        if !created {
            return Err(RecordStoreError::AlreadyExists(record.principal_id));
        }
        debug!(principal_id = %record.principal_id, "refresh record created");
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        principal_id: PrincipalId,
        expected: &Verifier,
        new: &Verifier,
    ) -> Result<CasOutcome, RecordStoreError> {
        let key = self.key(principal_id);
        let mut conn = self.conn.clone();
        let status: i64 = self
            .cas
            .key(&key)
            .arg(expected.to_hex())
            .arg(new.to_hex())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RecordStoreError::Unavailable(e.to_string()))?;

        match status {
            1 => Ok(CasOutcome::Swapped),
            0 | -1 => Ok(CasOutcome::PreconditionFailed),
            other => Err(RecordStoreError::Corrupt(format!(
                "unknown script status {}",
                other
            ))),
        }
    }
}
