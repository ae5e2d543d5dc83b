use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use tracing::debug;

/// In-process store. Records are lost on restart; meant for development and
/// tests. DashMap shard locks make each operation atomic per principal.
#[derive(Debug, Default)]
pub struct MemoryRefreshRecordStore {
    records: DashMap<PrincipalId, Verifier>,
}

impl MemoryRefreshRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshRecordStore for MemoryRefreshRecordStore {
    async fn get(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Option<RefreshRecord>, RecordStoreError> {
        Ok(self.records.get(&principal_id).map(|verifier| RefreshRecord {
            principal_id,
            verifier: verifier.clone(),
        }))
    }

    async fn insert(&self, record: &RefreshRecord) -> Result<(), RecordStoreError> {
        let mut inserted = false;
        self.records.entry(record.principal_id).or_insert_with(|| {
            inserted = true;
            record.verifier.clone()
        });
        if !inserted {
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
        match self.records.get_mut(&principal_id) {
            Some(mut current) if *current == *expected => {
                *current = new.clone();
                Ok(CasOutcome::Swapped)
            }
            _ => Ok(CasOutcome::PreconditionFailed),
        }
    }
}
