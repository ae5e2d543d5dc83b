//! Rotation protocol properties, exercised through the public service API
//! against the in-memory store.

use rotor::application_impl::*;
use rotor::application_port::*;
use rotor::domain_model::*;
use rotor::domain_port::*;
use rotor::infra_memory::MemoryRefreshRecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const P1: &str = "1f0e2d3c-4b5a-4697-a8b9-cadbecfd0e1f";
const P2: &str = "2a1b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d";
const KEY: &[u8] = b"integration-signing-key-0123456789abcdef";

fn codec_with(access_ttl: chrono::Duration, refresh_ttl: chrono::Duration) -> Arc<dyn TokenCodec> {
    Arc::new(
        JwtHs512Codec::new(JwtConfig {
            issuer: "rotor.it".to_string(),
            audience: "rotor-client".to_string(),
            access_ttl,
            refresh_ttl,
            signing_key: KEY.to_vec(),
        })
        .unwrap(),
    )
}

fn codec() -> Arc<dyn TokenCodec> {
    codec_with(chrono::Duration::minutes(15), chrono::Duration::days(7))
}

fn ctx() -> CallContext {
    CallContext::with_timeout(Duration::from_secs(5))
}

fn setup() -> (RealCredentialService, Arc<MemoryRefreshRecordStore>) {
    let store = Arc::new(MemoryRefreshRecordStore::new());
    let service = RealCredentialService::new(codec(), Arc::new(Sha512TokenHasher), store.clone());
    (service, store)
}

async fn refresh(
    service: &dyn CredentialService,
    pair: &TokenPair,
) -> Result<TokenPair, CredentialError> {
    service
        .refresh(&ctx(), &pair.refresh_token.0, &pair.access_token.0)
        .await
}

async fn stored_matches(store: &MemoryRefreshRecordStore, principal: &str, token: &RefreshToken) -> bool {
    let record = store
        .get(principal.parse().unwrap())
        .await
        .unwrap()
        .expect("record exists");
    Sha512TokenHasher.matches(&record.verifier, token)
}

#[tokio::test]
async fn issue_refresh_replay_scenario() {
    let (service, _store) = setup();

    let first = service.issue(&ctx(), P1).await.unwrap();
    let second = refresh(&service, &first).await.unwrap();

    assert!(matches!(
        refresh(&service, &first).await,
        Err(CredentialError::InvalidToken)
    ));

    let third = refresh(&service, &second).await.unwrap();
    assert_ne!(third.refresh_token, second.refresh_token);
    assert_ne!(third.access_token, second.access_token);
}

#[tokio::test]
async fn exactly_one_refresh_token_matches_after_each_step() {
    let (service, store) = setup();

    let mut history = vec![service.issue(&ctx(), P1).await.unwrap()];
    for _ in 0..4 {
        let next = refresh(&service, history.last().unwrap()).await.unwrap();
        history.push(next);
    }
    history.push(service.issue(&ctx(), P1).await.unwrap());

    let (current, stale) = history.split_last().unwrap();
    assert!(stored_matches(&store, P1, &current.refresh_token).await);
    for old in stale {
        assert!(!stored_matches(&store, P1, &old.refresh_token).await);
        assert!(matches!(
            refresh(&service, old).await,
            Err(CredentialError::InvalidToken)
        ));
    }
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn replayed_pair_succeeds_at_most_once() {
    let (service, _store) = setup();
    let pair = service.issue(&ctx(), P1).await.unwrap();

    let outcomes = [refresh(&service, &pair).await, refresh(&service, &pair).await];
    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], Err(CredentialError::InvalidToken)));
}

#[tokio::test]
async fn access_token_from_another_issuance_is_rejected() {
    let (service, store) = setup();
    let a = service.issue(&ctx(), P1).await.unwrap();
    let b = service.issue(&ctx(), P2).await.unwrap();

    assert!(matches!(
        service
            .refresh(&ctx(), &a.refresh_token.0, &b.access_token.0)
            .await,
        Err(CredentialError::InvalidToken)
    ));
    // The rejected attempt left the record untouched.
    assert!(stored_matches(&store, P1, &a.refresh_token).await);

    let a2 = refresh(&service, &a).await.unwrap();
    assert!(matches!(
        service
            .refresh(&ctx(), &a2.refresh_token.0, &a.access_token.0)
            .await,
        Err(CredentialError::InvalidToken)
    ));
    refresh(&service, &a2).await.unwrap();
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_regardless_of_store() {
    let store = Arc::new(MemoryRefreshRecordStore::new());
    let service = RealCredentialService::new(
        codec_with(chrono::Duration::minutes(-20), chrono::Duration::minutes(-10)),
        Arc::new(Sha512TokenHasher),
        store.clone(),
    );

    let pair = service.issue(&ctx(), P1).await.unwrap();
    assert!(stored_matches(&store, P1, &pair.refresh_token).await);
    assert!(matches!(
        refresh(&service, &pair).await,
        Err(CredentialError::InvalidToken)
    ));
}

#[tokio::test]
async fn expired_access_token_still_rotates() {
    let store = Arc::new(MemoryRefreshRecordStore::new());
    let service = RealCredentialService::new(
        codec_with(chrono::Duration::minutes(-1), chrono::Duration::days(1)),
        Arc::new(Sha512TokenHasher),
        store,
    );

    let pair = service.issue(&ctx(), P1).await.unwrap();
    assert!(service.authenticate(&pair.access_token.0).await.is_err());
    refresh(&service, &pair).await.unwrap();
}

#[tokio::test]
async fn malformed_identity_writes_nothing() {
    let (service, store) = setup();
    assert!(matches!(
        service.issue(&ctx(), "not-a-guid").await,
        Err(CredentialError::InvalidIdentity)
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn tampered_refresh_token_is_rejected() {
    let (service, _store) = setup();
    let pair = service.issue(&ctx(), P1).await.unwrap();

    let mut tampered = pair.refresh_token.0.clone();
    tampered.push('x');
    assert!(matches!(
        service.refresh(&ctx(), &tampered, &pair.access_token.0).await,
        Err(CredentialError::InvalidToken)
    ));
    refresh(&service, &pair).await.unwrap();
}

/// Holds every compare-and-swap until two callers have reached it, so both
/// racers have already passed validation against the same stored verifier.
struct GatedStore {
    inner: MemoryRefreshRecordStore,
    gate: Barrier,
}

#[async_trait::async_trait]
impl RefreshRecordStore for GatedStore {
    async fn get(
        &self,
        principal_id: PrincipalId,
    ) -> Result<Option<RefreshRecord>, RecordStoreError> {
        self.inner.get(principal_id).await
    }

    async fn insert(&self, record: &RefreshRecord) -> Result<(), RecordStoreError> {
        self.inner.insert(record).await
    }

    async fn compare_and_swap(
        &self,
        principal_id: PrincipalId,
        expected: &Verifier,
        new: &Verifier,
    ) -> Result<CasOutcome, RecordStoreError> {
        self.gate.wait().await;
        self.inner.compare_and_swap(principal_id, expected, new).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_refresh_has_exactly_one_winner() {
    let store = Arc::new(GatedStore {
        inner: MemoryRefreshRecordStore::new(),
        gate: Barrier::new(2),
    });
    let service: Arc<dyn CredentialService> = Arc::new(RealCredentialService::new(
        codec(),
        Arc::new(Sha512TokenHasher),
        store.clone(),
    ));

    let pair = service.issue(&ctx(), P1).await.unwrap();

    let racers: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let pair = pair.clone();
            tokio::spawn(async move { refresh(service.as_ref(), &pair).await })
        })
        .collect();

    let mut winners = Vec::new();
    let mut losers = 0;
    for racer in racers {
        match racer.await.unwrap() {
            Ok(next) => winners.push(next),
            Err(CredentialError::InvalidToken) => losers += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, 1);
    assert!(stored_matches(&store.inner, P1, &winners[0].refresh_token).await);
    assert!(!stored_matches(&store.inner, P1, &pair.refresh_token).await);
}

#[tokio::test]
async fn principals_rotate_independently() {
    let (service, store) = setup();
    let service: Arc<dyn CredentialService> = Arc::new(service);

    let handles: Vec<_> = [P1, P2]
        .into_iter()
        .map(|principal| {
            let service = service.clone();
            tokio::spawn(async move {
                let mut pair = service.issue(&ctx(), principal).await?;
                for _ in 0..3 {
                    pair = refresh(service.as_ref(), &pair).await?;
                }
                Ok::<_, CredentialError>(pair)
            })
        })
        .collect();

    let mut finals = Vec::new();
    for handle in handles {
        finals.push(handle.await.unwrap().unwrap());
    }
    assert!(stored_matches(&store, P1, &finals[0].refresh_token).await);
    assert!(stored_matches(&store, P2, &finals[1].refresh_token).await);
    assert_eq!(store.len(), 2);
}
