use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use da_interface::{
    Blob, CancellationToken, Commitment, DaApi, DaError, GetIdsResult, Namespace, Proof, ID,
};
use mock_da::{MockDaMethod, MockDaService};
use namespace_migration::{MigrationEntry, MigrationRegistry, NamespaceMigrationDa, NamespaceRole};

fn ns(name: &str) -> Namespace {
    Namespace::from_string(name)
}

/// Migrations `{100: A, 500: B}`, current `C`, data namespaces suffixed with `-data`.
fn a_b_c(da: MockDaService) -> NamespaceMigrationDa<MockDaService> {
    NamespaceMigrationDa::from_names(
        da,
        "C",
        "C-data",
        vec![
            MigrationEntry::new(100, "A").with_data_namespace("A-data"),
            MigrationEntry::new(500, "B").with_data_namespace("B-data"),
        ],
    )
    .unwrap()
}

async fn submit_to(da: &MockDaService, namespace: &str, blob: &[u8]) -> Vec<ID> {
    da.submit(
        &CancellationToken::new(),
        &[blob.to_vec()],
        0.0,
        &ns(namespace),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_get_ids_uses_namespace_of_height() {
    let mock = MockDaService::new();
    let registry = MigrationRegistry::new(
        "C",
        "C-data",
        vec![
            MigrationEntry::new(1, "A").with_data_namespace("A-data"),
            MigrationEntry::new(2, "B").with_data_namespace("B-data"),
        ],
    )
    .unwrap();
    let da = NamespaceMigrationDa::new(mock.clone(), registry);
    let ctx = CancellationToken::new();

    let at_1 = submit_to(&mock, "A", b"one").await;
    let at_2 = submit_to(&mock, "B", b"two").await;
    let at_3 = submit_to(&mock, "C", b"three").await;
    mock.clear_calls();

    assert_eq!(da.get_ids(&ctx, 1, &ns("C")).await.unwrap().ids, at_1);
    assert_eq!(da.get_ids(&ctx, 2, &ns("C")).await.unwrap().ids, at_2);
    assert_eq!(da.get_ids(&ctx, 3, &ns("C")).await.unwrap().ids, at_3);
    assert_eq!(
        mock.namespaces_called(MockDaMethod::GetIds),
        vec![ns("A"), ns("B"), ns("C")]
    );

    mock.clear_calls();
    da.get_ids(&ctx, 1, &ns("C-data")).await.unwrap();
    da.get_ids_for_role(&ctx, 2, NamespaceRole::Data)
        .await
        .unwrap();
    assert_eq!(
        mock.namespaces_called(MockDaMethod::GetIds),
        vec![ns("A-data"), ns("B-data")]
    );
}

#[tokio::test]
async fn test_get_ids_does_not_fall_back() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    submit_to(&mock, "A", b"one").await;
    mock.fail_namespace(ns("A"), DaError::Rpc("unavailable".to_string()));

    assert_eq!(
        da.get_ids(&ctx, 1, &ns("C")).await.unwrap_err(),
        DaError::Rpc("unavailable".to_string())
    );
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn test_without_migrations_single_attempt() {
    let mock = MockDaService::new();
    let da = NamespaceMigrationDa::from_names(mock.clone(), "C", "C-data", vec![]).unwrap();
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "A", b"blob").await;
    mock.clear_calls();

    mock.fail_namespace(ns("C"), DaError::Rpc("boom".to_string()));
    assert_eq!(
        da.get(&ctx, &ids, &ns("C")).await.unwrap_err(),
        DaError::Rpc("boom".to_string())
    );
    assert_eq!(
        da.get_proofs(&ctx, &ids, &ns("C")).await.unwrap_err(),
        DaError::Rpc("boom".to_string())
    );
    assert_eq!(
        da.validate(&ctx, &ids, &[vec![]], &ns("C"))
            .await
            .unwrap_err(),
        DaError::Rpc("boom".to_string())
    );
    assert_eq!(mock.calls().len(), 3);

    // success is returned verbatim as well
    assert_eq!(
        da.get(&ctx, &ids, &ns("A")).await.unwrap(),
        vec![b"blob".to_vec()]
    );
}

#[tokio::test]
async fn test_get_falls_back_to_historical_namespace() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "A", b"historical header").await;
    mock.clear_calls();

    let blobs = da.get(&ctx, &ids, &ns("C")).await.unwrap();
    assert_eq!(blobs, vec![b"historical header".to_vec()]);
    // caller namespace first, the current one is skipped as a duplicate, then A is found
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("C"), ns("A")]
    );
}

#[tokio::test]
async fn test_first_success_stops_the_search() {
    let mock = MockDaService::new();
    let da = NamespaceMigrationDa::from_names(
        mock.clone(),
        "current",
        "current-data",
        vec![
            MigrationEntry::new(10, "ns1").with_data_namespace("data1"),
            MigrationEntry::new(20, "ns2").with_data_namespace("data2"),
            MigrationEntry::new(30, "ns3").with_data_namespace("data3"),
            MigrationEntry::new(40, "ns4").with_data_namespace("data4"),
        ],
    )
    .unwrap();
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "ns3", b"blob").await;
    mock.fail_namespace(ns("ns1"), DaError::Rpc("ns1".to_string()));
    mock.fail_namespace(ns("ns2"), DaError::Rpc("ns2".to_string()));
    mock.clear_calls();

    let blobs = da.get(&ctx, &ids, &ns("ns1")).await.unwrap();
    assert_eq!(blobs, vec![b"blob".to_vec()]);
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("ns1"), ns("current"), ns("ns2"), ns("ns3")]
    );
}

#[tokio::test]
async fn test_exhausted_fallback_returns_last_error() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "elsewhere", b"blob").await;
    mock.fail_namespace(ns("C"), DaError::Rpc("unauthorized".to_string()));
    mock.fail_namespace(ns("B"), DaError::Rpc("last".to_string()));
    mock.clear_calls();

    assert_eq!(
        da.get(&ctx, &ids, &ns("C")).await.unwrap_err(),
        DaError::Rpc("last".to_string())
    );

    // N migrations: at most N + 1 attempts, each against a distinct namespace
    let attempted = mock.namespaces_called(MockDaMethod::Get);
    assert_eq!(attempted, vec![ns("C"), ns("A"), ns("B")]);
}

#[tokio::test]
async fn test_caller_supplied_historical_namespace() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "B", b"blob").await;
    mock.clear_calls();

    da.get(&ctx, &ids, &ns("A")).await.unwrap();
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("A"), ns("C"), ns("B")]
    );
}

#[tokio::test]
async fn test_unchanged_namespace_is_not_retried() {
    let mock = MockDaService::new();
    // the header namespace never changed, only the data namespace did
    let da = NamespaceMigrationDa::from_names(
        mock.clone(),
        "headers",
        "data-v2",
        vec![MigrationEntry::new(100, "headers").with_data_namespace("data-v1")],
    )
    .unwrap();
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "nowhere", b"blob").await;
    mock.clear_calls();

    assert_eq!(
        da.get(&ctx, &ids, &ns("headers")).await.unwrap_err(),
        DaError::NotFound
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("headers")]
    );
}

#[tokio::test]
async fn test_data_namespaces_search_data_history() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "B-data", b"txs").await;
    mock.clear_calls();

    assert_eq!(
        da.get(&ctx, &ids, &ns("C-data")).await.unwrap(),
        vec![b"txs".to_vec()]
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("C-data"), ns("A-data"), ns("B-data")]
    );
}

#[tokio::test]
async fn test_unknown_namespace_searches_header_history() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "nowhere", b"blob").await;
    mock.clear_calls();

    assert_eq!(
        da.get(&ctx, &ids, &ns("unknown")).await.unwrap_err(),
        DaError::NotFound
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("unknown"), ns("C"), ns("A"), ns("B")]
    );
}

#[tokio::test]
async fn test_proofs_and_validation_fall_back() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "A-data", b"txs").await;
    mock.clear_calls();

    let proofs = da.get_proofs(&ctx, &ids, &ns("C-data")).await.unwrap();
    assert_eq!(
        da.validate(&ctx, &ids, &proofs, &ns("C-data"))
            .await
            .unwrap(),
        vec![true]
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::GetProofs),
        vec![ns("C-data"), ns("A-data")]
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Validate),
        vec![ns("C-data"), ns("A-data")]
    );
}

#[tokio::test]
async fn test_submissions_pass_through() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ctx = CancellationToken::new();
    let blobs = vec![b"block".to_vec()];

    // even a historical namespace is used as given
    da.submit(&ctx, &blobs, 1.5, &ns("A")).await.unwrap();
    da.submit_with_options(&ctx, &blobs, 1.5, &ns("C-data"), b"{}")
        .await
        .unwrap();
    da.commit(&ctx, &blobs, &ns("B")).await.unwrap();

    assert_eq!(mock.namespaces_called(MockDaMethod::Submit), vec![ns("A")]);
    assert_eq!(
        mock.namespaces_called(MockDaMethod::SubmitWithOptions),
        vec![ns("C-data")]
    );
    assert_eq!(mock.namespaces_called(MockDaMethod::Commit), vec![ns("B")]);

    mock.fail_namespace(ns("C"), DaError::Rpc("full".to_string()));
    mock.clear_calls();
    assert!(da.submit(&ctx, &blobs, 1.5, &ns("C")).await.is_err());
    assert!(da.commit(&ctx, &blobs, &ns("C")).await.is_err());
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn test_cancelled_context_is_not_retried() {
    let mock = MockDaService::new();
    let da = a_b_c(mock.clone());
    let ids = submit_to(&mock, "A", b"blob").await;
    mock.clear_calls();

    let ctx = CancellationToken::new();
    ctx.cancel();

    assert_eq!(
        da.get(&ctx, &ids, &ns("C")).await.unwrap_err(),
        DaError::Cancelled
    );
    assert_eq!(mock.calls().len(), 1);
}

enum Fault {
    /// Cancels the caller's context as soon as a lookup fails.
    CancelOnFailure,
    /// Lookups under this namespace never complete.
    HangOn(Namespace),
}

/// Mock DA whose `get` misbehaves as described by its [`Fault`].
struct FaultyDa {
    mock: MockDaService,
    fault: Fault,
}

#[async_trait]
impl DaApi for FaultyDa {
    async fn get_ids(
        &self,
        ctx: &CancellationToken,
        height: u64,
        namespace: &Namespace,
    ) -> Result<GetIdsResult, DaError> {
        self.mock.get_ids(ctx, height, namespace).await
    }

    async fn get(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Blob>, DaError> {
        match &self.fault {
            Fault::HangOn(hang) if hang == namespace => std::future::pending().await,
            Fault::HangOn(_) => self.mock.get(ctx, ids, namespace).await,
            Fault::CancelOnFailure => {
                let res = self.mock.get(ctx, ids, namespace).await;
                if res.is_err() {
                    ctx.cancel();
                }
                res
            }
        }
    }

    async fn get_proofs(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Proof>, DaError> {
        self.mock.get_proofs(ctx, ids, namespace).await
    }

    async fn validate(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        namespace: &Namespace,
    ) -> Result<Vec<bool>, DaError> {
        self.mock.validate(ctx, ids, proofs, namespace).await
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
    ) -> Result<Vec<ID>, DaError> {
        self.mock.submit(ctx, blobs, gas_price, namespace).await
    }

    async fn submit_with_options(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
        options: &[u8],
    ) -> Result<Vec<ID>, DaError> {
        self.mock
            .submit_with_options(ctx, blobs, gas_price, namespace, options)
            .await
    }

    async fn commit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        namespace: &Namespace,
    ) -> Result<Vec<Commitment>, DaError> {
        self.mock.commit(ctx, blobs, namespace).await
    }
}

#[tokio::test]
async fn test_cancellation_aborts_fallback_loop() {
    let mock = MockDaService::new();
    let ids = submit_to(&mock, "A", b"blob").await;
    mock.clear_calls();

    let da = NamespaceMigrationDa::from_names(
        FaultyDa {
            mock: mock.clone(),
            fault: Fault::CancelOnFailure,
        },
        "C",
        "C-data",
        vec![MigrationEntry::new(100, "A"), MigrationEntry::new(500, "B")],
    )
    .unwrap();
    let ctx = CancellationToken::new();

    // the blob exists under A, but the context is cancelled after the first miss
    assert_eq!(
        da.get(&ctx, &ids, &ns("C")).await.unwrap_err(),
        DaError::Cancelled
    );
    assert_eq!(mock.namespaces_called(MockDaMethod::Get), vec![ns("C")]);
}

#[tokio::test]
async fn test_cancellation_wins_over_stale_error_without_candidates() {
    let mock = MockDaService::new();
    let ids = submit_to(&mock, "elsewhere", b"blob").await;
    mock.clear_calls();

    // the header namespace never changed, so there is nothing left to try after "h"
    let da = NamespaceMigrationDa::from_names(
        FaultyDa {
            mock,
            fault: Fault::CancelOnFailure,
        },
        "h",
        "d2",
        vec![MigrationEntry::new(100, "h").with_data_namespace("d1")],
    )
    .unwrap();
    let ctx = CancellationToken::new();

    assert_eq!(
        da.get(&ctx, &ids, &ns("h")).await.unwrap_err(),
        DaError::Cancelled
    );
    assert!(ctx.is_cancelled());
    assert_eq!(
        da.inner().mock.namespaces_called(MockDaMethod::Get),
        vec![ns("h")]
    );
}

#[tokio::test]
async fn test_cancellation_interrupts_pending_fallback_attempt() {
    let mock = MockDaService::new();
    let ids = submit_to(&mock, "B", b"blob").await;
    mock.clear_calls();

    let da = NamespaceMigrationDa::from_names(
        FaultyDa {
            mock: mock.clone(),
            fault: Fault::HangOn(ns("A")),
        },
        "C",
        "C-data",
        vec![MigrationEntry::new(100, "A"), MigrationEntry::new(500, "B")],
    )
    .unwrap();
    let ctx = CancellationToken::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let res = tokio::time::timeout(Duration::from_secs(5), da.get(&ctx, &ids, &ns("C")))
        .await
        .expect("lookup should stop once the context is cancelled");
    assert_eq!(res.unwrap_err(), DaError::Cancelled);
    // B holds the blob but is never reached
    assert_eq!(mock.namespaces_called(MockDaMethod::Get), vec![ns("C")]);
}

#[tokio::test]
async fn test_explicit_role_when_current_namespaces_coincide() {
    let mock = MockDaService::new();
    let da = NamespaceMigrationDa::from_names(
        mock.clone(),
        "shared",
        "shared",
        vec![MigrationEntry::new(100, "old-headers").with_data_namespace("old-data")],
    )
    .unwrap();
    let ctx = CancellationToken::new();
    let ids = submit_to(&mock, "old-headers", b"header").await;

    // raw bytes of a shared namespace classify as data and miss the header history
    assert!(da
        .get(&ctx, &ids, &ns("shared"))
        .await
        .unwrap_err()
        .is_not_found());

    mock.clear_calls();
    assert_eq!(
        da.get_for_role(&ctx, &ids, NamespaceRole::Header)
            .await
            .unwrap(),
        vec![b"header".to_vec()]
    );
    assert_eq!(
        mock.namespaces_called(MockDaMethod::Get),
        vec![ns("shared"), ns("old-headers")]
    );

    let proofs = da
        .get_proofs_for_role(&ctx, &ids, NamespaceRole::Header)
        .await
        .unwrap();
    assert_eq!(
        da.validate_for_role(&ctx, &ids, &proofs, NamespaceRole::Header)
            .await
            .unwrap(),
        vec![true]
    );
}

#[tokio::test]
async fn test_concurrent_callers() {
    let mock = MockDaService::new();
    let da = Arc::new(a_b_c(mock.clone()));
    let historical = submit_to(&mock, "A", b"old").await;
    let current = submit_to(&mock, "C", b"new").await;

    let mut handles = vec![];
    for i in 0..16 {
        let da = da.clone();
        let ids = if i % 2 == 0 {
            historical.clone()
        } else {
            current.clone()
        };
        handles.push(tokio::spawn(async move {
            let ctx = CancellationToken::new();
            da.get(&ctx, &ids, &ns("C")).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let blobs = handle.await.unwrap().unwrap();
        let expected: &[u8] = if i % 2 == 0 { b"old" } else { b"new" };
        assert_eq!(blobs, vec![expected.to_vec()]);
    }
}
