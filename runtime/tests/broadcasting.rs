//! Integration tests for Store action broadcasting
//!
//! Observers subscribe to the actions produced by effects (fetch settlements),
//! e.g. to re-render a view whenever something finishes loading.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use keyed_request_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use keyed_request_runtime::{Store, StoreConfig};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum LoadAction {
    /// Start loading one page
    Load { id: u64 },
    /// Start loading several pages at once
    LoadMany { ids: Vec<u64> },
    /// A page finished loading
    Loaded { id: u64 },
    /// Load a page in `steps` sequential chunks
    LoadChunked { id: u64, steps: u32 },
    /// One chunk arrived
    ChunkLoaded { id: u64, step: u32, steps: u32 },
}

#[derive(Debug, Clone, Default)]
struct LoadState {
    loaded: Vec<u64>,
    chunks: u32,
}

#[derive(Clone)]
struct LoadEnvironment;

#[derive(Clone)]
struct LoadReducer;

fn load(id: u64) -> Effect<LoadAction> {
    Effect::Future(Box::pin(async move { Some(LoadAction::Loaded { id }) }))
}

impl Reducer for LoadReducer {
    type State = LoadState;
    type Action = LoadAction;
    type Environment = LoadEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LoadAction::Load { id } => smallvec![load(id)],
            LoadAction::LoadMany { ids } => {
                smallvec![Effect::merge(ids.into_iter().map(load).collect())]
            },
            LoadAction::Loaded { id } => {
                state.loaded.push(id);
                smallvec![Effect::None]
            },
            LoadAction::LoadChunked { id, steps } => {
                smallvec![Effect::Future(Box::pin(async move {
                    Some(LoadAction::ChunkLoaded { id, step: 1, steps })
                }))]
            },
            LoadAction::ChunkLoaded { id, step, steps } => {
                state.chunks += 1;
                if step < steps {
                    smallvec![Effect::Future(Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Some(LoadAction::ChunkLoaded {
                            id,
                            step: step + 1,
                            steps,
                        })
                    }))]
                } else {
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(LoadAction::Loaded { id })
                    }))]
                }
            },
        }
    }
}

fn store() -> Store<LoadState, LoadAction, LoadEnvironment, LoadReducer> {
    Store::new(LoadState::default(), LoadReducer, LoadEnvironment)
}

fn drain(rx: &mut broadcast::Receiver<LoadAction>) -> Vec<LoadAction> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ============================================================================
// Tests
// ============================================================================

/// Only actions produced by effects are broadcast, not the ones sent directly
#[tokio::test]
async fn test_initial_actions_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(LoadAction::Load { id: 7 }).await.unwrap();
    handle.wait().await;

    assert_eq!(drain(&mut rx), vec![LoadAction::Loaded { id: 7 }]);
}

/// Every subscriber gets its own copy of each action
#[tokio::test]
async fn test_multiple_independent_subscribers() {
    let store = store();
    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();
    let mut rx3 = store.subscribe_actions();

    for id in [1, 2] {
        let mut handle = store.send(LoadAction::Load { id }).await.unwrap();
        handle.wait().await;
    }

    assert_eq!(drain(&mut rx1).len(), 2);
    assert_eq!(drain(&mut rx2).len(), 2);
    assert_eq!(drain(&mut rx3).len(), 2);
}

/// Each branch of a parallel effect broadcasts its own action
#[tokio::test]
async fn test_parallel_effects_broadcasting() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store
        .send(LoadAction::LoadMany { ids: vec![1, 2, 3] })
        .await
        .unwrap();
    handle.wait().await;

    let mut ids: Vec<u64> = drain(&mut rx)
        .into_iter()
        .map(|action| match action {
            LoadAction::Loaded { id } => id,
            other => panic!("unexpected action {other:?}"),
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    let mut loaded = store.state(|s| s.loaded.clone()).await;
    loaded.sort_unstable();
    assert_eq!(loaded, vec![1, 2, 3]);
}

/// Actions produced by chained effects arrive in order
#[tokio::test]
async fn test_sequential_effects_broadcasting() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store
        .send(LoadAction::LoadChunked { id: 9, steps: 3 })
        .await
        .unwrap();

    let mut received = Vec::new();
    while received.last() != Some(&LoadAction::Loaded { id: 9 }) {
        let action = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("chunked load did not finish")
            .unwrap();
        received.push(action);
    }

    assert_eq!(
        received,
        vec![
            LoadAction::ChunkLoaded { id: 9, step: 1, steps: 3 },
            LoadAction::ChunkLoaded { id: 9, step: 2, steps: 3 },
            LoadAction::ChunkLoaded { id: 9, step: 3, steps: 3 },
            LoadAction::Loaded { id: 9 },
        ]
    );
    assert_eq!(store.state(|s| s.chunks).await, 3);
}

/// A slow subscriber skips old actions instead of blocking the store
#[tokio::test]
async fn test_lagging_subscriber() {
    let store = Store::with_config(
        LoadState::default(),
        LoadReducer,
        LoadEnvironment,
        StoreConfig::default().with_broadcast_capacity(4),
    );
    let mut rx = store.subscribe_actions();

    let mut handle = store
        .send(LoadAction::LoadMany {
            ids: (0..20).collect(),
        })
        .await
        .unwrap();
    handle.wait().await;

    let mut received = 0;
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert_eq!(received, 4);
    assert_eq!(store.state(|s| s.loaded.len()).await, 20);
}

/// Receivers see the channel close once every store clone is dropped
#[tokio::test]
async fn test_channel_closed_on_store_drop() {
    let store = store();
    let mut rx = store.subscribe_actions();
    drop(store);

    assert!(matches!(
        rx.recv().await,
        Err(broadcast::error::RecvError::Closed)
    ));
}
