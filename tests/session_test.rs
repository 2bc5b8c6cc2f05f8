/// Wallet session lifecycle tests against the mock backend
///
/// Run with: cargo test --test session_test
mod common;

use std::time::Duration;

use common::{FakeProvider, TestEnv, ALICE, BOB};
use folio_client::{AccountEvent, FolioError, SessionPhase};
use folio_mock::routes;
use serde_json::json;

#[tokio::test]
async fn test_connect_registers_connection_once() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE, BOB]);
    let manager = env.manager(Some(provider.clone()));

    let address = manager.connect().await?;

    assert_eq!(address, ALICE, "first account is the primary one");
    assert!(manager.is_connected());
    assert_eq!(manager.phase(), SessionPhase::Connected);
    assert!(manager.contract().is_some());
    assert!(manager.has_subscription());
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 1);

    let profile = manager.profile().expect("profile cached after connect");
    assert_eq!(profile.address, ALICE);
    assert_eq!(profile.connection_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_reconnect_counts_connections_and_replaces_listener() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));

    manager.connect().await?;
    manager.connect().await?;

    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 2);
    assert_eq!(manager.profile().unwrap().connection_count, 2);
    assert_eq!(provider.subscriptions(), 2);
    assert_eq!(provider.live_subscriptions(), 1, "old listener must be released");

    Ok(())
}

#[tokio::test]
async fn test_disconnect_clears_everything() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));

    manager.connect().await?;
    manager.disconnect()?;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);
    assert!(!snapshot.connected);
    assert!(snapshot.address.is_none());
    assert!(!snapshot.has_contract);
    assert!(snapshot.profile.is_none());
    assert!(!manager.has_subscription());
    assert_eq!(provider.live_subscriptions(), 0);
    assert!(!provider.emit(&[BOB]));

    // idempotent
    manager.disconnect()?;
    assert!(!manager.is_connected());

    Ok(())
}

#[tokio::test]
async fn test_missing_provider_prompts_install() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(None);

    let result = manager.connect().await;

    assert!(matches!(result, Err(FolioError::ProviderUnavailable)));
    assert!(env.notifier.contains("install a wallet provider"));
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 0);
    assert!(!manager.is_connected());

    Ok(())
}

#[tokio::test]
async fn test_rejected_authorization_leaves_session_disconnected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    provider.reject_with("User rejected the request");
    let manager = env.manager(Some(provider.clone()));

    let result = manager.connect().await;

    assert!(matches!(result, Err(FolioError::Provider(_))));
    assert_eq!(manager.phase(), SessionPhase::Disconnected);
    assert!(env.notifier.contains("Error connecting wallet"));
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 0);
    assert_eq!(provider.subscriptions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_empty_account_list_is_an_error() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[])));

    assert!(manager.connect().await.is_err());
    assert_eq!(manager.phase(), SessionPhase::Disconnected);

    Ok(())
}

#[tokio::test]
async fn test_failed_upsert_keeps_wallet_connected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.store.fail(routes::CONNECT_WALLET);
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));

    let address = manager.connect().await?;

    assert_eq!(address, ALICE);
    assert!(manager.is_connected());
    assert!(manager.profile().is_none());
    assert!(env.notifier.contains("Error recording wallet connection"));

    Ok(())
}

#[tokio::test]
async fn test_connect_without_contract_still_connects() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::without_contract(&[ALICE])));

    manager.connect().await?;

    assert!(manager.is_connected());
    assert!(manager.contract().is_none());

    Ok(())
}

#[tokio::test]
async fn test_overlapping_connect_is_refused() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    provider.delay_requests(Duration::from_millis(50));
    let manager = env.manager(Some(provider));

    let (first, second) = tokio::join!(manager.connect(), manager.connect());

    assert_eq!(first?, ALICE);
    assert!(matches!(second, Err(FolioError::OperationPending)));
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 1);

    // guard released once the first call finished
    manager.disconnect()?;

    Ok(())
}

// ============================================================================
// Account changes
// ============================================================================

#[tokio::test]
async fn test_account_switch_registers_new_address() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));
    manager.connect().await?;

    assert!(provider.emit(&[BOB]));
    let event = manager.poll_account_change().await;

    assert_eq!(event, Some(AccountEvent::Switched(BOB.to_string())));
    assert_eq!(manager.address().as_deref(), Some(BOB));
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 2);
    assert_eq!(manager.profile().unwrap().address, BOB);
    assert!(manager.contract().is_some());
    assert!(manager.has_subscription(), "listener survives a switch");

    Ok(())
}

#[tokio::test]
async fn test_same_account_is_unchanged() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));
    manager.connect().await?;

    let checksummed = ALICE.to_uppercase().replacen("0X", "0x", 1);
    provider.emit(&[checksummed.as_str()]);
    let event = manager.poll_account_change().await;

    assert_eq!(event, Some(AccountEvent::Unchanged));
    assert_eq!(env.store.calls(routes::CONNECT_WALLET), 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_accounts_disconnects() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));
    manager.connect().await?;

    provider.emit(&[]);
    let event = manager.poll_account_change().await;

    assert_eq!(event, Some(AccountEvent::Disconnected));
    assert!(!manager.is_connected());
    assert!(manager.profile().is_none());
    assert_eq!(provider.live_subscriptions(), 0);
    assert_eq!(manager.poll_account_change().await, None);

    Ok(())
}

#[tokio::test]
async fn test_disconnect_stops_pending_poll() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));
    manager.connect().await?;

    let (event, disconnected) = tokio::join!(manager.poll_account_change(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.disconnect()
    });

    disconnected?;
    assert_eq!(event, None);
    assert!(!manager.has_subscription());
    assert_eq!(provider.live_subscriptions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_poll_keeps_listener() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let provider = FakeProvider::new(&[ALICE]);
    let manager = env.manager(Some(provider.clone()));
    manager.connect().await?;

    let waited = tokio::time::timeout(Duration::from_millis(20), manager.poll_account_change()).await;
    assert!(waited.is_err());

    assert!(manager.is_connected());
    assert!(manager.has_subscription());
    assert_eq!(provider.live_subscriptions(), 1);

    assert!(provider.emit(&[]));
    assert_eq!(manager.poll_account_change().await, Some(AccountEvent::Disconnected));
    assert!(!manager.is_connected());
    assert_eq!(provider.live_subscriptions(), 0);

    Ok(())
}

#[tokio::test]
async fn test_poll_without_session_returns_none() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));

    assert_eq!(manager.poll_account_change().await, None);

    Ok(())
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_nickname_trims_and_caches() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    let address = manager.connect().await?;

    let profile = manager.update_nickname(&address, "  Alice  ").await?;

    assert_eq!(profile.nickname.as_deref(), Some("Alice"));
    assert_eq!(manager.profile().unwrap().nickname.as_deref(), Some("Alice"));
    assert_eq!(env.store.calls(routes::UPDATE_NICKNAME), 1);

    Ok(())
}

#[tokio::test]
async fn test_blank_nickname_never_sent() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    let address = manager.connect().await?;

    let result = manager.update_nickname(&address, "   ").await;

    assert!(matches!(result, Err(FolioError::Validation(_))));
    assert_eq!(env.store.calls(routes::UPDATE_NICKNAME), 0);

    Ok(())
}

#[tokio::test]
async fn test_other_address_does_not_touch_cache() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    manager.connect().await?;
    env.store.connect_wallet(BOB).unwrap();

    let bob = manager.update_nickname(BOB, "Bob").await?;
    let fetched = manager.fetch_profile(BOB).await?;

    assert_eq!(bob.nickname.as_deref(), Some("Bob"));
    assert_eq!(fetched.address, BOB);
    let cached = manager.profile().unwrap();
    assert_eq!(cached.address, ALICE);
    assert!(cached.nickname.is_none());

    Ok(())
}

#[tokio::test]
async fn test_fetch_profile_failure_keeps_cache() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    let address = manager.connect().await?;
    env.store.fail(routes::GET_WALLET);

    let result = manager.fetch_profile(&address).await;

    assert!(matches!(result, Err(FolioError::Fetch(_))));
    assert_eq!(manager.profile().unwrap().address, ALICE);
    assert!(env.notifier.contains("Error fetching wallet details"));

    Ok(())
}

// ============================================================================
// Score recording
// ============================================================================

#[tokio::test]
async fn test_record_without_wallet_sends_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));

    let record = manager.record_game_score(1, 12, json!({})).await?;

    assert!(record.is_none());
    assert_eq!(env.store.calls(routes::RECORD_GAME), 0);
    assert_eq!(env.store.calls(routes::GET_WALLET), 0);

    Ok(())
}

#[tokio::test]
async fn test_record_refreshes_profile() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    manager.connect().await?;
    let game_id = env.store.find_games(Some(folio_mock::SEED_GAME))[0].id;

    let record = manager
        .record_game_score(game_id, 12, serde_json::Value::Null)
        .await?
        .expect("connected wallet records");

    assert_eq!(record.score, 12);
    assert_eq!(record.data, json!({}));
    assert_eq!(env.store.calls(routes::RECORD_GAME), 1);
    assert_eq!(env.store.calls(routes::GET_WALLET), 1);

    let profile = manager.profile().unwrap();
    assert_eq!(profile.total_games_played, 1);
    assert_eq!(profile.high_score(folio_mock::SEED_GAME), 12);
    assert_eq!(profile.game_history.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_record_still_refreshes_profile() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let manager = env.manager(Some(FakeProvider::new(&[ALICE])));
    manager.connect().await?;
    env.store.fail(routes::RECORD_GAME);

    let result = manager.record_game_score(1, 5, json!({})).await;

    assert!(matches!(result, Err(FolioError::Submit(_))));
    assert_eq!(env.store.calls(routes::GET_WALLET), 1);
    assert!(env.notifier.contains("Error recording game score"));
    assert_eq!(manager.profile().unwrap().total_games_played, 0);

    Ok(())
}
