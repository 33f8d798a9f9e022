#[cfg(test)]
mod roster_tests {
    use crate::leaderboard::roster::RosterService;
    use crate::leaderboard::store::RecordStore;
    use crate::test_support::*;
    use crate::third_party::{MockNotifier, Notifier, StatsProvider};
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use shared::{DisplayName, PlayerRecord, PlayerStats, SharedError, HISTORY_DAYS};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: Arc<RecordStore>,
        provider: Arc<FakeStatsProvider>,
    }

    impl Fixture {
        fn new(records: &[PlayerRecord]) -> Self {
            let dir = TempDir::new().unwrap();
            let store = seeded_store(&dir.path().join("players.json"), records);
            Self::with_store(dir, store)
        }

        fn without_file() -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(RecordStore::new(dir.path().join("players.json")));
            Self::with_store(dir, store)
        }

        fn with_store(dir: TempDir, store: Arc<RecordStore>) -> Self {
            let provider = Arc::new(
                FakeStatsProvider::new()
                    .respond("magnus", stats(1800, 1900, 1700))
                    .respond("judit", stats(1750, 1750, 1600)),
            );
            Self {
                _dir: dir,
                store,
                provider,
            }
        }

        fn service(&self, identity: FakeIdentityProvider) -> RosterService {
            self.service_with(identity, Arc::new(MockNotifier::new()))
        }

        fn service_with(&self, identity: FakeIdentityProvider, notifier: Arc<dyn Notifier>) -> RosterService {
            RosterService::new(
                self.store.clone(),
                self.provider.clone(),
                Arc::new(identity),
                notifier,
                chrono_tz::Europe::Paris,
            )
        }

        fn saved(&self) -> Vec<PlayerRecord> {
            serde_json::from_slice(&std::fs::read(self.store.path()).unwrap()).unwrap()
        }
    }

    fn identities() -> FakeIdentityProvider {
        FakeIdentityProvider::new()
            .knows("U1", "Magnus", "Carlsen")
            .knows("U2", "Judit", "Polgar")
    }

    #[tokio::test]
    async fn test_add_player_builds_seeded_record() {
        let fixture = Fixture::new(&[record("hikaru", 1500)]);
        let service = fixture.service(identities());
        // 23:30 UTC on March 9th is already March 10th in Paris
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap();

        let added = service.add_player_at("magnus 2027 b2", Some("U1"), now).await.unwrap();

        assert_eq!(added.id, "magnus");
        assert_eq!(added.display_name, DisplayName::new("Magnus", "Carlsen"));
        assert_eq!(added.cohort_tag, "2027");
        assert_eq!(added.class_tag, "B2");
        assert_eq!(added.previous_rank, 0);
        assert_eq!(added.rating_primary.current, 1800);
        assert_eq!(added.rating_primary.best, 1900);
        assert_eq!(added.history, vec![1800; HISTORY_DAYS]);
        assert_eq!(added.last_history_update, NaiveDate::from_ymd_opt(2025, 3, 10));

        let saved = fixture.saved();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1], added);
    }

    #[tokio::test]
    async fn test_add_player_to_missing_store_creates_it() {
        let fixture = Fixture::without_file();
        let service = fixture.service(identities());

        service.add_player("judit", None).await.unwrap();

        let saved = fixture.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "judit");
        assert!(saved[0].display_name.is_empty());
    }

    #[tokio::test]
    async fn test_add_player_refuses_malformed_store() {
        let fixture = Fixture::without_file();
        let broken = br#"[{"username":"a"},{"username":"b"},]"#;
        std::fs::write(fixture.store.path(), broken).unwrap();
        let service = fixture.service(identities());

        let result = service.add_player("magnus 2027 b2", None).await;

        assert!(matches!(result, Err(SharedError::StoreUnreadable(_))));
        assert_eq!(std::fs::read(fixture.store.path()).unwrap(), broken.to_vec());
        assert!(!fixture.store.is_locked());
    }

    #[tokio::test]
    async fn test_add_player_rejects_duplicate_id_ignoring_case() {
        let fixture = Fixture::new(&[record("Magnus", 1500)]);
        let before = std::fs::read(fixture.store.path()).unwrap();
        let service = fixture.service(identities());

        let result = service.add_player("magnus", None).await;

        assert!(matches!(result, Err(SharedError::DuplicateIdentity(_))));
        assert_eq!(std::fs::read(fixture.store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_add_player_rejects_second_account_for_same_person() {
        let fixture = Fixture::new(&[named("mc_old", 1500, "magnus", "CARLSEN")]);
        let service = fixture.service(identities());

        let result = service.add_player("magnus", Some("U1")).await;

        assert!(matches!(result, Err(SharedError::DuplicateIdentity(_))));
        assert_eq!(fixture.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_add_player_without_username() {
        let fixture = Fixture::new(&[]);
        let service = fixture.service(identities());

        let result = service.add_player("   ", Some("U1")).await;

        assert!(matches!(result, Err(SharedError::BadRequest(_))));
        assert!(fixture.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_player_provider_failure_leaves_store_alone() {
        let fixture = Fixture::new(&[record("hikaru", 1500)]);
        let service = fixture.service(identities());

        let result = service.add_player("ghost 2026", Some("U1")).await;

        assert_eq!(result, Err(SharedError::ProviderUnavailable("ghost".into())));
        assert_eq!(fixture.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_add_player_requires_identity_configuration() {
        let fixture = Fixture::new(&[]);
        let service = fixture.service(FakeIdentityProvider::misconfigured());

        let result = service.add_player("magnus", Some("U1")).await;

        assert!(matches!(result, Err(SharedError::Configuration(_))));
        assert!(fixture.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_player_with_unknown_identity_registers_without_name() {
        let fixture = Fixture::new(&[]);
        let service = fixture.service(identities());

        let added = service.add_player("magnus", Some("U404")).await.unwrap();

        assert!(added.display_name.is_empty());
    }

    #[tokio::test]
    async fn test_remove_player_removes_every_matching_record() {
        let fixture = Fixture::new(&[
            named("magnus", 1800, "Magnus", "Carlsen"),
            named("hikaru", 1700, "Hikaru", "Nakamura"),
            named("magnus_alt", 1600, "MAGNUS", "carlsen"),
        ]);
        let service = fixture.service(identities());

        let removed = service.remove_player("U1").await.unwrap();

        assert_eq!(removed, 2);
        let ids: Vec<String> = fixture.saved().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["hikaru"]);
    }

    #[tokio::test]
    async fn test_remove_player_not_found() {
        let fixture = Fixture::new(&[named("hikaru", 1700, "Hikaru", "Nakamura")]);
        let service = fixture.service(identities());

        let result = service.remove_player("U2").await;

        assert!(matches!(result, Err(SharedError::NotFound(_))));
        assert_eq!(fixture.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_player_unknown_identity() {
        let fixture = Fixture::new(&[named("magnus", 1800, "Magnus", "Carlsen")]);
        let service = fixture.service(identities());

        let result = service.remove_player("U404").await;

        assert!(matches!(result, Err(SharedError::IdentityUnavailable(_))));
        assert_eq!(fixture.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_player_with_unreadable_store() {
        let fixture = Fixture::without_file();
        let service = fixture.service(identities());

        let result = service.remove_player("U1").await;

        assert!(matches!(result, Err(SharedError::StoreUnreadable(_))));
        assert!(!fixture.store.is_locked());
    }

    #[tokio::test]
    async fn test_replace_all() {
        let fixture = Fixture::new(&[record("hikaru", 1500)]);
        let service = fixture.service(identities());

        let duplicate = service
            .replace_all(vec![record("a", 1000), record("A", 1100)])
            .await;
        assert!(matches!(duplicate, Err(SharedError::DuplicateIdentity(_))));

        let invalid = service.replace_all(vec![record("", 1000)]).await;
        assert!(matches!(invalid, Err(SharedError::Validation(_))));
        assert_eq!(fixture.saved()[0].id, "hikaru");

        let count = service
            .replace_all(vec![record("a", 1000), record("b", 1100)])
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(fixture.saved(), vec![record("a", 1000), record("b", 1100)]);
    }

    #[tokio::test]
    async fn test_dispatch_add_notifies_success() {
        let fixture = Fixture::new(&[]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|url, text| url == "https://hooks.example/add" && text.contains("magnus") && text.starts_with("✅"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = Arc::new(fixture.service_with(identities(), Arc::new(notifier)));

        service
            .dispatch_add("magnus 2027".into(), Some("U1".into()), "https://hooks.example/add".into())
            .await
            .unwrap();

        assert_eq!(fixture.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_remove_notifies_failure() {
        let fixture = Fixture::new(&[]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|url, text| url == "https://hooks.example/rm" && text.starts_with("❌"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = Arc::new(fixture.service_with(identities(), Arc::new(notifier)));

        service
            .dispatch_remove("U2".into(), "https://hooks.example/rm".into())
            .await
            .unwrap();
    }

    struct PanickingStatsProvider;

    #[async_trait::async_trait]
    impl StatsProvider for PanickingStatsProvider {
        async fn fetch_stats(&self, _player_id: &str) -> shared::Result<PlayerStats> {
            panic!("provider blew up");
        }
    }

    #[tokio::test]
    async fn test_dispatch_add_reports_panicking_worker() {
        let fixture = Fixture::new(&[]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|url, text| url == "https://hooks.example/add" && text.starts_with("❌ Internal error"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = Arc::new(RosterService::new(
            fixture.store.clone(),
            Arc::new(PanickingStatsProvider),
            Arc::new(identities()),
            Arc::new(notifier),
            chrono_tz::Europe::Paris,
        ));

        service
            .dispatch_add("magnus".into(), None, "https://hooks.example/add".into())
            .await
            .unwrap();

        assert!(fixture.saved().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_survives_notifier_failure() {
        let fixture = Fixture::new(&[]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(SharedError::Internal("hook down".into())));
        let service = Arc::new(fixture.service_with(identities(), Arc::new(notifier)));

        let handle = service.dispatch_add("judit".into(), None, "https://hooks.example/add".into());

        assert!(handle.await.is_ok());
        assert_eq!(fixture.saved().len(), 1);
    }
}
