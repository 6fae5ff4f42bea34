use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    geo::{provider::GeoProvider, repo::HistoryRepo, repo_types::SearchHistoryEntry},
};

/// Strict dotted-quad: four decimal octets 0-255, no leading zeros, nothing else.
pub fn is_valid_ipv4(ip: &str) -> bool {
    lazy_static! {
        static ref IPV4_RE: Regex = Regex::new(
            r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])){3}$"
        )
        .unwrap();
    }
    IPV4_RE.is_match(ip)
}

/// Queries the provider and records the result for `user_id`.
///
/// The entry is written only after the provider answered.
pub async fn lookup(
    provider: &dyn GeoProvider,
    history: &dyn HistoryRepo,
    user_id: Uuid,
    ip: &str,
) -> AppResult<SearchHistoryEntry> {
    if !is_valid_ipv4(ip) {
        warn!(%ip, "invalid ip address");
        return Err(AppError::InvalidInput("Invalid IP address".into()));
    }

    let geo = provider.lookup(ip).await.map_err(AppError::Upstream)?;
    let geo_info = serde_json::to_string(&geo).map_err(|e| AppError::Internal(e.into()))?;

    let entry = history
        .insert(user_id, ip, &geo_info)
        .await
        .map_err(AppError::Store)?;
    info!(%user_id, entry_id = %entry.id, %ip, "lookup recorded");
    Ok(entry)
}

pub async fn list(history: &dyn HistoryRepo, user_id: Uuid) -> AppResult<Vec<SearchHistoryEntry>> {
    history.list_by_user(user_id).await.map_err(AppError::Store)
}

/// Deletes the given entries owned by `user_id`; ids of other users' entries are ignored.
pub async fn delete_many(
    history: &dyn HistoryRepo,
    user_id: Uuid,
    ids: Option<Vec<String>>,
) -> AppResult<u64> {
    let ids = match ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Err(AppError::InvalidInput("No IDs provided".into())),
    };
    let ids = ids
        .iter()
        .map(|id| parse_id(id))
        .collect::<AppResult<Vec<Uuid>>>()?;

    let deleted = history
        .delete_many(user_id, &ids)
        .await
        .map_err(AppError::Store)?;
    info!(%user_id, requested = ids.len(), deleted, "history entries deleted");
    Ok(deleted)
}

pub async fn delete_one(history: &dyn HistoryRepo, user_id: Uuid, id: &str) -> AppResult<()> {
    let id = parse_id(id)?;
    let deleted = history
        .delete_many(user_id, &[id])
        .await
        .map_err(AppError::Store)?;
    if deleted == 0 {
        return Err(AppError::NotFound("History entry not found".into()));
    }
    info!(%user_id, entry_id = %id, "history entry deleted");
    Ok(())
}

fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("Invalid id: {id}")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::geo::{provider::stub::StubProvider, repo::memory::MemoryHistoryRepo};

    #[test]
    fn accepts_dotted_quads() {
        for ip in [
            "8.8.8.8",
            "0.0.0.0",
            "255.255.255.255",
            "192.168.1.10",
            "10.0.200.99",
            "1.2.3.4",
            "249.250.199.100",
        ] {
            assert!(is_valid_ipv4(ip), "{ip} should be valid");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for ip in [
            "",
            "999.1.1.1",
            "1.2.3.256",
            "1.999.1.1",
            "1.2.3",
            "1.2.3.4.5",
            "01.2.3.4",
            " 1.2.3.4",
            "1.2.3.4 ",
            "1.2.3.4/24",
            "::1",
            "2001:4860:4860::8888",
            "example.com",
            "localhost",
            "a.b.c.d",
        ] {
            assert!(!is_valid_ipv4(ip), "{ip:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn lookup_records_provider_json() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let user = Uuid::new_v4();

        let entry = lookup(&provider, &history, user, "8.8.8.8").await.unwrap();
        assert_eq!(entry.user_id, user);
        assert_eq!(entry.ip_address, "8.8.8.8");
        let geo: serde_json::Value = serde_json::from_str(&entry.geo_info).unwrap();
        assert_eq!(geo["city"], "Mountain View");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn invalid_ip_never_reaches_provider() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let err = lookup(&provider, &history, Uuid::new_v4(), "google.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_persists_nothing() {
        let provider = StubProvider::failing();
        let history = MemoryHistoryRepo::default();
        let err = lookup(&provider, &history, Uuid::new_v4(), "1.1.1.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(history.len(), 0);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_per_user() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let ips = ["1.1.1.1", "8.8.8.8", "9.9.9.9"];
        for ip in ips {
            lookup(&provider, &history, me, ip).await.unwrap();
        }
        lookup(&provider, &history, other, "4.4.4.4").await.unwrap();

        let mine = list(&history, me).await.unwrap();
        assert_eq!(mine.len(), 3);
        let got: Vec<_> = mine.iter().map(|e| e.ip_address.as_str()).collect();
        assert_eq!(got, vec!["9.9.9.9", "8.8.8.8", "1.1.1.1"]);
        assert!(mine.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        assert!(list(&history, Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_many_requires_ids() {
        let history = MemoryHistoryRepo::default();
        let user = Uuid::new_v4();
        for ids in [None, Some(vec![])] {
            let err = delete_many(&history, user, ids).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn delete_many_rejects_malformed_id() {
        let history = MemoryHistoryRepo::default();
        let err = delete_many(&history, Uuid::new_v4(), Some(vec!["abc".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_many_removes_exactly_the_given_entries() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let user = Uuid::new_v4();
        let a = lookup(&provider, &history, user, "1.1.1.1").await.unwrap();
        let b = lookup(&provider, &history, user, "2.2.2.2").await.unwrap();
        let c = lookup(&provider, &history, user, "3.3.3.3").await.unwrap();

        let deleted = delete_many(&history, user, Some(vec![a.id.to_string(), c.id.to_string()]))
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let left = list(&history, user).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    // Deletion is scoped to the caller: knowing another user's entry id is not enough.
    #[tokio::test]
    async fn delete_many_leaves_other_users_entries_untouched() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let entry = lookup(&provider, &history, owner, "8.8.8.8").await.unwrap();

        let deleted = delete_many(&history, intruder, Some(vec![entry.id.to_string()]))
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(list(&history, owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_one_reports_missing_entry() {
        let provider = StubProvider::default();
        let history = MemoryHistoryRepo::default();
        let user = Uuid::new_v4();
        let entry = lookup(&provider, &history, user, "8.8.4.4").await.unwrap();

        delete_one(&history, user, &entry.id.to_string()).await.unwrap();
        let err = delete_one(&history, user, &entry.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
