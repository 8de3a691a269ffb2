use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;

use super::normalize::normalize_tags;
use crate::{error::AppResult, store::InterestStore};

/// Current interest set; empty if the user never saved one.
pub async fn get<S>(store: &S, user_id: Uuid) -> AppResult<BTreeSet<String>>
where
    S: InterestStore + ?Sized,
{
    Ok(store.read_tags(user_id).await?)
}

/// Replaces the user's whole set with the normalized form of `raw` and
/// returns what was stored. Concurrent replaces for one user: last write wins.
pub async fn replace<S>(store: &S, user_id: Uuid, raw: &[String]) -> AppResult<BTreeSet<String>>
where
    S: InterestStore + ?Sized,
{
    let tags = normalize_tags(raw)?;
    store.replace_tags(user_id, &tags).await?;
    info!(%user_id, count = tags.len(), "interests replaced");
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        store::{memory::MemoryStore, testing::UnavailableStore, CredentialStore, NewUser},
    };

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let id = store
            .insert_user(NewUser { email: "u@x.com", username: None, password_hash: "h" })
            .await
            .unwrap()
            .id;
        (store, id)
    }

    #[tokio::test]
    async fn never_saved_reads_as_empty() {
        let (store, id) = seeded().await;
        assert!(get(&store, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_then_get_round_trips_normalized_set() {
        let (store, id) = seeded().await;
        let saved = replace(&store, id, &strings(&[" Hiking ", "hiking", "HIKING", "Chess"]))
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(get(&store, id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn second_replace_leaves_no_residue() {
        let (store, id) = seeded().await;
        replace(&store, id, &strings(&["chess", "hiking"])).await.unwrap();
        replace(&store, id, &strings(&["baking"])).await.unwrap();

        let current: Vec<String> = get(&store, id).await.unwrap().into_iter().collect();
        assert_eq!(current, strings(&["baking"]));
    }

    #[tokio::test]
    async fn replace_with_empty_list_clears() {
        let (store, id) = seeded().await;
        replace(&store, id, &strings(&["chess"])).await.unwrap();
        let saved = replace(&store, id, &strings(&["  ", ""])).await.unwrap();
        assert!(saved.is_empty());
        assert!(get(&store, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_replace_keeps_previous_set() {
        let (store, id) = seeded().await;
        replace(&store, id, &strings(&["chess"])).await.unwrap();

        let too_long = "x".repeat(100);
        let err = replace(&store, id, &strings(&["hiking", too_long.as_str()])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get(&store, id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_store() {
        let too_long = "x".repeat(100);
        let err = replace(&UnavailableStore, Uuid::new_v4(), &strings(&[too_long.as_str()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn store_outage_propagates() {
        let err = get(&UnavailableStore, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn concurrent_replaces_never_mix() {
        let (store, id) = seeded().await;
        let store = std::sync::Arc::new(store);
        let a = strings(&["a1", "a2", "a3"]);
        let b = strings(&["b1", "b2"]);

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            let list = if i % 2 == 0 { a.clone() } else { b.clone() };
            handles.push(tokio::spawn(async move {
                replace(store.as_ref(), id, &list).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let current: Vec<String> = get(store.as_ref(), id).await.unwrap().into_iter().collect();
        assert!(current == a || current == b, "mixed set: {current:?}");
    }
}
