//! Property-based tests for the cached post indexes.
//!
//! After any sequence of saves and deletes, the per-user and global indexes
//! must agree with a model of which posts are cached and who owns them.

use chrono::Utc;
use posts_api::backend::InMemoryBackend;
use posts_api::domain::Post;
use posts_api::repository::PostCache;
use posts_api::{DataRepository, PostRepository};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Save { id: i64, user_id: i64 },
    Delete { id: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1i64..8, 1i64..4).prop_map(|(id, user_id)| Op::Save { id, user_id }),
        1 => (1i64..8).prop_map(|id| Op::Delete { id }),
    ]
}

fn post(id: i64, user_id: i64) -> Post {
    let now = Utc::now();
    Post {
        id,
        title: format!("Post {}", id),
        content: "0123456789".to_string(),
        user_id,
        created_at: now,
        updated_at: now,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_indexes_match_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let rt = runtime();
        rt.block_on(async {
            let cache = PostCache::new(InMemoryBackend::new());
            // post id -> owner
            let mut model: BTreeMap<i64, i64> = BTreeMap::new();

            for op in &ops {
                match *op {
                    Op::Save { id, user_id } => {
                        cache.save(&post(id, user_id)).await.unwrap();
                        model.insert(id, user_id);
                    }
                    Op::Delete { id } => {
                        cache.delete_by_id(id).await.unwrap();
                        model.remove(&id);
                    }
                }
            }

            let all: Vec<i64> = cache.fetch_all().await.unwrap().iter().map(|p| p.id).collect();
            let expected: Vec<i64> = model.keys().copied().collect();
            prop_assert_eq!(all, expected);

            for user_id in 1..4 {
                let owned: Vec<i64> = cache
                    .fetch_all_by_user_id(user_id)
                    .await
                    .unwrap()
                    .iter()
                    .map(|p| p.id)
                    .collect();
                let expected: Vec<i64> = model
                    .iter()
                    .filter(|(_, owner)| **owner == user_id)
                    .map(|(id, _)| *id)
                    .collect();
                prop_assert_eq!(owned, expected);
            }
            Ok(())
        })?;
    }
}
