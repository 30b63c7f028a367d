//! Cache key layout.
//!
//! ```text
//! post:{id}             one serialized post
//! post:user:{user_id}   ids of the posts owned by a user
//! post:all              ids of every cached post
//! ```

use crate::entity::CacheEntity;

const USER_INDEX_SEGMENT: &str = "user";
const ALL_INDEX_SEGMENT: &str = "all";

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Key of a single entity: `"{prefix}:{id}"`.
    pub fn build<T: CacheEntity>(id: &T::Key) -> String {
        format!("{}:{}", T::cache_prefix(), id)
    }

    /// Key of the per-owner index: `"{prefix}:user:{user_id}"`.
    pub fn user_index<T: CacheEntity>(user_id: i64) -> String {
        Self::build_composite(&[
            T::cache_prefix(),
            USER_INDEX_SEGMENT,
            &user_id.to_string(),
        ])
    }

    /// Key of the index listing every cached entity: `"{prefix}:all"`.
    pub fn all_index<T: CacheEntity>() -> String {
        Self::build_composite(&[T::cache_prefix(), ALL_INDEX_SEGMENT])
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Parse a composite key into parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;

    #[test]
    fn test_entity_key() {
        assert_eq!(CacheKeyBuilder::build::<Post>(&17), "post:17");
    }

    #[test]
    fn test_index_keys() {
        assert_eq!(CacheKeyBuilder::user_index::<Post>(3), "post:user:3");
        assert_eq!(CacheKeyBuilder::all_index::<Post>(), "post:all");
    }

    #[test]
    fn test_index_keys_never_collide_with_entity_keys() {
        let entity = CacheKeyBuilder::build::<Post>(&3);
        let index = CacheKeyBuilder::user_index::<Post>(3);
        assert_ne!(entity, index);
        assert_eq!(CacheKeyBuilder::parse(&index), vec!["post", "user", "3"]);
    }
}
