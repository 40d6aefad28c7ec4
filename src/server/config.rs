// Server configuration

use crate::constants;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub version: String,
    /// Upper bound for `shards` on `/random`
    pub max_random_shards: usize,
    /// Upper bound for `per_shard` on `/random`
    pub max_random_per_shard: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: constants::VERSION.to_string(),
            max_random_shards: constants::MAX_RANDOM_SHARDS,
            max_random_per_shard: constants::MAX_RANDOM_PER_SHARD,
        }
    }
}
