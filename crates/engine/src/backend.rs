use async_trait::async_trait;

use crate::{Result, fragment::Fragment};

/// Key-value storage for media groups.
///
/// Each key maps to the full ordered fragment list of one group. The store
/// reads and writes whole groups; implementations only need read-your-writes
/// consistency within a single call chain.
#[async_trait]
pub trait GroupBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<Fragment>>>;
    async fn write(&self, key: &str, fragments: &[Fragment]) -> Result<()>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
