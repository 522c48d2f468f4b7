use std::sync::Arc;

use {
    serde::Serialize,
    teloxide::types::{Message, Update},
    tracing::debug,
};

use {
    mediagroups_engine::{
        Fragment, FragmentStore, GroupBackend, MediaOptions, MemoryBackend, OutboundMedia,
        extract_candidates, to_outbound_media,
    },
    mediagroups_sqlite::SqliteBackend,
};

use crate::{
    Result,
    config::{BackendKind, MediaGroupsConfig},
    handlers::{
        decode_fragment, fragment_from_message, fragments_in_message, message_of_update, pinned_fragment,
        reply_fragment,
    },
};

/// Media group collection for one bot.
///
/// Feed it every inbound message and every successful outbound call result;
/// look groups up by message, reply or pin.
#[derive(Clone)]
pub struct MediaGroups {
    store: FragmentStore,
}

impl MediaGroups {
    pub fn new(store: FragmentStore) -> Self {
        Self { store }
    }

    /// Groups kept in process memory.
    pub fn in_memory() -> Self {
        Self::new(FragmentStore::new(Arc::new(MemoryBackend::new())))
    }

    /// Build the backend selected by `config`.
    pub async fn from_config(config: &MediaGroupsConfig) -> Result<Self> {
        let backend: Arc<dyn GroupBackend> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Sqlite => Arc::new(SqliteBackend::connect(&config.database_url).await?),
        };
        let store = match &config.key_prefix {
            Some(prefix) => FragmentStore::new(backend).with_key_prefix(prefix.clone()),
            None => FragmentStore::new(backend),
        };
        debug!(backend = ?config.backend, "media groups configured");
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &FragmentStore {
        &self.store
    }

    /// Store the message together with its replied-to and pinned messages.
    pub async fn ingest_message(&self, msg: &Message) -> Result<()> {
        let fragments = fragments_in_message(msg);
        self.store.upsert_batch(&fragments).await?;
        Ok(())
    }

    /// Store the message carried by `update`; other updates are ignored.
    pub async fn ingest_update(&self, update: &Update) -> Result<()> {
        match message_of_update(update) {
            Some(msg) => self.ingest_message(msg).await,
            None => Ok(()),
        }
    }

    /// Store messages returned by an outbound call.
    ///
    /// `call` is the Bot API or teloxide method name. Only pass results of
    /// calls that succeeded.
    pub async fn record_result<T>(&self, call: &str, result: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_value(result)?;
        let fragments: Vec<Fragment> = extract_candidates(call, &raw)
            .into_iter()
            .filter_map(|candidate| decode_fragment(call, &candidate))
            .collect();
        debug!(call, count = fragments.len(), "recording outbound call result");
        self.store.upsert_batch(&fragments).await?;
        Ok(())
    }

    /// The group `msg` belongs to.
    pub async fn for_message(&self, msg: &Message) -> Result<Option<Vec<Fragment>>> {
        let fragment = fragment_from_message(msg)?;
        self.group_of(Some(fragment)).await
    }

    /// The group of the message `msg` replies to.
    pub async fn for_reply(&self, msg: &Message) -> Result<Option<Vec<Fragment>>> {
        self.group_of(reply_fragment(msg)?).await
    }

    /// The group of the message pinned by `msg`.
    pub async fn for_pinned(&self, msg: &Message) -> Result<Option<Vec<Fragment>>> {
        self.group_of(pinned_fragment(msg)?).await
    }

    async fn group_of(&self, fragment: Option<Fragment>) -> Result<Option<Vec<Fragment>>> {
        match fragment.as_ref().and_then(Fragment::group_key) {
            Some(group_key) => Ok(self.store.get(group_key).await?),
            None => Ok(None),
        }
    }

    pub async fn get(&self, group_key: &str) -> Result<Option<Vec<Fragment>>> {
        Ok(self.store.get(group_key).await?)
    }

    pub async fn delete(&self, group_key: &str) -> Result<()> {
        Ok(self.store.delete(group_key).await?)
    }

    /// A stored group as `sendMediaGroup` input, or `None` if it is unknown.
    pub async fn input_media(
        &self,
        group_key: &str,
        options: &MediaOptions,
    ) -> Result<Option<Vec<OutboundMedia>>> {
        let group = self.store.get(group_key).await?;
        Ok(group.map(|fragments| to_outbound_media(&fragments, options)))
    }
}
