use crate::assembler::RenderSettings;
use crate::config::DashboardConfig;
use crate::store::{DatasetStore, LoadError, LoadOptions, Strictness};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Shared by every request worker. The only state that outlives a request is
/// the dataset, and it is swapped whole on reload, never edited.
pub struct AppState {
    store: RwLock<Arc<DatasetStore>>,
    data_path: PathBuf,
    strictness: Strictness,
    pub settings: RenderSettings,
}

impl AppState {
    pub fn new(
        store: DatasetStore,
        data_path: impl Into<PathBuf>,
        strictness: Strictness,
        settings: RenderSettings,
    ) -> Self {
        Self {
            store: RwLock::new(Arc::new(store)),
            data_path: data_path.into(),
            strictness,
            settings,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, LoadError> {
        let store = DatasetStore::load_path(&config.data.path, &config.load_options())?;
        Ok(Self::new(
            store,
            config.data.path.clone(),
            config.strictness(),
            config.render_settings(),
        ))
    }

    /// The current dataset. A render holds on to this one `Arc` for its whole
    /// cycle, so a concurrent reload cannot change what it sees.
    pub fn store(&self) -> Arc<DatasetStore> {
        let guard = self.store.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Re-reads the data file and swaps the new dataset in. On failure the old
    /// dataset stays in place.
    pub fn reload(&self) -> Result<Arc<DatasetStore>, LoadError> {
        let options = LoadOptions {
            strictness: self.strictness,
            ..LoadOptions::default()
        };
        let fresh = Arc::new(DatasetStore::load_path(&self.data_path, &options)?);

        let mut guard = self.store.write().unwrap_or_else(|p| p.into_inner());
        *guard = Arc::clone(&fresh);
        info!(records = fresh.len(), "dataset reloaded");
        Ok(fresh)
    }
}
