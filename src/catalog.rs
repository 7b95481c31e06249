//! The selectable-reference catalog.
//!
//! The catalog lives in the host's node metadata document: the LoRA list is
//! the option list of another node type's input. [`CatalogCache`] holds it for
//! the rest of the process once one fetch has succeeded.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::{Mutex, OnceLock};

/// Errors raised while fetching or reading the catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The request could not be completed
    #[error("catalog request failed: {0}")]
    Http(String),
    /// The response body could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The response was not valid JSON
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// None of the known locations holds a list of names
    #[error("no reference list found in node metadata")]
    Missing,
}

/// A location in the node metadata document that may hold the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLocation {
    /// Node type declaring the input
    pub node_type: &'static str,
    /// Required input whose first element is the option list
    pub input: &'static str,
}

/// Locations probed in order.
pub const CATALOG_LOCATIONS: &[CatalogLocation] = &[
    CatalogLocation {
        node_type: "WanVideoLoraSelect",
        input: "lora",
    },
    CatalogLocation {
        node_type: "LoraLoader",
        input: "lora_name",
    },
];

/// Pulls the reference list out of a node metadata document.
pub fn extract_catalog(info: &Value) -> Option<Vec<String>> {
    CATALOG_LOCATIONS.iter().find_map(|loc| {
        let options = info
            .get(loc.node_type)?
            .get("input")?
            .get("required")?
            .get(loc.input)?
            .get(0)?
            .as_array()?;
        Some(
            options
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    })
}

/// Something that can deliver the host's node metadata document.
pub trait CatalogSource: Send + Sync {
    /// Fetches the metadata document.
    fn fetch(&self) -> BoxFuture<'_, Result<Value, CatalogError>>;
}

/// Process-wide catalog cache. Empty until a fetch succeeds, never refreshed after.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: Mutex<Option<Vec<String>>>,
}

impl CatalogCache {
    /// Creates an empty cache.
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(None),
        }
    }

    /// Returns true once a fetch has succeeded.
    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns the cached list, or an empty list while unpopulated.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone().unwrap_or_default()
    }

    /// Stores `entries` unless the cache is already populated.
    pub fn populate(&self, entries: Vec<String>) {
        let mut guard = self.lock();
        if guard.is_none() {
            log::info!("Catalog populated with {} references", entries.len());
            *guard = Some(entries);
        }
    }

    /// Returns the cached list, fetching from `source` only while unpopulated.
    ///
    /// A failed fetch is logged and leaves the cache empty, so the selector
    /// degrades to offering only "None".
    pub async fn get_or_fetch(&self, source: &dyn CatalogSource) -> Vec<String> {
        if self.is_populated() {
            return self.snapshot();
        }
        let result = source
            .fetch()
            .await
            .and_then(|info| extract_catalog(&info).ok_or(CatalogError::Missing));
        match result {
            Ok(entries) => self.populate(entries),
            Err(err) => log::error!("Failed to load LoRA catalog: {err}"),
        }
        self.snapshot()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<String>>> {
        // A poisoned lock still holds a consistent Option.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The cache shared by every widget in the process.
pub fn global() -> &'static CatalogCache {
    static CACHE: OnceLock<CatalogCache> = OnceLock::new();
    CACHE.get_or_init(CatalogCache::new)
}

/// Fetches `<base_url>/object_info` over HTTP on a blocking worker.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    base_url: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpCatalogSource {
    /// Creates a source for the host at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Full URL of the metadata endpoint.
    pub fn url(&self) -> String {
        format!("{}/object_info", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CatalogSource for HttpCatalogSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Value, CatalogError>> {
        let url = self.url();
        Box::pin(async move {
            let joined = tokio::task::spawn_blocking(move || -> Result<Value, CatalogError> {
                log::debug!("Fetching catalog from {url}");
                let response = ureq::get(&url)
                    .call()
                    .map_err(|e| CatalogError::Http(e.to_string()))?;
                let body = response.into_string()?;
                Ok(serde_json::from_str(&body)?)
            })
            .await;
            match joined {
                Ok(result) => result,
                Err(e) => Err(CatalogError::Http(e.to_string())),
            }
        })
    }
}
