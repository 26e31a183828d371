use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use rust_embed::Embed;
use thiserror::Error;
use tracing::debug;

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("topic document not found: {0}")]
    NotFound(String),
    #[error("failed to read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {locator}: {message}")]
    Parse { locator: String, message: String },
    #[error("network error fetching {locator}: {message}")]
    Network { locator: String, message: String },
}

/// Where raw topic documents come from. Fetches are assumed idempotent, so
/// callers may cache by locator.
pub trait TopicSource {
    fn fetch(&self, locator: &str) -> Result<String, SourceError>;
}

impl<T: TopicSource + ?Sized> TopicSource for Box<T> {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        (**self).fetch(locator)
    }
}

impl<T: TopicSource + ?Sized> TopicSource for &T {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        (**self).fetch(locator)
    }
}

/// Reads documents from a directory on disk, e.g. a checked-out data folder.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let rel = Path::new(locator);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(rel))
    }
}

impl TopicSource for DirSource {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        let path = self
            .resolve(locator)
            .ok_or_else(|| SourceError::NotFound(locator.to_string()))?;
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SourceError::NotFound(locator.to_string())
            } else {
                SourceError::Io {
                    locator: locator.to_string(),
                    source: e,
                }
            }
        })
    }
}

/// The sample catalog compiled into the binary.
pub struct EmbeddedSource;

impl TopicSource for EmbeddedSource {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        let file = CatalogAssets::get(locator)
            .ok_or_else(|| SourceError::NotFound(locator.to_string()))?;
        String::from_utf8(file.data.into_owned()).map_err(|e| SourceError::Parse {
            locator: locator.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(feature = "network")]
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| SourceError::Network {
                locator: base_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[cfg(feature = "network")]
impl TopicSource for HttpSource {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        let url = format!("{}/{}", self.base_url, locator.trim_start_matches('/'));
        let network = |message: String| SourceError::Network {
            locator: locator.to_string(),
            message,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(locator.to_string()));
        }
        if !response.status().is_success() {
            return Err(network(format!("HTTP {}", response.status())));
        }
        response.text().map_err(|e| network(e.to_string()))
    }
}

/// Memoizes successful fetches per locator. Failures are not cached so a
/// flaky source gets another chance on the next assembly.
pub struct CachedSource<S> {
    inner: S,
    cache: RwLock<HashMap<String, String>>,
}

impl<S: TopicSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl<S: TopicSource> TopicSource for CachedSource<S> {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        if let Ok(cache) = self.cache.read()
            && let Some(hit) = cache.get(locator)
        {
            return Ok(hit.clone());
        }

        let fetched = self.inner.fetch(locator)?;
        debug!(locator, bytes = fetched.len(), "fetched topic document");
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(locator.to_string(), fetched.clone());
        }
        Ok(fetched)
    }
}
