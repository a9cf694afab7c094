//! Fetching and memoization of section data tiles, independent of
//! rendering.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::memo::MemoCache;
use crate::section::Section;
use crate::Result;

/// Requests above this level reuse the coarsest available dataset: finer
/// tiles simply redraw the level-8 geometry at higher resolution.
pub const MAX_SECTION_LEVEL: u8 = 8;

/// Section payloads change rarely; keep them around longer than rendered
/// tiles.
pub const SECTION_TTL: Duration = Duration::from_secs(60);

/// Synchronous, non-blocking access to section data for the tile renderer.
///
/// `Ok(None)` means the fetch is still in flight; an `Err` means the key is
/// currently broken and the caller should mark the tile accordingly.
pub trait SectionProvider {
    fn get(&self, level: u8, x: u32, y: u32) -> Result<Option<Arc<Section>>>;
}

impl<P: SectionProvider + ?Sized> SectionProvider for Arc<P> {
    fn get(&self, level: u8, x: u32, y: u32) -> Result<Option<Arc<Section>>> {
        (**self).get(level, x, y)
    }
}

/// The async seam to wherever section payloads actually live.
///
/// `Ok(None)` signals resource-not-found, which the source turns into a
/// well-formed empty section.
#[async_trait]
pub trait SectionFetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &str) -> Result<Option<Section>>;
}

/// Fetches and quantizes geographic data tiles through the memo cache, so
/// any number of layers and frames share one in-flight request per tile.
pub struct SectionSource<F> {
    cache: MemoCache<String, Section>,
    fetcher: Arc<F>,
}

impl<F: SectionFetcher> SectionSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(MemoCache::new(SECTION_TTL), fetcher)
    }

    /// Uses an existing memo cache, letting several sources (or tests with
    /// a manual clock) share storage.
    pub fn with_cache(cache: MemoCache<String, Section>, fetcher: F) -> Self {
        Self {
            cache,
            fetcher: Arc::new(fetcher),
        }
    }

    /// The deterministic resource key for one data tile.
    pub fn key(level: u8, x: u32, y: u32) -> String {
        format!("section_{level:03}_{x:03}_{y:03}")
    }

    /// Rewrites an address above the maximum data level to its ancestor at
    /// that level.
    fn clamp_level(level: u8, x: u32, y: u32) -> (u8, u32, u32) {
        if level <= MAX_SECTION_LEVEL {
            (level, x, y)
        } else {
            let shift = level - MAX_SECTION_LEVEL;
            (MAX_SECTION_LEVEL, x >> shift, y >> shift)
        }
    }
}

impl<F: SectionFetcher> SectionProvider for SectionSource<F> {
    fn get(&self, level: u8, x: u32, y: u32) -> Result<Option<Arc<Section>>> {
        let (level, x, y) = Self::clamp_level(level, x, y);
        let key = Self::key(level, x, y);

        let fetcher = self.fetcher.clone();
        let fetch_key = key.clone();
        self.cache.poll(key, Some(SECTION_TTL), move || async move {
            match fetcher.fetch(&fetch_key).await? {
                Some(section) => Ok(section),
                None => Ok(Section::default()),
            }
        })
    }
}

/// Fetches `sections/section_LLL_XXX_YYY.json` resources over HTTP.
pub struct HttpSectionFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSectionFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/sections/{key}.json", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SectionFetcher for HttpSectionFetcher {
    async fn fetch(&self, key: &str) -> Result<Option<Section>> {
        let response = self
            .client
            .get(self.url(key))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }
}
