use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::foundation::error::{GiftbeatError, GiftbeatResult};

const HANDLE_SCHEME: &str = "blob:giftbeat/";

/// Locally scoped reference to asset bytes (the engine's object-URL).
///
/// Handles are minted by [`ResourceRegistry`] and stay valid until released. Released handles
/// resolve to a decode error rather than dangling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wrap an externally supplied URL or path (hydrated projects).
    pub fn from_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL form used in serialized projects and as the decode-cache key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` for handles minted in-process (not meaningful across sessions).
    pub fn is_minted(&self) -> bool {
        self.0.starts_with(HANDLE_SCHEME)
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backing storage of a registered resource.
#[derive(Clone, Debug)]
pub enum ResourceBody {
    /// Bytes held in memory (uploads, export artifacts).
    Bytes(Arc<[u8]>),
    /// A file on disk, read lazily (projects hydrated from JSON).
    File(PathBuf),
}

impl ResourceBody {
    /// Load the full contents.
    pub fn read(&self) -> GiftbeatResult<Arc<[u8]>> {
        match self {
            Self::Bytes(b) => Ok(b.clone()),
            Self::File(p) => {
                let bytes =
                    std::fs::read(p).with_context(|| format!("read asset '{}'", p.display()))?;
                Ok(Arc::from(bytes))
            }
        }
    }
}

/// Tracks every live resource handle so that each acquire is paired with exactly one release.
///
/// Dropping the registry releases whatever is still live.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    live: HashMap<ResourceHandle, ResourceBody>,
    minted: u64,
    released: u64,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh handle for in-memory bytes.
    pub fn acquire_bytes(&mut self, bytes: impl Into<Arc<[u8]>>) -> ResourceHandle {
        let handle = ResourceHandle(format!("{HANDLE_SCHEME}{}", uuid::Uuid::new_v4()));
        self.live
            .insert(handle.clone(), ResourceBody::Bytes(bytes.into()));
        self.minted += 1;
        handle
    }

    /// Register an external URL, resolving it as a path below `root` when it is relative.
    ///
    /// Re-adopting a live URL is a no-op so hydrated items sharing a source share one entry.
    pub fn adopt_url(&mut self, url: &str, root: &Path) -> ResourceHandle {
        let handle = ResourceHandle::from_url(url);
        if !self.live.contains_key(&handle) {
            let path = Path::new(url);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };
            self.live.insert(handle.clone(), ResourceBody::File(path));
            self.minted += 1;
        }
        handle
    }

    /// Resolve a handle to its backing body.
    pub fn resolve(&self, handle: &ResourceHandle) -> GiftbeatResult<&ResourceBody> {
        self.live.get(handle).ok_or_else(|| {
            GiftbeatError::decode(format!("resource '{handle}' is not live (released?)"))
        })
    }

    /// Read the bytes behind a handle.
    pub fn read(&self, handle: &ResourceHandle) -> GiftbeatResult<Arc<[u8]>> {
        self.resolve(handle)?.read()
    }

    /// Release one handle. Returns `false` when it was not live.
    pub fn release(&mut self, handle: &ResourceHandle) -> bool {
        let removed = self.live.remove(handle).is_some();
        if removed {
            self.released += 1;
            tracing::debug!(%handle, "released resource");
        }
        removed
    }

    /// Release everything still live; returns how many handles were released.
    pub fn release_all(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        self.released += n as u64;
        n
    }

    /// Take over every live handle of `other`; used to commit a staged hydration.
    pub fn absorb(&mut self, mut other: ResourceRegistry) {
        let live = std::mem::take(&mut other.live);
        for (handle, body) in live {
            if self.live.insert(handle, body).is_none() {
                self.minted += 1;
            }
        }
    }

    /// Whether `handle` is currently live.
    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.live.contains_key(handle)
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Lifetime acquire/release totals.
    pub fn counters(&self) -> (u64, u64) {
        (self.minted, self.released)
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        let n = self.release_all();
        if n > 0 {
            tracing::debug!(count = n, "released live resources at teardown");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/library/resources.rs"]
mod tests;
