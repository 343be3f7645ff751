use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{GiftbeatError, GiftbeatResult},
    library::resources::{ResourceHandle, ResourceRegistry},
};

/// Identifier of a [`LibraryItem`], minted at ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LibraryItemId(pub String);

impl LibraryItemId {
    pub(crate) fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LibraryItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset kind, classified from MIME type at ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video with an intrinsic duration.
    Video,
}

/// Whether video uploads are accepted at the ingestion boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPolicy {
    /// Reject video files with an explanatory message (images in the batch still succeed).
    #[default]
    Disabled,
    /// Accept video files.
    Enabled,
}

/// One ingested asset.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryItem {
    /// Unique id.
    pub id: LibraryItemId,
    /// Image or video.
    pub kind: MediaKind,
    /// Owned handle to the asset bytes.
    pub source: ResourceHandle,
    /// Original display file name, if known.
    pub file_name: Option<String>,
    /// Intrinsic duration in seconds (video only, once metadata is known).
    pub duration: Option<f64>,
}

/// A file offered for ingestion.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    /// Display name.
    pub name: String,
    /// MIME type as reported by the uploader (may be empty).
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    /// Build an incoming file from raw parts.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> GiftbeatResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read upload '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            mime: mime_from_extension(path).to_string(),
            name,
            bytes,
        })
    }

    fn classify(&self) -> Option<MediaKind> {
        let mime = self.mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Guess a MIME type from a file extension; unknown extensions map to an opaque type.
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Why a single file in a batch was not ingested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Name of the rejected file.
    pub file_name: String,
    /// User-facing reason.
    pub reason: String,
}

/// Outcome of [`MediaLibrary::add_files`]; rejections never abort the batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    /// Ids of accepted items in batch order.
    pub accepted: Vec<LibraryItemId>,
    /// Per-file rejections in batch order.
    pub rejected: Vec<Rejection>,
}

/// Ordered, id-keyed store of ingested assets.
#[derive(Clone, Debug, Default)]
pub struct MediaLibrary {
    items: Vec<LibraryItem>,
}

impl MediaLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a batch, minting one resource handle per accepted file.
    pub fn add_files(
        &mut self,
        files: impl IntoIterator<Item = IncomingFile>,
        resources: &mut ResourceRegistry,
        policy: VideoPolicy,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        for file in files {
            let kind = match (file.classify(), policy) {
                (Some(MediaKind::Video), VideoPolicy::Disabled) => {
                    tracing::warn!(file = %file.name, "video upload rejected (disabled)");
                    report.rejected.push(Rejection {
                        file_name: file.name,
                        reason: "video clips are currently disabled; please upload images"
                            .to_string(),
                    });
                    continue;
                }
                (Some(kind), _) => kind,
                (None, _) => {
                    tracing::warn!(file = %file.name, mime = %file.mime, "unsupported upload");
                    report.rejected.push(Rejection {
                        reason: format!("{} is not a supported image file", file.name),
                        file_name: file.name,
                    });
                    continue;
                }
            };

            let source = resources.acquire_bytes(file.bytes);
            let item = LibraryItem {
                id: LibraryItemId::mint(),
                kind,
                source,
                file_name: Some(file.name),
                duration: None,
            };
            report.accepted.push(item.id.clone());
            self.items.push(item);
        }
        report
    }

    /// Insert an already-built item (hydration). Duplicate ids are rejected.
    pub fn insert(&mut self, item: LibraryItem) -> GiftbeatResult<()> {
        if self.get(&item.id).is_some() {
            return Err(GiftbeatError::validation(format!(
                "duplicate library item id '{}'",
                item.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove an item and release its resource. Returns the removed item.
    ///
    /// Dependent timeline clips are not touched here; callers owning a timeline must cascade
    /// (see `EditorSession::remove_library_item`).
    pub fn remove(
        &mut self,
        id: &LibraryItemId,
        resources: &mut ResourceRegistry,
    ) -> Option<LibraryItem> {
        let idx = self.items.iter().position(|it| &it.id == id)?;
        let item = self.items.remove(idx);
        if !self.items.iter().any(|it| it.source == item.source) {
            resources.release(&item.source);
        }
        Some(item)
    }

    /// Record a video's intrinsic duration once its metadata is known.
    pub fn resolve_video_duration(&mut self, id: &LibraryItemId, secs: f64) -> GiftbeatResult<()> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(GiftbeatError::validation(
                "video duration must be finite and > 0",
            ));
        }
        let item = self
            .items
            .iter_mut()
            .find(|it| &it.id == id)
            .ok_or_else(|| GiftbeatError::validation(format!("unknown library item '{id}'")))?;
        if item.kind != MediaKind::Video {
            return Err(GiftbeatError::validation(
                "only video items carry an intrinsic duration",
            ));
        }
        item.duration = Some(secs);
        Ok(())
    }

    /// Lookup by id.
    pub fn get(&self, id: &LibraryItemId) -> Option<&LibraryItem> {
        self.items.iter().find(|it| &it.id == id)
    }

    /// Items in ingestion order.
    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/library/media_library.rs"]
mod tests;
