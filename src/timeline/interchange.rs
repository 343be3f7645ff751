use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{GiftbeatError, GiftbeatResult},
    library::{
        media_library::{LibraryItem, LibraryItemId, MediaKind, MediaLibrary},
        resources::ResourceRegistry,
    },
    timeline::{
        model::{ClipId, ClipTransition, Timeline},
        transition::{TransitionKind, clamp_transition_secs},
    },
};

/// Serializable projection of a [`LibraryItem`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedLibraryItem {
    /// Item id.
    pub id: String,
    /// `"image"` or `"video"`.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Resource URL (minted handle or file path).
    pub url: String,
    /// Intrinsic duration for videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Display file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Serializable projection of a timeline clip.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTimelineItem {
    /// Clip id.
    pub id: String,
    /// Referenced library item id.
    pub library_item_id: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Derived start time in seconds (ignored on hydration).
    pub start_time: f64,
    /// Transition into the next clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionKind>,
    /// Transition length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_duration: Option<f64>,
}

/// The `(timelineItems, libraryItems)` pair exchanged with the host.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    /// Library items in ingestion order.
    #[serde(default)]
    pub library_items: Vec<SerializedLibraryItem>,
    /// Timeline clips in playback order.
    #[serde(default)]
    pub timeline_items: Vec<SerializedTimelineItem>,
}

impl ProjectSnapshot {
    /// Project the current engine state.
    pub fn capture(library: &MediaLibrary, timeline: &Timeline) -> Self {
        Self {
            library_items: library
                .items()
                .iter()
                .map(|it| SerializedLibraryItem {
                    id: it.id.0.clone(),
                    kind: it.kind,
                    url: it.source.as_str().to_string(),
                    duration: it.duration,
                    file_name: it.file_name.clone(),
                })
                .collect(),
            timeline_items: timeline
                .clips()
                .iter()
                .map(|c| {
                    let tr = c.transition();
                    SerializedTimelineItem {
                        id: c.id().0.clone(),
                        library_item_id: c.library_item_id().0.clone(),
                        duration: c.duration(),
                        start_time: c.start_time(),
                        transition: Some(tr.kind),
                        transition_duration: tr.secs,
                    }
                })
                .collect(),
        }
    }

    /// Parse a project JSON file.
    pub fn from_path(path: &Path) -> GiftbeatResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read project '{}'", path.display()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Pretty JSON form.
    pub fn to_json_pretty(&self) -> GiftbeatResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of rebuilding engine state from a [`ProjectSnapshot`].
#[derive(Debug, Default)]
pub struct Hydrated {
    /// Rebuilt library.
    pub library: MediaLibrary,
    /// Rebuilt timeline with recomputed start times.
    pub timeline: Timeline,
    /// Non-fatal problems (dropped dangling clips, clamped values).
    pub warnings: Vec<String>,
}

/// Rebuild library and timeline, registering every URL in `resources`.
///
/// Relative URLs resolve below `root`. Clips pointing at unknown items are dropped; stored start
/// times are ignored and recomputed from durations.
pub fn hydrate(
    snapshot: &ProjectSnapshot,
    root: &Path,
    resources: &mut ResourceRegistry,
) -> GiftbeatResult<Hydrated> {
    let mut out = Hydrated::default();

    for it in &snapshot.library_items {
        if it.id.trim().is_empty() {
            return Err(GiftbeatError::validation("library item id must be non-empty"));
        }
        let source = resources.adopt_url(&it.url, root);
        out.library.insert(LibraryItem {
            id: LibraryItemId(it.id.clone()),
            kind: it.kind,
            source,
            file_name: it.file_name.clone(),
            duration: it.duration.filter(|d| d.is_finite() && *d > 0.0),
        })?;
    }

    for it in &snapshot.timeline_items {
        let item_id = LibraryItemId(it.library_item_id.clone());
        let Some(item) = out.library.get(&item_id) else {
            out.warnings.push(format!(
                "dropped timeline item '{}': library item '{}' does not exist",
                it.id, it.library_item_id
            ));
            continue;
        };
        let transition = match (it.transition, it.transition_duration) {
            (None, _) => ClipTransition::none(),
            (Some(kind), None) => ClipTransition { kind, secs: None },
            (Some(kind), Some(d)) if kind.is_blend() && d > 0.0 => {
                let clamped = clamp_transition_secs(d)?;
                if clamped != d {
                    out.warnings.push(format!(
                        "clamped transition of '{}' from {d}s to {clamped}s",
                        it.id
                    ));
                }
                ClipTransition {
                    kind,
                    secs: Some(clamped),
                }
            }
            (Some(kind), Some(_)) => ClipTransition { kind, secs: None },
        };
        let kind = item.kind;
        out.timeline.push_restored(
            ClipId(it.id.clone()),
            item_id,
            kind,
            it.duration,
            transition,
        )?;
    }

    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/interchange.rs"]
mod tests;
