use crate::{
    foundation::error::{GiftbeatError, GiftbeatResult},
    library::media_library::{LibraryItemId, MediaKind, MediaLibrary},
    timeline::transition::{DEFAULT_TRANSITION_SECS, TransitionKind, clamp_transition_secs},
};

/// Shortest image clip, in seconds.
pub const MIN_CLIP_SECS: f64 = 0.5;
/// Longest image clip, in seconds.
pub const MAX_CLIP_SECS: f64 = 10.0;
/// Duration given to a newly added image clip.
pub const DEFAULT_IMAGE_CLIP_SECS: f64 = 3.0;
/// Duration given to a video clip whose metadata has not been reported yet.
pub const PROVISIONAL_VIDEO_SECS: f64 = 3.0;

/// Identifier of a [`TimelineClip`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub(crate) fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction for [`Timeline::move_clip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the start of the timeline.
    Up,
    /// Towards the end of the timeline.
    Down,
}

/// Transition settings attached to a clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTransition {
    /// Blend kind into the next clip.
    pub kind: TransitionKind,
    /// Blend length in seconds; `None` reads as [`DEFAULT_TRANSITION_SECS`].
    pub secs: Option<f64>,
}

impl ClipTransition {
    /// Hard cut.
    pub fn none() -> Self {
        Self {
            kind: TransitionKind::None,
            secs: None,
        }
    }

    /// Validated transition with clamped length.
    pub fn new(kind: TransitionKind, secs: f64) -> GiftbeatResult<Self> {
        Ok(Self {
            kind,
            secs: Some(clamp_transition_secs(secs)?),
        })
    }
}

/// Placement of one library item on the timeline.
///
/// `start_time` is derived; only [`Timeline`] writes it.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineClip {
    id: ClipId,
    library_item_id: LibraryItemId,
    media: MediaKind,
    duration: f64,
    start_time: f64,
    transition: ClipTransition,
}

impl TimelineClip {
    /// Clip id.
    pub fn id(&self) -> &ClipId {
        &self.id
    }

    /// Referenced library item (weak reference by id).
    pub fn library_item_id(&self) -> &LibraryItemId {
        &self.library_item_id
    }

    /// Media kind of the referenced item when the clip was placed.
    pub fn media(&self) -> MediaKind {
        self.media
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Start time in seconds (prefix sum of preceding durations).
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Exclusive end time in seconds.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Transition settings into the next clip.
    pub fn transition(&self) -> ClipTransition {
        self.transition
    }

    /// Effective transition length, with the default applied.
    pub fn transition_secs(&self) -> f64 {
        self.transition.secs.unwrap_or(DEFAULT_TRANSITION_SECS)
    }
}

/// Ordered sequence of clips with prefix-sum start times.
///
/// Every mutating operation ends in [`Timeline::reflow`], so
/// `start_time[i] == sum(duration[0..i])` holds between calls.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    clips: Vec<TimelineClip>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clip for `item_id` at the current end of the timeline.
    pub fn add_clip(
        &mut self,
        library: &MediaLibrary,
        item_id: &LibraryItemId,
        transition: ClipTransition,
    ) -> GiftbeatResult<ClipId> {
        let item = library.get(item_id).ok_or_else(|| {
            GiftbeatError::validation(format!("unknown library item '{item_id}'"))
        })?;
        let duration = match item.kind {
            MediaKind::Image => DEFAULT_IMAGE_CLIP_SECS,
            MediaKind::Video => item.duration.unwrap_or(PROVISIONAL_VIDEO_SECS),
        };
        let id = ClipId::mint();
        self.clips.push(TimelineClip {
            id: id.clone(),
            library_item_id: item_id.clone(),
            media: item.kind,
            duration,
            start_time: 0.0,
            transition,
        });
        self.reflow();
        Ok(id)
    }

    /// Append a pre-identified clip; durations are clamped for images. Used by hydration.
    pub(crate) fn push_restored(
        &mut self,
        id: ClipId,
        item_id: LibraryItemId,
        media: MediaKind,
        duration: f64,
        transition: ClipTransition,
    ) -> GiftbeatResult<()> {
        if self.index_of(&id).is_some() {
            return Err(GiftbeatError::validation(format!(
                "duplicate timeline clip id '{id}'"
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(GiftbeatError::validation(format!(
                "clip '{id}' has an invalid duration"
            )));
        }
        let duration = match media {
            MediaKind::Image => duration.clamp(MIN_CLIP_SECS, MAX_CLIP_SECS),
            MediaKind::Video => duration,
        };
        self.clips.push(TimelineClip {
            id,
            library_item_id: item_id,
            media,
            duration,
            start_time: 0.0,
            transition,
        });
        self.reflow();
        Ok(())
    }

    /// Remove one clip.
    pub fn remove_clip(&mut self, id: &ClipId) -> GiftbeatResult<TimelineClip> {
        let idx = self.require(id)?;
        let clip = self.clips.remove(idx);
        self.reflow();
        Ok(clip)
    }

    /// Remove every clip referencing `item_id`; returns how many were removed.
    pub fn remove_clips_for(&mut self, item_id: &LibraryItemId) -> usize {
        let before = self.clips.len();
        self.clips.retain(|c| &c.library_item_id != item_id);
        self.reflow();
        before - self.clips.len()
    }

    /// Swap a clip with its neighbour. Returns `false` (no-op) at the boundaries.
    pub fn move_clip(&mut self, id: &ClipId, dir: MoveDirection) -> GiftbeatResult<bool> {
        let idx = self.require(id)?;
        let target = match dir {
            MoveDirection::Up if idx > 0 => idx - 1,
            MoveDirection::Down if idx + 1 < self.clips.len() => idx + 1,
            _ => return Ok(false),
        };
        self.clips.swap(idx, target);
        self.reflow();
        Ok(true)
    }

    /// Set an image clip's duration, clamped to `[MIN_CLIP_SECS, MAX_CLIP_SECS]`.
    ///
    /// Video clips keep their source duration; the call is rejected for them.
    pub fn set_duration(&mut self, id: &ClipId, secs: f64) -> GiftbeatResult<f64> {
        if !secs.is_finite() {
            return Err(GiftbeatError::validation("clip duration must be finite"));
        }
        let idx = self.require(id)?;
        let clip = &mut self.clips[idx];
        if clip.media == MediaKind::Video {
            return Err(GiftbeatError::validation(
                "video clip duration follows its source and cannot be edited",
            ));
        }
        clip.duration = secs.clamp(MIN_CLIP_SECS, MAX_CLIP_SECS);
        let stored = clip.duration;
        self.reflow();
        Ok(stored)
    }

    /// Set a clip's transition. Without `secs`, the previous length is kept (or the default).
    pub fn set_transition(
        &mut self,
        id: &ClipId,
        kind: TransitionKind,
        secs: Option<f64>,
    ) -> GiftbeatResult<ClipTransition> {
        let secs = secs.map(clamp_transition_secs).transpose()?;
        let idx = self.require(id)?;
        let clip = &mut self.clips[idx];
        clip.transition = ClipTransition {
            kind,
            secs: Some(
                secs.or(clip.transition.secs)
                    .unwrap_or(DEFAULT_TRANSITION_SECS),
            ),
        };
        let out = clip.transition;
        self.reflow();
        Ok(out)
    }

    /// Correct every clip of a video item once its intrinsic duration is known.
    pub fn apply_video_duration(&mut self, item_id: &LibraryItemId, secs: f64) -> usize {
        let mut n = 0;
        for clip in self
            .clips
            .iter_mut()
            .filter(|c| &c.library_item_id == item_id && c.media == MediaKind::Video)
        {
            clip.duration = secs;
            n += 1;
        }
        self.reflow();
        n
    }

    /// Replace all clips (slideshow builder). Start times are recomputed.
    pub(crate) fn replace_all(&mut self, clips: Vec<(LibraryItemId, f64, ClipTransition)>) {
        self.clips = clips
            .into_iter()
            .map(|(item, duration, transition)| TimelineClip {
                id: ClipId::mint(),
                library_item_id: item,
                media: MediaKind::Image,
                duration: duration.clamp(MIN_CLIP_SECS, MAX_CLIP_SECS),
                start_time: 0.0,
                transition,
            })
            .collect();
        self.reflow();
    }

    /// End time of the last clip, or 0 when empty.
    pub fn total_duration(&self) -> f64 {
        self.clips.last().map(TimelineClip::end_time).unwrap_or(0.0)
    }

    /// Index of the clip covering `t` under half-open `[start, end)` intervals.
    ///
    /// Times at or past the end resolve to the last clip so the final frame stays renderable.
    pub fn index_at(&self, t: f64) -> Option<usize> {
        if self.clips.is_empty() || !t.is_finite() {
            return None;
        }
        if t >= self.total_duration() {
            return Some(self.clips.len() - 1);
        }
        let t = t.max(0.0);
        // Start times are sorted; find the last clip starting at or before t.
        let idx = self.clips.partition_point(|c| c.start_time <= t);
        Some(idx.saturating_sub(1))
    }

    /// Clips in order.
    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    /// Lookup by id.
    pub fn get(&self, id: &ClipId) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    /// Position of a clip.
    pub fn index_of(&self, id: &ClipId) -> Option<usize> {
        self.clips.iter().position(|c| &c.id == id)
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    fn require(&self, id: &ClipId) -> GiftbeatResult<usize> {
        self.index_of(id)
            .ok_or_else(|| GiftbeatError::validation(format!("unknown timeline clip '{id}'")))
    }

    fn reflow(&mut self) {
        let mut t = 0.0;
        for clip in &mut self.clips {
            clip.start_time = t;
            t += clip.duration;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
