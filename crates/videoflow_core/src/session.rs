use crate::error::Result;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What changed in the last session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    VideoLoaded,
    TimeChanged,
    EffectToggled { effect: Effect, active: bool },
    ProcessingChanged,
}

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&SessionChange, &EditSession)>;

/// State of the single editing session: the loaded video, the playhead,
/// the active effects and whether an export is running.
///
/// Every mutator is total. Listeners are called synchronously after each
/// transition, in the order they subscribed.
pub struct EditSession {
    video: Option<LoadedVideo>,
    current_time: f64,
    active_effects: BTreeSet<Effect>,
    is_processing: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("video", &self.video)
            .field("current_time", &self.current_time)
            .field("active_effects", &self.active_effects)
            .field("is_processing", &self.is_processing)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            video: None,
            current_time: 0.0,
            active_effects: BTreeSet::new(),
            is_processing: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    // -- readers ------------------------------------------------------------

    pub fn video(&self) -> Option<&LoadedVideo> {
        self.video.as_ref()
    }

    pub fn file(&self) -> Option<&FileHandle> {
        self.video.as_ref().map(|v| &v.file)
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.video.as_ref().map(|v| &v.metadata)
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    /// Duration of the loaded video, 0 when nothing is loaded.
    pub fn duration(&self) -> f64 {
        self.metadata().map(|m| m.duration).unwrap_or(0.0)
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn active_effects(&self) -> &BTreeSet<Effect> {
        &self.active_effects
    }

    pub fn is_active(&self, effect: Effect) -> bool {
        self.active_effects.contains(&effect)
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    // -- mutators -----------------------------------------------------------

    /// Replace the loaded file and its metadata and rewind to 0.
    pub fn set_video(&mut self, file: FileHandle, metadata: VideoMetadata) {
        tracing::info!(
            name = %file.name,
            duration = metadata.duration,
            width = metadata.width,
            height = metadata.height,
            "Video loaded"
        );
        self.video = Some(LoadedVideo { file, metadata });
        self.current_time = 0.0;
        self.emit(SessionChange::VideoLoaded);
    }

    /// Move the playhead. The stored value is always within
    /// `[0, duration]`; NaN lands on 0.
    pub fn set_current_time(&mut self, t: f64) {
        let clamped = clamp_time(t, self.duration());
        if clamped == self.current_time {
            return;
        }
        self.current_time = clamped;
        tracing::trace!(time = clamped, "Playhead moved");
        self.emit(SessionChange::TimeChanged);
    }

    /// Flip membership of `effect`. Returns whether it is now active.
    pub fn toggle_effect(&mut self, effect: Effect) -> bool {
        let active = if self.active_effects.remove(&effect) {
            false
        } else {
            self.active_effects.insert(effect);
            true
        };
        tracing::debug!(%effect, active, "Effect toggled");
        self.emit(SessionChange::EffectToggled { effect, active });
        active
    }

    pub fn set_processing(&mut self, processing: bool) {
        if self.is_processing == processing {
            return;
        }
        self.is_processing = processing;
        tracing::debug!(processing, "Processing flag changed");
        self.emit(SessionChange::ProcessingChanged);
    }

    // -- listeners ----------------------------------------------------------

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&SessionChange, &EditSession) + 'static,
    ) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, change: SessionChange) {
        // Listeners see `&self`, so they are taken out for the duration of
        // the call. Subscriptions made from inside a listener are kept.
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener(&change, self);
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    // -- snapshot -----------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            file_name: self.file().map(|f| f.name.clone()),
            metadata: self.metadata().cloned(),
            current_time: self.current_time,
            active_effects: self.active_effects.iter().copied().collect(),
            is_processing: self.is_processing,
        }
    }
}

/// Serialisable view of a session, without listeners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub file_name: Option<String>,
    pub metadata: Option<VideoMetadata>,
    pub current_time: f64,
    pub active_effects: Vec<Effect>,
    pub is_processing: bool,
}

impl SessionSnapshot {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Clamp `t` into `[0, duration]`. NaN and a non-positive duration both
/// give 0.
pub fn clamp_time(t: f64, duration: f64) -> f64 {
    if t.is_nan() {
        return 0.0;
    }
    let upper = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    };
    t.clamp(0.0, upper)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
