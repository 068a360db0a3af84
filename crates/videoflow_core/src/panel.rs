use crate::format::MetadataDisplay;
use crate::session::EditSession;
use crate::types::Effect;

pub const EXPORT_PRESETS: [&str; 2] = ["1080p MP4", "720p MP4"];
pub const TOOLS: [&str; 3] = ["Add Text", "Add Music", "Filters"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectButton {
    pub effect: Effect,
    pub label: &'static str,
    pub active: bool,
    pub enabled: bool,
}

/// A button without behaviour yet: it only reflects whether a video is
/// loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InertButton {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportButton {
    pub label: &'static str,
    pub enabled: bool,
    pub busy: bool,
}

/// What a click on the panel asks the session owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ToggleEffect(Effect),
    Export,
}

/// Click targets on the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelControl {
    Effect(Effect),
    Export,
    Preset(usize),
    Tool(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanelView {
    pub effects: Vec<EffectButton>,
    pub presets: Vec<InertButton>,
    pub tools: Vec<InertButton>,
    pub export: ExportButton,
    pub metadata: MetadataDisplay,
}

impl ControlPanelView {
    pub fn from_session(session: &EditSession) -> Self {
        let has_video = session.has_video();
        let processing = session.is_processing();

        let effects = Effect::ALL
            .iter()
            .map(|&effect| EffectButton {
                effect,
                label: effect.label(),
                active: session.is_active(effect),
                enabled: has_video,
            })
            .collect();

        let inert = |labels: &[&'static str]| {
            labels
                .iter()
                .map(|&label| InertButton {
                    label,
                    enabled: has_video,
                })
                .collect::<Vec<_>>()
        };

        Self {
            effects,
            presets: inert(&EXPORT_PRESETS),
            tools: inert(&TOOLS),
            export: ExportButton {
                label: if processing { "Exporting..." } else { "Export Video" },
                enabled: has_video && !processing,
                busy: processing,
            },
            metadata: MetadataDisplay::from_metadata(session.metadata()),
        }
    }

    /// Resolve a click. Disabled and inert controls dispatch nothing.
    pub fn click(&self, control: PanelControl) -> Option<PanelAction> {
        match control {
            PanelControl::Effect(effect) => self
                .effects
                .iter()
                .find(|b| b.effect == effect && b.enabled)
                .map(|_| PanelAction::ToggleEffect(effect)),
            PanelControl::Export => self.export.enabled.then_some(PanelAction::Export),
            PanelControl::Preset(_) | PanelControl::Tool(_) => None,
        }
    }

    /// True when every editing control is disabled.
    pub fn is_locked(&self) -> bool {
        !self.export.enabled
            && self.effects.iter().all(|b| !b.enabled)
            && self.presets.iter().all(|b| !b.enabled)
            && self.tools.iter().all(|b| !b.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileHandle, VideoMetadata};

    fn loaded_session() -> EditSession {
        let mut s = EditSession::new();
        let file = FileHandle::new("clip.mp4", "/tmp/clip.mp4", 10 * 1024 * 1024, "video/mp4");
        let meta = VideoMetadata::from_probe(&file, 65.0, 1920, 1080);
        s.set_video(file, meta);
        s
    }

    #[test]
    fn empty_session_locks_everything() {
        let view = ControlPanelView::from_session(&EditSession::new());
        assert!(view.is_locked());
        assert_eq!(view.metadata.resolution, "—");
        assert_eq!(view.metadata.duration, "—");
        assert_eq!(view.metadata.format, "—");
        assert_eq!(view.metadata.size, "—");
        assert_eq!(view.click(PanelControl::Effect(Effect::Blur)), None);
        assert_eq!(view.click(PanelControl::Export), None);
    }

    #[test]
    fn loaded_video_metadata_strings() {
        let view = ControlPanelView::from_session(&loaded_session());
        assert!(!view.is_locked());
        assert_eq!(view.metadata.resolution, "1920×1080");
        assert_eq!(view.metadata.duration, "1:05");
        assert_eq!(view.metadata.size, "10.0 MB");
        assert_eq!(view.metadata.format, "MP4");
    }

    #[test]
    fn effect_buttons_reflect_membership() {
        let mut s = loaded_session();
        s.toggle_effect(Effect::Blur);
        s.toggle_effect(Effect::Sepia);
        let view = ControlPanelView::from_session(&s);
        let active: Vec<_> = view
            .effects
            .iter()
            .filter(|b| b.active)
            .map(|b| b.label)
            .collect();
        assert_eq!(active, vec!["Blur", "Sepia"]);

        s.toggle_effect(Effect::Blur);
        let view = ControlPanelView::from_session(&s);
        let active: Vec<_> = view.effects.iter().filter(|b| b.active).map(|b| b.effect).collect();
        assert_eq!(active, vec![Effect::Sepia]);
    }

    #[test]
    fn export_button_while_processing() {
        let mut s = loaded_session();
        let idle = ControlPanelView::from_session(&s);
        assert_eq!(idle.export.label, "Export Video");
        assert_eq!(idle.click(PanelControl::Export), Some(PanelAction::Export));

        s.set_processing(true);
        let busy = ControlPanelView::from_session(&s);
        assert_eq!(busy.export.label, "Exporting...");
        assert!(busy.export.busy);
        assert_eq!(busy.click(PanelControl::Export), None);
        assert_eq!(
            busy.click(PanelControl::Effect(Effect::FadeIn)),
            Some(PanelAction::ToggleEffect(Effect::FadeIn))
        );
    }

    #[test]
    fn inert_controls_dispatch_nothing() {
        let view = ControlPanelView::from_session(&loaded_session());
        assert!(view.tools.iter().all(|t| t.enabled));
        assert_eq!(view.click(PanelControl::Tool(0)), None);
        assert_eq!(view.click(PanelControl::Preset(1)), None);
    }
}
