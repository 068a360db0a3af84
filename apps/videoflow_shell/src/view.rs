//! Text rendering of the editor views.

use videoflow_core::format::clock;
use videoflow_core::notify::{Notification, NotificationLevel};
use videoflow_core::panel::{ControlPanelView, InertButton};
use videoflow_core::session::EditSession;
use videoflow_core::timeline::{TimelineView, TOOL_BUTTONS, ZOOM_LABEL};

const TRACK_WIDTH: usize = 40;
const BAR_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn notification(n: &Notification) -> String {
    let tag = match n.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };
    format!("[{tag}] {}", n.message)
}

fn button(label: &str, enabled: bool, active: bool) -> String {
    match (enabled, active) {
        (false, _) => format!("({label})"),
        (true, true) => format!("[*{label}]"),
        (true, false) => format!("[{label}]"),
    }
}

fn inert_row(buttons: &[InertButton]) -> String {
    buttons
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}.{}", i + 1, button(b.label, b.enabled, false)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn panel(view: &ControlPanelView) -> String {
    let effects = view
        .effects
        .iter()
        .map(|b| button(b.label, b.enabled, b.active))
        .collect::<Vec<_>>()
        .join(" ");
    let m = &view.metadata;

    [
        format!("Effects:  {effects}"),
        format!("Export:   {}", inert_row(&view.presets)),
        format!("Tools:    {}", inert_row(&view.tools)),
        format!("          {}", button(view.export.label, view.export.enabled, view.export.busy)),
        format!("Resolution: {}", m.resolution),
        format!("Duration:   {}", m.duration),
        format!("Format:     {}", m.format),
        format!("Size:       {}", m.size),
    ]
    .join("\n")
}

fn track(playhead: f64) -> String {
    let head = ((playhead * TRACK_WIDTH as f64).round() as usize).min(TRACK_WIDTH);
    (0..=TRACK_WIDTH)
        .map(|i| match i.cmp(&head) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '|',
            std::cmp::Ordering::Greater => '-',
        })
        .collect()
}

fn audio_lane(bars: &[f32]) -> String {
    bars.iter()
        .map(|h| {
            let step = ((h - 4.0) / 12.0 * BAR_GLYPHS.len() as f32) as usize;
            BAR_GLYPHS[step.min(BAR_GLYPHS.len() - 1)]
        })
        .collect()
}

pub fn timeline(view: &TimelineView) -> String {
    let tools = TOOL_BUTTONS.map(|t| format!("[{t}]")).join(" ");
    [
        format!("{tools}  {ZOOM_LABEL}  {}", view.duration_label),
        view.ruler.join("  "),
        format!("Video {}", track(view.playhead)),
        format!("Audio {}", audio_lane(&view.audio_bars)),
    ]
    .join("\n")
}

pub fn status(session: &EditSession, clock_label: &str, playing: bool) -> String {
    let Some(file) = session.file() else {
        return "no video loaded".to_string();
    };
    let effects = session
        .active_effects()
        .iter()
        .map(|e| e.label())
        .collect::<Vec<_>>();
    let effects = if effects.is_empty() {
        "none".to_string()
    } else {
        effects.join(", ")
    };
    let state = match (session.is_processing(), playing) {
        (true, _) => "exporting",
        (false, true) => "playing",
        (false, false) => "paused",
    };
    format!(
        "{} | {clock_label} | {state} | effects: {effects} | length {}",
        file.name,
        clock(session.duration())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use videoflow_core::types::{Effect, FileHandle, VideoMetadata};

    fn loaded() -> EditSession {
        let mut s = EditSession::new();
        let file = FileHandle::new("clip.mp4", "/tmp/clip.mp4", 10_485_760, "video/mp4");
        let meta = VideoMetadata::from_probe(&file, 65.0, 1920, 1080);
        s.set_video(file, meta);
        s
    }

    #[test]
    fn empty_panel_is_disabled_with_placeholders() {
        let text = panel(&ControlPanelView::from_session(&EditSession::new()));
        assert!(text.contains("(Fade In) (Blur) (Sepia) (B&W)"));
        assert!(text.contains("(Export Video)"));
        assert!(text.contains("Resolution: —"));
    }

    #[test]
    fn loaded_panel_shows_metadata_and_active_effects() {
        let mut s = loaded();
        s.toggle_effect(Effect::Sepia);
        let text = panel(&ControlPanelView::from_session(&s));
        assert!(text.contains("[*Sepia]"));
        assert!(text.contains("[Blur]"));
        assert!(text.contains("1920×1080"));
        assert!(text.contains("10.0 MB"));
        assert!(text.contains("1:05"));
    }

    #[test]
    fn playhead_marks_the_track() {
        assert!(track(0.0).starts_with('|'));
        assert!(track(1.0).ends_with('|'));
        assert_eq!(track(0.5).chars().position(|c| c == '|'), Some(TRACK_WIDTH / 2));
    }

    #[test]
    fn timeline_text_has_every_lane() {
        let text = timeline(&TimelineView::new(60.0, 30.0));
        assert!(text.contains("[Cut] [Audio] [Effects]"));
        assert!(text.contains("Zoom: 100%"));
        assert!(text.contains("00:00"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn status_line() {
        assert_eq!(status(&EditSession::new(), "0:00 / 0:00", false), "no video loaded");
        let mut s = loaded();
        s.toggle_effect(Effect::Blur);
        let line = status(&s, "0:03 / 1:05", true);
        assert!(line.starts_with("clip.mp4 | 0:03 / 1:05 | playing"));
        assert!(line.contains("effects: Blur"));
    }
}
