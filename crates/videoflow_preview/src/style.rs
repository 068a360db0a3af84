use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use videoflow_core::types::Effect;

/// Visual filters derived from the active effects. Each one is independent;
/// they stack without precedence. `FadeIn` has no visual filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationStyle {
    pub blur: bool,
    pub sepia: bool,
    pub grayscale: bool,
}

const BLUR_PX: u32 = 4;

// Standard sepia matrix, rows r/g/b.
const SEPIA_MATRIX: &str =
    "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131";

impl PresentationStyle {
    pub fn from_effects(effects: &BTreeSet<Effect>) -> Self {
        Self {
            blur: effects.contains(&Effect::Blur),
            sepia: effects.contains(&Effect::Sepia),
            grayscale: effects.contains(&Effect::BlackAndWhite),
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// CSS `filter` value, `none` when nothing applies.
    pub fn css_filter(&self) -> String {
        let mut parts = Vec::new();
        if self.blur {
            parts.push(format!("blur({BLUR_PX}px)"));
        }
        if self.sepia {
            parts.push("sepia(100%)".to_string());
        }
        if self.grayscale {
            parts.push("grayscale(100%)".to_string());
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }

    /// ffmpeg filter chain for players that take lavfi graphs, empty when
    /// nothing applies.
    pub fn lavfi_chain(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.blur {
            parts.push(format!("gblur=sigma={BLUR_PX}"));
        }
        if self.sepia {
            parts.push(SEPIA_MATRIX.to_string());
        }
        if self.grayscale {
            parts.push("hue=s=0".to_string());
        }
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(effects: &[Effect]) -> BTreeSet<Effect> {
        effects.iter().copied().collect()
    }

    #[test]
    fn no_effects_is_plain() {
        let style = PresentationStyle::from_effects(&BTreeSet::new());
        assert!(style.is_plain());
        assert_eq!(style.css_filter(), "none");
        assert_eq!(style.lavfi_chain(), "");
    }

    #[test]
    fn fade_in_has_no_visual_filter() {
        let style = PresentationStyle::from_effects(&set(&[Effect::FadeIn]));
        assert!(style.is_plain());
    }

    #[test]
    fn filters_stack() {
        let style = PresentationStyle::from_effects(&set(&[
            Effect::BlackAndWhite,
            Effect::Blur,
            Effect::Sepia,
        ]));
        assert_eq!(style.css_filter(), "blur(4px) sepia(100%) grayscale(100%)");
        let chain = style.lavfi_chain();
        assert!(chain.starts_with("gblur=sigma=4,colorchannelmixer="));
        assert!(chain.ends_with(",hue=s=0"));
    }

    #[test]
    fn single_filter() {
        let style = PresentationStyle::from_effects(&set(&[Effect::Sepia]));
        assert_eq!(style.css_filter(), "sepia(100%)");
        assert_eq!(style.lavfi_chain(), SEPIA_MATRIX);
    }
}
