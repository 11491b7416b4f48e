// src/advice/composition.rs
use crate::models::{CompositionResult, SymmetryScores};

const TIPS: [&str; 6] = [
    " Pay attention to visual weight distribution to achieve **left-right and top-bottom balance**.",
    " Experiment with **diagonal framing** to inject energy and movement.",
    " Use **foreground and background layering** to add depth and guide focus.",
    " Consider **closed vs. open compositions** to either focus the viewer's attention or encourage exploration.",
    " Play with **pyramid or spiral structures** to control visual flow and hierarchy.",
    " Ensure your chosen **perspective (eye-level, high-angle, or low-angle)** serves the subject's narrative purpose.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryBand {
    Good,
    Moderate,
    Lacking,
}

impl SymmetryBand {
    /// Bands the raw 0..255 mirror differences.
    pub fn classify(symmetry: &SymmetryScores) -> Self {
        if symmetry.vertical < 20.0 && symmetry.horizontal < 20.0 {
            SymmetryBand::Good
        } else if symmetry.vertical > 50.0 || symmetry.horizontal > 50.0 {
            SymmetryBand::Lacking
        } else {
            SymmetryBand::Moderate
        }
    }
}

pub fn clip_quality(clip_score: f64) -> &'static str {
    if clip_score >= 0.6 {
        "excellent"
    } else if clip_score >= 0.45 {
        "good"
    } else if clip_score >= 0.3 {
        "decent"
    } else if clip_score >= 0.15 {
        "average"
    } else {
        "poor"
    }
}

pub fn advise(result: &CompositionResult) -> String {
    let mut feedback = Vec::with_capacity(4);

    feedback.push(if result.rule_of_thirds {
        "The image effectively applies the rule of thirds, placing key elements in visually engaging areas."
    } else {
        "The image does not seem to follow the rule of thirds. Consider placing subjects along the 1/3 gridlines to enhance balance and focus."
    });

    feedback.push(if result.leading_lines {
        "There are noticeable leading lines that guide the viewer's eye through the image."
    } else {
        "No strong leading lines were detected. Try using natural or architectural lines to direct attention and add depth."
    });

    feedback.push(match SymmetryBand::classify(&result.symmetry) {
        SymmetryBand::Good => {
            "The image shows good symmetry, contributing to a stable and harmonious composition."
        }
        SymmetryBand::Lacking => {
            "The image lacks symmetry. If aiming for balance, ensure elements on one side are visually counterbalanced by others."
        }
        SymmetryBand::Moderate => {
            "Moderate symmetry detected. Consider refining alignment or balancing elements to strengthen composition."
        }
    });

    let overall = match result.clip_score {
        Some(score) => format!(
            "Overall, the composition is assessed as **{}** based on visual aesthetics.",
            clip_quality(score)
        ),
        None => "An overall visual-aesthetics rating is currently unavailable; the notes above come from layout analysis alone."
            .to_string(),
    };

    format!(
        "Composition Analysis:\n\n{}\n{}\n\n Tips for Improvement:\n{}",
        feedback.join("\n"),
        overall,
        TIPS.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(vertical: f64, horizontal: f64, clip_score: Option<f64>) -> CompositionResult {
        CompositionResult {
            rule_of_thirds: true,
            leading_lines: false,
            symmetry: SymmetryScores { vertical, horizontal },
            symmetry_score: 0.0,
            clip_score,
            overall_score: 0.0,
        }
    }

    #[test]
    fn test_symmetry_bands() {
        let band = |v, h| SymmetryBand::classify(&SymmetryScores { vertical: v, horizontal: h });
        assert_eq!(band(0.0, 19.9), SymmetryBand::Good);
        assert_eq!(band(20.0, 0.0), SymmetryBand::Moderate);
        assert_eq!(band(50.0, 50.0), SymmetryBand::Moderate);
        assert_eq!(band(5.0, 50.1), SymmetryBand::Lacking);
    }

    #[test]
    fn test_clip_quality_boundaries() {
        assert_eq!(clip_quality(0.6), "excellent");
        assert_eq!(clip_quality(0.59), "good");
        assert_eq!(clip_quality(0.45), "good");
        assert_eq!(clip_quality(0.3), "decent");
        assert_eq!(clip_quality(0.15), "average");
        assert_eq!(clip_quality(0.149), "poor");
    }

    #[test]
    fn test_mirror_symmetric_narrative() {
        let text = advise(&result(0.0, 3.2, Some(0.5)));
        assert!(text.starts_with("Composition Analysis:"));
        assert!(text.contains("good symmetry"));
        assert!(text.contains("effectively applies the rule of thirds"));
        assert!(text.contains("No strong leading lines"));
        assert!(text.contains("assessed as **good**"));
        assert!(text.contains("Tips for Improvement"));
    }

    #[test]
    fn test_missing_clip_score_keeps_layout_feedback() {
        let text = advise(&result(60.0, 3.0, None));
        assert!(text.contains("lacks symmetry"));
        assert!(text.contains("effectively applies the rule of thirds"));
        assert!(text.contains("rating is currently unavailable"));
        assert!(!text.contains("assessed as"));
    }
}
