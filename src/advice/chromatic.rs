// src/advice/chromatic.rs
use super::capitalised;
use crate::models::{ChromaticResult, ColorBand, Harmony};

/// Percentage points one temperature must lead by to dominate.
const DOMINANCE_MARGIN: f64 = 15.0;
const DOMINANT_BAND_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Warm { warm: f64, cool: f64 },
    Cool { warm: f64, cool: f64 },
    Balanced { warm: f64, cool: f64 },
}

pub fn temperature(result: &ChromaticResult) -> Temperature {
    let (warm, cool) = result
        .percentages
        .iter()
        .fold((0.0, 0.0), |(warm, cool), (band, pct)| {
            if band.is_warm() { (warm + pct, cool) } else { (warm, cool + pct) }
        });

    if warm > cool + DOMINANCE_MARGIN {
        Temperature::Warm { warm, cool }
    } else if cool > warm + DOMINANCE_MARGIN {
        Temperature::Cool { warm, cool }
    } else {
        Temperature::Balanced { warm, cool }
    }
}

/// The most populated band when it covers more than half the frame.
pub fn dominant_band(result: &ChromaticResult) -> Option<(ColorBand, f64)> {
    result
        .percentages
        .iter()
        .fold(None, |best: Option<(ColorBand, f64)>, (band, pct)| match best {
            Some((_, top)) if top >= *pct => best,
            _ => Some((*band, *pct)),
        })
        .filter(|(_, pct)| *pct > DOMINANT_BAND_PERCENT)
}

fn harmony_explanation(harmony: Harmony) -> &'static str {
    match harmony {
        Harmony::Complementary => {
            "This creates dynamic tension and vibrancy by using colors that are opposite on the color wheel (e.g., red-green, blue-orange)."
        }
        Harmony::Analogous => {
            "This results in a soothing, harmonious palette by using colors next to each other on the wheel (e.g., blue-green-cyan)."
        }
        Harmony::Balanced => {
            "A balanced mix of warm and cool tones suggests thoughtful composition and aesthetic neutrality."
        }
    }
}

pub fn advise(result: &ChromaticResult) -> String {
    let contrast = result.contrast;
    let mut lines = Vec::with_capacity(4);

    lines.push(if contrast < 0.2 {
        format!(
            "- Contrast is low ({:.2}), which may make the image appear flat. Consider increasing the use of opposing light/dark tones or adding pure primary colors for stronger visual impact.",
            contrast
        )
    } else if contrast > 0.6 {
        format!(
            "- High contrast ({:.2}) gives your image a strong visual punch. This is effective for dramatic compositions, but use with care to avoid harshness.",
            contrast
        )
    } else {
        format!(
            "- Medium contrast ({:.2}) provides a balanced look, maintaining visual interest without overwhelming the viewer.",
            contrast
        )
    });

    lines.push(format!(
        "- Color harmony: **{}**. {}",
        capitalised(result.harmony.as_str()),
        harmony_explanation(result.harmony)
    ));

    lines.push(match temperature(result) {
        Temperature::Warm { warm, cool } => format!(
            "- Warm colors dominate ({:.2}% warm vs {:.2}% cool). This adds energy and intensity, but consider adding some cool tones to balance the mood.",
            warm, cool
        ),
        Temperature::Cool { warm, cool } => format!(
            "- Cool colors dominate ({:.2}% cool vs {:.2}% warm). This creates a calm, serene feeling, but could benefit from warm highlights for contrast.",
            cool, warm
        ),
        Temperature::Balanced { warm, cool } => format!(
            "- The image shows a good balance of warm ({:.2}%) and cool ({:.2}%) colors, which contributes to visual equilibrium.",
            warm, cool
        ),
    });

    if let Some((band, pct)) = dominant_band(result) {
        lines.push(format!(
            "- Dominant color: {} at {:.2}%. Try using its complementary color for visual interest and to enhance simultaneous contrast.",
            capitalised(band.name()),
            pct
        ));
    }

    format!("Color Analysis\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(contrast: f64, bands: &[(ColorBand, f64)]) -> ChromaticResult {
        let mut percentages: BTreeMap<ColorBand, f64> =
            ColorBand::ALL.into_iter().map(|b| (b, 0.0)).collect();
        percentages.extend(bands.iter().copied());
        ChromaticResult {
            contrast,
            harmony: Harmony::Analogous,
            percentages,
        }
    }

    #[test]
    fn test_warm_dominance_needs_more_than_margin() {
        let warm = result(0.5, &[(ColorBand::Red, 40.0), (ColorBand::Blue, 24.0)]);
        assert!(matches!(temperature(&warm), Temperature::Warm { .. }));

        let even = result(0.5, &[(ColorBand::Red, 40.0), (ColorBand::Blue, 25.0)]);
        assert!(matches!(temperature(&even), Temperature::Balanced { .. }));

        let cool = result(0.5, &[(ColorBand::Orange, 5.0), (ColorBand::Green, 30.0)]);
        assert!(matches!(temperature(&cool), Temperature::Cool { .. }));
    }

    #[test]
    fn test_dominant_band_over_half() {
        assert_eq!(
            dominant_band(&result(0.5, &[(ColorBand::Yellow, 62.5)])),
            Some((ColorBand::Yellow, 62.5))
        );
        assert_eq!(dominant_band(&result(0.5, &[(ColorBand::Yellow, 50.0)])), None);
    }

    #[test]
    fn test_narrative() {
        let text = advise(&result(0.1, &[(ColorBand::Red, 70.0), (ColorBand::Green, 10.0)]));
        assert!(text.starts_with("Color Analysis\n"));
        assert!(text.contains("Contrast is low (0.10)"));
        assert!(text.contains("**Analogous**"));
        assert!(text.contains("Warm colors dominate (70.00% warm vs 10.00% cool)"));
        assert!(text.contains("Dominant color: Red at 70.00%"));
    }

    #[test]
    fn test_contrast_bands() {
        assert!(advise(&result(0.7, &[])).contains("High contrast (0.70)"));
        assert!(advise(&result(0.6, &[])).contains("Medium contrast (0.60)"));
        assert!(advise(&result(0.2, &[])).contains("Medium contrast (0.20)"));
    }
}
