// src/advice/aesthetic.rs
use crate::models::{AestheticOption, ModelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AestheticBand {
    Stunning,
    Pleasing,
    Decent,
    BelowAverage,
}

impl AestheticBand {
    /// Lower bounds are inclusive: 8.5, 7.0 and 5.0 belong to the upper band.
    pub fn for_score(score: f64) -> Self {
        if score >= 8.5 {
            AestheticBand::Stunning
        } else if score >= 7.0 {
            AestheticBand::Pleasing
        } else if score >= 5.0 {
            AestheticBand::Decent
        } else {
            AestheticBand::BelowAverage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AestheticBand::Stunning => "stunning",
            AestheticBand::Pleasing => "pleasing",
            AestheticBand::Decent => "decent",
            AestheticBand::BelowAverage => "below average",
        }
    }

    fn verdict(&self) -> &'static str {
        match self {
            AestheticBand::Stunning => {
                "Stunning and artistically impressive. This image likely evokes a strong emotional or visual response."
            }
            AestheticBand::Pleasing => "Aesthetically pleasing. Good composition and visual appeal.",
            AestheticBand::Decent => "Decent quality. Has potential but may lack strong artistic elements.",
            AestheticBand::BelowAverage => {
                "Below average aesthetic value. Likely unbalanced or uninteresting composition."
            }
        }
    }
}

/// Model behind each aesthetic sub-option.
pub fn model_for(option: AestheticOption) -> ModelType {
    match option {
        AestheticOption::General => ModelType::Aesthetic,
        AestheticOption::Composition => ModelType::Composition,
        AestheticOption::Chromatic => ModelType::Chromatic,
    }
}

/// The score is printed in shortest round-trip form, so whole numbers keep
/// their decimal (`7.0`).
pub fn advise(score: f64) -> String {
    format!("{} I give it {:?} out of 10", AestheticBand::for_score(score).verdict(), score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries_are_inclusive() {
        assert_eq!(AestheticBand::for_score(8.5), AestheticBand::Stunning);
        assert_eq!(AestheticBand::for_score(8.49), AestheticBand::Pleasing);
        assert_eq!(AestheticBand::for_score(7.0), AestheticBand::Pleasing);
        assert_eq!(AestheticBand::for_score(6.99), AestheticBand::Decent);
        assert_eq!(AestheticBand::for_score(5.0), AestheticBand::Decent);
        assert_eq!(AestheticBand::for_score(4.99), AestheticBand::BelowAverage);
        assert_eq!(AestheticBand::for_score(0.0), AestheticBand::BelowAverage);
        assert_eq!(AestheticBand::for_score(10.0), AestheticBand::Stunning);
    }

    #[test]
    fn test_narrative_appends_score() {
        let text = advise(7.46);
        assert!(text.starts_with("Aesthetically pleasing."));
        assert!(text.ends_with("I give it 7.46 out of 10"));
    }

    #[test]
    fn test_whole_score_keeps_decimal() {
        assert!(advise(7.0).ends_with("I give it 7.0 out of 10"));
        assert!(advise(10.0).ends_with("I give it 10.0 out of 10"));
    }

    #[test]
    fn test_sub_options_map_to_models() {
        assert_eq!(model_for(AestheticOption::General), ModelType::Aesthetic);
        assert_eq!(model_for(AestheticOption::Composition), ModelType::Composition);
        assert_eq!(model_for(AestheticOption::Chromatic), ModelType::Chromatic);
    }
}
