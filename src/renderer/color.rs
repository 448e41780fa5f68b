//! Colour conversion for canvas styles

use crate::sim::Tint;

/// CSS `hsl()` string for a tint
pub fn css(tint: Tint) -> String {
    format!(
        "hsl({}, {}%, {}%)",
        tint.hue.round(),
        tint.saturation.round(),
        tint.lightness.round()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_rounds_components() {
        assert_eq!(css(Tint::WHITE), "hsl(0, 0%, 100%)");
        assert_eq!(css(Tint::hsl(211.6, 70.0, 49.5)), "hsl(212, 70%, 50%)");
    }
}
