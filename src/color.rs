use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};

/// Back-end independent 8-bit colour.
pub type Rgb = Srgb<u8>;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Offset so two cores land on blue-ish and orange-ish hues.
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format::<u8>()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: core id → colour
// ---------------------------------------------------------------------------

/// Maps core identifiers to distinct colours.
///
/// Built from every core in the dataset so a core keeps its colour while
/// other cores are toggled on and off.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreColors {
    mapping: BTreeMap<String, Rgb>,
    default_color: Rgb,
}

impl CoreColors {
    pub fn new(cores: &BTreeSet<String>) -> Self {
        let palette = generate_palette(cores.len());
        let mapping = cores.iter().cloned().zip(palette).collect();

        CoreColors {
            mapping,
            default_color: Rgb::new(128, 128, 128),
        }
    }

    /// Look up the colour for a given core.
    pub fn color_for(&self, core_id: &str) -> Rgb {
        self.mapping
            .get(core_id)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_core_falls_back_to_grey() {
        let cores: BTreeSet<String> = ["KF-16", "KF-18"].iter().map(|s| s.to_string()).collect();
        let colors = CoreColors::new(&cores);
        assert_ne!(colors.color_for("KF-16"), colors.color_for("KF-18"));
        assert_eq!(colors.color_for("KF-99"), Rgb::new(128, 128, 128));
    }
}
