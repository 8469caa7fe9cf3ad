//! Chart colors for category values
//!
//! Known emotions, themes, archetypes and symbols have curated colors.
//! Anything else gets a color derived from a SHA-256 of its lower-cased name,
//! so the same value renders the same way on every query.

use sha2::{Digest, Sha256};

const EMOTION_COLORS: &[(&str, &str)] = &[
    ("joy", "#f9c74f"),
    ("happiness", "#f9c74f"),
    ("excitement", "#f8961e"),
    ("love", "#f94172"),
    ("peace", "#90be6d"),
    ("calm", "#43aa8b"),
    ("relief", "#76c893"),
    ("hope", "#99d98c"),
    ("wonder", "#b5a8f0"),
    ("curiosity", "#4d908e"),
    ("nostalgia", "#c9ada7"),
    ("surprise", "#ffb5a7"),
    ("confusion", "#a3a3c2"),
    ("anxiety", "#9d4edd"),
    ("fear", "#5a189a"),
    ("sadness", "#577590"),
    ("loneliness", "#415a77"),
    ("anger", "#d62828"),
    ("frustration", "#e76f51"),
    ("guilt", "#6d597a"),
    ("shame", "#b56576"),
];

const THEME_COLORS: &[(&str, &str)] = &[
    ("flying", "#48cae4"),
    ("falling", "#0077b6"),
    ("being chased", "#e63946"),
    ("chase", "#e63946"),
    ("water", "#00b4d8"),
    ("death", "#343a40"),
    ("teeth", "#adb5bd"),
    ("exam", "#ffb703"),
    ("school", "#fb8500"),
    ("work", "#8d99ae"),
    ("travel", "#2a9d8f"),
    ("home", "#e9c46a"),
    ("family", "#f4a261"),
    ("lost", "#6c757d"),
    ("transformation", "#9b5de5"),
    ("romance", "#ff70a6"),
    ("conflict", "#c1121f"),
    ("nature", "#52b788"),
];

const ARCHETYPE_COLORS: &[(&str, &str)] = &[
    ("shadow", "#2b2d42"),
    ("anima", "#ff8fab"),
    ("animus", "#4361ee"),
    ("hero", "#ffd166"),
    ("mentor", "#06d6a0"),
    ("wise old man", "#06d6a0"),
    ("great mother", "#ef476f"),
    ("mother", "#ef476f"),
    ("trickster", "#f77f00"),
    ("child", "#ffe5ec"),
    ("self", "#7209b7"),
    ("persona", "#8338ec"),
];

const SYMBOL_COLORS: &[(&str, &str)] = &[
    ("snake", "#2d6a4f"),
    ("house", "#bc6c25"),
    ("door", "#8b5e34"),
    ("key", "#dda15e"),
    ("mirror", "#caf0f8"),
    ("moon", "#e0e1dd"),
    ("sun", "#ffbe0b"),
    ("fire", "#f3722c"),
    ("tree", "#40916c"),
    ("bridge", "#6c584c"),
];

/// Which curated lexicon to consult first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexicon {
    Emotions,
    Themes,
    Archetypes,
    Symbols,
    /// Only the procedural color
    None,
}

impl Lexicon {
    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Lexicon::Emotions => EMOTION_COLORS,
            Lexicon::Themes => THEME_COLORS,
            Lexicon::Archetypes => ARCHETYPE_COLORS,
            Lexicon::Symbols => SYMBOL_COLORS,
            Lexicon::None => &[],
        }
    }
}

/// Color token for a category value
pub fn color_for(lexicon: Lexicon, name: &str) -> String {
    let key = name.trim().to_lowercase();
    lexicon
        .entries()
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, color)| (*color).to_string())
        .unwrap_or_else(|| procedural_color(&key))
}

/// Deterministic color derived from a name
///
/// Hue spans the full wheel; saturation and lightness stay in a band that
/// reads on both light and dark chart backgrounds.
pub fn procedural_color(name: &str) -> String {
    let digest = Sha256::digest(name.trim().to_lowercase().as_bytes());
    let hue = f64::from(u16::from_be_bytes([digest[0], digest[1]]) % 360);
    let saturation = 0.55 + f64::from(digest[2] % 20) / 100.0;
    let lightness = 0.50 + f64::from(digest[3] % 15) / 100.0;
    let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
    format!("#{}", hex::encode([r, g, b]))
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r1), to_byte(g1), to_byte(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_color_is_case_insensitive() {
        assert_eq!(color_for(Lexicon::Emotions, "Joy"), "#f9c74f");
        assert_eq!(color_for(Lexicon::Emotions, "  fear "), "#5a189a");
        assert_eq!(color_for(Lexicon::Archetypes, "Shadow"), "#2b2d42");
    }

    #[test]
    fn test_unknown_value_gets_stable_procedural_color() {
        let first = color_for(Lexicon::Themes, "Underwater Library");
        let second = color_for(Lexicon::Themes, "underwater library");
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
        assert!(first.starts_with('#'));
        assert!(first[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_lexicons_are_separate() {
        // "water" is a curated theme but not a curated emotion
        assert_eq!(color_for(Lexicon::Themes, "water"), "#00b4d8");
        assert_eq!(
            color_for(Lexicon::Emotions, "water"),
            procedural_color("water")
        );
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }
}
