use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Advance used per character when no font face can be found, in ems.
pub const FALLBACK_ADVANCE_EM: f32 = 0.6;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of `text` set in `font_family` at `font_size`, if a matching system font exists.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Measured width, or a fixed-advance estimate when no font is available.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| estimate_width(text, font_size))
}

pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|ch| *ch != '\n').count() as f32 * font_size * FALLBACK_ADVANCE_EM
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(&family_key);
            if face.is_none() {
                tracing::debug!(family = %family_key, "no font face found, estimating text widths");
            }
            self.cache.insert(family_key.clone(), face);
        }
        let face = self.cache.get(&family_key)?.as_ref()?;
        face.measure_width(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let mut families: Vec<Family<'_>> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            families.push(match raw.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" => Family::SansSerif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(raw),
            });
        }
        if families.is_empty() {
            families.push(Family::Monospace);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data, index))
            .flatten()
    }
}

/// Advance widths pulled out of a parsed face, so the font bytes need not be kept.
struct FontFace {
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advances: HashMap<char, u16>,
}

impl FontFace {
    fn parse(data: &[u8], index: u32) -> Option<Self> {
        let face = Face::parse(data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let mut advances = HashMap::new();
        for code in 0x00A0u32..0x0250 {
            if let Some(ch) = char::from_u32(code)
                && let Some(glyph) = face.glyph_index(ch)
            {
                advances.insert(ch, face.glyph_hor_advance(glyph).unwrap_or(0));
            }
        }
        Some(Self {
            units_per_em: face.units_per_em().max(1),
            ascii_advances,
            advances,
        })
    }

    fn measure_width(&self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / f32::from(self.units_per_em);
        let fallback = font_size * FALLBACK_ADVANCE_EM;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                self.ascii_advances[ch as usize]
            } else {
                self.advances.get(&ch).copied().unwrap_or(0)
            };
            width += if advance == 0 {
                fallback
            } else {
                f32::from(advance) * scale
            };
        }
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "monospace".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 12.0, "monospace"), Some(0.0));
        assert_eq!(text_width("", 12.0, "monospace"), 0.0);
    }

    #[test]
    fn estimate_scales_with_length_and_size() {
        assert_eq!(estimate_width("abcd", 10.0), 24.0);
        assert_eq!(estimate_width("a\nb", 10.0), 12.0);
    }

    #[test]
    fn widths_grow_with_text() {
        let short = text_width("ab", 16.0, "monospace");
        let long = text_width("abcdef", 16.0, "monospace");
        assert!(long > short);
    }
}
