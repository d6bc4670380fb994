use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use ttf_parser::{Face, GlyphId};

/// Average glyph advance relative to the font size when no font can be loaded.
pub const FALLBACK_CHAR_WIDTH: f32 = 0.56;
const ELLIPSIS: char = '\u{2026}';

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

pub fn measure_text_width(
    text: &str,
    font_size: f32,
    font_family: &str,
    bold: bool,
) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family, bold)
}

/// Font-independent width estimate used when no system font matches.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|ch| *ch != '\n').count() as f32 * font_size * FALLBACK_CHAR_WIDTH
}

/// Measured width, falling back to the estimate.
pub fn text_width(text: &str, font_size: f32, font_family: &str, bold: bool) -> f32 {
    measure_text_width(text, font_size, font_family, bold)
        .unwrap_or_else(|| estimate_text_width(text, font_size))
}

/// Cuts `text` so that it fits `max_width`, ending with an ellipsis when anything was cut.
pub fn truncate_to_width(
    text: &str,
    max_width: f32,
    font_size: f32,
    font_family: &str,
    bold: bool,
) -> String {
    if text_width(text, font_size, font_family, bold) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let mut candidate: String = chars.iter().collect();
        candidate.push(ELLIPSIS);
        if text_width(&candidate, font_size, font_family, bold) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
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

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str, bold: bool) -> Option<f32> {
        let key = face_key(font_family, bold);
        if !self.cache.contains_key(&key) {
            let face = self.load_face(font_family, bold, &key);
            self.cache.insert(key.clone(), face);
        }
        let face = self.cache.get_mut(&key).and_then(|face| face.as_mut())?;
        face.measure_width(&text.replace('\t', "    "), font_size)
    }

    fn load_face(&mut self, font_family: &str, bold: bool, key: &str) -> Option<FontFace> {
        if let Some(face) = load_cached_face(key) {
            return Some(face);
        }

        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                let bytes = data.to_vec();
                let face = FontFace::new(bytes, index)?;
                if let Some((font_path, meta_path)) = cache_paths(key)
                    && !font_path.exists()
                {
                    if let Some(parent) = font_path.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(&font_path, &face.data);
                    let _ = fs::write(&meta_path, index.to_string());
                }
                Some(face)
            })
            .flatten()
    }
}

/// Owned font bytes plus an ASCII advance table. Non-ASCII text reparses the face, which
/// only reads table offsets.
struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
            advance_cache: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_CHAR_WIDTH;

        let mut width = 0.0f32;
        let mut face: Option<Face<'_>> = None;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                Some(self.ascii_advances[ch as usize]).filter(|advance| *advance > 0)
            } else if let Some(cached) = self.advance_cache.get(&ch) {
                *cached
            } else {
                if face.is_none() {
                    face = Face::parse(&self.data, self.index).ok();
                }
                let parsed = face.as_ref()?;
                let advance = parsed
                    .glyph_index(ch)
                    .and_then(|glyph: GlyphId| parsed.glyph_hor_advance(glyph));
                self.advance_cache.insert(ch, advance);
                advance
            };
            width += advance.map_or(fallback, |advance| advance as f32 * scale);
        }
        Some(width.max(0.0))
    }
}

fn face_key(font_family: &str, bold: bool) -> String {
    let trimmed = font_family.trim();
    let family = if trimmed.is_empty() { "sans-serif" } else { trimmed };
    if bold {
        format!("{family}#bold")
    } else {
        family.to_string()
    }
}

fn cache_paths(key: &str) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("catalog-diagram").join("font-cache");
    Some((
        dir.join(format!("{hash:x}.font")),
        dir.join(format!("{hash:x}.meta")),
    ))
}

fn load_cached_face(key: &str) -> Option<FontFace> {
    let (font_path, meta_path) = cache_paths(key)?;
    if !font_path.exists() || !meta_path.exists() {
        return None;
    }
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    FontFace::new(bytes, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_length() {
        assert_eq!(estimate_text_width("", 12.0), 0.0);
        let short = estimate_text_width("api", 12.0);
        let long = estimate_text_width("api-gateway", 12.0);
        assert!(long > short);
    }

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(measure_text_width("", 14.0, "sans-serif", false), Some(0.0));
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate_to_width("db", 500.0, 14.0, "sans-serif", true), "db");
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        let text = "a-very-long-component-name-that-cannot-fit";
        let cut = truncate_to_width(text, 60.0, 14.0, "sans-serif", true);
        assert!(cut.ends_with(ELLIPSIS));
        assert!(cut.chars().count() < text.chars().count());
    }
}
