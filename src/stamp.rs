//! Signature stamp and stroke-only digit glyphs.

use crate::config::{TreeLayoutConfig, TreeOptions};
use crate::error::StampError;
use crate::scene::{Element, Template, num};
use crate::text_metrics::text_width;
use crate::theme::Theme;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Draws a signature into a row of square cells, one per word.
pub trait GlyphRenderer {
    fn render(&self, text: &str, cell_size: f64) -> Result<Element, StampError>;
}

/// Packs the letters of each word into a square grid inside its own framed cell.
#[derive(Debug, Clone)]
pub struct WordCellStamp {
    pub font_family: String,
    pub ink: String,
    pub stroke_width: f64,
}

impl WordCellStamp {
    pub fn new(theme: &Theme, stroke_width: f64) -> Self {
        Self {
            font_family: theme.font_family.clone(),
            ink: theme.ink.clone(),
            stroke_width,
        }
    }

    fn word_cell(&self, word: &str, cell_size: f64) -> Element {
        let letters: Vec<char> = word.chars().collect();
        let side = (letters.len() as f64).sqrt().ceil().max(1.0) as usize;
        let slot = cell_size / side as f64;

        let mut cell = Element::new("g").child(
            Element::new("rect")
                .attr("width", num(cell_size))
                .attr("height", num(cell_size))
                .attr("fill", "transparent")
                .attr("stroke", &self.ink)
                .attr("stroke-width", num(self.stroke_width)),
        );
        let letter_nodes = Template::new("text")
            .attr("text-anchor", "middle")
            .attr("dominant-baseline", "central")
            .attr("fill", &self.ink)
            .attr("font-family", &self.font_family)
            .bind("x", |_: &char, i| format!("{:.2}", (i % side) as f64 * slot + slot / 2.0))
            .bind("y", |_, i| format!("{:.2}", (i / side) as f64 * slot + slot / 2.0))
            .bind("font-size", |ch, _| format!("{:.2}", self.fit_size(*ch, slot)))
            .text_with(|ch, _| ch.to_string())
            .render(&letters);
        cell = cell.extend(letter_nodes);
        cell
    }

    /// Largest size at which `ch` fits 80% of the slot.
    fn fit_size(&self, ch: char, slot: f64) -> f64 {
        let target = slot * 0.8;
        let unit = f64::from(text_width(&ch.to_string(), 1.0, &self.font_family));
        if unit <= 0.0 {
            return target;
        }
        (target / unit).min(target)
    }
}

impl GlyphRenderer for WordCellStamp {
    fn render(&self, text: &str, cell_size: f64) -> Result<Element, StampError> {
        if let Some(bad) = text.chars().find(|ch| ch.is_control()) {
            return Err(StampError::UnsupportedGlyph(bad));
        }
        let words: Vec<&str> = text.split(' ').collect();
        let cells = words.iter().enumerate().map(|(i, word)| {
            self.word_cell(word, cell_size)
                .attr("transform", format!("translate({}, 0)", num(i as f64 * cell_size)))
        });
        Ok(Element::new("g").extend(cells))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StampOutcome {
    Stamp(Element),
    Fallback { label: Element, error: StampError },
}

impl StampOutcome {
    /// The element to draw; the fallback label is dropped in plot mode.
    pub fn into_element(self, plot: bool) -> Option<Element> {
        match self {
            StampOutcome::Stamp(element) => Some(element),
            StampOutcome::Fallback { .. } if plot => None,
            StampOutcome::Fallback { label, .. } => Some(label),
        }
    }
}

/// Places the signature above the baseline, or falls back to a truncated text label when it
/// cannot be drawn.
pub fn place_stamp(
    text: &str,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
    theme: &Theme,
    renderer: &dyn GlyphRenderer,
) -> StampOutcome {
    match build_stamp(text, options, config, renderer) {
        Ok(element) => StampOutcome::Stamp(element),
        Err(error) => {
            tracing::debug!(%error, "stamp fell back to a text label");
            StampOutcome::Fallback {
                label: fallback_label(text, config, theme),
                error,
            }
        }
    }
}

fn build_stamp(
    text: &str,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
    renderer: &dyn GlyphRenderer,
) -> Result<Element, StampError> {
    let stamp = &config.stamp;
    let words = text.split(' ').count();
    if words > stamp.max_words {
        return Err(StampError::TooManyWords {
            words,
            max: stamp.max_words,
        });
    }

    let half = config.width / 2.0;
    let mut cell_size = stamp.cell_size;
    let mut total = words as f64 * cell_size + stamp.padding * 2.0;
    if total > half {
        cell_size = (half - stamp.padding * 2.0) / words as f64;
        total = words as f64 * cell_size + stamp.padding;
    } else {
        total -= stamp.padding;
    }

    let start = if options.end {
        config.width - total
    } else {
        half + stamp.padding
    };
    let top = config.baseline_y() - cell_size - stamp.baseline_gap;
    let glyphs = renderer.render(text, cell_size)?;
    Ok(Element::new("g")
        .attr("transform", format!("translate({}, {})", num(start), num(top)))
        .child(glyphs))
}

fn fallback_label(text: &str, config: &TreeLayoutConfig, theme: &Theme) -> Element {
    Element::new("text")
        .attr("x", "100%")
        .attr("y", "100%")
        .attr("dy", num(config.fallback_dy))
        .attr("dx", num(config.footer_dx))
        .attr("text-anchor", "end")
        .attr("fill", &theme.ink)
        .attr("font-size", theme.fallback_font_size)
        .attr("font-family", &theme.font_family)
        .text(ellipsis(text, config.fallback_chars))
}

/// Keeps the first `max` characters and appends `...` when anything was cut.
pub fn ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

type Strokes = Vec<Vec<(f64, f64)>>;

/// Single-stroke glyphs on a 21-unit cap height, y growing downwards.
static STROKE_GLYPHS: Lazy<HashMap<char, Strokes>> = Lazy::new(|| {
    let mut glyphs: HashMap<char, Strokes> = HashMap::new();
    let mut add = |ch: char, strokes: &[&[(f64, f64)]]| {
        glyphs.insert(ch, strokes.iter().map(|s| s.to_vec()).collect());
    };
    add('0', &[&[
        (9.0, 0.0), (6.0, 1.0), (4.0, 4.0), (3.0, 9.0), (3.0, 12.0), (4.0, 17.0), (6.0, 20.0),
        (9.0, 21.0), (11.0, 21.0), (14.0, 20.0), (16.0, 17.0), (17.0, 12.0), (17.0, 9.0),
        (16.0, 4.0), (14.0, 1.0), (11.0, 0.0), (9.0, 0.0),
    ]]);
    add('1', &[&[(6.0, 4.0), (8.0, 3.0), (11.0, 0.0), (11.0, 21.0)]]);
    add('2', &[&[
        (4.0, 5.0), (4.0, 4.0), (5.0, 2.0), (6.0, 1.0), (8.0, 0.0), (12.0, 0.0), (14.0, 1.0),
        (15.0, 2.0), (16.0, 4.0), (16.0, 6.0), (15.0, 8.0), (13.0, 11.0), (3.0, 21.0),
        (17.0, 21.0),
    ]]);
    add('3', &[&[
        (5.0, 0.0), (16.0, 0.0), (10.0, 8.0), (13.0, 8.0), (15.0, 9.0), (16.0, 10.0),
        (17.0, 13.0), (17.0, 15.0), (16.0, 18.0), (14.0, 20.0), (11.0, 21.0), (8.0, 21.0),
        (5.0, 20.0), (4.0, 19.0), (3.0, 17.0),
    ]]);
    add('4', &[
        &[(13.0, 0.0), (3.0, 14.0), (18.0, 14.0)],
        &[(13.0, 0.0), (13.0, 21.0)],
    ]);
    add('5', &[&[
        (15.0, 0.0), (5.0, 0.0), (4.0, 9.0), (5.0, 8.0), (8.0, 7.0), (11.0, 7.0), (14.0, 8.0),
        (16.0, 10.0), (17.0, 13.0), (17.0, 15.0), (16.0, 18.0), (14.0, 20.0), (11.0, 21.0),
        (8.0, 21.0), (5.0, 20.0), (4.0, 19.0), (3.0, 17.0),
    ]]);
    add('6', &[&[
        (16.0, 3.0), (15.0, 1.0), (12.0, 0.0), (10.0, 0.0), (7.0, 1.0), (5.0, 4.0), (4.0, 9.0),
        (4.0, 14.0), (5.0, 18.0), (7.0, 20.0), (10.0, 21.0), (11.0, 21.0), (14.0, 20.0),
        (16.0, 18.0), (17.0, 15.0), (17.0, 14.0), (16.0, 11.0), (14.0, 9.0), (11.0, 8.0),
        (10.0, 8.0), (7.0, 9.0), (5.0, 11.0), (4.0, 14.0),
    ]]);
    add('7', &[&[(17.0, 0.0), (7.0, 21.0)], &[(3.0, 0.0), (17.0, 0.0)]]);
    add('8', &[&[
        (8.0, 0.0), (5.0, 1.0), (4.0, 3.0), (4.0, 5.0), (5.0, 7.0), (7.0, 8.0), (11.0, 9.0),
        (14.0, 10.0), (16.0, 12.0), (17.0, 14.0), (17.0, 17.0), (16.0, 19.0), (15.0, 20.0),
        (12.0, 21.0), (8.0, 21.0), (5.0, 20.0), (4.0, 19.0), (3.0, 17.0), (3.0, 14.0),
        (4.0, 12.0), (6.0, 10.0), (9.0, 9.0), (13.0, 8.0), (15.0, 7.0), (16.0, 5.0),
        (16.0, 3.0), (15.0, 1.0), (12.0, 0.0), (8.0, 0.0),
    ]]);
    add('9', &[&[
        (16.0, 7.0), (15.0, 10.0), (13.0, 12.0), (10.0, 13.0), (9.0, 13.0), (6.0, 12.0),
        (4.0, 10.0), (3.0, 7.0), (3.0, 6.0), (4.0, 3.0), (6.0, 1.0), (9.0, 0.0), (10.0, 0.0),
        (13.0, 1.0), (15.0, 3.0), (16.0, 7.0), (16.0, 12.0), (15.0, 17.0), (13.0, 20.0),
        (10.0, 21.0), (8.0, 21.0), (5.0, 20.0), (4.0, 18.0),
    ]]);
    add('.', &[&[(5.0, 19.0), (4.0, 20.0), (5.0, 21.0), (6.0, 20.0), (5.0, 19.0)]]);
    glyphs
});

const CAP_HEIGHT: f64 = 21.0;

fn glyph_strokes(ch: char, scale: f64) -> Result<Strokes, StampError> {
    let strokes = STROKE_GLYPHS
        .get(&ch)
        .ok_or(StampError::UnsupportedGlyph(ch))?;
    Ok(strokes
        .iter()
        .map(|line| {
            line.iter()
                .map(|(x, y)| (x * scale, (y - CAP_HEIGHT) * scale))
                .collect()
        })
        .collect())
}

fn glyph_advance(ch: char, strokes: &Strokes) -> f64 {
    let xs = strokes.iter().flatten().map(|(x, _)| *x);
    let min = xs.clone().fold(f64::INFINITY, f64::min);
    let max = xs.fold(f64::NEG_INFINITY, f64::max);
    let offset = if ch == '1' { 7.0 } else { 3.0 };
    if min.is_finite() { max - min + offset } else { offset }
}

fn strokes_path(strokes: &Strokes) -> String {
    let mut d = String::new();
    for line in strokes {
        for (idx, (x, y)) in line.iter().enumerate() {
            let cmd = if idx == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{cmd}{},{}", num(*x), num(*y)));
        }
    }
    d
}

/// Stroke-only rendering of a digit string, right aligned so the last glyph starts at the
/// origin.
pub fn stroke_number(digits: &str, scale: f64) -> Result<Element, StampError> {
    let chars: Vec<char> = digits.chars().collect();
    let glyphs = chars
        .iter()
        .map(|ch| glyph_strokes(*ch, scale))
        .collect::<Result<Vec<_>, _>>()?;

    let mut offsets = vec![0.0f64; chars.len()];
    for i in 1..chars.len() {
        offsets[i] = offsets[i - 1] + glyph_advance(chars[i - 1], &glyphs[i - 1]);
    }
    let total = offsets.last().copied().unwrap_or(0.0);

    let paths = Template::new("path")
        .bind("d", |strokes: &Strokes, _| strokes_path(strokes))
        .bind("transform", |_, i| format!("translate({}, 0)", num(offsets[i])))
        .render(&glyphs);
    Ok(Element::new("g")
        .attr("transform", format!("translate({}, 0)", num(-total)))
        .extend(paths))
}
