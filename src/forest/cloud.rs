use super::{ForestCell, extent};
use crate::config::{CloudConfig, ForestConfig};
use crate::random::{Lcg, seed_from_digits};
use std::collections::HashMap;

/// Spiral positions remembered by placement index.
///
/// A cell placed at index `i` reuses the position stored for `i`, whichever cell held that index
/// before. Entries are never dropped implicitly; call [`PositionCache::clear`] to start a fresh
/// history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionCache {
    positions: HashMap<usize, (f64, f64)>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        self.positions.get(&index).copied()
    }

    pub fn insert(&mut self, index: usize, position: (f64, f64)) {
        self.positions.insert(index, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Padded box of a placed cell: `[x - p, x - p + w + 2p] × [y - p, y - p + h + 2p]`.
fn padded(cell: &ForestCell, padding: f64) -> (f64, f64, f64, f64) {
    let x0 = cell.x - padding;
    let y0 = cell.y - padding;
    (x0, y0, x0 + cell.width + padding * 2.0, y0 + cell.height + padding * 2.0)
}

/// Boxes that merely touch count as overlapping.
fn overlaps(a: &ForestCell, b: &ForestCell, padding: f64) -> bool {
    let (ax0, ay0, ax1, ay1) = padded(a, padding);
    let (bx0, by0, bx1, by1) = padded(b, padding);
    !(ax1 < bx0 || ay1 < by0 || bx1 < ax0 || by1 < ay0)
}

fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Places cells in order along an Archimedean spiral.
///
/// Cell 0 sits at the origin. Each later cell tries `(round(r·sin θ), round(r·cos θ))` for θ in
/// whole degrees, growing `r` by `increase` after every full turn, until its padded box is clear
/// of all earlier cells. Every candidate tried is written to the cache at the cell's index.
pub fn pack_cloud(cells: &mut [ForestCell], cache: &mut PositionCache, config: &CloudConfig) {
    let padding = config.padding;
    for index in 0..cells.len() {
        let (placed, rest) = cells.split_at_mut(index);
        let cell = &mut rest[0];

        if let Some((x, y)) = cache.get(index) {
            cell.x = x + padding;
            cell.y = y + padding;
            continue;
        }
        if index == 0 {
            cell.x = padding;
            cell.y = padding;
            continue;
        }

        let mut r = config.increase;
        let mut degree = 0u32;
        let mut tries = 0usize;
        loop {
            let theta = (f64::from(degree) * std::f64::consts::PI) / 180.0;
            let x = js_round(r * theta.sin());
            let y = js_round(r * theta.cos());
            cell.x = x + padding;
            cell.y = y + padding;
            cache.insert(index, (x, y));
            degree += 1;
            if degree >= 360 {
                r += config.increase;
                degree = 0;
            }
            tries += 1;

            if !placed.iter().any(|other| overlaps(other, cell, padding)) {
                break;
            }
            if tries >= config.max_iterations {
                tracing::warn!(
                    index,
                    tries,
                    "spiral search hit its iteration cap, accepting an overlapping position"
                );
                break;
            }
        }
    }
}

/// Shifts each cell by up to `jitter_radius` on both axes, seeded from its own name.
pub fn randomize(cells: &mut [ForestCell], config: &CloudConfig) {
    for cell in cells.iter_mut() {
        let seed = seed_from_digits(&char_codes(&cell.name)) * config.jitter_seed_scale;
        let mut rng = Lcg::new(seed);
        let radius = config.jitter_radius;
        cell.x += rng.uniform(-radius, radius);
        cell.y += rng.uniform(-radius, radius);
    }
}

/// UTF-16 codes of the untrimmed name, concatenated.
fn char_codes(name: &str) -> String {
    name.encode_utf16().map(|unit| unit.to_string()).collect()
}

/// Maps y linearly so the forest's height becomes its width divided by `aspect`.
pub fn scale_y(cells: &mut [ForestCell], aspect: f64, half: f64) {
    if cells.is_empty() || !(aspect > 0.0) {
        return;
    }
    let bounds = extent(cells, half);
    let expected = bounds.width() / aspect;
    let span = bounds.max_y - bounds.min_y;
    for cell in cells.iter_mut() {
        let t = if span != 0.0 {
            (cell.y - bounds.min_y) / span
        } else {
            0.5
        };
        cell.y = expected * t;
    }
}

/// Packs a copy of `cells`, jitters it and fits it to the display aspect ratio.
pub fn word_cloud(
    cells: &[ForestCell],
    cache: &mut PositionCache,
    config: &ForestConfig,
) -> Vec<ForestCell> {
    let mut copy = cells.to_vec();
    pack_cloud(&mut copy, cache, &config.cloud);
    randomize(&mut copy, &config.cloud);
    scale_y(&mut copy, config.style_width / config.style_height, config.half_cell());
    tracing::debug!(cells = copy.len(), cached = cache.len(), "word cloud packed");
    copy
}
