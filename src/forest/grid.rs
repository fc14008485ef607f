use super::{ForestCell, SortKey};
use crate::config::ForestConfig;
use crate::parser::digit_sum;
use std::cmp::Ordering;

/// Orders two optional keys with missing values last in either direction.
fn by_option<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Names compare by UTF-16 code units.
fn by_name(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Stable sort: ties keep their input order.
pub fn sort_cells(cells: &[ForestCell], key: SortKey) -> Vec<ForestCell> {
    let mut keyed: Vec<(u64, ForestCell)> = cells
        .iter()
        .map(|cell| (digit_sum(&cell.name), cell.clone()))
        .collect();
    keyed.sort_by(|(na, a), (nb, b)| match key {
        SortKey::TimeAsc => by_option(a.created_at, b.created_at, false),
        SortKey::TimeDesc => by_option(a.created_at, b.created_at, true),
        SortKey::NameAsc => by_name(&a.name, &b.name),
        SortKey::NameDesc => by_name(&b.name, &a.name),
        SortKey::NumberAsc => na.cmp(nb),
        SortKey::NumberDesc => nb.cmp(na),
    });
    keyed.into_iter().map(|(_, cell)| cell).collect()
}

/// Column count: fixed, or `ceil(sqrt(n / (height / width)))` of the display.
pub fn column_count(len: usize, config: &ForestConfig) -> usize {
    if let Some(columns) = config.grid.columns.filter(|columns| *columns > 0) {
        return columns;
    }
    let ratio = config.style_height / config.style_width;
    let columns = (len as f64 / ratio).sqrt().ceil();
    if columns.is_finite() && columns >= 1.0 {
        columns as usize
    } else {
        1
    }
}

/// Sorts the cells and tiles them row by row on a lattice of `cell_size`.
pub fn grid(cells: &[ForestCell], key: SortKey, config: &ForestConfig) -> Vec<ForestCell> {
    let mut sorted = sort_cells(cells, key);
    let columns = column_count(sorted.len(), config);
    for (i, cell) in sorted.iter_mut().enumerate() {
        cell.x = (i % columns) as f64 * config.cell_size;
        cell.y = (i / columns) as f64 * config.cell_size;
    }
    sorted
}
