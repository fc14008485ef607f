//! Multi-tree composition: cell placement and navigation.

pub mod cloud;
pub mod grid;
pub mod handle;
pub mod swarm;
pub mod viewport;

pub use cloud::{PositionCache, pack_cloud, randomize, scale_y, word_cloud};
pub use grid::{grid, sort_cells};
pub use handle::{ForestEvent, ForestHandle};
pub use swarm::{SwarmLayout, swarm_layout};
pub use viewport::{ViewState, ViewTransform, Viewport, ZoomController, interpolate_zoom};

use crate::config::ForestConfig;
use crate::error::TreeError;
use crate::ir::NameRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

/// One tree instance placed in a forest. `x`/`y` is the cell centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestCell {
    pub name: String,
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ForestCell {
    pub fn new(name: impl Into<String>, size: f64) -> Self {
        Self {
            name: name.into(),
            id: None,
            created_at: None,
            x: 0.0,
            y: 0.0,
            width: size,
            height: size,
        }
    }

    pub fn from_record(record: &NameRecord, size: f64) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at,
            ..Self::new(record.name.clone(), size)
        }
    }
}

/// Cells for every record that carries a name, in input order.
pub fn cells_from_records(records: &[NameRecord], config: &ForestConfig) -> Vec<ForestCell> {
    records
        .iter()
        .filter(|record| !record.name.is_empty())
        .map(|record| ForestCell::from_record(record, config.cell_size))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.max_x + self.min_x) / 2.0, (self.max_y + self.min_y) / 2.0)
    }

    /// Side of the square overview viewport.
    pub fn size(&self) -> f64 {
        self.height().min(self.width())
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

/// Bounds of all cells, each spanning `half` around its centre. Empty forests get an empty
/// extent at the origin.
pub fn extent(cells: &[ForestCell], half: f64) -> Extent {
    if cells.is_empty() {
        return Extent {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };
    }
    let mut out = Extent {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for cell in cells {
        out.min_x = out.min_x.min(cell.x - half);
        out.min_y = out.min_y.min(cell.y - half);
        out.max_x = out.max_x.max(cell.x + half);
        out.max_y = out.max_y.max(cell.y + half);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForestLayoutKind {
    Grid,
    Cloud,
    Swarm,
}

impl FromStr for ForestLayoutKind {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "cloud" => Ok(Self::Cloud),
            "swarm" => Ok(Self::Swarm),
            _ => Err(TreeError::UnknownLayout(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortKey {
    #[default]
    TimeAsc,
    TimeDesc,
    NameAsc,
    NameDesc,
    NumberAsc,
    NumberDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::TimeAsc,
        SortKey::TimeDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::NumberAsc,
        SortKey::NumberDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::TimeAsc => "time-asc",
            SortKey::TimeDesc => "time-desc",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::NumberAsc => "number-asc",
            SortKey::NumberDesc => "number-desc",
        }
    }
}

impl FromStr for SortKey {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| TreeError::UnknownSortKey(s.to_string()))
    }
}

/// Options of one forest update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRequest {
    pub layout: ForestLayoutKind,
    pub sort_by: Option<SortKey>,
    pub horizontal: Option<bool>,
}

impl LayoutRequest {
    pub fn grid(sort_by: SortKey) -> Self {
        Self {
            layout: ForestLayoutKind::Grid,
            sort_by: Some(sort_by),
            horizontal: None,
        }
    }

    pub fn cloud() -> Self {
        Self {
            layout: ForestLayoutKind::Cloud,
            sort_by: None,
            horizontal: None,
        }
    }

    pub fn swarm(horizontal: bool) -> Self {
        Self {
            layout: ForestLayoutKind::Swarm,
            sort_by: None,
            horizontal: Some(horizontal),
        }
    }
}

/// Positioned cells for the grid and cloud modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellLayout {
    pub kind: ForestLayoutKind,
    pub cells: Vec<ForestCell>,
    pub extent: Extent,
    /// Trees get a baseline in grid mode.
    pub line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForestLayout {
    Cells(CellLayout),
    Swarm(SwarmLayout),
}

/// Runs the requested placement over `cells`. The input is never modified.
pub fn compute_forest_layout(
    cells: &[ForestCell],
    request: &LayoutRequest,
    cache: &mut PositionCache,
    config: &ForestConfig,
) -> ForestLayout {
    let half = config.half_cell();
    match request.layout {
        ForestLayoutKind::Grid => {
            let placed = grid(cells, request.sort_by.unwrap_or_default(), config);
            ForestLayout::Cells(CellLayout {
                kind: ForestLayoutKind::Grid,
                extent: extent(&placed, half),
                cells: placed,
                line: true,
            })
        }
        ForestLayoutKind::Cloud => {
            let placed = word_cloud(cells, cache, config);
            ForestLayout::Cells(CellLayout {
                kind: ForestLayoutKind::Cloud,
                extent: extent(&placed, half),
                cells: placed,
                line: false,
            })
        }
        ForestLayoutKind::Swarm => {
            let horizontal = request.horizontal.unwrap_or(config.swarm.horizontal);
            ForestLayout::Swarm(swarm_layout(cells, horizontal, config))
        }
    }
}
