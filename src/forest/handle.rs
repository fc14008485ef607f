use super::{ForestCell, ForestLayout, LayoutRequest, PositionCache, cells_from_records, compute_forest_layout};
use crate::config::ForestConfig;
use crate::ir::NameRecord;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForestEvent {
    /// A new layout was requested.
    Start,
    /// The pending layout was computed.
    End,
}

struct Pending {
    request: LayoutRequest,
    due: Instant,
}

type Listener = Box<dyn FnMut()>;

/// Debounced owner of a forest's cells, position cache and latest layout.
///
/// `update` emits [`ForestEvent::Start`] right away and schedules the recompute; a later update
/// before the deadline replaces the pending one. The owner drives time through [`poll`] or
/// [`flush`].
///
/// [`poll`]: ForestHandle::poll
/// [`flush`]: ForestHandle::flush
pub struct ForestHandle {
    cells: Vec<ForestCell>,
    config: ForestConfig,
    cache: PositionCache,
    listeners: Vec<(ForestEvent, Listener)>,
    pending: Option<Pending>,
    layout: Option<ForestLayout>,
}

impl ForestHandle {
    pub fn new(cells: Vec<ForestCell>, config: ForestConfig) -> Self {
        Self {
            cells,
            config,
            cache: PositionCache::new(),
            listeners: Vec::new(),
            pending: None,
            layout: None,
        }
    }

    pub fn from_records(records: &[NameRecord], config: ForestConfig) -> Self {
        let cells = cells_from_records(records, &config);
        Self::new(cells, config)
    }

    pub fn on(&mut self, event: ForestEvent, callback: impl FnMut() + 'static) {
        self.listeners.push((event, Box::new(callback)));
    }

    fn emit(&mut self, event: ForestEvent) {
        for (kind, callback) in &mut self.listeners {
            if *kind == event {
                callback();
            }
        }
    }

    pub fn update(&mut self, request: LayoutRequest) {
        self.update_at(request, Instant::now());
    }

    pub fn update_at(&mut self, request: LayoutRequest, now: Instant) {
        self.emit(ForestEvent::Start);
        if self.pending.is_some() {
            tracing::debug!("superseding pending forest layout");
        }
        self.pending = Some(Pending {
            request,
            due: now + Duration::from_millis(self.config.debounce_ms),
        });
    }

    /// Runs the pending recompute if its deadline has passed. Returns whether it ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = self.pending.as_ref().is_some_and(|pending| pending.due <= now);
        due && self.flush()
    }

    /// Runs the pending recompute immediately. Returns whether there was one.
    pub fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let layout = compute_forest_layout(&self.cells, &pending.request, &mut self.cache, &self.config);
        self.layout = Some(layout);
        self.emit(ForestEvent::End);
        true
    }

    /// Drops the pending recompute without emitting [`ForestEvent::End`].
    pub fn stop(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn layout(&self) -> Option<&ForestLayout> {
        self.layout.as_ref()
    }

    pub fn cells(&self) -> &[ForestCell] {
        &self.cells
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PositionCache {
        &mut self.cache
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}
