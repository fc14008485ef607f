use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use string2tree::config::ForestConfig;
use string2tree::ir::{dedupe_names, page, page_count};
use string2tree::{
    Config, ForestEvent, ForestLayout, LayoutRequest, NameRecord, SortKey, ViewState,
    ViewTransform, Viewport, ZoomController, render_forest, render_forest_svg,
};

fn records() -> Vec<NameRecord> {
    let at = |h: u32, m: u32| Utc.with_ymd_and_hms(2024, 5, 18, h, m, 0).unwrap();
    vec![
        NameRecord::new("Cyd").with_id("3").with_created_at(at(10, 30)),
        NameRecord::new("Ada").with_id("1").with_created_at(at(9, 0)),
        NameRecord::new("Bea").with_id("2").with_created_at(at(9, 45)),
        NameRecord::new("Dot").with_id("4"),
    ]
}

fn names(layout: &ForestLayout) -> Vec<String> {
    match layout {
        ForestLayout::Cells(cells) => cells.cells.iter().map(|c| c.name.clone()).collect(),
        ForestLayout::Swarm(_) => panic!("expected a cell layout"),
    }
}

#[test]
fn grid_sorts_by_time_with_undated_last() {
    let mut handle = render_forest(&records(), ForestConfig::default());
    handle.update(LayoutRequest::grid(SortKey::TimeAsc));
    assert!(handle.flush());
    assert_eq!(names(handle.layout().unwrap()), ["Ada", "Bea", "Cyd", "Dot"]);

    handle.update(LayoutRequest::grid(SortKey::NameDesc));
    handle.flush();
    assert_eq!(names(handle.layout().unwrap()), ["Dot", "Cyd", "Bea", "Ada"]);
}

#[test]
fn debounced_updates_fire_start_then_one_end() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut handle = render_forest(&records(), ForestConfig::default());
    for event in [ForestEvent::Start, ForestEvent::End] {
        let events = Rc::clone(&events);
        handle.on(event, move || events.borrow_mut().push(event));
    }

    let t0 = Instant::now();
    handle.update_at(LayoutRequest::cloud(), t0);
    handle.update_at(LayoutRequest::grid(SortKey::NameAsc), t0 + Duration::from_millis(5));
    assert!(!handle.poll(t0 + Duration::from_millis(6)));
    assert!(handle.poll(t0 + Duration::from_secs(5)));

    assert_eq!(*events.borrow(), [ForestEvent::Start, ForestEvent::Start, ForestEvent::End]);
    assert_eq!(names(handle.layout().unwrap()), ["Ada", "Bea", "Cyd", "Dot"]);
}

#[test]
fn cloud_positions_survive_relayout() {
    let mut handle = render_forest(&records(), ForestConfig::default());
    handle.update(LayoutRequest::cloud());
    handle.flush();
    let first = handle.layout().cloned().unwrap();
    // the first cell is pinned and never cached
    assert_eq!(handle.cache().len(), 3);

    handle.update(LayoutRequest::grid(SortKey::TimeAsc));
    handle.flush();
    handle.update(LayoutRequest::cloud());
    handle.flush();
    assert_eq!(handle.layout(), Some(&first));

    handle.cache_mut().clear();
    assert!(handle.cache().is_empty());
}

#[test]
fn swarm_has_two_facets() {
    let mut handle = render_forest(&records(), ForestConfig::default());
    handle.update(LayoutRequest::swarm(true));
    handle.flush();
    let ForestLayout::Swarm(swarm) = handle.layout().unwrap() else {
        panic!("expected a swarm layout");
    };
    assert_eq!(swarm.groups.len(), 2);
    let placed: usize = swarm.groups.iter().map(|g| g.points.len()).sum();
    // the undated record is not on the timeline
    assert_eq!(placed, 3);

    let svg = render_forest_svg(&handle, ViewTransform::IDENTITY, &Config::default()).unwrap();
    assert!(svg.contains("Time (minutes)"));
}

#[test]
fn focusing_a_cell_zooms_in_and_back_out() {
    let config = Config::default();
    let mut handle = render_forest(&records(), config.forest.clone());
    handle.update(LayoutRequest::grid(SortKey::TimeAsc));
    handle.flush();
    let ForestLayout::Cells(layout) = handle.layout().unwrap() else {
        panic!("expected a cell layout");
    };

    let mut zoom = ZoomController::new(
        layout.extent,
        config.forest.cell_size,
        config.forest.zoom_duration_multiplier,
    );
    let cell = &layout.cells[2];
    assert!(zoom.click(2, cell.x, cell.y, 0.0));
    zoom.finish();
    assert_eq!(zoom.state(), ViewState::Focused(2));
    let focused = zoom.transform();
    assert!(focused.k > 1.0);

    let svg = render_forest_svg(&handle, focused, &config).unwrap();
    assert!(svg.contains(&focused.to_svg()));

    assert!(zoom.click(2, cell.x, cell.y, 10_000.0));
    zoom.finish();
    assert_eq!(zoom.state(), ViewState::Overview);
    assert_eq!(zoom.transform(), ViewTransform::IDENTITY);
}

#[test]
fn name_lists_dedupe_and_page() {
    let mut list = records();
    list.push(NameRecord::new("Ada").with_id("1"));
    list.push(NameRecord::new(""));
    let (kept, removed) = dedupe_names(&list);
    assert_eq!(kept.len(), 4);
    // nameless records are dropped without being reported
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].name, "Ada");

    assert_eq!(page_count(kept.len(), 3), 2);
    assert_eq!(page(&kept, 1, 3).len(), 1);
    assert!(page(&kept, 5, 3).is_empty());
}

#[test]
fn single_tree_forest_focuses_in_place() {
    let config = Config::default();
    let mut handle = render_forest(&records()[..1], config.forest.clone());
    handle.update(LayoutRequest::grid(SortKey::TimeAsc));
    handle.flush();
    let ForestLayout::Cells(layout) = handle.layout().unwrap() else {
        panic!("expected a cell layout");
    };

    let mut zoom = ZoomController::new(
        layout.extent,
        config.forest.cell_size,
        config.forest.zoom_duration_multiplier,
    );
    let cell = &layout.cells[0];
    assert_eq!(zoom.overview(), Viewport::new(cell.x, cell.y, config.forest.cell_size));

    assert!(zoom.click(0, cell.x, cell.y, 0.0));
    let transform = zoom.tick(0.0).expect("transition was started");
    assert!(!zoom.is_zooming());
    assert_eq!(zoom.state(), ViewState::Focused(0));
    assert_eq!(transform, ViewTransform::IDENTITY);
}
