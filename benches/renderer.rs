use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use string2tree::config::{ForestConfig, TreeLayoutConfig, TreeOptions};
use string2tree::forest::{
    ForestLayout, LayoutRequest, PositionCache, SortKey, ViewTransform, cells_from_records,
    compute_forest_layout,
};
use string2tree::ir::NameRecord;
use string2tree::layout::compute_tree_layout;
use string2tree::parser::parse_text;
use string2tree::render::{render_forest_document, render_tree_document};
use string2tree::stamp::WordCellStamp;
use string2tree::{Config, Theme};

const TEXTS: [(&str, &str); 4] = [
    ("short", "Ada"),
    ("name", "Grace Hopper"),
    ("sentence", "The quick brown fox jumps over the lazy dog"),
    ("wide", "一棵树从文字里长出来"),
];

fn names(count: usize) -> Vec<NameRecord> {
    let start = Utc.with_ymd_and_hms(2024, 5, 18, 9, 0, 0).single();
    (0..count)
        .map(|i| {
            let record = NameRecord::new(format!("Visitor {i}")).with_id(i.to_string());
            match start {
                Some(start) => record.with_created_at(start + Duration::minutes((i * 7) as i64)),
                None => record,
            }
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, text) in TEXTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, data| {
            b.iter(|| black_box(parse_text(black_box(data))));
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let options = TreeOptions::default();
    let config = TreeLayoutConfig::default();
    for (name, text) in TEXTS {
        let parsed = parse_text(text);
        group.bench_with_input(BenchmarkId::from_parameter(name), &parsed, |b, data| {
            b.iter(|| {
                let layout = compute_tree_layout(black_box(data), &options, &config);
                black_box(layout.branches.len());
            });
        });
    }
    group.finish();
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    let config = ForestConfig::default();
    for count in [10usize, 50, 200] {
        let cells = cells_from_records(&names(count), &config);
        for (label, request) in [
            ("grid", LayoutRequest::grid(SortKey::NameAsc)),
            ("cloud", LayoutRequest::cloud()),
            ("swarm", LayoutRequest::swarm(true)),
        ] {
            group.bench_with_input(
                BenchmarkId::new(label, count),
                &cells,
                |b, data| {
                    b.iter(|| {
                        // Fresh cache so cloud packing is measured, not lookups.
                        let mut cache = PositionCache::new();
                        let layout = compute_forest_layout(black_box(data), &request, &mut cache, &config);
                        black_box(matches!(layout, ForestLayout::Swarm(_)));
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let options = TreeOptions::default();
    let config = TreeLayoutConfig::default();
    let theme = Theme::default();
    let renderer = WordCellStamp::new(&theme, config.stamp.stroke_width);
    for (name, text) in TEXTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, data| {
            b.iter(|| {
                let svg = render_tree_document(black_box(data), &options, &config, &theme, &renderer).to_svg();
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    group.sample_size(20);
    let config = Config::default();
    let renderer = WordCellStamp::new(&config.theme, config.tree.stamp.stroke_width);
    for count in [10usize, 50] {
        let cells = cells_from_records(&names(count), &config.forest);
        group.bench_with_input(BenchmarkId::new("grid_svg", count), &cells, |b, data| {
            b.iter(|| {
                let mut cache = PositionCache::new();
                let request = LayoutRequest::grid(SortKey::TimeAsc);
                let layout = compute_forest_layout(black_box(data), &request, &mut cache, &config.forest);
                let svg = render_forest_document(&layout, ViewTransform::IDENTITY, &config, &renderer).to_svg();
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_layout, bench_forest, bench_render, bench_end_to_end
);
criterion_main!(benches);
