use crate::config::{Config, ForestConfig, RenderConfig, TreeLayoutConfig, TreeOptions};
use crate::forest::swarm::{SwarmAnchor, SwarmGroup};
use crate::forest::{CellLayout, ForestLayout, SwarmLayout, ViewTransform};
use crate::layout::curve::{circle, hachure_circle};
use crate::layout::rose::rose_path;
use crate::layout::{TreeLayout, compute_tree_layout};
use crate::parser::parse_text;
use crate::scene::{Document, Element, Template, num};
use crate::stamp::{GlyphRenderer, ellipsis, place_stamp, stroke_number};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Builds the `<svg>` element of one tree.
///
/// Layers, bottom to top: grid frame, flowers, branches, buds, roses, stamp, count discs,
/// baseline and digit footer.
pub fn render_tree_element(
    layout: &TreeLayout,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
    theme: &Theme,
    renderer: &dyn GlyphRenderer,
) -> Element {
    let stroke_width = num(f64::from(theme.stroke_width));
    let ink = theme.ink.as_str();
    let background = theme.background.as_str();

    let grid = options.grid.then(|| {
        Element::new("rect")
            .attr("x", 0)
            .attr("y", 0)
            .attr("class", "tree-bg")
            .attr("width", num(layout.width))
            .attr("height", num(layout.height))
            .attr("stroke", &options.stroke)
            .attr("stroke-width", &stroke_width)
            .attr("fill", "transparent")
    });

    let stem = config.trunk_length * config.decay;
    let flowers = Template::new("g")
        .bind("transform", |flower: &crate::layout::FlowerLayout, _| {
            format!("translate({}, {})", num(flower.x), num(layout.baseline_y))
        })
        .children_with(|flower, _| {
            vec![
                Some(
                    Element::new("path")
                        .attr("d", format!("M0,0L0,{}", num(-stem)))
                        .attr("stroke", ink)
                        .attr("stroke-width", &stroke_width),
                ),
                Some(
                    Element::new("g")
                        .attr("stroke-width", &stroke_width)
                        .attr("transform", format!("translate(0, {})", num(-stem)))
                        .child(
                            Element::new("path")
                                .attr("d", rose_path(config.flower_radius, flower.petals, config.rose_step))
                                .attr("fill", background)
                                .attr("stroke", ink),
                        ),
                ),
            ]
        })
        .render(&layout.flowers);

    let mut layers: Vec<Option<Element>> = vec![grid];
    layers.extend(flowers.into_iter().map(Some));

    if layout.draw_tree {
        let branches = Template::new("path")
            .bind("d", |branch: &crate::layout::BranchPrimitive, _| branch.path())
            .bind("transform", |branch, _| branch.transform.to_svg())
            .render(&layout.branches);
        layers.push(Some(
            Element::new("g")
                .attr("stroke", ink)
                .attr("stroke-width", &stroke_width)
                .extend(branches),
        ));

        let buds = Template::new("g")
            .bind("transform", |bud: &crate::layout::BudPrimitive, _| bud.transform.to_svg())
            .children_with(|bud, _| {
                vec![
                    options.plot.then(|| {
                        Element::new("path")
                            .attr("d", hachure_circle(bud.radius, config.hachure_gap, config.hachure_angle))
                            .attr("stroke-width", &stroke_width)
                            .attr("fill", "transparent")
                            .attr("stroke", ink)
                    }),
                    Some(
                        Element::new("path")
                            .attr("d", circle(bud.radius))
                            .attr("fill", if options.plot { "transparent" } else { ink })
                            .attr("stroke", ink),
                    ),
                ]
            })
            .render(&layout.buds);
        layers.extend(buds.into_iter().map(Some));

        let roses = Template::new("g")
            .bind("transform", |rose: &crate::layout::RosePrimitive, _| rose.transform.to_svg())
            .children_with(|rose, _| {
                vec![Some(
                    Element::new("path")
                        .attr("d", rose_path(rose.radius, rose.petals, config.rose_step))
                        .attr("fill", background)
                        .attr("stroke", ink),
                )]
            })
            .render(&layout.roses);
        layers.extend(roses.into_iter().map(Some));
    }

    if options.stamp {
        layers.push(place_stamp(&layout.text, options, config, theme, renderer).into_element(options.plot));
    }

    if options.count {
        let discs = Template::new("g")
            .bind("transform", |label: &crate::layout::CountLabel, _| label.transform.to_svg())
            .children_with(|label, _| {
                vec![
                    Some(
                        Element::new("circle")
                            .attr("cx", 0)
                            .attr("cy", 0)
                            .attr("r", num(config.count_radius))
                            .attr("fill", ink),
                    ),
                    Some(
                        Element::new("text")
                            .attr("fill", &theme.count_text)
                            .attr("font-size", theme.count_font_size)
                            .attr("text-anchor", "middle")
                            .attr("dy", "0.4em")
                            .text(label.count.to_string()),
                    ),
                ]
            })
            .render(&layout.counts);
        layers.extend(discs.into_iter().map(Some));
    }

    layers.push(options.line.then(|| {
        Element::new("path")
            .attr(
                "d",
                format!(
                    "M{},{}L{},{}",
                    num(options.padding),
                    num(layout.baseline_y),
                    num(layout.width - options.padding),
                    num(layout.baseline_y)
                ),
            )
            .attr("stroke", ink)
            .attr("stroke-width", &stroke_width)
    }));

    layers.push(footer(layout, options, config, theme));

    Element::new("svg")
        .attr("width", num(layout.width))
        .attr("height", num(layout.height))
        .attr("style", format!("background: {background}"))
        .children(layers)
}

fn footer(
    layout: &TreeLayout,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
    theme: &Theme,
) -> Option<Element> {
    if !options.number {
        return None;
    }
    if options.plot {
        let digits = ellipsis(&layout.digits, config.plot_footer_chars);
        let glyphs = match stroke_number(&digits, config.plot_glyph_scale) {
            Ok(glyphs) => glyphs,
            Err(error) => {
                tracing::debug!(%error, "digit footer skipped");
                return None;
            }
        };
        let (x, y) = config.plot_footer_origin;
        return Some(
            Element::new("g")
                .attr("transform", format!("translate({}, {})", num(x), num(y)))
                .attr("stroke", &theme.ink)
                .attr("stroke-width", num(f64::from(theme.stroke_width)))
                .attr("fill", "transparent")
                .child(glyphs),
        );
    }
    Some(
        Element::new("text")
            .attr("id", "ascii")
            .attr("x", "100%")
            .attr("y", "100%")
            .attr("dy", num(config.footer_dy))
            .attr("dx", num(config.footer_dx))
            .attr("text-anchor", "end")
            .attr("fill", &theme.ink)
            .attr("font-size", theme.footer_font_size)
            .attr("font-family", &theme.font_family)
            .text(ellipsis(&layout.digits, config.footer_chars)),
    )
}

/// Lays out and draws `text` with the given options.
pub fn render_tree_document(
    text: &str,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
    theme: &Theme,
    renderer: &dyn GlyphRenderer,
) -> Document {
    let layout = compute_tree_layout(&parse_text(text), options, config);
    Document::new(render_tree_element(&layout, options, config, theme, renderer))
}

fn cell_tree(name: &str, options: &TreeOptions, config: &Config, renderer: &dyn GlyphRenderer) -> Element {
    let layout = compute_tree_layout(&parse_text(name), options, &config.tree);
    render_tree_element(&layout, options, &config.tree, &config.theme, renderer)
}

/// Grid or cloud forest: one clickable cell per tree under a shared view transform.
pub fn render_cells(
    layout: &CellLayout,
    transform: ViewTransform,
    config: &Config,
    renderer: &dyn GlyphRenderer,
) -> Element {
    let forest = &config.forest;
    let half = forest.half_cell();
    let options = TreeOptions::forest_cell(layout.line);
    let extent = layout.extent;

    let cells = Template::new("g")
        .bind("transform", |cell: &crate::forest::ForestCell, _| {
            format!("translate({}, {})", num(cell.x - half), num(cell.y - half))
        })
        .children_with(|cell, index| {
            vec![
                Some(Element::new("g").child(cell_tree(&cell.name, &options, config, renderer))),
                Some(
                    Element::new("rect")
                        .attr("width", num(forest.cell_size))
                        .attr("height", num(forest.cell_size))
                        .attr("fill", "transparent")
                        .attr("style", "cursor: pointer; stroke-width: 2;")
                        .attr("data-index", index),
                ),
            ]
        })
        .render(&layout.cells);

    Element::new("svg")
        .attr(
            "viewBox",
            format!(
                "{} {} {} {}",
                num(extent.min_x),
                num(extent.min_y),
                num(extent.width()),
                num(extent.height())
            ),
        )
        .attr("width", num(forest.style_width))
        .attr("height", num(forest.style_height))
        .attr("style", format!("background: {}", config.theme.background))
        .attr("id", "forest-container")
        .child(
            Element::new("g")
                .attr("id", "forest")
                .attr("transform", transform.to_svg())
                .extend(cells),
        )
}

fn swarm_axis(layout: &SwarmLayout, forest: &ForestConfig, theme: &Theme) -> Element {
    let swarm = &forest.swarm;
    let (left, right) = (swarm.margin_left, layout.width - swarm.margin_right);
    let (top, bottom) = (swarm.margin_top, layout.height - swarm.margin_bottom);
    let horizontal = layout.horizontal;

    let grid = Template::new("line")
        .attr("stroke", &theme.axis_color)
        .attr("stroke-opacity", "0.3")
        .bind("x1", |tick: &crate::forest::swarm::SwarmTick, _| {
            num(if horizontal { tick.position } else { left })
        })
        .bind("x2", |tick, _| num(if horizontal { tick.position } else { right }))
        .bind("y1", |tick, _| num(if horizontal { top } else { tick.position }))
        .bind("y2", |tick, _| num(if horizontal { bottom } else { tick.position }))
        .render(&layout.ticks);
    let labels = Template::new("text")
        .attr("fill", &theme.ink)
        .attr("font-size", 10)
        .attr("font-family", &theme.font_family)
        .attr("text-anchor", if horizontal { "middle" } else { "end" })
        .bind("x", |tick: &crate::forest::swarm::SwarmTick, _| {
            num(if horizontal { tick.position } else { left - 6.0 })
        })
        .bind("y", |tick, _| num(if horizontal { bottom + 16.0 } else { tick.position }))
        .text_with(|tick, _| num(tick.value))
        .render(&layout.ticks);

    let (label_x, label_y) = if horizontal {
        (right, bottom + 32.0)
    } else {
        (left - 6.0, top - 12.0)
    };
    Element::new("g")
        .attr("aria-label", "axis")
        .extend(grid)
        .extend(labels)
        .child(
            Element::new("text")
                .attr("x", num(label_x))
                .attr("y", num(label_y))
                .attr("text-anchor", "end")
                .attr("fill", &theme.ink)
                .attr("font-size", 10)
                .attr("font-family", &theme.font_family)
                .text(&layout.axis_label),
        )
}

fn swarm_group(
    group: &SwarmGroup,
    radius: f64,
    config: &Config,
    renderer: &dyn GlyphRenderer,
) -> Element {
    let theme = &config.theme;
    let (fx, fy, fw, fh) = group.frame;
    let options = TreeOptions::forest_cell(false);
    let scale = radius * 2.0 / config.tree.width;

    let frame = group.framed.then(|| {
        Element::new("rect")
            .attr("x", num(fx))
            .attr("y", num(fy))
            .attr("width", num(fw))
            .attr("height", num(fh))
            .attr("fill", "none")
            .attr("stroke", &theme.ink)
    });
    let (label_x, label_y, anchor) = match group.anchor {
        SwarmAnchor::Bottom | SwarmAnchor::Top => (fx + fw + 6.0, fy + fh / 2.0, "start"),
        SwarmAnchor::Left | SwarmAnchor::Right => (fx + fw / 2.0, fy - 8.0, "middle"),
    };
    let label = Element::new("text")
        .attr("x", num(label_x))
        .attr("y", num(label_y))
        .attr("text-anchor", anchor)
        .attr("fill", &theme.ink)
        .attr("font-size", 10)
        .attr("font-family", &theme.font_family)
        .extend(group.label.split('\n').enumerate().map(|(i, line)| {
            Element::new("tspan")
                .attr("x", num(label_x))
                .attr("dy", if i == 0 { "0" } else { "1.2em" })
                .text(line)
        }));

    let connectors = Template::new("path")
        .bind("d", |branch: &crate::forest::swarm::SwarmBranch, _| branch.path.clone())
        .attr("stroke", &theme.ink)
        .attr("fill", "transparent")
        .render(&group.branches);

    let dots = Template::new("g")
        .children_with(|point: &crate::forest::swarm::SwarmPoint, _| {
            vec![
                Some(
                    Element::new("circle")
                        .attr("cx", num(point.cx))
                        .attr("cy", num(point.cy))
                        .attr("r", num(radius))
                        .attr("fill", &theme.background)
                        .attr("stroke", &theme.ink)
                        .child(Element::new("title").text(&point.name)),
                ),
                Some(
                    Element::new("g")
                        .attr(
                            "transform",
                            format!("translate({}, {})", num(point.cx - radius), num(point.cy - radius)),
                        )
                        .child(
                            Element::new("g")
                                .attr("transform", format!("scale({})", num(scale)))
                                .child(cell_tree(&point.name, &options, config, renderer)),
                        ),
                ),
            ]
        })
        .render(&group.points);

    Element::new("g")
        .attr("aria-label", "dot")
        .children([frame, Some(label)])
        .child(Element::new("g").extend(connectors))
        .extend(dots)
}

/// Two-facet timeline with connectors drawn beneath the dots.
pub fn render_swarm(layout: &SwarmLayout, config: &Config, renderer: &dyn GlyphRenderer) -> Element {
    let groups = layout
        .groups
        .iter()
        .map(|group| swarm_group(group, layout.radius, config, renderer));
    Element::new("svg")
        .attr("width", num(layout.width))
        .attr("height", num(layout.height))
        .attr("viewBox", format!("0 0 {} {}", num(layout.width), num(layout.height)))
        .attr("style", format!("background: {}", config.theme.background))
        .child(swarm_axis(layout, &config.forest, &config.theme))
        .extend(groups)
}

pub fn render_forest_document(
    layout: &ForestLayout,
    transform: ViewTransform,
    config: &Config,
    renderer: &dyn GlyphRenderer,
) -> Document {
    let root = match layout {
        ForestLayout::Cells(cells) => render_cells(cells, transform, config, renderer),
        ForestLayout::Swarm(swarm) => render_swarm(swarm, config, renderer),
    };
    Document::new(root)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options {
        font_family: render_cfg.font_family.clone(),
        ..usvg::Options::default()
    };
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    pixmap.fill(parse_background(&render_cfg.background));

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

/// `#RRGGBB` to an opaque colour; anything else is white.
#[cfg(feature = "png")]
fn parse_background(hex: &str) -> resvg::tiny_skia::Color {
    let digits = hex.trim().trim_start_matches('#');
    let channel = |i: usize| digits.get(i..i + 2).and_then(|s| u8::from_str_radix(s, 16).ok());
    match (digits.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => resvg::tiny_skia::Color::from_rgba8(r, g, b, 255),
        _ => resvg::tiny_skia::Color::WHITE,
    }
}
