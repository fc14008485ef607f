use super::ForestCell;
use crate::config::ForestConfig;
use crate::layout::curve::catmull_rom;
use serde::Serialize;

const DODGE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwarmAnchor {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmPoint {
    pub name: String,
    /// Minutes since the earliest record across both groups.
    pub offset: f64,
    pub cx: f64,
    pub cy: f64,
}

/// A smoothed connector through points whose circles touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmBranch {
    pub points: Vec<(f64, f64)>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmGroup {
    pub label: String,
    pub anchor: SwarmAnchor,
    /// Facet rectangle `(x, y, width, height)`.
    pub frame: (f64, f64, f64, f64),
    /// Only the first facet draws its frame.
    pub framed: bool,
    pub points: Vec<SwarmPoint>,
    pub branches: Vec<SwarmBranch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwarmTick {
    pub value: f64,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmLayout {
    pub horizontal: bool,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub axis_label: String,
    pub ticks: Vec<SwarmTick>,
    pub groups: Vec<SwarmGroup>,
}

/// Greedy beeswarm placement along one axis.
///
/// Points are placed in the given order. Each takes the smallest non-negative offset from the
/// anchor at which its circle clears every earlier circle within reach. Returned values are
/// distances from the anchor to circle centres.
pub fn dodge(positions: &[f64], radius: f64, padding: f64) -> Vec<f64> {
    let reach = radius * 2.0 + padding;
    let mut placed: Vec<(f64, f64)> = Vec::with_capacity(positions.len());
    for &x in positions {
        let mut intervals = Vec::new();
        for &(xj, yj) in &placed {
            let dx = x - xj;
            if dx.abs() <= reach {
                let dy = (reach * reach - dx * dx).sqrt();
                intervals.push((yj - dy, yj + dy));
            }
        }
        let mut candidates: Vec<f64> = std::iter::once(0.0)
            .chain(intervals.iter().flat_map(|&(lo, hi)| [lo, hi]))
            .filter(|y| *y >= 0.0)
            .collect();
        candidates.sort_by(f64::total_cmp);
        let y = candidates
            .into_iter()
            .find(|y| {
                !intervals
                    .iter()
                    .any(|&(lo, hi)| *y > lo + DODGE_EPSILON && *y < hi - DODGE_EPSILON)
            })
            .unwrap_or(0.0);
        placed.push((x, y));
    }
    placed
        .into_iter()
        .map(|(_, y)| y + radius + padding)
        .collect()
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    connected: bool,
    parent: Option<usize>,
}

/// Groups placed circles into connected runs and returns each run's points.
///
/// A run grows while some unassigned circle touches a member that has not taken a link yet. A
/// circle touching only already linked members records that member as its parent and is drawn
/// through it when it later starts or joins another run.
pub fn connect_branches(
    centres: &[(f64, f64)],
    radius: f64,
    epsilon: f64,
    horizontal: bool,
) -> Vec<Vec<(f64, f64)>> {
    let mut nodes: Vec<Node> = centres
        .iter()
        .map(|&(x, y)| Node {
            x,
            y,
            connected: false,
            parent: None,
        })
        .collect();
    let near = |a: &Node, b: &Node| (a.x - b.x).hypot(a.y - b.y) <= radius * 2.0 + 1.0 + epsilon;

    let mut pending: Vec<usize> = (0..nodes.len()).collect();
    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut current: Option<Vec<usize>> = None;
    while !pending.is_empty() {
        let run = current.get_or_insert_with(|| vec![pending.remove(0)]);
        let mut added = false;
        let mut k = 0;
        while k < pending.len() {
            let node = pending[k];
            let mut joined = false;
            for m in 0..run.len() {
                let member = run[m];
                if !near(&nodes[node], &nodes[member]) {
                    continue;
                }
                if nodes[member].connected {
                    nodes[node].parent = Some(member);
                    continue;
                }
                nodes[member].connected = true;
                run.push(node);
                pending.remove(k);
                added = true;
                joined = true;
                break;
            }
            if !joined {
                k += 1;
            }
        }
        if !added && let Some(done) = current.take() {
            runs.push(done);
        }
    }
    if let Some(done) = current {
        runs.push(done);
    }

    let anchor = |node: &Node| {
        if horizontal {
            (node.x + radius, node.y)
        } else {
            (node.x, node.y + radius)
        }
    };
    runs.into_iter()
        .map(|run| {
            run.into_iter()
                .flat_map(|i| nodes[i].parent.into_iter().chain(std::iter::once(i)))
                .map(|i| anchor(&nodes[i]))
                .collect()
        })
        .collect()
}

/// d3-style tick values over `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (lo, hi) = if start < stop { (start, stop) } else { (stop, start) };
    let Some((i1, i2, inc)) = tick_spec(lo, hi, count) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    let values: Vec<f64> = (0..=(i2 - i1) as i64)
        .map(|i| {
            let v = i1 + i as f64;
            if inc < 0.0 { v / -inc } else { v * inc }
        })
        .collect();
    if start > stop {
        values.into_iter().rev().collect()
    } else {
        values
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(f64, f64, f64)> {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    if !power.is_finite() {
        return None;
    }
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    let (i1, i2, inc) = if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        let mut i1 = (start * scale).round();
        let mut i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        (i1, i2, -scale)
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut i1 = (start / inc).round();
        let mut i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
        (i1, i2, inc)
    };
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

struct Linear {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Linear {
    fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if d1 != d0 { (value - d0) / (d1 - d0) } else { 0.5 };
        r0 + (r1 - r0) * t
    }
}

/// Places records carrying a creation time on a two-day timeline.
///
/// Each record falls into the first group when created before the day cutoff and the second
/// otherwise. Offsets count minutes from the group's start instant, shifted so the earliest
/// record sits at zero. Records without a creation time are skipped.
pub fn swarm_layout(cells: &[ForestCell], horizontal: bool, config: &ForestConfig) -> SwarmLayout {
    let swarm = &config.swarm;
    let width = config.style_width - 40.0;
    let height = config.style_height - 20.0;
    let radius = swarm.radius;

    let mut timed: Vec<(usize, &ForestCell, f64)> = cells
        .iter()
        .filter_map(|cell| {
            let created = cell.created_at?;
            let (group, start) = if created < swarm.day_cutoff {
                (0, swarm.first_start)
            } else {
                (1, swarm.second_start)
            };
            Some((group, cell, (created - start).num_milliseconds() as f64))
        })
        .collect();
    let min = timed
        .iter()
        .map(|(_, _, offset)| *offset)
        .fold(f64::INFINITY, f64::min);
    for entry in &mut timed {
        entry.2 = (entry.2 - min) / 1000.0 / 60.0;
    }
    let max = timed
        .iter()
        .map(|(_, _, offset)| *offset)
        .fold(f64::NEG_INFINITY, f64::max);
    let domain = if timed.is_empty() { (0.0, 0.0) } else { (0.0, max) };

    let (left, right) = (swarm.margin_left, width - swarm.margin_right);
    let (top, bottom) = (swarm.margin_top, height - swarm.margin_bottom);
    let (scale, tick_count) = if horizontal {
        (
            Linear {
                domain,
                range: (left, right),
            },
            (right - left) / 80.0,
        )
    } else {
        (
            Linear {
                domain,
                range: (top, bottom),
            },
            (bottom - top) / 35.0,
        )
    };
    let tick_values = if timed.is_empty() {
        Vec::new()
    } else {
        ticks(domain.0, domain.1, tick_count)
    };
    let tick_marks = tick_values
        .into_iter()
        .map(|value| SwarmTick {
            value,
            position: scale.map(value),
        })
        .collect();

    let labels = [swarm.first_label.clone(), swarm.second_label.clone()];
    let mut groups = Vec::with_capacity(2);
    for (group, label) in labels.into_iter().enumerate() {
        let mut members: Vec<(&ForestCell, f64)> = timed
            .iter()
            .filter(|(g, _, _)| *g == group)
            .map(|(_, cell, offset)| (*cell, *offset))
            .collect();
        members.sort_by(|a, b| a.1.total_cmp(&b.1));
        let along: Vec<f64> = members.iter().map(|(_, offset)| scale.map(*offset)).collect();
        let across = dodge(&along, radius, swarm.padding);

        let (frame, anchor) = if horizontal {
            let band = (bottom - top) / 2.0;
            let y0 = top + band * group as f64;
            let anchor = if group == 0 { SwarmAnchor::Bottom } else { SwarmAnchor::Top };
            ((left, y0, right - left, band), anchor)
        } else {
            let band = (right - left) / 2.0;
            let x0 = left + band * group as f64;
            let anchor = if group == 0 { SwarmAnchor::Right } else { SwarmAnchor::Left };
            ((x0, top, band, bottom - top), anchor)
        };
        let (fx, fy, fw, fh) = frame;
        let points: Vec<SwarmPoint> = members
            .iter()
            .zip(along.iter().zip(&across))
            .map(|((cell, offset), (&a, &d))| {
                let (cx, cy) = match anchor {
                    SwarmAnchor::Bottom => (a, fy + fh - d),
                    SwarmAnchor::Top => (a, fy + d),
                    SwarmAnchor::Right => (fx + fw - d, a),
                    SwarmAnchor::Left => (fx + d, a),
                };
                SwarmPoint {
                    name: cell.name.clone(),
                    offset: *offset,
                    cx,
                    cy,
                }
            })
            .collect();

        let centres: Vec<(f64, f64)> = points.iter().map(|p| (p.cx, p.cy)).collect();
        let branches = connect_branches(&centres, radius, swarm.near_epsilon, horizontal)
            .into_iter()
            .map(|points| SwarmBranch {
                path: catmull_rom(&points),
                points,
            })
            .collect();
        groups.push(SwarmGroup {
            label,
            anchor,
            frame,
            framed: group == 0,
            points,
            branches,
        });
    }

    tracing::debug!(
        points = timed.len(),
        skipped = cells.len() - timed.len(),
        horizontal,
        "swarm placed"
    );
    SwarmLayout {
        horizontal,
        width,
        height,
        radius,
        axis_label: "Time (minutes)".to_string(),
        ticks: tick_marks,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(cell: &str, minutes_after_first_start: i64) -> ForestCell {
        let start = Utc.with_ymd_and_hms(2025, 5, 11, 18, 0, 0).unwrap();
        let mut out = ForestCell::new(cell, 480.0);
        out.created_at = Some(start + Duration::minutes(minutes_after_first_start));
        out
    }

    #[test]
    fn dodge_stacks_coincident_points() {
        let ys = dodge(&[100.0, 100.0, 100.0], 25.0, 1.0);
        assert_eq!(ys, vec![26.0, 77.0, 128.0]);
    }

    #[test]
    fn dodge_keeps_distant_points_on_the_axis() {
        let ys = dodge(&[0.0, 200.0], 25.0, 1.0);
        assert_eq!(ys, vec![26.0, 26.0]);
    }

    #[test]
    fn dodged_circles_do_not_overlap() {
        let xs = [0.0, 10.0, 20.0, 30.0, 45.0, 60.0, 61.0];
        let ys = dodge(&xs, 25.0, 1.0);
        for i in 0..xs.len() {
            for j in 0..i {
                let d = (xs[i] - xs[j]).hypot(ys[i] - ys[j]);
                assert!(d >= 51.0 - 1e-6, "{i} and {j} are {d} apart");
            }
        }
    }

    #[test]
    fn branches_chain_touching_circles() {
        let centres = [(0.0, 0.0), (51.0, 0.0), (102.0, 0.0), (500.0, 0.0)];
        let runs = connect_branches(&centres, 25.0, 0.1, true);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(25.0, 0.0), (76.0, 0.0), (127.0, 0.0)]);
        assert_eq!(runs[1], vec![(525.0, 0.0)]);
    }

    #[test]
    fn branch_through_a_linked_member_records_its_parent() {
        // 1 and 2 both touch 0; 0 links to 1 first, so 2 starts a new run through 0
        let centres = [(0.0, 0.0), (51.0, 0.0), (0.0, 51.0)];
        let runs = connect_branches(&centres, 25.0, 0.1, false);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(0.0, 25.0), (51.0, 25.0)]);
        assert_eq!(runs[1], vec![(0.0, 25.0), (0.0, 76.0)]);
    }

    #[test]
    fn ticks_match_d3() {
        assert_eq!(ticks(0.0, 10.0, 5.0), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(0.0, 1.0, 4.0), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(3.0, 3.0, 10.0), vec![3.0]);
        assert!(ticks(0.0, 1.0, 0.0).is_empty());
    }

    #[test]
    fn groups_split_on_the_day_cutoff() {
        let config = ForestConfig::default();
        let mut untimed = ForestCell::new("ghost", 480.0);
        untimed.created_at = None;
        // 18:00 on the 11th, 18:30 on the 11th, 20:10 on the 12th
        let cells = vec![at("a", 0), at("b", 30), at("c", 26 * 60 + 10), untimed];
        let layout = swarm_layout(&cells, true, &config);

        assert_eq!(layout.groups.len(), 2);
        let first: Vec<&str> = layout.groups[0].points.iter().map(|p| p.name.as_str()).collect();
        let second: Vec<&str> = layout.groups[1].points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(first, ["a", "b"]);
        assert_eq!(second, ["c"]);
        assert_eq!(layout.groups[0].points[1].offset, 30.0);
        assert_eq!(layout.groups[1].points[0].offset, 10.0);
        assert_eq!(layout.width, 1160.0);
        assert_eq!(layout.height, 780.0);
    }

    #[test]
    fn horizontal_anchors_first_group_at_the_bottom() {
        let config = ForestConfig::default();
        let cells = vec![at("a", 0), at("b", 30), at("c", 24 * 60 + 120 + 30)];
        let layout = swarm_layout(&cells, true, &config);
        let first = &layout.groups[0];
        let (_, fy, _, fh) = first.frame;
        assert_eq!(first.anchor, SwarmAnchor::Bottom);
        assert_eq!(first.points[0].cy, fy + fh - 26.0);
        assert_eq!(first.points[0].cx, 80.0);

        let second = &layout.groups[1];
        assert_eq!(second.anchor, SwarmAnchor::Top);
        assert_eq!(second.points[0].cy, second.frame.1 + 26.0);
        // both groups share the time scale
        assert_eq!(second.points[0].cx, first.points[1].cx);
        assert!(first.framed && !second.framed);
        assert!(!layout.ticks.is_empty());
    }

    #[test]
    fn vertical_swaps_axes() {
        let config = ForestConfig::default();
        let cells = vec![at("a", 0), at("b", 60)];
        let layout = swarm_layout(&cells, false, &config);
        let first = &layout.groups[0];
        assert_eq!(first.anchor, SwarmAnchor::Right);
        let (fx, _, fw, _) = first.frame;
        assert_eq!(first.points[0].cx, fx + fw - 26.0);
        assert!(first.points[0].cy < first.points[1].cy);
    }

    #[test]
    fn empty_input_yields_empty_facets() {
        let layout = swarm_layout(&[], true, &ForestConfig::default());
        assert!(layout.groups.iter().all(|g| g.points.is_empty()));
        assert!(layout.ticks.is_empty());
    }
}
