use crate::layout::{MergeRun, TreeLayout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub text: String,
    pub digits: String,
    pub width: f64,
    pub height: f64,
    pub baseline_y: f64,
    pub draw_tree: bool,
    pub random_draws: u64,
    pub branches: Vec<BranchDump>,
    pub buds: Vec<TerminalDump>,
    pub roses: Vec<RoseDump>,
    pub flowers: Vec<FlowerDump>,
    pub merges: Vec<MergeRun>,
}

#[derive(Debug, Serialize)]
pub struct BranchDump {
    pub length: f64,
    pub transform: String,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct TerminalDump {
    pub radius: f64,
    pub transform: String,
    pub center: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct RoseDump {
    pub radius: f64,
    pub n: u32,
    pub d: u32,
    pub merge_count: u32,
    pub transform: String,
    pub center: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct FlowerDump {
    pub token: String,
    pub x: f64,
    pub n: u32,
    pub d: u32,
}

impl LayoutDump {
    pub fn from_layout(layout: &TreeLayout) -> Self {
        let branches = layout
            .branches
            .iter()
            .map(|branch| {
                let (x0, y0) = branch.transform.origin();
                let (x1, y1) = branch.transform.apply(0.0, -branch.length);
                BranchDump {
                    length: branch.length,
                    transform: branch.transform.to_svg(),
                    start: [x0, y0],
                    end: [x1, y1],
                }
            })
            .collect();

        let buds = layout
            .buds
            .iter()
            .map(|bud| {
                let (x, y) = bud.transform.origin();
                TerminalDump {
                    radius: bud.radius,
                    transform: bud.transform.to_svg(),
                    center: [x, y],
                }
            })
            .collect();

        let roses = layout
            .roses
            .iter()
            .map(|rose| {
                let (x, y) = rose.transform.origin();
                RoseDump {
                    radius: rose.radius,
                    n: rose.petals.n,
                    d: rose.petals.d,
                    merge_count: rose.merge_count,
                    transform: rose.transform.to_svg(),
                    center: [x, y],
                }
            })
            .collect();

        let flowers = layout
            .flowers
            .iter()
            .map(|flower| FlowerDump {
                token: flower.token.clone(),
                x: flower.x,
                n: flower.petals.n,
                d: flower.petals.d,
            })
            .collect();

        LayoutDump {
            text: layout.text.clone(),
            digits: layout.digits.clone(),
            width: layout.width,
            height: layout.height,
            baseline_y: layout.baseline_y,
            draw_tree: layout.draw_tree,
            random_draws: layout.random_draws,
            branches,
            buds,
            roses,
            flowers,
            merges: layout.merges.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &TreeLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TreeLayoutConfig, TreeOptions};
    use crate::layout::compute_tree_layout;
    use crate::parser::parse_text;

    #[test]
    fn trunk_starts_on_the_baseline() {
        let config = TreeLayoutConfig::default();
        let layout = compute_tree_layout(&parse_text("Ada"), &TreeOptions::default(), &config);
        let dump = LayoutDump::from_layout(&layout);
        let trunk = &dump.branches[0];
        assert!((trunk.start[0] - 240.0).abs() < 1e-3);
        assert!((trunk.start[1] - config.baseline_y()).abs() < 1e-3);
        assert!((trunk.end[1] - (config.baseline_y() - 140.0)).abs() < 1e-3);

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["digits"], "6510097");
        assert_eq!(json["branches"].as_array().unwrap().len(), layout.branches.len());
    }
}
