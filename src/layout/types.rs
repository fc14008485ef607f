use super::affine::Affine;
use serde::Serialize;

/// Petal ratio `n/d` of a rose curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PetalRatio {
    pub n: u32,
    pub d: u32,
}

/// A trunk or branch: the segment from the origin to `(0, -length)` under `transform`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchPrimitive {
    pub length: f64,
    pub transform: Affine,
}

impl BranchPrimitive {
    pub fn path(&self) -> String {
        format!("M0,0L0,{}", crate::scene::num(-self.length))
    }
}

/// A terminal bud, a disc centred on the transform origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudPrimitive {
    pub radius: f64,
    pub transform: Affine,
}

/// A rose terminating a run of merged sibling leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosePrimitive {
    pub radius: f64,
    pub petals: PetalRatio,
    pub merge_count: u32,
    pub transform: Affine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountLabel {
    pub count: usize,
    pub transform: Affine,
}

/// A flower segment standing on the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowerLayout {
    pub token: String,
    pub x: f64,
    pub petals: PetalRatio,
}

/// A merge decision taken at one internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeRun {
    pub child_count: usize,
    pub start: usize,
    pub count: usize,
}

impl MergeRun {
    /// Index of the child that carries the merged rose.
    pub fn end(&self) -> usize {
        self.start + self.count - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub text: String,
    pub digits: String,
    pub width: f64,
    pub height: f64,
    pub baseline_y: f64,
    /// Whether the branch body is drawn; flowers alone otherwise.
    pub draw_tree: bool,
    pub branches: Vec<BranchPrimitive>,
    pub buds: Vec<BudPrimitive>,
    pub roses: Vec<RosePrimitive>,
    pub counts: Vec<CountLabel>,
    pub flowers: Vec<FlowerLayout>,
    pub merges: Vec<MergeRun>,
    pub random_draws: u64,
}
