use super::affine::Affine;
use super::types::{
    BranchPrimitive, BudPrimitive, CountLabel, MergeRun, PetalRatio, RosePrimitive,
};
use crate::config::TreeLayoutConfig;
use crate::ir::{DigitTree, TreeNode};
use crate::random::Lcg;

/// Petal ratio for a merged run. Runs are drawn from `3..10` and so never exceed 9.
pub fn petal_ratio(merge_count: u32) -> Option<PetalRatio> {
    let (n, d) = match merge_count {
        3 => (3, 1),
        4 => (4, 2),
        5 => (5, 3),
        6 => (3, 2),
        7 => (7, 3),
        8 => (4, 2),
        9 => (3, 2),
        _ => return None,
    };
    Some(PetalRatio { n, d })
}

#[derive(Debug, Default)]
pub struct WalkOutput {
    pub branches: Vec<BranchPrimitive>,
    pub buds: Vec<BudPrimitive>,
    pub roses: Vec<RosePrimitive>,
    pub counts: Vec<CountLabel>,
    pub merges: Vec<MergeRun>,
}

struct BranchWalk<'a> {
    tree: &'a DigitTree,
    config: &'a TreeLayoutConfig,
    rng: &'a mut Lcg,
    count_mode: bool,
    out: WalkOutput,
}

/// A branch waiting to be drawn, with the frame of its parent's tip.
struct Pending {
    id: usize,
    len: f64,
    rotation: f64,
    spread: f64,
    merge: u32,
    context: Affine,
}

/// Lays out `tree` with its trunk standing at `origin`.
///
/// Every node draws a branch in its rotated frame. Children fan out over the parent's spread,
/// each taking an angular slot proportional to its leaf count. Leaves end in a bud, or in a rose
/// when they close a merged run of siblings. Nodes are visited depth first in child order, which
/// fixes the order of the random draws.
pub fn walk_tree(
    tree: &DigitTree,
    origin: Affine,
    rng: &mut Lcg,
    config: &TreeLayoutConfig,
    count_mode: bool,
) -> WalkOutput {
    let mut walk = BranchWalk {
        tree,
        config,
        rng,
        count_mode,
        out: WalkOutput::default(),
    };
    let mut stack = vec![Pending {
        id: DigitTree::ROOT,
        len: config.trunk_length,
        rotation: 0.0,
        spread: config.initial_spread,
        merge: 0,
        context: origin,
    }];
    while let Some(pending) = stack.pop() {
        walk.branch(pending, &mut stack);
    }
    walk.out
}

impl BranchWalk<'_> {
    fn branch(&mut self, pending: Pending, stack: &mut Vec<Pending>) {
        let node = *self.tree.node(pending.id);
        let context = pending.context.rotate(pending.rotation);
        self.out.branches.push(BranchPrimitive {
            length: pending.len,
            transform: context,
        });

        if node.is_leaf() {
            self.terminate(pending.len, pending.merge, context);
            return;
        }

        let context = context.translate(0.0, -pending.len);
        let len = pending.len * self.config.decay;
        let spread = pending.spread;
        let n = node.child_count;

        let mut stacked = Vec::with_capacity(n);
        let mut sum = 0usize;
        for child in node.children() {
            sum += self.tree.node(child).leaves;
            stacked.push(sum as f64);
        }
        let total = sum as f64;
        let scale = |value: f64| {
            let t = value / total;
            -spread * (1.0 - t) + spread * t
        };

        if self.count_mode {
            self.out.counts.push(CountLabel {
                count: n,
                transform: context,
            });
        }

        let run = self.pick_merge(&node);

        let first = stack.len();
        for (i, child) in node.children().enumerate() {
            let prev = match run {
                Some(run) if i >= run.start && i < run.end() => continue,
                Some(run) if i == run.end() => Some(run.start),
                _ => i.checked_sub(1),
            };
            let child_rotation = scale(stacked[i]);
            let prev_rotation = prev.map(|p| scale(stacked[p])).unwrap_or(-spread);
            let slot = child_rotation - prev_rotation;
            let merge = match run {
                Some(run) if i == run.end() => run.count as u32,
                _ => 0,
            };
            stack.push(Pending {
                id: child,
                len,
                rotation: (child_rotation + prev_rotation) / 2.0,
                spread: self.config.max_spread.min(slot),
                merge,
                context,
            });
        }
        // first child on top
        stack[first..].reverse();
    }

    /// Wide fans of bare leaves collapse a random contiguous run into one rose.
    fn pick_merge(&mut self, node: &TreeNode) -> Option<MergeRun> {
        let n = node.child_count;
        let bare = node.children().all(|child| self.tree.node(child).is_leaf());
        if n <= 2 || self.count_mode || !bare {
            return None;
        }
        let upper = n.min(self.config.merge_max as usize) as f64;
        let count = self
            .rng
            .uniform_int(f64::from(self.config.merge_min), upper);
        if count <= 0 {
            return None;
        }
        let start = self.rng.uniform_int(0.0, (n as i64 - count) as f64).max(0);
        let run = MergeRun {
            child_count: n,
            start: start as usize,
            count: count as usize,
        };
        self.out.merges.push(run);
        Some(run)
    }

    fn terminate(&mut self, len: f64, merge: u32, context: Affine) {
        if merge > 0 {
            if let Some(petals) = petal_ratio(merge) {
                self.out.roses.push(RosePrimitive {
                    radius: (f64::from(merge) * len).sqrt(),
                    petals,
                    merge_count: merge,
                    transform: context.translate(0.0, -len),
                });
                return;
            }
            tracing::debug!(merge, "no petal ratio for merged run, drawing a bud");
        }
        let radius = len / self.config.bud_divisor;
        self.out.buds.push(BudPrimitive {
            radius,
            transform: context.translate(0.0, -len - radius),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{build_tree, parse_text};

    fn walk(digits: &str, seed: f64, count_mode: bool) -> WalkOutput {
        let config = TreeLayoutConfig::default();
        let mut rng = Lcg::new(seed);
        let origin = Affine::IDENTITY.translate(240.0, config.baseline_y());
        walk_tree(&build_tree(digits), origin, &mut rng, &config, count_mode)
    }

    #[test]
    fn three_leaves_always_merge_into_one_rose() {
        let out = walk("3000", 0.0, false);
        assert_eq!(out.branches.len(), 2);
        assert_eq!(out.roses.len(), 1);
        assert!(out.buds.is_empty());
        let rose = &out.roses[0];
        assert_eq!(rose.merge_count, 3);
        assert_eq!(rose.petals, PetalRatio { n: 3, d: 1 });
        let len: f64 = 140.0 * 0.618;
        assert!((rose.radius - (3.0 * len).sqrt()).abs() < 1e-12);
        assert_eq!(out.merges, vec![MergeRun { child_count: 3, start: 0, count: 3 }]);
    }

    #[test]
    fn count_mode_disables_merging() {
        let out = walk("3000", 0.0, true);
        assert!(out.roses.is_empty());
        assert_eq!(out.buds.len(), 3);
        assert_eq!(out.branches.len(), 4);
        assert_eq!(out.counts.len(), 1);
        assert_eq!(out.counts[0].count, 3);
    }

    #[test]
    fn single_leaf_root_is_trunk_and_bud() {
        let out = walk("", 0.0, false);
        assert_eq!(out.branches.len(), 1);
        assert_eq!(out.buds.len(), 1);
        assert!((out.buds[0].radius - 140.0 / 12.0).abs() < 1e-12);
        let (x, y) = out.buds[0].transform.origin();
        let baseline = TreeLayoutConfig::default().baseline_y();
        assert!((x - 240.0).abs() < 1e-3);
        assert!((y - (baseline - 140.0 - 140.0 / 12.0)).abs() < 1e-3);
    }

    #[test]
    fn two_children_split_the_spread_evenly() {
        let out = walk("20", 0.0, false);
        assert_eq!(out.branches.len(), 3);
        assert_eq!(out.buds.len(), 2);
        let left = out.branches[1].transform.0;
        let right = out.branches[2].transform.0;
        // rotations of -40 and +40 degrees
        assert!((f64::from(left[1]) - (-40f64).to_radians().sin()).abs() < 1e-6);
        assert!((f64::from(right[1]) - 40f64.to_radians().sin()).abs() < 1e-6);
    }

    #[test]
    fn merge_bounds_hold_for_many_texts() {
        let config = TreeLayoutConfig::default();
        for text in ["Your Name", "AB", "Grace Hopper", "zzzz", "tree of life", "🌳🌲", "x"] {
            let parsed = parse_text(text);
            let mut rng = Lcg::new(parsed.seed);
            let out = walk_tree(&parsed.tree, Affine::IDENTITY, &mut rng, &config, false);
            for run in &out.merges {
                assert!(run.count >= 3);
                assert!(run.count <= run.child_count.min(10));
                assert!(run.end() < run.child_count);
            }
            let terminals = out.buds.len() + out.roses.len();
            let merged: usize = out.merges.iter().map(|run| run.count - 1).sum();
            assert_eq!(terminals + merged, parsed.tree.leaf_count());
        }
    }

    #[test]
    fn deep_chains_walk_without_recursion() {
        let out = walk(&"1".repeat(200_000), 7.0, false);
        assert_eq!(out.branches.len(), 200_001);
        assert_eq!(out.buds.len(), 1);
        assert!(out.merges.is_empty());
    }

    #[test]
    fn children_are_visited_in_order() {
        // root fans into a two-child node and a leaf; the inner node's branches come first
        let out = walk("2200", 0.0, false);
        assert_eq!(out.branches.len(), 5);
        let inner_tip = out.branches[1].transform.translate(0.0, -out.branches[1].length).origin();
        let grandchild = out.branches[2].transform.origin();
        assert!((inner_tip.0 - grandchild.0).abs() < 1e-3);
        assert!((inner_tip.1 - grandchild.1).abs() < 1e-3);
    }

    #[test]
    fn petal_table_covers_three_to_nine() {
        assert!(petal_ratio(2).is_none());
        assert!(petal_ratio(10).is_none());
        for count in 3..=9 {
            assert!(petal_ratio(count).is_some());
        }
    }
}
