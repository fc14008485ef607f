pub mod affine;
mod branch;
pub mod curve;
pub mod rose;
mod types;

pub use affine::Affine;
pub use branch::{WalkOutput, petal_ratio, walk_tree};
pub use types::*;

use crate::config::{TreeLayoutConfig, TreeOptions};
use crate::ir::ParsedText;
use crate::random::Lcg;

/// Lays out one tree: flowers on the baseline, then the branch walk seeded from the text.
pub fn compute_tree_layout(
    parsed: &ParsedText,
    options: &TreeOptions,
    config: &TreeLayoutConfig,
) -> TreeLayout {
    let baseline_y = config.baseline_y();
    let mut rng = Lcg::new(parsed.seed);
    let origin = Affine::IDENTITY.translate(config.width / 2.0, baseline_y);
    let walk = walk_tree(&parsed.tree, origin, &mut rng, config, options.count);

    let flowers = layout_flowers(&parsed.segments.flowers, parsed.has_tree_body(), config);
    let draw_tree = parsed.has_tree_body() || flowers.is_empty();

    tracing::debug!(
        digits = parsed.digits.len(),
        flowers = flowers.len(),
        branches = walk.branches.len(),
        buds = walk.buds.len(),
        roses = walk.roses.len(),
        draws = rng.calls(),
        "tree layout"
    );

    TreeLayout {
        text: parsed.text.clone(),
        digits: parsed.digits.clone(),
        width: config.width,
        height: config.height,
        baseline_y,
        draw_tree,
        branches: walk.branches,
        buds: walk.buds,
        roses: walk.roses,
        counts: walk.counts,
        flowers,
        merges: walk.merges,
        random_draws: rng.calls(),
    }
}

/// Places flower segments evenly over `[middle - 10k, middle + 10k]`; a single flower sits at
/// the middle. The middle is a quarter of the width when a tree shares the canvas.
pub fn layout_flowers(
    tokens: &[String],
    has_tree: bool,
    config: &TreeLayoutConfig,
) -> Vec<FlowerLayout> {
    let k = tokens.len();
    let middle = if has_tree {
        config.width * 0.25
    } else {
        config.width / 2.0
    };
    let range = k as f64 * config.flower_spacing;
    let (start, stop) = (middle - range, middle + range);
    let step = (stop - start) / (k.saturating_sub(1).max(1)) as f64;
    let first = start + (stop - start - step * k.saturating_sub(1) as f64) * 0.5;

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| FlowerLayout {
            token: token.clone(),
            x: first + step * i as f64,
            petals: PetalRatio {
                n: 1,
                d: i as u32 + 2,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;

    fn layout(text: &str, options: &TreeOptions) -> TreeLayout {
        compute_tree_layout(&parse_text(text), options, &TreeLayoutConfig::default())
    }

    #[test]
    fn layout_is_deterministic() {
        let options = TreeOptions::default();
        for text in ["Your Name", "AB", "", "hello world", "🌳"] {
            assert_eq!(layout(text, &options), layout(text, &options));
        }
    }

    #[test]
    fn flowers_spread_around_the_middle() {
        let config = TreeLayoutConfig::default();
        let tokens: Vec<String> = ["1", "10", "100"].iter().map(|s| s.to_string()).collect();
        let flowers = layout_flowers(&tokens, true, &config);
        let xs: Vec<f64> = flowers.iter().map(|f| f.x).collect();
        assert_eq!(xs, vec![90.0, 120.0, 150.0]);
        assert_eq!(flowers[2].petals, PetalRatio { n: 1, d: 4 });

        let single = layout_flowers(&tokens[..1], false, &config);
        assert_eq!(single[0].x, 240.0);
        assert!(layout_flowers(&[], true, &config).is_empty());
    }

    #[test]
    fn flower_only_text_skips_the_tree() {
        let only_flowers = layout("ooo", &TreeOptions::default());
        assert_eq!(only_flowers.flowers.len(), 9);
        assert!(!only_flowers.draw_tree);

        let empty = layout("", &TreeOptions::default());
        assert!(empty.flowers.is_empty());
        assert!(empty.draw_tree);
        assert_eq!(empty.branches.len(), 1);
        assert_eq!(empty.buds.len(), 1);
    }

    #[test]
    fn count_option_reaches_the_walk() {
        let options = TreeOptions {
            count: true,
            ..TreeOptions::default()
        };
        let counted = layout("Your Name", &options);
        assert!(!counted.counts.is_empty());
        assert!(counted.merges.is_empty());
        assert!(counted.roses.is_empty());
    }
}
