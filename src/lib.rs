//! Deterministic text-to-tree drawings and forests of them.
//!
//! A string is encoded into the decimal UTF-16 codes of its characters. Leading `1`/`10…`
//! tokens become flowers on the baseline and the remaining digits grow a tree breadth first, one
//! digit per node giving its child count. The same text always yields the same drawing.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod forest;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod random;
pub mod render;
pub mod scene;
pub mod stamp;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ForestConfig, TreeLayoutConfig, TreeOptions, load_config};
pub use error::{StampError, TreeError};
pub use forest::{
    ForestCell, ForestEvent, ForestHandle, ForestLayout, ForestLayoutKind, LayoutRequest,
    PositionCache, SortKey, ViewState, ViewTransform, Viewport, ZoomController,
};
pub use ir::NameRecord;
pub use layout::{TreeLayout, compute_tree_layout};
pub use parser::{encode, parse_text};
pub use scene::{Document, Element};
pub use stamp::{GlyphRenderer, WordCellStamp};
pub use theme::Theme;

/// Everything needed to draw one tree.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub tree: TreeOptions,
    pub layout: TreeLayoutConfig,
}

impl RenderOptions {
    pub fn paper() -> Self {
        Self::default()
    }

    pub fn night() -> Self {
        Self {
            theme: Theme::night(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            theme: config.theme.clone(),
            tree: config.options.clone(),
            layout: config.tree.clone(),
        }
    }

    pub fn with_tree_options(mut self, tree: TreeOptions) -> Self {
        self.tree = tree;
        self
    }
}

/// Draws `text` on the paper theme with the built-in signature stamp.
pub fn render_tree(text: &str, options: &TreeOptions) -> Result<Document, TreeError> {
    render_tree_with(text, &RenderOptions::paper().with_tree_options(options.clone()), None)
}

/// Draws `text`, using `renderer` for the signature stamp when given.
pub fn render_tree_with(
    text: &str,
    options: &RenderOptions,
    renderer: Option<&dyn GlyphRenderer>,
) -> Result<Document, TreeError> {
    options.tree.validate(&options.layout)?;
    let fallback;
    let renderer: &dyn GlyphRenderer = match renderer {
        Some(renderer) => renderer,
        None => {
            fallback = WordCellStamp::new(&options.theme, options.layout.stamp.stroke_width);
            &fallback
        }
    };
    Ok(render::render_tree_document(
        text,
        &options.tree,
        &options.layout,
        &options.theme,
        renderer,
    ))
}

pub fn render_tree_svg(text: &str, options: RenderOptions) -> Result<String, TreeError> {
    Ok(render_tree_with(text, &options, None)?.to_svg())
}

/// A debounced forest over the named records; drive it with `update` and `poll`.
pub fn render_forest(records: &[NameRecord], config: ForestConfig) -> ForestHandle {
    ForestHandle::from_records(records, config)
}

/// Serializes the handle's latest layout, if one has been computed.
pub fn render_forest_svg(
    handle: &ForestHandle,
    transform: ViewTransform,
    config: &Config,
) -> Option<String> {
    let renderer = WordCellStamp::new(&config.theme, config.tree.stamp.stroke_width);
    handle
        .layout()
        .map(|layout| render::render_forest_document(layout, transform, config, &renderer).to_svg())
}
