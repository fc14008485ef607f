use crate::error::TreeError;
use crate::theme::Theme;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-call switches of the tree renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeOptions {
    /// Stroke of the grid frame.
    pub stroke: String,
    pub grid: bool,
    /// Inset of the baseline from both canvas edges.
    pub padding: f64,
    /// Digit footer.
    pub number: bool,
    /// Signature stamp.
    pub stamp: bool,
    /// Child-count discs; disables the merge heuristic.
    pub count: bool,
    /// Baseline.
    pub line: bool,
    /// Right-align the stamp instead of starting it at the canvas centre.
    pub end: bool,
    /// Pen-plotter output: hachure fills and a stroked footer.
    pub plot: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            stroke: "black".to_string(),
            grid: false,
            padding: 20.0,
            number: true,
            stamp: true,
            count: false,
            line: true,
            end: true,
            plot: false,
        }
    }
}

impl TreeOptions {
    /// Options used for trees drawn inside a forest cell.
    pub fn forest_cell(line: bool) -> Self {
        Self {
            padding: 0.0,
            number: false,
            line,
            end: false,
            ..Self::default()
        }
    }

    pub fn validate(&self, layout: &TreeLayoutConfig) -> Result<(), TreeError> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(TreeError::InvalidOption(format!(
                "padding must be a non-negative number, got {}",
                self.padding
            )));
        }
        if self.padding * 2.0 > layout.width {
            return Err(TreeError::InvalidOption(format!(
                "padding {} leaves no room for the baseline on a {} wide canvas",
                self.padding, layout.width
            )));
        }
        if self.stroke.trim().is_empty() {
            return Err(TreeError::InvalidOption("stroke must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampConfig {
    pub max_words: usize,
    pub cell_size: f64,
    pub padding: f64,
    /// Gap between the stamp cells and the baseline.
    pub baseline_gap: f64,
    pub stroke_width: f64,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            max_words: 4,
            cell_size: 80.0,
            padding: 20.0,
            baseline_gap: 5.0,
            stroke_width: 1.5,
        }
    }
}

/// Constants of the single-tree layout. Changing any of them changes every drawing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeLayoutConfig {
    pub width: f64,
    pub height: f64,
    pub trunk_length: f64,
    pub decay: f64,
    pub baseline_ratio: f64,
    pub initial_spread: f64,
    pub max_spread: f64,
    pub bud_divisor: f64,
    pub merge_min: u32,
    pub merge_max: u32,
    pub rose_step: f64,
    pub flower_radius: f64,
    pub flower_spacing: f64,
    pub count_radius: f64,
    pub footer_chars: usize,
    pub plot_footer_chars: usize,
    pub fallback_chars: usize,
    pub footer_dx: f64,
    pub footer_dy: f64,
    pub fallback_dy: f64,
    pub plot_footer_origin: (f64, f64),
    pub plot_glyph_scale: f64,
    pub hachure_gap: f64,
    pub hachure_angle: f64,
    pub stamp: StampConfig,
}

impl Default for TreeLayoutConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 480.0,
            trunk_length: 140.0,
            decay: 0.618,
            baseline_ratio: 0.618,
            initial_spread: 80.0,
            max_spread: 80.0,
            bud_divisor: 12.0,
            merge_min: 3,
            merge_max: 10,
            rose_step: 0.02,
            flower_radius: 12.0,
            flower_spacing: 10.0,
            count_radius: 14.0,
            footer_chars: 58,
            plot_footer_chars: 40,
            fallback_chars: 18,
            footer_dx: -20.0,
            footer_dy: -26.0,
            fallback_dy: -55.0,
            plot_footer_origin: (448.0, 448.0),
            plot_glyph_scale: 0.5,
            hachure_gap: 2.0,
            hachure_angle: -41.0,
            stamp: StampConfig::default(),
        }
    }
}

impl TreeLayoutConfig {
    pub fn baseline_y(&self) -> f64 {
        self.height * self.baseline_ratio + self.trunk_length
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// Fixed column count; derived from the aspect ratio when absent.
    pub columns: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Radius growth per full turn of the spiral.
    pub increase: f64,
    pub padding: f64,
    pub jitter_radius: f64,
    pub jitter_seed_scale: f64,
    /// Candidates tried per cell before the last one is accepted.
    pub max_iterations: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            increase: 10.0,
            padding: 20.0,
            jitter_radius: 240.0,
            jitter_seed_scale: 1000.0,
            max_iterations: 500_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    pub first_label: String,
    pub second_label: String,
    /// Records created before this instant belong to the first day.
    pub day_cutoff: DateTime<Utc>,
    pub first_start: DateTime<Utc>,
    pub second_start: DateTime<Utc>,
    pub radius: f64,
    pub padding: f64,
    pub near_epsilon: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub horizontal: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            first_label: "First Day\n2025-05-11".to_string(),
            second_label: "Second Day\n2025-05-12".to_string(),
            day_cutoff: utc(2025, 5, 12, 0),
            first_start: utc(2025, 5, 11, 18),
            second_start: utc(2025, 5, 12, 20),
            radius: 25.0,
            padding: 1.0,
            near_epsilon: 0.1,
            margin_left: 80.0,
            margin_right: 50.0,
            margin_top: 30.0,
            margin_bottom: 50.0,
            horizontal: true,
        }
    }
}

fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub cell_size: f64,
    pub style_width: f64,
    pub style_height: f64,
    pub debounce_ms: u64,
    pub zoom_duration_multiplier: f64,
    pub per_page: usize,
    pub grid: GridConfig,
    pub cloud: CloudConfig,
    pub swarm: SwarmConfig,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            cell_size: 480.0,
            style_width: 1200.0,
            style_height: 800.0,
            debounce_ms: 50,
            zoom_duration_multiplier: 1.2,
            per_page: 16,
            grid: GridConfig::default(),
            cloud: CloudConfig::default(),
            swarm: SwarmConfig::default(),
        }
    }
}

impl ForestConfig {
    pub fn half_cell(&self) -> f64 {
        self.cell_size / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub font_family: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 480.0,
            background: "#FEFAF1".to_string(),
            font_family: "monospace".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub options: TreeOptions,
    pub tree: TreeLayoutConfig,
    pub forest: ForestConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    ink: Option<String>,
    count_text: Option<String>,
    stroke_width: Option<f32>,
    footer_font_size: Option<f32>,
    axis_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TreeOptionsFile {
    stroke: Option<String>,
    grid: Option<bool>,
    padding: Option<f64>,
    number: Option<bool>,
    stamp: Option<bool>,
    count: Option<bool>,
    line: Option<bool>,
    end: Option<bool>,
    plot: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TreeLayoutFile {
    width: Option<f64>,
    height: Option<f64>,
    trunk_length: Option<f64>,
    decay: Option<f64>,
    max_spread: Option<f64>,
    stamp_max_words: Option<usize>,
    stamp_cell_size: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ForestFile {
    cell_size: Option<f64>,
    style_width: Option<f64>,
    style_height: Option<f64>,
    debounce_ms: Option<u64>,
    zoom_duration_multiplier: Option<f64>,
    per_page: Option<usize>,
    columns: Option<usize>,
    cloud_padding: Option<f64>,
    cloud_increase: Option<f64>,
    max_iterations: Option<usize>,
    swarm_radius: Option<f64>,
    horizontal: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    tree: Option<TreeOptionsFile>,
    layout: Option<TreeLayoutFile>,
    forest: Option<ForestFile>,
}

/// Reads a JSON or JSON5 config and overlays it onto the defaults. All keys are optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(name) = parsed.theme.as_deref() {
        match Theme::by_name(name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = name, "unknown theme, keeping the default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.ink {
            config.theme.ink = v;
        }
        if let Some(v) = vars.count_text {
            config.theme.count_text = v;
        }
        if let Some(v) = vars.stroke_width {
            config.theme.stroke_width = v;
        }
        if let Some(v) = vars.footer_font_size {
            config.theme.footer_font_size = v;
        }
        if let Some(v) = vars.axis_color {
            config.theme.axis_color = v;
        }
    }

    if let Some(tree) = parsed.tree {
        let options = &mut config.options;
        if let Some(v) = tree.stroke {
            options.stroke = v;
        }
        if let Some(v) = tree.grid {
            options.grid = v;
        }
        if let Some(v) = tree.padding {
            options.padding = v;
        }
        if let Some(v) = tree.number {
            options.number = v;
        }
        if let Some(v) = tree.stamp {
            options.stamp = v;
        }
        if let Some(v) = tree.count {
            options.count = v;
        }
        if let Some(v) = tree.line {
            options.line = v;
        }
        if let Some(v) = tree.end {
            options.end = v;
        }
        if let Some(v) = tree.plot {
            options.plot = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let tree = &mut config.tree;
        if let Some(v) = layout.width {
            tree.width = v;
        }
        if let Some(v) = layout.height {
            tree.height = v;
        }
        if let Some(v) = layout.trunk_length {
            tree.trunk_length = v;
        }
        if let Some(v) = layout.decay {
            tree.decay = v;
        }
        if let Some(v) = layout.max_spread {
            tree.max_spread = v;
        }
        if let Some(v) = layout.stamp_max_words {
            tree.stamp.max_words = v;
        }
        if let Some(v) = layout.stamp_cell_size {
            tree.stamp.cell_size = v;
        }
    }

    if let Some(forest) = parsed.forest {
        let cfg = &mut config.forest;
        if let Some(v) = forest.cell_size {
            cfg.cell_size = v;
        }
        if let Some(v) = forest.style_width {
            cfg.style_width = v;
        }
        if let Some(v) = forest.style_height {
            cfg.style_height = v;
        }
        if let Some(v) = forest.debounce_ms {
            cfg.debounce_ms = v;
        }
        if let Some(v) = forest.zoom_duration_multiplier {
            cfg.zoom_duration_multiplier = v;
        }
        if let Some(v) = forest.per_page {
            cfg.per_page = v;
        }
        if forest.columns.is_some() {
            cfg.grid.columns = forest.columns;
        }
        if let Some(v) = forest.cloud_padding {
            cfg.cloud.padding = v;
        }
        if let Some(v) = forest.cloud_increase {
            cfg.cloud.increase = v;
        }
        if let Some(v) = forest.max_iterations {
            cfg.cloud.max_iterations = v;
        }
        if let Some(v) = forest.swarm_radius {
            cfg.swarm.radius = v;
        }
        if let Some(v) = forest.horizontal {
            cfg.swarm.horizontal = v;
        }
    }

    config.render.background = config.theme.background.clone();
    config.render.font_family = config.theme.font_family.clone();
    config.render.width = config.tree.width as f32;
    config.render.height = config.tree.height as f32;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canvas_constants() {
        let layout = TreeLayoutConfig::default();
        assert_eq!(layout.baseline_y(), 480.0 * 0.618 + 140.0);
        let options = TreeOptions::default();
        assert!(options.number && options.stamp && options.line && options.end);
        assert!(!options.grid && !options.count && !options.plot);
        assert_eq!(options.padding, 20.0);
        assert_eq!(ForestConfig::default().half_cell(), 240.0);
    }

    #[test]
    fn swarm_instants_are_utc() {
        let swarm = SwarmConfig::default();
        assert_eq!(swarm.day_cutoff.to_rfc3339(), "2025-05-12T00:00:00+00:00");
        assert_eq!(swarm.first_start.to_rfc3339(), "2025-05-11T18:00:00+00:00");
        assert_eq!(swarm.second_start.to_rfc3339(), "2025-05-12T20:00:00+00:00");
    }

    #[test]
    fn validate_rejects_bad_padding() {
        let layout = TreeLayoutConfig::default();
        assert!(TreeOptions::default().validate(&layout).is_ok());
        let negative = TreeOptions {
            padding: -1.0,
            ..TreeOptions::default()
        };
        assert!(matches!(
            negative.validate(&layout),
            Err(TreeError::InvalidOption(_))
        ));
        let wide = TreeOptions {
            padding: 300.0,
            ..TreeOptions::default()
        };
        assert!(wide.validate(&layout).is_err());
    }

    #[test]
    fn load_config_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.theme.background, "#FEFAF1");
        assert_eq!(config.options, TreeOptions::default());
    }

    #[test]
    fn load_config_overlays_json5() {
        let dir = std::env::temp_dir().join(format!("s2t-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json5");
        std::fs::write(
            &path,
            r##"{
                // comments are fine
                theme: "night",
                themeVariables: { ink: "#ff0000" },
                tree: { plot: true, padding: 10 },
                forest: { columns: 3, debounceMs: 80 },
            }"##,
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.theme.background, Theme::night().background);
        assert_eq!(config.theme.ink, "#ff0000");
        assert!(config.options.plot);
        assert_eq!(config.options.padding, 10.0);
        assert_eq!(config.forest.grid.columns, Some(3));
        assert_eq!(config.forest.debounce_ms, 80);
        assert_eq!(config.render.background, Theme::night().background);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
