use serde::Deserialize;
use string2tree::{RenderOptions, Theme, render_tree_svg as render_svg};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    grid: Option<bool>,
    number: Option<bool>,
    stamp: Option<bool>,
    count: Option<bool>,
    line: Option<bool>,
    end: Option<bool>,
    plot: Option<bool>,
    padding: Option<f64>,
}

fn build_render_options(options: TreeRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::paper();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        render_options.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }

    let tree = &mut render_options.tree;
    tree.stroke = render_options.theme.ink.clone();
    if let Some(grid) = options.grid {
        tree.grid = grid;
    }
    if let Some(number) = options.number {
        tree.number = number;
    }
    if let Some(stamp) = options.stamp {
        tree.stamp = stamp;
    }
    if let Some(count) = options.count {
        tree.count = count;
    }
    if let Some(line) = options.line {
        tree.line = line;
    }
    if let Some(end) = options.end {
        tree.end = end;
    }
    if let Some(plot) = options.plot {
        tree.plot = plot;
    }
    if let Some(padding) = options.padding {
        tree.padding = padding;
    }
    render_options
}

#[wasm_bindgen]
pub fn render_tree_svg(text: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<TreeRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        TreeRenderOptions::default()
    };

    render_svg(text, build_render_options(options)).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use string2tree::render_tree_svg;

    use crate::{TreeRenderOptions, build_render_options};

    #[test]
    fn renders_a_name_with_its_footer() {
        let svg = render_tree_svg("Ada", build_render_options(TreeRenderOptions::default()))
            .expect("a short name should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("6510097"));
    }

    #[test]
    fn night_theme_and_flags_are_applied() {
        let options: TreeRenderOptions =
            serde_json::from_str(r#"{"theme":"night","number":false,"grid":true}"#).unwrap();
        let render_options = build_render_options(options);
        assert!(!render_options.tree.number);
        assert!(render_options.tree.grid);
        assert_eq!(render_options.tree.stroke, render_options.theme.ink);
    }
}
