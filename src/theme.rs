use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub ink: String,
    pub count_text: String,
    pub stroke_width: f32,
    pub footer_font_size: f32,
    pub fallback_font_size: f32,
    pub count_font_size: f32,
    pub axis_color: String,
}

impl Theme {
    pub fn paper() -> Self {
        Self {
            font_family: "monospace".to_string(),
            background: "#FEFAF1".to_string(),
            ink: "black".to_string(),
            count_text: "white".to_string(),
            stroke_width: 1.5,
            footer_font_size: 12.0,
            fallback_font_size: 16.0,
            count_font_size: 20.0,
            axis_color: "#999999".to_string(),
        }
    }

    pub fn night() -> Self {
        Self {
            font_family: "monospace".to_string(),
            background: "#14171C".to_string(),
            ink: "#F2EEE3".to_string(),
            count_text: "#14171C".to_string(),
            stroke_width: 1.5,
            footer_font_size: 12.0,
            fallback_font_size: 16.0,
            count_font_size: 20.0,
            axis_color: "#5B6270".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "paper" | "default" | "light" => Some(Self::paper()),
            "night" | "dark" => Some(Self::night()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::paper()
    }
}
