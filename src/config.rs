use serde::{Serialize, Deserialize};

/// Options pushed by the host through `configurate`. Missing keys keep their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    pub control_points_size: f64,
    pub selected_shape_opacity: f64,
    pub shape_opacity: f64,
    /// Border colour used for outlined shapes, `None` when outlining is off.
    pub outlined_borders: Option<String>,
    pub autoborders: bool,
    pub intelligent_polygon_crop: bool,
    pub hide_edited_object: bool,
    /// Client px the pointer must travel before slide mode appends a vertex.
    pub slide_threshold: f64,
    /// Brush px gained per client px of horizontal drag while resizing the brush.
    pub brush_size_step: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            control_points_size: 5.0,
            selected_shape_opacity: 0.5,
            shape_opacity: 0.2,
            outlined_borders: None,
            autoborders: false,
            intelligent_polygon_crop: true,
            hide_edited_object: false,
            slide_threshold: 15.0,
            brush_size_step: 1.0,
        }
    }
}

impl Configuration {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Configuration::from_json(r#"{"autoborders": true, "controlPointsSize": 8}"#).unwrap();
        assert!(config.autoborders);
        assert_eq!(config.control_points_size, 8.0);
        assert!(config.intelligent_polygon_crop);
        assert_eq!(config.slide_threshold, 15.0);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = Configuration::from_json(r#"{"smoothImage": false}"#).unwrap();
        assert_eq!(config, Configuration::default());
    }
}
