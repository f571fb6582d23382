use serde::Serialize;

/// A named scalar control for coarse body proportions (height, chest, ...).
///
/// `minimum`/`maximum` are advisory UI hints; nothing enforces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingParameter {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(rename = "min")]
    pub minimum: Option<f64>,
    #[serde(rename = "max")]
    pub maximum: Option<f64>,
    pub description: Option<String>,
}

impl SizingParameter {
    /// Whether `value` lies inside whichever bounds are present.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.minimum.map_or(true, |min| self.value >= min)
            && self.maximum.map_or(true, |max| self.value <= max)
    }
}
