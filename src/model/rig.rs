use serde::Serialize;

use super::Vector3;

pub const DEFAULT_INHERIT_SCALE: &str = "FULL";

/// One segment of the skeletal hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bone {
    /// Unique within the rig.
    pub name: String,
    /// Name of the parent bone; not checked against the rig.
    pub parent: Option<String>,
    pub head: Vector3,
    pub tail: Vector3,
    pub roll: f64,
    /// Inherit-scale mode (`FULL`, `NONE`, ...), kept as authored.
    pub inherit_scale: String,
}

impl Bone {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Distance between head and tail.
    #[must_use]
    pub fn length(&self) -> f64 {
        let dx = self.tail[0] - self.head[0];
        let dy = self.tail[1] - self.head[1];
        let dz = self.tail[2] - self.head[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
