use gw_core::{Area, Coordinate, GatewayId, SpotId};
use serde::{Deserialize, Serialize};

/// A passage from one map to another.
///
/// Players entering `area` are sent to `landing` on `target_spot_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    /// Identity.
    pub id: GatewayId,
    /// Display name.
    pub name: String,
    /// Cells that trigger the gateway.
    pub area: Area,
    /// Destination map.
    pub target_spot_id: SpotId,
    /// Arrival cell on the destination map.
    pub landing: Coordinate,
}

impl Gateway {
    /// A gateway.
    pub fn new(
        id: GatewayId,
        name: impl Into<String>,
        area: Area,
        target_spot_id: SpotId,
        landing: Coordinate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            area,
            target_spot_id,
            landing,
        }
    }

    /// Whether stepping onto `coordinate` triggers the gateway.
    pub fn is_triggered_at(&self, coordinate: Coordinate) -> bool {
        self.area.contains(coordinate)
    }
}
