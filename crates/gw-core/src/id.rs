use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u64", into = "u64")]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw value. Zero is reserved and rejected.
            pub fn new(value: u64) -> CoreResult<Self> {
                if value == 0 {
                    return Err(CoreError::validation(concat!(
                        stringify!($name),
                        " must be positive"
                    )));
                }
                Ok(Self(value))
            }

            /// The raw numeric value.
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl TryFrom<u64> for $name {
            type Error = CoreError;

            fn try_from(value: u64) -> CoreResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifies a spot (one physical map).
    SpotId,
    "spot"
);
define_id!(
    /// Identifies an object placed on a physical map.
    WorldObjectId,
    "obj"
);
define_id!(
    /// Identifies a hit box aggregate.
    HitBoxId,
    "hb"
);
define_id!(
    /// Identifies a monster aggregate.
    MonsterId,
    "mon"
);
define_id!(
    /// Identifies a monster template.
    TemplateId,
    "tpl"
);
define_id!(
    /// Identifies a pack of allied monsters.
    PackId,
    "pack"
);
define_id!(
    /// Identifies a gateway on a map.
    GatewayId,
    "gate"
);
define_id!(
    /// Identifies a weather zone.
    WeatherZoneId,
    "wz"
);
define_id!(
    /// Identifies an item type.
    ItemId,
    "item"
);

/// The global discrete time unit of the simulation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorldTick(pub u64);

impl WorldTick {
    /// The tick before the first advance.
    pub const ZERO: WorldTick = WorldTick(0);

    /// The raw tick number.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The following tick.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// This tick shifted `ticks` into the future.
    pub fn plus(self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since `earlier`; zero if `earlier` lies in the future.
    pub fn since(self, earlier: WorldTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for WorldTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
