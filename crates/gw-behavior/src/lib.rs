//! Monster behaviour for Gitterwelt.
//!
//! Perception turns a map into a [`BehaviorObservation`] of the actors an
//! autonomous monster can see and how it regards them. The
//! [`BehaviorService`] turns that observation into a state and one planned
//! action per tick, shaped by the monster's growth stage and its target and
//! skill policies.

/// Engine tuning.
pub mod config;
pub mod disposition;
pub mod engine;
/// Error type of the crate.
pub mod error;
/// Age-dependent behaviour modifiers.
pub mod growth;
pub mod perception;
pub mod skill_selection;
pub mod targeting;

pub use config::BehaviorConfig;
pub use disposition::{
    AllegianceService, DispositionResolver, HostilityService, PackAllegianceService, RaceHostilityService,
};
pub use engine::{BehaviorDecision, BehaviorService, PlanActionContext, PlannedAction, busy_ticks, busy_until};
pub use error::{BehaviorError, BehaviorResult};
pub use growth::GrowthContext;
pub use perception::{BehaviorObservation, PerceptionService, VisibleObject, in_field_of_view};
pub use skill_selection::{FirstInRangeSkillPolicy, SkillSelectionContext, SkillSelectionPolicy};
pub use targeting::{
    HighestThreatTargetPolicy, NearestTargetPolicy, TargetSelectionContext, TargetSelectionPolicy, policy_for,
};
