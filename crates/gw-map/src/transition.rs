use gw_core::{SpotId, WeatherType, WorldObjectId};
use serde::{Deserialize, Serialize};

/// One requirement for passing a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum TransitionCondition {
    /// The traveller must pay.
    Toll {
        /// Price.
        amount: u32,
    },
    /// The traveller must hold a named relation (membership, quest flag).
    RequiresRelation {
        /// Relation name.
        relation: String,
    },
    /// Passage is closed under these weathers.
    BlockedByWeather {
        /// Blocking weather types.
        types: Vec<WeatherType>,
    },
}

/// The conditions on moving from one spot to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPolicy {
    /// Origin spot.
    pub from_spot_id: SpotId,
    /// Destination spot.
    pub to_spot_id: SpotId,
    /// All must hold.
    pub conditions: Vec<TransitionCondition>,
}

/// Lookup of transition policies.
pub trait TransitionPolicyRepository {
    /// The policy for a spot pair; `None` means unrestricted.
    fn find_policy(&self, from_spot_id: SpotId, to_spot_id: SpotId) -> Option<TransitionPolicy>;
}

/// Answers relation questions about travellers.
pub trait TransitionRelationChecker {
    /// Whether `object_id` holds `relation`.
    fn has_relation(&self, object_id: WorldObjectId, relation: &str) -> bool;
}

/// Everything a transition check needs to know about the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionContext {
    /// Traveller.
    pub object_id: WorldObjectId,
    /// Origin spot.
    pub from_spot_id: SpotId,
    /// Destination spot.
    pub to_spot_id: SpotId,
    /// Weather at the origin, if the spot lies in a zone.
    pub weather: Option<WeatherType>,
    /// Money the traveller can spend.
    pub funds: u32,
}

/// Verdict of [`TransitionConditionService::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Passage granted; `toll` is owed.
    Allowed {
        /// Total toll to deduct.
        toll: u32,
    },
    /// Passage refused.
    Denied {
        /// Every failed condition.
        reasons: Vec<String>,
    },
}

impl TransitionDecision {
    /// Whether passage was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Evaluates gateway transition conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionConditionService;

impl TransitionConditionService {
    /// Check every condition of the matching policy and collect all failures.
    pub fn evaluate(
        policies: &dyn TransitionPolicyRepository,
        relations: &dyn TransitionRelationChecker,
        ctx: &TransitionContext,
    ) -> TransitionDecision {
        let Some(policy) = policies.find_policy(ctx.from_spot_id, ctx.to_spot_id) else {
            return TransitionDecision::Allowed { toll: 0 };
        };

        let mut toll: u32 = 0;
        let mut reasons = Vec::new();
        for condition in &policy.conditions {
            match condition {
                TransitionCondition::Toll { amount } => toll = toll.saturating_add(*amount),
                TransitionCondition::RequiresRelation { relation } => {
                    if !relations.has_relation(ctx.object_id, relation) {
                        reasons.push(format!("requires relation '{relation}'"));
                    }
                }
                TransitionCondition::BlockedByWeather { types } => {
                    if let Some(weather) = ctx.weather {
                        if types.contains(&weather) {
                            reasons.push(format!("blocked by {weather} weather"));
                        }
                    }
                }
            }
        }
        if toll > ctx.funds {
            reasons.push(format!("toll of {toll} exceeds funds of {}", ctx.funds));
        }

        if reasons.is_empty() {
            TransitionDecision::Allowed { toll }
        } else {
            TransitionDecision::Denied { reasons }
        }
    }
}
