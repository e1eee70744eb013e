use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::types::{Scenario, ShipmentEvent, ShipmentEventType};

/// One step of the master lifecycle path with its allowed delay window in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStep {
    pub event_type: ShipmentEventType,
    pub event_code: &'static str,
    pub min_hours: i64,
    pub max_hours: i64,
}

const fn step(
    event_type: ShipmentEventType,
    event_code: &'static str,
    min_hours: i64,
    max_hours: i64,
) -> LifecycleStep {
    LifecycleStep {
        event_type,
        event_code,
        min_hours,
        max_hours,
    }
}

/// Main path from collection to delivery
pub const MAIN_PATH: [LifecycleStep; 10] = [
    step(ShipmentEventType::Shipped, "COLLECTED", 1, 3),
    step(ShipmentEventType::Shipped, "PREPARING_FLIGHT", 2, 8),
    step(ShipmentEventType::Shipped, "IN_FLIGHT", 6, 24),
    step(ShipmentEventType::Shipped, "ARRIVED_DESTINATION_COUNTRY", 24, 48),
    step(ShipmentEventType::Customs, "AWAITING_TAX_PAYMENT", 6, 24),
    step(ShipmentEventType::Customs, "NATIONALIZED", 6, 24),
    step(ShipmentEventType::LastMile, "IN_TRANSIT", 2, 12),
    step(ShipmentEventType::LastMile, "AT_SORTING_HUB", 2, 12),
    step(ShipmentEventType::LastMile, "OUT_FOR_DELIVERY", 2, 8),
    step(ShipmentEventType::Delivered, "DELIVERED", 2, 8),
];

/// Terminal branch taken after arrival in the destination country
pub const PROHIBITED_STEP: LifecycleStep =
    step(ShipmentEventType::Cancelled, "PROHIBITED", 2, 8);

/// Number of main-path steps after which the prohibited branch diverges
const PROHIBITED_DIVERGES_AFTER: usize = 4;

impl Scenario {
    /// Steps this scenario walks, in order
    pub fn lifecycle(&self) -> Vec<LifecycleStep> {
        let prefix_len = match self {
            Scenario::CollectedOnly => 1,
            Scenario::ToDestination => 4,
            Scenario::AwaitingTax => 5,
            Scenario::LastMileInProgress => 8,
            Scenario::Delivered => 10,
            Scenario::Prohibited => PROHIBITED_DIVERGES_AFTER,
        };

        let mut steps = MAIN_PATH[..prefix_len].to_vec();
        if *self == Scenario::Prohibited {
            steps.push(PROHIBITED_STEP);
        }
        steps
    }
}

/// Build the future event sequence for `scenario` starting one hour after `now`.
///
/// Each step advances the cursor by a uniformly drawn whole number of hours
/// within the step's window, so the result is strictly increasing in `event_at`.
pub fn generate_scenario_events<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    scenario: Scenario,
    rng: &mut R,
) -> Vec<ShipmentEvent> {
    let mut cursor = now + Duration::hours(1);

    let mut events: Vec<ShipmentEvent> = scenario
        .lifecycle()
        .into_iter()
        .map(|step| {
            let offset = rng.gen_range(step.min_hours..=step.max_hours);
            cursor += Duration::hours(offset);
            ShipmentEvent::new(step.event_type, step.event_code, cursor)
        })
        .collect();

    events.sort_by_key(|event| event.event_at);
    events
}

/// Generator holding its own random source.
///
/// Production code seeds from OS entropy; tests pass a fixed seed so that
/// sequences are reproducible.
pub struct ScenarioEventGenerator {
    rng: Mutex<StdRng>,
}

impl ScenarioEventGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(&self, now: DateTime<Utc>, scenario: Scenario) -> Vec<ShipmentEvent> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        generate_scenario_events(now, scenario, &mut *rng)
    }

    /// Pick one of the scenarios uniformly at random
    pub fn random_scenario(&self) -> Scenario {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Scenario::ALL[rng.gen_range(0..Scenario::ALL.len())]
    }
}

impl Default for ScenarioEventGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
