//! Combat event bus.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::warn;

use brawl_common::{CollisionGroup, EntityId};

use crate::stats::Action;
use crate::status::EffectType;

/// Outcomes published by the combat core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A validated hit was queued on a destructible target
    HitRegistered {
        /// Root cause (wielder or hazard origin)
        origin: Option<EntityId>,
        /// Weapon wielder or hazard body
        source: EntityId,
        /// Entity hit
        target: EntityId,
        /// Collision group credited
        group: CollisionGroup,
    },
    /// A weapon or hazard struck an obstacle
    ObstacleStruck {
        /// Weapon wielder or hazard
        source: EntityId,
        /// Obstacle hit
        obstacle: EntityId,
        /// Bounce power of the weapon part; zero for hazards
        bounce_power: f32,
    },
    /// A status effect became active
    EffectApplied {
        /// Entity affected
        target: EntityId,
        /// Effect kind
        effect: EffectType,
    },
    /// Entity died
    Died {
        /// Entity that died
        entity: EntityId,
        /// Entity credited with the kill
        killer: Option<EntityId>,
    },
    /// Poise broke
    Staggered {
        /// Entity staggered
        entity: EntityId,
    },
    /// Entity launched into the air
    Launched {
        /// Entity launched
        entity: EntityId,
        /// Hang time after sanitizing
        hang_time: f32,
    },
    /// Entity knocked to the ground
    KnockedDown {
        /// Entity knocked down
        entity: EntityId,
        /// Ground time after sanitizing
        time: f32,
    },
    /// A queued intent became unaffordable
    IntentRevoked {
        /// Entity whose intent was dropped
        entity: EntityId,
        /// Action revoked
        action: Action,
    },
    /// Hazard started its linger phase
    HazardDecaying {
        /// Hazard entity
        hazard: EntityId,
    },
    /// Hazard finished lingering and was removed
    HazardRemoved {
        /// Hazard entity
        hazard: EntityId,
    },
}

/// Event bus for broadcasting combat events to the host.
#[derive(Debug)]
pub struct CombatEventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for CombatEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl CombatEventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event; dropped if the bus is full.
    pub fn publish(&self, event: CombatEvent) {
        if let Err(err) = self.sender.try_send(event) {
            warn!("Combat event dropped: {:?}", err.into_inner());
        }
    }

    /// Publishes every event in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = CombatEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus() {
        let bus = CombatEventBus::new(16);
        let entity = EntityId::from_raw(1);

        bus.publish(CombatEvent::Staggered { entity });
        bus.publish(CombatEvent::Died {
            entity,
            killer: None,
        });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CombatEvent::Staggered { entity });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = CombatEventBus::new(1);
        let hazard = EntityId::from_raw(2);
        bus.publish_all([
            CombatEvent::HazardDecaying { hazard },
            CombatEvent::HazardRemoved { hazard },
        ]);
        assert_eq!(bus.drain(), vec![CombatEvent::HazardDecaying { hazard }]);
    }
}
