//! Reward signals, the event reward schedule and the per-tick accumulator

use serde::{Deserialize, Serialize};

/// Reward signal from the host
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for Reward {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Discrete game events that carry a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardEvent {
    /// Drove into a wall
    HitWall,
    /// Collided with the opponent
    HitRobot,
    /// Took a bullet
    HitByBullet,
    /// Destroyed
    Death,
    /// Own bullet hit the opponent
    BulletHit,
    /// Won the round
    Win,
}

/// Reward granted for each [`RewardEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    /// Wall collision
    pub hit_wall: f64,
    /// Robot collision
    pub hit_robot: f64,
    /// Hit by a bullet
    pub hit_by_bullet: f64,
    /// Death
    pub death: f64,
    /// Bullet hit the opponent
    pub bullet_hit: f64,
    /// Round won
    pub win: f64,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            hit_wall: -7.0,
            hit_robot: -7.0,
            hit_by_bullet: -7.0,
            death: -15.0,
            bullet_hit: 5.0,
            win: 15.0,
        }
    }
}

impl RewardSchedule {
    /// Reward for an event
    #[must_use]
    pub fn reward(&self, event: RewardEvent) -> Reward {
        Reward(match event {
            RewardEvent::HitWall => self.hit_wall,
            RewardEvent::HitRobot => self.hit_robot,
            RewardEvent::HitByBullet => self.hit_by_bullet,
            RewardEvent::Death => self.death,
            RewardEvent::BulletHit => self.bullet_hit,
            RewardEvent::Win => self.win,
        })
    }
}

/// Reward collected during one decision tick.
///
/// Reset at the start of a tick, fed by any number of events, then taken
/// once by the update. A second [`take`](Self::take) before the next
/// [`reset`](Self::reset) yields `None`.
#[derive(Debug, Clone, Default)]
pub struct RewardAccumulator {
    total: Reward,
    events: usize,
    taken: bool,
}

impl RewardAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new tick
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Add a reward delta
    pub fn add(&mut self, reward: Reward) {
        self.total += reward;
        self.events += 1;
    }

    /// Running total without consuming it
    #[must_use]
    pub fn peek(&self) -> Reward {
        self.total
    }

    /// Number of deltas added since the last reset
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Consume the tick's reward
    pub fn take(&mut self) -> Option<Reward> {
        if self.taken {
            return None;
        }
        self.taken = true;
        Some(std::mem::take(&mut self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let schedule = RewardSchedule::default();
        assert_eq!(schedule.reward(RewardEvent::HitWall), Reward(-7.0));
        assert_eq!(schedule.reward(RewardEvent::Death), Reward(-15.0));
        assert_eq!(schedule.reward(RewardEvent::BulletHit), Reward(5.0));
        assert_eq!(schedule.reward(RewardEvent::Win), Reward(15.0));
    }

    #[test]
    fn test_accumulator_takes_once() {
        let mut acc = RewardAccumulator::new();
        acc.add(Reward(-7.0));
        acc.add(Reward(5.0));
        assert_eq!(acc.event_count(), 2);
        assert_eq!(acc.take(), Some(Reward(-2.0)));
        assert_eq!(acc.take(), None);

        acc.reset();
        assert_eq!(acc.take(), Some(Reward(0.0)));
    }
}
