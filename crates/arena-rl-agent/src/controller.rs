//! Episode controller: the per-tick observe, act, learn loop
//!
//! A tick walks through [`Phase::AwaitingObservation`],
//! [`Phase::ActionSelected`], [`Phase::ActionExecuted`] and
//! [`Phase::Updated`]. The host reports rewards and radar scans through a
//! [`HostSender`] at any time; the controller drains them when a tick starts
//! and again once the action has finished, so each reward lands in exactly
//! one update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use arena_rl_core::discretize::{bucket_bearing, bucket_position, clamp_to_arena};
use arena_rl_core::{
    Action, ArenaConfig, ArenaError, Maneuver, Observation, Result, Reward, RewardAccumulator,
    RewardEvent, Scan, State, TableShape,
};

use crate::learning::QLearning;
use crate::persistence;
use crate::policy::EpsilonGreedy;
use crate::q_table::QTable;
use crate::utils::EpsilonDecay;

/// Where the controller is in its tick cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting to discretize the next observation
    AwaitingObservation,
    /// Action chosen, not yet handed to the host
    ActionSelected,
    /// Host is carrying out the action
    ActionExecuted,
    /// Table updated for the last tick
    Updated,
    /// Episode over until [`EpisodeController::begin_episode`]
    EpisodeEnded,
}

/// Message from the host to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Game event, valued by the configured reward schedule
    Reward(RewardEvent),
    /// Reward delta given directly
    RawReward(f64),
    /// Radar contact with the opponent
    Scan(Scan),
}

/// Handle the host uses to post events into the controller's inbox
#[derive(Debug, Clone)]
pub struct HostSender {
    tx: UnboundedSender<HostEvent>,
}

impl HostSender {
    /// Post an event
    pub fn send(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!(?event, "controller gone, host event dropped");
        }
    }

    /// Post a game event reward
    pub fn reward(&self, event: RewardEvent) {
        self.send(HostEvent::Reward(event));
    }

    /// Post a raw reward delta
    pub fn raw_reward(&self, value: f64) {
        self.send(HostEvent::RawReward(value));
    }

    /// Post a wall collision
    pub fn hit_wall(&self) {
        self.reward(RewardEvent::HitWall);
    }

    /// Post a radar scan
    pub fn scan(&self, scan: Scan) {
        self.send(HostEvent::Scan(scan));
    }
}

/// Result of the host carrying out a maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Action finished; the observation taken afterwards
    Completed(Observation),
    /// Episode terminated while the action was running
    Ended {
        /// Final observation, if the host could take one
        last: Option<Observation>,
    },
}

/// The arena host as seen from the controller
#[async_trait]
pub trait Executor: Send {
    /// Current own-state
    async fn observe(&mut self) -> Result<Observation>;

    /// Carry out a maneuver, returning once it has finished
    async fn execute(&mut self, maneuver: Maneuver) -> Result<Outcome>;
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// State the action was chosen in
    pub prior: State,
    /// Chosen action
    pub action: Action,
    /// Reward consumed by the update
    pub reward: Reward,
    /// State after the action, when one was observed
    pub outcome: Option<State>,
    /// New Q(prior, action), when the update ran
    pub value: Option<f64>,
    /// Heading to escape a wall hit during this tick
    pub wall_escape: Option<f64>,
    /// Present when the episode ended during this tick
    pub episode: Option<EpisodeSummary>,
}

/// Summary of a finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Episode ID
    pub id: Uuid,
    /// Decision ticks run
    pub ticks: usize,
    /// Sum of consumed rewards
    pub total_reward: f64,
    /// Exploration rate after the decay step
    pub epsilon: f64,
    /// Whether normalization rescaled the table
    pub normalized: bool,
    /// Whether the save succeeded; `false` also when no save path is set
    pub saved: bool,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: DateTime<Utc>,
}

/// Last known opponent buckets; they only change on scans
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpponentTrack {
    /// Bearing bucket of the latest scan
    pub bearing_bucket: usize,
    /// Distance bucket of the latest scan
    pub distance_bucket: usize,
    /// Latest scan
    pub last_scan: Option<Scan>,
}

#[derive(Debug, Clone)]
struct EpisodeStats {
    id: Uuid,
    ticks: usize,
    total_reward: f64,
    start_time: DateTime<Utc>,
}

impl EpisodeStats {
    fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            ticks: 0,
            total_reward: 0.0,
            start_time: Utc::now(),
        }
    }
}

/// Owns the Q-table and runs the learning loop for one agent
pub struct EpisodeController {
    config: ArenaConfig,
    shape: TableShape,
    table: QTable,
    policy: EpsilonGreedy,
    rule: QLearning,
    decay: EpsilonDecay,
    rewards: RewardAccumulator,
    inbox: UnboundedReceiver<HostEvent>,
    sender: HostSender,
    opponent: OpponentTrack,
    wall_hit: bool,
    phase: Phase,
    rng: StdRng,
    episode: EpisodeStats,
}

impl EpisodeController {
    /// Create a controller around an existing table
    pub fn new(config: ArenaConfig, table: QTable, epsilon: f64) -> Result<Self> {
        config.validate()?;
        let shape = config.shape();
        if table.shape() != shape {
            return Err(ArenaError::InvalidConfig(format!(
                "table shape {:?} does not match configured shape {shape:?}",
                table.shape()
            )));
        }

        let (tx, inbox) = mpsc::unbounded_channel();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            shape,
            table,
            policy: EpsilonGreedy::new(epsilon),
            rule: QLearning::from(config.learning),
            decay: EpsilonDecay::from(config.exploration),
            rewards: RewardAccumulator::new(),
            inbox,
            sender: HostSender { tx },
            opponent: OpponentTrack::default(),
            wall_hit: false,
            phase: Phase::AwaitingObservation,
            rng,
            episode: EpisodeStats::start(),
            config,
        })
    }

    /// Create a controller with a zero table and the starting epsilon
    pub fn fresh(config: ArenaConfig) -> Result<Self> {
        let table = QTable::new(config.shape());
        let epsilon = config.exploration.epsilon_start;
        Self::new(config, table, epsilon)
    }

    /// Restore from the configured save file, or start fresh if there is none.
    ///
    /// A malformed save file is an error.
    pub async fn load_or_init(config: ArenaConfig) -> Result<Self> {
        let Some(path) = config.persistence.save_path.clone() else {
            return Self::fresh(config);
        };
        config.validate()?;

        match persistence::load(&path, config.shape()).await? {
            Some(saved) => Self::new(config, saved.table, saved.epsilon),
            None => Self::fresh(config),
        }
    }

    /// Handle for posting host events
    #[must_use]
    pub fn sender(&self) -> HostSender {
        self.sender.clone()
    }

    /// The Q-table
    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Current exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last known opponent buckets
    #[must_use]
    pub fn opponent(&self) -> &OpponentTrack {
        &self.opponent
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Bucket an observation using the latest opponent scan
    pub fn discretize(&self, observation: &Observation) -> Result<State> {
        let x = bucket_position(
            clamp_to_arena(observation.x, observation.arena_width),
            observation.arena_width,
            self.shape.x_buckets,
        );
        let y = bucket_position(
            clamp_to_arena(observation.y, observation.arena_height),
            observation.arena_height,
            self.shape.y_buckets,
        );
        self.shape.state(
            x,
            y,
            self.opponent.bearing_bucket,
            self.opponent.distance_bucket,
        )
    }

    /// Start a new episode, discarding anything posted since the last one ended
    pub fn begin_episode(&mut self) {
        if self.phase == Phase::EpisodeEnded {
            self.discard_pending("episode start");
        }
        self.episode = EpisodeStats::start();
        self.phase = Phase::AwaitingObservation;
        tracing::info!(episode = %self.episode.id, epsilon = self.epsilon(), "episode started");
    }

    /// Run one decision tick against the host.
    ///
    /// Starts a new episode first if the previous one has ended. When the host
    /// reports termination, the episode is finished before returning and the
    /// summary is attached to the report.
    pub async fn tick<E: Executor + ?Sized>(&mut self, executor: &mut E) -> Result<TickReport> {
        if self.phase == Phase::EpisodeEnded {
            self.begin_episode();
        }

        self.phase = Phase::AwaitingObservation;
        self.rewards.reset();
        self.wall_hit = false;
        self.drain_inbox();
        let observation = executor.observe().await?;
        let prior = self.discretize(&observation)?;

        let index = self.policy.select_action(&self.table, &prior, &mut self.rng);
        let action = Action::ALL[index];
        self.phase = Phase::ActionSelected;

        let maneuver = action.maneuver(observation.heading, self.config.move_distance);
        self.phase = Phase::ActionExecuted;
        let outcome = executor.execute(maneuver).await?;

        self.drain_inbox();
        let (last, ended) = match outcome {
            Outcome::Completed(observation) => (Some(observation), false),
            Outcome::Ended { last } => (last, true),
        };
        let reward = self.rewards.take().unwrap_or_default();

        let mut report = TickReport {
            prior,
            action,
            reward,
            outcome: None,
            value: None,
            wall_escape: None,
            episode: None,
        };

        if let Some(observation) = last {
            let outcome = self.discretize(&observation)?;
            let value = self.rule.update(&mut self.table, &prior, index, reward, &outcome);
            self.phase = Phase::Updated;
            self.episode.total_reward += reward.value();
            report.outcome = Some(outcome);
            report.value = Some(value);
            if self.wall_hit {
                report.wall_escape = wall_escape_heading(&outcome, &self.shape);
            }
        } else if reward.value() != 0.0 {
            tracing::warn!(
                reward = reward.value(),
                "episode ended without a final observation, reward discarded"
            );
        }
        self.episode.ticks += 1;

        tracing::debug!(
            tick = self.episode.ticks,
            prior = %prior,
            %action,
            reward = reward.value(),
            value = ?report.value,
            "tick complete"
        );

        if ended {
            report.episode = Some(self.finish_episode().await);
        }
        Ok(report)
    }

    /// Handle an external termination signal.
    ///
    /// Normalizes the table, decays epsilon and saves. Returns `None` if the
    /// episode had already ended.
    pub async fn end_episode(&mut self) -> Option<EpisodeSummary> {
        if self.phase == Phase::EpisodeEnded {
            return None;
        }
        Some(self.finish_episode().await)
    }

    /// Run ticks until the host ends the episode
    pub async fn run_episode<E: Executor + ?Sized>(
        &mut self,
        executor: &mut E,
    ) -> Result<EpisodeSummary> {
        self.begin_episode();
        loop {
            if let Some(summary) = self.tick(executor).await?.episode {
                return Ok(summary);
            }
        }
    }

    /// Save the table and epsilon to the configured path.
    ///
    /// Returns `Ok(false)` when no save path is configured.
    pub async fn save(&self) -> Result<bool> {
        let Some(path) = &self.config.persistence.save_path else {
            return Ok(false);
        };
        persistence::save(path, &self.table, self.epsilon(), self.config.persistence.decimals)
            .await?;
        Ok(true)
    }

    async fn finish_episode(&mut self) -> EpisodeSummary {
        self.discard_pending("episode end");

        let normalized = self.table.normalize(self.config.persistence.normalize_scale);
        let epsilon = self.decay.step(self.epsilon());
        self.policy.set_epsilon(epsilon);

        let saved = match self.save().await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!(error = %e, "failed to save Q-table");
                false
            }
        };

        self.phase = Phase::EpisodeEnded;
        let summary = EpisodeSummary {
            id: self.episode.id,
            ticks: self.episode.ticks,
            total_reward: self.episode.total_reward,
            epsilon,
            normalized,
            saved,
            start_time: self.episode.start_time,
            end_time: Utc::now(),
        };
        tracing::info!(
            episode = %summary.id,
            ticks = summary.ticks,
            total_reward = summary.total_reward,
            epsilon,
            saved,
            "episode ended"
        );
        summary
    }

    fn drain_inbox(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            match event {
                HostEvent::Reward(event) => {
                    if event == RewardEvent::HitWall {
                        self.wall_hit = true;
                    }
                    self.rewards.add(self.config.rewards.reward(event));
                }
                HostEvent::RawReward(value) => self.rewards.add(Reward(value)),
                HostEvent::Scan(scan) => self.record_scan(scan),
            }
        }
    }

    fn discard_pending(&mut self, context: &str) {
        self.drain_inbox();
        let pending = self.rewards.peek();
        if pending.value() != 0.0 {
            tracing::warn!(reward = pending.value(), context, "unconsumed reward discarded");
        }
        self.rewards.reset();
    }

    fn record_scan(&mut self, scan: Scan) {
        self.opponent.bearing_bucket =
            bucket_bearing(scan.absolute_bearing(), self.shape.bearing_buckets);
        self.opponent.distance_bucket = self.config.table.distance_thresholds.bucket(scan.distance);
        self.opponent.last_scan = Some(scan);
    }
}

/// Heading that drives away from the nearest wall region.
///
/// Regions are three buckets deep along each edge; the centre of the arena
/// has no escape heading.
#[must_use]
pub fn wall_escape_heading(state: &State, shape: &TableShape) -> Option<f64> {
    const BAND: usize = 3;
    let (x, y) = (state.x(), state.y());
    let left = x < BAND;
    let right = x >= shape.x_buckets.saturating_sub(BAND);
    let bottom = y < BAND;
    let top = y >= shape.y_buckets.saturating_sub(BAND);

    match (left, right, bottom, top) {
        (true, _, _, true) => Some(135.0),
        (_, true, _, true) => Some(-135.0),
        (_, _, _, true) => Some(180.0),
        (true, _, true, _) => Some(45.0),
        (_, true, true, _) => Some(-45.0),
        (_, _, true, _) => Some(0.0),
        (true, _, _, _) => Some(90.0),
        (_, true, _, _) => Some(-90.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_escape_heading() {
        let shape = TableShape::default();
        let at = |x, y| shape.state(x, y, 0, 0).unwrap();

        assert_eq!(wall_escape_heading(&at(5, 9), &shape), Some(180.0));
        assert_eq!(wall_escape_heading(&at(9, 9), &shape), Some(-135.0));
        assert_eq!(wall_escape_heading(&at(0, 8), &shape), Some(135.0));
        assert_eq!(wall_escape_heading(&at(1, 5), &shape), Some(90.0));
        assert_eq!(wall_escape_heading(&at(2, 2), &shape), Some(45.0));
        assert_eq!(wall_escape_heading(&at(5, 0), &shape), Some(0.0));
        assert_eq!(wall_escape_heading(&at(8, 1), &shape), Some(-45.0));
        assert_eq!(wall_escape_heading(&at(9, 4), &shape), Some(-90.0));
        assert_eq!(wall_escape_heading(&at(5, 5), &shape), None);
    }

    #[test]
    fn test_discretize_uses_latest_scan() {
        let mut controller = EpisodeController::fresh(ArenaConfig::default()).unwrap();
        let observation = Observation::new(150.0, 790.0, 800.0, 800.0, 0.0);
        let state = controller.discretize(&observation).unwrap();
        assert_eq!((state.x(), state.y(), state.bearing(), state.distance()), (1, 9, 0, 0));

        controller.sender().scan(Scan {
            bearing: 90.0,
            distance: 350.0,
            heading: 0.0,
            velocity: 8.0,
            own_heading: 90.0,
        });
        controller.drain_inbox();
        let state = controller.discretize(&observation).unwrap();
        assert_eq!((state.bearing(), state.distance()), (4, 2));
    }

    #[test]
    fn test_discretize_clamps_far_edge() {
        let controller = EpisodeController::fresh(ArenaConfig::default()).unwrap();
        let state = controller
            .discretize(&Observation::new(800.0, 800.0, 800.0, 600.0, 0.0))
            .unwrap();
        assert_eq!((state.x(), state.y()), (9, 9));
    }

    #[test]
    fn test_rejects_mismatched_table() {
        let mut config = ArenaConfig::default();
        config.table.action_count = 9;
        let table = QTable::new(TableShape::default());
        assert!(matches!(
            EpisodeController::new(config, table, 1.0),
            Err(ArenaError::InvalidConfig(_))
        ));
    }
}
