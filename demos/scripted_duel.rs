//! Example: train the Q-learning controller against a toy arena
//!
//! Usage: `cargo run --example scripted_duel [config.json]`
//!
//! The arena is a crude kinematic stand-in for a real battle host: a fixed
//! opponent that shoots back with a distance-dependent chance, walls that
//! stop the robot, and rounds capped at a fixed number of ticks.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use arena_rl_agent::prelude::*;
use arena_rl_core::discretize::normalize_angle;

const ROBOT_RADIUS: f64 = 18.0;
const ROUNDS: usize = 10;

struct ToyArena {
    sender: HostSender,
    width: f64,
    height: f64,
    x: f64,
    y: f64,
    heading: f64,
    energy: f64,
    opponent: (f64, f64),
    opponent_energy: f64,
    ticks: usize,
    max_ticks: usize,
    rng: StdRng,
}

impl ToyArena {
    fn new(sender: HostSender, seed: u64) -> Self {
        Self {
            sender,
            width: 800.0,
            height: 600.0,
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            energy: 0.0,
            opponent: (0.0, 0.0),
            opponent_energy: 0.0,
            ticks: 0,
            max_ticks: 400,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn reset(&mut self) {
        let margin = ROBOT_RADIUS * 2.0;
        self.x = self.rng.gen_range(margin..self.width - margin);
        self.y = self.rng.gen_range(margin..self.height - margin);
        self.heading = self.rng.gen_range(0.0..360.0);
        self.opponent = (
            self.rng.gen_range(margin..self.width - margin),
            self.rng.gen_range(margin..self.height - margin),
        );
        self.energy = 30.0;
        self.opponent_energy = 30.0;
        self.ticks = 0;
    }

    fn observation(&self) -> Observation {
        Observation::new(self.x, self.y, self.width, self.height, self.heading)
    }

    fn drive(&mut self, distance: f64) {
        let radians = self.heading.to_radians();
        let x = self.x + distance * radians.sin();
        let y = self.y + distance * radians.cos();
        let cx = x.clamp(ROBOT_RADIUS, self.width - ROBOT_RADIUS);
        let cy = y.clamp(ROBOT_RADIUS, self.height - ROBOT_RADIUS);
        if cx != x || cy != y {
            self.energy -= 1.0;
            self.sender.hit_wall();
        }
        self.x = cx;
        self.y = cy;
    }

    fn exchange_fire(&mut self) {
        let (dx, dy) = (self.opponent.0 - self.x, self.opponent.1 - self.y);
        let distance = dx.hypot(dy);

        let incoming = if distance < 300.0 { 0.12 } else { 0.04 };
        if self.rng.gen_bool(incoming) {
            self.energy -= 3.0;
            self.sender.reward(RewardEvent::HitByBullet);
        }
        if distance < 250.0 && self.rng.gen_bool(0.2) {
            self.opponent_energy -= 3.0;
            self.sender.reward(RewardEvent::BulletHit);
        }

        self.sender.scan(Scan {
            bearing: normalize_angle(dx.atan2(dy).to_degrees() - self.heading),
            distance,
            heading: 0.0,
            velocity: 0.0,
            own_heading: self.heading,
        });
    }
}

#[async_trait]
impl Executor for ToyArena {
    async fn observe(&mut self) -> arena_rl_core::Result<Observation> {
        Ok(self.observation())
    }

    async fn execute(&mut self, maneuver: Maneuver) -> arena_rl_core::Result<Outcome> {
        match maneuver {
            Maneuver::Turn { degrees } => self.heading = (self.heading + degrees).rem_euclid(360.0),
            Maneuver::Hold => {}
            Maneuver::Ahead(distance) => self.drive(distance),
            Maneuver::Back(distance) => self.drive(-distance),
        }
        self.exchange_fire();
        self.ticks += 1;

        if self.energy <= 0.0 {
            self.sender.reward(RewardEvent::Death);
        } else if self.opponent_energy <= 0.0 {
            self.sender.reward(RewardEvent::Win);
        } else if self.ticks < self.max_ticks {
            return Ok(Outcome::Completed(self.observation()));
        }
        Ok(Outcome::Ended {
            last: Some(self.observation()),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => ArenaConfig::from_json_file(path)?,
        None => {
            let mut config = ArenaConfig::default();
            config.exploration.epsilon_decrement = 0.05;
            config.seed = Some(7);
            config
        }
    };
    if config.persistence.save_path.is_none() {
        config.persistence.save_path =
            Some(std::env::temp_dir().join("arena-rl").join("q_values.data"));
    }

    let mut controller = EpisodeController::load_or_init(config).await?;
    let mut arena = ToyArena::new(controller.sender(), 2024);

    let mut totals = Vec::with_capacity(ROUNDS);
    for round in 1..=ROUNDS {
        arena.reset();
        let summary = controller.run_episode(&mut arena).await?;
        println!(
            "Round {round}: reward = {:.1}, ticks = {}, epsilon = {:.3}",
            summary.total_reward, summary.ticks, summary.epsilon
        );
        println!("{}", serde_json::to_string(&summary)?);
        totals.push(summary.total_reward);
    }

    let average = totals.iter().sum::<f64>() / totals.len() as f64;
    println!("\nAverage reward over {ROUNDS} rounds: {average:.2}");
    Ok(())
}
