//! Run driver - the collection state machine
//!
//! One explicit loop over run states instead of nested retry loops, so the
//! stall and reconnect transitions stay auditable and testable against a
//! mock client:
//!
//! Connecting -> Configuring -> Collecting -> Done
//!      ^              |             |
//!      |              v             v
//!      +-------- Restarting <-- (transport failure anywhere)
//!
//! A stall abort jumps from Collecting back to Configuring; a transport
//! failure resets the whole run (episode counter, accepted positions) and
//! goes back through Restarting -> Connecting.

use std::time::Instant;

use rand::Rng;
use sim_client::SimulatorClient;
use tracing::{info, instrument, warn};

use crate::config::{CollectorConfig, NoveltyScope};
use crate::error::{CollectorError, Result};
use crate::novelty::NoveltyFilter;
use crate::recorder::Recorder;
use crate::settings;
use crate::stall::StallDetector;
use crate::stats::RunStats;

/// Collection run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Opening the simulator connection
    Connecting,
    /// Building/loading settings and starting an episode
    Configuring,
    /// Frame loop: read, filter, persist, send control
    Collecting,
    /// Transport failure: pause, reset run state, reconnect
    Restarting,
    /// Global frame target reached
    Done,
}

/// Why the frame loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeOutcome {
    /// Global accepted-frame target reached
    TargetReached,
    /// Stall detector fired; start a fresh episode
    Stalled,
}

/// Drives one collection run over any simulator client
pub struct Collector<C: SimulatorClient> {
    config: CollectorConfig,
    client: C,
    novelty: NoveltyFilter,
    stall: StallDetector,
    recorder: Recorder,
    /// Index of the episode currently being collected (keys output paths)
    episode: u32,
    /// Accepted frames so far this run (keys dump filenames)
    frames_accepted: u64,
    stats: RunStats,
}

impl<C: SimulatorClient> Collector<C> {
    pub fn new(config: CollectorConfig, client: C) -> Self {
        let novelty = NoveltyFilter::new(config.min_distance);
        let stall = StallDetector::new(config.stall_epsilon, config.stall_limit);
        let recorder = Recorder::new(&config.output_dir);
        Self {
            config,
            client,
            novelty,
            stall,
            recorder,
            episode: 0,
            frames_accepted: 0,
            stats: RunStats::default(),
        }
    }

    /// Run to completion: retries transport failures indefinitely, returns
    /// once the global frame target is reached.
    ///
    /// Non-transport errors (filesystem, malformed settings) propagate.
    pub async fn run(mut self) -> Result<RunStats> {
        let started = Instant::now();
        let mut state = RunState::Connecting;

        loop {
            state = match state {
                RunState::Connecting => {
                    info!(
                        host = %self.config.host,
                        port = self.config.port,
                        "connecting to simulator"
                    );
                    match self.client.connect(&self.config.host, self.config.port).await {
                        Ok(()) => {
                            info!("simulator connected");
                            RunState::Configuring
                        }
                        Err(e) => self.next_state_for_error(e.into())?,
                    }
                }

                RunState::Configuring => match self.configure_episode().await {
                    Ok(()) => RunState::Collecting,
                    Err(e) => self.next_state_for_error(e)?,
                },

                RunState::Collecting => match self.collect_episode().await {
                    Ok(EpisodeOutcome::TargetReached) => {
                        info!(frames = self.frames_accepted, "frame target reached");
                        RunState::Done
                    }
                    Ok(EpisodeOutcome::Stalled) => {
                        self.stats.stall_aborts += 1;
                        self.episode += 1;
                        RunState::Configuring
                    }
                    Err(e) => self.next_state_for_error(e)?,
                },

                RunState::Restarting => {
                    self.stats.reconnects += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                    self.reset_run_state();
                    RunState::Connecting
                }

                RunState::Done => break,
            };
        }

        self.stats.duration = started.elapsed();
        Ok(self.stats)
    }

    /// Map an error to the next state: transport failures restart the run,
    /// anything else terminates it.
    fn next_state_for_error(&mut self, err: CollectorError) -> Result<RunState> {
        match err {
            CollectorError::Client(ref client_err) if client_err.is_transport() => {
                warn!(error = %client_err, "transport failure, restarting collection run");
                Ok(RunState::Restarting)
            }
            other => Err(other),
        }
    }

    /// Reset per-run state after a transport failure: the whole collection
    /// procedure starts over from scratch.
    fn reset_run_state(&mut self) {
        self.episode = 0;
        self.frames_accepted = 0;
        self.novelty.reset();
        self.stall.reset();
    }

    /// Build/load settings, start an episode at a random spot, run warm-up
    #[instrument(name = "configure_episode", skip(self), fields(episode = self.episode))]
    async fn configure_episode(&mut self) -> Result<()> {
        let episode_settings = match &self.config.settings_path {
            Some(path) => settings::load_settings(path)?,
            None => settings::build_settings(self.config.quality),
        };

        let scene = self.client.load_settings(&episode_settings).await?;
        let spots = scene.player_start_spots.len();
        if spots == 0 {
            return Err(CollectorError::episode_setup("scene has no start spots"));
        }

        let start_index = rand::rng().random_range(0..spots);
        info!(start_index, spots, "starting new episode");
        self.client.start_episode(start_index).await?;

        self.stats.episodes_started += 1;
        if self.config.novelty_scope == NoveltyScope::Episode {
            self.novelty.reset();
        }
        self.stall.reset();

        // Warm-up window: let the world settle, echoing autopilot with a
        // little steer noise to decorrelate restarts.
        for _ in 0..self.config.warmup_frames {
            let (measurements, _) = self.client.read_data().await?;
            self.stats.frames_seen += 1;

            let mut control = measurements.player.autopilot_control;
            if self.config.steer_noise > 0.0 {
                let offset =
                    rand::rng().random_range(-self.config.steer_noise..=self.config.steer_noise);
                control = control.with_steer_offset(offset);
            }
            self.client.send_control(&control).await?;
        }

        Ok(())
    }

    /// The frame loop for one episode
    async fn collect_episode(&mut self) -> Result<EpisodeOutcome> {
        loop {
            let (measurements, sensors) = self.client.read_data().await?;
            self.stats.frames_seen += 1;
            let player = &measurements.player;

            if self.stall.observe(player.forward_speed) {
                info!(
                    episode = self.episode,
                    streak = self.stall.streak(),
                    "vehicle stalled, abandoning episode"
                );
                return Ok(EpisodeOutcome::Stalled);
            }

            self.recorder
                .append_debug_log(self.episode, self.frames_accepted, self.stall.streak())?;

            let (x, y) = player.position_2d();
            if self.novelty.check_and_record(x, y) {
                self.log_accepted_frame(&measurements);
                self.recorder
                    .record_sensors(self.episode, self.frames_accepted, &sensors)?;
                self.recorder.append_pose(self.episode, player)?;
                self.frames_accepted += 1;
                self.stats.frames_accepted += 1;
            }

            self.client.send_control(&player.autopilot_control).await?;

            if self.frames_accepted >= self.config.max_frames {
                return Ok(EpisodeOutcome::TargetReached);
            }
        }
    }

    fn log_accepted_frame(&self, measurements: &contracts::Measurements) {
        let player = &measurements.player;
        let (x, y) = player.position_2d();
        info!(
            episode = self.episode,
            frame = self.frames_accepted,
            pos = format!("({x:.1}, {y:.1})"),
            speed_kmh = format!("{:.0}", player.speed_kmh()),
            collisions = format!(
                "vehicles={:.0} pedestrians={:.0} other={:.0}",
                player.collision_vehicles,
                player.collision_pedestrians,
                player.collision_other
            ),
            other_lane_pct = format!("{:.0}", 100.0 * player.intersection_otherlane),
            offroad_pct = format!("{:.0}", 100.0 * player.intersection_offroad),
            agents = measurements.non_player_agent_count,
            "frame accepted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_client::{MockFrame, MockSimulatorClient};
    use tempfile::tempdir;

    fn test_config(output: &std::path::Path) -> CollectorConfig {
        CollectorConfig {
            output_dir: output.to_path_buf(),
            max_frames: 3,
            warmup_frames: 0,
            stall_limit: 5,
            retry_delay: std::time::Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn run_reaches_frame_target() {
        let dir = tempdir().unwrap();
        let client = MockSimulatorClient::new();
        for i in 0..3 {
            client.push_frame(MockFrame::at(i as f64 * 10.0, 0.0));
        }
        let handle = client.clone();

        let collector = Collector::new(test_config(dir.path()), client);
        let stats = collector.run().await.unwrap();

        assert_eq!(stats.frames_accepted, 3);
        assert_eq!(stats.episodes_started, 1);
        assert_eq!(handle.started_episodes().len(), 1);
        // Every read echoed one control back
        assert_eq!(handle.controls_sent().len(), 3);
    }

    #[tokio::test]
    async fn stall_starts_new_episode() {
        let dir = tempdir().unwrap();
        let client = MockSimulatorClient::new();
        // One novel frame, then a stall (limit 5 -> fires at the 6th
        // consecutive stopped frame), then fresh frames far away.
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frames(MockFrame::stopped(0.0, 0.0), 6);
        client.push_frame(MockFrame::at(100.0, 0.0));
        client.push_frame(MockFrame::at(200.0, 0.0));

        let handle = client.clone();
        let collector = Collector::new(test_config(dir.path()), client);
        let stats = collector.run().await.unwrap();

        assert_eq!(stats.frames_accepted, 3);
        assert_eq!(stats.stall_aborts, 1);
        assert_eq!(stats.episodes_started, 2);
        assert_eq!(handle.started_episodes().len(), 2);
        // Second episode writes under episode_0001
        assert!(dir.path().join("episode_0001/pose.txt").exists());
    }

    #[tokio::test]
    async fn non_transport_error_terminates() {
        let dir = tempdir().unwrap();
        // No frames scripted: the mock reports an episode error on read
        let client = MockSimulatorClient::new();
        let collector = Collector::new(test_config(dir.path()), client);
        let err = collector.run().await.unwrap_err();
        assert!(matches!(err, CollectorError::Client(_)));
    }
}
