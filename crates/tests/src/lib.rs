//! # Integration Tests
//!
//! End-to-end tests driving the full collection state machine against the
//! scriptable mock simulator client. No CARLA server required.

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use collector::{Collector, CollectorConfig, NoveltyScope};
    use sim_client::{MockFrame, MockScript, MockSimulatorClient};
    use tempfile::tempdir;

    fn base_config(output: &std::path::Path) -> CollectorConfig {
        CollectorConfig {
            output_dir: output.to_path_buf(),
            warmup_frames: 0,
            stall_limit: 3,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    /// Warm-up frames are consumed before collection and receive perturbed
    /// steering; collection frames echo the autopilot control untouched.
    #[tokio::test]
    async fn warmup_perturbs_steering_then_collects() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            warmup_frames: 2,
            steer_noise: 0.1,
            max_frames: 2,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::new();
        client.push_frames(MockFrame::at(-100.0, -100.0), 2); // warm-up
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frame(MockFrame::at(10.0, 0.0));
        let handle = client.clone();

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 2);
        // Warm-up frames are seen but never persisted
        assert_eq!(stats.frames_seen, 4);
        assert!(!dir.path().join("episode_0000/CameraRGB/000002.png").exists());

        let controls = handle.controls_sent();
        assert_eq!(controls.len(), 4);
        // Warm-up steering stays within the noise bound around autopilot's 0.0
        assert!(controls[0].steer.abs() <= 0.1);
        assert!(controls[1].steer.abs() <= 0.1);
        // Collection echoes the autopilot suggestion exactly
        assert_eq!(controls[2].steer, 0.0);
        assert_eq!(controls[3].steer, 0.0);
    }

    /// The accepted-frame count never exceeds the configured maximum, even
    /// with novel frames left in the stream.
    #[tokio::test]
    async fn accepted_frames_capped_at_maximum() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 4,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::new();
        for i in 0..10 {
            client.push_frame(MockFrame::at(i as f64 * 10.0, 0.0));
        }
        let handle = client.clone();

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 4);
        // The loop stops reading once the target is hit
        assert_eq!(handle.reads(), 4);
    }

    /// A transport failure mid-episode restarts the whole run: a fresh
    /// connection, episode counter and accepted positions reset.
    #[tokio::test]
    async fn transport_failure_restarts_run_from_scratch() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 2,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::with_script(MockScript {
            fail_reads: vec![1],
            ..Default::default()
        });
        client.push_frame(MockFrame::at(0.0, 0.0));
        // Served after the reconnect; (0, 0) is accepted a second time
        // because the position list was reset with the run.
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frame(MockFrame::at(10.0, 0.0));
        let handle = client.clone();

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.reconnects, 1);
        assert_eq!(stats.episodes_started, 2);
        assert_eq!(handle.connects_attempted(), 2);
        // Cumulative over both attempts: one frame before the drop, two after
        assert_eq!(stats.frames_accepted, 3);

        // Episode numbering restarted at zero, so pose.txt accumulated the
        // pre-failure line plus both post-restart lines.
        let pose = std::fs::read_to_string(dir.path().join("episode_0000/pose.txt")).unwrap();
        assert_eq!(pose.lines().count(), 3);
    }

    /// Under the default run scope, accepted positions survive a stall
    /// abort: revisiting an old position in the next episode is rejected.
    #[tokio::test]
    async fn positions_carry_over_stall_abort_in_run_scope() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 3,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::new();
        client.push_frame(MockFrame::at(0.0, 0.0));
        // stall_limit 3: the 4th consecutive stopped frame fires the abort
        client.push_frames(MockFrame::stopped(0.0, 0.0), 4);
        // Next episode revisits (0, 0) before finding new ground
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frame(MockFrame::at(50.0, 0.0));
        client.push_frame(MockFrame::at(60.0, 0.0));
        let handle = client.clone();

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 3);
        assert_eq!(stats.stall_aborts, 1);
        assert_eq!(stats.episodes_started, 2);
        assert_eq!(handle.started_episodes().len(), 2);

        // Episode 1 persisted only the two genuinely novel frames
        let pose = std::fs::read_to_string(dir.path().join("episode_0001/pose.txt")).unwrap();
        assert_eq!(pose.lines().count(), 2);
        // but logged all three of its ticks
        let log = std::fs::read_to_string(dir.path().join("episode_0001/log.txt")).unwrap();
        assert_eq!(log.lines().count(), 3);
    }

    /// Episode scope resets the position list per episode, so a revisited
    /// position is accepted again after a stall abort.
    #[tokio::test]
    async fn episode_scope_resets_positions_per_episode() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 3,
            novelty_scope: NoveltyScope::Episode,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::new();
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frames(MockFrame::stopped(0.0, 0.0), 4);
        client.push_frame(MockFrame::at(0.0, 0.0));
        client.push_frame(MockFrame::at(50.0, 0.0));

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 3);

        let pose = std::fs::read_to_string(dir.path().join("episode_0001/pose.txt")).unwrap();
        // (0, 0) was accepted again in the new episode
        assert!(pose.lines().next().unwrap().starts_with("0.00 0.00"));
    }

    /// Accepted frames leave the full on-disk layout behind: sensor dumps
    /// keyed by (episode, sensor, frame), the pose log and the debug log.
    #[tokio::test]
    async fn accepted_frames_persist_full_layout() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 1,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::new();
        client.push_frame(MockFrame::at(3.0, -4.0).with_speed(10.0));

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 1);

        let episode = dir.path().join("episode_0000");
        // Default rig sensors, frame counter zero
        assert!(episode.join("CameraRGB/000000.png").exists());
        assert!(episode.join("CameraDepth/000000.png").exists());
        assert!(episode.join("CameraSemSeg/000000.png").exists());
        assert!(episode.join("Lidar64/000000.ply").exists());

        let pose = std::fs::read_to_string(episode.join("pose.txt")).unwrap();
        assert_eq!(pose, "3.00 -4.00 0.50 0.00 0.00 0.00 36\n");
        let log = std::fs::read_to_string(episode.join("log.txt")).unwrap();
        assert_eq!(log, "0 0\n");
    }

    /// Repeated connect refusals are retried until the server comes back.
    #[tokio::test]
    async fn connect_refusals_retried_until_success() {
        let dir = tempdir().unwrap();
        let config = CollectorConfig {
            max_frames: 1,
            ..base_config(dir.path())
        };

        let client = MockSimulatorClient::with_script(MockScript {
            fail_connects: 2,
            ..Default::default()
        });
        client.push_frame(MockFrame::at(0.0, 0.0));
        let handle = client.clone();

        let stats = Collector::new(config, client).run().await.unwrap();
        assert_eq!(stats.frames_accepted, 1);
        assert_eq!(stats.reconnects, 2);
        assert_eq!(handle.connects_attempted(), 3);
    }
}
