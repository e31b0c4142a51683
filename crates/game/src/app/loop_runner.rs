use std::process::ExitCode;

use engine::{AudioSink, Key, KeyInput, NullAudio, RenderFrame};
use tracing::info;

use super::bootstrap::AppWiring;
use super::sim::world::WorldSim;

const STEP_MS: f32 = 1000.0 / 60.0;
const SUMMARY_EVERY_FRAMES: u32 = 300;

/// Runs the scripted headless demo: a fixed-step loop over the simulation
/// with a canned input sequence standing in for a player.
pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut sim = WorldSim::new(app.config.seed, app.config.start_level, app.meshes);
    sim.state.display_fps = app.config.display_fps;
    sim.state.fps = 1000.0 / STEP_MS;

    let mut audio = NullAudio;
    let mut frame = RenderFrame::default();

    for frame_index in 0..app.config.demo_frames {
        for input in scripted_inputs(frame_index) {
            sim.on_key(input, &mut audio);
        }

        // Pause timers run even while the simulation itself is held, the
        // same way the fail and success screens freeze play but not time.
        sim.state.fail_screen_pause_ms -= STEP_MS;
        sim.state.success_screen_pause_ms -= STEP_MS;
        let paused = sim.state.show_help
            || sim.state.fail_screen_pause_ms > 0.0
            || sim.state.success_screen_pause_ms > 0.0;
        if paused {
            continue;
        }

        sim.frame(STEP_MS, &mut audio, &mut frame);

        if frame_index % SUMMARY_EVERY_FRAMES == 0 {
            log_summary(&sim, frame_index, &frame);
        }
    }

    info!(
        frames = app.config.demo_frames,
        entities = sim.registry.motions.len(),
        "demo_finished"
    );
    ExitCode::SUCCESS
}

/// A short tour of the controls: walk right, jump, shoot a few times,
/// then stop.
fn scripted_inputs(frame_index: u32) -> Vec<KeyInput> {
    match frame_index {
        10 => vec![KeyInput::pressed(Key::Right)],
        120 => vec![KeyInput::pressed(Key::Up)],
        150 | 200 | 250 => vec![KeyInput::pressed(Key::Space)],
        300 => vec![
            KeyInput::released(Key::Right),
            KeyInput::pressed(Key::Left),
        ],
        420 => vec![KeyInput::released(Key::Left)],
        _ => Vec::new(),
    }
}

fn log_summary(sim: &WorldSim, frame_index: u32, frame: &RenderFrame) {
    let player = sim.level.player;
    let hp = sim
        .registry
        .healths
        .try_get(player)
        .map(|health| health.hp)
        .unwrap_or(0);
    info!(
        frame = frame_index,
        level = ?sim.level.kind,
        entities = sim.registry.motions.len(),
        draw_calls = frame.len(),
        player_hp = hp,
        "sim_summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::RunConfig;
    use crate::app::sim::level::LevelKind;
    use engine::MeshRegistry;

    #[test]
    fn demo_run_completes() {
        let app = AppWiring {
            config: RunConfig {
                seed: 5,
                start_level: LevelKind::Forest,
                display_fps: false,
                demo_frames: 120,
            },
            meshes: MeshRegistry::builtin(),
        };
        let _ = run(app);
    }

    #[test]
    fn script_starts_the_player_walking_right() {
        let mut sim = WorldSim::new(3, LevelKind::Forest, MeshRegistry::builtin());
        let mut audio = NullAudio;

        for input in scripted_inputs(10) {
            sim.on_key(input, &mut audio);
        }

        let motion = sim.registry.motions.get(sim.level.player);
        assert_eq!(motion.velocity.x, 200.0);
        assert!(sim.state.player_moving);
    }
}
