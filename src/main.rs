//! Orb Dodge headless runner
//!
//! Drives the simulation with an autopilot input source and reports the run.
//!
//! Usage: `orb-dodge [seed] [tuning.json] [scores.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;

    use orb_dodge::consts::SIM_HZ;
    use orb_dodge::sim::{FrameClock, GameEvent, GamePhase, GameState, TickInput};
    use orb_dodge::{Abilities, FrameSnapshot, HighScores, ScoreStore, Tuning};

    /// Give up on runs that survive longer than this
    const MAX_RUN_SECS: u64 = 15 * 60;
    const USER: &str = "autopilot";

    /// Steer away from nearby threats, drift toward pickups otherwise
    fn autopilot(state: &GameState) -> Vec2 {
        let snapshot = FrameSnapshot::capture(state);
        let player = snapshot.player;

        let mut push = Vec2::ZERO;
        for hostile in &snapshot.hostiles {
            let away = player - hostile.pos;
            let dist = away.length().max(1.0);
            if dist < 160.0 {
                push += away / (dist * dist);
            }
        }
        if let Some(boss) = &snapshot.boss {
            let away = player - boss.pos;
            push += away / away.length_squared().max(1.0) * 4.0;
        }

        if push.length_squared() > 1e-6 {
            player + push.normalize() * 12.0
        } else if let Some(pickup) = snapshot.pickups.first() {
            player + (pickup.pos - player).clamp_length_max(6.0)
        } else {
            player + (snapshot.arena / 2.0 - player).clamp_length_max(2.0)
        }
    }

    pub fn run() {
        env_logger::init();
        log::info!("Orb Dodge (headless) starting...");

        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0x5eed);

        let tuning = match args.next() {
            Some(path) => Tuning::load(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning file {path}: {e}");
                Tuning::default()
            }),
            None => Tuning::default(),
        };
        let scores_path = args.next();

        let mut scores = match &scores_path {
            Some(path) => HighScores::load_from(path).unwrap_or_else(|e| {
                log::warn!("Could not read scores from {path}: {e}");
                HighScores::new()
            }),
            None => HighScores::new(),
        };

        let mut state = GameState::with_config(seed, tuning, Abilities::default());
        let mut clock = FrameClock::new();
        let mut input = TickInput::default();
        let frame_dt = 1.0 / SIM_HZ as f32;

        while state.phase != GamePhase::GameOver && state.time_ticks < MAX_RUN_SECS * SIM_HZ as u64 {
            input.pointer = Some(autopilot(&state));
            clock.advance(frame_dt, &mut state, &mut input);

            for event in state.drain_events() {
                match event {
                    GameEvent::BossBanner => println!("[{:>6}] Boss incoming!", state.time_ticks),
                    GameEvent::LevelUp { level } => {
                        println!("[{:>6}] Boss defeated, level {level}", state.time_ticks)
                    }
                    GameEvent::PlayerHit { lives_left } => {
                        println!("[{:>6}] Hit! {lives_left} lives left", state.time_ticks)
                    }
                    _ => {}
                }
            }
        }

        let secs = state.time_ticks / SIM_HZ as u64;
        println!(
            "Run over after {secs}s: score {}, level {}, lives {}",
            state.score, state.level, state.player.lives
        );

        if let Some(rank) = scores.potential_rank(state.score) {
            println!("Leaderboard rank #{rank}");
        }
        if let Some(new_best) = state.finish_run(&mut scores, USER) {
            if new_best {
                println!("New personal best!");
            }
        }
        if let Some(best) = scores.best_score(USER) {
            println!("Best score: {best}");
        }
        if let Some(top) = scores.top_score() {
            println!("Top of the board: {top}");
        }

        if let Some(path) = scores_path {
            if let Err(e) = scores.save_to(&path) {
                log::warn!("Could not save scores to {path}: {e}");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
