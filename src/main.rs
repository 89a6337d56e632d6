//! Comic Courier headless runner
//!
//! Plays a scripted run against the bundled city and logs what happened.
//! Usage: `comic-courier [seed] [frames] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
use comic_courier::sim::{GameEvent, GamePhase, GameState, HitOutcome, TickInput, tick};
#[cfg(not(target_arch = "wasm32"))]
use comic_courier::{CityMap, Tuning, consts::FRAME_DT};

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(42u64);
    let frames = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(60 * 120u32);

    let tuning = match args.get(2) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(t) => t,
                Err(e) => {
                    log::error!("Bad tuning file {}: {}", path, e);
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => {
                log::error!("Cannot read {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let map = match CityMap::default_city() {
        Ok(map) => map,
        Err(e) => {
            log::error!("Bundled city failed to load: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Comic Courier (headless) seed {} for {} frames", seed, frames);
    let mut state = GameState::new(seed, tuning, &map);
    let mut tally = Tally::default();

    for frame in 0..frames {
        let input = autopilot(&state, frame);
        tick(&mut state, &input, FRAME_DT);
        for event in state.drain_events() {
            log::debug!("frame {}: {:?}", frame, event);
            tally.record(&event);
        }
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    log::info!(
        "Finished after {} ticks: score {}, {} items left, {:.1}s on the clock",
        state.time_ticks,
        state.score(),
        state.items(),
        state.time_left_ms() / 1000.0
    );
    log::info!(
        "Thrown {}, delivered {}, pedestrians served {}, wasted {}, destinations {}, falls {}, crashes {}",
        tally.thrown,
        tally.delivered,
        tally.served,
        tally.wasted,
        tally.destinations,
        tally.falls,
        tally.crashes
    );
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser front end drives the library directly
}

/// Event counts for the end-of-run summary
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
struct Tally {
    thrown: u32,
    delivered: u32,
    served: u32,
    wasted: u32,
    destinations: u32,
    falls: u32,
    crashes: u32,
}

#[cfg(not(target_arch = "wasm32"))]
impl Tally {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ItemThrown { .. } => self.thrown += 1,
            GameEvent::ProjectileHit { outcome, .. } => match outcome {
                HitOutcome::Delivered => self.delivered += 1,
                HitOutcome::PedestrianServed => self.served += 1,
                HitOutcome::Wasted => self.wasted += 1,
                HitOutcome::Destination => {}
            },
            GameEvent::DestinationReached { .. } => self.destinations += 1,
            GameEvent::Fell { .. } => self.falls += 1,
            GameEvent::HardCollision { .. } => self.crashes += 1,
            _ => {}
        }
    }
}

/// Scripted rider: head for the destination marker (or the refill zone when
/// empty), keep the lean in check and throw at anything that wants an item.
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(state: &GameState, frame: u32) -> TickInput {
    use comic_courier::{cartesian_to_polar, normalize_angle};
    use comic_courier::sim::EntityKind;

    const THROW_RANGE: f32 = 300.0;
    const THROW_EVERY: u32 = 20;

    let player = &state.player;
    let goal = if state.items() == 0 {
        state.refill_zone
    } else {
        state.destination
    }
    .and_then(|id| state.world.get(id))
    .map(|e| e.position());

    let mut input = TickInput {
        forward: true,
        ..Default::default()
    };

    if let Some(goal) = goal {
        let (_, bearing) = cartesian_to_polar(goal - player.pos);
        let heading_error = normalize_angle(bearing - player.rotation);
        // Straighten up before the lean gets dangerous
        let leaning = player.balance.meter().abs() > 60.0;
        if !leaning {
            input.left = heading_error < -0.1;
            input.right = heading_error > 0.1;
        }
    }

    if frame % THROW_EVERY == 0 && state.items() > 0 {
        input.throw_at = state
            .world
            .iter()
            .filter(|e| match e.kind() {
                EntityKind::Person => !e.has_item(),
                _ => e.needs_item(),
            })
            .map(|e| (e.position(), e.position().distance(player.pos)))
            .filter(|&(_, d)| d <= THROW_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p);
    }

    input
}
