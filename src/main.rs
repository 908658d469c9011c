//! Collect Energy entry point
//!
//! On wasm32 the game mounts on `#container` and runs on requestAnimationFrame.
//! Natively there is no window: a headless demo plays one scripted run.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;

    use collect_energy::GameOptions;
    use collect_energy::event::{Payload, handler, kinds};
    use collect_energy::platform::web::{MountedGame, mount};

    thread_local! {
        static GAME: RefCell<Option<MountedGame>> = const { RefCell::new(None) };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Collect Energy starting...");

        let mounted = mount(GameOptions::new("#container"));
        {
            let game = mounted.game.borrow();
            game.on(
                kinds::ERROR,
                handler(|e| {
                    if let Payload::Message(message) = &e.payload {
                        log::error!("Collect Energy failed: {}", message);
                    }
                }),
            );
            game.on(kinds::FINISH, handler(|_| log::info!("Collect Energy ready")));
        }
        GAME.with(|slot| *slot.borrow_mut() = Some(mounted));
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Collect Energy (native) starting...");
    log::info!("Native mode runs a headless demo - build for wasm32 to play in the browser");

    let summary = headless::run(12);
    println!(
        "Demo finished: score {}, misses {}, high score {}",
        summary.score, summary.misses, summary.high_score
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use collect_energy::assets::{AssetLoader, QueuedImageBackend};
    use collect_energy::event::{Payload, handler, kinds};
    use collect_energy::platform::{GameLoop, ManualScheduler};
    use collect_energy::scoreboard::ScoreSnapshot;
    use collect_energy::sim::GameState;
    use collect_energy::surface::RecordingSurface;
    use collect_energy::task::TaskQueue;
    use collect_energy::{Game, GameOptions};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Two minutes of frames at most
    const MAX_FRAMES: u32 = 60 * 120;

    /// Play one run: click the `clicks` first globes that fully enter the
    /// area, then let the rest fall until the run is lost.
    pub fn run(clicks: u32) -> ScoreSnapshot {
        let queue = TaskQueue::new();
        let surface = RecordingSurface::new(480.0, 640.0).shared();
        surface.borrow().mount(&queue);
        let assets = AssetLoader::new(QueuedImageBackend::new(&queue));

        let mut options = GameOptions::new("#container");
        options.rate = Some(0.75);
        options.tuning.seed = Some(42);
        let game = Rc::new(RefCell::new(Game::new(
            options,
            surface.clone(),
            assets,
            queue,
        )));
        game.borrow().on(
            kinds::SCORE,
            handler(|e| {
                if let Payload::Score(score) = &e.payload {
                    log::info!("Score {} / misses {}", score.score, score.misses);
                }
            }),
        );

        let scheduler = ManualScheduler::new();
        let frame_loop = GameLoop::new(game.clone(), Rc::new(scheduler.clone()));
        frame_loop.start();

        let mut now = 0.0;
        scheduler.step(now);
        game.borrow_mut().start();

        let mut clicked = 0;
        for _ in 0..MAX_FRAMES {
            now += FRAME_MS;
            scheduler.step(now);
            surface.borrow_mut().take_commands();

            let (state, score) = {
                let g = game.borrow();
                (g.state(), g.score())
            };
            if state == GameState::Selecting && score.misses > 0 {
                break;
            }
            if state != GameState::Running || clicked >= clicks {
                continue;
            }

            let target = {
                let g = game.borrow();
                let controller = g.controller();
                let population = controller.population();
                let top = controller.area().map(|a| a.top()).unwrap_or(0.0);
                population
                    .ids()
                    .into_iter()
                    .filter_map(|id| population.globe(id))
                    .filter(|globe| globe.top().is_some_and(|t| t >= top))
                    .find_map(|globe| globe.coordinate())
            };
            if let Some(point) = target {
                surface.borrow().click(point.x, point.y);
                clicked += 1;
            }
        }

        frame_loop.stop();
        let summary = game.borrow().score();
        game.borrow_mut().destroy();
        summary
    }
}
