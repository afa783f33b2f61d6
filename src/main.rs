//! Flip to Match entry point
//!
//! Native: plays a game with a simple memory bot and prints the outcome.
//! Web: exposes `WebGame` to the page script, which does the rendering.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use flip_match::game::{DynCollaborators, DynGame};
    use flip_match::persistence::{HttpSink, KvResultLog, KvStore, LocalStorage, MemoryStore};
    use flip_match::platform::{SystemClock, prefers_reduced_motion};
    use flip_match::sim::{IconPool, PlayerSetup};
    use flip_match::{Collaborators, Game, Settings};

    const RESULTS_KEY: &str = "FlipToMatchGame:results";

    fn now() -> u64 {
        js_sys::Date::now() as u64
    }

    fn open_store() -> Box<dyn KvStore> {
        match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("LocalStorage unavailable ({e}), scores will not persist");
                Box::new(MemoryStore::new())
            }
        }
    }

    /// Game handle driven by the page
    #[wasm_bindgen]
    pub struct WebGame {
        game: DynGame,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new() -> WebGame {
            let mut settings = Settings::load();
            settings.reduced_motion |= prefers_reduced_motion();

            let collaborators: DynCollaborators = Collaborators {
                store: open_store(),
                log: Box::new(KvResultLog::new(open_store(), RESULTS_KEY)),
                sink: Box::new(HttpSink::default()),
                clock: Box::new(SystemClock),
            };
            let seed = now();
            log::info!("Game initialized with seed: {}", seed);
            WebGame {
                game: Game::new(settings, IconPool::default(), collaborators, seed),
            }
        }

        pub fn title(&self) -> String {
            self.game.settings().game_name.clone()
        }

        /// Start a game; errors carry the validation message
        pub fn start(
            &mut self,
            name: String,
            email: Option<String>,
            rows: u32,
            columns: u32,
            hide_matched: bool,
        ) -> Result<(), JsValue> {
            let setup = PlayerSetup {
                name,
                email,
                rows,
                columns,
                hide_matched,
            };
            self.game
                .start(&setup, now())
                .map(|_| ())
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }

        pub fn select(&mut self, index: usize) -> bool {
            self.game.select(index, now())
        }

        pub fn segment_complete(&mut self, index: usize) {
            self.game.segment_complete(index, now());
        }

        /// Advance the game; returns the new events as a JSON array
        pub fn tick(&mut self) -> String {
            let events = self.game.tick(now());
            serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
        }

        /// Call when the player leaves the page
        pub fn abandon(&mut self) -> bool {
            self.game.abandon(now())
        }

        pub fn best_score(&mut self, slots: u32) -> Option<u32> {
            self.game.best(slots).map(|b| b.score)
        }

        /// Apply settings JSON from the page and keep them for the next visit.
        /// The game in progress is unaffected.
        pub fn save_settings(&mut self, json: &str) {
            let mut settings = Settings::from_json(json);
            settings.save();
            settings.reduced_motion |= prefers_reduced_motion();
            self.game.set_settings(settings);
        }

        /// Current board as JSON, one entry per cell
        pub fn board(&self) -> String {
            let Some(session) = self.game.session() else {
                return "[]".to_string();
            };
            let radius = &self.game.settings().card.radius;
            let cells: Vec<_> = session
                .cards()
                .iter()
                .map(|card| {
                    let shown = card.flip.displayed();
                    serde_json::json!({
                        "label": card.label(),
                        "filler": card.is_filler(),
                        "matched": card.matched,
                        "removed": card.removed,
                        "side": shown.side,
                        "image": shown.image,
                        "background": shown.background,
                        "mirrored": shown.mirrored,
                        "highlighted": card.flip.is_highlighted(),
                        "radius": radius,
                    })
                })
                .collect();
            serde_json::Value::Array(cells).to_string()
        }
    }

    impl Default for WebGame {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Logger init failed: {e}").into());
    }
    log::info!("Flip to Match ready");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    native::run(std::env::args().skip(1).collect());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use rand::SeedableRng;
    use rand::seq::IndexedRandom;
    use rand_pcg::Pcg32;

    use flip_match::game::DynCollaborators;
    use flip_match::persistence::{FileStore, JsonlResultLog, MemoryResultLog, NullSink, ResultLog};
    use flip_match::platform::{Clock, SystemClock, prefers_reduced_motion};
    use flip_match::sim::{GameEvent, IconPool, PlayerSetup, Session};
    use flip_match::{Collaborators, Game, Settings, format_time};

    /// Simulated time step between bot decisions
    const STEP_MS: u64 = 50;
    /// Give up after an hour of game time
    const TIME_LIMIT_MS: u64 = 3_600_000;

    struct Options {
        rows: u32,
        columns: u32,
        name: String,
        seed: u64,
        hide_matched: bool,
        emoji: bool,
    }

    fn parse_args(args: Vec<String>) -> Options {
        let mut options = Options {
            rows: 4,
            columns: 4,
            name: "Player".to_string(),
            seed: SystemClock.now_ms(),
            hide_matched: false,
            emoji: false,
        };
        let mut positional = Vec::new();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--hide-matched" => options.hide_matched = true,
                "--emoji" => options.emoji = true,
                "--seed" => {
                    if let Some(seed) = iter.next().and_then(|s| s.parse().ok()) {
                        options.seed = seed;
                    }
                }
                _ => positional.push(arg),
            }
        }
        if let Some(rows) = positional.first().and_then(|s| s.parse().ok()) {
            options.rows = rows;
        }
        if let Some(columns) = positional.get(1).and_then(|s| s.parse().ok()) {
            options.columns = columns;
        }
        if let Some(name) = positional.get(2) {
            options.name = name.clone();
        }
        options
    }

    fn collaborators() -> DynCollaborators {
        let dir = std::env::var("FLIP_MATCH_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".flip-match"));
        let log: Box<dyn ResultLog> = match JsonlResultLog::open(dir.join("results.jsonl")) {
            Ok(log) => Box::new(log),
            Err(e) => {
                log::warn!("Result log unavailable ({e}), keeping results in memory");
                Box::new(MemoryResultLog::new())
            }
        };
        Collaborators {
            store: Box::new(FileStore::new(dir.join("best.json"))),
            log,
            sink: Box::new(NullSink),
            clock: Box::new(SystemClock),
        }
    }

    /// Remembers every face it has seen
    struct Bot {
        seen: HashMap<String, Vec<usize>>,
        rng: Pcg32,
    }

    impl Bot {
        fn new(seed: u64) -> Self {
            Self {
                seen: HashMap::new(),
                rng: Pcg32::seed_from_u64(seed),
            }
        }

        fn observe(&mut self, session: &Session) {
            for (index, card) in session.cards().iter().enumerate() {
                if !card.flip.is_face() || card.matched {
                    continue;
                }
                if let Some(label) = card.label() {
                    let slots = self.seen.entry(label.to_string()).or_default();
                    if !slots.contains(&index) {
                        slots.push(index);
                    }
                }
            }
        }

        fn is_known(&self, index: usize) -> bool {
            self.seen.values().any(|v| v.contains(&index))
        }

        /// Known partner of `index` that can still be picked
        fn partner(&self, session: &Session, index: usize) -> Option<usize> {
            let label = session.card(index)?.label()?;
            self.seen
                .get(label)?
                .iter()
                .copied()
                .find(|&i| i != index && session.card(i).is_some_and(|c| c.is_selectable()))
        }

        fn pick(&mut self, session: &Session) -> Option<usize> {
            let selectable: Vec<usize> = (0..session.cards().len())
                .filter(|&i| session.cards()[i].is_selectable())
                .collect();

            if let Some(&first) = session.pending().first() {
                if let Some(partner) = self.partner(session, first) {
                    return Some(partner);
                }
            } else if let Some(&known) = selectable
                .iter()
                .find(|&&i| self.partner(session, i).is_some())
            {
                return Some(known);
            }

            let unknown: Vec<usize> = selectable
                .iter()
                .copied()
                .filter(|&i| !self.is_known(i))
                .collect();
            unknown
                .choose(&mut self.rng)
                .or_else(|| selectable.choose(&mut self.rng))
                .copied()
        }
    }

    pub fn run(args: Vec<String>) {
        let options = parse_args(args);

        let mut settings = Settings::load();
        settings.reduced_motion |= prefers_reduced_motion();
        // No renderer here to report finished half-rotations
        settings.card.auto_segments = true;
        log::info!("{} (native) starting...", settings.game_name);

        let pool = if options.emoji {
            IconPool::emoji()
        } else {
            IconPool::default()
        };
        let mut game = Game::new(settings, pool, collaborators(), options.seed);

        let setup = PlayerSetup {
            hide_matched: options.hide_matched,
            ..PlayerSetup::new(options.name.as_str(), options.rows, options.columns)
        };
        let slots = options.rows * options.columns;
        let previous_best = game.best(slots);

        if let Err(e) = game.start(&setup, 0) {
            eprintln!("Cannot start game: {e}");
            std::process::exit(2);
        }

        let mut bot = Bot::new(options.seed ^ 0x5EED);
        let mut now = 0;
        let mut presented = false;
        while !presented && now < TIME_LIMIT_MS {
            for event in game.tick(now) {
                match event {
                    GameEvent::Status(text) => println!("{} {text}", format_time(now)),
                    GameEvent::WinPresented => presented = true,
                    _ => {}
                }
            }
            let Some(session) = game.session() else {
                break;
            };
            bot.observe(session);
            if !session.is_busy() && !session.is_won() {
                if let Some(index) = bot.pick(session) {
                    game.select(index, now);
                }
            }
            now += STEP_MS;
        }

        let Some(summary) = game.session().filter(|s| s.is_won()).map(Session::summary) else {
            game.abandon(now);
            println!("Gave up after {}", format_time(now));
            return;
        };

        println!();
        println!(
            "{}x{}: {} pairs in {} moves, {}",
            summary.rows,
            summary.columns,
            summary.matches_found,
            summary.moves,
            format_time(summary.time_ms)
        );
        println!("Score: {} / {}", summary.score, summary.max_score);
        match (previous_best, game.last_best()) {
            (Some(before), Some(after)) if after.score > before.score => {
                println!("New best for {slots} cards (was {})", before.score)
            }
            (None, Some(_)) => println!("First best score for {slots} cards"),
            (_, Some(best)) => println!("Best for {slots} cards: {}", best.score),
            (_, None) => {}
        }
    }
}
