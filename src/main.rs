//! Feast or Famine entry point
//!
//! On the web this wires the canvas, DOM events and the ledger into a
//! [`GameLoop`]. Natively it plays one headless session on an autopilot and
//! submits the result to an in-process ledger.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, PageTransitionEvent, TouchEvent,
        UrlSearchParams,
    };

    use feast_famine::GAME_ID;
    use feast_famine::driver::{FrameOutcome, GameLoop};
    use feast_famine::bests::{LocalRun, PersonalBests};
    use feast_famine::ledger::fetch::FetchTransport;
    use feast_famine::ledger::poll::POLL_INTERVAL_MS;
    use feast_famine::ledger::retry::TimeoutSleeper;
    use feast_famine::ledger::wallet::InjectedWallet;
    use feast_famine::ledger::{
        LeaderboardEntry, LeaderboardPanel, LedgerClient, SubmissionStatus, SubmitOutcome, WalletProvider,
        iso_timestamp, poll_leaderboard, report_final_score,
    };
    use feast_famine::platform::{Clock, FrameScheduler, FrameToken, KeyAction, SystemClock};
    use feast_famine::renderer::{CanvasSurface, RenderOptions};
    use feast_famine::settings::Settings;
    use feast_famine::sim::{GamePhase, GameState};

    type Game = GameLoop<SystemClock, RafScheduler, CanvasSurface>;

    /// Frames come from `requestAnimationFrame`; the callback only holds a
    /// weak handle so a torn-down page drops late frames.
    struct RafScheduler {
        host: Weak<RefCell<Host>>,
    }

    impl FrameScheduler for RafScheduler {
        fn request(&self) -> FrameToken {
            let host = self.host.clone();
            let closure = Closure::once(move |_time: f64| {
                if let Some(host) = host.upgrade() {
                    on_frame(&host);
                }
            });
            let id = web_sys::window()
                .and_then(|w| w.request_animation_frame(closure.as_ref().unchecked_ref()).ok())
                .unwrap_or_default();
            closure.forget();
            FrameToken(id)
        }

        fn cancel(&self, token: FrameToken) {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.cancel_animation_frame(token.0) {
                    log::warn!("cancelAnimationFrame failed: {:?}", e);
                }
            }
        }
    }

    /// Everything the page keeps alive
    struct Host {
        game: Game,
        settings: Settings,
        bests: PersonalBests,
        /// Personal-best rank of the last finished run
        last_rank: Option<usize>,
        wallet_address: Option<String>,
        submission: Rc<RefCell<SubmissionStatus>>,
        leaderboard: Rc<RefCell<LeaderboardPanel>>,
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            if let Err(e) = el.set_attribute("class", if visible { "" } else { "hidden" }) {
                log::warn!("Could not toggle #{}: {:?}", id, e);
            }
        }
    }

    /// Attach `callback` for `event`, logging if the browser refuses
    fn listen(target: &EventTarget, event: &str, callback: &JsValue) {
        if let Err(e) = target.add_event_listener_with_callback(event, callback.unchecked_ref()) {
            log::warn!("Could not listen for {}: {:?}", event, e);
        }
    }

    /// `?ledger=...&name=...&rules=...` from the page address
    fn page_overrides() -> Vec<(&'static str, String)> {
        let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
            return Vec::new();
        };
        let Ok(params) = UrlSearchParams::new_with_str(&search) else {
            return Vec::new();
        };
        ["ledger", "name", "rules"]
            .into_iter()
            .filter_map(|key| params.get(key).map(|value| (key, value)))
            .collect()
    }

    fn format_entries(entries: &[LeaderboardEntry]) -> String {
        entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let rank = if e.rank > 0 { e.rank as usize } else { i + 1 };
                let badge = e.badge.map(|b| format!(" [{}]", b.as_str())).unwrap_or_default();
                format!("{}. {} {}{}", rank, e.username, e.score, badge)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    impl Host {
        fn update_hud(&self) {
            let Some(document) = document() else {
                return;
            };
            let state = self.game.state();

            set_text(&document, "#hud-score .hud-value", &state.score.to_string());
            set_text(&document, "#hud-size .hud-value", &format!("{:.0}", state.player.radius));
            set_visible(&document, "hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&document, "#hud-fps .hud-value", &self.game.fps().to_string());
            }
            set_visible(&document, "hud-boost", state.player.is_boosted());
            let best = self.bests.best(self.settings.preset).unwrap_or(0).max(state.score);
            set_text(&document, "#hud-best .hud-value", &best.to_string());

            let over = state.phase == GamePhase::GameOver;
            set_visible(&document, "game-over", over);
            if over {
                set_text(&document, "#final-score", &state.score.to_string());
                let rank = self.last_rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "-".into());
                set_text(&document, "#final-rank", &rank);

                let status = self.submission.borrow();
                let message = if self.wallet_address.is_none() {
                    "Connect a wallet to save your score".to_string()
                } else if status.saving {
                    "Saving score...".to_string()
                } else if status.failed {
                    "Could not save score".to_string()
                } else if let Some(tx) = &status.last_transaction {
                    format!("Score saved ({})", tx)
                } else {
                    String::new()
                };
                set_text(&document, "#submit-status", &message);
            }

            let panel = self.leaderboard.borrow();
            set_text(&document, "#leaderboard-top", &format_entries(&panel.top));
            set_text(&document, "#leaderboard-recent", &format_entries(&panel.recent));
            set_text(
                &document,
                "#leaderboard-stats",
                &format!(
                    "{} players, {} games, {} points",
                    panel.stats.total_players, panel.stats.submission_count, panel.stats.total_score
                ),
            );
        }

        fn ledger_client(&self) -> Option<LedgerClient<FetchTransport, SystemClock>> {
            let endpoint = self.settings.ledger_endpoint()?;
            Some(LedgerClient::new(FetchTransport::new(endpoint), SystemClock))
        }
    }

    fn on_frame(host: &Rc<RefCell<Host>>) {
        let outcome = host.borrow_mut().game.run_frame();
        handle_outcome(host, outcome);
        host.borrow().update_hud();
    }

    fn handle_outcome(host: &Rc<RefCell<Host>>, outcome: FrameOutcome) {
        if let FrameOutcome::GameOver { final_score } = outcome {
            finish_session(host, final_score);
        }
    }

    /// Record the run locally and hand the score to the ledger. A receipt
    /// is written back onto the local run once the ledger confirms it.
    fn finish_session(host: &Rc<RefCell<Host>>, final_score: u64) {
        let mut h = host.borrow_mut();
        let preset = h.settings.preset;
        let played_at = iso_timestamp(SystemClock.now_ms());
        let run = LocalRun {
            score: final_score,
            frames: h.game.state().frame,
            played_at: played_at.clone(),
            wallet: h.wallet_address.clone(),
            transaction_id: None,
        };
        h.last_rank = h.bests.record(preset, run);
        h.bests.save();

        let Some(client) = h.ledger_client() else {
            log::info!("No ledger endpoint configured; score kept locally");
            return;
        };
        let name = h.settings.display_name().map(str::to_owned);
        let identity = h.wallet_address.clone();
        let status = Rc::downgrade(&h.submission);
        let weak = Rc::downgrade(host);
        drop(h);

        wasm_bindgen_futures::spawn_local(async move {
            let outcome =
                report_final_score(&client, identity.as_deref(), GAME_ID, final_score, name.as_deref(), &status).await;
            let (SubmitOutcome::Submitted(receipt), Some(host)) = (outcome, weak.upgrade()) else {
                return;
            };
            let mut h = host.borrow_mut();
            if h.bests.mark_synced(preset, &played_at, &receipt.transaction_id) {
                h.bests.save();
            }
        });
    }

    fn restart(host: &Rc<RefCell<Host>>) {
        let mut h = host.borrow_mut();
        if h.game.restart() {
            h.last_rank = None;
            *h.submission.borrow_mut() = SubmissionStatus::default();
            log::info!("New session started");
        }
    }

    fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            client_x as f32 - rect.left() as f32,
            client_y as f32 - rect.top() as f32,
        )
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, host: &Rc<RefCell<Host>>) {
        // Mouse move
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                host.borrow_mut()
                    .game
                    .input_mut()
                    .pointer_moved(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
            listen(canvas, "mousemove", closure.as_ref());
            closure.forget();
        }

        // Touch steers like the mouse
        for event_name in ["touchstart", "touchmove"] {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let pos = canvas_point(&canvas_clone, touch.client_x(), touch.client_y());
                    host.borrow_mut().game.input_mut().pointer_moved(pos);
                }
            });
            listen(canvas, event_name, closure.as_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(action) = KeyAction::from_key(&event.key()) else {
                    return;
                };
                event.prevent_default();
                if action == KeyAction::Restart {
                    restart(&host);
                    host.borrow().update_hud();
                    return;
                }
                let outcome = host.borrow_mut().game.press(action);
                handle_outcome(&host, outcome);
                host.borrow().update_hud();
            });
            listen(&window, "keydown", closure.as_ref());
            closure.forget();
        }

        // Resize moves the viewport only
        if let Some(window) = web_sys::window() {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::UiEvent| {
                let mut h = host.borrow_mut();
                if let Some(size) = h.game.surface().map(|s| s.fit_to_client()) {
                    h.game.resize(size.x, size.y);
                }
            });
            listen(&window, "resize", closure.as_ref());
            closure.forget();
        }

        // Leaving the page for good stops the loop; a page parked in the
        // back/forward cache keeps running when restored
        if let Some(window) = web_sys::window() {
            let host = Rc::downgrade(host);
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PageTransitionEvent| {
                if event.persisted() {
                    return;
                }
                if let Some(host) = host.upgrade() {
                    host.borrow_mut().game.teardown();
                }
            });
            listen(&window, "pagehide", closure.as_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, host: &Rc<RefCell<Host>>) {
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                restart(&host);
                host.borrow().update_hud();
            });
            listen(&btn, "click", closure.as_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("connect-wallet") {
            let host = Rc::downgrade(host);
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let host = host.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match InjectedWallet.connect().await {
                        Ok(address) => {
                            if let Some(host) = host.upgrade() {
                                host.borrow_mut().wallet_address = Some(address);
                                host.borrow().update_hud();
                            }
                        }
                        Err(e) => log::error!("Error connecting wallet: {}", e),
                    }
                });
            });
            listen(&btn, "click", closure.as_ref());
            closure.forget();
        }
    }

    /// Pick up a wallet the player already connected on a previous visit
    fn restore_wallet(host: &Rc<RefCell<Host>>) {
        if !InjectedWallet::is_available() {
            log::info!("No wallet extension found");
            return;
        }
        let host = Rc::downgrade(host);
        wasm_bindgen_futures::spawn_local(async move {
            let address = InjectedWallet.active_address().await;
            if let (Some(address), Some(host)) = (address, host.upgrade()) {
                log::info!("Wallet already connected: {}", address);
                host.borrow_mut().wallet_address = Some(address);
            }
        });
    }

    fn start_leaderboard_polling(host: &Rc<RefCell<Host>>) {
        let h = host.borrow();
        let Some(client) = h.ledger_client() else {
            return;
        };
        let panel = Rc::downgrade(&h.leaderboard);
        wasm_bindgen_futures::spawn_local(async move {
            poll_leaderboard(&client, GAME_ID, POLL_INTERVAL_MS, &TimeoutSleeper, &SystemClock, panel).await;
        });
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Feast or Famine starting...");

        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
        set_visible(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        let surface = CanvasSurface::new(canvas.clone()).ok_or_else(|| JsValue::from_str("no 2d context"))?;
        surface.fit_to_client();

        let mut settings = Settings::load();
        if settings.apply_overrides(page_overrides()) {
            settings.save();
        }
        match settings.ledger_endpoint() {
            Some(endpoint) => log::info!("Ledger endpoint {}", endpoint),
            None => log::warn!("No ledger endpoint; add ?ledger=<url> to the address to enable the leaderboard"),
        }
        let seed = js_sys::Date::now() as u64;
        let state = GameState::new(seed, settings.rules());
        let options = RenderOptions {
            show_grid: settings.show_grid,
        };
        log::info!("Session seed {}, {} rules", seed, settings.preset.as_str());

        let host = Rc::new_cyclic(|weak: &Weak<RefCell<Host>>| {
            let scheduler = RafScheduler { host: weak.clone() };
            RefCell::new(Host {
                game: GameLoop::new(state, SystemClock, scheduler).with_options(options),
                settings,
                bests: PersonalBests::load(),
                last_rank: None,
                wallet_address: None,
                submission: Rc::new(RefCell::new(SubmissionStatus::default())),
                leaderboard: Rc::new(RefCell::new(LeaderboardPanel::default())),
            })
        });

        setup_input_handlers(&canvas, &host);
        setup_buttons(&document, &host);
        restore_wallet(&host);
        start_leaderboard_polling(&host);

        {
            let mut h = host.borrow_mut();
            h.game.attach_surface(surface);
            h.game.start();
        }
        set_visible(&document, "hud", true);
        host.borrow().update_hud();

        log::info!("Feast or Famine running!");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use feast_famine::bests::{LocalRun, PersonalBests};
    use feast_famine::driver::{FrameOutcome, GameLoop};
    use feast_famine::ledger::poll::refresh_panel;
    use feast_famine::ledger::retry::ThreadSleeper;
    use feast_famine::ledger::{
        Backoff, LeaderboardPanel, LedgerClient, MemoryLedger, MemoryWallet, SubmissionStatus, SubmitOutcome,
        WalletProvider, iso_timestamp, report_final_score,
    };
    use feast_famine::platform::{Clock, KeyAction, ManualClock, ManualScheduler};
    use feast_famine::renderer::RecordingSurface;
    use feast_famine::settings::Settings;
    use feast_famine::sim::GameState;
    use feast_famine::{GAME_ID, RuleTable, TuningError};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Three minutes of play
    const MAX_FRAMES: u64 = 60 * 60 * 3;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    type Headless = GameLoop<Rc<ManualClock>, Rc<ManualScheduler>, RecordingSurface>;

    /// Steer toward the nearest pellet, boosting now and then
    fn autopilot(game: &mut Headless) {
        let state = game.state();
        let player = state.player.pos;
        let nearest = state
            .foods
            .iter()
            .min_by(|a, b| a.pos.distance_squared(player).total_cmp(&b.pos.distance_squared(player)))
            .map(|f| state.camera.world_to_screen(f.pos));
        let boost = state.frame % 300 == 299;

        if let Some(pointer) = nearest {
            game.input_mut().pointer_moved(pointer);
        }
        if boost {
            game.press(KeyAction::Boost);
        }
    }

    fn load_rules(path: Option<String>, settings: &Settings) -> Result<RuleTable, TuningError> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|e| TuningError::Parse(format!("{}: {}", path, e)))?;
                RuleTable::from_json(&json)
            }
            None => Ok(settings.rules()),
        }
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5eed);
        let settings = Settings::load();
        let rules = match load_rules(args.next(), &settings) {
            Ok(rules) => rules,
            Err(e) => {
                log::error!("Invalid rule table: {}", e);
                return;
            }
        };

        let clock = Rc::new(ManualClock::new(1_714_557_600_000.0));
        let scheduler = Rc::new(ManualScheduler::new());
        let mut game: Headless = GameLoop::new(GameState::new(seed, rules), clock.clone(), scheduler.clone());
        game.attach_surface(RecordingSurface::new(VIEWPORT.x, VIEWPORT.y));
        game.start();
        log::info!("Headless session, seed {}", seed);

        let mut final_score = None;
        while scheduler.fire().is_some() {
            clock.advance(FRAME_MS);
            autopilot(&mut game);
            if let FrameOutcome::GameOver { final_score: score } = game.run_frame() {
                final_score = Some(score);
                break;
            }
            if game.state().frame >= MAX_FRAMES {
                final_score = game.end_game();
                break;
            }
        }
        let Some(final_score) = final_score else {
            log::warn!("Session ended without a score");
            return;
        };
        let frames = game.state().frame;
        println!("Final score {} after {} frames", final_score, frames);

        let ledger = MemoryLedger::new();
        ledger.register_game(GAME_ID);
        let client = LedgerClient::new(ledger, clock.clone());
        let wallet = MemoryWallet::new("headless-wallet");
        let status = Rc::new(RefCell::new(SubmissionStatus::default()));
        let panel = Rc::new(RefCell::new(LeaderboardPanel::default()));

        pollster::block_on(async {
            let identity = wallet.connect().await.ok();
            let played_at = iso_timestamp(clock.now_ms());
            let mut bests = PersonalBests::load();
            let run = LocalRun {
                score: final_score,
                frames,
                played_at: played_at.clone(),
                wallet: identity.clone(),
                transaction_id: None,
            };
            if let Some(rank) = bests.record(settings.preset, run) {
                println!("Personal best #{} ({} rules)", rank, settings.preset.as_str());
            }

            let outcome = report_final_score(
                &client,
                identity.as_deref(),
                GAME_ID,
                final_score,
                settings.display_name(),
                &Rc::downgrade(&status),
            )
            .await;
            match outcome {
                SubmitOutcome::Submitted(receipt) => {
                    println!("Submitted as {}", receipt.transaction_id);
                    bests.mark_synced(settings.preset, &played_at, &receipt.transaction_id);
                }
                SubmitOutcome::Skipped(reason) => println!("Submission skipped: {:?}", reason),
                SubmitOutcome::Failed(e) => println!("Submission failed: {}", e),
            }
            bests.save();

            refresh_panel(&client, GAME_ID, Backoff::default(), &ThreadSleeper, &clock, &Rc::downgrade(&panel)).await;
        });

        let panel = panel.borrow();
        if let Some(e) = &panel.last_error {
            log::error!("Error fetching leaderboard: {}", e);
        }
        for entry in &panel.top {
            println!("{:>3}. {:<20} {}", entry.rank, entry.username, entry.score);
        }
        println!(
            "{} players, {} games, {} points",
            panel.stats.total_players, panel.stats.submission_count, panel.stats.total_score
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Feast or Famine (native) starting...");
    log::info!("Native mode runs one headless session - use `trunk serve` for the web version");
    headless::run();
}
