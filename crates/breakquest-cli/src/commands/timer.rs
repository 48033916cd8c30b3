use std::thread;
use std::time::Duration;

use breakquest_core::storage::Database;
use breakquest_core::{Config, CoreError, Event, SessionEngine, SessionPhase};
use chrono::Utc;
use clap::Subcommand;

const ENGINE_KEY: &str = "engine";

/// Nominal breath tick, in seconds.
const BREATH_STEP_SECS: f64 = 0.05;
/// Breath steps per 1-second session tick.
const STEPS_PER_SESSION_TICK: u32 = 20;
/// How long the loot notification stays up before auto-dismissal.
const LOOT_DISPLAY: Duration = Duration::from_secs(3);

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session
    Start,
    /// Pause the countdown
    Pause,
    /// Reset everything to idle
    Reset,
    /// Print current engine state as JSON
    Status,
    /// Dismiss the new-loot notification
    Dismiss,
    /// Drive the timers until the session completes, printing events
    Watch,
}

fn load_engine(db: &Database, config: &Config) -> SessionEngine {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        if let Ok(mut engine) = serde_json::from_str::<SessionEngine>(&json) {
            // Pick up config edits made since the last invocation; the
            // engine applies them only when idle.
            engine.set_settings(config.session);
            return engine;
        }
    }
    SessionEngine::with_state(
        config.session,
        db.sessions_today().unwrap_or(0),
        db.inventory().unwrap_or_default(),
    )
}

fn save_engine(db: &Database, engine: &SessionEngine) -> Result<(), CoreError> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

/// Best-effort persistence on phase transitions. Write failures are
/// tolerated; in-memory state stays correct either way.
fn persist_transition(db: &Database, engine: &SessionEngine, event: &Event) {
    match event {
        Event::BreakStarted { .. } => {
            let _ = db.set_sessions_today(engine.sessions_today());
            let _ = db.record_session(
                SessionPhase::Work,
                u64::from(engine.settings().work_minutes),
                Utc::now(),
            );
        }
        Event::SessionCompleted { .. } => {
            let _ = db.save_inventory(engine.inventory());
            let _ = db.record_session(
                SessionPhase::Break,
                u64::from(engine.settings().break_minutes),
                Utc::now(),
            );
        }
        _ => {}
    }
}

fn print_event(event: &Event) -> Result<(), CoreError> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn watch(db: &Database, engine: &mut SessionEngine) -> Result<(), CoreError> {
    let mut steps = 0u32;
    while engine.is_running() || engine.breath().is_active() {
        thread::sleep(Duration::from_millis(50));
        if let Some(event) = engine.breath_tick(BREATH_STEP_SECS) {
            print_event(&event)?;
        }
        steps += 1;
        if steps == STEPS_PER_SESSION_TICK {
            steps = 0;
            if let Some(event) = engine.tick() {
                persist_transition(db, engine, &event);
                print_event(&event)?;
            }
        }
    }

    // The loot notification is a display concern: keep it up briefly,
    // then clear it before handing the engine back.
    if engine.new_loot().is_some() {
        thread::sleep(LOOT_DISPLAY);
        engine.dismiss_loot();
    }
    save_engine(db, engine)
}

pub fn run(action: TimerAction) -> Result<(), CoreError> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut engine = load_engine(&db, &config);

    match action {
        TimerAction::Start => {
            match engine.start_focus() {
                Some(event) => print_event(&event)?,
                None => print_event(&engine.snapshot())?,
            }
            save_engine(&db, &engine)?;
        }
        TimerAction::Pause => {
            if let Some(event) = engine.pause_focus() {
                print_event(&event)?;
            }
            save_engine(&db, &engine)?;
        }
        TimerAction::Reset => {
            if let Some(event) = engine.reset_all() {
                print_event(&event)?;
            }
            save_engine(&db, &engine)?;
        }
        TimerAction::Status => {
            print_event(&engine.snapshot())?;
        }
        TimerAction::Dismiss => {
            engine.dismiss_loot();
            print_event(&engine.snapshot())?;
            save_engine(&db, &engine)?;
        }
        TimerAction::Watch => {
            watch(&db, &mut engine)?;
            print_event(&engine.snapshot())?;
        }
    }
    Ok(())
}
