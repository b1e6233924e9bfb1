//! Runtime Tests - Session Boundaries, Combat and Game State
//!
//! Drives a `PlayRuntime` over a `MemoryScene` through whole play sessions:
//! start/stop, determinism, health and lives, projectiles, pickups, contact
//! damage, dialogs and end states.

use blockplay_engine::game::ui::UiElement;
use blockplay_engine::game::{
    CompiledScript, Outcome, PlayRuntime, PlaySettings, RawCommand, RuntimeError, ScriptBundle,
    UiScreenDef,
};
use blockplay_engine::input::KeyCode;
use blockplay_engine::player::ControlScheme;
use blockplay_engine::world::{MemoryScene, ObjectId, ObjectKind, Scene};
use glam::Vec3;

// ============================================================================
// Helpers
// ============================================================================

fn change_var(name: &str, amount: f64) -> RawCommand {
    RawCommand::new("changeVar").with("name", name).with("amount", amount)
}

fn on(trigger: &str, commands: Vec<RawCommand>) -> CompiledScript {
    CompiledScript::new(trigger, commands)
}

fn on_key(key: &str, commands: Vec<RawCommand>) -> CompiledScript {
    CompiledScript::new("onKeyPress", commands).with_trigger_value("key", key)
}

fn run(runtime: &mut PlayRuntime<MemoryScene>, frames: usize) {
    for _ in 0..frames {
        runtime.update();
    }
}

fn press(runtime: &mut PlayRuntime<MemoryScene>, key: KeyCode) {
    runtime.key_down(key);
    runtime.key_up(key);
}

fn var(runtime: &PlayRuntime<MemoryScene>, name: &str) -> f64 {
    runtime.session().map_or(0.0, |s| s.game.var(name))
}

// ============================================================================
// Session Boundaries
// ============================================================================

#[test]
fn test_missing_script_owner_fails_start() {
    let mut bundle = ScriptBundle::new();
    bundle.attach(ObjectId(99), on("onStart", vec![change_var("x", 1.0)]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);

    let result = runtime.start(PlaySettings::default());
    assert_eq!(result, Err(RuntimeError::MissingObject(ObjectId(99))));
    assert!(!runtime.is_running());
}

#[test]
fn test_stop_restores_scene_and_is_idempotent() {
    let mut scene = MemoryScene::new();
    let mover = scene.spawn("mover", ObjectKind::Box, Vec3::new(0.0, 0.5, -4.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        mover,
        on(
            "onStart",
            vec![
                RawCommand::new("moveBy").with("x", 5.0),
                RawCommand::new("setColor").with("color", "#ff0000"),
                RawCommand::new("spawnObject").with("kind", "sphere").with("x", 2.0),
                RawCommand::new("clone"),
            ],
        ),
    );
    let original = scene.object(mover).cloned();
    let mut runtime = PlayRuntime::new(scene, bundle);

    runtime.start(PlaySettings::default()).expect("start");
    run(&mut runtime, 10);
    assert_eq!(runtime.scene().len(), 3);
    assert!((runtime.scene().object(mover).map_or(0.0, |o| o.transform.position.x) - 5.0).abs() < 1e-5);

    runtime.stop();
    assert!(!runtime.is_running());
    assert_eq!(runtime.scene().len(), 1);
    assert_eq!(runtime.scene().object(mover).cloned(), original);

    runtime.stop();
    runtime.update();
    assert_eq!(runtime.scene().len(), 1);
}

#[test]
fn test_restart_does_not_duplicate_session_state() {
    let mut scene = MemoryScene::new();
    let fan = scene.spawn("fan", ObjectKind::Box, Vec3::new(0.0, 3.0, -5.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        fan,
        on(
            "onStart",
            vec![RawCommand::new("forever").with_children(vec![
                RawCommand::new("spin").with("axis", "y").with("speed", 1.0),
            ])],
        ),
    );
    bundle.add_global(
        CompiledScript::new("onTimer", vec![change_var("ticks", 1.0)]).with_trigger_value("interval", 1.0),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);

    runtime.start(PlaySettings::default()).expect("start");
    run(&mut runtime, 30);
    assert!(runtime.fire());

    runtime.start(PlaySettings::default()).expect("restart");
    let session = runtime.session().expect("running");
    assert_eq!(session.projectiles.active_count(), 0);
    assert_eq!(session.routines.len(), 1);

    run(&mut runtime, 90);
    assert_eq!(var(&runtime, "ticks"), 1.0);
    assert_eq!(runtime.task_count(), 1);
}

// ============================================================================
// Determinism
// ============================================================================

fn simulate(seed: u64) -> (Vec3, bool, Vec3) {
    let mut scene = MemoryScene::new();
    let ledge = scene.spawn("ledge", ObjectKind::Box, Vec3::new(0.0, 0.25, -4.0));
    if let Some(object) = scene.object_mut(ledge) {
        object.transform.scale = Vec3::new(4.0, 0.5, 2.0);
    }
    let critter = scene.spawn("critter", ObjectKind::Npc, Vec3::new(5.0, 0.5, 0.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(critter, on("onStart", vec![RawCommand::new("wander").with("radius", 3.0)]));

    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime
        .start(PlaySettings { seed, ..PlaySettings::default() })
        .expect("start");

    for frame in 0..180 {
        match frame {
            0 => runtime.key_down(KeyCode::W),
            30 => runtime.key_down(KeyCode::Space),
            31 => runtime.key_up(KeyCode::Space),
            45 => runtime.mouse_motion(40.0, -10.0),
            120 => runtime.key_up(KeyCode::W),
            _ => {}
        }
        runtime.update();
    }

    let player = runtime.player().expect("running");
    let critter_at = runtime.scene().object(critter).map(|o| o.transform.position).unwrap_or_default();
    (player.position, player.is_grounded, critter_at)
}

#[test]
fn test_same_inputs_give_identical_runs() {
    let first = simulate(7);
    let second = simulate(7);
    assert_eq!(first, second);
    // The player actually went somewhere
    assert!(first.0.length() > 1.0);
}

// ============================================================================
// Health and Lives
// ============================================================================

fn health_bundle() -> ScriptBundle {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on("onHealthZero", vec![change_var("deaths", 1.0)]));
    bundle.add_global(on_key("k", vec![RawCommand::new("setHealth").with("amount", 0.0)]));
    bundle.add_global(on_key("h", vec![RawCommand::new("setHealth").with("amount", 50.0)]));
    bundle
}

#[test]
fn test_health_zero_is_edge_triggered() {
    let mut runtime = PlayRuntime::new(MemoryScene::new(), health_bundle());
    runtime.start(PlaySettings::default()).expect("start");

    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 5);
    assert_eq!(var(&runtime, "deaths"), 1.0);

    // Still at zero: no new crossing
    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 5);
    assert_eq!(var(&runtime, "deaths"), 1.0);

    press(&mut runtime, KeyCode::H);
    run(&mut runtime, 1);
    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 1);
    assert_eq!(var(&runtime, "deaths"), 2.0);
    // Handled, so the game goes on
    assert_eq!(runtime.outcome(), None);
}

#[test]
fn test_unhandled_health_zero_loses_and_halts() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on("onStart", vec![RawCommand::new("setHealth").with("amount", 0.0)]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 1);
    assert_eq!(runtime.outcome(), Some(Outcome::Lost));
    let frozen = runtime.time();
    run(&mut runtime, 10);
    assert_eq!(runtime.time(), frozen);

    let end = runtime.presentation().and_then(|p| p.end_screen);
    assert_eq!(end.map(|e| e.outcome), Some(Outcome::Lost));
    assert!(runtime.take_sounds().iter().any(|s| s == "lose"));
}

#[test]
fn test_lives_respawn_then_lose() {
    let mut scene = MemoryScene::new();
    scene.spawn("start", ObjectKind::Spawn, Vec3::new(2.0, 0.0, 2.0));
    let mut runtime = PlayRuntime::new(scene, health_bundle());
    runtime
        .start(PlaySettings { lives: Some(2), ..PlaySettings::default() })
        .expect("start");

    runtime.key_down(KeyCode::W);
    run(&mut runtime, 20);
    runtime.key_up(KeyCode::W);

    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 1);
    let hud = runtime.hud().expect("running");
    assert_eq!(hud.lives, Some(1));
    assert_eq!(hud.health, hud.max_health);
    let player = runtime.player().expect("running");
    assert!((player.position - Vec3::new(2.0, 0.0, 2.0)).length() < 1e-3);
    assert_eq!(runtime.outcome(), None);

    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 2);
    assert_eq!(runtime.hud().and_then(|h| h.lives), Some(0));
    assert_eq!(runtime.outcome(), Some(Outcome::Lost));
}

#[test]
fn test_contact_damage_respects_invincibility() {
    let mut scene = MemoryScene::new();
    let spikes = scene.spawn("spikes", ObjectKind::Box, Vec3::new(0.0, 0.5, 0.0));
    if let Some(object) = scene.object_mut(spikes) {
        object.collidable = false;
    }
    let mut bundle = ScriptBundle::new();
    bundle.attach(spikes, on("onStart", vec![RawCommand::new("setContactDamage").with("amount", 10.0)]));
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 30);
    assert_eq!(runtime.hud().map(|h| h.health), Some(90.0));
    run(&mut runtime, 40);
    assert_eq!(runtime.hud().map(|h| h.health), Some(80.0));
}

#[test]
fn test_repeated_deaths_each_cost_a_life() {
    let mut runtime = PlayRuntime::new(MemoryScene::new(), health_bundle());
    runtime
        .start(PlaySettings { lives: Some(3), ..PlaySettings::default() })
        .expect("start");

    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 1);
    // Dropped again before any frame sees the restored health
    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 1);

    assert_eq!(runtime.hud().and_then(|h| h.lives), Some(1));
    assert_eq!(var(&runtime, "deaths"), 2.0);
    assert_eq!(runtime.outcome(), None);
}

#[test]
fn test_handled_lives_zero_keeps_playing() {
    let mut bundle = health_bundle();
    bundle.add_global(on("onLivesZero", vec![change_var("game_overs", 1.0)]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime
        .start(PlaySettings { lives: Some(2), ..PlaySettings::default() })
        .expect("start");

    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 1);
    press(&mut runtime, KeyCode::K);
    run(&mut runtime, 3);

    assert_eq!(runtime.hud().and_then(|h| h.lives), Some(0));
    assert_eq!(var(&runtime, "game_overs"), 1.0);
    assert_eq!(runtime.outcome(), None);
    assert!(runtime.is_running());

    run(&mut runtime, 30);
    assert_eq!(var(&runtime, "game_overs"), 1.0);
}

#[test]
fn test_countdown_fires_timer_end_once() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on("onStart", vec![RawCommand::new("startTimer").with("seconds", 0.5)]));
    bundle.add_global(on("onTimerEnd", vec![change_var("rang", 1.0)]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 25);
    assert_eq!(var(&runtime, "rang"), 0.0);
    run(&mut runtime, 10);
    assert_eq!(var(&runtime, "rang"), 1.0);
    run(&mut runtime, 60);
    assert_eq!(var(&runtime, "rang"), 1.0);
    assert_eq!(runtime.outcome(), None);
}

// ============================================================================
// Projectiles
// ============================================================================

fn enemy_scene(health: f64) -> (MemoryScene, ScriptBundle, ObjectId) {
    let mut scene = MemoryScene::new();
    let enemy = scene.spawn("enemy", ObjectKind::Npc, Vec3::new(0.0, 1.0, -10.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(enemy, on("onStart", vec![RawCommand::new("setAsEnemy").with("health", health)]));
    bundle.attach(
        enemy,
        CompiledScript::new("onCollide", vec![change_var("hits", 1.0)]).with_trigger_value("target", "projectile"),
    );
    bundle.add_global(on("onEnemyDefeated", vec![change_var("defeated", 1.0)]));
    (scene, bundle, enemy)
}

fn shooter_settings() -> PlaySettings {
    let mut settings = PlaySettings::default();
    settings.tuning.eye_height = 1.0;
    settings
}

#[test]
fn test_fire_rate_allows_one_shot_per_cooldown() {
    let mut runtime = PlayRuntime::new(MemoryScene::new(), ScriptBundle::new());
    runtime.start(PlaySettings::default()).expect("start");

    assert!(runtime.fire());
    assert!(!runtime.fire());
    run(&mut runtime, 10);
    assert!(!runtime.fire());
    assert_eq!(runtime.session().map(|s| s.projectiles.active_count()), Some(1));

    run(&mut runtime, 10);
    assert!(runtime.fire());
    assert_eq!(runtime.session().map(|s| s.projectiles.active_count()), Some(2));
    let shots = runtime.projectiles();
    assert_eq!(shots.len(), 2);
    // Older shot is further down the facing direction
    assert!(shots.iter().all(|p| p.velocity.z < 0.0));
    assert!(shots[0].position.z < shots[1].position.z);
    assert_eq!(runtime.take_sounds().iter().filter(|s| *s == "shoot").count(), 2);
}

#[test]
fn test_projectile_damages_enemy_once() {
    let (scene, bundle, enemy) = enemy_scene(100.0);
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(shooter_settings()).expect("start");

    assert!(runtime.fire());
    run(&mut runtime, 60);

    let session = runtime.session().expect("running");
    assert_eq!(session.combat.enemy_health(enemy), Some(90.0));
    assert_eq!(session.projectiles.active_count(), 0);
    assert_eq!(var(&runtime, "hits"), 1.0);
    assert_eq!(var(&runtime, "defeated"), 0.0);

    let bars = runtime.hud().map(|h| h.health_bars).unwrap_or_default();
    assert_eq!(bars.len(), 1);
    assert!((bars[0].fraction - 0.9).abs() < 1e-5);
}

#[test]
fn test_defeated_enemy_is_hidden() {
    let (scene, bundle, enemy) = enemy_scene(10.0);
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(shooter_settings()).expect("start");

    runtime.fire();
    run(&mut runtime, 60);

    assert_eq!(var(&runtime, "defeated"), 1.0);
    let object = runtime.scene().object(enemy).expect("still in scene");
    assert!(!object.visible);
    assert!(!object.collidable);
    assert!(runtime.hud().is_some_and(|h| h.health_bars.is_empty()));
    let sounds = runtime.take_sounds();
    assert!(sounds.iter().any(|s| s == "defeat"));
    assert!(!runtime.particle_instances().is_empty());
}

#[test]
fn test_ranged_enemy_hits_player() {
    let mut scene = MemoryScene::new();
    let turret = scene.spawn("turret", ObjectKind::Box, Vec3::new(0.0, 0.9, -8.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        turret,
        on(
            "onStart",
            vec![RawCommand::new("enemyShoot").with("range", 20.0).with("interval", 5.0).with("damage", 15.0)],
        ),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 60);
    assert_eq!(runtime.hud().map(|h| h.health), Some(85.0));
}

// ============================================================================
// Pickups and Contacts
// ============================================================================

#[test]
fn test_walking_over_pickup_collects_it_once() {
    let mut scene = MemoryScene::new();
    let coin = scene.spawn("gold", ObjectKind::Coin, Vec3::new(0.0, 0.5, -3.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        coin,
        on(
            "onStart",
            vec![
                RawCommand::new("setAsPickup")
                    .with("type", "coin")
                    .with("name", "gold")
                    .with("effect", "score")
                    .with("amount", 5.0),
            ],
        ),
    );
    bundle.add_global(
        CompiledScript::new("onItemCollected", vec![change_var("got", 1.0)]).with_trigger_value("item", "gold"),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    runtime.key_down(KeyCode::W);
    run(&mut runtime, 60);

    let hud = runtime.hud().expect("running");
    assert_eq!(hud.score, 5.0);
    assert_eq!(hud.inventory, vec![("gold".to_string(), 1)]);
    assert_eq!(var(&runtime, "got"), 1.0);
    assert!(runtime.scene().object(coin).is_some_and(|o| !o.visible));
}

#[test]
fn test_touching_fires_collide_on_enter_only() {
    let mut scene = MemoryScene::new();
    let wall = scene.spawn("wall", ObjectKind::Box, Vec3::new(0.0, 0.5, -2.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        wall,
        CompiledScript::new("onCollide", vec![change_var("bumps", 1.0)]).with_trigger_value("target", "player"),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    runtime.key_down(KeyCode::W);
    run(&mut runtime, 90);
    assert_eq!(var(&runtime, "bumps"), 1.0);
    // Pushed out in front of the wall
    let z = runtime.player().map_or(0.0, |p| p.position.z);
    assert!((z - (-1.5 + 0.4)).abs() < 1e-3);
}

// ============================================================================
// Dialogs, Time Scale and End States
// ============================================================================

#[test]
fn test_dialog_suspends_until_acknowledged() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on(
        "onStart",
        vec![RawCommand::new("dialog").with("text", "Welcome!"), change_var("after", 1.0)],
    ));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 30);
    assert_eq!(var(&runtime, "after"), 0.0);
    let text = runtime
        .presentation()
        .and_then(|p| p.current_dialog())
        .map(|d| d.text.clone());
    assert_eq!(text.as_deref(), Some("Welcome!"));

    assert!(runtime.acknowledge_dialog());
    assert!(!runtime.acknowledge_dialog());
    run(&mut runtime, 1);
    assert_eq!(var(&runtime, "after"), 1.0);
}

#[test]
fn test_time_scale_stretches_waits() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on(
        "onStart",
        vec![RawCommand::new("wait").with("seconds", 1.0), change_var("done", 1.0)],
    ));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime
        .start(PlaySettings { time_scale: 2.0, ..PlaySettings::default() })
        .expect("start");

    run(&mut runtime, 28);
    assert_eq!(var(&runtime, "done"), 0.0);
    run(&mut runtime, 4);
    assert_eq!(var(&runtime, "done"), 1.0);
}

#[test]
fn test_win_shows_end_screen_with_score() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(on_key("p", vec![change_var("score", 12.0), RawCommand::new("win")]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    press(&mut runtime, KeyCode::P);
    assert_eq!(runtime.outcome(), Some(Outcome::Won));
    let end = runtime.presentation().and_then(|p| p.end_screen).expect("end screen");
    assert_eq!(end.score, 12.0);

    // Input is ignored once the game is over
    assert!(!runtime.fire());
    runtime.stop();
    assert_eq!(runtime.outcome(), None);
}

#[test]
fn test_point_click_walks_to_clicked_ground() {
    let mut runtime = PlayRuntime::new(MemoryScene::new(), ScriptBundle::new());
    runtime
        .start(PlaySettings { scheme: ControlScheme::PointClick, ..PlaySettings::default() })
        .expect("start");
    run(&mut runtime, 1);

    // The isometric camera looks at the player, so a slightly off-center
    // click lands on the ground nearby
    runtime.click(0.6, 0.5);
    let target = runtime.player().and_then(|p| p.move_target).expect("walk target");
    assert!(target.y.abs() < 1e-3);
    assert!(target.length() > 0.5);

    run(&mut runtime, 240);
    let player = runtime.player().expect("running");
    assert!(player.move_target.is_none());
    let flat = Vec3::new(player.position.x - target.x, 0.0, player.position.z - target.z);
    assert!(flat.length() < 0.2);
}

// ============================================================================
// UI Screens
// ============================================================================

#[test]
fn test_screen_button_broadcasts_message() {
    let mut bundle = ScriptBundle::new();
    bundle.screens.push(UiScreenDef {
        name: "menu".into(),
        elements: vec![
            UiElement::Text { text: "Ready?".into() },
            UiElement::Button { label: "Play".into(), message: "play".into() },
        ],
    });
    bundle.add_global(on("onStart", vec![RawCommand::new("showScreen").with("name", "menu")]));
    bundle.add_global(
        CompiledScript::new(
            "onMessage",
            vec![change_var("played", 1.0), RawCommand::new("hideScreen").with("name", "menu")],
        )
        .with_trigger_value("message", "play"),
    );
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    assert_eq!(runtime.visible_screens().len(), 1);
    assert!(!runtime.press_ui_button("menu", 1));
    assert!(runtime.press_ui_button("menu", 0));
    assert_eq!(var(&runtime, "played"), 1.0);
    assert!(runtime.visible_screens().is_empty());

    // Hidden screens ignore presses
    assert!(!runtime.press_ui_button("menu", 0));
    assert_eq!(var(&runtime, "played"), 1.0);
}
