//! Script Tests - Block Semantics Through the Play Runtime
//!
//! Control flow, loops, waits, events and object commands, exercised the
//! way the block editor's compiled scripts drive them.

use blockplay_engine::game::tasks::TaskTarget;
use blockplay_engine::game::{
    CompiledScript, GameEvent, PlayRuntime, PlaySettings, RawCommand, ScriptBundle,
};
use blockplay_engine::input::KeyCode;
use blockplay_engine::world::{MemoryScene, ObjectId, ObjectKind, Scene};
use glam::Vec3;
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

fn change_var(name: &str, amount: f64) -> RawCommand {
    RawCommand::new("changeVar").with("name", name).with("amount", amount)
}

fn block(code: &str, children: Vec<RawCommand>) -> RawCommand {
    RawCommand::new(code).with_children(children)
}

fn start_global(commands: Vec<RawCommand>, settings: PlaySettings) -> PlayRuntime<MemoryScene> {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(CompiledScript::new("onStart", commands));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(settings).expect("start");
    runtime
}

fn run(runtime: &mut PlayRuntime<MemoryScene>, frames: usize) {
    for _ in 0..frames {
        runtime.update();
    }
}

fn var(runtime: &PlayRuntime<MemoryScene>, name: &str) -> f64 {
    runtime.session().map_or(0.0, |s| s.game.var(name))
}

// ============================================================================
// Loops
// ============================================================================

#[test]
fn test_repeat_is_independent_of_time_scale() {
    for time_scale in [0.25, 1.0, 4.0] {
        let mut runtime = start_global(
            vec![block("repeat", vec![change_var("score", 1.0)]).with("times", 3)],
            PlaySettings { time_scale, ..PlaySettings::default() },
        );
        run(&mut runtime, 60);
        assert_eq!(var(&runtime, "score"), 3.0, "time scale {time_scale}");
    }
}

#[test]
fn test_forever_spin_keeps_one_task() {
    let mut scene = MemoryScene::new();
    let fan = scene.spawn("fan", ObjectKind::Box, Vec3::new(0.0, 2.0, -5.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        fan,
        CompiledScript::new(
            "onStart",
            vec![block(
                "forever",
                vec![RawCommand::new("spin").with("axis", "y").with("speed", 2.0)],
            )],
        ),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");
    run(&mut runtime, 60);

    let rotation = runtime.scene().object(fan).map_or(0.0, |o| o.transform.rotation.y);
    assert!((rotation - 2.0).abs() < 1e-2, "rotation was {rotation}");
    let tasks = runtime.session().map(|s| s.tasks.count_for(TaskTarget::Object(fan)));
    assert_eq!(tasks, Some(1));
}

#[test]
fn test_while_yields_between_iterations() {
    let mut runtime = start_global(
        vec![
            block("while", vec![change_var("count", 1.0)])
                .with("condition", "varLess")
                .with("name", "count")
                .with("value", 5.0),
        ],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "count"), 1.0);
    run(&mut runtime, 2);
    assert_eq!(var(&runtime, "count"), 3.0);
    run(&mut runtime, 10);
    assert_eq!(var(&runtime, "count"), 5.0);
}

#[test]
fn test_for_each_counts_inclusive_range() {
    let runtime = start_global(
        vec![
            block("forEach", vec![change_var("n", 1.0)])
                .with("var", "i")
                .with("start", 1)
                .with("end", 4),
        ],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "n"), 4.0);
    assert_eq!(var(&runtime, "i"), 4.0);
}

#[test]
fn test_huge_repeat_is_spread_over_frames() {
    let mut runtime = start_global(
        vec![block("repeat", vec![change_var("n", 1.0)]).with("times", 100_000)],
        PlaySettings::default(),
    );
    assert!(var(&runtime, "n") < 100_000.0);
    run(&mut runtime, 40);
    assert_eq!(var(&runtime, "n"), 100_000.0);
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_if_else_picks_branch() {
    let runtime = start_global(
        vec![
            RawCommand::new("setVar").with("name", "coins").with("value", 7.0),
            block("if", vec![change_var("rich", 1.0)])
                .with("condition", "varGreater")
                .with("name", "coins")
                .with("value", 5.0),
            block("ifElse", vec![change_var("then", 1.0)])
                .with("condition", json!({"type": "varEquals", "name": "coins", "value": 3}))
                .with_else(vec![change_var("else", 1.0)]),
        ],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "rich"), 1.0);
    assert_eq!(var(&runtime, "then"), 0.0);
    assert_eq!(var(&runtime, "else"), 1.0);
}

#[test]
fn test_unknown_condition_is_false() {
    let runtime = start_global(
        vec![block("if", vec![change_var("x", 1.0)]).with("condition", "moonIsFull")],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "x"), 0.0);
}

#[test]
fn test_local_variables_live_on_the_object() {
    let mut scene = MemoryScene::new();
    let chest = scene.spawn("chest", ObjectKind::Box, Vec3::new(3.0, 0.5, 0.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        chest,
        CompiledScript::new(
            "onStart",
            vec![
                RawCommand::new("setLocalVar").with("name", "locks").with("value", 3.0),
                RawCommand::new("changeLocalVar").with("name", "locks").with("amount", -1.0),
                block("if", vec![change_var("ok", 1.0)])
                    .with("condition", "localVarEquals")
                    .with("name", "locks")
                    .with("value", 2.0),
            ],
        ),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    assert_eq!(var(&runtime, "ok"), 1.0);
    assert_eq!(var(&runtime, "locks"), 0.0);
    let local = runtime.scene().object(chest).and_then(|o| o.locals.get("locks").copied());
    assert_eq!(local, Some(2.0));

    runtime.stop();
    assert!(runtime.scene().object(chest).is_some_and(|o| o.locals.is_empty()));
}

#[test]
fn test_random_condition_is_seeded() {
    let draws = |seed: u64| {
        let runtime = start_global(
            vec![block(
                "repeat",
                vec![block("if", vec![change_var("heads", 1.0)]).with("condition", "random")],
            )
            .with("times", 40)],
            PlaySettings { seed, ..PlaySettings::default() },
        );
        var(&runtime, "heads")
    };
    let first = draws(3);
    assert_eq!(first, draws(3));
    assert!((0.0..=40.0).contains(&first));
}

// ============================================================================
// Waits
// ============================================================================

#[test]
fn test_wait_until_polls_condition() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(CompiledScript::new(
        "onStart",
        vec![
            RawCommand::new("waitUntil")
                .with("condition", "varGreater")
                .with("name", "coins")
                .with("value", 2.0),
            change_var("unlocked", 1.0),
        ],
    ));
    bundle.add_global(
        CompiledScript::new("onKeyPress", vec![change_var("coins", 1.0)]).with_trigger_value("key", "c"),
    );
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    for _ in 0..2 {
        runtime.key_down(KeyCode::C);
        runtime.key_up(KeyCode::C);
    }
    run(&mut runtime, 20);
    assert_eq!(var(&runtime, "unlocked"), 0.0);

    runtime.key_down(KeyCode::C);
    run(&mut runtime, 8);
    assert_eq!(var(&runtime, "unlocked"), 1.0);
}

#[test]
fn test_glide_suspends_until_arrival() {
    let mut scene = MemoryScene::new();
    let cart = scene.spawn("cart", ObjectKind::Box, Vec3::new(0.0, 0.5, -6.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        cart,
        CompiledScript::new(
            "onStart",
            vec![
                RawCommand::new("glideTo")
                    .with("x", 4.0)
                    .with("y", 0.5)
                    .with("z", -6.0)
                    .with("duration", 0.5),
                change_var("arrived", 1.0),
            ],
        ),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 15);
    assert_eq!(var(&runtime, "arrived"), 0.0);
    let midway = runtime.scene().object(cart).map_or(0.0, |o| o.transform.position.x);
    assert!(midway > 0.0 && midway < 4.0);

    run(&mut runtime, 20);
    assert_eq!(var(&runtime, "arrived"), 1.0);
    let x = runtime.scene().object(cart).map_or(0.0, |o| o.transform.position.x);
    assert!((x - 4.0).abs() < 1e-3);
}

#[test]
fn test_say_shows_bubble_then_continues() {
    let mut runtime = start_global(
        vec![
            RawCommand::new("say").with("text", "Hello").with("duration", 0.5),
            change_var("said", 1.0),
        ],
        PlaySettings::default(),
    );
    let bubbles = runtime.presentation().map(|p| p.bubbles.len());
    assert_eq!(bubbles, Some(1));

    run(&mut runtime, 40);
    assert_eq!(var(&runtime, "said"), 1.0);
    assert_eq!(runtime.presentation().map(|p| p.bubbles.len()), Some(0));
}

#[test]
fn test_time_scale_command_is_clamped() {
    let runtime = start_global(
        vec![RawCommand::new("setTimeScale").with("scale", 100.0)],
        PlaySettings::default(),
    );
    assert_eq!(runtime.session().map(|s| s.time_scale), Some(10.0));
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_broadcast_runs_receivers_in_same_frame() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(CompiledScript::new(
        "onStart",
        vec![RawCommand::new("broadcast").with("message", "go")],
    ));
    bundle.add_global(
        CompiledScript::new("onMessage", vec![change_var("heard", 1.0)]).with_trigger_value("message", "go"),
    );
    bundle.add_global(
        CompiledScript::new("onMessage", vec![change_var("other", 1.0)]).with_trigger_value("message", "stop"),
    );
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    assert_eq!(var(&runtime, "heard"), 1.0);
    assert_eq!(var(&runtime, "other"), 0.0);
}

#[test]
fn test_timer_trigger_fires_each_interval() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(
        CompiledScript::new("onTimer", vec![change_var("beats", 1.0)]).with_trigger_value("interval", 0.5),
    );
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 110);
    assert_eq!(var(&runtime, "beats"), 3.0);
}

#[test]
fn test_host_event_targets_one_object() {
    let mut scene = MemoryScene::new();
    let a = scene.spawn("a", ObjectKind::Box, Vec3::new(5.0, 0.5, 0.0));
    let b = scene.spawn("b", ObjectKind::Box, Vec3::new(-5.0, 0.5, 0.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(a, CompiledScript::new("onClick", vec![change_var("a", 1.0)]));
    bundle.attach(b, CompiledScript::new("onClick", vec![change_var("b", 1.0)]));
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    assert_eq!(runtime.trigger_event(GameEvent::Click, Some(a)), 1);
    assert_eq!(var(&runtime, "a"), 1.0);
    assert_eq!(var(&runtime, "b"), 0.0);
    assert_eq!(runtime.trigger_event(GameEvent::Click, Some(ObjectId(77))), 0);
}

#[test]
fn test_any_key_trigger() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(CompiledScript::new("onKeyPress", vec![change_var("keys", 1.0)]));
    let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
    runtime.start(PlaySettings::default()).expect("start");

    runtime.key_down(KeyCode::Q);
    runtime.key_down(KeyCode::Digit3);
    assert_eq!(var(&runtime, "keys"), 2.0);
}

// ============================================================================
// Routine Control
// ============================================================================

#[test]
fn test_call_block_and_stop_script() {
    let mut bundle = ScriptBundle::new();
    bundle.add_global(
        CompiledScript::new("defineBlock", vec![change_var("calls", 1.0)]).with_trigger_value("name", "bump"),
    );
    bundle.add_global(CompiledScript::new(
        "onStart",
        vec![
            RawCommand::new("callBlock").with("name", "bump"),
            RawCommand::new("callBlock").with("name", "bump"),
            RawCommand::new("callBlock").with("name", "missing"),
            RawCommand::new("stopScript"),
            change_var("calls", 100.0),
        ],
    ));
    let runtime = {
        let mut runtime = PlayRuntime::new(MemoryScene::new(), bundle);
        runtime.start(PlaySettings::default()).expect("start");
        runtime
    };
    assert_eq!(var(&runtime, "calls"), 2.0);
}

#[test]
fn test_unknown_commands_are_skipped() {
    let runtime = start_global(
        vec![
            RawCommand::new("summonDragon").with("size", "huge"),
            change_var("after", 1.0),
        ],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "after"), 1.0);
}

#[test]
fn test_delete_self_ends_object_routines() {
    let mut scene = MemoryScene::new();
    let ghost = scene.spawn("ghost", ObjectKind::Box, Vec3::new(4.0, 0.5, 0.0));
    let mut bundle = ScriptBundle::new();
    bundle.attach(
        ghost,
        CompiledScript::new("onStart", vec![block("forever", vec![change_var("haunts", 1.0)])]),
    );
    bundle.attach(
        ghost,
        CompiledScript::new("onKeyPress", vec![RawCommand::new("deleteSelf")]).with_trigger_value("key", "x"),
    );
    let mut runtime = PlayRuntime::new(scene, bundle);
    runtime.start(PlaySettings::default()).expect("start");

    run(&mut runtime, 5);
    runtime.key_down(KeyCode::X);
    let before = var(&runtime, "haunts");
    run(&mut runtime, 10);
    assert_eq!(var(&runtime, "haunts"), before);
    assert!(runtime.scene().object(ghost).is_some_and(|o| !o.visible));
    assert_eq!(runtime.session().map(|s| s.routines.len()), Some(0));

    runtime.stop();
    assert!(runtime.scene().object(ghost).is_some_and(|o| o.visible));
}

// ============================================================================
// Out-of-range Numbers
// ============================================================================

#[test]
fn test_huge_integer_parameters_saturate() {
    let runtime = start_global(
        vec![
            block("forEach", vec![change_var("laps", 1.0)])
                .with("var", "i")
                .with("start", 1e30)
                .with("end", 1e30),
            RawCommand::new("setLives").with("amount", 2_147_483_647.0),
            RawCommand::new("changeLives").with("amount", 1),
            RawCommand::new("addItem").with("name", "gem").with("count", 4e9),
            RawCommand::new("addItem").with("name", "gem").with("count", 4e9),
            change_var("after", 1.0),
        ],
        PlaySettings::default(),
    );
    assert_eq!(var(&runtime, "laps"), 1.0);
    assert_eq!(var(&runtime, "i"), i32::MAX as f64);
    assert_eq!(var(&runtime, "after"), 1.0);
    let hud = runtime.hud().expect("running");
    assert_eq!(hud.lives, Some(i32::MAX));
    let gems = hud.inventory.iter().find(|(name, _)| name == "gem").map(|(_, count)| *count);
    assert_eq!(gems, Some(u32::MAX));
}
