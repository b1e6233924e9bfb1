//! Lowered operations and triggers
//!
//! Raw commands are lowered once, at session start, into a closed [`Op`]
//! enum with every parameter parsed and defaulted. Unknown codes lower to
//! [`Op::Unknown`], which executes as a no-op.

use std::rc::Rc;

use glam::Vec3;

use super::ast::{CompiledScript, ParamMap, RawCommand};
use super::condition::{Condition, KeyFilter};
use super::params::Params;
use crate::game::systems::combat_system::{PickupEffect, PickupKind};
use crate::game::tasks::particles::ParticleKind;
use crate::physics::Axis;
use crate::world::ObjectKind;

/// A lowered command block.
pub type Block = Rc<[Op]>;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const YELLOW: [f32; 3] = [1.0, 0.9, 0.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];

/// Object reference inside an operation, resolved when it executes.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetRef {
    /// The script's owner
    Owner,
    Player,
    /// First object with this name
    Named(String),
}

impl TargetRef {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | "self" | "this" | "me" => TargetRef::Owner,
            "player" => TargetRef::Player,
            name => TargetRef::Named(name.to_string()),
        }
    }
}

/// Direction a scripted projectile is fired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aim {
    /// Shooter's facing (the player's look direction for global scripts)
    Forward,
    AtPlayer,
}

/// One executable operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // === Motion ===
    MoveBy(Vec3),
    MoveTo(Vec3),
    MoveForward(f32),
    RotateBy { axis: Axis, radians: f32 },
    SetRotation(Vec3),
    SetScale(Vec3),
    ScaleBy(f32),
    GlideTo { target: Vec3, duration: f32 },
    LookAtPlayer,
    Launch { height: f32, distance: f32 },
    Fall,

    // === Animation ===
    Spin { axis: Axis, speed: f32 },
    Bounce { height: f32, speed: f32 },
    Hover { amplitude: f32, speed: f32 },
    Orbit { radius: f32, speed: f32 },
    Spiral { radius: f32, speed: f32, rise: f32 },
    Wander { radius: f32, speed: f32 },
    Patrol { axis: Axis, distance: f32, speed: f32 },
    Zigzag { width: f32, speed: f32 },
    ColorShift { speed: f32 },
    Pulse { min: f32, max: f32, speed: f32 },
    Trail { color: [f32; 3] },
    PlayAnimation { looped: bool },
    StopAnimations,

    // === Looks ===
    Show,
    Hide,
    SetColor([f32; 3]),
    SetOpacity(f32),
    Say { text: String, duration: f32 },
    FloatText { text: String, color: [f32; 3] },

    // === Effects ===
    Particles { kind: ParticleKind, color: [f32; 3] },
    ScreenTint { color: [f32; 3], opacity: f32, duration: f32 },
    FadeScreen { duration: f32 },
    Announce { text: String, duration: f32 },
    PlaySound(String),
    SetTimeScale(f32),

    // === Camera ===
    CameraSwitch(TargetRef),
    CameraSwitchBack,
    CameraLookAt(TargetRef),
    CameraMoveTo(Vec3),
    CameraGlideTo { target: Vec3, duration: f32 },
    CameraFollow { target: TargetRef, distance: f32 },
    CameraShake { intensity: f32, duration: f32 },
    CameraZoom { fov: f32, duration: f32 },
    CameraResetFov,

    // === Variables & HUD ===
    SetVar { name: String, value: f64 },
    ChangeVar { name: String, delta: f64 },
    SetLocalVar { name: String, value: f64 },
    ChangeLocalVar { name: String, delta: f64 },
    ShowVar(String),
    HideVar(String),

    // === Game state ===
    SetHealth(f32),
    ChangeHealth(f32),
    DamagePlayer(f32),
    HealPlayer(f32),
    SetMaxHealth(f32),
    SetLives(i32),
    ChangeLives(i32),
    StartTimer(f32),
    StopTimer,
    SetSpawnPoint,
    TeleportPlayer(Vec3),
    SetPlayerSpeed(f32),
    SetJumpForce(f32),
    Win,
    Lose,

    // === Objects ===
    SpawnObject { kind: ObjectKind, position: Vec3 },
    Clone,
    DeleteSelf,
    RemoveObject(TargetRef),

    // === Combat ===
    SetAsEnemy(f32),
    SetContactDamage(f32),
    FireProjectile { speed: f32, color: [f32; 3], aim: Aim },
    SetFireRate(f32),
    SetProjectileDamage(f32),
    SetProjectileSize(f32),
    SetProjectileLifetime(f32),
    EnemyShoot { range: f32, interval: f32, damage: f32 },
    SetAsPickup { kind: PickupKind, name: String, effect: PickupEffect, amount: f32 },
    AddItem { name: String, count: u32 },
    RemoveItem { name: String, count: u32 },

    // === Control ===
    Repeat { times: u32, body: Block },
    Forever(Block),
    If { condition: Rc<Condition>, then: Block },
    IfElse { condition: Rc<Condition>, then: Block, otherwise: Block },
    While { condition: Rc<Condition>, body: Block },
    ForEach { var: String, start: i64, end: i64, body: Block },
    Wait(f32),
    WaitUntil(Rc<Condition>),
    Broadcast(String),
    CallBlock(String),
    StopScript,

    // === UI ===
    Dialog(String),
    ShowScreen(String),
    HideScreen(String),

    /// Unrecognized code; executes as a no-op
    Unknown(String),
}

/// Lower a command list into a block.
pub fn lower_block(commands: &[RawCommand]) -> Block {
    commands.iter().map(lower_command).collect::<Vec<_>>().into()
}

/// Lower a single raw command.
pub fn lower_command(command: &RawCommand) -> Op {
    let p = Params(&command.values);
    let body = || lower_block(&command.children);
    let name = || p.text("name", "");
    let amount = |default: f32| p.num("amount", default);
    let xyz = |default: Vec3| p.vec3(["x", "y", "z"], default);

    match command.code.as_str() {
        // Motion
        "moveBy" => Op::MoveBy(xyz(Vec3::ZERO)),
        "moveTo" => Op::MoveTo(xyz(Vec3::ZERO)),
        "moveForward" => Op::MoveForward(p.num("distance", 1.0)),
        "rotateBy" => Op::RotateBy {
            axis: p.axis("axis"),
            radians: p.num("degrees", 90.0).to_radians(),
        },
        "setRotation" => Op::SetRotation(xyz(Vec3::ZERO) * std::f32::consts::PI / 180.0),
        "setScale" => Op::SetScale(xyz(Vec3::ONE)),
        "scaleBy" => Op::ScaleBy(p.num("factor", 1.0)),
        "glideTo" => Op::GlideTo {
            target: xyz(Vec3::ZERO),
            duration: p.num("duration", 1.0).max(0.0),
        },
        "lookAtPlayer" => Op::LookAtPlayer,
        "launch" => Op::Launch {
            height: p.num("height", 5.0),
            distance: p.num("distance", 5.0),
        },
        "fall" => Op::Fall,

        // Animation
        "spin" => Op::Spin { axis: p.axis("axis"), speed: p.num("speed", 1.0) },
        "bounce" => Op::Bounce { height: p.num("height", 1.0), speed: p.num("speed", 2.0) },
        "hover" => Op::Hover { amplitude: p.num("amplitude", 0.3), speed: p.num("speed", 2.0) },
        "orbit" => Op::Orbit { radius: p.num("radius", 3.0), speed: p.num("speed", 1.0) },
        "spiral" => Op::Spiral {
            radius: p.num("radius", 3.0),
            speed: p.num("speed", 1.0),
            rise: p.num("rise", 0.5),
        },
        "wander" => Op::Wander { radius: p.num("radius", 5.0), speed: p.num("speed", 2.0) },
        "patrol" => Op::Patrol {
            axis: match p.raw("axis") {
                Some(_) => p.axis("axis"),
                None => Axis::X,
            },
            distance: p.num("distance", 5.0),
            speed: p.num("speed", 1.0),
        },
        "zigzag" => Op::Zigzag { width: p.num("width", 2.0), speed: p.num("speed", 2.0) },
        "colorShift" => Op::ColorShift { speed: p.num("speed", 1.0) },
        "pulse" => Op::Pulse {
            min: p.num("min", 0.8),
            max: p.num("max", 1.2),
            speed: p.num("speed", 2.0),
        },
        "trail" => Op::Trail { color: p.color("color", WHITE) },
        "playAnimation" => Op::PlayAnimation { looped: p.flag("loop", false) },
        "stopAnimations" => Op::StopAnimations,

        // Looks
        "show" => Op::Show,
        "hide" => Op::Hide,
        "setColor" => Op::SetColor(p.color("color", WHITE)),
        "setOpacity" => Op::SetOpacity(p.num("opacity", 1.0).clamp(0.0, 1.0)),
        "say" => Op::Say {
            text: p.text("text", ""),
            duration: p.num("duration", 2.0).max(0.0),
        },
        "floatText" => Op::FloatText {
            text: p.text("text", ""),
            color: p.color("color", WHITE),
        },

        // Effects
        "particles" => Op::Particles {
            kind: ParticleKind::from_label(&p.text("kind", &p.text("type", "burst"))),
            color: p.color("color", YELLOW),
        },
        "screenTint" => Op::ScreenTint {
            color: p.color("color", RED),
            opacity: p.num("opacity", 0.4).clamp(0.0, 1.0),
            duration: p.num("duration", 0.5).max(0.0),
        },
        "fadeScreen" => Op::FadeScreen { duration: p.num("duration", 1.0).max(0.0) },
        "announce" => Op::Announce {
            text: p.text("text", ""),
            duration: p.num("duration", 2.0).max(0.0),
        },
        "playSound" => Op::PlaySound(p.text("sound", "pop")),
        "setTimeScale" => Op::SetTimeScale(p.num("scale", 1.0)),

        // Camera
        "cameraSwitch" => Op::CameraSwitch(TargetRef::from_label(&p.text("target", ""))),
        "cameraSwitchBack" => Op::CameraSwitchBack,
        "cameraLookAt" => Op::CameraLookAt(TargetRef::from_label(&p.text("target", "player"))),
        "cameraMoveTo" => Op::CameraMoveTo(xyz(Vec3::new(0.0, 5.0, 10.0))),
        "cameraGlideTo" => Op::CameraGlideTo {
            target: xyz(Vec3::new(0.0, 5.0, 10.0)),
            duration: p.num("duration", 1.0).max(0.0),
        },
        "cameraFollow" => Op::CameraFollow {
            target: TargetRef::from_label(&p.text("target", "")),
            distance: p.num("distance", 5.0),
        },
        "cameraShake" => Op::CameraShake {
            intensity: p.num("intensity", 0.3),
            duration: p.num("duration", 0.5).max(0.0),
        },
        "cameraZoom" => Op::CameraZoom {
            fov: p.num("fov", 50.0).clamp(10.0, 150.0),
            duration: p.num("duration", 0.5).max(0.0),
        },
        "cameraResetFov" => Op::CameraResetFov,

        // Variables & HUD
        "setVar" => Op::SetVar { name: name(), value: p.num_f64("value", 0.0) },
        "changeVar" => Op::ChangeVar { name: name(), delta: p.num_f64("amount", 1.0) },
        "setLocalVar" => Op::SetLocalVar { name: name(), value: p.num_f64("value", 0.0) },
        "changeLocalVar" => Op::ChangeLocalVar { name: name(), delta: p.num_f64("amount", 1.0) },
        "showVar" => Op::ShowVar(name()),
        "hideVar" => Op::HideVar(name()),

        // Game state
        "setHealth" => Op::SetHealth(amount(100.0)),
        "changeHealth" => Op::ChangeHealth(amount(-10.0)),
        "damagePlayer" => Op::DamagePlayer(amount(10.0)),
        "healPlayer" => Op::HealPlayer(amount(10.0)),
        "setMaxHealth" => Op::SetMaxHealth(amount(100.0)),
        "setLives" => Op::SetLives(p.int32("amount", 3)),
        "changeLives" => Op::ChangeLives(p.int32("amount", 1)),
        "startTimer" => Op::StartTimer(p.num("seconds", 60.0)),
        "stopTimer" => Op::StopTimer,
        "setSpawnPoint" => Op::SetSpawnPoint,
        "teleportPlayer" => Op::TeleportPlayer(xyz(Vec3::ZERO)),
        "setPlayerSpeed" => Op::SetPlayerSpeed(p.num("speed", 6.0).max(0.0)),
        "setJumpForce" => Op::SetJumpForce(p.num("force", 8.0).max(0.0)),
        "win" => Op::Win,
        "lose" => Op::Lose,

        // Objects
        "spawnObject" => Op::SpawnObject {
            kind: ObjectKind::from_label(&p.text("kind", "box")),
            position: xyz(Vec3::ZERO),
        },
        "clone" => Op::Clone,
        "deleteSelf" => Op::DeleteSelf,
        "removeObject" => Op::RemoveObject(TargetRef::from_label(&p.text("target", ""))),

        // Combat
        "setAsEnemy" => Op::SetAsEnemy(p.num("health", 100.0).max(1.0)),
        "setContactDamage" => Op::SetContactDamage(amount(10.0).max(0.0)),
        "fireProjectile" => Op::FireProjectile {
            speed: p.num("speed", crate::physics::ballistics::DEFAULT_PROJECTILE_SPEED),
            color: p.color("color", YELLOW),
            aim: match p.text("direction", "forward").as_str() {
                "atPlayer" | "player" => Aim::AtPlayer,
                _ => Aim::Forward,
            },
        },
        "setFireRate" => Op::SetFireRate(p.num("cooldown", 0.3).max(0.0)),
        "setProjectileDamage" => Op::SetProjectileDamage(p.num("damage", 10.0).max(0.0)),
        "setProjectileSize" => Op::SetProjectileSize(p.num("size", 0.2).max(0.01)),
        "setProjectileLifetime" => Op::SetProjectileLifetime(p.num("seconds", 3.0).max(0.0)),
        "enemyShoot" => Op::EnemyShoot {
            range: p.num("range", 15.0),
            interval: p.num("interval", 2.0).max(0.05),
            damage: p.num("damage", 10.0),
        },
        "setAsPickup" => Op::SetAsPickup {
            kind: PickupKind::from_label(&p.text("type", "item")),
            name: p.text("name", "item"),
            effect: PickupEffect::from_label(&p.text("effect", "none")),
            amount: amount(1.0),
        },
        "addItem" => Op::AddItem { name: name(), count: p.count("count", 1) },
        "removeItem" => Op::RemoveItem { name: name(), count: p.count("count", 1) },

        // Control
        "repeat" => Op::Repeat {
            times: p.count("times", 10),
            body: body(),
        },
        "forever" => Op::Forever(body()),
        "if" => Op::If {
            condition: Rc::new(Condition::lower(&command.values)),
            then: body(),
        },
        "ifElse" => Op::IfElse {
            condition: Rc::new(Condition::lower(&command.values)),
            then: body(),
            otherwise: lower_block(&command.else_children),
        },
        "while" => Op::While {
            condition: Rc::new(Condition::lower(&command.values)),
            body: body(),
        },
        "forEach" => Op::ForEach {
            var: p.text("var", "i"),
            start: p.int32("start", 1) as i64,
            end: p.int32("end", 10) as i64,
            body: body(),
        },
        "wait" => Op::Wait(p.num("seconds", p.num("duration", 1.0)).max(0.0)),
        "waitUntil" => Op::WaitUntil(Rc::new(Condition::lower(&command.values))),
        "broadcast" => Op::Broadcast(p.text("message", "")),
        "callBlock" => Op::CallBlock(name()),
        "stopScript" => Op::StopScript,

        // UI
        "dialog" => Op::Dialog(p.text("text", "")),
        "showScreen" => Op::ShowScreen(name()),
        "hideScreen" => Op::HideScreen(name()),

        other => Op::Unknown(other.to_string()),
    }
}

/// Collision source filter of an `onCollide` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollideFilter {
    /// Player or projectile contact
    Any,
    Player,
    Projectile,
    /// Overlap with an object of this name
    Named(String),
}

/// Lowered script trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Start,
    KeyPress(KeyFilter),
    Click,
    Collide(CollideFilter),
    Message(String),
    Timer { interval: f32 },
    HealthZero,
    LivesZero,
    TimerEnd,
    EnemyDefeated,
    /// `None` matches any item
    ItemCollected(Option<String>),
    /// Custom block definition; never fires on its own
    Definition(String),
    Unknown(String),
}

impl Trigger {
    pub fn lower(trigger: &str, values: &ParamMap) -> Self {
        let p = Params(values);
        match trigger {
            "onStart" => Trigger::Start,
            "onKeyPress" => Trigger::KeyPress(KeyFilter::from_label(&p.text("key", "any"))),
            "onClick" => Trigger::Click,
            "onCollide" => Trigger::Collide(match p.text("target", "any").as_str() {
                "any" | "" => CollideFilter::Any,
                "player" => CollideFilter::Player,
                "projectile" => CollideFilter::Projectile,
                name => CollideFilter::Named(name.to_string()),
            }),
            "onMessage" => Trigger::Message(p.text("message", "")),
            "onTimer" => Trigger::Timer {
                interval: p.num("interval", 1.0).max(0.05),
            },
            "onHealthZero" => Trigger::HealthZero,
            "onLivesZero" => Trigger::LivesZero,
            "onTimerEnd" => Trigger::TimerEnd,
            "onEnemyDefeated" => Trigger::EnemyDefeated,
            "onItemCollected" => Trigger::ItemCollected(
                Some(p.text("item", "any")).filter(|item| item != "any" && !item.is_empty()),
            ),
            "defineBlock" => Trigger::Definition(p.text("name", "")),
            other => Trigger::Unknown(other.to_string()),
        }
    }
}

/// A script ready to run: lowered trigger and body.
#[derive(Debug, Clone)]
pub struct LoweredScript {
    pub trigger: Trigger,
    pub body: Block,
}

impl LoweredScript {
    pub fn lower(script: &CompiledScript) -> Self {
        Self {
            trigger: Trigger::lower(&script.trigger, &script.trigger_values),
            body: lower_block(&script.commands),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code_lowers_to_unknown() {
        let op = lower_command(&RawCommand::new("summonDragon"));
        assert_eq!(op, Op::Unknown("summonDragon".into()));
    }

    #[test]
    fn test_nested_blocks_lower() {
        let raw = RawCommand::new("ifElse")
            .with("condition", "isVisible")
            .with_children(vec![RawCommand::new("hide")])
            .with_else(vec![RawCommand::new("show"), RawCommand::new("show")]);
        match lower_command(&raw) {
            Op::IfElse { then, otherwise, .. } => {
                assert_eq!(then.len(), 1);
                assert_eq!(otherwise.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rotate_by_uses_degrees() {
        let op = lower_command(&RawCommand::new("rotateBy").with("axis", "x").with("degrees", 180));
        match op {
            Op::RotateBy { axis, radians } => {
                assert_eq!(axis, Axis::X);
                assert!((radians - std::f32::consts::PI).abs() < 1e-6);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_repeat_count_uses_default() {
        let op = lower_command(&RawCommand::new("repeat").with("times", "many"));
        assert!(matches!(op, Op::Repeat { times: 10, .. }));
    }

    #[test]
    fn test_triggers() {
        let mut values = ParamMap::new();
        values.insert("target".into(), "Door".into());
        assert_eq!(
            Trigger::lower("onCollide", &values),
            Trigger::Collide(CollideFilter::Named("Door".into()))
        );
        assert_eq!(Trigger::lower("onItemCollected", &ParamMap::new()), Trigger::ItemCollected(None));
        assert!(matches!(Trigger::lower("onWhatever", &ParamMap::new()), Trigger::Unknown(_)));
    }
}
