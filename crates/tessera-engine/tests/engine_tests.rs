//! Frame loop and snapshot behaviour through the public API.

use std::sync::OnceLock;

use proptest::prelude::*;
use serde_json::json;
use tessera_engine::prelude::*;

// -- test components ------------------------------------------------------------

/// Moves its entity along x every frame.
#[derive(Debug, Default)]
struct Drift {
    speed: f32,
}

tessera_meta::reflect_class!(Drift as "Drift" { speed => "Speed" });

impl Component for Drift {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, delta_time: f32) {
        if let Some(transform) = ctx.sibling_mut::<Transform>() {
            transform.position.x += self.speed * delta_time;
        }
    }
}

/// Destroys its owner after a fixed number of frames.
#[derive(Debug, Default)]
struct Fuse {
    frames: i32,
}

tessera_meta::reflect_class!(Fuse as "Fuse" { frames => "Frames" });

impl Component for Fuse {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        self.frames -= 1;
        if self.frames <= 0 {
            let owner = ctx.owner();
            ctx.destroy(owner);
        }
    }
}

fn installed() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        tessera_engine::install_reflection(|registry| {
            registry.register::<Drift>().register::<Fuse>();
        })
        .expect("registry installed once per test binary");
    });
}

fn frame_loop(speeds: &[f32], fuse: i32) -> FrameLoop {
    installed();
    let mut world = World::new();
    world.register_component::<Drift>();
    world.register_component::<Fuse>();
    world.initialize(speeds.len() + 1);
    for (i, speed) in speeds.iter().enumerate() {
        let template = EntityTemplate::new().with_component("Drift", json!({ "Speed": speed }));
        world.create_from_template(&template, format!("drifter{i}"));
    }
    let doomed = EntityTemplate::new().with_component("Fuse", json!({ "Frames": fuse }));
    world.create_from_template(&doomed, "doomed");
    FrameLoop::new(
        world,
        FrameConfig {
            headless: true,
            ..Default::default()
        },
    )
}

fn x_of(frame_loop: &FrameLoop, name: &str) -> Option<f32> {
    frame_loop
        .world()
        .find(name)
        .get(frame_loop.world())
        .and_then(|entity| entity.component::<Transform>())
        .map(|transform| transform.position.x)
}

// -- scenarios ------------------------------------------------------------------

#[test]
fn template_components_run_every_frame() {
    let mut driver = frame_loop(&[60.0], 3);
    driver.run_frames(60);
    let x = x_of(&driver, "drifter0").unwrap();
    assert!((x - 60.0).abs() < 1e-2, "x = {x}");
}

#[test]
fn self_destroying_entity_leaves_after_its_frame() {
    let mut driver = frame_loop(&[], 2);
    driver.tick();
    assert_ne!(driver.world().find("doomed"), Handle::NULL);
    driver.tick();
    assert_eq!(driver.world().find("doomed"), Handle::NULL);
    assert_eq!(driver.last_diagnostics().entity_count, 0);
}

#[test]
fn scene_file_round_trip_reproduces_state() {
    let mut source = frame_loop(&[1.0, 2.0], 100);
    source.run_frames(30);
    let dir = std::env::temp_dir().join(format!("tessera-engine-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scene.json");
    source.save_scene_file(&path).unwrap();

    let mut target = frame_loop(&[0.0, 0.0], 100);
    for handle in target.world().live_handles() {
        target.world_mut().destroy(handle);
    }
    let handles = target.load_scene_file(&path).unwrap();
    assert_eq!(handles.len(), 3);
    assert!(handles.iter().all(|handle| !handle.is_null()));
    assert_eq!(x_of(&target, "drifter1"), x_of(&source, "drifter1"));
    assert_eq!(target.state_hash().len(), 64);
}

#[test]
fn restore_then_replay_matches_uninterrupted_run() {
    let mut interrupted = frame_loop(&[3.0, -1.5], 10);
    let mut straight = frame_loop(&[3.0, -1.5], 10);

    interrupted.run_frames(5);
    let snapshot = interrupted.capture_snapshot();
    interrupted.run_frames(7);
    interrupted.restore_from_snapshot(&snapshot).unwrap();
    interrupted.run_frames(15);

    straight.run_frames(20);
    assert_eq!(interrupted.frame_count(), straight.frame_count());
    assert_eq!(x_of(&interrupted, "drifter0"), x_of(&straight, "drifter0"));
    assert_eq!(x_of(&interrupted, "drifter1"), x_of(&straight, "drifter1"));
}

// -- property tests ---------------------------------------------------------------

proptest! {
    #[test]
    fn identical_inputs_hash_identically(
        speeds in proptest::collection::vec(-50.0f32..50.0, 0..6),
        fuse in 1i32..20,
        frames in 0u64..40,
    ) {
        let mut first = frame_loop(&speeds, fuse);
        let mut second = frame_loop(&speeds, fuse);
        first.run_frames(frames);
        second.run_frames(frames);
        prop_assert_eq!(first.state_hash(), second.state_hash());
        prop_assert_eq!(first.world().entity_count(), second.world().entity_count());
    }
}
