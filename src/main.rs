//! Sprig - headless scene graph demo
//!
//! Builds a small scene with a camera, a light, a model on a turntable and an
//! optional looping sound attached to the model. The turntable is spun a few
//! times and the cached world, clip-space and bounds values are logged along
//! with the position the audio device was told about.

use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use sprig::config::AppConfig;
use sprig_core::audio::{AudioController, AudioSource, HeadlessDevice};
use sprig_core::{BoundingBox, Camera, Light, Model, NodeKey, SceneError, World};
use sprig_math::{mat4, Quat, Vec3};

/// Simulated seconds between demo steps
const STEP_SECONDS: f32 = 0.25;

fn main() {
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    if let Err(e) = &loaded {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting Sprig");

    if let Err(e) = run(&config) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<(), SceneError> {
    let mut world = World::new().with_default_bounds_type(config.scene.default_bounds_type);
    let scene = world.create_scene("demo");

    let camera_node = world.create_node("camera");
    let camera = Camera::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
    world.set_camera(camera_node, Some(Rc::new(camera)))?;
    world.set_translation(camera_node, Vec3::new(0.0, 2.0, 10.0))?;
    world.add_to_scene(scene, camera_node)?;
    world.set_active_camera(scene, Some(camera_node))?;

    let sun = world.create_node("sun");
    world.set_light(sun, Some(Rc::new(Light::directional(Vec3::ONE))))?;
    world.rotate(sun, Quat::from_axis_angle(Vec3::X, -FRAC_PI_2 * 0.5))?;
    world.add_to_scene(scene, sun)?;

    let turntable = world.create_node("turntable");
    let crate_node = world.create_node("crate");
    world.add_child(turntable, crate_node)?;
    world.set_translation(crate_node, Vec3::new(3.0, 0.0, 0.0))?;
    let crate_model = Model::new("crate", BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5)));
    world.set_model(crate_node, Some(Rc::new(crate_model)))?;
    world.add_to_scene(scene, turntable)?;

    let device = Rc::new(
        HeadlessDevice::new(config.audio.to_raw_format()).with_max_sources(config.audio.max_sources),
    );
    let controller = AudioController::new(device.clone()).with_default_gain(config.audio.default_gain);
    let source = config
        .audio
        .ambient_sound
        .as_ref()
        .and_then(|path| AudioSource::create(&controller, path));
    match &source {
        Some(source) => {
            world.set_audio_source(crate_node, Some(Rc::clone(source)))?;
            source.set_looped(true);
            source.play();
            log::info!("Playing {} on the crate", source.path().display());
        }
        None => log::info!("No ambient sound configured; running without audio"),
    }

    for step in 1..=4 {
        world.rotate(turntable, Quat::from_axis_angle(Vec3::Y, FRAC_PI_2))?;
        device.advance(STEP_SECONDS);
        report(&world, crate_node, step)?;
        if let Some(voice) = source.as_ref().and_then(|s| device.voice(s.handle())) {
            log::info!(
                "  audio: {:?} at ({:.2}, {:.2}, {:.2}), {} position update(s)",
                voice.state,
                voice.position.x,
                voice.position.y,
                voice.position.z,
                voice.position_updates
            );
        }
    }

    let stats = world.cache_stats();
    log::info!(
        "Cache recomputes: {} world, {} camera-dependent, {} bounds",
        stats.world_matrices,
        stats.camera_matrices,
        stats.bounds
    );
    Ok(())
}

fn report(world: &World, key: NodeKey, step: u32) -> Result<(), SceneError> {
    let node = world.node(key).ok_or(SceneError::InvalidNode(key))?;
    let position = node.world_translation();
    let clip = mat4::transform_point(node.world_view_projection_matrix(), Vec3::ZERO);
    let bounds = node.bounding_box();

    log::info!(
        "Step {}: '{}' at ({:.2}, {:.2}, {:.2}), clip ({:.2}, {:.2}, {:.2})",
        step,
        node.id(),
        position.x,
        position.y,
        position.z,
        clip.x,
        clip.y,
        clip.z
    );
    if bounds.is_empty() {
        log::debug!("  no bounding box maintained");
    } else {
        log::info!(
            "  bounds ({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
            bounds.min.x,
            bounds.min.y,
            bounds.min.z,
            bounds.max.x,
            bounds.max.y,
            bounds.max.z
        );
    }
    Ok(())
}
