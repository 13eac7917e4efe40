use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;
use kestrel_script_host::cli::CliOverrides;
use kestrel_script_host::config::DemoConfig;
use kestrel_script_host::transform::{SceneObject, Transform3D};
use kestrel_script_host::ScriptHost;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let mut config = DemoConfig::load_or_default(cli.config_path());
    let overrides = cli.into_demo_overrides();
    if !overrides.is_empty() {
        info!(?overrides, "applying command-line overrides");
        config.apply_overrides(&overrides);
    }

    let object = SceneObject::shared(
        config.object_name.clone(),
        Transform3D::from_euler_degrees(Vec3::from_array(config.initial_rotation)),
    );
    let mut host = ScriptHost::new(config.host.clone());
    host.set_target(Some(&object));
    let source = config.host.source();
    host.start(source.as_ref());

    let frame_interval = Duration::from_secs_f32(1.0 / config.frame_rate.max(1.0));
    let dt = frame_interval.as_secs_f32();
    let started = Instant::now();
    let mut diagnostics = 0usize;
    for frame in 1..=config.frames {
        thread::sleep(frame_interval);
        host.tick(dt);
        // Each entry was already logged when reported.
        diagnostics += host.take_diagnostics().len();
        tracing::debug!(frame, euler = ?object.borrow().transform.euler_degrees(), "frame");
    }

    let object = object.borrow();
    info!(
        object = %object.name,
        frames = config.frames,
        elapsed = started.elapsed().as_secs_f32(),
        state = ?host.state(),
        euler = ?object.transform.euler_degrees(),
        rotation = ?object.transform.rotation(),
        diagnostics,
        "demo finished"
    );
}
