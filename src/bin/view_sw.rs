use anyhow::Context;
use clap::Parser;
use minifb::{Key, Window, WindowOptions};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallview::{
    ViewConfig, Viewport,
    engine::{Drawable, FrameDriver},
    renderer::Software,
    sim::{InputCmd, Scene},
};

/// Pseudo-3D wall viewer on the software backend.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 640)]
    width: usize,
    #[arg(long, default_value_t = 360)]
    height: usize,
    /// Focal length in pixels.
    #[arg(long, default_value_t = 200.0)]
    fov: f32,
    #[arg(long, default_value_t = 1.0)]
    near: f32,
    /// Smallest screen coordinate a vertex may take.
    #[arg(long, default_value_t = 10.0)]
    clamp_floor: f32,
    /// Give each wall corner its own colour.
    #[arg(long)]
    debug_colors: bool,
    /// Render this many frames without a window, then exit.
    #[arg(long)]
    frames: Option<usize>,
}

const FIXED_DT: f32 = 1.0 / 35.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ViewConfig {
        fov: args.fov,
        near_plane: args.near,
        clamp_floor: args.clamp_floor,
        debug_colors: args.debug_colors,
        ..ViewConfig::default()
    };
    let viewport = Viewport::fixed(args.width as f32, args.height as f32);

    let mut scene = Scene::start();
    let mut renderer = Software::default();
    let mut driver = FrameDriver::setup(&mut renderer, config, viewport)
        .context("setting up the view pipeline")?;
    if let Some(camera) = scene.camera() {
        driver.register_camera(camera);
    }

    if let Some(frames) = args.frames {
        return run_headless(&mut scene, &mut renderer, &mut driver, &args, frames);
    }

    let mut win = Window::new(
        "wallview",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(35);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* --------------- one InputCmd per frame --------------------------- */
        let mut cmd = InputCmd::default();
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            cmd.forward += 1.0;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            cmd.forward -= 1.0;
        }
        if win.is_key_down(Key::A) {
            cmd.strafe -= 1.0;
        }
        if win.is_key_down(Key::D) {
            cmd.strafe += 1.0;
        }
        if win.is_key_down(Key::Left) {
            cmd.turn += 1.0;
        }
        if win.is_key_down(Key::Right) {
            cmd.turn -= 1.0;
        }

        scene.step(cmd, FIXED_DT);
        if let Some(camera) = scene.camera() {
            driver.register_camera(camera);
        }

        /* draw */
        renderer.begin_frame(args.width, args.height);
        let drawables: Vec<Drawable> = scene.walls().into_iter().map(Drawable::from).collect();
        driver.render_frame(&mut renderer, &drawables);

        let mut shown = Ok(());
        renderer.end_frame(|fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            shown = win.update_with_buffer(fb, w, h);
        });
        shown?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Spin the camera in place for `frames` frames and report timing.
fn run_headless(
    scene: &mut Scene,
    renderer: &mut Software,
    driver: &mut FrameDriver,
    args: &Args,
    frames: usize,
) -> anyhow::Result<()> {
    let drawables: Vec<Drawable> = scene.walls().into_iter().map(Drawable::from).collect();
    let cmd = InputCmd {
        turn: 1.0,
        ..InputCmd::default()
    };

    let started = Instant::now();
    let mut uploaded = 0usize;
    for _ in 0..frames {
        scene.step(cmd, FIXED_DT);
        if let Some(camera) = scene.camera() {
            driver.register_camera(camera);
        }
        renderer.begin_frame(args.width, args.height);
        uploaded += driver.render_frame(renderer, &drawables).uploaded;
    }

    let total = started.elapsed();
    let avg_ms = total.as_secs_f64() * 1000.0 / frames.max(1) as f64;
    info!(frames, uploaded, "headless run finished: avg {avg_ms:.3} ms/frame");
    Ok(())
}
