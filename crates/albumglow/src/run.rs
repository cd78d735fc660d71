use std::sync::Arc;
use std::time::{Duration, Instant};

use ambience::{Engine, EngineOptions, OptionsUpdate};
use anyhow::{Context, Result};
use playlist::{Rotation, RotationConfig, RotationItem, RotationMode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let mut rotation = build_rotation(&cli)?;
    if cli.gradient.is_none() && rotation.is_none() {
        anyhow::bail!("nothing to display: pass images, --playlist, or --gradient");
    }

    let (width, height) = cli.size.unwrap_or((1920, 1080));
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = WindowBuilder::new()
        .with_title("albumglow")
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut options = EngineOptions::default();
    options.apply(&cli.options_update());
    let mut engine = Engine::new(&*window, window.inner_size(), options)?;

    if let Some(gradient) = &cli.gradient {
        engine.load_gradient(&gradient.stops, cli.gradient_angle);
    } else if let Some(rotation) = &rotation {
        let item = rotation.current();
        info!(image = %item.image, "loading first image");
        let _ticket = engine.load_image(&item.image);
    }
    if !cli.paused {
        engine.start();
    }
    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            let Event::WindowEvent { window_id, event } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    engine.dispose();
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    engine.resize(new_size);
                }
                WindowEvent::RedrawRequested => {
                    if let Some(rotation) = rotation.as_mut() {
                        if let Some(item) = rotation.advance_if_elapsed(Instant::now()) {
                            info!(image = %item.image, "rotating to next image");
                            engine.set_options(&OptionsUpdate {
                                transition_duration: Some(item.transition),
                                ..OptionsUpdate::default()
                            });
                            let _ticket = engine.load_image(&item.image);
                        }
                    }

                    match engine.render_frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                            warn!("surface lost; reconfiguring");
                            engine.recover_surface();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting");
                            engine.dispose();
                            elwt.exit();
                            return;
                        }
                        Err(err) => {
                            warn!(error = ?err, "frame render failed");
                        }
                    }
                    // Present-when-ready: the Fifo surface paces this to the
                    // display refresh.
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .context("event loop terminated abnormally")?;

    Ok(())
}

/// Builds the rotation either from a playlist file or from positional images.
/// A gradient run has nothing to rotate through.
fn build_rotation(cli: &Cli) -> Result<Option<Rotation>> {
    if cli.gradient.is_some() {
        return Ok(None);
    }
    let seed = cli.seed.unwrap_or(0xa1b);
    if let Some(path) = &cli.playlist {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read playlist at {}", path.display()))?;
        let config = RotationConfig::from_toml_str(&raw)
            .with_context(|| format!("failed to parse playlist at {}", path.display()))?;
        return Ok(Some(Rotation::new(config, seed, Instant::now())));
    }
    if cli.images.is_empty() {
        return Ok(None);
    }

    let config = RotationConfig {
        version: 1,
        mode: if cli.shuffle {
            RotationMode::Shuffle
        } else {
            RotationMode::Continuous
        },
        item_duration: Duration::from_secs_f32(cli.interval.max(1.0)),
        transition: cli
            .transition_ms
            .map(Duration::from_millis)
            .unwrap_or(EngineOptions::default().transition_duration),
        items: cli
            .images
            .iter()
            .map(|image| RotationItem {
                image: image.clone(),
                duration: None,
                transition: None,
            })
            .collect(),
    };
    Ok(Some(Rotation::new(config, seed, Instant::now())))
}
