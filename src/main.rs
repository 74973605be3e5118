mod control;
mod error;
mod frame_loop;
mod generator;
mod input;
mod projector;
mod rotation;
mod sim;
mod starfield;
mod surface;
mod ui;

use std::time::Duration;

use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::window::{ExitCondition, WindowResolution};
use clap::Parser;
use control::InputEvent;
use frame_loop::{FrameLoop, InputSource, LoopState, ThreadPacer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use input::InputPlugin;
use sim::{StarSettings, StarfieldPlugin, Variant};
use surface::Framebuffer;
use ui::UiPlugin;

/// Rotating 3D starfield with depth shading.
#[derive(Parser, Debug)]
#[command(name = "starfield", author, version, about, long_about = None)]
struct Cli {
    /// Which flavour of the demo to run
    #[arg(short, long, value_enum, default_value = "euler")]
    variant: Variant,

    /// Number of stars
    #[arg(short = 'n', long)]
    stars: Option<usize>,

    /// Edge length of the cube (or diameter of the ball) stars are placed in
    #[arg(long)]
    spread: Option<f32>,

    /// Seed for a repeatable field
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Wait between frames in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Run this many frames without a window and print a summary
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    headless: Option<u64>,
}

impl Cli {
    fn settings(&self) -> StarSettings {
        let mut settings = StarSettings::from_variant(self.variant);
        if let Some(stars) = self.stars {
            settings.star_count = stars;
        }
        if let Some(spread) = self.spread {
            settings.spread = spread;
        }
        if let Some(width) = self.width {
            settings.screen.x = width;
        }
        if let Some(height) = self.height {
            settings.screen.y = height;
        }
        if let Some(ms) = self.delay_ms {
            settings.frame_delay = Duration::from_millis(ms);
        }
        settings.seed = self.seed;
        settings
    }
}

/// Feeds a quit event during the given frame.
struct QuitAfter(u64);

impl InputSource for QuitAfter {
    fn poll(&mut self) -> Option<InputEvent> {
        match self.0 {
            0 => None,
            1 => {
                self.0 = 0;
                Some(InputEvent::Quit)
            }
            _ => {
                self.0 -= 1;
                None
            }
        }
    }
}

fn run_headless(settings: &StarSettings, frames: u64) -> AppExit {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut framebuffer = Framebuffer::new(Handle::default(), settings.screen);
    let mut front = Vec::new();
    let mut frame_loop = FrameLoop::new(settings.loop_config());

    let result = frame_loop.run(
        &mut framebuffer.surface(&mut front),
        &mut ThreadPacer,
        &mut QuitAfter(frames),
        &mut rng,
    );
    match result {
        Ok(count) => {
            let visible = frame_loop.field().visible().count();
            println!(
                "{count} frames ({} presented), {visible}/{} stars visible, depth {:.1} .. {:.1}",
                framebuffer.presented(),
                frame_loop.field().len(),
                frame_loop.depth.min,
                frame_loop.depth.max
            );
            AppExit::Success
        }
        Err(err) => {
            eprintln!("{err}");
            AppExit::error()
        }
    }
}

fn main() -> AppExit {
    let cli = Cli::parse();
    let settings = cli.settings();
    if let Err(err) = settings.validate() {
        eprintln!("could not start: {err}");
        return AppExit::error();
    }
    if let Some(frames) = cli.headless {
        return run_headless(&settings, frames);
    }
    let resolution = WindowResolution::new(settings.screen.x as f32, settings.screen.y as f32);

    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(settings)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Stars".into(),
                resolution,
                resizable: false,
                ..default()
            }),
            // closing the window is a quit event like any other
            exit_condition: ExitCondition::DontExit,
            close_when_requested: false,
        }))
        .init_state::<LoopState>()
        .add_plugins((StarfieldPlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera)
        .run()
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::TonyMcMapface,
            transform: Transform::from_xyz(0.0, 0.0, 999.0),
            ..default()
        },
        BloomSettings::default(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_loop::Pacer;

    struct NoWait;

    impl Pacer for NoWait {
        fn sleep(&mut self, _delay: Duration) {}
    }

    fn small_settings() -> StarSettings {
        let mut settings = StarSettings::default();
        settings.star_count = 50;
        settings.frame_delay = Duration::from_millis(1);
        settings.seed = Some(3);
        settings
    }

    #[test]
    fn quit_after_fires_once_on_the_given_poll() {
        let mut input = QuitAfter(3);
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), Some(InputEvent::Quit));
        assert_eq!(input.poll(), None);
    }

    #[test]
    fn quit_after_three_runs_three_frames() {
        let settings = small_settings();
        let mut framebuffer = Framebuffer::new(Handle::default(), settings.screen);
        let mut front = Vec::new();
        let mut frame_loop = FrameLoop::new(settings.loop_config());
        let mut rng = StdRng::seed_from_u64(3);

        let frames = frame_loop
            .run(
                &mut framebuffer.surface(&mut front),
                &mut NoWait,
                &mut QuitAfter(3),
                &mut rng,
            )
            .unwrap();
        assert_eq!(frames, 3);
        assert_eq!(framebuffer.presented(), 3);
        assert_eq!(frame_loop.state(), LoopState::Terminating);
    }

    #[test]
    fn headless_run_exit_codes() {
        assert!(matches!(run_headless(&small_settings(), 3), AppExit::Success));

        let mut settings = small_settings();
        settings.spread = f32::NAN;
        assert!(matches!(run_headless(&settings, 3), AppExit::Error(_)));
    }
}
