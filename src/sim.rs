use std::collections::VecDeque;
use std::time::Duration;

use bevy::prelude::*;
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::control::{ControlState, InputController, InputEvent, RAD};
use crate::error::{Result, StarfieldError};
use crate::frame_loop::{FrameLoop, FrameStats, LoopConfig, LoopState, Pacer, Tint};
use crate::generator::GeneratorPolicy;
use crate::projector::{DepthMode, Projector, NEAR_EPSILON};
use crate::rotation::Composition;
use crate::surface::Framebuffer;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum Variant {
    /// Constant spin about two axes, amber stars, no steering.
    Spin,
    /// Keyboard steering of a spherical cloud.
    #[default]
    Euler,
    /// Keyboard steering plus the tuning panel.
    Tuning,
    /// Joystick and keyboard steering.
    Steering,
}

#[derive(Resource, Clone, Debug)]
pub struct StarSettings {
    pub variant: Variant,
    pub star_count: usize,
    pub spread: f32,
    pub policy: GeneratorPolicy,
    pub composition: Composition,
    pub controller: InputController,
    pub initial: ControlState,
    pub screen: UVec2,
    pub frame_delay: Duration,
    pub tint: Tint,
    pub depth_mode: DepthMode,
    pub near_epsilon: f32,
    pub seed: Option<u64>,
    pub show_panel: bool,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self::from_variant(Variant::default())
    }
}

impl StarSettings {
    pub fn from_variant(variant: Variant) -> Self {
        let mut settings = StarSettings {
            variant,
            star_count: 2000,
            spread: 4000.0,
            policy: GeneratorPolicy::Sphere,
            composition: Composition::Combined,
            controller: InputController::KEYBOARD,
            initial: ControlState::default(),
            screen: UVec2::new(800, 600),
            frame_delay: Duration::from_millis(50),
            tint: Tint::Grayscale,
            depth_mode: DepthMode::Cumulative,
            near_epsilon: NEAR_EPSILON,
            seed: None,
            show_panel: false,
        };
        match variant {
            Variant::Spin => {
                settings.policy = GeneratorPolicy::TiltedBox;
                settings.composition = Composition::Sequential;
                settings.controller = InputController::PASSIVE;
                settings.initial.yaw = RAD;
                settings.initial.roll = RAD;
                settings.tint = Tint::Amber;
            }
            Variant::Euler => {}
            Variant::Tuning => {
                settings.controller = InputController::TUNING;
                settings.show_panel = true;
            }
            Variant::Steering => {
                settings.star_count = 1000;
                settings.policy = GeneratorPolicy::Box;
                settings.controller = InputController::JOYSTICK;
            }
        }
        settings
    }

    pub fn validate(&self) -> Result<()> {
        if self.star_count == 0 {
            return Err(StarfieldError::Initialization(
                "need at least one star".into(),
            ));
        }
        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(StarfieldError::InvalidSpread(self.spread));
        }
        if self.screen.x == 0 || self.screen.y == 0 {
            return Err(StarfieldError::Initialization(format!(
                "screen size {}x{} has no area",
                self.screen.x, self.screen.y
            )));
        }
        if self.frame_delay.is_zero() {
            return Err(StarfieldError::Initialization(
                "frame delay must be at least 1ms".into(),
            ));
        }
        Ok(())
    }

    pub fn loop_config(&self) -> LoopConfig {
        let mut projector = Projector::new(self.screen).with_mode(self.depth_mode);
        projector.near_epsilon = self.near_epsilon;
        LoopConfig {
            count: self.star_count,
            spread: self.spread,
            policy: self.policy,
            composition: self.composition,
            controller: self.controller,
            projector,
            tint: self.tint,
            delay: self.frame_delay,
            initial: self.initial,
        }
    }
}

#[derive(Resource, Deref, DerefMut)]
pub struct Simulation(pub FrameLoop);

#[derive(Resource)]
pub struct SeededRng(pub StdRng);

/// Events gathered from bevy since the last frame step.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct InputQueue(pub VecDeque<InputEvent>);

#[derive(Resource, Default, Deref, DerefMut)]
pub struct SimStats(pub FrameStats);

/// Gates frame steps to one per elapsed delay. A long render frame still
/// yields a single step, never a burst.
#[derive(Resource)]
pub struct FrameTimer(Timer);

impl FrameTimer {
    pub fn new(delay: Duration) -> Self {
        Self(Timer::new(delay, TimerMode::Repeating))
    }

    pub fn due(&mut self, delta: Duration) -> bool {
        self.0.tick(delta);
        self.0.just_finished()
    }
}

/// The wait between frames comes from `FrameTimer`, so there is nothing left
/// to block on here.
struct TimerPacer;

impl Pacer for TimerPacer {
    fn sleep(&mut self, _delay: Duration) {}
}

pub struct StarfieldPlugin;
impl Plugin for StarfieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StarSettings>()
            .init_resource::<InputQueue>()
            .init_resource::<SimStats>()
            .add_systems(
                Startup,
                (setup_pacing, setup_framebuffer, initialize_stars).chain(),
            )
            .add_systems(
                Update,
                advance_frame.run_if(in_state(LoopState::Running)),
            )
            .add_systems(OnEnter(LoopState::Terminating), exit_on_quit);
    }
}

fn setup_pacing(mut commands: Commands, settings: Res<StarSettings>) {
    commands.insert_resource(FrameTimer::new(settings.frame_delay));
}

fn setup_framebuffer(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    settings: Res<StarSettings>,
) {
    let image = images.add(Framebuffer::blank_image(settings.screen));
    commands.spawn(SpriteBundle {
        texture: image.clone(),
        ..default()
    });
    commands.insert_resource(Framebuffer::new(image, settings.screen));
}

fn initialize_stars(
    mut commands: Commands,
    settings: Res<StarSettings>,
    mut next_state: ResMut<NextState<LoopState>>,
    mut exit: EventWriter<AppExit>,
) {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(
        "{:?}: {} stars, seed {:?}",
        settings.variant, settings.star_count, settings.seed
    );

    let mut frame_loop = FrameLoop::new(settings.loop_config());
    match frame_loop.initialize(&mut rng) {
        Ok(()) => {
            commands.insert_resource(Simulation(frame_loop));
            commands.insert_resource(SeededRng(rng));
            next_state.set(LoopState::Running);
        }
        Err(err) => {
            error!("{err}");
            exit.send(AppExit::error());
        }
    }
}

fn advance_frame(
    time: Res<Time>,
    mut timer: ResMut<FrameTimer>,
    mut sim: ResMut<Simulation>,
    mut rng: ResMut<SeededRng>,
    mut queue: ResMut<InputQueue>,
    mut framebuffer: ResMut<Framebuffer>,
    mut images: ResMut<Assets<Image>>,
    mut stats: ResMut<SimStats>,
    mut next_state: ResMut<NextState<LoopState>>,
    mut exit: EventWriter<AppExit>,
) {
    if !timer.due(time.delta()) {
        return;
    }
    let handle = framebuffer.image.clone();
    let Some(image) = images.get_mut(&handle) else {
        return;
    };
    let mut surface = framebuffer.surface(&mut image.data);

    match sim.step(&mut surface, &mut TimerPacer, &mut queue.0, &mut rng.0) {
        Ok(Some(frame)) => stats.0 = frame,
        Ok(None) => {}
        Err(err) => {
            error!("{err}");
            exit.send(AppExit::error());
            return;
        }
    }
    if sim.state() == LoopState::Terminating {
        next_state.set(LoopState::Terminating);
    }
}

fn exit_on_quit(mut exit: EventWriter<AppExit>) {
    exit.send(AppExit::Success);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_validates() {
        for variant in Variant::value_variants() {
            StarSettings::from_variant(*variant).validate().unwrap();
        }
    }

    #[test]
    fn spin_variant_settings() {
        let s = StarSettings::from_variant(Variant::Spin);
        assert_eq!(s.policy, GeneratorPolicy::TiltedBox);
        assert_eq!(s.composition, Composition::Sequential);
        assert_eq!(s.initial.yaw, RAD);
        assert_eq!(s.initial.roll, RAD);
        assert_eq!(s.initial.pitch, 0.0);
        assert_eq!(s.tint, Tint::Amber);
    }

    #[test]
    fn frame_timer_steps_once_per_delay() {
        let mut timer = FrameTimer::new(Duration::from_millis(50));
        assert!(!timer.due(Duration::from_millis(20)));
        assert!(timer.due(Duration::from_millis(30)));
        assert!(!timer.due(Duration::from_millis(49)));
        assert!(timer.due(Duration::from_millis(1)));
    }

    #[test]
    fn slow_render_frame_does_not_catch_up() {
        let mut timer = FrameTimer::new(Duration::from_millis(50));
        // one 150ms frame is a single step, and the next short frame is not
        assert!(timer.due(Duration::from_millis(150)));
        assert!(!timer.due(Duration::from_millis(10)));
        assert!(timer.due(Duration::from_millis(40)));
    }

    #[test]
    fn bad_settings_are_initialization_errors() {
        let mut s = StarSettings::default();
        s.screen = UVec2::new(0, 600);
        assert!(matches!(s.validate(), Err(StarfieldError::Initialization(_))));

        let mut s = StarSettings::default();
        s.spread = -1.0;
        assert!(matches!(s.validate(), Err(StarfieldError::InvalidSpread(_))));

        let mut s = StarSettings::default();
        s.star_count = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn loop_config_carries_settings() {
        let s = StarSettings::from_variant(Variant::Steering);
        let config = s.loop_config();
        assert_eq!(config.count, 1000);
        assert_eq!(config.controller, InputController::JOYSTICK);
        assert_eq!(config.projector.screen, UVec2::new(800, 600));
        assert_eq!(config.delay, Duration::from_millis(50));
    }
}
