use std::collections::VecDeque;
use std::time::Duration;

use bevy::log::{debug, info};
use bevy::prelude::States;
use rand::Rng;

use crate::control::{ControlState, InputController, InputEvent};
use crate::error::Result;
use crate::generator::{generate, GeneratorPolicy};
use crate::projector::{DepthRange, ProjectionStats, Projector};
use crate::rotation::{rotate, Composition};
use crate::starfield::StarField;

/// Where pixels go. The frame loop only ever plots single points.
pub trait Surface {
    fn set_draw_color(&mut self, r: u8, g: u8, b: u8, a: u8);
    fn draw_point(&mut self, x: i32, y: i32);
    fn clear(&mut self);
    fn present(&mut self);
}

pub trait Pacer {
    fn sleep(&mut self, delay: Duration);
}

/// Non-blocking event source, drained until empty every frame.
pub trait InputSource {
    fn poll(&mut self) -> Option<InputEvent>;
}

impl InputSource for VecDeque<InputEvent> {
    fn poll(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

/// Blocks the calling thread for the whole delay.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn sleep(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[derive(States, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum LoopState {
    #[default]
    Initializing,
    Running,
    Terminating,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tint {
    #[default]
    Grayscale,
    /// Red and green only.
    Amber,
}

impl Tint {
    pub fn rgba(&self, brightness: u8) -> [u8; 4] {
        match self {
            Tint::Grayscale => [brightness, brightness, brightness, 0xff],
            Tint::Amber => [brightness, brightness, 0, 0xff],
        }
    }
}

/// Everything the loop needs that stays fixed for a run.
#[derive(Clone, Copy, Debug)]
pub struct LoopConfig {
    pub count: usize,
    pub spread: f32,
    pub policy: GeneratorPolicy,
    pub composition: Composition,
    pub controller: InputController,
    pub projector: Projector,
    pub tint: Tint,
    pub delay: Duration,
    pub initial: ControlState,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameStats {
    pub frame: u64,
    pub projection: ProjectionStats,
}

/// Generate once, then rotate, project, draw, present, wait, clear and
/// drain input every frame until quit.
pub struct FrameLoop {
    pub config: LoopConfig,
    pub control: ControlState,
    pub depth: DepthRange,
    field: StarField,
    state: LoopState,
    frame: u64,
}

impl FrameLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            control: config.initial,
            config,
            depth: DepthRange::EMPTY,
            field: StarField::default(),
            state: LoopState::Initializing,
            frame: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn field(&self) -> &StarField {
        &self.field
    }

    /// Builds the star field and moves to `Running`. Only valid once.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.state != LoopState::Initializing {
            return Ok(());
        }
        self.field = generate(self.config.policy, self.config.count, self.config.spread, rng)?;
        self.control = self.config.initial;
        self.depth = DepthRange::EMPTY;
        self.state = LoopState::Running;
        info!(
            "generated {} stars ({:?}, spread {})",
            self.field.len(),
            self.config.policy,
            self.config.spread
        );
        Ok(())
    }

    /// Replaces the field with a fresh one and forgets the depth span.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.field = generate(self.config.policy, self.config.count, self.config.spread, rng)?;
        self.depth = DepthRange::EMPTY;
        Ok(())
    }

    /// One frame. Returns `None` outside the `Running` state.
    pub fn step<S, P, I, R>(
        &mut self,
        surface: &mut S,
        pacer: &mut P,
        input: &mut I,
        rng: &mut R,
    ) -> Result<Option<FrameStats>>
    where
        S: Surface + ?Sized,
        P: Pacer + ?Sized,
        I: InputSource + ?Sized,
        R: Rng + ?Sized,
    {
        if self.state != LoopState::Running {
            return Ok(None);
        }

        let control = self.control;
        rotate(
            self.field.stars_mut(),
            self.config.composition,
            control.pitch,
            control.roll,
            control.yaw,
        );
        let projection = self.config.projector.project(
            self.field.stars_mut(),
            control.scale,
            control.distance,
            &mut self.depth,
        );
        if projection.skipped > 0 {
            debug!(
                "frame {}: skipped {} stars on the camera plane",
                self.frame, projection.skipped
            );
        }

        for star in self.field.visible() {
            let [r, g, b, a] = self.config.tint.rgba(star.brightness);
            surface.set_draw_color(r, g, b, a);
            surface.draw_point(star.screen.x, star.screen.y);
        }
        surface.present();
        pacer.sleep(self.config.delay);
        surface.set_draw_color(0, 0, 0, 0xff);
        surface.clear();

        while let Some(event) = input.poll() {
            if event == InputEvent::Quit {
                info!("quit after {} frames", self.frame + 1);
                self.state = LoopState::Terminating;
                continue;
            }
            if self.state == LoopState::Running {
                self.config.controller.handle(&event, &mut self.control);
            }
        }

        if self.control.regenerate && self.state == LoopState::Running {
            self.control.regenerate = false;
            self.regenerate(rng)?;
        }

        let stats = FrameStats {
            frame: self.frame,
            projection,
        };
        self.frame += 1;
        Ok(Some(stats))
    }

    /// Drives frames until quit. Used by headless drivers.
    pub fn run<S, P, I, R>(
        &mut self,
        surface: &mut S,
        pacer: &mut P,
        input: &mut I,
        rng: &mut R,
    ) -> Result<u64>
    where
        S: Surface + ?Sized,
        P: Pacer + ?Sized,
        I: InputSource + ?Sized,
        R: Rng + ?Sized,
    {
        self.initialize(rng)?;
        while self.step(surface, pacer, input, rng)?.is_some() {}
        Ok(self.frame)
    }
}
