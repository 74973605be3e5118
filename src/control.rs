use std::f64::consts::PI;

pub const RAD: f64 = PI / 180.0;

/// Rate set by a held steering key, radians per frame.
pub const KEY_RATE: f64 = RAD;
/// Rate at full stick deflection, radians per frame.
pub const AXIS_MAX_RATE: f64 = 3.0 * RAD;
pub const AXIS_MAX: i16 = i16::MAX;

pub const SCALE_STEP: f32 = 10.0;
pub const DISTANCE_STEP: f32 = 100.0;

pub const DEFAULT_SCALE: f32 = 256.0;
pub const DEFAULT_DISTANCE: f32 = 3456.0;

pub const AXIS_YAW: u8 = 0;
pub const AXIS_PITCH: u8 = 1;
pub const AXIS_ROLL: u8 = 2;

/// Per-frame rotation increments plus camera parameters. Angles are deltas
/// applied to already rotated stars, so zeroing one stops the spin on that
/// axis without undoing it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ControlState {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub scale: f32,
    pub distance: f32,
    /// Set by the regenerate key, consumed by the frame loop.
    pub regenerate: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            scale: DEFAULT_SCALE,
            distance: DEFAULT_DISTANCE,
            regenerate: false,
        }
    }
}

impl ControlState {
    pub fn freeze(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.roll = 0.0;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ControlKey {
    Up,
    Down,
    Left,
    Right,
    RollLeft,
    RollRight,
    ScaleUp,
    ScaleDown,
    DistanceUp,
    DistanceDown,
    Freeze,
    Regenerate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Quit,
    KeyDown(ControlKey),
    KeyUp(ControlKey),
    AxisMotion { axis: u8, value: i16 },
}

/// Which groups of input the controller listens to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputController {
    /// Press-and-hold steering keys.
    pub toggle_keys: bool,
    /// Stick axes mapped linearly onto rates.
    pub analog_axes: bool,
    /// Scale, distance, freeze and regenerate keys.
    pub adjust_keys: bool,
}

impl InputController {
    /// Ignores everything but quit, which the frame loop handles itself.
    pub const PASSIVE: Self = Self {
        toggle_keys: false,
        analog_axes: false,
        adjust_keys: false,
    };

    pub const KEYBOARD: Self = Self {
        toggle_keys: true,
        analog_axes: false,
        adjust_keys: false,
    };

    pub const TUNING: Self = Self {
        toggle_keys: true,
        analog_axes: false,
        adjust_keys: true,
    };

    pub const JOYSTICK: Self = Self {
        toggle_keys: true,
        analog_axes: true,
        adjust_keys: true,
    };

    pub fn handle(&self, event: &InputEvent, control: &mut ControlState) {
        match *event {
            InputEvent::KeyDown(key) => self.key_down(key, control),
            InputEvent::KeyUp(key) => self.key_up(key, control),
            InputEvent::AxisMotion { axis, value } if self.analog_axes => {
                let rate = axis_rate(value);
                match axis {
                    AXIS_YAW => control.yaw = rate,
                    AXIS_PITCH => control.pitch = rate,
                    AXIS_ROLL => control.roll = rate,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn key_down(&self, key: ControlKey, control: &mut ControlState) {
        if self.toggle_keys {
            match key {
                ControlKey::Up => control.pitch = -KEY_RATE,
                ControlKey::Down => control.pitch = KEY_RATE,
                ControlKey::Left => control.yaw = -KEY_RATE,
                ControlKey::Right => control.yaw = KEY_RATE,
                ControlKey::RollLeft => control.roll = -KEY_RATE,
                ControlKey::RollRight => control.roll = KEY_RATE,
                _ => {}
            }
        }
        if self.adjust_keys {
            // no bounds: a negative distance flips the view
            match key {
                ControlKey::ScaleUp => control.scale += SCALE_STEP,
                ControlKey::ScaleDown => control.scale -= SCALE_STEP,
                ControlKey::DistanceUp => control.distance += DISTANCE_STEP,
                ControlKey::DistanceDown => control.distance -= DISTANCE_STEP,
                ControlKey::Freeze => control.freeze(),
                ControlKey::Regenerate => control.regenerate = true,
                _ => {}
            }
        }
    }

    fn key_up(&self, key: ControlKey, control: &mut ControlState) {
        if !self.toggle_keys {
            return;
        }
        match key {
            ControlKey::Up | ControlKey::Down => control.pitch = 0.0,
            ControlKey::Left | ControlKey::Right => control.yaw = 0.0,
            ControlKey::RollLeft | ControlKey::RollRight => control.roll = 0.0,
            _ => {}
        }
    }
}

/// Linear map from `[-32767, 32767]` onto `[-AXIS_MAX_RATE, AXIS_MAX_RATE]`.
pub fn axis_rate(value: i16) -> f64 {
    let t = (value as f64 / AXIS_MAX as f64).clamp(-1.0, 1.0);
    t * AXIS_MAX_RATE
}
