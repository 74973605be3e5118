use crate::control::{ControlKey, InputEvent, AXIS_MAX, AXIS_PITCH, AXIS_ROLL, AXIS_YAW};
use crate::sim::InputQueue;
use bevy::input::gamepad::{GamepadAxisChangedEvent, GamepadConnection, GamepadEvent};
use bevy::input::keyboard::KeyboardInput;
use bevy::input::{ButtonState, InputSystem};
use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

#[derive(Resource)]
pub struct Keybinds {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub roll_left: KeyCode,
    pub roll_right: KeyCode,
    pub scale_up: KeyCode,
    pub scale_down: KeyCode,
    pub distance_up: KeyCode,
    pub distance_down: KeyCode,
    pub freeze: KeyCode,
    pub regenerate: KeyCode,
    pub quit: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            up: KeyCode::ArrowUp,
            down: KeyCode::ArrowDown,
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
            roll_left: KeyCode::KeyQ,
            roll_right: KeyCode::KeyE,
            scale_up: KeyCode::Equal,
            scale_down: KeyCode::Minus,
            distance_up: KeyCode::PageUp,
            distance_down: KeyCode::PageDown,
            freeze: KeyCode::Space,
            regenerate: KeyCode::KeyR,
            quit: KeyCode::Escape,
        }
    }
}

impl Keybinds {
    pub fn lookup(&self, key: KeyCode) -> Option<ControlKey> {
        let bound = [
            (self.up, ControlKey::Up),
            (self.down, ControlKey::Down),
            (self.left, ControlKey::Left),
            (self.right, ControlKey::Right),
            (self.roll_left, ControlKey::RollLeft),
            (self.roll_right, ControlKey::RollRight),
            (self.scale_up, ControlKey::ScaleUp),
            (self.scale_down, ControlKey::ScaleDown),
            (self.distance_up, ControlKey::DistanceUp),
            (self.distance_down, ControlKey::DistanceDown),
            (self.freeze, ControlKey::Freeze),
            (self.regenerate, ControlKey::Regenerate),
        ];
        bound
            .into_iter()
            .find(|(code, _)| *code == key)
            .map(|(_, control)| control)
    }

    pub fn translate(&self, ev: &KeyboardInput) -> Option<InputEvent> {
        if ev.key_code == self.quit {
            return (ev.state == ButtonState::Pressed).then_some(InputEvent::Quit);
        }
        let key = self.lookup(ev.key_code)?;
        Some(match ev.state {
            ButtonState::Pressed => InputEvent::KeyDown(key),
            ButtonState::Released => InputEvent::KeyUp(key),
        })
    }
}

#[derive(Resource)]
struct MyGamepad(Gamepad);

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>().add_systems(
            PreUpdate,
            (gamepad_connections, collect_input)
                .chain()
                .after(InputSystem),
        );
    }
}

/// Stick position in `[-1, 1]` to the signed 16-bit range the controller expects.
pub fn axis_value(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * AXIS_MAX as f32).round() as i16
}

/// Left stick steers yaw and pitch, right stick X rolls. Stick up pitches
/// the same way as the up key.
fn stick_axis(ev: &GamepadAxisChangedEvent) -> Option<InputEvent> {
    let (axis, value) = match ev.axis_type {
        GamepadAxisType::LeftStickX => (AXIS_YAW, ev.value),
        GamepadAxisType::LeftStickY => (AXIS_PITCH, -ev.value),
        GamepadAxisType::RightStickX => (AXIS_ROLL, ev.value),
        _ => return None,
    };
    Some(InputEvent::AxisMotion {
        axis,
        value: axis_value(value),
    })
}

fn collect_input(
    mut queue: ResMut<InputQueue>,
    keybinds: Res<Keybinds>,
    my_gamepad: Option<Res<MyGamepad>>,
    mut keyboard_evr: EventReader<KeyboardInput>,
    mut gamepad_evr: EventReader<GamepadEvent>,
    mut close_evr: EventReader<WindowCloseRequested>,
) {
    for ev in keyboard_evr.read() {
        if let Some(event) = keybinds.translate(ev) {
            queue.push_back(event);
        }
    }

    for ev in gamepad_evr.read() {
        let GamepadEvent::Axis(axis) = ev else {
            continue;
        };
        let Some(MyGamepad(gamepad)) = my_gamepad.as_deref() else {
            continue;
        };
        if axis.gamepad != *gamepad {
            continue;
        }
        if let Some(event) = stick_axis(axis) {
            queue.push_back(event);
        }
    }

    if close_evr.read().next().is_some() {
        queue.push_back(InputEvent::Quit);
    }
}

fn gamepad_connections(
    mut commands: Commands,
    my_gamepad: Option<Res<MyGamepad>>,
    mut evr_gamepad: EventReader<GamepadEvent>,
) {
    for ev in evr_gamepad.read() {
        let GamepadEvent::Connection(ev_conn) = ev else {
            continue;
        };
        match &ev_conn.connection {
            GamepadConnection::Connected(info) => {
                debug!(
                    "gamepad connected: {:?}, name: {}",
                    ev_conn.gamepad, info.name,
                );
                if my_gamepad.is_none() {
                    commands.insert_resource(MyGamepad(ev_conn.gamepad));
                }
            }
            GamepadConnection::Disconnected => {
                debug!("gamepad disconnected: {:?}", ev_conn.gamepad);
                if let Some(MyGamepad(old_id)) = my_gamepad.as_deref() {
                    if *old_id == ev_conn.gamepad {
                        commands.remove_resource::<MyGamepad>();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, state: ButtonState) -> KeyboardInput {
        KeyboardInput {
            key_code: code,
            logical_key: bevy::input::keyboard::Key::Unidentified(
                bevy::input::keyboard::NativeKey::Unidentified,
            ),
            state,
            window: Entity::PLACEHOLDER,
        }
    }

    #[test]
    fn bound_keys_become_control_events() {
        let binds = Keybinds::default();
        assert_eq!(
            binds.translate(&key(KeyCode::ArrowUp, ButtonState::Pressed)),
            Some(InputEvent::KeyDown(ControlKey::Up))
        );
        assert_eq!(
            binds.translate(&key(KeyCode::ArrowUp, ButtonState::Released)),
            Some(InputEvent::KeyUp(ControlKey::Up))
        );
        assert_eq!(
            binds.translate(&key(KeyCode::PageDown, ButtonState::Pressed)),
            Some(InputEvent::KeyDown(ControlKey::DistanceDown))
        );
        assert_eq!(binds.translate(&key(KeyCode::KeyZ, ButtonState::Pressed)), None);
    }

    #[test]
    fn escape_quits_on_press_only() {
        let binds = Keybinds::default();
        assert_eq!(
            binds.translate(&key(KeyCode::Escape, ButtonState::Pressed)),
            Some(InputEvent::Quit)
        );
        assert_eq!(
            binds.translate(&key(KeyCode::Escape, ButtonState::Released)),
            None
        );
    }

    #[test]
    fn stick_range_maps_to_i16() {
        assert_eq!(axis_value(1.0), 32767);
        assert_eq!(axis_value(-1.0), -32767);
        assert_eq!(axis_value(0.0), 0);
        assert_eq!(axis_value(7.5), 32767);
    }
}
