#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns polled input frames into player commands.

use grid_assault_core::{Axis, Command, InputFrame, SessionPhase, Steering};

/// Player control system translating one input frame per tick.
#[derive(Debug, Default)]
pub struct PlayerControl {
    scratch: Vec<Command>,
}

impl PlayerControl {
    /// Creates a new player control system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits steering, fire, and detonation commands for the frame.
    ///
    /// Outside of combat the frame is swallowed whole; the world would
    /// reject the commands anyway, so none are produced.
    pub fn handle(&mut self, phase: SessionPhase, input: &InputFrame, out: &mut Vec<Command>) {
        if phase != SessionPhase::Combat {
            return;
        }

        self.scratch.clear();

        self.scratch.push(Command::SteerPlayer {
            steering: Steering {
                horizontal: Axis::from_flags(input.left, input.right),
                vertical: Axis::from_flags(input.up, input.down),
                run: input.run,
            },
        });

        if input.fire_pressed || input.fire_held {
            self.scratch.push(Command::TriggerGun {
                pressed: input.fire_pressed,
                held: input.fire_held,
            });
        }

        if input.detonate_pressed {
            self.scratch.push(Command::PressBigRedButton);
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dormant_phase_is_silent() {
        let mut system = PlayerControl::new();
        let mut out = Vec::new();
        let input = InputFrame {
            fire_pressed: true,
            ..InputFrame::default()
        };

        system.handle(SessionPhase::Dormant, &input, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn held_keys_resolve_into_steering_axes() {
        let mut system = PlayerControl::new();
        let mut out = Vec::new();
        let input = InputFrame {
            left: true,
            up: true,
            run: true,
            ..InputFrame::default()
        };

        system.handle(SessionPhase::Combat, &input, &mut out);

        assert_eq!(
            out,
            vec![Command::SteerPlayer {
                steering: Steering {
                    horizontal: Axis::Negative,
                    vertical: Axis::Negative,
                    run: true,
                },
            }],
        );
    }

    #[test]
    fn fire_press_and_hold_pass_through_once() {
        let mut system = PlayerControl::new();
        let mut out = Vec::new();
        let input = InputFrame {
            fire_pressed: true,
            fire_held: true,
            ..InputFrame::default()
        };

        system.handle(SessionPhase::Combat, &input, &mut out);

        assert!(out.contains(&Command::TriggerGun {
            pressed: true,
            held: true,
        }));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn detonation_press_requests_the_big_red_button() {
        let mut system = PlayerControl::new();
        let mut out = Vec::new();
        let input = InputFrame {
            detonate_pressed: true,
            ..InputFrame::default()
        };

        system.handle(SessionPhase::Combat, &input, &mut out);

        assert!(out.contains(&Command::PressBigRedButton));
    }

    #[test]
    fn opposing_keys_cancel_to_neutral() {
        let mut system = PlayerControl::new();
        let mut out = Vec::new();
        let input = InputFrame {
            left: true,
            right: true,
            ..InputFrame::default()
        };

        system.handle(SessionPhase::Combat, &input, &mut out);

        assert_eq!(
            out,
            vec![Command::SteerPlayer {
                steering: Steering::default(),
            }],
        );
    }
}
