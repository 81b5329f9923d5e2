//! Regulator mode/state machine.
//!
//! Owns every piece of process state the control loop acts on: the simulated
//! temperature, the ramp direction, the operating mode, and the manual-mode
//! setpoint. The interrupt paths never touch this struct; mode toggles reach
//! it as queued events applied by the control task.

use crate::{setpoint::DEFAULT_SETPOINT, Temperature};

/// Lower ramp endpoint in automatic mode.
pub const TEMP_MIN: Temperature = Temperature::const_from_int(15);
/// Upper ramp endpoint in automatic mode.
pub const TEMP_MAX: Temperature = Temperature::const_from_int(25);
/// Temperature change per control cycle in automatic mode.
const RAMP_STEP: Temperature = Temperature::const_from_int(2);

/// Full-scale actuator intensity in percent.
pub const FULL_DRIVE: u8 = 100;

/// Operating mode, toggled by the user button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Temperature cycles through a triangular wave on its own.
    Automatic,
    /// Temperature holds still; actuators drive toward the user setpoint.
    Manual,
}

/// Direction the system is pushing the temperature this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trend {
    Heating,
    Cooling,
    /// Manual mode only: simulated temperature equals the setpoint.
    AtTarget,
}

/// Actuator intensities decided for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Drive {
    /// Heating element intensity (0..=100).
    pub lamp: u8,
    /// Cooling element intensity (0..=100).
    pub peltier: u8,
    pub trend: Trend,
}

pub struct Regulator {
    mode: Mode,
    temperature: Temperature,
    heating: bool,
    desired: Temperature,
}

impl Regulator {
    /// Boot state: automatic mode at the bottom of the ramp, heating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: Mode::Automatic,
            temperature: TEMP_MIN,
            heating: true,
            desired: DEFAULT_SETPOINT,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn temperature(&self) -> Temperature {
        self.temperature
    }

    #[must_use]
    pub const fn desired(&self) -> Temperature {
        self.desired
    }

    pub fn set_desired(&mut self, desired: Temperature) {
        self.desired = desired;
    }

    /// Flip the operating mode and return the mode just entered.
    ///
    /// Re-entering automatic mode restarts the ramp from the bottom,
    /// regardless of where the temperature was left.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Automatic => Mode::Manual,
            Mode::Manual => {
                self.temperature = TEMP_MIN;
                self.heating = true;
                Mode::Automatic
            }
        };
        self.mode
    }

    /// Advance the simulated temperature by one control cycle.
    ///
    /// Manual mode holds the temperature still. In automatic mode the value
    /// ramps 2 degrees per cycle between the endpoints; the direction flips
    /// within the same step that reaches an endpoint, so the endpoint status
    /// line already reports the reversed direction.
    pub fn step(&mut self) {
        if self.mode == Mode::Manual {
            return;
        }

        if self.heating {
            self.temperature += RAMP_STEP;
            if self.temperature >= TEMP_MAX {
                self.temperature = TEMP_MAX;
                self.heating = false;
            }
        } else {
            self.temperature -= RAMP_STEP;
            if self.temperature <= TEMP_MIN {
                self.temperature = TEMP_MIN;
                self.heating = true;
            }
        }
    }

    /// Decide the actuator intensities for the current state.
    ///
    /// Pure: repeated calls without an intervening [`step`](Self::step) or
    /// mode change return the same drive.
    #[must_use]
    pub fn decide(&self) -> Drive {
        let trend = match self.mode {
            Mode::Manual => {
                if self.temperature < self.desired {
                    Trend::Heating
                } else if self.temperature > self.desired {
                    Trend::Cooling
                } else {
                    Trend::AtTarget
                }
            }
            Mode::Automatic => {
                if self.heating {
                    Trend::Heating
                } else {
                    Trend::Cooling
                }
            }
        };

        match trend {
            Trend::Heating => Drive {
                lamp: FULL_DRIVE,
                peltier: 0,
                trend,
            },
            Trend::Cooling => Drive {
                lamp: 0,
                peltier: FULL_DRIVE,
                trend,
            },
            Trend::AtTarget => Drive {
                lamp: 0,
                peltier: 0,
                trend,
            },
        }
    }
}

impl Default for Regulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(value: i32) -> Temperature {
        Temperature::from_num(value)
    }

    #[test]
    fn automatic_ramp_is_a_triangular_wave() {
        let mut reg = Regulator::new();
        assert_eq!(reg.temperature(), temp(15));
        assert!(reg.heating);

        let expected = [17, 19, 21, 23, 25, 23, 21, 19, 17, 15];
        for (i, want) in expected.iter().cycle().take(30).enumerate() {
            reg.step();
            assert_eq!(reg.temperature(), temp(*want), "step {i}");
        }
    }

    #[test]
    fn direction_flips_exactly_at_the_endpoints() {
        let mut reg = Regulator::new();

        // Up to the top: heating until the step that lands on 25.
        for _ in 0..4 {
            reg.step();
            assert!(reg.heating);
        }
        reg.step();
        assert_eq!(reg.temperature(), temp(25));
        assert!(!reg.heating);

        // Back down: cooling until the step that lands on 15.
        for _ in 0..4 {
            reg.step();
            assert!(!reg.heating);
        }
        reg.step();
        assert_eq!(reg.temperature(), temp(15));
        assert!(reg.heating);
    }

    #[test]
    fn no_overshoot_persists_at_the_endpoints() {
        let mut reg = Regulator::new();
        for _ in 0..100 {
            reg.step();
            assert!(reg.temperature() >= temp(15));
            assert!(reg.temperature() <= temp(25));
        }
    }

    #[test]
    fn manual_mode_halts_the_simulation() {
        let mut reg = Regulator::new();
        reg.step();
        assert_eq!(reg.temperature(), temp(17));

        assert_eq!(reg.toggle_mode(), Mode::Manual);
        for _ in 0..5 {
            reg.step();
        }
        assert_eq!(reg.temperature(), temp(17));
    }

    #[test]
    fn reentering_automatic_restarts_the_ramp() {
        let mut reg = Regulator::new();
        for _ in 0..7 {
            reg.step();
        }
        assert_eq!(reg.temperature(), temp(21));
        assert!(!reg.heating);

        reg.toggle_mode();
        assert_eq!(reg.toggle_mode(), Mode::Automatic);
        assert_eq!(reg.temperature(), temp(15));
        assert!(reg.heating);
    }

    #[test]
    fn decide_is_idempotent() {
        let mut reg = Regulator::new();
        reg.step();
        let first = reg.decide();
        assert_eq!(reg.decide(), first);
        assert_eq!(reg.decide(), first);
    }

    #[test]
    fn automatic_drive_follows_the_ramp_direction() {
        let mut reg = Regulator::new();
        reg.step();
        let drive = reg.decide();
        assert_eq!(drive.lamp, FULL_DRIVE);
        assert_eq!(drive.peltier, 0);
        assert_eq!(drive.trend, Trend::Heating);

        // Ride the ramp to the top; the endpoint step reverses the drive.
        for _ in 0..4 {
            reg.step();
        }
        let drive = reg.decide();
        assert_eq!(drive.lamp, 0);
        assert_eq!(drive.peltier, FULL_DRIVE);
        assert_eq!(drive.trend, Trend::Cooling);
    }

    #[test]
    fn manual_drive_closes_the_gap_toward_the_setpoint() {
        let mut reg = Regulator::new();
        reg.step();
        reg.toggle_mode();
        reg.set_desired(temp(20));

        // 17.0 < 20.0: heat.
        let drive = reg.decide();
        assert_eq!(drive.lamp, FULL_DRIVE);
        assert_eq!(drive.peltier, 0);
        assert_eq!(drive.trend, Trend::Heating);

        // Above the setpoint: cool.
        reg.set_desired(temp(16));
        let drive = reg.decide();
        assert_eq!(drive.lamp, 0);
        assert_eq!(drive.peltier, FULL_DRIVE);
        assert_eq!(drive.trend, Trend::Cooling);

        // Exactly on the setpoint: everything off.
        reg.set_desired(temp(17));
        let drive = reg.decide();
        assert_eq!(drive.lamp, 0);
        assert_eq!(drive.peltier, 0);
        assert_eq!(drive.trend, Trend::AtTarget);
    }

    #[test]
    fn boot_state_matches_the_banner() {
        let reg = Regulator::new();
        assert_eq!(reg.mode(), Mode::Automatic);
        assert_eq!(reg.temperature(), temp(15));
        assert_eq!(reg.desired(), temp(25));
    }
}
