//! Hardware-agnostic control logic for the thermostat firmware.
//!
//! Everything in this crate is pure state-machine code with no dependency on
//! a HAL or an executor, so it builds and tests on the host:
//!
//! - Regulator mode/state machine (triangular-wave simulation, drive decision)
//! - Button debounce guard
//! - Two-digit manual setpoint protocol
//! - Serial status-line rendering

#![no_std]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod debounce;
pub mod regulator;
pub mod report;
pub mod setpoint;

use fixed::types::I28F4;

/// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
/// This gives us a precision of 0.0625 degrees Celsius & a range of
/// (-2^27, 2^27 - 0.0625). Every temperature this system produces (2-degree
/// ramp steps, whole-degree setpoints) is exact in it, so comparisons against
/// the ramp endpoints and the manual setpoint are reliable.
pub type Temperature = I28F4;
