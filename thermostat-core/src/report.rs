//! Serial status reporting: fixed phrases and temperature rendering.
//!
//! Rendering goes through `core::fmt::Write` without pulling in float
//! formatting; temperatures print with one decimal digit, which is exact for
//! every value the regulator produces.

use core::fmt::{self, Write};

use num_traits::AsPrimitive;

use crate::{
    regulator::{Mode, Trend},
    Temperature,
};

/// Sent once when the control task starts.
pub const BANNER: &str = "System started in automatic mode.\r\n";

pub const MANUAL_ENABLED: &str = "Manual mode enabled.\r\n";
pub const AUTOMATIC_ENABLED: &str = "Automatic mode enabled.\r\n";
pub const SETPOINT_PROMPT: &str = "Enter the desired temperature (2 digits, e.g. 15, 25): ";
pub const SETPOINT_INVALID: &str = "Invalid value! Using the 25.0\u{b0}C default.\r\n";
pub const SETPOINT_MISSING: &str = "No input received. Using the 25.0\u{b0}C default.\r\n";

/// Directional status line for one control cycle.
#[must_use]
pub const fn trend_line(mode: Mode, trend: Trend) -> &'static str {
    match (mode, trend) {
        (Mode::Automatic, Trend::Heating | Trend::AtTarget) => "Heating (automatic mode)...\r\n",
        (Mode::Automatic, Trend::Cooling) => "Cooling (automatic mode)...\r\n",
        (Mode::Manual, Trend::Heating) => "Heating (manual mode)...\r\n",
        (Mode::Manual, Trend::Cooling) => "Cooling (manual mode)...\r\n",
        (Mode::Manual, Trend::AtTarget) => "Desired temperature reached.\r\n",
    }
}

/// "Current temperature: 17.0°C" line.
///
/// # Errors
///
/// Propagates the sink's `fmt::Error` (for a stack buffer: overflow).
pub fn write_temp_line<W: Write>(sink: &mut W, temp: Temperature) -> fmt::Result {
    sink.write_str("Current temperature: ")?;
    write_temp(sink, temp)?;
    sink.write_str("\u{b0}C\r\n")
}

/// Confirmation line after a setpoint was accepted.
///
/// # Errors
///
/// Propagates the sink's `fmt::Error`.
pub fn write_setpoint_line<W: Write>(sink: &mut W, desired: Temperature) -> fmt::Result {
    sink.write_str("Desired temperature set to ")?;
    write_temp(sink, desired)?;
    sink.write_str("\u{b0}C.\r\n")
}

/// Render a temperature with one decimal digit (truncated).
///
/// # Errors
///
/// Propagates the sink's `fmt::Error`.
pub fn write_temp<W: Write>(sink: &mut W, temp: Temperature) -> fmt::Result {
    if temp.is_negative() {
        sink.write_char('-')?;
    }

    let bits = temp.to_bits().unsigned_abs();
    let whole = bits >> Temperature::FRAC_NBITS;
    let frac = bits & ((1u32 << Temperature::FRAC_NBITS) - 1);
    let tenths = (frac * 10) >> Temperature::FRAC_NBITS;

    write_uint(sink, whole)?;
    sink.write_char('.')?;
    write_uint(sink, tenths)
}

fn write_uint<W: Write>(sink: &mut W, mut num: u32) -> fmt::Result {
    const BUF_SIZE: usize = 10;

    let mut buf = [0u8; BUF_SIZE];
    let mut idx = 0;

    loop {
        let digit: u8 = (num % 10).as_();
        num /= 10;

        buf[BUF_SIZE - idx - 1] = b'0' + digit;
        idx += 1;

        if num == 0 {
            break;
        }
    }

    for &b in &buf[BUF_SIZE - idx..] {
        sink.write_char(char::from(b))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use heapless::String;

    use super::*;

    fn render(temp: Temperature) -> String<16> {
        let mut out = String::new();
        write_temp(&mut out, temp).unwrap();
        out
    }

    #[test]
    fn whole_degrees_render_with_one_decimal() {
        assert_eq!(render(Temperature::from_num(17)).as_str(), "17.0");
        assert_eq!(render(Temperature::from_num(0)).as_str(), "0.0");
        assert_eq!(render(Temperature::from_num(25)).as_str(), "25.0");
    }

    #[test]
    fn halves_and_negatives_render() {
        assert_eq!(render(Temperature::from_num(19.5)).as_str(), "19.5");
        assert_eq!(render(Temperature::from_num(-3.5)).as_str(), "-3.5");
    }

    #[test]
    fn sub_tenth_fractions_truncate() {
        assert_eq!(render(Temperature::from_num(20.0625)).as_str(), "20.0");
        assert_eq!(render(Temperature::from_num(20.9375)).as_str(), "20.9");
    }

    #[test]
    fn temp_line_has_units_and_line_ending() {
        let mut out: String<48> = String::new();
        write_temp_line(&mut out, Temperature::from_num(21)).unwrap();
        assert_eq!(out.as_str(), "Current temperature: 21.0\u{b0}C\r\n");
    }

    #[test]
    fn setpoint_line_echoes_the_value() {
        let mut out: String<48> = String::new();
        write_setpoint_line(&mut out, Temperature::from_num(18)).unwrap();
        assert_eq!(out.as_str(), "Desired temperature set to 18.0\u{b0}C.\r\n");
    }

    #[test]
    fn overflowing_sink_reports_an_error() {
        let mut out: String<4> = String::new();
        assert!(write_temp_line(&mut out, Temperature::from_num(21)).is_err());
    }

    #[test]
    fn trend_lines_cover_both_modes() {
        assert_eq!(
            trend_line(Mode::Automatic, Trend::Heating),
            "Heating (automatic mode)...\r\n"
        );
        assert_eq!(
            trend_line(Mode::Manual, Trend::Cooling),
            "Cooling (manual mode)...\r\n"
        );
        assert_eq!(
            trend_line(Mode::Manual, Trend::AtTarget),
            "Desired temperature reached.\r\n"
        );
    }
}
