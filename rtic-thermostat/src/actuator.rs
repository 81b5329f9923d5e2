//! PWM-driven actuator outputs (heat lamp and Peltier element).

use core::convert::Infallible;

use embedded_hal::PwmPin;

use thermostat_core::regulator::FULL_DRIVE;

/// A duty-cycle driven output channel.
pub trait Actuator {
    type Error;

    /// Drive the actuator at `percent` of full scale (0..=100, linear).
    fn set_intensity(&mut self, percent: u8) -> Result<(), Self::Error>;
}

/// Actuator backed by a hardware PWM channel.
pub struct PwmActuator<P: PwmPin<Duty = u16>> {
    channel: P,
}

impl<P: PwmPin<Duty = u16>> PwmActuator<P> {
    /// Takes over the channel: enables it parked at zero intensity.
    pub fn new(mut channel: P) -> Self {
        channel.set_duty(0);
        channel.enable();
        Self { channel }
    }
}

impl<P: PwmPin<Duty = u16>> Actuator for PwmActuator<P> {
    type Error = Infallible;

    fn set_intensity(&mut self, percent: u8) -> Result<(), Self::Error> {
        let percent = percent.min(FULL_DRIVE);
        let duty =
            u32::from(self.channel.get_max_duty()) * u32::from(percent) / u32::from(FULL_DRIVE);
        self.channel.set_duty(duty as u16);
        Ok(())
    }
}
