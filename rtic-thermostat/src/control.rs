//! Control task: the fixed-period regulation cycle.
//!
//! One cycle advances the simulated temperature, decides the actuator
//! intensities, and reports status on the console. Between cycles the task
//! sleeps on the toggle queue, so button presses are applied at a safe point
//! instead of mutating regulator state from the interrupt handler. Entering
//! manual mode reads the two-digit setpoint here, bounded by a deadline,
//! never inside an interrupt.

use defmt::{debug, error, info, trace, unreachable, warn};
use rtic_monotonics::{
    stm32::{Tim2 as Mono, *},
    Monotonic, TimeoutError,
};
use rtic_sync::channel::Receiver;
use thermostat_core::{
    regulator::Mode,
    report,
    setpoint::{self, DigitReader, DEFAULT_SETPOINT},
    Temperature,
};

use crate::{actuator::Actuator, console};

/// Control cycle period.
const TICK_PERIOD_MS: u32 = 2000;
/// Manual setpoint entry deadline; on expiry the default applies.
const SETPOINT_TIMEOUT_MS: u32 = 30_000;

/// Queued mode-toggle events (press timestamps, ms since boot).
pub const TOGGLE_QUEUE: usize = 4;
/// Raw bytes forwarded from the USART RX interrupt.
pub const RX_QUEUE: usize = 16;

type ToggleRx = Receiver<'static, u64, TOGGLE_QUEUE>;
type ByteRx = Receiver<'static, u8, RX_QUEUE>;

#[cfg_attr(feature = "sizing", inline(never))]
pub async fn run(
    mut cx: crate::app::control_loop::Context<'_>,
    mut toggle_rx: ToggleRx,
    mut byte_rx: ByteRx,
) {
    if let Err(e) = cx
        .shared
        .usart
        .lock(|usart| console::write_str(usart, report::BANNER))
    {
        error!("banner write failed: {=str}", e.as_str());
    }

    let mut next = Mono::now();
    loop {
        trace!("control tick");
        if let Err(e) = tick(&mut cx) {
            error!("control tick failed: {=str}", e.as_str());
        }

        next += TICK_PERIOD_MS.millis();

        // Sleep until the next cycle, applying mode toggles as they arrive.
        while let Ok(event) = Mono::timeout_at(next, toggle_rx.recv()).await {
            match event {
                Ok(pressed_ms) => {
                    trace!("mode toggle from press at {=u64} ms", pressed_ms);
                    if let Err(e) = apply_toggle(&mut cx, &mut byte_rx).await {
                        error!("mode change reporting failed: {=str}", e.as_str());
                    }
                    // A setpoint read may have overrun the cycle; restart the
                    // cadence instead of replaying the missed ticks.
                    let now = Mono::now();
                    if next < now {
                        next = now;
                    }
                }
                Err(_) => unreachable!("button isr sender dropped"),
            }
        }
    }
}

/// One regulation cycle: step the simulation, drive the actuators, report.
fn tick(cx: &mut crate::app::control_loop::Context<'_>) -> Result<(), console::Error> {
    let regulator = &mut *cx.local.regulator;

    regulator.step();
    let drive = regulator.decide();

    cx.local.lamp.set_intensity(drive.lamp)?;
    cx.local.peltier.set_intensity(drive.peltier)?;

    debug!(
        "mode: {}, temp: {=f32}, lamp: {=u8}, peltier: {=u8}",
        regulator.mode(),
        regulator.temperature().to_num::<f32>(),
        drive.lamp,
        drive.peltier
    );

    let mut line: heapless::String<48> = heapless::String::new();
    report::write_temp_line(&mut line, regulator.temperature())?;

    cx.shared.usart.lock(|usart| -> Result<(), console::Error> {
        console::write_str(usart, report::trend_line(regulator.mode(), drive.trend))?;
        console::write_str(usart, line.as_str())
    })
}

/// Apply one queued button press: flip the mode and run the entry actions.
async fn apply_toggle(
    cx: &mut crate::app::control_loop::Context<'_>,
    byte_rx: &mut ByteRx,
) -> Result<(), console::Error> {
    match cx.local.regulator.toggle_mode() {
        Mode::Manual => {
            info!("manual mode enabled");
            cx.shared.usart.lock(|usart| -> Result<(), console::Error> {
                console::write_str(usart, report::MANUAL_ENABLED)?;
                console::write_str(usart, report::SETPOINT_PROMPT)
            })?;

            // Drop anything typed before the prompt.
            while byte_rx.try_recv().is_ok() {}

            let desired = read_setpoint(cx, byte_rx).await?;
            cx.local.regulator.set_desired(desired);
        }
        Mode::Automatic => {
            info!("automatic mode enabled");
            cx.shared
                .usart
                .lock(|usart| console::write_str(usart, report::AUTOMATIC_ENABLED))?;
        }
    }
    Ok(())
}

/// Read the two-digit setpoint, reporting the outcome on the console.
///
/// Falls back to [`DEFAULT_SETPOINT`] on an out-of-range value or when the
/// deadline passes without a complete entry.
#[cfg_attr(feature = "sizing", inline(never))]
async fn read_setpoint(
    cx: &mut crate::app::control_loop::Context<'_>,
    byte_rx: &mut ByteRx,
) -> Result<Temperature, console::Error> {
    let deadline = Mono::now() + SETPOINT_TIMEOUT_MS.millis();
    let mut digits = DigitReader::new();

    let entered = loop {
        match Mono::timeout_at(deadline, byte_rx.recv()).await {
            Ok(Ok(byte)) => {
                if let Some(value) = digits.push(byte) {
                    break Some(value);
                }
            }
            Ok(Err(_)) => unreachable!("usart rx sender dropped"),
            Err(TimeoutError) => break None,
        }
    };

    let desired = match entered {
        Some(raw) => match setpoint::validate(raw) {
            Ok(value) => {
                info!("setpoint accepted: {=u8}", raw);
                let mut line: heapless::String<48> = heapless::String::new();
                report::write_setpoint_line(&mut line, value)?;
                cx.shared
                    .usart
                    .lock(|usart| console::write_str(usart, line.as_str()))?;
                value
            }
            Err(e) => {
                warn!("{=str}: {=u8}", e.as_str(), raw);
                cx.shared
                    .usart
                    .lock(|usart| console::write_str(usart, report::SETPOINT_INVALID))?;
                DEFAULT_SETPOINT
            }
        },
        None => {
            warn!("setpoint entry timed out");
            cx.shared
                .usart
                .lock(|usart| console::write_str(usart, report::SETPOINT_MISSING))?;
            DEFAULT_SETPOINT
        }
    };

    Ok(desired)
}
