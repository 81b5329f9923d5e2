#![feature(type_alias_impl_trait)]
#![no_std]
#![no_main]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(dead_code, clippy::module_name_repetitions, clippy::wildcard_imports)]

mod actuator;
mod console;
mod control;

use defmt_rtt as _;
use panic_probe as _;

/// EXTI line the mode button drives (PB5, falling edge).
const BUTTON_LINE: u32 = 1 << 5;

#[rtic::app(device = stm32f0xx_hal::pac, dispatchers = [USART1, TIM14])]
mod app {
    use defmt::*;
    use rtic_monotonics::{
        stm32::{Tim2 as Mono, *},
        Monotonic,
    };
    use rtic_sync::{
        channel::{Receiver, Sender},
        make_channel,
    };
    use stm32f0xx_hal::{
        gpio::{
            gpioa::{PA15, PA2},
            Alternate, Output, Pin, PushPull, AF1,
        },
        pac::{Interrupt, EXTI, IWDG, TIM1, USART2},
        prelude::*,
        pwm::{self, PwmChannels, C1, C2},
        serial::{Event, Serial},
        watchdog::Watchdog,
    };
    use thermostat_core::{debounce::Debouncer, regulator::Regulator};

    use crate::{actuator::PwmActuator, console, control, BUTTON_LINE};

    #[shared]
    struct Shared {
        usart: Serial<USART2, PA2<Alternate<AF1>>, PA15<Alternate<AF1>>>,
    }

    #[local]
    struct Local {
        // Button ISR
        exti: EXTI,
        debounce: Debouncer,
        toggle_tx: Sender<'static, u64, { control::TOGGLE_QUEUE }>,

        // USART RX ISR
        byte_tx: Sender<'static, u8, { control::RX_QUEUE }>,

        // Control task
        regulator: Regulator,
        lamp: PwmActuator<PwmChannels<TIM1, C1>>,
        peltier: PwmActuator<PwmChannels<TIM1, C2>>,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        // SYSCFG clock for the EXTI line routing below, while the raw RCC
        // is still around.
        cx.device.RCC.apb2enr.modify(|_, w| w.syscfgen().set_bit());

        // Set system clock to 24 MHz
        let mut rcc = cx
            .device
            .RCC
            .configure()
            .hsi48()
            .sysclk(24.mhz())
            .pclk(24.mhz())
            .hclk(24.mhz())
            .freeze(&mut cx.device.FLASH);

        trace!("sysclk: {}", rcc.clocks.sysclk().0);

        // Enable tim2 monotonic
        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Mono::start(24_000_000, token);

        // Setup GPIO
        let gpioa = cx.device.GPIOA.split(&mut rcc);
        let gpiob = cx.device.GPIOB.split(&mut rcc);

        // Status LED doubles as the watchdog feeder
        let pb3 = gpiob.pb3.into_push_pull_output(&cx.cs);
        let _ = heartbeat::spawn(pb3.downgrade(), cx.device.IWDG);

        // Setup USART & USART interrupt
        let mut usart = Serial::usart2(
            cx.device.USART2,
            (
                gpioa.pa2.into_alternate_af1(&cx.cs),
                gpioa.pa15.into_alternate_af1(&cx.cs),
            ),
            115_200.bps(),
            &mut rcc,
        );
        usart.listen(Event::Rxne);
        rtic::pend(Interrupt::USART2);

        // Actuator PWM: TIM1 CH1 drives the lamp, CH2 the Peltier element
        let pwm_pins = (
            gpioa.pa8.into_alternate_af2(&cx.cs),
            gpioa.pa9.into_alternate_af2(&cx.cs),
        );
        let (lamp_pwm, peltier_pwm) = pwm::tim1(cx.device.TIM1, pwm_pins, &mut rcc, 1.khz());
        let lamp = PwmActuator::new(lamp_pwm);
        let peltier = PwmActuator::new(peltier_pwm);

        // Mode button on PB5. The pin handle is not needed after
        // configuration; the mode sticks.
        let _button = gpiob.pb5.into_pull_up_input(&cx.cs);

        // Route EXTI line 5 to port B (EXTICR2[7:4] = 0b0001), then unmask
        // the line and arm the falling-edge trigger.
        cx.device
            .SYSCFG
            .exticr2
            .modify(|r, w| unsafe { w.bits((r.bits() & !0x00F0) | 0x0010) });
        let exti = cx.device.EXTI;
        exti.imr
            .modify(|r, w| unsafe { w.bits(r.bits() | BUTTON_LINE) });
        exti.ftsr
            .modify(|r, w| unsafe { w.bits(r.bits() | BUTTON_LINE) });

        // Queues out of the interrupt handlers
        let (toggle_tx, toggle_rx) = make_channel!(u64, { control::TOGGLE_QUEUE });
        let (byte_tx, byte_rx) = make_channel!(u8, { control::RX_QUEUE });

        // Launch the regulation cycle
        let _ = control_loop::spawn(toggle_rx, byte_rx);

        (
            Shared { usart },
            Local {
                exti,
                debounce: Debouncer::new(),
                toggle_tx,
                byte_tx,
                regulator: Regulator::new(),
                lamp,
                peltier,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(priority = 1)]
    async fn heartbeat(_: heartbeat::Context, mut led: Pin<Output<PushPull>>, wdg: IWDG) {
        // Feed the IWDG at a quarter of its timeout while blinking the
        // status LED.
        let mut wdg = Watchdog::new(wdg);
        wdg.start(1.hz());

        let mut now = Mono::now();
        loop {
            unwrap!(led.toggle());
            wdg.feed();
            now += 250.millis();
            Mono::delay_until(now).await;
        }
    }

    #[task(priority = 2, local = [regulator, lamp, peltier], shared = [usart])]
    async fn control_loop(
        cx: control_loop::Context,
        toggle_rx: Receiver<'static, u64, { control::TOGGLE_QUEUE }>,
        byte_rx: Receiver<'static, u8, { control::RX_QUEUE }>,
    ) {
        crate::control::run(cx, toggle_rx, byte_rx).await;
    }

    #[task(binds = EXTI4_15, local = [exti, debounce, toggle_tx])]
    fn button(cx: button::Context) {
        // Acknowledge the edge first (write-1-to-clear).
        cx.local.exti.pr.write(|w| unsafe { w.bits(BUTTON_LINE) });

        let now_ms = Mono::now().duration_since_epoch().to_millis();
        if cx.local.debounce.accept(now_ms) {
            if cx.local.toggle_tx.try_send(now_ms).is_err() {
                warn!("toggle queue full, press at {=u64} ms dropped", now_ms);
            }
        } else {
            trace!("button bounce at {=u64} ms", now_ms);
        }
    }

    #[task(binds = USART2, shared = [usart], local = [byte_tx])]
    fn usart2(mut cx: usart2::Context) {
        // Drain all available bytes toward the control task
        cx.shared.usart.lock(|usart| loop {
            match usart.read() {
                Ok(byte) => {
                    if cx.local.byte_tx.try_send(byte).is_err() {
                        warn!("rx queue full, byte dropped");
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    warn!("usart rx error: {=str}", console::rx_error_str(&e));
                }
            }
        });
    }

    timestamp!("{=u64:us}", {
        Mono::now().duration_since_epoch().to_micros()
    });
}
