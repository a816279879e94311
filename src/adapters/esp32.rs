//! ESP32 platform adapter.
//!
//! Implements the port traits over raw ESP-IDF sys calls:
//!
//! | Port        | Peripheral                                  |
//! |-------------|---------------------------------------------|
//! | `GpioPort`  | `gpio_config`, GPIO ISR service, ADC oneshot |
//! | `PwmPort`   | LEDC (low-speed mode), `esp_timer` tone stop |
//! | `TimerPort` | `esp_timer` (task dispatch)                 |
//!
//! Peripheral state (LEDC allocations, ISR handler boxes, ADC units) is
//! process-wide, so [`Esp32Platform`] is a zero-sized handle that can be
//! cloned into every driver.  Port calls are infallible; a failing
//! ESP-IDF call is logged with its error code and otherwise ignored.

use core::cell::RefCell;
use core::ffi::c_void;
use core::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use critical_section::Mutex;
use esp_idf_svc::sys::*;
use heapless::FnvIndexMap;
use log::{error, info, warn};

use crate::app::ports::{
    Edge, GpioPort, IsrHandler, Pin, PinMode, PinState, PwmPort, TimerPort,
};
use crate::error::Error;

const LEDC_MODE: ledc_mode_t = ledc_mode_t_LEDC_LOW_SPEED_MODE;
const LEDC_CHANNELS: usize = 8;
const LEDC_TIMERS: usize = 4;
const TONE_RESOLUTION_BITS: u8 = 10;

/// Log a non-OK return code.  `true` on success.
fn check(op: &'static str, code: esp_err_t) -> bool {
    if code == ESP_OK as esp_err_t {
        return true;
    }
    error!("esp32: {}", Error::Platform { op, code });
    false
}

// ── Bring-up ──────────────────────────────────────────────────

/// Link patches, install the logger and the GPIO ISR service.
pub fn bootstrap() -> anyhow::Result<Esp32Platform> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("firewatch v{} starting", env!("CARGO_PKG_VERSION"));

    // SAFETY: idempotent; ESP_ERR_INVALID_STATE means already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as esp_err_t && ret != ESP_ERR_INVALID_STATE as esp_err_t {
        return Err(Error::Platform { op: "gpio_install_isr_service", code: ret }.into());
    }
    info!("esp32: GPIO ISR service ready");
    Ok(Esp32Platform)
}

// ── Shared peripheral state ───────────────────────────────────

/// Raw ADC unit handle.  Only dereferenced by the ADC driver.
struct AdcUnit(adc_oneshot_unit_handle_t);

// SAFETY: the handle is an opaque driver token; the driver serialises
// access internally and we only touch it inside a critical section.
unsafe impl Send for AdcUnit {}

#[derive(Clone, Copy)]
struct LedcTimer {
    freq_hz: u32,
    resolution_bits: u8,
    users: u8,
    /// Tone timers get their frequency rewritten and are never shared.
    exclusive: bool,
}

#[derive(Clone, Copy)]
struct LedcBinding {
    channel: ledc_channel_t,
    timer: ledc_timer_t,
    resolution_bits: u8,
}

struct LedcState {
    timers: [Option<LedcTimer>; LEDC_TIMERS],
    channels: FnvIndexMap<Pin, LedcBinding, LEDC_CHANNELS>,
}

impl LedcState {
    const fn new() -> Self {
        Self {
            timers: [None; LEDC_TIMERS],
            channels: FnvIndexMap::new(),
        }
    }

    fn free_channel(&self) -> Option<ledc_channel_t> {
        (0..LEDC_CHANNELS as ledc_channel_t)
            .find(|ch| !self.channels.values().any(|b| b.channel == *ch))
    }

    /// Reuse a compatible shared timer or claim a free one.
    fn claim_timer(&mut self, freq_hz: u32, resolution_bits: u8, exclusive: bool) -> Option<(ledc_timer_t, bool)> {
        if !exclusive {
            for (i, slot) in self.timers.iter_mut().enumerate() {
                if let Some(t) = slot {
                    if !t.exclusive && t.freq_hz == freq_hz && t.resolution_bits == resolution_bits {
                        t.users += 1;
                        return Some((i as ledc_timer_t, false));
                    }
                }
            }
        }
        let i = self.timers.iter().position(Option::is_none)?;
        self.timers[i] = Some(LedcTimer { freq_hz, resolution_bits, users: 1, exclusive });
        Some((i as ledc_timer_t, true))
    }

    /// Drop one user; `true` when the timer is now unused.
    fn release_timer(&mut self, timer: ledc_timer_t) -> bool {
        let Some(slot) = self.timers.get_mut(timer as usize) else {
            return false;
        };
        match slot {
            Some(t) if t.users > 1 => {
                t.users -= 1;
                false
            }
            Some(_) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

static LEDC: Mutex<RefCell<LedcState>> = Mutex::new(RefCell::new(LedcState::new()));
static ADC_UNITS: Mutex<RefCell<[Option<AdcUnit>; 2]>> = Mutex::new(RefCell::new([None, None]));
/// Bit n set once GPIO n's ADC channel has been configured.
static ADC_CONFIGURED: AtomicU64 = AtomicU64::new(0);

/// Boxed pin handlers; the box address is the ISR argument.
static PIN_HANDLERS: Mutex<RefCell<FnvIndexMap<Pin, Box<IsrHandler>, 16>>> =
    Mutex::new(RefCell::new(FnvIndexMap::new()));

/// One-shot `esp_timer`s that end a timed tone.
struct ToneStop(esp_timer_handle_t);

// SAFETY: esp_timer handles are usable from any task.
unsafe impl Send for ToneStop {}

static TONE_STOPS: Mutex<RefCell<FnvIndexMap<Pin, ToneStop, 4>>> =
    Mutex::new(RefCell::new(FnvIndexMap::new()));

// ── Esp32Platform ─────────────────────────────────────────────

/// Handle to the on-chip GPIO, ADC and LEDC peripherals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Esp32Platform;

unsafe extern "C" fn gpio_trampoline(arg: *mut c_void) {
    // SAFETY: `arg` points into a Box held in PIN_HANDLERS, removed only
    // after gpio_isr_handler_remove has unhooked this trampoline.
    let handler = unsafe { &*(arg as *const IsrHandler) };
    handler();
}

unsafe extern "C" fn tone_stop_trampoline(arg: *mut c_void) {
    let pin = arg as usize as Pin;
    Esp32Platform.set_duty(pin, 0);
}

impl Esp32Platform {
    fn binding(pin: Pin) -> Option<LedcBinding> {
        critical_section::with(|cs| LEDC.borrow_ref(cs).channels.get(&pin).copied())
    }

    fn bind_ledc(&self, pin: Pin, freq_hz: u32, resolution_bits: u8, exclusive: bool) -> Option<LedcBinding> {
        let claimed = critical_section::with(|cs| {
            let mut ledc = LEDC.borrow_ref_mut(cs);
            let channel = ledc.free_channel()?;
            let Some((timer, fresh)) = ledc.claim_timer(freq_hz, resolution_bits, exclusive) else {
                return None;
            };
            let binding = LedcBinding { channel, timer, resolution_bits };
            if ledc.channels.insert(pin, binding).is_err() {
                ledc.release_timer(timer);
                return None;
            }
            Some((binding, fresh))
        });
        let Some((binding, fresh)) = claimed else {
            error!("esp32: no LEDC channel/timer left for pin {}", pin);
            return None;
        };

        if fresh {
            let timer_cfg = ledc_timer_config_t {
                speed_mode: LEDC_MODE,
                timer_num: binding.timer,
                duty_resolution: ledc_timer_bit_t::from(resolution_bits),
                freq_hz,
                clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
                ..Default::default()
            };
            // SAFETY: config struct lives for the call.
            check("ledc_timer_config", unsafe { ledc_timer_config(&timer_cfg) });
        }
        let chan_cfg = ledc_channel_config_t {
            speed_mode: LEDC_MODE,
            channel: binding.channel,
            timer_sel: binding.timer,
            gpio_num: i32::from(pin),
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: as above.
        check("ledc_channel_config", unsafe { ledc_channel_config(&chan_cfg) });
        Some(binding)
    }

    fn set_duty(&self, pin: Pin, value: u16) {
        let Some(b) = Self::binding(pin) else {
            warn!("esp32: duty write on unbound pin {}", pin);
            return;
        };
        let max = (1u32 << b.resolution_bits) - 1;
        // SAFETY: channel configured in bind_ledc.
        unsafe {
            check("ledc_set_duty", ledc_set_duty(LEDC_MODE, b.channel, u32::from(value).min(max)));
            check("ledc_update_duty", ledc_update_duty(LEDC_MODE, b.channel));
        }
    }

    fn cancel_tone_stop(pin: Pin) {
        let stop = critical_section::with(|cs| TONE_STOPS.borrow_ref_mut(cs).remove(&pin));
        if let Some(ToneStop(handle)) = stop {
            // SAFETY: handle created in arm_tone_stop; INVALID_STATE = not running.
            unsafe {
                esp_timer_stop(handle);
                check("esp_timer_delete", esp_timer_delete(handle));
            }
        }
    }

    fn arm_tone_stop(pin: Pin, duration_ms: u32) {
        let args = esp_timer_create_args_t {
            callback: Some(tone_stop_trampoline),
            arg: usize::from(pin) as *mut c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"tone_stop".as_ptr(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlive the call; handle is written on success.
        if !check("esp_timer_create", unsafe { esp_timer_create(&args, &mut handle) }) {
            return;
        }
        // SAFETY: freshly created handle.
        check("esp_timer_start_once", unsafe {
            esp_timer_start_once(handle, u64::from(duration_ms) * 1000)
        });
        let rejected = critical_section::with(|cs| TONE_STOPS.borrow_ref_mut(cs).insert(pin, ToneStop(handle)).err())
            .map(|(_, stop)| stop);
        if let Some(ToneStop(handle)) = rejected {
            warn!("esp32: tone stop table full, pin {} plays until stopped", pin);
            // SAFETY: handle never shared.
            unsafe {
                esp_timer_stop(handle);
                esp_timer_delete(handle);
            }
        }
    }

    fn adc_read(pin: Pin) -> u16 {
        let mut unit: adc_unit_t = 0;
        let mut channel: adc_channel_t = 0;
        // SAFETY: out-params are valid for the call.
        if !check("adc_oneshot_io_to_channel", unsafe {
            adc_oneshot_io_to_channel(i32::from(pin), &mut unit, &mut channel)
        }) {
            return 0;
        }

        critical_section::with(|cs| {
            let mut units = ADC_UNITS.borrow_ref_mut(cs);
            let Some(slot) = units.get_mut(unit as usize) else {
                return 0;
            };
            if slot.is_none() {
                let init_cfg = adc_oneshot_unit_init_cfg_t {
                    unit_id: unit,
                    ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                    ..Default::default()
                };
                let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
                // SAFETY: handle written on success only.
                if !check("adc_oneshot_new_unit", unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) }) {
                    return 0;
                }
                *slot = Some(AdcUnit(handle));
            }
            let Some(AdcUnit(handle)) = slot else {
                return 0;
            };

            let bit = 1u64 << pin;
            if ADC_CONFIGURED.load(Ordering::Relaxed) & bit == 0 {
                let chan_cfg = adc_oneshot_chan_cfg_t {
                    atten: adc_atten_t_ADC_ATTEN_DB_12,
                    bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
                };
                // SAFETY: handle valid for the process lifetime.
                if !check("adc_oneshot_config_channel", unsafe {
                    adc_oneshot_config_channel(*handle, channel, &chan_cfg)
                }) {
                    return 0;
                }
                ADC_CONFIGURED.fetch_or(bit, Ordering::Relaxed);
            }

            let mut raw: i32 = 0;
            // SAFETY: as above.
            if !check("adc_oneshot_read", unsafe { adc_oneshot_read(*handle, channel, &mut raw) }) {
                return 0;
            }
            raw.max(0) as u16
        })
    }
}

impl GpioPort for Esp32Platform {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        let (gpio_mode, pull_up) = match mode {
            PinMode::Input => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
            PinMode::InputPullup => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_ENABLE),
            // Input+output so digital_read reflects the driven level.
            PinMode::Output => (gpio_mode_t_GPIO_MODE_INPUT_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
        };
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode,
            pull_up_en: pull_up,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: config struct lives for the call.
        check("gpio_config", unsafe { gpio_config(&cfg) });
    }

    fn digital_read(&self, pin: Pin) -> PinState {
        // SAFETY: register read.
        PinState::from(unsafe { gpio_get_level(i32::from(pin)) } != 0)
    }

    fn digital_write(&mut self, pin: Pin, level: PinState) {
        let high = u32::from(level == PinState::High);
        // SAFETY: register write on a configured output.
        check("gpio_set_level", unsafe { gpio_set_level(i32::from(pin), high) });
    }

    fn analog_read(&self, pin: Pin) -> u16 {
        Self::adc_read(pin)
    }

    fn attach_pin_interrupt(&mut self, pin: Pin, edge: Edge, handler: IsrHandler) {
        self.detach_pin_interrupt(pin);

        let boxed = Box::new(handler);
        let arg = (&*boxed as *const IsrHandler).cast_mut().cast::<c_void>();
        let intr = match edge {
            Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
            Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };

        let stored = critical_section::with(|cs| PIN_HANDLERS.borrow_ref_mut(cs).insert(pin, boxed).is_ok());
        if !stored {
            error!("esp32: pin handler table full, pin {} not armed", pin);
            return;
        }
        let gpio = i32::from(pin);
        // SAFETY: `arg` stays valid until detach_pin_interrupt removes the
        // ISR before dropping the box.
        unsafe {
            check("gpio_set_intr_type", gpio_set_intr_type(gpio, intr));
            check("gpio_isr_handler_add", gpio_isr_handler_add(gpio, Some(gpio_trampoline), arg));
            check("gpio_intr_enable", gpio_intr_enable(gpio));
        }
    }

    fn detach_pin_interrupt(&mut self, pin: Pin) {
        let gpio = i32::from(pin);
        // SAFETY: removing an absent handler is a no-op in the driver.
        unsafe {
            gpio_intr_disable(gpio);
            gpio_isr_handler_remove(gpio);
        }
        critical_section::with(|cs| {
            PIN_HANDLERS.borrow_ref_mut(cs).remove(&pin);
        });
    }
}

impl PwmPort for Esp32Platform {
    fn attach_pwm(&mut self, pin: Pin, freq_hz: u32, resolution_bits: u8) {
        if Self::binding(pin).is_some() {
            self.detach_pwm(pin);
        }
        if self.bind_ledc(pin, freq_hz, resolution_bits, false).is_some() {
            info!("esp32: LEDC pin {} @ {}Hz/{}bit", pin, freq_hz, resolution_bits);
        }
    }

    fn detach_pwm(&mut self, pin: Pin) {
        Self::cancel_tone_stop(pin);
        let released = critical_section::with(|cs| {
            let mut ledc = LEDC.borrow_ref_mut(cs);
            let b = ledc.channels.remove(&pin)?;
            Some((b, ledc.release_timer(b.timer)))
        });
        let Some((b, timer_free)) = released else {
            return;
        };
        // SAFETY: channel/timer were configured by bind_ledc.
        unsafe {
            check("ledc_stop", ledc_stop(LEDC_MODE, b.channel, 0));
            if timer_free {
                check("ledc_timer_pause", ledc_timer_pause(LEDC_MODE, b.timer));
            }
        }
    }

    fn write_duty_cycle(&mut self, pin: Pin, value: u16) {
        self.set_duty(pin, value);
    }

    fn write_tone(&mut self, pin: Pin, frequency_hz: u32, duration_ms: u32) {
        Self::cancel_tone_stop(pin);
        let binding = match Self::binding(pin) {
            Some(b) => Some(b),
            None => self.bind_ledc(pin, frequency_hz, TONE_RESOLUTION_BITS, true),
        };
        let Some(b) = binding else {
            return;
        };
        // SAFETY: timer configured in bind_ledc.
        check("ledc_set_freq", unsafe { ledc_set_freq(LEDC_MODE, b.timer, frequency_hz) });
        // 50 % square wave.
        self.set_duty(pin, 1u16 << (b.resolution_bits - 1));
        if duration_ms > 0 {
            Self::arm_tone_stop(pin, duration_ms);
        }
    }

    fn stop_tone(&mut self, pin: Pin) {
        Self::cancel_tone_stop(pin);
        if Self::binding(pin).is_some() {
            self.set_duty(pin, 0);
        }
    }
}

// ── Esp32Timer ────────────────────────────────────────────────

const TIMER_SLOTS: usize = 4;

/// Current handler per timer slot.  The esp_timer argument is the slot
/// index, so a callback dispatched after detach finds `None`.  Handlers
/// run inside the critical section, which makes `detach_interrupt` wait
/// for a tick that is already executing.
static TIMER_HANDLERS: [Mutex<RefCell<Option<IsrHandler>>>; TIMER_SLOTS] =
    [const { Mutex::new(RefCell::new(None)) }; TIMER_SLOTS];
static TIMER_SLOTS_USED: AtomicU8 = AtomicU8::new(0);

unsafe extern "C" fn timer_trampoline(arg: *mut c_void) {
    let slot = arg as usize;
    critical_section::with(|cs| {
        let handler = TIMER_HANDLERS.get(slot).and_then(|h| h.borrow_ref(cs).clone());
        if let Some(handler) = handler {
            handler();
        }
    });
}

/// Periodic timer on `esp_timer`.  Callbacks run in the esp_timer task.
pub struct Esp32Timer {
    slot: usize,
    handle: esp_timer_handle_t,
    basis_hz: u32,
}

impl Esp32Timer {
    pub fn new() -> crate::error::Result<Self> {
        let slot = (0..TIMER_SLOTS)
            .find(|i| {
                let bit = 1u8 << i;
                TIMER_SLOTS_USED.fetch_or(bit, Ordering::AcqRel) & bit == 0
            })
            .ok_or(Error::Init("no free esp_timer slot"))?;

        let args = esp_timer_create_args_t {
            callback: Some(timer_trampoline),
            arg: slot as *mut c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"alarm".as_ptr(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlive the call.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            TIMER_SLOTS_USED.fetch_and(!(1u8 << slot), Ordering::AcqRel);
            return Err(Error::Platform { op: "esp_timer_create", code: ret });
        }
        Ok(Self { slot, handle, basis_hz: 0 })
    }
}

impl TimerPort for Esp32Timer {
    fn begin(&mut self, basis_hz: u32) {
        self.stop();
        self.basis_hz = basis_hz;
    }

    fn attach_interrupt(&mut self, handler: IsrHandler) {
        critical_section::with(|cs| {
            TIMER_HANDLERS[self.slot].replace(cs, Some(handler));
        });
    }

    fn set_alarm(&mut self, period_ticks: u64, repeat: bool) {
        if self.basis_hz == 0 {
            warn!("esp32: set_alarm before begin, ignored");
            return;
        }
        let period_us = period_ticks.saturating_mul(1_000_000) / u64::from(self.basis_hz);
        // SAFETY: handle created in new(); restart requires a stop first.
        unsafe {
            esp_timer_stop(self.handle);
            if repeat {
                check("esp_timer_start_periodic", esp_timer_start_periodic(self.handle, period_us));
            } else {
                check("esp_timer_start_once", esp_timer_start_once(self.handle, period_us));
            }
        }
    }

    fn detach_interrupt(&mut self) {
        critical_section::with(|cs| {
            TIMER_HANDLERS[self.slot].replace(cs, None);
        });
    }

    fn stop(&mut self) {
        // SAFETY: ESP_ERR_INVALID_STATE (not running) is fine.
        unsafe {
            esp_timer_stop(self.handle);
        }
    }
}

impl Drop for Esp32Timer {
    fn drop(&mut self) {
        self.detach_interrupt();
        // SAFETY: handle owned by self.
        unsafe {
            esp_timer_stop(self.handle);
            check("esp_timer_delete", esp_timer_delete(self.handle));
        }
        TIMER_SLOTS_USED.fetch_and(!(1u8 << self.slot), Ordering::AcqRel);
    }
}
