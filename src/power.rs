//! Power sequencing and reset/IRQ operations for one sensor instance.

use bitflags::bitflags;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::platform::{
    GpioControl, GpioLine, HardwareDescription, IrqId, PlatformError, RegulatorControl,
    LABEL_IRQ, LABEL_POWER, LABEL_RESET, PROP_IRQ_GPIO, PROP_POWER_GPIO, PROP_RESET_GPIO,
};
use crate::regulator::{self, RegulatorDescriptor};

/// Settle time after the analog rail comes up.
const ANALOG_SETTLE_MS: u32 = 11;
/// Fixed width of the reset low pulse.
const RESET_LOW_PULSE_MS: u32 = 20;
/// Settle time enforced by [`Gf3208Platform::power_on`].
const POWER_ON_SETTLE_MS: u32 = 10;

/// Rails in enable order; rollback walks these in reverse.
const RAILS_FULL: &[&str] = &["vcc_spi", "vdd_io", "vdd_ana"];
const RAILS_ANALOG_ONLY: &[&str] = &["vdd_ana"];

bitflags! {
    /// Which optional power resources this board wires up.
    ///
    /// Boards without the dedicated power-enable line and the digital rails
    /// run from `vdd_ana` alone ([`BoardCaps::empty`]); full boards use
    /// [`BoardCaps::all`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BoardCaps: u8 {
        /// Dedicated power-enable GPIO (`goodix,gpio_ldo`).
        const POWER_GPIO = 1 << 0;
        /// Separate `vcc_spi` / `vdd_io` rails feeding the digital side.
        const IO_RAILS = 1 << 1;
    }
}

impl BoardCaps {
    fn rails(self) -> &'static [&'static str] {
        if self.contains(BoardCaps::IO_RAILS) {
            RAILS_FULL
        } else {
            RAILS_ANALOG_ONLY
        }
    }
}

/// Platform-integration context for one GF3208 sensor.
///
/// Owns the regulator handles and resolved GPIO lines from probe
/// ([`init_power`]) to remove ([`cleanup`]). All waits block; callers must
/// serialize access externally, this type performs no locking of its own.
///
/// [`init_power`]: Gf3208Platform::init_power
/// [`cleanup`]: Gf3208Platform::cleanup
pub struct Gf3208Platform<P, D, const N: usize = 3>
where
    P: RegulatorControl,
{
    platform: P,
    delay: D,
    caps: BoardCaps,
    table: &'static [RegulatorDescriptor; N],
    supplies: [Option<P::Regulator>; N],
    power_gpio: GpioLine,
    reset_gpio: GpioLine,
    irq_gpio: GpioLine,
    label: &'static str,
}

impl<P, D, const N: usize> Gf3208Platform<P, D, N>
where
    P: RegulatorControl + GpioControl + HardwareDescription,
    D: DelayNs,
{
    /// Create the context for one physical sensor.
    ///
    /// `table` is the supply registry the controller resolves rail names
    /// against; `label` identifies the bus device in log messages.
    pub fn new(
        platform: P,
        delay: D,
        caps: BoardCaps,
        table: &'static [RegulatorDescriptor; N],
        label: &'static str,
    ) -> Self {
        Self {
            platform,
            delay,
            caps,
            table,
            supplies: core::array::from_fn(|_| None),
            power_gpio: GpioLine::Invalid,
            reset_gpio: GpioLine::Invalid,
            irq_gpio: GpioLine::Invalid,
            label,
        }
    }

    /// Device label used in log messages.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Reset line as resolved by [`Gf3208Platform::init_power`].
    pub fn reset_line(&self) -> GpioLine {
        self.reset_gpio
    }

    /// Interrupt line as resolved by [`Gf3208Platform::init_power`].
    pub fn irq_line(&self) -> GpioLine {
        self.irq_gpio
    }

    /// Enable or disable one named supply against the registry.
    ///
    /// Enabling an already-enabled rail reuses the held handle and
    /// re-applies voltage and load settings. Disabling is best-effort and
    /// always succeeds for a known rail, including when it was never
    /// enabled.
    pub fn set_supply(&mut self, name: &str, enable: bool) -> Result<(), PlatformError> {
        let Some(index) = regulator::lookup(self.table, name) else {
            #[cfg(feature = "defmt")]
            defmt::error!("{}: regulator {} not found", self.label, name);
            #[cfg(feature = "log-04")]
            log::error!("{}: regulator {} not found", self.label, name);
            return Err(PlatformError::NotFound);
        };
        if enable {
            self.enable_supply(index, name)
        } else {
            self.disable_supply(index);
            Ok(())
        }
    }

    fn enable_supply(&mut self, index: usize, name: &str) -> Result<(), PlatformError> {
        let desc = self.table[index];
        let mut reg = match self.supplies[index].take() {
            Some(reg) => reg,
            None => match self.platform.regulator_get(name) {
                Ok(reg) => reg,
                Err(_code) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("{}: unable to get {}: {}", self.label, name, _code);
                    #[cfg(feature = "log-04")]
                    log::error!("{}: unable to get {}: {}", self.label, name, _code);
                    return Err(PlatformError::AcquisitionFailed);
                }
            },
        };

        // fixed rails reject voltage requests, skip them entirely
        if self.platform.regulator_count_voltages(&mut reg) > 0 {
            if let Err(_code) =
                self.platform
                    .regulator_set_voltage(&mut reg, desc.vmin_uv, desc.vmax_uv)
            {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: unable to set voltage on {}: {}", self.label, name, _code);
                #[cfg(feature = "log-04")]
                log::warn!("{}: unable to set voltage on {}: {}", self.label, name, _code);
            }
        }
        if let Err(_code) = self.platform.regulator_set_load(&mut reg, desc.load_ua) {
            #[cfg(feature = "defmt")]
            defmt::warn!("{}: unable to set load on {}: {}", self.label, name, _code);
            #[cfg(feature = "log-04")]
            log::warn!("{}: unable to set load on {}: {}", self.label, name, _code);
        }

        match self.platform.regulator_enable(&mut reg) {
            Ok(()) => {
                self.supplies[index] = Some(reg);
                Ok(())
            }
            Err(code) => {
                #[cfg(feature = "defmt")]
                defmt::error!("{}: error enabling {}: {}", self.label, name, code);
                #[cfg(feature = "log-04")]
                log::error!("{}: error enabling {}: {}", self.label, name, code);
                self.platform.regulator_put(reg);
                Err(PlatformError::EnableFailed(code))
            }
        }
    }

    fn disable_supply(&mut self, index: usize) {
        if let Some(mut reg) = self.supplies[index].take() {
            if self.platform.regulator_is_enabled(&mut reg) {
                self.platform.regulator_disable(&mut reg);
                #[cfg(feature = "defmt")]
                defmt::debug!("{}: disabled {}", self.label, self.table[index].name);
                #[cfg(feature = "log-04")]
                log::debug!("{}: disabled {}", self.label, self.table[index].name);
            }
            self.platform.regulator_put(reg);
        }
    }

    /// Power-up sequence, invoked once at probe.
    ///
    /// Drives the power-enable line (if the board has one), brings up the
    /// rails in order, waits for the analog rail to settle, then resolves
    /// and exercises the reset and interrupt lines. A failure anywhere
    /// unwinds every rail already enabled, newest first, and releases the
    /// power-enable line before returning the original error.
    pub fn init_power(&mut self) -> Result<(), PlatformError> {
        self.claim_power_gpio()?;
        if let Err(err) = self.enable_rails() {
            self.release_power_gpio();
            return Err(err);
        }
        if let Err(err) = self.configure_lines() {
            self.disable_rails();
            self.release_power_gpio();
            return Err(err);
        }
        Ok(())
    }

    fn claim_power_gpio(&mut self) -> Result<(), PlatformError> {
        if !self.caps.contains(BoardCaps::POWER_GPIO) {
            return Ok(());
        }
        let line = self.platform.named_gpio(PROP_POWER_GPIO);
        let Some(id) = line.id() else {
            #[cfg(feature = "defmt")]
            defmt::info!("{}: power gpio is invalid", self.label);
            #[cfg(feature = "log-04")]
            log::info!("{}: power gpio is invalid", self.label);
            return Err(PlatformError::InvalidConfig);
        };
        if let Err(_code) = self.platform.gpio_request(id, LABEL_POWER) {
            #[cfg(feature = "defmt")]
            defmt::error!("{}: failed to request power gpio: {}", self.label, _code);
            #[cfg(feature = "log-04")]
            log::error!("{}: failed to request power gpio: {}", self.label, _code);
            return Err(PlatformError::AcquisitionFailed);
        }
        let _ = self.platform.gpio_direction_output(id, PinState::High);
        self.power_gpio = line;
        Ok(())
    }

    fn release_power_gpio(&mut self) {
        if let Some(id) = self.power_gpio.id() {
            self.platform.gpio_set_value(id, PinState::Low);
            self.platform.gpio_free(id);
            self.power_gpio = GpioLine::Invalid;
        }
    }

    fn enable_rails(&mut self) -> Result<(), PlatformError> {
        let rails = self.caps.rails();
        for (count, &name) in rails.iter().enumerate() {
            if let Err(err) = self.set_supply(name, true) {
                // unwind exactly what made it up, newest first
                for &earlier in rails[..count].iter().rev() {
                    let _ = self.set_supply(earlier, false);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn disable_rails(&mut self) {
        for &name in self.caps.rails().iter().rev() {
            let _ = self.set_supply(name, false);
        }
    }

    fn configure_lines(&mut self) -> Result<(), PlatformError> {
        self.delay.delay_ms(ANALOG_SETTLE_MS);

        let reset = self.platform.named_gpio(PROP_RESET_GPIO);
        let Some(id) = reset.id() else {
            #[cfg(feature = "defmt")]
            defmt::info!("{}: reset gpio is invalid", self.label);
            #[cfg(feature = "log-04")]
            log::info!("{}: reset gpio is invalid", self.label);
            return Err(PlatformError::InvalidConfig);
        };
        if let Err(_code) = self.platform.gpio_request(id, LABEL_RESET) {
            #[cfg(feature = "defmt")]
            defmt::error!("{}: failed to request reset gpio: {}", self.label, _code);
            #[cfg(feature = "log-04")]
            log::error!("{}: failed to request reset gpio: {}", self.label, _code);
            return Err(PlatformError::AcquisitionFailed);
        }
        let _ = self.platform.gpio_direction_output(id, PinState::High);
        // held only for the probe-time pulse
        self.platform.gpio_free(id);
        self.reset_gpio = reset;

        let irq = self.platform.named_gpio(PROP_IRQ_GPIO);
        let Some(id) = irq.id() else {
            #[cfg(feature = "defmt")]
            defmt::info!("{}: irq gpio is invalid", self.label);
            #[cfg(feature = "log-04")]
            log::info!("{}: irq gpio is invalid", self.label);
            return Err(PlatformError::InvalidConfig);
        };
        match self.platform.gpio_request(id, LABEL_IRQ) {
            Ok(()) => {
                let _ = self.platform.gpio_direction_input(id);
                self.platform.gpio_free(id);
            }
            // the resolved identifier stays usable for irq_number() even
            // when the momentary configuration failed
            Err(_code) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: failed to request irq gpio: {}", self.label, _code);
                #[cfg(feature = "log-04")]
                log::warn!("{}: failed to request irq gpio: {}", self.label, _code);
            }
        }
        self.irq_gpio = irq;
        Ok(())
    }

    /// Teardown, invoked once at remove.
    ///
    /// Frees any still-valid GPIO lines and disables every rail of the
    /// active variant in reverse order. Best-effort: never fails, safe to
    /// call more than once.
    pub fn cleanup(&mut self) {
        if let Some(id) = self.irq_gpio.id() {
            self.platform.gpio_free(id);
            self.irq_gpio = GpioLine::Invalid;
        }
        if let Some(id) = self.reset_gpio.id() {
            self.platform.gpio_free(id);
            self.reset_gpio = GpioLine::Invalid;
        }
        self.release_power_gpio();
        self.disable_rails();
    }

    /// Pulse the sensor's reset line.
    ///
    /// Low pulse width is fixed at 20 ms; `delay_ms` sets how long the line
    /// is held high afterwards before the sensor counts as ready.
    pub fn hardware_reset(&mut self, delay_ms: u32) -> Result<(), PlatformError> {
        let Some(id) = self.reset_gpio.id() else {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "{}: reset gpio not valid, reset delay {}",
                self.label,
                delay_ms
            );
            #[cfg(feature = "log-04")]
            log::error!(
                "{}: reset gpio not valid, reset delay {}",
                self.label,
                delay_ms
            );
            return Err(PlatformError::InvalidConfig);
        };
        if let Err(_code) = self.platform.gpio_request(id, LABEL_RESET) {
            // the line was already configured at probe; pulse it anyway
            #[cfg(feature = "defmt")]
            defmt::warn!("{}: failed to request reset gpio: {}", self.label, _code);
            #[cfg(feature = "log-04")]
            log::warn!("{}: failed to request reset gpio: {}", self.label, _code);
        }
        // the sensor's documented pulse shape asserts high twice before the
        // low pulse
        let _ = self.platform.gpio_direction_output(id, PinState::High);
        let _ = self.platform.gpio_direction_output(id, PinState::High);
        self.platform.gpio_set_value(id, PinState::Low);
        self.delay.delay_ms(RESET_LOW_PULSE_MS);
        self.platform.gpio_set_value(id, PinState::High);
        self.delay.delay_ms(delay_ms);
        self.platform.gpio_free(id);
        Ok(())
    }

    /// Translate the interrupt line to its platform interrupt identifier.
    pub fn irq_number(&mut self) -> Result<IrqId, PlatformError> {
        let Some(id) = self.irq_gpio.id() else {
            return Err(PlatformError::InvalidConfig);
        };
        self.platform
            .gpio_to_irq(id)
            .map_err(|_code| PlatformError::InvalidConfig)
    }

    /// Post-power-on settle hook. Never fails in the base design; platform
    /// variants with extra power logic hook in here.
    pub fn power_on(&mut self) -> Result<(), PlatformError> {
        self.delay.delay_ms(POWER_ON_SETTLE_MS);
        #[cfg(feature = "defmt")]
        defmt::info!("{}: power on", self.label);
        #[cfg(feature = "log-04")]
        log::info!("{}: power on", self.label);
        Ok(())
    }

    /// Pre-power-off hook, counterpart of [`Gf3208Platform::power_on`].
    pub fn power_off(&mut self) -> Result<(), PlatformError> {
        #[cfg(feature = "defmt")]
        defmt::info!("{}: power off", self.label);
        #[cfg(feature = "log-04")]
        log::info!("{}: power off", self.label);
        Ok(())
    }

    #[cfg(test)]
    fn supply_held(&self, name: &str) -> bool {
        regulator::lookup(self.table, name)
            .map(|index| self.supplies[index].is_some())
            .unwrap_or(false)
    }
}
