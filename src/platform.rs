use core::fmt::{self, Display, Formatter};

use embedded_hal::digital::PinState;

/// Raw error code reported by a platform service (errno-style, negative).
pub type ErrorCode = i32;

/// Platform interrupt identifier a GPIO line translates to.
pub type IrqId = u32;

/// Hardware-description property naming the dedicated power-enable GPIO.
pub const PROP_POWER_GPIO: &str = "goodix,gpio_ldo";
/// Hardware-description property naming the reset GPIO.
pub const PROP_RESET_GPIO: &str = "goodix,gpio_reset";
/// Hardware-description property naming the interrupt GPIO.
pub const PROP_IRQ_GPIO: &str = "goodix,gpio_irq";

pub(crate) const LABEL_POWER: &str = "goodix_pwr";
pub(crate) const LABEL_RESET: &str = "goodix_reset";
pub(crate) const LABEL_IRQ: &str = "goodix_irq";

/// A GPIO line identifier resolved from the hardware description.
///
/// Lines that fail to resolve stay [`GpioLine::Invalid`]; every use checks
/// validity first instead of carrying a negative-number sentinel around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioLine {
    #[default]
    Invalid,
    Valid(u32),
}

impl GpioLine {
    pub fn is_valid(self) -> bool {
        matches!(self, GpioLine::Valid(_))
    }

    pub fn id(self) -> Option<u32> {
        match self {
            GpioLine::Valid(id) => Some(id),
            GpioLine::Invalid => None,
        }
    }
}

/// Errors surfaced by the power sequencer and the reset/IRQ operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// The requested supply name matches no registry entry.
    NotFound,
    /// The platform could not hand out a regulator or GPIO resource.
    AcquisitionFailed,
    /// Regulator enable rejected by the platform; carries the raw code.
    EnableFailed(ErrorCode),
    /// The hardware description is missing a required GPIO identifier.
    InvalidConfig,
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::NotFound => write!(f, "regulator not found"),
            PlatformError::AcquisitionFailed => write!(f, "resource acquisition failed"),
            PlatformError::EnableFailed(code) => {
                write!(f, "regulator enable rejected ({})", code)
            }
            PlatformError::InvalidConfig => write!(f, "missing or invalid GPIO in configuration"),
        }
    }
}

/// Regulator service provided by the host platform.
///
/// Handles are opaque to this crate; the sequencer only holds them while the
/// matching rail is enabled and returns them through [`regulator_put`]
/// otherwise.
///
/// [`regulator_put`]: RegulatorControl::regulator_put
pub trait RegulatorControl {
    type Regulator;

    /// Look up and acquire the named supply.
    fn regulator_get(&mut self, name: &str) -> Result<Self::Regulator, ErrorCode>;

    /// Number of selectable voltages; 0 for fixed rails.
    fn regulator_count_voltages(&mut self, reg: &mut Self::Regulator) -> u32;

    fn regulator_set_voltage(
        &mut self,
        reg: &mut Self::Regulator,
        min_uv: u32,
        max_uv: u32,
    ) -> Result<(), ErrorCode>;

    fn regulator_set_load(&mut self, reg: &mut Self::Regulator, load_ua: u32)
        -> Result<(), ErrorCode>;

    fn regulator_enable(&mut self, reg: &mut Self::Regulator) -> Result<(), ErrorCode>;

    fn regulator_is_enabled(&mut self, reg: &mut Self::Regulator) -> bool;

    /// Best-effort; a rail that cannot be disabled is the platform's problem.
    fn regulator_disable(&mut self, reg: &mut Self::Regulator);

    /// Release the handle.
    fn regulator_put(&mut self, reg: Self::Regulator);
}

/// Identifier-based GPIO service provided by the host platform.
pub trait GpioControl {
    fn gpio_request(&mut self, id: u32, label: &str) -> Result<(), ErrorCode>;

    fn gpio_direction_output(&mut self, id: u32, state: PinState) -> Result<(), ErrorCode>;

    fn gpio_direction_input(&mut self, id: u32) -> Result<(), ErrorCode>;

    fn gpio_set_value(&mut self, id: u32, state: PinState);

    /// Release a requested line. Releasing a line that is not currently held
    /// must be a no-op.
    fn gpio_free(&mut self, id: u32);

    fn gpio_to_irq(&mut self, id: u32) -> Result<IrqId, ErrorCode>;
}

/// Named-property lookup against the device's hardware description.
pub trait HardwareDescription {
    /// Resolve a named GPIO property; [`GpioLine::Invalid`] when the
    /// property is absent or malformed.
    fn named_gpio(&mut self, property: &str) -> GpioLine;
}
