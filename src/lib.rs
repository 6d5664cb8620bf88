#![no_std]
//! Platform integration layer for the Goodix GF3208 capacitive fingerprint
//! sensor.
//!
//! This crate covers the board-facing side of the sensor only: acquiring and
//! sequencing the power rails, configuring the reset and interrupt GPIO
//! lines, and exposing the hardware-reset pulse and IRQ-number lookup the
//! sensor driver needs. The SPI protocol, interrupt handler registration and
//! user-space surface live with the driver that owns this layer.
//!
//! Boards plug in by implementing the trait seams in [`platform`]
//! (regulator service, GPIO service, hardware-description lookup) and
//! handing a [`power::Gf3208Platform`] context an
//! [`embedded_hal::delay::DelayNs`] for the settle waits.

/// Trait seams to the host platform plus the shared GPIO/error types.
pub mod platform;

/// Power sequencing, cleanup and the reset/IRQ operations.
pub mod power;

/// Static supply registry for the sensor's power rails.
pub mod regulator;

pub use platform::{GpioLine, IrqId, PlatformError};
pub use power::{BoardCaps, Gf3208Platform};
pub use regulator::{RegulatorDescriptor, SUPPLIES};

#[cfg(test)]
extern crate alloc;

#[cfg(test)]
mod tests {
    use crate::platform::{GpioLine, PlatformError};
    use alloc::format;

    #[test]
    fn test_platform_error_display() {
        assert_eq!(format!("{}", PlatformError::NotFound), "regulator not found");
        assert_eq!(
            format!("{}", PlatformError::AcquisitionFailed),
            "resource acquisition failed"
        );
        assert_eq!(
            format!("{}", PlatformError::EnableFailed(-5)),
            "regulator enable rejected (-5)"
        );
        assert_eq!(
            format!("{}", PlatformError::InvalidConfig),
            "missing or invalid GPIO in configuration"
        );
    }

    #[test]
    fn test_gpio_line_validity() {
        assert_eq!(GpioLine::default(), GpioLine::Invalid);
        assert!(!GpioLine::Invalid.is_valid());
        assert_eq!(GpioLine::Invalid.id(), None);
        assert!(GpioLine::Valid(42).is_valid());
        assert_eq!(GpioLine::Valid(42).id(), Some(42));
    }
}
