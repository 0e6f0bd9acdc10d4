use std::time::Duration;

use super::{
	Direction,
	Hardware,
	HvspOperations,
	Pin,
};
use crate::config::Timing;

// all target rails off: VCC low, 12V off (inverting level shifter)
pub fn power_down<H: Hardware + ?Sized>(hardware: &mut H) {
	hardware.set_pin(Pin::Sci, false);
	hardware.set_pin(Pin::Vcc, false);
	hardware.set_pin(Pin::Reset, true);
}

/// Target powered in HVSP mode; powers down when dropped.
pub struct ProgrammingMode<H: Hardware> {
	hardware: H,
	response_timeout: Duration,
	powered: bool,
}

impl<H: Hardware> ProgrammingMode<H> {
	pub fn power_down(mut self) {
		self._power_down();
	}

	fn _power_down(&mut self) {
		if self.powered {
			debug!("powering down target");
			power_down(&mut self.hardware);
			self.powered = false;
		}
	}
}

impl<H: Hardware> Drop for ProgrammingMode<H> {
	fn drop(&mut self) {
		self._power_down();
	}
}

impl<H: Hardware> HvspOperations for ProgrammingMode<H> {
	type Hardware = H;

	fn hardware(&mut self) -> &mut Self::Hardware {
		&mut self.hardware
	}

	fn response_timeout(&self) -> Duration {
		self.response_timeout
	}
}

// Enter HVSP mode: with all data lines low, apply VCC, then 12V on
// !RESET; SDO becomes an output of the target after that.
pub fn enter_programming_mode<H: Hardware>(mut hardware: H, timing: &Timing) -> ProgrammingMode<H> {
	debug!("powering up target");
	hardware.set_sdo_direction(Direction::Output);
	hardware.set_pin(Pin::Sdi, false);
	hardware.set_pin(Pin::Sii, false);
	hardware.set_pin(Pin::Sdo, false);
	hardware.set_pin(Pin::Reset, true);
	hardware.set_pin(Pin::Vcc, true);
	hardware.delay(timing.vcc_settle);
	hardware.set_pin(Pin::Reset, false);
	hardware.delay(timing.reset_assert);
	hardware.set_sdo_direction(Direction::Input);
	hardware.delay(timing.response_settle);

	ProgrammingMode {
		hardware,
		response_timeout: timing.response_timeout,
		powered: true,
	}
}
