use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Output lines towards the target
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Pin {
	/// target VCC enable
	Vcc,
	/// drives the level shifter for 12V on !RESET; inverting, so HIGH means 12V off
	Reset,
	/// target data input (SDI)
	Sdi,
	/// target instruction input (SII)
	Sii,
	/// target clock input (SCI)
	Sci,
	/// target data output (SDO); only driven (low) before entering programming mode
	Sdo,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Output,
	Input,
}

pub trait Hardware {
	fn set_pin(&mut self, pin: Pin, level: bool);
	fn set_sdo_direction(&mut self, direction: Direction);
	fn read_sdo(&mut self) -> bool;

	// monotonic clock; only differences between two calls are meaningful
	fn now(&mut self) -> Duration;

	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}

	fn set_status_led(&mut self, _on: bool) {
	}
}

impl<'a, H: ?Sized + Hardware> Hardware for &'a mut H {
	fn set_pin(&mut self, pin: Pin, level: bool) {
		H::set_pin(*self, pin, level)
	}
	fn set_sdo_direction(&mut self, direction: Direction) {
		H::set_sdo_direction(*self, direction)
	}
	fn read_sdo(&mut self) -> bool {
		H::read_sdo(*self)
	}
	fn now(&mut self) -> Duration {
		H::now(*self)
	}
	fn delay(&mut self, duration: Duration) {
		H::delay(*self, duration)
	}
	fn set_status_led(&mut self, on: bool) {
		H::set_status_led(*self, on)
	}
}
