//! Programming lines on a Linux GPIO character device (`/dev/gpiochipN`)
//!
//! All lines are held by a single line request. The reset line drives the
//! inverting level shifter for the 12V supply; it is requested as output
//! HIGH (12V off), so it is never low between the request and the first
//! power-up. The optional start button is expected to pull its line to
//! ground (active low).

use std::path::Path;
use std::time::{
	Duration,
	Instant,
};

use gpiocdev::line::{
	Bias,
	Offset,
	Value,
};
use gpiocdev::request::{
	Config,
	Request,
};

use crate::config::PinAssignment;
use crate::hvsp::{
	power_down,
	reliable_sleep,
	Direction,
	Hardware,
	Pin,
};

const CONSUMER: &str = "hvsp-fuse-reset";

const BUTTON_POLL: Duration = Duration::from_millis(10);

// order of `Lines::offsets` and `Lines::levels`
const PINS: [Pin; 6] = [Pin::Reset, Pin::Vcc, Pin::Sdi, Pin::Sii, Pin::Sci, Pin::Sdo];

fn pin_index(pin: Pin) -> usize {
	match pin {
		Pin::Reset => 0,
		Pin::Vcc => 1,
		Pin::Sdi => 2,
		Pin::Sii => 3,
		Pin::Sci => 4,
		Pin::Sdo => 5,
	}
}

fn value(level: bool) -> Value {
	if level { Value::Active } else { Value::Inactive }
}

// Requested lines and the levels last driven on them; a reconfigure has to
// repeat the output values of all lines.
#[derive(Clone, Copy, Debug)]
struct Lines {
	offsets: [Offset; 6],
	levels: [bool; 6],
	sdo: Direction,
	button: Option<Offset>,
	led: Option<Offset>,
	led_on: bool,
}

impl Lines {
	fn new(pins: &PinAssignment) -> Self {
		let mut levels = [false; 6];
		levels[pin_index(Pin::Reset)] = true;
		Lines {
			offsets: [pins.reset, pins.vcc, pins.sdi, pins.sii, pins.sci, pins.sdo],
			levels,
			sdo: Direction::Output,
			button: pins.button,
			led: pins.led,
			led_on: false,
		}
	}

	fn offset(&self, pin: Pin) -> Offset {
		self.offsets[pin_index(pin)]
	}

	fn config(&self) -> Config {
		let mut config = Config::default();
		for &pin in PINS.iter() {
			let offset = self.offset(pin);
			if pin == Pin::Sdo && self.sdo == Direction::Input {
				config.with_line(offset).as_input();
			} else {
				config.with_line(offset).as_output(value(self.levels[pin_index(pin)]));
			}
		}
		if let Some(button) = self.button {
			config.with_line(button).as_input().as_active_low().with_bias(Bias::PullUp);
		}
		if let Some(led) = self.led {
			config.with_line(led).as_output(value(self.led_on));
		}
		config
	}
}

pub struct GpioHardware {
	request: Request,
	lines: Lines,
	epoch: Instant,
}

pub fn open_hvsp(chip: &Path, pins: &PinAssignment) -> crate::AResult<GpioHardware> {
	pins.validate()?;

	let lines = Lines::new(pins);
	let request = with_context!(("failed to request HVSP lines on {}", chip.display()),
		Request::from_config(lines.config())
			.on_chip(chip)
			.with_consumer(CONSUMER)
			.request()
			.map_err(|e| e.into())
	)?;

	info!(
		"HVSP lines on {}: vcc={} reset={} sdi={} sii={} sdo={} sci={}",
		chip.display(), pins.vcc, pins.reset, pins.sdi, pins.sii, pins.sdo, pins.sci,
	);

	Ok(GpioHardware {
		request,
		lines,
		epoch: Instant::now(),
	})
}

impl GpioHardware {
	pub fn has_button(&self) -> bool {
		self.lines.button.is_some()
	}

	pub fn button_pressed(&mut self) -> bool {
		let button = match self.lines.button {
			Some(button) => button,
			None => return false,
		};
		match self.request.value(button) {
			Ok(value) => value == Value::Active,
			Err(e) => {
				error!("GPIO {}: failed reading button: {}", button, e);
				false
			},
		}
	}

	pub fn wait_button_released(&mut self, debounce: Duration) {
		if !self.has_button() {
			return;
		}
		while self.button_pressed() {
			reliable_sleep(BUTTON_POLL);
		}
		reliable_sleep(debounce);
	}
}

impl Hardware for GpioHardware {
	fn set_pin(&mut self, pin: Pin, level: bool) {
		self.lines.levels[pin_index(pin)] = level;
		if pin == Pin::Sdo && self.lines.sdo == Direction::Input {
			// applied when SDO becomes an output again
			return;
		}
		let offset = self.lines.offset(pin);
		if let Err(e) = self.request.set_value(offset, value(level)) {
			error!("GPIO {} ({:?}): failed to set {}: {}", offset, pin, level, e);
		}
	}

	fn set_sdo_direction(&mut self, direction: Direction) {
		if self.lines.sdo == direction {
			return;
		}
		self.lines.sdo = direction;
		if let Err(e) = self.request.reconfigure(&self.lines.config()) {
			error!("GPIO {} (Sdo): failed to switch to {:?}: {}", self.lines.offset(Pin::Sdo), direction, e);
		}
	}

	fn read_sdo(&mut self) -> bool {
		let offset = self.lines.offset(Pin::Sdo);
		match self.request.value(offset) {
			Ok(value) => value == Value::Active,
			Err(e) => {
				error!("GPIO {} (Sdo): failed reading: {}", offset, e);
				false
			},
		}
	}

	fn now(&mut self) -> Duration {
		self.epoch.elapsed()
	}

	fn set_status_led(&mut self, on: bool) {
		if let Some(led) = self.lines.led {
			self.lines.led_on = on;
			if let Err(e) = self.request.set_value(led, value(on)) {
				error!("GPIO {} (LED): {}", led, e);
			}
		}
	}
}

impl Drop for GpioHardware {
	fn drop(&mut self) {
		power_down(self);
		self.set_status_led(false);
	}
}
