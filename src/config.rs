use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Timing {
	/// how long to wait for SDO to go high before each transaction
	pub response_timeout: Duration,
	pub vcc_settle: Duration,
	pub reset_assert: Duration,
	pub response_settle: Duration,
	/// start button debouncing after release
	pub release_debounce: Duration,
	/// status LED stays lit after a session
	pub led_hold: Duration,
}

impl Default for Timing {
	fn default() -> Self {
		Timing {
			response_timeout: Duration::from_millis(300),
			vcc_settle: Duration::from_micros(20),
			reset_assert: Duration::from_micros(10),
			response_settle: Duration::from_micros(300),
			release_debounce: Duration::from_millis(100),
			led_hold: Duration::from_secs(1),
		}
	}
}

/// GPIO line offsets (on the configured chip) for each signal
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PinAssignment {
	pub vcc: u32,
	pub reset: u32,
	pub sdi: u32,
	pub sii: u32,
	pub sdo: u32,
	pub sci: u32,
	pub button: Option<u32>,
	pub led: Option<u32>,
}

fn parse_line(name: &str, value: &str) -> crate::AResult<u32> {
	with_context!(("invalid GPIO line for {}: {:?}", name, value),
		value.trim().parse::<u32>().map_err(|e| e.into())
	)
}

impl PinAssignment {
	/// Build from named parameters ("vcc", "reset", "sdi", "sii", "sdo",
	/// "sci"; optional "button" and "led").
	pub fn from_params<F>(param: F) -> crate::AResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |name: &str| -> crate::AResult<u32> {
			match param(name) {
				Some(value) => parse_line(name, &value),
				None => bail!("missing GPIO line for {}", name),
			}
		};
		let optional = |name: &str| -> crate::AResult<Option<u32>> {
			match param(name) {
				Some(value) => Ok(Some(parse_line(name, &value)?)),
				None => Ok(None),
			}
		};

		let pins = PinAssignment {
			vcc: required("vcc")?,
			reset: required("reset")?,
			sdi: required("sdi")?,
			sii: required("sii")?,
			sdo: required("sdo")?,
			sci: required("sci")?,
			button: optional("button")?,
			led: optional("led")?,
		};
		pins.validate()?;
		Ok(pins)
	}

	pub fn lines(&self) -> Vec<(&'static str, u32)> {
		let mut lines = vec![
			("vcc", self.vcc),
			("reset", self.reset),
			("sdi", self.sdi),
			("sii", self.sii),
			("sdo", self.sdo),
			("sci", self.sci),
		];
		if let Some(button) = self.button {
			lines.push(("button", button));
		}
		if let Some(led) = self.led {
			lines.push(("led", led));
		}
		lines
	}

	pub fn validate(&self) -> crate::AResult<()> {
		let mut seen = HashMap::new();
		for (name, line) in self.lines() {
			if let Some(other) = seen.insert(line, name) {
				bail!("GPIO line {} assigned to both {} and {}", line, other, name);
			}
		}
		Ok(())
	}
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Config {
	/// GPIO character device, e.g. "/dev/gpiochip0"
	pub chip: PathBuf,
	pub timing: Timing,
	pub pins: PinAssignment,
}

impl Config {
	pub fn new(pins: PinAssignment) -> Self {
		Config {
			chip: PathBuf::from(DEFAULT_CHIP),
			timing: Timing::default(),
			pins,
		}
	}

	/// Pin parameters as in `PinAssignment::from_params`, plus optional
	/// "chip" (see `parse_chip`) and "timeout" (milliseconds) for the
	/// response line.
	pub fn from_params<F>(param: F) -> crate::AResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Config::new(PinAssignment::from_params(&param)?);
		if let Some(chip) = param("chip") {
			config.chip = parse_chip(&chip)?;
		}
		if let Some(timeout) = param("timeout") {
			let ms = parse_number(&timeout)?;
			config.timing.response_timeout = Duration::from_millis(u64::from(ms));
		}
		Ok(config)
	}
}

/// A chip number ("1" is "/dev/gpiochip1") or a device path
pub fn parse_chip(s: &str) -> crate::AResult<PathBuf> {
	let s = s.trim();
	ensure!(!s.is_empty(), "empty GPIO chip");
	if s.bytes().all(|b| b.is_ascii_digit()) {
		let n = parse_number(s)?;
		Ok(PathBuf::from(format!("/dev/gpiochip{}", n)))
	} else {
		Ok(PathBuf::from(s))
	}
}

/// Parse a number, hexadecimal with "0x" prefix
pub fn parse_number(s: &str) -> crate::AResult<u32> {
	let s = s.trim();
	let parsed = if s.starts_with("0x") || s.starts_with("0X") {
		u32::from_str_radix(&s[2..], 16)
	} else {
		s.parse::<u32>()
	};
	with_context!(("invalid number {:?}", s), parsed.map_err(|e| e.into()))
}

pub fn parse_byte(s: &str) -> crate::AResult<u8> {
	let value = parse_number(s)?;
	ensure!(value <= 0xff, "value {:?} doesn't fit in a byte", s);
	Ok(value as u8)
}
