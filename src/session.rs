use std::fmt;
use std::str;

use crate::config::Config;
use crate::device::{
	self,
	DeviceProfile,
	Signature,
};
use crate::hvsp::{
	enter_programming_mode,
	power_down,
	FuseBank,
	Fuses,
	Hardware,
	HvspOperations,
	LockBits,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Mode {
	ReadOnly,
	Erase,
	WriteDefaults,
}

impl Mode {
	/// Only the first non-blank character counts ("r", "read-only" and
	/// "reset" all read): 'r'/'R' reads, 'e'/'E' erases, anything else
	/// (including an empty token) means "write defaults"
	pub fn from_token(token: &str) -> Self {
		match token.trim_start().chars().next() {
			Some('r') | Some('R') => Mode::ReadOnly,
			Some('e') | Some('E') => Mode::Erase,
			_ => Mode::WriteDefaults,
		}
	}

	pub fn is_read_only(self) -> bool {
		self == Mode::ReadOnly
	}
}

impl str::FromStr for Mode {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Mode::from_token(s))
	}
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			Mode::ReadOnly => "read-only",
			Mode::Erase => "erase",
			Mode::WriteDefaults => "write-defaults",
		})
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum State {
	Idle,
	PoweringUp,
	Identifying,
	Reading,
	Writing,
	Erasing,
	Verifying,
	PoweringDown,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
	None,
	Erased,
	WroteDefaults(&'static [(FuseBank, u8)]),
	UnknownDevice,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Report {
	pub mode: Mode,
	pub signature: Signature,
	pub device: Option<&'static DeviceProfile>,
	pub fuses: Fuses,
	pub lock_bits: LockBits,
	pub action: Action,
	/// fuses and lock bits read again after the action (not in read-only mode)
	pub verified: Option<(Fuses, LockBits)>,
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		writeln!(f, "Signature: {}", self.signature)?;
		match self.device {
			Some(device) => writeln!(f, "Device: {} ({} pin)", device.name, device.pin_count)?,
			None => writeln!(f, "Device: unknown")?,
		}
		writeln!(f, "Fuses: {}", self.fuses)?;
		writeln!(f, "Lock: {}", self.lock_bits)?;
		match self.action {
			Action::None => (),
			Action::Erased => writeln!(f, "Erased flash and lock bits")?,
			Action::WroteDefaults(defaults) => {
				for &(bank, value) in defaults {
					writeln!(f, "Wrote {}: 0x{:02X}", bank, value)?;
				}
			},
			Action::UnknownDevice => writeln!(f, "No valid ATtiny signature detected, nothing written")?,
		}
		if let Some((fuses, lock_bits)) = self.verified {
			writeln!(f, "Fuses after: {}", fuses)?;
			writeln!(f, "Lock after: {}", lock_bits)?;
		}
		Ok(())
	}
}

struct StateTracker {
	state: State,
	history: Vec<State>,
}

impl StateTracker {
	fn enter(&mut self, state: State) {
		debug!("session: {:?} -> {:?}", self.state, state);
		self.state = state;
		self.history.push(state);
	}
}

/// Owns the programming lines for its lifetime and runs one programming
/// session at a time.
pub struct Session<H: Hardware> {
	hardware: H,
	config: Config,
	tracker: StateTracker,
}

impl<H: Hardware> Session<H> {
	pub fn new(mut hardware: H, config: Config) -> Self {
		power_down(&mut hardware);
		Session {
			hardware,
			config,
			tracker: StateTracker {
				state: State::Idle,
				history: Vec::new(),
			},
		}
	}

	pub fn state(&self) -> State {
		self.tracker.state
	}

	/// states passed through during the last `run`
	pub fn history(&self) -> &[State] {
		&self.tracker.history
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn hardware(&mut self) -> &mut H {
		&mut self.hardware
	}

	pub fn into_hardware(self) -> H {
		self.hardware
	}

	pub fn run(&mut self, mode: Mode) -> Report {
		let timing = self.config.timing;
		let tracker = &mut self.tracker;
		tracker.history.clear();
		tracker.history.push(State::Idle);

		info!("Starting {} session", mode);
		tracker.enter(State::PoweringUp);
		self.hardware.set_status_led(true);
		let mut target = enter_programming_mode(&mut self.hardware, &timing);

		tracker.enter(State::Identifying);
		info!("Reading signature from connected ATtiny...");
		let signature = target.read_signature();
		info!("Signature is: {}", signature);
		let device = device::lookup(signature);
		match device {
			Some(device) => info!("The ATtiny is detected as {}", device.name),
			None => warn!("No valid ATtiny signature detected ({})", signature),
		}

		tracker.enter(State::Reading);
		let fuses = target.read_fuses();
		info!("{}", fuses);
		let lock_bits = target.read_lock_bits();
		info!("Lock: {}", lock_bits);

		let action = match (mode, device) {
			(Mode::ReadOnly, _) => Action::None,
			(Mode::Erase, _) => {
				tracker.enter(State::Erasing);
				info!("Erasing flash and lock bits...");
				target.erase_flash_and_lock_bits();
				Action::Erased
			},
			(Mode::WriteDefaults, Some(device)) => {
				tracker.enter(State::Writing);
				for &(bank, value) in device.fuse_defaults {
					info!("Write {}: 0x{:02X}", bank, value);
					target.write_fuse(bank.address(), value);
				}
				Action::WroteDefaults(device.fuse_defaults)
			},
			(Mode::WriteDefaults, None) => {
				warn!("Not writing fuses to unknown device");
				Action::UnknownDevice
			},
		};

		let verified = if mode.is_read_only() {
			None
		} else {
			tracker.enter(State::Verifying);
			info!("Fuses and lock bits will be read again to check values...");
			let fuses = target.read_fuses();
			info!("{}", fuses);
			let lock_bits = target.read_lock_bits();
			info!("Lock: {}", lock_bits);
			Some((fuses, lock_bits))
		};

		tracker.enter(State::PoweringDown);
		target.power_down();
		self.hardware.delay(timing.led_hold);
		self.hardware.set_status_led(false);

		tracker.enter(State::Idle);

		Report {
			mode,
			signature,
			device,
			fuses,
			lock_bits,
			action,
			verified,
		}
	}
}
