//! Simulated HVSP target for tests
//!
//! Decodes the parallel SDI/SII frames clocked in by the programmer into
//! transactions and answers them like an 8-pin/14-pin ATtiny would: data
//! latched by a strobe instruction is shifted out on SDO during the
//! following frame.
//!
//! The clock is virtual: every SDO sample takes one millisecond, and
//! `delay` just advances it.

use std::time::Duration;

use super::registers::{
	instruction,
	command,
	Fuses,
};
use super::{
	Direction,
	Hardware,
	Pin,
};
use super::low_level::FRAME_BITS;
use crate::device::Signature;

const SAMPLE_TIME: Duration = Duration::from_millis(1);
// SDO idles high between frames; the first sample of a frame is dropped anyway
const READY_BIT: u16 = 1 << (FRAME_BITS - 1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transaction {
	pub sdi: u8,
	pub sii: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
	Pin(Pin, bool),
	Direction(Direction),
	Delay(Duration),
}

/// What `power_down` leaves on the lines, in order
pub const POWER_DOWN: [Event; 3] = [
	Event::Pin(Pin::Sci, false),
	Event::Pin(Pin::Vcc, false),
	Event::Pin(Pin::Reset, true),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
	None,
	ReadSignature,
	ReadFuseLock,
	WriteFuse,
	ChipErase,
}

pub struct SimulatedTarget {
	pub signature: [u8; 3],
	pub fuses: Fuses,
	pub lock: u8,
	pub flash_erased: bool,
	pub stuck_low: bool,

	pub transactions: Vec<Transaction>,
	pub events: Vec<Event>,
	pub clock_pulses: usize,
	pub sdi_bits: Vec<bool>,
	pub sii_bits: Vec<bool>,
	pub led: bool,

	vcc: bool,
	reset: bool,
	sdi: bool,
	sii: bool,
	sci: bool,
	sdo_direction: Direction,

	sdi_in: u16,
	sii_in: u16,
	bits: u32,
	out_frame: u16,

	command: Command,
	address: u8,
	data: u8,

	clock: Duration,
}

impl SimulatedTarget {
	pub fn new(signature: [u8; 3]) -> Self {
		SimulatedTarget {
			signature,
			// RSTDISBL programmed, both lock bits programmed
			fuses: Fuses { low: 0xe2, high: 0x5f, extended: 0xff },
			lock: 0xfc,
			flash_erased: false,
			stuck_low: false,
			transactions: Vec::new(),
			events: Vec::new(),
			clock_pulses: 0,
			sdi_bits: Vec::new(),
			sii_bits: Vec::new(),
			led: false,
			vcc: false,
			reset: true,
			sdi: false,
			sii: false,
			sci: false,
			sdo_direction: Direction::Output,
			sdi_in: 0,
			sii_in: 0,
			bits: 0,
			out_frame: READY_BIT,
			command: Command::None,
			address: 0,
			data: 0,
			clock: Duration::from_secs(0),
		}
	}

	pub fn with_signature(signature: Signature) -> Self {
		let [high, low] = signature.0.to_be_bytes();
		Self::new([0x1e, high, low])
	}

	// what SDO shows during the next frame (11 bits, highest first)
	pub fn present_frame(&mut self, frame: u16) {
		self.out_frame = frame;
	}

	pub fn elapsed(&self) -> Duration {
		self.clock
	}

	pub fn is_powered(&self) -> bool {
		self.vcc || !self.reset
	}

	pub fn in_programming_mode(&self) -> bool {
		self.vcc && !self.reset && self.sdo_direction == Direction::Input
	}

	pub fn has_transaction(&self, sdi: u8, sii: u8) -> bool {
		self.transactions.contains(&Transaction { sdi, sii })
	}

	/// `events` without the clock pulses and the data bits they latch
	pub fn line_events(&self) -> Vec<Event> {
		let mut events = Vec::new();
		let mut pulse = false;
		for (i, &event) in self.events.iter().enumerate() {
			match event {
				Event::Pin(Pin::Sci, true) => pulse = true,
				Event::Pin(Pin::Sci, false) if pulse => pulse = false,
				Event::Pin(Pin::Sdi, _) | Event::Pin(Pin::Sii, _) if clocked_next(&self.events[i + 1..]) => (),
				_ => events.push(event),
			}
		}
		events
	}

	fn rising_edge(&mut self) {
		self.clock_pulses += 1;
		self.sdi_bits.push(self.sdi);
		self.sii_bits.push(self.sii);
		self.sdi_in = (self.sdi_in << 1) | u16::from(self.sdi);
		self.sii_in = (self.sii_in << 1) | u16::from(self.sii);
		self.bits += 1;
		if self.bits == FRAME_BITS {
			let tx = Transaction {
				sdi: (self.sdi_in >> 2) as u8,
				sii: (self.sii_in >> 2) as u8,
			};
			self.bits = 0;
			self.sdi_in = 0;
			self.sii_in = 0;
			self.transactions.push(tx);
			let response = self.execute(tx);
			self.out_frame = READY_BIT | u16::from(response) << 2;
		}
	}

	fn execute(&mut self, tx: Transaction) -> u8 {
		use self::Command::*;

		match (tx.sii, self.command) {
			(instruction::LOAD_COMMAND, _) => {
				self.command = match tx.sdi {
					command::READ_SIGNATURE => ReadSignature,
					command::READ_FUSE_LOCK => ReadFuseLock,
					command::WRITE_FUSE => WriteFuse,
					command::CHIP_ERASE => ChipErase,
					_ => None,
				};
				0
			},
			(instruction::LOAD_ADDRESS_LOW, _) => {
				self.address = tx.sdi;
				0
			},
			(instruction::LOAD_DATA_LOW, _) => {
				self.data = tx.sdi;
				0
			},
			(0x68, ReadSignature) => {
				*self.signature.get(self.address as usize).unwrap_or(&0xff)
			},
			(0x68, ReadFuseLock) => self.fuses.low,
			(0x7a, ReadFuseLock) => self.fuses.high,
			(0x6a, ReadFuseLock) => self.fuses.extended,
			(0x78, ReadFuseLock) => self.lock,
			(0x64, WriteFuse) => {
				self.fuses.low = self.data;
				0
			},
			(0x74, WriteFuse) => {
				self.fuses.high = self.data;
				0
			},
			(0x66, WriteFuse) => {
				self.fuses.extended = self.data;
				0
			},
			(0x64, ChipErase) => {
				self.lock = 0xff;
				self.flash_erased = true;
				0
			},
			_ => 0,
		}
	}
}

// whether the next event after data line changes is a rising clock edge
fn clocked_next(rest: &[Event]) -> bool {
	for event in rest {
		match *event {
			Event::Pin(Pin::Sdi, _) | Event::Pin(Pin::Sii, _) => (),
			Event::Pin(Pin::Sci, true) => return true,
			_ => return false,
		}
	}
	false
}

impl Hardware for SimulatedTarget {
	fn set_pin(&mut self, pin: Pin, level: bool) {
		match pin {
			Pin::Vcc => self.vcc = level,
			Pin::Reset => self.reset = level,
			Pin::Sdi => self.sdi = level,
			Pin::Sii => self.sii = level,
			Pin::Sci => {
				if level && !self.sci {
					self.rising_edge();
				}
				self.sci = level;
			},
			Pin::Sdo => (),
		}
		self.events.push(Event::Pin(pin, level));
	}

	fn set_sdo_direction(&mut self, direction: Direction) {
		self.sdo_direction = direction;
		self.events.push(Event::Direction(direction));
	}

	fn read_sdo(&mut self) -> bool {
		self.clock += SAMPLE_TIME;
		if self.stuck_low {
			return false;
		}
		0 != self.out_frame & (1 << (FRAME_BITS - 1 - self.bits))
	}

	fn now(&mut self) -> Duration {
		self.clock
	}

	fn delay(&mut self, duration: Duration) {
		self.clock += duration;
		self.events.push(Event::Delay(duration));
	}

	fn set_status_led(&mut self, on: bool) {
		self.led = on;
	}
}
