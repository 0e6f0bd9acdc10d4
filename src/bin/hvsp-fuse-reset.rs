#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

extern crate hvsp_fuse_reset;
use hvsp_fuse_reset::*;

use std::io::{
	self,
	BufRead,
};
use std::process::exit;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use hvsp_fuse_reset::gpio::GpioHardware;

const TRIGGER_POLL: Duration = Duration::from_millis(10);

enum Trigger {
	Token(String),
	Button,
	Closed,
}

fn print_menu() {
	println!();
	println!("Enter 'r' to only read fuses and lock bits...");
	println!("Enter 'e' to erase flash and lock bits...");
	println!("Enter anything else or press the start button to write fuses to default...");
	println!();
}

// stdin lines arrive through a channel so the button can be polled meanwhile
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
	let (tx, rx) = mpsc::channel();
	thread::spawn(move || {
		let stdin = io::stdin();
		for line in stdin.lock().lines() {
			match line {
				Ok(line) => {
					if tx.send(line).is_err() {
						break;
					}
				},
				Err(e) => {
					error!("Failed reading stdin: {}", e);
					break;
				},
			}
		}
	});
	rx
}

fn wait_for_trigger(hardware: &mut GpioHardware, input: &mpsc::Receiver<String>, input_open: &mut bool) -> Trigger {
	loop {
		if *input_open {
			match input.try_recv() {
				Ok(line) => return Trigger::Token(line),
				Err(mpsc::TryRecvError::Empty) => (),
				Err(mpsc::TryRecvError::Disconnected) => {
					*input_open = false;
				},
			}
		}
		if !*input_open && !hardware.has_button() {
			return Trigger::Closed;
		}
		if hardware.button_pressed() {
			return Trigger::Button;
		}
		thread::sleep(TRIGGER_POLL);
	}
}

fn run_session(session: &mut Session<GpioHardware>, mode: Mode) -> Report {
	let report = session.run(mode);
	println!();
	print!("{}", report);
	if report.device.is_none() {
		println!("No valid ATtiny signature detected! Try again.");
	}
	report
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg vcc: --vcc +takes_value +required "GPIO line switching target VCC")
		(@arg reset: --reset +takes_value +required "GPIO line driving the (inverting) 12V level shifter for !RESET")
		(@arg sdi: --sdi +takes_value +required "GPIO line to target SDI (data in)")
		(@arg sii: --sii +takes_value +required "GPIO line to target SII (instruction in)")
		(@arg sdo: --sdo +takes_value +required "GPIO line from target SDO (data out)")
		(@arg sci: --sci +takes_value +required "GPIO line to target SCI (clock)")
		(@arg button: --button +takes_value "GPIO line of a start button (active low)")
		(@arg led: --led +takes_value "GPIO line of a status LED")
		(@arg timeout: --timeout +takes_value "milliseconds to wait for SDO before each instruction (default 300)")
		(@arg chip: --chip +takes_value "GPIO chip number or device (default /dev/gpiochip0)")
		(@arg MODE: "run a single session: read-only (r), erase (e) or write-defaults")
	).get_matches();

	let config = Config::from_params(|name| matches.value_of(name).map(String::from))?;
	let hardware = gpio::open_hvsp(&config.chip, &config.pins)?;
	let mut session = Session::new(hardware, config);

	info!("{} {}", crate_name!(), crate_version!());

	if let Some(token) = matches.value_of("MODE") {
		run_session(&mut session, Mode::from_token(token));
		return Ok(());
	}

	let input = spawn_stdin_reader();
	let mut input_open = true;
	loop {
		print_menu();
		let (mode, by_button) = match wait_for_trigger(session.hardware(), &input, &mut input_open) {
			Trigger::Token(token) => (Mode::from_token(&token), false),
			Trigger::Button => (Mode::WriteDefaults, true),
			Trigger::Closed => return Ok(()),
		};
		let report = run_session(&mut session, mode);
		// wait before offering the next session
		if by_button || report.device.is_none() {
			let debounce = session.config().timing.release_debounce;
			session.hardware().wait_button_released(debounce);
		}
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
