use std::time::Instant;

use clap::Parser;

use avrcore::devices::ConsoleHost;
use avrcore::hex::{load_demo_program, read_program_file};
use avrcore::processor::Cpu;
use avrcore::target::Target;
use avrcore::Emulator;

/// Instruction-level AVR emulator: loads an Intel HEX program and runs it
/// against a modeled ATmega32U4/ATmega328P until it halts.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to an Intel HEX program image.
    path: Option<String>,

    /// Label printed alongside the profile line.
    label: Option<String>,

    /// Print one profiling line after the program terminates.
    #[arg(long)]
    profile: bool,

    /// Target device.
    #[arg(long, value_enum, default_value = "atmega32u4")]
    target: TargetArg,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum TargetArg {
    Atmega32u4,
    Atmega328p,
}

impl From<TargetArg> for Target {
    fn from(value: TargetArg) -> Target {
        match value {
            TargetArg::Atmega32u4 => Target::ATmega32U4,
            TargetArg::Atmega328p => Target::ATmega328P,
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let target: Target = args.target.into();

    let mut cpu = Cpu::new(target, Box::new(ConsoleHost));

    match &args.path {
        Some(path) => match read_program_file(path) {
            Ok(source) => {
                if let Err(err) = avrcore::hex::load(&source, &mut cpu.memory) {
                    log::error!("{}", err);
                    std::process::exit(1);
                }
            }
            Err(err) => {
                log::warn!("{} — falling back to built-in demo program", err);
                load_demo_program(&mut cpu.memory);
            }
        },
        None => {
            log::warn!("no program given — running built-in demo program");
            load_demo_program(&mut cpu.memory);
        }
    }

    let mut emulator = Emulator::from_cpu(cpu);

    let start = Instant::now();
    emulator.run();
    let elapsed = start.elapsed();

    if args.profile {
        let label = args.label.as_deref().unwrap_or("avremu");
        let cpu = emulator.cpu();
        let r24 = cpu.memory.reg(24);
        let r25 = cpu.memory.reg(25);
        let micros = elapsed.as_micros().max(1);
        println!(
            "{} {:#06x} {:#06x} {} {}",
            label,
            cpu.pc,
            ((r25 as u16) << 8) | r24 as u16,
            micros,
            elapsed.as_nanos() as u64 / micros as u64,
        );
    }
}
