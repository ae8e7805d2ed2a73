pub mod conversions;
pub mod devices;
pub mod error;
pub mod hex;
mod instructions;
pub mod memory;
mod parser;
pub mod processor;
pub mod sreg;
pub mod target;

use devices::Host;
use error::EmulatorError;
use processor::Cpu;
use target::Target;

/// How many instructions `Emulator::run` executes per `fetch_n` batch before
/// giving the host a chance to run `refresh_ui`.
const BATCH_SIZE: u64 = 4096;

pub struct Configuration {
    pub target: Target,
    pub program: String,
}

pub struct Emulator {
    cpu: Cpu,
}

impl Emulator {
    pub fn new(config: Configuration, host: Box<dyn Host>) -> Result<Emulator, EmulatorError> {
        let mut cpu = Cpu::new(config.target, host);
        hex::load(&config.program, &mut cpu.memory)?;
        log::info!("loaded program for {:?}, entry at {:#06x}", config.target, config.target.entry_address());
        Ok(Emulator { cpu })
    }

    /// Wraps an already-initialized `Cpu` (program already written into its
    /// memory, e.g. via `hex::load_demo_program` rather than `hex::load`) so
    /// callers that can't route through `Configuration`'s HEX-text path still
    /// get the batched `fetch_n`/`refresh_ui` run loop.
    pub fn from_cpu(cpu: Cpu) -> Emulator {
        Emulator { cpu }
    }

    /// Runs until the program terminates (BREAK, spin-forever sentinel, or
    /// falling off the end of flash).
    pub fn run(&mut self) {
        loop {
            let keep_going = self.cpu.fetch_n(BATCH_SIZE);
            self.cpu.host.refresh_ui();
            if !keep_going {
                break;
            }
        }
        log::info!("program terminated at pc={:#06x}", self.cpu.pc);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }
}
