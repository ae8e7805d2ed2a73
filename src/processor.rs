// The fetch/decode/execute loop and the CPU's register/flag/stack state.
// Opcode-field extraction lives in `parser`, instruction semantics in
// `instructions`; this module just drives them.

use crate::devices::Host;
use crate::instructions::Instruction;
use crate::memory::Memory;
use crate::parser::{decode, is_long_opcode};
use crate::sreg::Sreg;
use crate::target::Target;

/// How many instructions run between simulated Timer/Counter0 overflows.
const TIMER_PERIOD: u64 = 1024;

const BREAK_OPCODE: (u8, u8) = (0x95, 0x98);
const SPIN_FOREVER_OPCODE: (u8, u8) = (0xCF, 0xFF); // rjmp .-2

pub struct Cpu {
    pub pc: u16,
    pub sreg: Sreg,
    pub memory: Memory,
    pub target: Target,
    pub host: Box<dyn Host>,
    pub halted: bool,
    instructions_run: u64,
}

impl Cpu {
    pub fn new(target: Target, host: Box<dyn Host>) -> Cpu {
        let mut memory = Memory::new(target);
        let sp = target.entry_address().wrapping_sub(1);
        memory.set_sp(sp);
        log::info!(
            "engine init: target={:?} entry={:#06x} sp={:#06x}",
            target,
            target.entry_address(),
            sp
        );
        Cpu {
            pc: target.entry_address(),
            sreg: Sreg::default(),
            memory,
            target,
            host,
            halted: false,
            instructions_run: 0,
        }
    }

    /// The host callback sink, exposed read-only so callers (tests, mostly)
    /// can downcast back to a concrete type via `Host::as_any`.
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    fn opcode_at(&self, addr: u16) -> (u8, u8) {
        (self.memory.raw(addr), self.memory.raw(addr.wrapping_add(1)))
    }

    /// Length in bytes of the instruction at `addr`, without fully decoding
    /// it; used by the skip-instruction family (`CPSE`/`SBRC`/`SBRS`/`SBIS`).
    pub fn skip_width(&self, addr: u16) -> u16 {
        let (hi, lo) = self.opcode_at(addr);
        if is_long_opcode(hi, lo) {
            4
        } else {
            2
        }
    }

    pub fn push_return_address(&mut self, address: u16) {
        let (lo, hi) = crate::conversions::unpair(address);
        let sp = self.memory.sp();
        self.memory.raw_set(sp, lo);
        self.memory.raw_set(sp.wrapping_sub(1), hi);
        self.memory.set_sp(sp.wrapping_sub(2));
    }

    pub fn pop_return_address(&mut self) -> u16 {
        let sp = self.memory.sp();
        let hi = self.memory.raw(sp.wrapping_add(1));
        let lo = self.memory.raw(sp.wrapping_add(2));
        self.memory.set_sp(sp.wrapping_add(2));
        crate::conversions::pair(lo, hi)
    }

    /// Pushes the current PC and jumps to the timer overflow vector, using
    /// the same low-byte-first push order as CALL/RCALL so that a later
    /// RETI reconstructs PC correctly (the reference implementation pushes
    /// high-then-low here, which is a bug this emulator does not reproduce).
    fn fire_timer_interrupt(&mut self) {
        self.push_return_address(self.pc);
        self.pc = self.target.timer_interrupt_address().wrapping_add(self.target.entry_address());
    }

    /// Runs a single instruction. Returns `false` if the program has
    /// terminated (fell off the end of flash, hit `BREAK`, or hit the
    /// idiomatic `rjmp .-2` spin-forever sentinel).
    pub fn fetch(&mut self) -> bool {
        if self.halted || self.pc as usize >= crate::target::FLASH_SIZE {
            return false;
        }
        let (hi, lo) = self.opcode_at(self.pc);
        if (hi, lo) == BREAK_OPCODE || (hi, lo) == SPIN_FOREVER_OPCODE {
            return false;
        }

        log::trace!("fetch pc={:#06x} opcode={:02x}{:02x}", self.pc, hi, lo);
        let instruction = decode(hi, lo, &self.memory, self.pc);
        instruction.execute(self);
        self.memory.settle_peripherals();
        self.instructions_run += 1;

        !self.halted
    }

    /// Runs up to `n` instructions, injecting a Timer/Counter0 overflow
    /// interrupt every `TIMER_PERIOD` instructions. Returns `false` once the
    /// program terminates.
    pub fn fetch_n(&mut self, n: u64) -> bool {
        for _ in 0..n {
            if !self.fetch() {
                return false;
            }
            if self.instructions_run % TIMER_PERIOD == 0 {
                self.fire_timer_interrupt();
            }
        }
        true
    }
}
