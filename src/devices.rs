//! The emulator's only contact with the outside world: a small synchronous
//! callback surface invoked in-line from the fetch loop and from memory
//! writes. Implementations must not re-enter the engine.

use std::any::Any;

/// `Any` lets tests recover the concrete host type back out of `Cpu::host()`
/// (which only hands back `&dyn Host`) so they can inspect a `RecordingHost`'s
/// recorded calls after driving a program through real instruction execution.
pub trait Host: Any {
    fn print(&mut self, message: &str);
    fn port_write(&mut self, port_index: usize, value: u8);
    fn spi_write(&mut self, value: u8);
    fn refresh_ui(&mut self) {}
    fn as_any(&self) -> &dyn Any;
}

/// Default host for the CLI binary: logs everything through `log`.
#[derive(Default)]
pub struct ConsoleHost;

impl Host for ConsoleHost {
    fn print(&mut self, message: &str) {
        log::info!("{}", message);
    }

    fn port_write(&mut self, port_index: usize, value: u8) {
        log::debug!("port {} <- {:#04x}", port_index, value);
    }

    fn spi_write(&mut self, value: u8) {
        log::debug!("spi <- {:#04x}", value);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Test double recording every callback invocation for assertion.
#[derive(Default)]
pub struct RecordingHost {
    pub messages: Vec<String>,
    pub port_writes: Vec<(usize, u8)>,
    pub spi_writes: Vec<u8>,
    pub refreshes: usize,
}

impl Host for RecordingHost {
    fn print(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn port_write(&mut self, port_index: usize, value: u8) {
        self.port_writes.push((port_index, value));
    }

    fn spi_write(&mut self, value: u8) {
        self.spi_writes.push(value);
    }

    fn refresh_ui(&mut self) {
        self.refreshes += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
