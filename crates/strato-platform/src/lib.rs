#![forbid(unsafe_code)]

pub mod irq;
pub mod mmio;

pub use irq::{IrqLine, NoIrq};
pub use mmio::MmioHandler;
