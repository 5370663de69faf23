/// A device window on the guest physical MMIO bus.
///
/// `offset` is relative to the start of the window. `size` is the access width in bytes as decoded
/// by the bus; devices that only support a subset of widths document it on their implementation.
pub trait MmioHandler {
    fn read(&mut self, offset: u64, size: usize) -> u64;
    fn write(&mut self, offset: u64, size: usize, value: u64);
}
