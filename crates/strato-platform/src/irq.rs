use std::cell::Cell;
use std::rc::Rc;

/// A level-triggered interrupt line driven by a device model.
///
/// Devices call [`IrqLine::set_level`] with the *current* level after every state change; they do
/// not track edges. Implementations must tolerate repeated calls with the same level.
pub trait IrqLine {
    fn set_level(&self, level: bool);
}

/// Interrupt line that is not wired to anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn set_level(&self, _level: bool) {}
}

impl IrqLine for Rc<Cell<bool>> {
    fn set_level(&self, level: bool) {
        self.set(level);
    }
}

impl<T: IrqLine + ?Sized> IrqLine for Box<T> {
    fn set_level(&self, level: bool) {
        (**self).set_level(level);
    }
}
