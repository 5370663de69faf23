use strato_io_snapshot::io::state::codec::{Decoder, Encoder};
use strato_io_snapshot::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

use super::regs::SERIAL_REGS;
use super::{Channel, ChannelId, Escc, SERIO_QUEUE_SIZE};

const TAG_CHANNEL_B: u16 = 1;
const TAG_CHANNEL_A: u16 = 2;

fn encode_channel(chn: &Channel) -> Vec<u8> {
    Encoder::new()
        .u8(chn.reg)
        .bool(chn.intr.rx_pending)
        .bool(chn.intr.tx_pending)
        .bool(chn.intr.rx_under_service)
        .bool(chn.intr.tx_under_service)
        .u8(chn.rx)
        .u8(chn.tx)
        .bytes(&chn.wregs)
        .bytes(&chn.rregs)
        .vec_u8(&chn.queue.to_vec())
        .bool(chn.led_mode)
        .u8(chn.caps_lock_mode)
        .u8(chn.num_lock_mode)
        .finish()
}

fn decode_channel(chn: &mut Channel, buf: &[u8]) -> SnapshotResult<()> {
    let mut d = Decoder::new(buf);
    let reg = d.u8()?;
    if usize::from(reg) >= SERIAL_REGS {
        return Err(SnapshotError::InvalidFieldEncoding("invalid escc register pointer"));
    }
    let rx_pending = d.bool()?;
    let tx_pending = d.bool()?;
    let rx_under_service = d.bool()?;
    let tx_under_service = d.bool()?;
    let rx = d.u8()?;
    let tx = d.u8()?;
    let mut wregs = [0u8; SERIAL_REGS];
    wregs.copy_from_slice(d.bytes(SERIAL_REGS)?);
    let mut rregs = [0u8; SERIAL_REGS];
    rregs.copy_from_slice(d.bytes(SERIAL_REGS)?);
    let queued = d.vec_u8(SERIO_QUEUE_SIZE)?;
    let led_mode = d.bool()?;
    let caps_lock_mode = d.u8()?;
    let num_lock_mode = d.u8()?;
    d.finish()?;
    if caps_lock_mode > 3 || num_lock_mode > 3 {
        return Err(SnapshotError::InvalidFieldEncoding("invalid lock key state"));
    }
    if queued.len() > chn.queue.capacity() {
        return Err(SnapshotError::InvalidFieldEncoding("escc queue overflow"));
    }

    chn.reg = reg;
    chn.intr.rx_pending = rx_pending;
    chn.intr.tx_pending = tx_pending;
    chn.intr.rx_under_service = rx_under_service;
    chn.intr.tx_under_service = tx_under_service;
    chn.rx = rx;
    chn.tx = tx;
    chn.wregs = wregs;
    chn.rregs = rregs;
    chn.queue.restore(&queued, 0);
    chn.led_mode = led_mode;
    chn.caps_lock_mode = caps_lock_mode;
    chn.num_lock_mode = num_lock_mode;
    Ok(())
}

impl IoSnapshot for Escc {
    const DEVICE_ID: [u8; 4] = *b"ESCC";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_bytes(TAG_CHANNEL_B, encode_channel(&self.chn[ChannelId::B.index()]));
        w.field_bytes(TAG_CHANNEL_A, encode_channel(&self.chn[ChannelId::A.index()]));
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        for (tag, id) in [(TAG_CHANNEL_B, ChannelId::B), (TAG_CHANNEL_A, ChannelId::A)] {
            let chn = &mut self.chn[id.index()];
            chn.reset();
            if let Some(buf) = r.bytes(tag) {
                decode_channel(chn, buf)?;
            }
            chn.update_parameters();
        }
        self.update_irq();
        Ok(())
    }
}
