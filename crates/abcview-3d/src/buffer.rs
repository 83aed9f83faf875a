use wgpu::*;

const MIN_CAPACITY: u64 = 256;

/// A GPU buffer rewritten every frame, recreated larger when the frame's
/// data no longer fits.
pub struct DynamicBuffer {
    label: &'static str,
    usage: BufferUsages,
    buffer: Buffer,
    capacity: u64,
    len: u64,
}

impl DynamicBuffer {
    pub fn new(device: &Device, label: &'static str, usage: BufferUsages) -> Self {
        let usage = usage | BufferUsages::COPY_DST;
        let buffer = create(device, label, usage, MIN_CAPACITY);
        Self {
            label,
            usage,
            buffer,
            capacity: MIN_CAPACITY,
            len: 0,
        }
    }

    /// Replaces the contents with `data`. `data.len()` must be a multiple
    /// of four bytes.
    pub fn write(&mut self, device: &Device, queue: &Queue, data: &[u8]) {
        let needed = data.len() as u64;
        if needed > self.capacity {
            self.capacity = grown_capacity(self.capacity, needed);
            log::debug!("growing {} to {} bytes", self.label, self.capacity);
            self.buffer = create(device, self.label, self.usage, self.capacity);
        }
        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, data);
        }
        self.len = needed;
    }

    pub fn slice(&self) -> BufferSlice<'_> {
        self.buffer.slice(..self.len.max(COPY_BUFFER_ALIGNMENT))
    }
}

fn create(device: &Device, label: &str, usage: BufferUsages, size: u64) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn grown_capacity(current: u64, needed: u64) -> u64 {
    let mut capacity = current.max(MIN_CAPACITY);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}
