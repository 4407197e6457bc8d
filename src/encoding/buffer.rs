//! # Growable Output Buffer
//!
//! `ByteBuffer` is the output side of the decoder: a growable byte vector
//! with a `tell()` cursor and support for the reserve-then-patch pattern
//! used by every length-prefixed encoding in this crate. Many frames cannot
//! know their byte length up front, so the writer reserves a 4-byte slot,
//! emits the payload, and patches the slot with the bytes written since.
//!
//! Every `reserve_u32` is matched by exactly one patch on the success path.
//! Error paths abandon the whole buffer, so an unpatched slot never escapes.

#[derive(Debug, Default)]
pub struct ByteBuffer {
    buf: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current write position, equal to the number of bytes emitted so far.
    pub fn tell(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `bytes` followed by a NUL terminator.
    pub fn write_cstr(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f64_le(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Reserves a 4-byte length slot at the current position and returns its
    /// offset for a later patch.
    pub fn reserve_u32(&mut self) -> usize {
        let offset = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        offset
    }

    pub fn patch_u32_le(&mut self, offset: usize, v: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn patch_i32_le(&mut self, offset: usize, v: i32) {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
