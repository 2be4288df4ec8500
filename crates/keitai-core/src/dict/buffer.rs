//! Little-endian cursor-free readers and append-only writers over byte buffers.
//!
//! Reads are bounds-checked and return `None` past the end; callers decide
//! whether that means "default value" or "truncated file".

#[derive(Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.data
            .get(offset..offset.checked_add(N)?)
            .and_then(|b| b.try_into().ok())
    }

    pub(crate) fn u8(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    pub(crate) fn i16(&self, offset: usize) -> Option<i16> {
        self.array(offset).map(i16::from_le_bytes)
    }

    pub(crate) fn i32(&self, offset: usize) -> Option<i32> {
        self.array(offset).map(i32::from_le_bytes)
    }

    pub(crate) fn u32(&self, offset: usize) -> Option<u32> {
        self.array(offset).map(u32::from_le_bytes)
    }

    /// NUL-terminated UTF-8 string starting at `offset`, plus the offset just
    /// past the terminator. A missing terminator reads to the end of the buffer.
    pub(crate) fn cstr(&self, offset: usize) -> Option<(&'a str, usize)> {
        let tail = self.data.get(offset..)?;
        let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        let s = std::str::from_utf8(&tail[..len]).ok()?;
        Some((s, (offset + len + 1).min(self.data.len())))
    }
}

#[derive(Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn position(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn put_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_cstr(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_past_end() {
        let mut w = ByteWriter::new();
        w.put_i16(-3);
        w.put_i32(70000);
        w.put_cstr("名詞");
        let data = w.into_inner();
        let r = ByteReader::new(&data);

        assert_eq!(r.i16(0), Some(-3));
        assert_eq!(r.i32(2), Some(70000));
        assert_eq!(r.cstr(6), Some(("名詞", data.len())));
        assert_eq!(r.i32(data.len() - 2), None);
        assert_eq!(r.i16(usize::MAX), None);
        assert_eq!(r.u8(data.len()), None);
        assert_eq!(r.cstr(data.len() + 1), None);
    }

    #[test]
    fn test_cstr_without_terminator() {
        let data = b"abc".to_vec();
        let r = ByteReader::new(&data);
        assert_eq!(r.cstr(1), Some(("bc", 3)));
    }
}
