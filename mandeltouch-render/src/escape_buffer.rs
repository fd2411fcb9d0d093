use mandeltouch_core::EscapeTime;

/// Per-pixel escape results for a full frame, row-major.
///
/// This is the raw output of the renderer before coloring. Keeping it apart
/// from colored pixels lets a new color table or offset be applied without
/// iterating again.
#[derive(Debug, Clone, PartialEq)]
pub struct EscapeBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<EscapeTime>,
}

impl EscapeBuffer {
    /// A buffer with every pixel marked bounded.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![EscapeTime::Bounded; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<EscapeTime> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// One row of escape results.
    pub fn row(&self, y: u32) -> &[EscapeTime] {
        let start = (y * self.width) as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Number of bounded pixels.
    pub fn bounded_count(&self) -> usize {
        self.data.iter().filter(|e| e.is_bounded()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_all_bounded() {
        let buf = EscapeBuffer::new(5, 3);
        assert_eq!(buf.data.len(), 15);
        assert_eq!(buf.bounded_count(), 15);
    }

    #[test]
    fn get_is_row_major() {
        let mut buf = EscapeBuffer::new(4, 2);
        buf.data[5] = EscapeTime::Escaped(9);
        assert_eq!(buf.get(1, 1), Some(EscapeTime::Escaped(9)));
        assert_eq!(buf.row(1)[1], EscapeTime::Escaped(9));
        assert_eq!(buf.get(4, 0), None);
        assert_eq!(buf.get(0, 2), None);
    }
}
