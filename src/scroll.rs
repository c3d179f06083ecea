/// Horizontal UV scroll used to fake forward motion through the video texture.
///
/// The value advances by a fixed increment every tick and wraps to exactly `0.0`
/// once it reaches `1.0`, so it always stays in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOffset {
    value: f32,
    increment: f32,
}

impl ScrollOffset {
    pub fn new(start: f32, increment: f32) -> Self {
        let value = if (0.0..1.0).contains(&start) { start } else { 0.0 };
        Self { value, increment }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }

    /// Advance one tick and return the new offset.
    pub fn advance(&mut self) -> f32 {
        self.value += self.increment;
        if self.value >= 1.0 {
            self.value = 0.0;
        }
        self.value
    }
}

/// Endless sequence of offsets, one per tick.
impl Iterator for ScrollOffset {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollOffset;

    #[test]
    fn wraps_to_exactly_zero() {
        let mut s = ScrollOffset::new(0.0, 0.25);
        let seen: Vec<f32> = s.by_ref().take(4).collect();
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 0.0]);
        assert_eq!(s.value(), 0.0);
    }

    #[test]
    fn stays_in_unit_interval_over_many_ticks() {
        let s = ScrollOffset::new(0.0, 0.0009);
        for v in s.take(10_000) {
            assert!((0.0..1.0).contains(&v), "offset {} escaped [0, 1)", v);
        }
    }

    #[test]
    fn out_of_range_start_is_reset() {
        assert_eq!(ScrollOffset::new(1.0, 0.1).value(), 0.0);
        assert_eq!(ScrollOffset::new(-0.5, 0.1).value(), 0.0);
        assert_eq!(ScrollOffset::new(0.5, 0.1).value(), 0.5);
    }
}
