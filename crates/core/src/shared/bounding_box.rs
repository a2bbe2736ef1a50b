/// Axis-aligned face box in pixel coordinates, as returned by a detect worker.
///
/// Serialized on the wire as an `(x, y, w, h)` quadruple of `u16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl BoundingBox {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x) as u32;
        let iy1 = self.y.max(other.y) as u32;
        let ix2 = (self.x as u32 + self.width as u32).min(other.x as u32 + other.width as u32);
        let iy2 = (self.y as u32 + self.height as u32).min(other.y as u32 + other.height as u32);

        let inter = ix2.saturating_sub(ix1) as f64 * iy2.saturating_sub(iy1) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }

    /// Intersects the box with a `width` x `height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_to(&self, width: u16, height: u16) -> Option<BoundingBox> {
        let x2 = (self.x as u32 + self.width as u32).min(width as u32);
        let y2 = (self.y as u32 + self.height as u32).min(height as u32);
        if self.x >= width || self.y >= height || x2 <= self.x as u32 || y2 <= self.y as u32 {
            return None;
        }
        Some(BoundingBox {
            x: self.x,
            y: self.y,
            width: (x2 - self.x as u32) as u16,
            height: (y2 - self.y as u32) as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(x: u16, y: u16, w: u16, h: u16) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical_boxes() {
        let a = bbox(10, 10, 100, 100);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        assert_relative_eq!(bbox(0, 0, 50, 50).iou(&bbox(100, 100, 50, 50)), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 10000 + 10000 - 5000 = 15000
        let a = bbox(0, 0, 100, 100);
        let b = bbox(50, 0, 100, 100);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_touching_edges() {
        assert_relative_eq!(bbox(0, 0, 50, 50).iou(&bbox(50, 0, 50, 50)), 0.0);
    }

    #[rstest]
    #[case::zero_width(bbox(0, 0, 0, 100), bbox(0, 0, 50, 50))]
    #[case::zero_height(bbox(0, 0, 100, 0), bbox(0, 0, 50, 50))]
    fn test_iou_degenerate(#[case] a: BoundingBox, #[case] b: BoundingBox) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_does_not_overflow_near_u16_max() {
        let a = bbox(u16::MAX - 10, u16::MAX - 10, 20, 20);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamp_inside_frame_is_identity() {
        assert_eq!(bbox(10, 10, 20, 20).clamp_to(100, 100), Some(bbox(10, 10, 20, 20)));
    }

    #[test]
    fn test_clamp_trims_overhang() {
        assert_eq!(bbox(90, 80, 20, 40).clamp_to(100, 100), Some(bbox(90, 80, 10, 20)));
    }

    #[rstest]
    #[case::outside(bbox(200, 200, 10, 10))]
    #[case::empty(bbox(10, 10, 0, 10))]
    fn test_clamp_rejects_empty_intersection(#[case] b: BoundingBox) {
        assert_eq!(b.clamp_to(100, 100), None);
    }
}
