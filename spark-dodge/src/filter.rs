use crate::geometry::BoundingBox;

/// Keeps the detections that matter for planning: close enough to reach the
/// lower half of the frame and large enough not to be noise.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ObstacleFilter {
    frame_width: u32,
    frame_height: u32,
}

impl ObstacleFilter {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }

    /// Lowest bottom edge a box may have, in pixels.
    pub fn min_bottom(&self) -> i32 {
        (self.frame_height / 2) as i32
    }

    /// Smallest area a box may cover, in square pixels.
    pub fn min_area(&self) -> u64 {
        ((self.frame_height as f64 / 4.0) * (self.frame_width as f64 / 4.0)) as u64
    }

    pub fn is_relevant(&self, bbox: &BoundingBox) -> bool {
        bbox.bottom() >= self.min_bottom() && bbox.area() >= self.min_area()
    }

    pub fn apply(&self, boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        boxes
            .into_iter()
            .filter(|bbox| self.is_relevant(bbox))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER: ObstacleFilter = ObstacleFilter {
        frame_width: 630,
        frame_height: 360,
    };

    #[test]
    fn thresholds_for_default_frame() {
        assert_eq!(FILTER.min_bottom(), 180);
        assert_eq!(FILTER.min_area(), 14_175);
    }

    #[test]
    fn high_boxes_are_dropped_regardless_of_size() {
        let huge = BoundingBox::from_edges(0, 0, 630, 179);
        assert!(!FILTER.is_relevant(&huge));
    }

    #[test]
    fn small_boxes_are_dropped_in_the_lower_half() {
        let small = BoundingBox::from_edges(100, 250, 200, 300);
        assert_eq!(small.area(), 5_000);
        assert!(!FILTER.is_relevant(&small));
    }

    #[test]
    fn filtering_is_order_preserving_and_idempotent() {
        let boxes = vec![
            BoundingBox::from_edges(0, 200, 200, 300),
            BoundingBox::from_edges(0, 0, 630, 100),
            BoundingBox::from_edges(300, 180, 450, 360),
            BoundingBox::from_edges(10, 300, 20, 310),
        ];

        let once = FILTER.apply(boxes);
        assert_eq!(
            once,
            vec![
                BoundingBox::from_edges(0, 200, 200, 300),
                BoundingBox::from_edges(300, 180, 450, 360),
            ]
        );
        assert_eq!(FILTER.apply(once.clone()), once);
    }
}
