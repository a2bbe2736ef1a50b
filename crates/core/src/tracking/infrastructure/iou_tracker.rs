//! Greedy IoU tracker.
//!
//! Each update pairs boxes with existing objects in descending IoU order.
//! Unmatched boxes start new objects; objects unmatched for more than
//! `max_lost` consecutive updates are dropped.
use std::collections::HashSet;

use ndarray::s;

use crate::scheduling::tracked_object::TrackedObject;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::FACE_CROP_SIZE;
use crate::shared::frame::Frame;
use crate::tracking::domain::face_tracker::FaceTracker;

const MATCH_THRESH: f64 = 0.3;

pub struct IouTracker {
    id_prefix: String,
    next_id: u64,
    max_lost: usize,
    objects: Vec<TrackedObject>,
    frames_lost: Vec<usize>,
    removed: Vec<String>,
}

impl IouTracker {
    /// Object ids are `"{id_prefix}-{n}"`. They double as broker mailbox
    /// keys, so the prefix must be unique per session.
    pub fn new(id_prefix: impl Into<String>, max_lost: usize) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            next_id: 1,
            max_lost,
            objects: Vec::new(),
            frames_lost: Vec::new(),
            removed: Vec::new(),
        }
    }

    fn age_and_drop(&mut self, matched: &HashSet<usize>) {
        for (i, lost) in self.frames_lost.iter_mut().enumerate() {
            if !matched.contains(&i) {
                *lost += 1;
            }
        }
        let max_lost = self.max_lost;
        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .objects
            .drain(..)
            .zip(self.frames_lost.drain(..))
            .partition(|(_, lost)| *lost <= max_lost);
        self.removed
            .extend(dropped.into_iter().map(|(object, _)| object.id().to_string()));
        let (objects, frames_lost): (Vec<_>, Vec<_>) = kept.into_iter().unzip();
        self.objects = objects;
        self.frames_lost = frames_lost;
    }

    fn is_visible(&self, object: &TrackedObject) -> bool {
        self.objects
            .iter()
            .position(|o| o.id() == object.id())
            .is_some_and(|i| self.frames_lost[i] == 0)
    }
}

impl FaceTracker for IouTracker {
    fn update(&mut self, boxes: &[BoundingBox]) {
        let current: Vec<BoundingBox> = self.objects.iter().map(TrackedObject::bbox).collect();
        let matches = greedy_match(&current, boxes, MATCH_THRESH);

        let mut matched_objects = HashSet::new();
        let mut matched_boxes = HashSet::new();
        for (oi, bi) in matches {
            self.objects[oi].set_bbox(boxes[bi]);
            self.frames_lost[oi] = 0;
            matched_objects.insert(oi);
            matched_boxes.insert(bi);
        }

        self.age_and_drop(&matched_objects);

        for (bi, bbox) in boxes.iter().enumerate() {
            if matched_boxes.contains(&bi) {
                continue;
            }
            let id = format!("{}-{}", self.id_prefix, self.next_id);
            self.next_id += 1;
            self.objects.push(TrackedObject::new(id, *bbox));
            self.frames_lost.push(0);
        }
    }

    fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    fn objects_mut(&mut self) -> &mut [TrackedObject] {
        &mut self.objects
    }

    fn take_removed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.removed)
    }

    /// Nearest-neighbour resample of the object's box to the identify crop
    /// size. Objects not matched in the latest update have no crop.
    fn crop_face(&self, frame: &Frame, object: &TrackedObject) -> Option<Frame> {
        if !self.is_visible(object) {
            return None;
        }
        let region = object.bbox().clamp_to(frame.width(), frame.height())?;
        Some(resample(frame, region, FACE_CROP_SIZE))
    }
}

fn resample(frame: &Frame, region: BoundingBox, size: u16) -> Frame {
    let src = frame.as_ndarray();
    let out = size as usize;
    let mut data = Vec::with_capacity(out * out * frame.channels() as usize);
    for oy in 0..out {
        let sy = region.y as usize + oy * region.height as usize / out;
        for ox in 0..out {
            let sx = region.x as usize + ox * region.width as usize / out;
            data.extend(src.slice(s![sy, sx, ..]).iter());
        }
    }
    Frame::new(data, size, size, frame.channels())
}

fn greedy_match(
    objects: &[BoundingBox],
    boxes: &[BoundingBox],
    thresh: f64,
) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (oi, current) in objects.iter().enumerate() {
        for (bi, candidate) in boxes.iter().enumerate() {
            let score = current.iou(candidate);
            if score >= thresh {
                pairs.push((oi, bi, score));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_objects = HashSet::new();
    let mut used_boxes = HashSet::new();
    let mut matches = Vec::new();
    for (oi, bi, _) in pairs {
        if !used_objects.contains(&oi) && !used_boxes.contains(&bi) {
            used_objects.insert(oi);
            used_boxes.insert(bi);
            matches.push((oi, bi));
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::FACE_CROP_CHANNELS;

    fn bbox(x: u16, y: u16, w: u16, h: u16) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    fn ids(tracker: &IouTracker) -> Vec<String> {
        tracker.objects().iter().map(|o| o.id().to_string()).collect()
    }

    #[test]
    fn test_new_boxes_get_unique_prefixed_ids() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(0, 0, 50, 50), bbox(100, 100, 50, 50)]);
        assert_eq!(ids(&tracker), vec!["s1-1", "s1-2"]);
    }

    #[test]
    fn test_consistent_id_across_updates() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(10, 10, 50, 50)]);
        tracker.update(&[bbox(12, 12, 50, 50)]);
        assert_eq!(ids(&tracker), vec!["s1-1"]);
        assert_eq!(tracker.objects()[0].bbox(), bbox(12, 12, 50, 50));
    }

    #[test]
    fn test_state_survives_association() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(10, 10, 50, 50)]);
        tracker.objects_mut()[0].record_attempt(std::time::Instant::now());
        tracker.update(&[bbox(11, 11, 50, 50)]);
        assert_eq!(tracker.objects()[0].attempts(), 1);
    }

    #[test]
    fn test_lost_object_removal() {
        let mut tracker = IouTracker::new("s1", 2);
        tracker.update(&[bbox(10, 10, 50, 50)]);
        tracker.update(&[]);
        tracker.update(&[]);
        assert_eq!(tracker.objects().len(), 1);
        tracker.update(&[]);
        assert!(tracker.objects().is_empty());
    }

    #[test]
    fn test_dropped_ids_are_reported_once() {
        let mut tracker = IouTracker::new("s1", 0);
        tracker.update(&[bbox(0, 0, 20, 20), bbox(100, 100, 20, 20)]);
        assert!(tracker.take_removed().is_empty());

        tracker.update(&[bbox(1, 1, 20, 20)]);
        assert_eq!(tracker.take_removed(), vec!["s1-2".to_string()]);
        assert!(tracker.take_removed().is_empty());
        assert_eq!(ids(&tracker), vec!["s1-1"]);
    }

    #[test]
    fn test_distant_box_starts_new_object() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(0, 0, 20, 20)]);
        tracker.update(&[bbox(200, 200, 20, 20)]);
        assert_eq!(ids(&tracker), vec!["s1-1", "s1-2"]);
    }

    #[test]
    fn test_crop_has_identify_shape_and_content() {
        let mut tracker = IouTracker::new("s1", 5);
        // 40x40 RGB frame, top-left 20x20 quadrant painted 200
        let mut data = vec![0u8; 40 * 40 * 3];
        for y in 0..20 {
            for x in 0..20 {
                for c in 0..3 {
                    data[(y * 40 + x) * 3 + c] = 200;
                }
            }
        }
        let frame = Frame::new(data, 40, 40, 3);
        tracker.update(&[bbox(0, 0, 20, 20)]);

        let crop = tracker.crop_face(&frame, &tracker.objects()[0]).unwrap();

        assert_eq!(crop.shape(), (FACE_CROP_SIZE, FACE_CROP_SIZE, FACE_CROP_CHANNELS));
        assert!(crop.data().iter().all(|&b| b == 200));
    }

    #[test]
    fn test_no_crop_outside_frame() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(100, 100, 10, 10)]);
        let frame = Frame::zeroed(50, 50, 3);
        assert!(tracker.crop_face(&frame, &tracker.objects()[0]).is_none());
    }

    #[test]
    fn test_no_crop_for_lost_object() {
        let mut tracker = IouTracker::new("s1", 5);
        tracker.update(&[bbox(0, 0, 10, 10)]);
        tracker.update(&[]);
        let frame = Frame::zeroed(50, 50, 3);
        assert!(tracker.crop_face(&frame, &tracker.objects()[0]).is_none());
    }
}
