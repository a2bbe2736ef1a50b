pub mod iou_tracker;
