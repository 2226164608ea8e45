mod capture;
mod controller;
mod loop_worker;

pub use capture::{
    archive_screenshot, encode_for_classifier, Capturer, CommandCapturer, ImageSample,
    MAX_CAPTURE_WIDTH,
};
pub use controller::Scheduler;
pub use loop_worker::{LoopComponents, LoopConfig};
