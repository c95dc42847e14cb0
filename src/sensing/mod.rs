pub mod controller;
pub mod debug_dump;
pub mod loop_worker;
pub mod matcher;
pub mod pattern;
pub mod sampler;

pub use controller::DetectionController;
pub use debug_dump::DebugDump;
pub use loop_worker::DetectionLoop;
pub use matcher::match_score;
pub use pattern::ReferencePattern;
pub use sampler::RegionSampler;
