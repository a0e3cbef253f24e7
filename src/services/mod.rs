pub mod activity_log;
pub mod collection;
pub mod recommendations;
pub mod scoring;
pub mod tag_weights;

pub use activity_log::ActivityLogger;
pub use collection::CollectionService;
pub use recommendations::RecommendationService;
