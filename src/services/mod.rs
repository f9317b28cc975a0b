pub mod diversity;
pub mod precompute;
pub mod recommendations;
pub mod upstream;

pub use diversity::DiversityFilter;
pub use precompute::{PrecomputeJob, PrecomputeReport};
pub use recommendations::{RecommendationService, RecommendationSettings};
