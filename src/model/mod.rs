/// Regression model: CART trees, the bagged forest built from them, training
/// with a per-subset memo, and the on-disk artifact.
pub mod forest;
pub mod persistence;
pub mod trainer;
pub mod tree;

pub use persistence::{ModelMetadata, ModelStore};
pub use trainer::{FEATURE_NAMES, ModelCache, TrainedModel, train};
