//! Inference-time feature preprocessing

pub mod encoder;
mod features;
pub mod scaler;
pub mod schema;

pub use encoder::{CategoryEncoder, LabelEncoder};
pub use features::FeatureTransformer;
pub use scaler::{ColumnStats, FeatureScaler, StandardScaler};
pub use schema::{FeatureColumn, FEATURE_COUNT, FEATURE_ORDER};
