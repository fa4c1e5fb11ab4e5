//! Pipeline module - cleaning, feature engineering and preprocessing

pub mod cleaning;
pub mod features;
pub mod groups;
pub mod loader;
pub mod preprocess;
pub mod target;

pub use cleaning::*;
pub use features::*;
pub use groups::*;
pub use loader::*;
pub use preprocess::{build_preprocessor, FittedPreprocessor, Preprocessor};
pub use target::*;
