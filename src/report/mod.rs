//! Report module - model card and terminal summaries

pub mod model_card;
pub mod summary;

pub use model_card::ModelCard;
pub use summary::*;
