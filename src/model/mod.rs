//! Model module - classifier, training and the persisted artifact

pub mod artifact;
pub mod logistic;
pub mod metrics;
pub mod split;
pub mod train;

pub use artifact::{AttritionPipeline, ARTIFACT_FORMAT_VERSION};
pub use logistic::LogisticRegression;
pub use metrics::{average_precision, roc_auc, ConfusionMatrix, SplitMetrics};
pub use split::{stratified_split, SplitIndices};
pub use train::{export_artifacts, train_pipeline, ArtifactPaths, TrainConfig, TrainedModel};
