pub mod autolayout;
pub mod blend;
pub mod config;
pub mod geometry;
pub mod id;
pub mod integrity;
pub mod layout;
pub mod model;
pub mod records;
pub mod resolve;
pub mod tree;

pub use autolayout::{arrange, compute_size};
pub use blend::{Blended, BlendedConstraints, blend};
pub use config::{ConfigError, LayoutConfig};
pub use geometry::{Rect, Size};
pub use id::NodeId;
pub use integrity::{IntegrityError, check_integrity};
pub use layout::{LayoutMap, commit_all, commit_layout, resolve_layout, resolve_subtree};
pub use model::*;
pub use records::RecordError;
pub use resolve::resolve;
pub use tree::{NodeMap, SceneTree};
