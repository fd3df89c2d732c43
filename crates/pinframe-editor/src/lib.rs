pub mod commands;
pub mod inspector;
pub mod preview;
pub mod session;

pub use commands::CommandStack;
pub use inspector::ConstraintPanel;
pub use preview::{Gesture, GestureKind, Handle, PreviewFrame, compute_preview};
pub use session::{Mutation, Session, SessionConfig};
