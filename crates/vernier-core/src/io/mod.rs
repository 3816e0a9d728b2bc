pub mod snapshot;

pub use snapshot::{load_frame, save_frame};
