pub mod types;
pub mod state;
pub mod render;
pub mod session;

pub use types::{find_tile, Badge, Location, TileDefinition, TILES, UNASSIGNED_KEY};
pub use state::AssignmentState;
pub use render::{BoardView, Renderer, PREVIEW_SIZE};
pub use session::{CountEdit, HeadcountSummary, Session, SubmitOutcome, Submission};
