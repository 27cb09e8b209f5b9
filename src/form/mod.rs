pub mod submission;
pub mod export;

pub use submission::{check_roster_headers, parse_submission, validate_submission, SubmitRequest};
pub use export::ExportSummary;
