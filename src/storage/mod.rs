pub mod feedback;

pub use feedback::{FeedbackAggregate, FeedbackStore, FeedbackVote};
