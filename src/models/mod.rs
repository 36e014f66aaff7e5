mod cart;
mod course;
mod lecture;
mod progress;
mod wallet;

pub use cart::CartLineItem;
pub use course::{Course, UserProfile};
pub use lecture::Lecture;
pub use progress::{LectureState, ProgressRecord, ProgressSummary, COMPLETION_THRESHOLD};
pub use wallet::{TransactionStatus, WalletTransaction};
