//! Domain model (IDs, tasks, envelopes, batches, outcomes, errors).

pub mod batch;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod task;

pub use batch::{BatchItem, BatchItemFailure, BatchResult, DeliveredTask};
pub use envelope::{DEFAULT_MESSAGE_GROUP_ID, TaskEnvelope, format_timestamp};
pub use errors::{DecodeError, EncodeError, ErrorKind, ProcessingError, ValidationError};
pub use ids::TaskId;
pub use outcome::{ProcessingResult, ProcessingStatus};
pub use task::{NormalizedTask, Priority, Task, UnknownPriority};
