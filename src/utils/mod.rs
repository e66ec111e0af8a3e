pub mod error;

pub use error::{AppError, ExtractionFailure, NotifyError, ProbeError, SessionError};
