//! Record storage for clinicdb
//!
//! One data file per entity kind, holding length-prefixed, delimiter
//! separated frames. Frames are found through the indexes by byte offset.
//!
//! # Design Principles
//!
//! - Append or overwrite in place; never shift, never truncate
//! - Deletion flips a status byte, the span stays as a reusable slot
//! - Reused slots are padded with spaces up to their capacity
//! - Decoding is silent; callers turn `None` into `MalformedRecord`

mod data_file;
mod errors;
pub mod frame;

pub use data_file::DataFile;
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use frame::{Frame, FrameStatus};
