pub mod status;
pub mod propvariant;
pub mod format;
pub mod property;
pub mod managed;
pub mod bridge;
pub mod cache;
pub mod io_stream;
pub mod callback;
pub mod driver;

pub use bridge::{BridgeError, Crossing};
pub use callback::{ArchiveUpdateCallback, OperationResult, UpdateCallbackAdapter, UpdateItemInfo, UpdateOptions};
pub use format::ArchiveFormat;
pub use managed::{Attribute, ManagedFault, OutItem, OutItemFactory, OutItemRecord, UpdateCallback, Value};
pub use property::PropId;
pub use propvariant::{FileTime, PropVariant};
