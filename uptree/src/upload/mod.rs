mod conflict;
mod item;
mod progress;
mod session;
mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use conflict::{
    ConflictPolicy, DEFAULT_STAT_BATCH_SIZE, DirectoryBatch, RenameError, RenameJob,
    UnknownPolicy, resolve_directory, resolve_free_path, split_extension, stat_in_slices,
    suffixed_path,
};
pub use item::{
    Item, ItemEvent, ItemId, ItemKind, ItemStatus, ItemTree, KindFilter, PathError, TreeError,
    Walk,
};
pub use session::{
    PrepareOutcome, PrepareReport, ProcessReport, ProgressSink, Rename, Session, SessionError,
};
pub use transfer::{HttpTransport, TransferError, Transport, UploadJob};
