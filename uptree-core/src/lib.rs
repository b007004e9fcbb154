mod client;
mod remote;

pub use client::{CellsClient, NodeMetadata, NodeStat, NodeType, RemoteError, UploadLink};
pub use remote::RemoteTree;
