//! The border store: one xz stream of `{name}:length\ncontent\n` records,
//! scanned front to back. There is no index.

pub mod lookup;
pub mod reader;
pub mod writer;

pub use lookup::search;
pub use reader::{BorderStoreReader, StoreFileReader};
pub use writer::BorderStoreWriter;
