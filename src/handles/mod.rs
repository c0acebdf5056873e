pub mod entry;
pub mod handle;
pub mod internal_props;
pub mod stats;
pub mod table;

pub use entry::Entry;
pub use handle::Handle;
pub use internal_props::{InternalProps, NativeHandle, NativePointer};
pub use stats::TableStats;
pub use table::HandleTable;
