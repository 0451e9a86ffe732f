mod loader;

pub use loader::{PayeBracketRecord, PayeTableLoader, PayeTableLoaderError};
