pub mod assemble;
pub mod dataset;
pub mod dump;
pub mod error;
pub mod index;
pub mod normalize;
pub mod path;
pub mod record;
pub mod store;

pub mod prelude {
    pub use super::assemble::assemble;
    pub use super::dataset::{CollectionRecord, Dataset, RepoIndex};
    pub use super::dump::{BuildFields, FileDescriptor, RawBuildRecord, RawCollectionRecord};
    pub use super::error::*;
    pub use super::index::build_index;
    pub use super::normalize::normalize_record;
    pub use super::path::{AnnexKey, monolith_relpath};
    pub use super::record::CanonicalRecord;
    pub use super::store::ArtifactStore;
}
