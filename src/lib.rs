pub use lyra_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use lyra_server::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use lyra_fs::*;
}

pub mod prelude {
    pub use lyra_core::prelude::*;

    #[cfg(feature = "server")]
    pub use lyra_server::prelude::*;

    #[cfg(feature = "fs")]
    pub use lyra_fs::FsStore;
}
