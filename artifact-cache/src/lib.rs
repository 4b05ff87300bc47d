mod cache;
mod generator;
mod key;

pub use cache::{ArtifactCache, ArtifactHandle};
pub use generator::{CommandGenerator, Generator};
pub use key::{derive_cache_key, describe};
