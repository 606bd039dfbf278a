//! Storage adapters implementing the repository traits.

pub mod games_memory;
pub mod games_sea;

pub use games_memory::GameRepoMemory;
pub use games_sea::GameRepoSea;
