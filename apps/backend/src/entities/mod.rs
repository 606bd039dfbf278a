pub mod games;

pub use games::Entity as Games;
pub use games::Model as GameRow;
