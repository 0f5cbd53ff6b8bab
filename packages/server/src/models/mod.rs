pub mod asset;
pub mod bulk;
pub mod health;
pub mod shared;
