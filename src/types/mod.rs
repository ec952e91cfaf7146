pub mod analysis;
pub mod asset;
