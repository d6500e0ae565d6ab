pub mod assets;
pub mod classifier;
