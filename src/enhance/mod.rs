pub mod engine;
pub mod params;

pub use engine::enhance;
pub use params::{EnhanceParams, ParamStore, TileGrid};
