mod fine_world;
mod setups;
mod steps;

pub use fine_world::FineWorld;
