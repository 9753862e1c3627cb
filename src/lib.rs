pub mod charges;
pub mod core;
pub mod gateway;
pub mod items;
pub mod sweep;
pub mod utils;
