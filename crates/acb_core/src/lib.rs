pub mod capes;
pub mod codec;
pub mod compact;
pub mod container;
pub mod core_api;
pub mod cursor;
pub mod error;
pub mod layout;
pub mod patch;
