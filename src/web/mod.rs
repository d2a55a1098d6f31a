pub mod api;
pub mod pages;
pub mod server;
pub mod state;

pub use server::*;
pub use state::*;
