pub mod document;
pub mod summary;
pub mod order;
pub mod position;
pub mod stock;

pub use document::*;
pub use summary::*;
pub use order::*;
pub use position::*;
pub use stock::*;
