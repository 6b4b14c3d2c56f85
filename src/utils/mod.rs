pub mod contact;
pub mod id;
pub mod pagination;

pub use contact::*;
pub use id::*;
pub use pagination::*;
