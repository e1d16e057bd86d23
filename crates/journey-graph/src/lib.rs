pub mod catalog;
pub mod engine;
pub mod layout;
pub mod recommend;
pub mod status;
pub mod store;
pub mod validator;

pub use catalog::*;
pub use engine::*;
pub use layout::*;
pub use recommend::*;
pub use status::*;
pub use store::*;
pub use validator::*;
