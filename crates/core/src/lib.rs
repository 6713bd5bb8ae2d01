pub mod config;
pub mod debug_info;
pub mod error;
pub mod object;
pub mod scope;
pub mod value;

pub use config::Config;
pub use debug_info::*;
pub use error::*;
pub use object::*;
pub use scope::*;
pub use value::*;
