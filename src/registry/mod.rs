pub mod builtin;
pub mod core;
pub mod shared;

pub use builtin::register_builtins;
pub use self::core::{ParserInfo, ParserRegistry};
pub use shared::SharedRegistry;
