//! 对称密码核心模块：分组密码、链接模式与上下文

pub mod context;
pub mod modes;
pub mod systems;
pub mod traits;

pub use self::context::CipherContext;
pub use self::traits::{BlockCipher, CipherKind, Mode};
