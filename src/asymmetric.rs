//! 非对称密码核心模块：RSA

pub mod systems;

pub use self::systems::rsa::{KeyState, Padding, RsaContext, RsaMode};
