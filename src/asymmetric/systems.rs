//! # Public-Key Systems
//!
//! RSA over the crate's own big-integer engine, with PKCS#1 v1.5 and v2.1
//! (OAEP / PSS) encodings.
//!
//! ---
//!
//! # 公钥密码系统模块
//!
//! 基于本库大数引擎的 RSA，支持 PKCS#1 v1.5 与 v2.1（OAEP / PSS）编码。

pub mod rsa;
