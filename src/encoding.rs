//! Base64 编解码（标准字母表，带填充）

use crate::common::errors::Result;
use crate::common::selftest::{SelfTest, SelfTestReport};
use base64::{Engine, engine::general_purpose};

pub fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

/// 解码；非法字符或错误填充返回 [`crate::Error::Base64`]
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(encoded)?)
}

/// RFC 4648 第 10 节的测试向量
const VECTORS: [(&str, &str); 7] = [
    ("", ""),
    ("f", "Zg=="),
    ("fo", "Zm8="),
    ("foo", "Zm9v"),
    ("foob", "Zm9vYg=="),
    ("fooba", "Zm9vYmE="),
    ("foobar", "Zm9vYmFy"),
];

/// 运行 Base64 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("BASE64", verbose);
    for (plain, expected) in VECTORS {
        st.check(&format!("encode {:?}", plain), encode(plain.as_bytes()) == expected)?;
        st.check(&format!("decode {:?}", expected), decode(expected)? == plain.as_bytes())?;
    }
    Ok(st.finish())
}
