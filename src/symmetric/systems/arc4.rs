//! ARC4 流密码（与 RC4 兼容）

use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 最长 256 字节的密钥
pub const MAX_KEY_LEN: usize = 256;

/// ARC4 上下文：置换表与两个索引。
///
/// 密钥流状态随每次 [`Arc4::crypt`] 推进，连续调用等同于对拼接后的输入一次加密。
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Arc4 {
    x: u8,
    y: u8,
    m: [u8; 256],
}

impl fmt::Debug for Arc4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arc4").finish_non_exhaustive()
    }
}

impl Arc4 {
    /// 用 1~256 字节的密钥初始化
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(Error::InvalidStreamKeyLength(key.len()));
        }
        let mut m = [0u8; 256];
        for (i, slot) in m.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut j: u8 = 0;
        for i in 0..256 {
            j = j.wrapping_add(m[i]).wrapping_add(key[i % key.len()]);
            m.swap(i, j as usize);
        }
        Ok(Self { x: 0, y: 0, m })
    }

    /// 用新密钥重置状态
    pub fn setup(&mut self, key: &[u8]) -> Result<()> {
        *self = Self::new(key)?;
        Ok(())
    }

    /// 加密或解密（两者相同）
    pub fn crypt(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = input.to_vec();
        self.apply_keystream(&mut out);
        out
    }

    /// 就地异或密钥流
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        let (mut x, mut y) = (self.x, self.y);
        for byte in data.iter_mut() {
            x = x.wrapping_add(1);
            let a = self.m[x as usize];
            y = y.wrapping_add(a);
            let b = self.m[y as usize];
            self.m[x as usize] = b;
            self.m[y as usize] = a;
            *byte ^= self.m[a.wrapping_add(b) as usize];
        }
        self.x = x;
        self.y = y;
    }
}

const VECTORS: [(&str, &str, &str); 3] = [
    ("0123456789abcdef", "0123456789abcdef", "75b7878099e0c596"),
    ("0123456789abcdef", "0000000000000000", "7494c2e7104b0879"),
    ("0000000000000000", "0000000000000000", "de188941a3375d3a"),
];

/// 运行 ARC4 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("ARC4", verbose);
    for (i, (key, plain, cipher)) in VECTORS.into_iter().enumerate() {
        let mut arc4 = Arc4::new(&hex::decode(key)?)?;
        let ct = arc4.crypt(&hex::decode(plain)?);
        st.check(&format!("vector {}", i + 1), ct == hex::decode(cipher)?)?;
    }
    Ok(st.finish())
}
