//! 消息摘要。
//!
//! [`MdType`] 沿用 PolarSSL 的数值编号（0..=9），RSA 签名用它来选择 DigestInfo 中的
//! OID，OAEP/PSS 用它来选择 MGF1 的哈希。具体算法由 RustCrypto 的 `digest` 家族提供。

use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use digest::Digest;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 读取文件时的缓冲区大小
const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// 摘要算法标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MdType {
    None = 0,
    Md2 = 1,
    Md4 = 2,
    Md5 = 3,
    Sha1 = 4,
    Sha224 = 5,
    Sha256 = 6,
    Sha384 = 7,
    Sha512 = 8,
    Ripemd160 = 9,
}

impl MdType {
    /// 除 `None` 以外的全部算法
    pub const ALL: [MdType; 9] = [
        MdType::Md2,
        MdType::Md4,
        MdType::Md5,
        MdType::Sha1,
        MdType::Sha224,
        MdType::Sha256,
        MdType::Sha384,
        MdType::Sha512,
        MdType::Ripemd160,
    ];

    /// 数值编号
    pub fn id(self) -> u8 {
        self as u8
    }

    /// 摘要长度（字节），`None` 为 0
    pub fn size(self) -> usize {
        match self {
            MdType::None => 0,
            MdType::Md2 | MdType::Md4 | MdType::Md5 => 16,
            MdType::Sha1 | MdType::Ripemd160 => 20,
            MdType::Sha224 => 28,
            MdType::Sha256 => 32,
            MdType::Sha384 => 48,
            MdType::Sha512 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MdType::None => "NONE",
            MdType::Md2 => "MD2",
            MdType::Md4 => "MD4",
            MdType::Md5 => "MD5",
            MdType::Sha1 => "SHA1",
            MdType::Sha224 => "SHA224",
            MdType::Sha256 => "SHA256",
            MdType::Sha384 => "SHA384",
            MdType::Sha512 => "SHA512",
            MdType::Ripemd160 => "RIPEMD160",
        }
    }

    /// DigestInfo 中使用的算法 OID（DER 内容字节）
    pub(crate) fn oid(self) -> Option<&'static [u8]> {
        match self {
            MdType::None => None,
            MdType::Md2 => Some(&[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x02]),
            MdType::Md4 => Some(&[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x04]),
            MdType::Md5 => Some(&[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x05]),
            MdType::Sha1 => Some(&[0x2B, 0x0E, 0x03, 0x02, 0x1A]),
            MdType::Sha224 => Some(&[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04]),
            MdType::Sha256 => Some(&[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]),
            MdType::Sha384 => Some(&[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02]),
            MdType::Sha512 => Some(&[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03]),
            MdType::Ripemd160 => Some(&[0x2B, 0x24, 0x03, 0x02, 0x01]),
        }
    }
}

impl TryFrom<u8> for MdType {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(MdType::None),
            1..=9 => Ok(MdType::ALL[id as usize - 1]),
            _ => Err(Error::Library("unknown digest identifier")),
        }
    }
}

impl std::fmt::Display for MdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
enum Inner {
    Md2(md2::Md2),
    Md4(md4::Md4),
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Ripemd160(ripemd::Ripemd160),
}

macro_rules! each_digest {
    ($inner:expr, $h:ident => $body:expr) => {
        match $inner {
            Inner::Md2($h) => $body,
            Inner::Md4($h) => $body,
            Inner::Md5($h) => $body,
            Inner::Sha1($h) => $body,
            Inner::Sha224($h) => $body,
            Inner::Sha256($h) => $body,
            Inner::Sha384($h) => $body,
            Inner::Sha512($h) => $body,
            Inner::Ripemd160($h) => $body,
        }
    };
}

/// 增量哈希状态。`finalize` 会消耗状态，同一个状态只能输出一次摘要。
#[derive(Clone)]
pub struct HashState {
    md: MdType,
    inner: Inner,
}

impl std::fmt::Debug for HashState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashState").field("md", &self.md).finish()
    }
}

impl HashState {
    pub fn new(md: MdType) -> Result<Self> {
        let inner = match md {
            MdType::None => return Err(Error::UnsupportedDigest(md)),
            MdType::Md2 => Inner::Md2(md2::Md2::new()),
            MdType::Md4 => Inner::Md4(md4::Md4::new()),
            MdType::Md5 => Inner::Md5(md5::Md5::new()),
            MdType::Sha1 => Inner::Sha1(sha1::Sha1::new()),
            MdType::Sha224 => Inner::Sha224(sha2::Sha224::new()),
            MdType::Sha256 => Inner::Sha256(sha2::Sha256::new()),
            MdType::Sha384 => Inner::Sha384(sha2::Sha384::new()),
            MdType::Sha512 => Inner::Sha512(sha2::Sha512::new()),
            MdType::Ripemd160 => Inner::Ripemd160(ripemd::Ripemd160::new()),
        };
        Ok(Self { md, inner })
    }

    pub fn md(&self) -> MdType {
        self.md
    }

    pub fn update(&mut self, data: &[u8]) {
        each_digest!(&mut self.inner, h => Digest::update(h, data))
    }

    pub fn finalize(self) -> Vec<u8> {
        each_digest!(self.inner, h => h.finalize().to_vec())
    }
}

/// 一次性计算摘要
pub fn digest(md: MdType, data: &[u8]) -> Result<Vec<u8>> {
    let mut state = HashState::new(md)?;
    state.update(data);
    Ok(state.finalize())
}

/// 分块读取文件并计算摘要
pub fn digest_file<P: AsRef<Path>>(md: MdType, path: P) -> Result<Vec<u8>> {
    let mut state = HashState::new(md)?;
    let mut file = File::open(path.as_ref())?;
    let mut buf = vec![0u8; FILE_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        state.update(&buf[..n]);
    }
    Ok(state.finalize())
}

/// 各算法对 `""` 与 `"abc"` 的标准摘要
fn vectors(md: MdType) -> [&'static str; 2] {
    match md {
        MdType::None => ["", ""],
        MdType::Md2 => [
            "8350e5a3e24c153df2275c9f80692773",
            "da853b0d3f88d99b30283a69e6ded6bb",
        ],
        MdType::Md4 => [
            "31d6cfe0d16ae931b73c59d7e0c089c0",
            "a448017aaf21d8525fc10ae87aa6729d",
        ],
        MdType::Md5 => [
            "d41d8cd98f00b204e9800998ecf8427e",
            "900150983cd24fb0d6963f7d28e17f72",
        ],
        MdType::Sha1 => [
            "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "a9993e364706816aba3e25717850c26c9cd0d89d",
        ],
        MdType::Sha224 => [
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f",
            "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7",
        ],
        MdType::Sha256 => [
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        ],
        MdType::Sha384 => [
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b",
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7",
        ],
        MdType::Sha512 => [
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
        ],
        MdType::Ripemd160 => [
            "9c1185a5c5e9fc54612808977ee8f548b2258d31",
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc",
        ],
    }
}

/// 运行摘要算法的已知答案自检
pub fn self_test(md: MdType, verbose: bool) -> Result<SelfTestReport> {
    if md == MdType::None {
        return Err(Error::UnsupportedDigest(md));
    }
    let mut st = SelfTest::new(md.name(), verbose);
    for (input, expected) in [&b""[..], &b"abc"[..]].into_iter().zip(vectors(md)) {
        let got = digest(md, input)?;
        st.check(&format!("{} bytes", input.len()), got == hex::decode(expected)?)?;
    }

    // 分块输入必须与一次性输入一致
    let data = [0x61u8; 1000];
    let mut state = HashState::new(md)?;
    for chunk in data.chunks(7) {
        state.update(chunk);
    }
    st.check("incremental", state.finalize() == digest(md, &data)?)?;

    Ok(st.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ids_roundtrip() {
        for md in MdType::ALL {
            assert_eq!(MdType::try_from(md.id()).unwrap(), md);
        }
        assert_eq!(MdType::try_from(0).unwrap(), MdType::None);
        assert!(MdType::try_from(10).is_err());
    }

    #[test]
    fn test_sizes_match_output() {
        for md in MdType::ALL {
            assert_eq!(digest(md, b"x").unwrap().len(), md.size(), "{}", md);
        }
    }

    #[test]
    fn test_empty_input_vectors() {
        assert_eq!(
            hex::encode(digest(MdType::Md5, b"").unwrap()),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex::encode(digest(MdType::Sha256, b"").unwrap()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_none_is_not_a_digest() {
        assert!(matches!(
            HashState::new(MdType::None),
            Err(Error::UnsupportedDigest(MdType::None))
        ));
    }

    #[test]
    fn test_digest_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = vec![0x5Au8; FILE_CHUNK_SIZE * 2 + 17];
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        let from_file = digest_file(MdType::Sha1, file.path()).unwrap();
        assert_eq!(from_file, digest(MdType::Sha1, &content).unwrap());
    }

    #[test]
    fn test_digest_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(MdType::Md5, dir.path().join("absent")).unwrap_err();
        assert_eq!(err.code(), -0x5200);
    }

    #[test]
    fn test_self_tests() {
        for md in MdType::ALL {
            assert_eq!(self_test(md, false).unwrap().cases, 3);
        }
    }
}
