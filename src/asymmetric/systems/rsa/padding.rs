//! PKCS#1 编码层。
//!
//! 这里只处理字节块，不接触大数运算：
//!
//! - v1.5：类型 1（`0xFF` 填充，签名与私钥方向加密）与类型 2（随机非零填充）
//! - v2.1：MGF1、RSAES-OAEP（空标签）、EMSA-PSS
//!
//! 解码路径上，依赖秘密数据的检查都用 `subtle` 完成，只在最后给出一次性的结论。

use crate::common::errors::{Error, Result};
use crate::common::random::{RandomSource, fill_nonzero};
use crate::common::utils::{constant_time_eq, xor_in_place};
use crate::hash::{HashState, MdType, digest};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeLess};

/// v1.5 的块类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum BlockType {
    /// `00 01 FF..FF 00 M`
    Sign = 1,
    /// `00 02 <非零随机> 00 M`
    Encrypt = 2,
}

/// v1.5 填充的固定开销：两个前导字节、至少 8 个填充字节和一个分隔符
pub(crate) const V15_OVERHEAD: usize = 11;

/// 构造 `k` 字节的 v1.5 编码块
pub(crate) fn pad_v15<R: RandomSource + ?Sized>(
    rng: &mut R,
    block_type: BlockType,
    msg: &[u8],
    k: usize,
) -> Result<Vec<u8>> {
    if msg.len() + V15_OVERHEAD > k {
        return Err(Error::MessageTooLong {
            max: k.saturating_sub(V15_OVERHEAD),
            actual: msg.len(),
        });
    }

    let mut em = vec![0u8; k];
    em[1] = block_type as u8;
    let sep = k - msg.len() - 1;
    match block_type {
        BlockType::Sign => em[2..sep].fill(0xFF),
        BlockType::Encrypt => fill_nonzero(rng, &mut em[2..sep])?,
    }
    em[sep + 1..].copy_from_slice(msg);
    Ok(em)
}

/// 去掉 v1.5 填充。
///
/// 前导字节、填充内容、分隔符位置与最短填充长度全部以常数时间累计，任何一项不符
/// 都只返回 [`Error::InvalidPadding`]。
pub(crate) fn unpad_v15(em: &[u8], block_type: BlockType) -> Result<Vec<u8>> {
    if em.len() < V15_OVERHEAD {
        return Err(Error::InvalidPadding);
    }

    let mut bad = !em[0].ct_eq(&0) | !em[1].ct_eq(&(block_type as u8));
    let mut found = Choice::from(0);
    let mut sep: u64 = 0;
    for (i, &b) in em.iter().enumerate().skip(2) {
        let zero = b.ct_eq(&0);
        sep.conditional_assign(&(i as u64), zero & !found);
        found |= zero;
        if block_type == BlockType::Sign {
            bad |= !found & !b.ct_eq(&0xFF);
        }
    }
    bad |= !found;
    // 至少 8 个填充字节，分隔符最早出现在下标 10
    bad |= sep.ct_lt(&((V15_OVERHEAD - 1) as u64));

    if bool::from(bad) {
        return Err(Error::InvalidPadding);
    }
    Ok(em[sep as usize + 1..].to_vec())
}

/// DER 编码的 DigestInfo；`MdType::None` 表示调用方已经给出编码好的数据
pub(crate) fn digest_info(md: MdType, hash: &[u8]) -> Result<Vec<u8>> {
    let Some(oid) = md.oid() else {
        return Ok(hash.to_vec());
    };
    if hash.len() != md.size() {
        return Err(Error::RsaBadInput("digest length does not match the algorithm"));
    }

    let mut t = Vec::with_capacity(10 + oid.len() + hash.len());
    t.extend_from_slice(&[
        0x30,
        (0x08 + oid.len() + hash.len()) as u8,
        0x30,
        (0x04 + oid.len()) as u8,
        0x06,
        oid.len() as u8,
    ]);
    t.extend_from_slice(oid);
    t.extend_from_slice(&[0x05, 0x00, 0x04, hash.len() as u8]);
    t.extend_from_slice(hash);
    Ok(t)
}

/// EMSA-PKCS1-v1_5 签名编码
pub(crate) fn encode_sign_v15(md: MdType, hash: &[u8], k: usize) -> Result<Vec<u8>> {
    let t = digest_info(md, hash)?;
    if t.len() + V15_OVERHEAD > k {
        return Err(Error::RsaBadInput("digest too long for the modulus"));
    }
    let mut em = vec![0xFFu8; k];
    em[0] = 0;
    em[1] = BlockType::Sign as u8;
    em[k - t.len() - 1] = 0;
    em[k - t.len()..].copy_from_slice(&t);
    Ok(em)
}

/// MGF1：把 `seed` 派生出的掩码异或进 `out`
pub(crate) fn mgf1_xor(md: MdType, seed: &[u8], out: &mut [u8]) -> Result<()> {
    if md == MdType::None {
        return Err(Error::UnsupportedDigest(md));
    }
    for (counter, chunk) in (0u32..).zip(out.chunks_mut(md.size())) {
        let mut state = HashState::new(md)?;
        state.update(seed);
        state.update(&counter.to_be_bytes());
        let mask = state.finalize();
        xor_in_place(chunk, &mask[..chunk.len()]);
    }
    Ok(())
}

/// RSAES-OAEP 编码（空标签）
pub(crate) fn encode_oaep<R: RandomSource + ?Sized>(
    rng: &mut R,
    md: MdType,
    msg: &[u8],
    k: usize,
) -> Result<Vec<u8>> {
    let hlen = md.size();
    if hlen == 0 {
        return Err(Error::UnsupportedDigest(md));
    }
    let overhead = 2 * hlen + 2;
    if msg.len() + overhead > k {
        return Err(Error::MessageTooLong {
            max: k.saturating_sub(overhead),
            actual: msg.len(),
        });
    }

    let mut em = vec![0u8; k];
    let (seed, db) = em[1..].split_at_mut(hlen);
    rng.fill(seed)?;

    let db_len = db.len();
    db[..hlen].copy_from_slice(&digest(md, b"")?);
    db[db_len - msg.len() - 1] = 0x01;
    db[db_len - msg.len()..].copy_from_slice(msg);

    mgf1_xor(md, seed, db)?;
    mgf1_xor(md, db, seed)?;
    Ok(em)
}

/// RSAES-OAEP 解码。首字节、标签哈希与 `0x01` 分隔符都以常数时间检查。
pub(crate) fn decode_oaep(md: MdType, em: &[u8]) -> Result<Vec<u8>> {
    let hlen = md.size();
    if hlen == 0 {
        return Err(Error::UnsupportedDigest(md));
    }
    if em.len() < 2 * hlen + 2 {
        return Err(Error::RsaBadInput("modulus too small for OAEP with this digest"));
    }

    let mut buf = em.to_vec();
    let (head, rest) = buf.split_at_mut(1);
    let (seed, db) = rest.split_at_mut(hlen);
    mgf1_xor(md, db, seed)?;
    mgf1_xor(md, seed, db)?;

    let lhash = digest(md, b"")?;
    let mut bad = !head[0].ct_eq(&0) | !db[..hlen].ct_eq(&lhash[..]);

    let mut found = Choice::from(0);
    let mut sep: u64 = 0;
    for (i, &b) in db.iter().enumerate().skip(hlen) {
        let nonzero = !b.ct_eq(&0);
        let first = nonzero & !found;
        sep.conditional_assign(&(i as u64), first);
        bad |= first & !b.ct_eq(&0x01);
        found |= nonzero;
    }
    bad |= !found;

    let result = if bool::from(bad) {
        Err(Error::InvalidPadding)
    } else {
        Ok(db[sep as usize + 1..].to_vec())
    };
    buf.fill(0);
    result
}

/// `H = Hash(0x00 * 8 || mHash || salt)`
fn pss_hash(md: MdType, hash: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    let mut state = HashState::new(md)?;
    state.update(&[0u8; 8]);
    state.update(hash);
    state.update(salt);
    Ok(state.finalize())
}

/// EMSA-PSS 编码，盐长等于摘要长度。返回 `k` 字节（`mod_bits - 1` 为 8 的倍数时首字节为 0）。
pub(crate) fn encode_pss<R: RandomSource + ?Sized>(
    rng: &mut R,
    md: MdType,
    hash: &[u8],
    mod_bits: usize,
) -> Result<Vec<u8>> {
    let hlen = md.size();
    if hlen == 0 {
        return Err(Error::UnsupportedDigest(md));
    }
    let k = mod_bits.div_ceil(8);
    let em_bits = mod_bits - 1;
    let em_len = em_bits.div_ceil(8);
    let slen = hlen;
    if em_len < hlen + slen + 2 {
        return Err(Error::RsaBadInput("modulus too small for PSS with this digest"));
    }

    let mut salt = vec![0u8; slen];
    rng.fill(&mut salt)?;
    let h = pss_hash(md, hash, &salt)?;

    let mut out = vec![0u8; k];
    let em = &mut out[k - em_len..];
    let db_len = em_len - hlen - 1;
    let (db, tail) = em.split_at_mut(db_len);
    db[db_len - slen - 1] = 0x01;
    db[db_len - slen..].copy_from_slice(&salt);
    mgf1_xor(md, &h, db)?;
    db[0] &= 0xFF >> (8 * em_len - em_bits);

    tail[..hlen].copy_from_slice(&h);
    tail[hlen] = 0xBC;
    Ok(out)
}

/// EMSA-PSS 验证。盐长由分隔符位置推出；任何不符都返回 [`Error::VerifyFailed`]。
pub(crate) fn verify_pss(md: MdType, hash: &[u8], encoded: &[u8], mod_bits: usize) -> Result<()> {
    let hlen = md.size();
    if hlen == 0 {
        return Err(Error::UnsupportedDigest(md));
    }
    let em_bits = mod_bits - 1;
    let em_len = em_bits.div_ceil(8);
    if encoded.len() < em_len || em_len < hlen + 2 {
        return Err(Error::VerifyFailed);
    }
    let (prefix, em) = encoded.split_at(encoded.len() - em_len);
    if prefix.iter().any(|&b| b != 0) || em[em_len - 1] != 0xBC {
        return Err(Error::VerifyFailed);
    }

    let top_mask = 0xFFu8 >> (8 * em_len - em_bits);
    if em[0] & !top_mask != 0 {
        return Err(Error::VerifyFailed);
    }

    let db_len = em_len - hlen - 1;
    let h = &em[db_len..db_len + hlen];
    let mut db = em[..db_len].to_vec();
    mgf1_xor(md, h, &mut db)?;
    db[0] &= top_mask;

    let sep = db
        .iter()
        .position(|&b| b != 0)
        .ok_or(Error::VerifyFailed)?;
    if db[sep] != 0x01 {
        return Err(Error::VerifyFailed);
    }

    let expected = pss_hash(md, hash, &db[sep + 1..])?;
    if !constant_time_eq(&expected, h) {
        return Err(Error::VerifyFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn test_v15_encrypt_block_layout() {
        let em = pad_v15(&mut OsRng, BlockType::Encrypt, b"hello", 64).unwrap();
        assert_eq!(em.len(), 64);
        assert_eq!(&em[..2], &[0x00, 0x02]);
        assert!(em[2..58].iter().all(|&b| b != 0));
        assert_eq!(em[58], 0);
        assert_eq!(&em[59..], b"hello");
        assert_eq!(unpad_v15(&em, BlockType::Encrypt).unwrap(), b"hello");
    }

    #[test]
    fn test_v15_sign_block_layout() {
        let em = pad_v15(&mut OsRng, BlockType::Sign, b"", 32).unwrap();
        assert_eq!(&em[..2], &[0x00, 0x01]);
        assert!(em[2..31].iter().all(|&b| b == 0xFF));
        assert_eq!(unpad_v15(&em, BlockType::Sign).unwrap(), b"");
    }

    #[test]
    fn test_v15_message_too_long() {
        let err = pad_v15(&mut OsRng, BlockType::Encrypt, &[1u8; 54], 64).unwrap_err();
        assert!(matches!(err, Error::MessageTooLong { max: 53, actual: 54 }));
        assert!(pad_v15(&mut OsRng, BlockType::Encrypt, &[1u8; 53], 64).is_ok());
    }

    #[test]
    fn test_v15_unpad_rejects_malformed_blocks() {
        let good = pad_v15(&mut OsRng, BlockType::Encrypt, b"data", 48).unwrap();

        let mut wrong_first = good.clone();
        wrong_first[0] = 1;
        let mut wrong_type = good.clone();
        wrong_type[1] = 1;
        let mut short_padding = good.clone();
        short_padding[5] = 0;
        let mut no_separator = good.clone();
        no_separator[43] = 0x55;

        for em in [wrong_first, wrong_type, short_padding, no_separator] {
            assert!(matches!(
                unpad_v15(&em, BlockType::Encrypt),
                Err(Error::InvalidPadding)
            ));
        }
        // 类型 2 的块不能当作类型 1 解开
        assert!(unpad_v15(&good, BlockType::Sign).is_err());
    }

    #[test]
    fn test_digest_info_sha1_prefix() {
        let t = digest_info(MdType::Sha1, &[0u8; 20]).unwrap();
        assert_eq!(
            hex::encode(&t[..15]),
            "3021300906052b0e03021a05000414"
        );
        assert_eq!(t.len(), 35);
    }

    #[test]
    fn test_digest_info_sha256_prefix() {
        let t = digest_info(MdType::Sha256, &[0u8; 32]).unwrap();
        assert_eq!(
            hex::encode(&t[..19]),
            "3031300d060960864801650304020105000420"
        );
    }

    #[test]
    fn test_digest_info_length_mismatch() {
        assert!(matches!(
            digest_info(MdType::Md5, &[0u8; 20]),
            Err(Error::RsaBadInput(_))
        ));
        assert_eq!(digest_info(MdType::None, b"raw").unwrap(), b"raw");
    }

    #[test]
    fn test_mgf1_known_value() {
        // MGF1-SHA1("foo", 3) = 1ac907
        let mut out = [0u8; 3];
        mgf1_xor(MdType::Sha1, b"foo", &mut out).unwrap();
        assert_eq!(hex::encode(out), "1ac907");
    }

    #[test]
    fn test_oaep_roundtrip_and_tamper() {
        let em = encode_oaep(&mut OsRng, MdType::Sha1, b"secret", 128).unwrap();
        assert_eq!(em[0], 0);
        assert_eq!(decode_oaep(MdType::Sha1, &em).unwrap(), b"secret");

        let mut bad = em.clone();
        bad[40] ^= 1;
        assert!(matches!(
            decode_oaep(MdType::Sha1, &bad),
            Err(Error::InvalidPadding)
        ));
    }

    #[test]
    fn test_oaep_capacity() {
        // k - 2 * hlen - 2 = 128 - 42 = 86
        assert!(encode_oaep(&mut OsRng, MdType::Sha1, &[0u8; 86], 128).is_ok());
        assert!(matches!(
            encode_oaep(&mut OsRng, MdType::Sha1, &[0u8; 87], 128),
            Err(Error::MessageTooLong { max: 86, .. })
        ));
    }

    #[test]
    fn test_pss_roundtrip() {
        let hash = digest(MdType::Sha256, b"message").unwrap();
        for bits in [1024, 1025, 1031] {
            let em = encode_pss(&mut OsRng, MdType::Sha256, &hash, bits).unwrap();
            assert_eq!(em.len(), bits.div_ceil(8));
            verify_pss(MdType::Sha256, &hash, &em, bits).unwrap();

            let other = digest(MdType::Sha256, b"other").unwrap();
            assert!(matches!(
                verify_pss(MdType::Sha256, &other, &em, bits),
                Err(Error::VerifyFailed)
            ));
        }
    }
}
