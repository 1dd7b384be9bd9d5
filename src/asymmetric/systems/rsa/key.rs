//! RSA 密钥材料、密钥检查与原始模幂运算

use crate::bignum::{BigUint, gen_prime};
use crate::common::config::CryptoConfig;
use crate::common::errors::{Error, Result};
use crate::common::random::RandomSource;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 允许的最小模数位数
pub const MIN_MODULUS_BITS: usize = 128;

/// 选取可逆盲化因子的最大次数
const BLINDING_ATTEMPTS: usize = 10;

/// 一组 RSA 密钥分量。公钥只填 `n`、`e`，其余为零。
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub(crate) struct RsaKey {
    pub(crate) n: BigUint,
    pub(crate) e: BigUint,
    pub(crate) d: BigUint,
    pub(crate) p: BigUint,
    pub(crate) q: BigUint,
    pub(crate) dp: BigUint,
    pub(crate) dq: BigUint,
    pub(crate) qp: BigUint,
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKey")
            .field("bits", &self.n.bits())
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

fn reject(reason: &'static str) -> Error {
    log::debug!("RSA key check failed: {}", reason);
    Error::InvalidKey(reason)
}

impl RsaKey {
    /// 只含公钥分量
    pub(crate) fn public(n: BigUint, e: BigUint) -> Self {
        Self {
            n,
            e,
            d: BigUint::zero(),
            p: BigUint::zero(),
            q: BigUint::zero(),
            dp: BigUint::zero(),
            dq: BigUint::zero(),
            qp: BigUint::zero(),
        }
    }

    /// 由 N、E、D、P、Q 派生 CRT 参数
    pub(crate) fn from_parts(n: BigUint, e: BigUint, d: BigUint, p: BigUint, q: BigUint) -> Result<Self> {
        if p.bits() < 2 || q.bits() < 2 || d.is_zero() {
            return Err(reject("private key fields are not set"));
        }
        let dp = d.rem(&p.checked_sub_u64(1)?)?;
        let dq = d.rem(&q.checked_sub_u64(1)?)?;
        let qp = q
            .mod_inverse(&p)
            .map_err(|_| reject("Q is not invertible modulo P"))?;
        Ok(Self {
            n,
            e,
            d,
            p,
            q,
            dp,
            dq,
            qp,
        })
    }

    /// 生成 `bits` 位的密钥对。
    ///
    /// P、Q 各取一半位数且最高两位置 1，乘积恰好 `bits` 位。`gcd(E, P-1)`、`gcd(E, Q-1)`
    /// 不为 1 或 `P == Q` 时重新选取，总次数受 `keygen_max_attempts` 限制。
    pub(crate) fn generate<R: RandomSource + ?Sized>(
        rng: &mut R,
        bits: usize,
        exponent: u64,
        config: &CryptoConfig,
    ) -> Result<Self> {
        if bits < MIN_MODULUS_BITS || bits > config.max_modulus_bits {
            return Err(Error::RsaBadInput("key size out of range"));
        }
        if exponent < 3 || exponent % 2 == 0 {
            return Err(Error::RsaBadInput("public exponent must be odd and at least 3"));
        }

        let e = BigUint::from_u64(exponent);
        let rounds = config.effective_prime_rounds();
        let p_bits = bits.div_ceil(2);
        let q_bits = bits - p_bits;

        for attempt in 1..=config.keygen_max_attempts {
            log::debug!("RSA-{} key generation attempt {}", bits, attempt);
            let mut p = gen_prime(p_bits, rounds, config.prime_candidates_per_bit * p_bits, rng)?;
            if !e.gcd(&p.checked_sub_u64(1)?).is_one() {
                log::debug!("public exponent shares a factor with P-1, retrying");
                continue;
            }
            let mut q = gen_prime(q_bits, rounds, config.prime_candidates_per_bit * q_bits, rng)?;
            if p == q || !e.gcd(&q.checked_sub_u64(1)?).is_one() {
                log::debug!("Q rejected, retrying");
                continue;
            }
            if p < q {
                std::mem::swap(&mut p, &mut q);
            }

            let n = &p * &q;
            if n.bits() != bits {
                continue;
            }
            let h = &p.checked_sub_u64(1)? * &q.checked_sub_u64(1)?;
            let d = e.mod_inverse(&h)?;
            log::debug!("RSA-{} key generated after {} attempts", bits, attempt);
            return Self::from_parts(n, e, d, p, q);
        }

        log::debug!(
            "RSA-{} key generation gave up after {} attempts",
            bits,
            config.keygen_max_attempts
        );
        Err(Error::KeyGenerationFailed {
            attempts: config.keygen_max_attempts,
        })
    }

    /// 模数字节数
    pub(crate) fn len(&self) -> usize {
        self.n.byte_len()
    }

    pub(crate) fn has_private(&self) -> bool {
        !self.d.is_zero()
    }

    /// 公钥结构检查：N、E 为奇数，N 的位数在范围内，`2 <= bits(E)` 且 `E < N`
    pub(crate) fn check_public(&self, max_bits: usize) -> Result<()> {
        if self.n.is_zero() || self.e.is_zero() {
            return Err(reject("public key fields are not set"));
        }
        if self.n.is_even() || self.e.is_even() {
            return Err(reject("N and E must be odd"));
        }
        let bits = self.n.bits();
        if bits < MIN_MODULUS_BITS || bits > max_bits {
            return Err(reject("modulus size out of range"));
        }
        if self.e.bits() < 2 || self.e >= self.n {
            return Err(reject("public exponent out of range"));
        }
        Ok(())
    }

    /// 私钥一致性检查：`P * Q == N`，`D * E ≡ 1 (mod lcm(P-1, Q-1))`，
    /// `gcd(E, (P-1)(Q-1)) == 1`，以及 CRT 参数与 D、P、Q 相符
    pub(crate) fn check_private(&self, max_bits: usize) -> Result<()> {
        self.check_public(max_bits)?;
        if self.p.bits() < 2 || self.q.bits() < 2 || self.d.is_zero() {
            return Err(reject("private key fields are not set"));
        }
        if &self.p * &self.q != self.n {
            return Err(reject("N is not P * Q"));
        }

        let p1 = self.p.checked_sub_u64(1)?;
        let q1 = self.q.checked_sub_u64(1)?;
        let h = &p1 * &q1;
        let l = p1.lcm(&q1)?;
        if !(&self.d * &self.e).rem(&l)?.is_one() {
            return Err(reject("D is not the inverse of E"));
        }
        if !self.e.gcd(&h).is_one() {
            return Err(reject("E is not coprime to (P-1)(Q-1)"));
        }
        if self.dp != self.d.rem(&p1)?
            || self.dq != self.d.rem(&q1)?
            || !self.qp.mul_mod(&self.q, &self.p)?.is_one()
        {
            return Err(reject("CRT parameters do not match D, P and Q"));
        }
        Ok(())
    }

    fn read_input(&self, input: &[u8]) -> Result<BigUint> {
        if input.len() != self.len() {
            return Err(Error::RsaBadInput("input length must equal the modulus length"));
        }
        let t = BigUint::from_bytes_be(input);
        if t >= self.n {
            return Err(Error::RsaBadInput("input is not smaller than the modulus"));
        }
        Ok(t)
    }

    /// `input^E mod N`
    pub(crate) fn public_op(&self, input: &[u8]) -> Result<Vec<u8>> {
        let t = self.read_input(input)?;
        t.exp_mod(&self.e, &self.n)?.to_bytes_be_padded(self.len())
    }

    /// `input^D mod N`，经过盲化并用 CRT 计算
    pub(crate) fn private_op<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        let t = self.read_input(input)?;
        let (vi, vf) = self.blinding(rng)?;
        let blinded = t.mul_mod(&vi, &self.n)?;
        let m = self.crt(&blinded)?;
        m.mul_mod(&vf, &self.n)?.to_bytes_be_padded(self.len())
    }

    /// 用 DP、DQ、QP 计算 `c^D mod N`（Garner 重组）
    pub(crate) fn crt(&self, c: &BigUint) -> Result<BigUint> {
        let m1 = c.exp_mod(&self.dp, &self.p)?;
        let m2 = c.exp_mod(&self.dq, &self.q)?;
        // h = QP * (m1 - m2) mod P
        let diff = m1.add(&self.p).checked_sub(&m2.rem(&self.p)?)?;
        let h = diff.mul_mod(&self.qp, &self.p)?;
        Ok(m2.add(&(&h * &self.q)))
    }

    /// 随机选取 `r`，返回 `(r^E mod N, r^-1 mod N)`
    fn blinding<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<(BigUint, BigUint)> {
        let mut buf = vec![0u8; self.len()];
        for _ in 0..BLINDING_ATTEMPTS {
            rng.fill(&mut buf)?;
            let r = BigUint::from_bytes_be(&buf).rem(&self.n)?;
            if r.bits() < 2 {
                continue;
            }
            if let Ok(vf) = r.mod_inverse(&self.n) {
                buf.zeroize();
                let vi = r.exp_mod(&self.e, &self.n)?;
                return Ok((vi, vf));
            }
        }
        buf.zeroize();
        Err(Error::Random(
            "could not draw an invertible blinding value".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn small_key() -> RsaKey {
        let config = CryptoConfig::default();
        RsaKey::generate(&mut OsRng, 256, 65537, &config).unwrap()
    }

    #[test]
    fn test_generate_produces_consistent_key() {
        let key = small_key();
        assert_eq!(key.n.bits(), 256);
        assert_eq!(key.len(), 32);
        assert!(key.has_private());
        key.check_private(8192).unwrap();
    }

    #[test]
    fn test_public_key_leaves_private_fields_empty() {
        let full = small_key();
        let key = RsaKey::public(full.n.clone(), full.e.clone());
        assert!(!key.has_private());
        assert_eq!(key.len(), 32);
        for field in [&key.d, &key.p, &key.q, &key.dp, &key.dq, &key.qp] {
            assert!(field.is_zero());
        }
        key.check_public(8192).unwrap();
    }

    #[test]
    fn test_generate_odd_size() {
        let config = CryptoConfig::default();
        let key = RsaKey::generate(&mut OsRng, 129, 3, &config).unwrap();
        assert_eq!(key.n.bits(), 129);
        key.check_private(8192).unwrap();
    }

    #[test]
    fn test_generate_rejects_bad_parameters() {
        let config = CryptoConfig::default();
        for (bits, e) in [(64, 65537), (1024, 2), (1024, 1), (16384, 65537)] {
            assert!(matches!(
                RsaKey::generate(&mut OsRng, bits, e, &config),
                Err(Error::RsaBadInput(_))
            ));
        }
    }

    #[test]
    fn test_crt_matches_direct_exponentiation() {
        let key = small_key();
        let c = BigUint::from_bytes_be(&[0x5Au8; 31]);
        let direct = c.exp_mod(&key.d, &key.n).unwrap();
        assert_eq!(key.crt(&c).unwrap(), direct);
    }

    #[test]
    fn test_private_inverts_public() {
        let key = small_key();
        let mut input = vec![0x33u8; key.len()];
        input[0] = 0;
        let c = key.public_op(&input).unwrap();
        assert_eq!(key.private_op(&mut OsRng, &c).unwrap(), input);
    }

    #[test]
    fn test_raw_input_checks() {
        let key = small_key();
        assert!(matches!(
            key.public_op(&[1u8; 31]),
            Err(Error::RsaBadInput(_))
        ));
        assert!(matches!(
            key.public_op(&[0xFFu8; 32]),
            Err(Error::RsaBadInput(_))
        ));
    }

    #[test]
    fn test_check_public_rejects_structural_problems() {
        let n = small_key().n.clone();
        let cases = [
            RsaKey::public(BigUint::zero(), BigUint::from_u64(3)),
            RsaKey::public(n.add_u64(1), BigUint::from_u64(3)),
            RsaKey::public(n.clone(), BigUint::from_u64(4)),
            RsaKey::public(n.clone(), BigUint::one()),
            RsaKey::public(BigUint::from_u64(0xFFFF_FFFF_FFFF_FFC5), BigUint::from_u64(3)),
        ];
        for key in cases {
            assert!(matches!(key.check_public(8192), Err(Error::InvalidKey(_))));
        }
        RsaKey::public(n, BigUint::from_u64(65537))
            .check_public(8192)
            .unwrap();
    }

    #[test]
    fn test_check_private_detects_tampering() {
        let key = small_key();

        let mut wrong_d = key.clone();
        wrong_d.d = wrong_d.d.add_u64(2);
        assert!(matches!(wrong_d.check_private(8192), Err(Error::InvalidKey(_))));

        let mut wrong_qp = key.clone();
        wrong_qp.qp = wrong_qp.qp.add_u64(1);
        assert!(matches!(wrong_qp.check_private(8192), Err(Error::InvalidKey(_))));

        let public_only = RsaKey::public(key.n.clone(), key.e.clone());
        assert!(matches!(
            public_only.check_private(8192),
            Err(Error::InvalidKey(_))
        ));
    }
}
