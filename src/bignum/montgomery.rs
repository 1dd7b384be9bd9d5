//! Montgomery 乘法与定长窗口模幂。
//!
//! 窗口宽度固定为 4 位，指数从高位到低位处理。每个窗口都做 4 次平方和 1 次乘法，
//! 预计算表的读取会扫描整张表并用 `subtle` 做条件选择，所以操作序列与内存访问
//! 模式都不依赖指数的取值（只依赖指数的位长）。

use super::{BigUint, LIMB_BITS, Limb, WideLimb};
use crate::common::errors::{Error, Result};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

const WINDOW_BITS: usize = 4;
const TABLE_SIZE: usize = 1 << WINDOW_BITS;

/// 针对一个奇数模数预计算的 Montgomery 参数
#[derive(Clone, Debug)]
pub(crate) struct MontgomeryContext {
    modulus: BigUint,
    /// 模数 limb，长度固定为 `n`
    m: Vec<Limb>,
    /// `-m^{-1} mod 2^64`
    m_inv: Limb,
    /// `R^2 mod m`，`R = 2^(64n)`
    rr: Vec<Limb>,
}

impl MontgomeryContext {
    /// 为奇数模数构造上下文
    pub(crate) fn new(modulus: &BigUint) -> Result<Self> {
        if modulus.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if modulus.is_even() {
            return Err(Error::BadMpiInput("Montgomery reduction needs an odd modulus"));
        }
        let n = modulus.limbs().len();
        let m = modulus.limbs().to_vec();

        // Newton 迭代求 m[0] 的逆，每轮正确位数翻倍：3 -> 6 -> ... -> 96
        let m0 = m[0];
        let mut inv: Limb = m0;
        for _ in 0..5 {
            inv = inv.wrapping_mul((2 as Limb).wrapping_sub(m0.wrapping_mul(inv)));
        }
        debug_assert_eq!(m0.wrapping_mul(inv), 1);

        let r2 = BigUint::one().shl_bits(2 * n * LIMB_BITS).rem(modulus)?;
        Ok(Self {
            modulus: modulus.clone(),
            rr: pad(&r2, n),
            m,
            m_inv: inv.wrapping_neg(),
        })
    }

    pub(crate) fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    fn len(&self) -> usize {
        self.m.len()
    }

    /// CIOS 形式的 Montgomery 乘法：返回 `a * b * R^{-1} mod m`，输入须小于 m
    fn mont_mul(&self, a: &[Limb], b: &[Limb]) -> Vec<Limb> {
        let n = self.len();
        let m = &self.m;
        let mut t = vec![0 as Limb; n + 2];

        for &ai in a.iter().take(n) {
            let mut carry: WideLimb = 0;
            for j in 0..n {
                let s = WideLimb::from(t[j]) + WideLimb::from(ai) * WideLimb::from(b[j]) + carry;
                t[j] = s as Limb;
                carry = s >> LIMB_BITS;
            }
            let s = WideLimb::from(t[n]) + carry;
            t[n] = s as Limb;
            t[n + 1] = (s >> LIMB_BITS) as Limb;

            let u = t[0].wrapping_mul(self.m_inv);
            let s = WideLimb::from(t[0]) + WideLimb::from(u) * WideLimb::from(m[0]);
            let mut carry = s >> LIMB_BITS;
            for j in 1..n {
                let s = WideLimb::from(t[j]) + WideLimb::from(u) * WideLimb::from(m[j]) + carry;
                t[j - 1] = s as Limb;
                carry = s >> LIMB_BITS;
            }
            let s = WideLimb::from(t[n]) + carry;
            t[n - 1] = s as Limb;
            t[n] = t[n + 1] + (s >> LIMB_BITS) as Limb;
            t[n + 1] = 0;
        }

        // t < 2m，无分支地减去一次 m
        let mut reduced = vec![0 as Limb; n];
        let mut borrow: Limb = 0;
        for j in 0..n {
            let (d, b1) = t[j].overflowing_sub(m[j]);
            let (d, b2) = d.overflowing_sub(borrow);
            reduced[j] = d;
            borrow = (b1 | b2) as Limb;
        }
        // t >= m 当且仅当最高 limb 吸收了借位
        let (_, underflow) = t[n].overflowing_sub(borrow);
        let keep_t = Choice::from(underflow as u8);
        for j in 0..n {
            reduced[j] = Limb::conditional_select(&reduced[j], &t[j], keep_t);
        }
        t.zeroize();
        reduced
    }

    fn to_mont(&self, x: &BigUint) -> Result<Vec<Limb>> {
        let x = if x >= &self.modulus {
            x.rem(&self.modulus)?
        } else {
            x.clone()
        };
        Ok(self.mont_mul(&pad(&x, self.len()), &self.rr))
    }

    fn from_mont(&self, x: &[Limb]) -> BigUint {
        let mut one = vec![0 as Limb; self.len()];
        one[0] = 1;
        BigUint::from_limbs(self.mont_mul(x, &one))
    }

    /// `a * b mod m`
    pub(crate) fn mul_mod(&self, a: &BigUint, b: &BigUint) -> Result<BigUint> {
        let am = self.to_mont(a)?;
        let b = if b >= &self.modulus {
            b.rem(&self.modulus)?
        } else {
            b.clone()
        };
        Ok(BigUint::from_limbs(self.mont_mul(&am, &pad(&b, self.len()))))
    }

    /// `base^exp mod m`，定长 4 位窗口
    pub(crate) fn exp_mod(&self, base: &BigUint, exp: &BigUint) -> Result<BigUint> {
        let n = self.len();
        if self.modulus.is_one() {
            return Ok(BigUint::zero());
        }

        let one_m = self.to_mont(&BigUint::one())?;
        let mut table: Vec<Vec<Limb>> = Vec::with_capacity(TABLE_SIZE);
        table.push(one_m.clone());
        table.push(self.to_mont(base)?);
        for i in 2..TABLE_SIZE {
            let next = self.mont_mul(&table[i - 1], &table[1]);
            table.push(next);
        }

        let windows = exp.bits().div_ceil(WINDOW_BITS);
        let mut acc = one_m;
        let mut selected = vec![0 as Limb; n];
        for w in (0..windows).rev() {
            for _ in 0..WINDOW_BITS {
                acc = self.mont_mul(&acc, &acc);
            }
            let mut idx = 0u8;
            for b in (0..WINDOW_BITS).rev() {
                idx = (idx << 1) | exp.bit(w * WINDOW_BITS + b) as u8;
            }
            select_entry(&table, idx, &mut selected);
            acc = self.mont_mul(&acc, &selected);
        }

        let result = self.from_mont(&acc);
        for entry in table.iter_mut() {
            entry.zeroize();
        }
        acc.zeroize();
        selected.zeroize();
        Ok(result)
    }
}

/// 扫描整张表，把下标为 `idx` 的项复制到 `out`
fn select_entry(table: &[Vec<Limb>], idx: u8, out: &mut [Limb]) {
    out.fill(0);
    for (i, entry) in table.iter().enumerate() {
        let hit = (i as u8).ct_eq(&idx);
        for (o, &e) in out.iter_mut().zip(entry.iter()) {
            o.conditional_assign(&e, hit);
        }
    }
}

/// 把数值展开成恰好 `n` 个 limb
fn pad(x: &BigUint, n: usize) -> Vec<Limb> {
    let mut v = x.limbs().to_vec();
    v.resize(n, 0);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> BigUint {
        BigUint::from_hex(s).unwrap()
    }

    #[test]
    fn test_rejects_even_modulus() {
        assert!(MontgomeryContext::new(&BigUint::from_u64(10)).is_err());
        assert!(matches!(
            MontgomeryContext::new(&BigUint::zero()),
            Err(Error::DivisionByZero)
        ));
    }

    #[test]
    fn test_mul_mod_matches_plain_reduction() {
        let m = hex("F123456789ABCDEF0123456789ABCDEF0123456789ABCDEF1");
        let a = hex("123456789ABCDEF0FEDCBA98765432100123456789");
        let b = hex("FEDCBA9876543210FEDCBA98765432100123456789ABCDEF");
        let ctx = MontgomeryContext::new(&m).unwrap();

        let expected = (&a * &b).rem(&m).unwrap();
        assert_eq!(ctx.mul_mod(&a, &b).unwrap(), expected);
    }

    #[test]
    fn test_exp_mod_small_values() {
        let ctx = MontgomeryContext::new(&BigUint::from_u64(497)).unwrap();
        let r = ctx
            .exp_mod(&BigUint::from_u64(4), &BigUint::from_u64(13))
            .unwrap();
        assert_eq!(r, BigUint::from_u64(445));
    }

    #[test]
    fn test_exp_mod_zero_exponent_and_unit_modulus() {
        let ctx = MontgomeryContext::new(&BigUint::from_u64(97)).unwrap();
        assert_eq!(
            ctx.exp_mod(&BigUint::from_u64(5), &BigUint::zero()).unwrap(),
            BigUint::one()
        );
        let unit = MontgomeryContext::new(&BigUint::one()).unwrap();
        assert!(unit
            .exp_mod(&BigUint::from_u64(5), &BigUint::from_u64(3))
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_fermat_little_theorem() {
        // 2^127 - 1 是梅森素数
        let p = hex("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");
        let ctx = MontgomeryContext::new(&p).unwrap();
        let a = hex("DEADBEEFCAFEBABE0123456789");
        let exp = p.checked_sub_u64(1).unwrap();
        assert_eq!(ctx.exp_mod(&a, &exp).unwrap(), BigUint::one());
    }
}
