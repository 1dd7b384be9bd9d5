//! RSA 自检：固定的 1024 位密钥与 SHA-1 签名已知答案

use super::{Padding, RsaContext, RsaMode};
use crate::common::errors::Result;
use crate::common::selftest::{SelfTest, SelfTestReport};
use crate::hash::{MdType, digest};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

const RSA_N: &str = "C97908F50A0A132472F59D5718B134EBEE51D9B16A9BD411BF3BD17AA6696A28\
                     C5CB64FC3F967A741229FE7DDEC861FB80A85F9472C0492EAE5C373874A46B0D\
                     B9CA2E498319169AC1538D988C740A06E03EEB7C4889CD0E95B57CD89482661F\
                     472E3F1E8A035D150CAE53CCC0F959EEE33C1B7503F699061D8AB0F13F02DA19";
const RSA_E: &str = "010001";
const RSA_D: &str = "B85F00E96D4486FC060FEAEAB778035C1CFDDE5FD395C2DE72C8850CDE98FD43\
                     4EAEB13D7DDB7138231F36FB6D12A74807170E50C52A5E4E4FD5A7DB0C33229B\
                     0F48F267C0233F29C7D56447D3F51E295581A156BBD411C8635CB46A6A32FDE4\
                     EDB874C5ABD6C3A89DED5FFBE96D2DC6AA04D0834F47D1FA90258B33DEAE2739";
const RSA_P: &str = "E58271381EEFFCDA868C925C095A6F905F0B4F0327E2A078F19603235F890B06\
                     B198E37AA1604A43BB4302467F523C360D1052D527D4614B7B8D1362ACC7F9AF";
const RSA_Q: &str = "E0BA296660063D03539055DA0DB1D8012394946BD2662EF284E5FABD84F5C517\
                     987D17F777737FAF3D6F1E29001BFDD1DE3942EABB05B0A9BA9A3D1748A402B7";

const RSA_PT: &str = "AABBCCDDEEFF00112233445566778899AABBCCDDEEFF0011";

/// `RSA_PT` 的 SHA-1 摘要经 PKCS#1 v1.5 签名的结果
const RSA_SHA1_SIG: &str = "7EE2543C2F16056604CF8BB9E663BC9DB1F352798FC550E498F4EE4CFF5B93F1\
                            2CF3DE608F20A3054BF4B9F2BF439908D5642C72BCBD1C62F8A4D23667812D0F\
                            38C528DEEF9BC2C5B2DD96CF8B7A261109EE610276BF4CB08B937781D4832A0C\
                            CB68A025B54A6873535BA4448E88E8DEFD8AA70E9D1D08F56535495F4BED102E";

/// 自检用的确定性随机源：`SHA-256(seed || counter)` 依次输出
struct SelfTestRng {
    counter: u64,
}

impl RngCore for SelfTestRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(32) {
            let block = Sha256::new()
                .chain_update(b"rsa self test")
                .chain_update(self.counter.to_be_bytes())
                .finalize();
            self.counter += 1;
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}

impl CryptoRng for SelfTestRng {}

/// 运行 RSA 自检：密钥检查、加解密往返、签名已知答案与验签
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("RSA", verbose);
    let mut rng = SelfTestRng { counter: 0 };

    let mut ctx = RsaContext::new(Padding::Pkcs1V15, MdType::None);
    ctx.import_private(
        &hex::decode(RSA_N)?,
        &hex::decode(RSA_E)?,
        &hex::decode(RSA_D)?,
        &hex::decode(RSA_P)?,
        &hex::decode(RSA_Q)?,
    )?;
    st.check(
        "key validation",
        ctx.check_pubkey().is_ok() && ctx.check_privkey().is_ok(),
    )?;

    let plain = hex::decode(RSA_PT)?;
    let cipher = ctx.pkcs1_encrypt(&mut rng, RsaMode::Public, &plain)?;
    st.check("PKCS#1 encryption", cipher.len() == ctx.len())?;

    let decrypted = ctx.pkcs1_decrypt(&mut rng, RsaMode::Private, &cipher)?;
    st.check("PKCS#1 decryption", *decrypted == plain[..])?;

    let hash = digest(MdType::Sha1, &plain)?;
    let sig = ctx.pkcs1_sign(&mut rng, RsaMode::Private, MdType::Sha1, &hash)?;
    st.check("PKCS#1 SHA-1 signature", sig == hex::decode(RSA_SHA1_SIG)?)?;

    st.check(
        "PKCS#1 SHA-1 verification",
        ctx.pkcs1_verify(&mut rng, RsaMode::Public, MdType::Sha1, &hash, &sig)
            .is_ok(),
    )?;

    Ok(st.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes() {
        let report = self_test(true).unwrap();
        assert_eq!(report.algorithm, "RSA");
        assert_eq!(report.cases, 5);
        assert_eq!(report.log.len(), 5);
    }

    #[test]
    fn test_self_test_rng_is_deterministic() {
        let mut a = SelfTestRng { counter: 0 };
        let mut b = SelfTestRng { counter: 0 };
        let (mut x, mut y) = ([0u8; 70], [0u8; 70]);
        a.fill_bytes(&mut x);
        b.fill_bytes(&mut y);
        assert_eq!(x, y);
        assert_ne!(x[..32], x[32..64]);
    }
}
