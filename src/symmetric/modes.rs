//! ECB 与 CBC 链接模式。
//!
//! CBC 的 IV 缓冲区会被就地改写为最后处理的密文分组，同一个 IV 缓冲区上的连续调用
//! 因此能把链条接续下去。这是对外可见的行为。

use crate::common::errors::{Error, Result};
use crate::common::utils::xor_in_place;
use crate::symmetric::traits::{BlockCipher, Mode};

#[cfg(feature = "parallel")]
use crate::common::config::ParallelismConfig;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn check_input<B: BlockCipher>(input: &[u8]) -> Result<()> {
    if input.len() % B::BLOCK_SIZE != 0 {
        return Err(Error::InvalidInputLength {
            cipher: B::KIND,
            len: input.len(),
        });
    }
    Ok(())
}

fn check_iv<B: BlockCipher>(iv: &[u8]) -> Result<()> {
    if iv.len() != B::BLOCK_SIZE {
        return Err(Error::InvalidIvLength {
            cipher: B::KIND,
            expected: B::BLOCK_SIZE,
            actual: iv.len(),
        });
    }
    Ok(())
}

/// ECB：逐块独立变换。输入长度必须是分组长度的整数倍。
pub fn ecb<B: BlockCipher>(cipher: &B, mode: Mode, input: &[u8]) -> Result<Vec<u8>> {
    check_input::<B>(input)?;
    let mut out = input.to_vec();
    for block in out.chunks_exact_mut(B::BLOCK_SIZE) {
        match mode {
            Mode::Encrypt => cipher.encrypt_in_place(block),
            Mode::Decrypt => cipher.decrypt_in_place(block),
        }
    }
    Ok(out)
}

/// CBC 加密或解密。
///
/// 成功返回后 `iv` 保存最后一个密文分组；长度校验失败时 `iv` 保持不变。
pub fn cbc<B: BlockCipher>(cipher: &B, mode: Mode, iv: &mut [u8], input: &[u8]) -> Result<Vec<u8>> {
    check_iv::<B>(iv)?;
    check_input::<B>(input)?;

    let mut out = input.to_vec();
    match mode {
        Mode::Encrypt => {
            for block in out.chunks_exact_mut(B::BLOCK_SIZE) {
                xor_in_place(block, iv);
                cipher.encrypt_in_place(block);
                iv.copy_from_slice(block);
            }
        }
        Mode::Decrypt => {
            for (block, ct) in out
                .chunks_exact_mut(B::BLOCK_SIZE)
                .zip(input.chunks_exact(B::BLOCK_SIZE))
            {
                cipher.decrypt_in_place(block);
                xor_in_place(block, iv);
                iv.copy_from_slice(ct);
            }
        }
    }
    Ok(out)
}

#[cfg(feature = "parallel")]
fn build_pool(config: &ParallelismConfig) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallelism)
        .build()
        .map_err(|e| Error::ParallelSetup(e.to_string()))
}

/// [并行] ECB。分组数少于 `min_parallel_blocks` 时退回顺序实现，结果与 [`ecb`] 完全一致。
#[cfg(feature = "parallel")]
pub fn par_ecb<B: BlockCipher>(
    cipher: &B,
    mode: Mode,
    input: &[u8],
    config: &ParallelismConfig,
) -> Result<Vec<u8>> {
    check_input::<B>(input)?;
    if input.len() / B::BLOCK_SIZE < config.min_parallel_blocks {
        return ecb(cipher, mode, input);
    }

    let pool = build_pool(config)?;
    let mut out = input.to_vec();
    pool.install(|| {
        out.par_chunks_mut(B::BLOCK_SIZE).for_each(|block| match mode {
            Mode::Encrypt => cipher.encrypt_in_place(block),
            Mode::Decrypt => cipher.decrypt_in_place(block),
        })
    });
    Ok(out)
}

/// [并行] CBC。
///
/// 只有解密方向可以并行（每块只依赖前一个密文分组）；加密方向直接走 [`cbc`]。
/// IV 的改写规则与顺序实现相同。
#[cfg(feature = "parallel")]
pub fn par_cbc<B: BlockCipher>(
    cipher: &B,
    mode: Mode,
    iv: &mut [u8],
    input: &[u8],
    config: &ParallelismConfig,
) -> Result<Vec<u8>> {
    check_iv::<B>(iv)?;
    check_input::<B>(input)?;
    let blocks = input.len() / B::BLOCK_SIZE;
    if mode == Mode::Encrypt || blocks < config.min_parallel_blocks.max(1) {
        return cbc(cipher, mode, iv, input);
    }

    let pool = build_pool(config)?;
    let bs = B::BLOCK_SIZE;
    let first_iv = iv.to_vec();
    let mut out = input.to_vec();
    pool.install(|| {
        out.par_chunks_mut(bs).enumerate().for_each(|(i, block)| {
            cipher.decrypt_in_place(block);
            let prev = if i == 0 {
                &first_iv[..]
            } else {
                &input[(i - 1) * bs..i * bs]
            };
            xor_in_place(block, prev);
        })
    });
    iv.copy_from_slice(&input[(blocks - 1) * bs..]);
    Ok(out)
}
