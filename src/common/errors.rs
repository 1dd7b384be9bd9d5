//! 库级错误类型。
//!
//! 每个错误都对应一个稳定的负数状态码（沿用 PolarSSL 的编号），宿主边界通过
//! [`Error::code`] 与 [`strerror`] 获得“错误码 + 可读消息”这一对信息。

use crate::hash::MdType;
use crate::symmetric::traits::CipherKind;
use thiserror::Error;

/// 无法归入其他类别时使用的通用状态码
pub const ERR_GENERIC: i32 = -0x0001;

pub const ERR_MPI_BAD_INPUT_DATA: i32 = -0x0004;
pub const ERR_MPI_NEGATIVE_VALUE: i32 = -0x000A;
pub const ERR_MPI_DIVISION_BY_ZERO: i32 = -0x000C;
pub const ERR_MPI_NOT_ACCEPTABLE: i32 = -0x000E;

pub const ERR_BLOWFISH_INVALID_KEY_LENGTH: i32 = -0x0016;
pub const ERR_BLOWFISH_INVALID_INPUT_LENGTH: i32 = -0x0018;
pub const ERR_ARC4_INVALID_KEY_LENGTH: i32 = -0x001A;
pub const ERR_AES_INVALID_KEY_LENGTH: i32 = -0x0020;
pub const ERR_AES_INVALID_INPUT_LENGTH: i32 = -0x0022;
pub const ERR_CAMELLIA_INVALID_KEY_LENGTH: i32 = -0x0024;
pub const ERR_CAMELLIA_INVALID_INPUT_LENGTH: i32 = -0x0026;
pub const ERR_XTEA_INVALID_INPUT_LENGTH: i32 = -0x0028;

pub const ERR_BASE64_INVALID_CHARACTER: i32 = -0x002C;

pub const ERR_RSA_BAD_INPUT_DATA: i32 = -0x4080;
pub const ERR_RSA_INVALID_PADDING: i32 = -0x4100;
pub const ERR_RSA_KEY_GEN_FAILED: i32 = -0x4180;
pub const ERR_RSA_KEY_CHECK_FAILED: i32 = -0x4200;
pub const ERR_RSA_VERIFY_FAILED: i32 = -0x4380;
pub const ERR_RSA_OUTPUT_TOO_LARGE: i32 = -0x4400;
pub const ERR_RSA_RNG_FAILED: i32 = -0x4480;

pub const ERR_MD_FEATURE_UNAVAILABLE: i32 = -0x5080;
pub const ERR_MD_FILE_IO_ERROR: i32 = -0x5200;

/// 库中所有操作可能返回的错误
#[derive(Error, Debug)]
pub enum Error {
    #[error("{cipher} - invalid key length: {bits} bits")]
    InvalidKeyLength { cipher: CipherKind, bits: usize },

    #[error("ARC4 - invalid key length: {0} bytes")]
    InvalidStreamKeyLength(usize),

    #[error("{cipher} - invalid data input length: {len} bytes")]
    InvalidInputLength { cipher: CipherKind, len: usize },

    #[error("{cipher} - invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength {
        cipher: CipherKind,
        expected: usize,
        actual: usize,
    },

    #[error("{0} - no key schedule has been set up")]
    KeyNotSet(CipherKind),

    #[error("RSA - input data contains invalid padding and is rejected")]
    InvalidPadding,

    #[error("RSA - key failed to pass the validity check: {0}")]
    InvalidKey(&'static str),

    #[error("RSA - message too long: at most {max} bytes, got {actual}")]
    MessageTooLong { max: usize, actual: usize },

    #[error("RSA - output buffer too small: room for {max} bytes, need {actual}")]
    OutputTooLarge { max: usize, actual: usize },

    #[error("RSA - bad input parameters: {0}")]
    RsaBadInput(&'static str),

    #[error("RSA - the PKCS#1 verification failed")]
    VerifyFailed,

    #[error("BIGNUM - division by zero")]
    DivisionByZero,

    #[error("BIGNUM - result would be negative")]
    NegativeValue,

    #[error("BIGNUM - value is not invertible modulo the given modulus")]
    NotInvertible,

    #[error("BIGNUM - bad input parameters: {0}")]
    BadMpiInput(&'static str),

    #[error("RSA - key generation failed after {attempts} attempts")]
    KeyGenerationFailed { attempts: usize },

    #[error("random source failed: {0}")]
    Random(String),

    #[error("MD - digest {0:?} is not available for this operation")]
    UnsupportedDigest(MdType),

    #[error("BASE64 - invalid input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("hex decoding failed: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("parallel execution setup failed: {0}")]
    ParallelSetup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{algorithm} self test failed at case #{case}")]
    SelfTestFailed { algorithm: &'static str, case: usize },

    #[error("operation failed: {0}")]
    Library(&'static str),
}

/// 本库统一的 `Result` 类型别名
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// 返回该错误对应的数值状态码（总是负数）
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidKeyLength { cipher, .. } => match cipher {
                CipherKind::Aes => ERR_AES_INVALID_KEY_LENGTH,
                CipherKind::Blowfish => ERR_BLOWFISH_INVALID_KEY_LENGTH,
                CipherKind::Camellia => ERR_CAMELLIA_INVALID_KEY_LENGTH,
                // XTEA 只有固定的 128 位密钥，PolarSSL 没有单独的错误码
                CipherKind::Xtea => ERR_GENERIC,
            },
            Error::InvalidInputLength { cipher, .. } | Error::InvalidIvLength { cipher, .. } => {
                input_length_code(*cipher)
            }
            Error::KeyNotSet(_) => ERR_GENERIC,
            Error::InvalidPadding => ERR_RSA_INVALID_PADDING,
            Error::InvalidStreamKeyLength(_) => ERR_ARC4_INVALID_KEY_LENGTH,
            Error::InvalidKey(_) => ERR_RSA_KEY_CHECK_FAILED,
            Error::MessageTooLong { .. } | Error::RsaBadInput(_) => ERR_RSA_BAD_INPUT_DATA,
            Error::OutputTooLarge { .. } => ERR_RSA_OUTPUT_TOO_LARGE,
            Error::VerifyFailed => ERR_RSA_VERIFY_FAILED,
            Error::DivisionByZero => ERR_MPI_DIVISION_BY_ZERO,
            Error::NegativeValue => ERR_MPI_NEGATIVE_VALUE,
            Error::NotInvertible => ERR_MPI_NOT_ACCEPTABLE,
            Error::BadMpiInput(_) => ERR_MPI_BAD_INPUT_DATA,
            Error::KeyGenerationFailed { .. } => ERR_RSA_KEY_GEN_FAILED,
            Error::Random(_) => ERR_RSA_RNG_FAILED,
            Error::UnsupportedDigest(_) => ERR_MD_FEATURE_UNAVAILABLE,
            Error::Base64(_) => ERR_BASE64_INVALID_CHARACTER,
            Error::Io(_) => ERR_MD_FILE_IO_ERROR,
            Error::Json(_) | Error::Config(_) | Error::Hex(_) => ERR_GENERIC,
            Error::ParallelSetup(_) => ERR_GENERIC,
            Error::SelfTestFailed { .. } | Error::Library(_) => ERR_GENERIC,
        }
    }
}

fn input_length_code(cipher: CipherKind) -> i32 {
    match cipher {
        CipherKind::Aes => ERR_AES_INVALID_INPUT_LENGTH,
        CipherKind::Blowfish => ERR_BLOWFISH_INVALID_INPUT_LENGTH,
        CipherKind::Camellia => ERR_CAMELLIA_INVALID_INPUT_LENGTH,
        CipherKind::Xtea => ERR_XTEA_INVALID_INPUT_LENGTH,
    }
}

/// 由状态码得到可读的错误描述，相当于 `polarssl_strerror`。
///
/// 宿主侧只拿到数值状态码时用它生成日志或异常消息；未知的状态码返回
/// `"UNKNOWN ERROR CODE"`。
pub fn strerror(code: i32) -> &'static str {
    match code {
        0 => "SUCCESS",
        ERR_GENERIC => "GENERIC - operation failed",
        ERR_MPI_BAD_INPUT_DATA => "BIGNUM - Bad input parameters to function",
        ERR_MPI_NEGATIVE_VALUE => "BIGNUM - The input arguments are negative or result in illegal output",
        ERR_MPI_DIVISION_BY_ZERO => "BIGNUM - The input argument for division is zero, which is not allowed",
        ERR_MPI_NOT_ACCEPTABLE => "BIGNUM - The input arguments are not acceptable",
        ERR_BLOWFISH_INVALID_KEY_LENGTH => "BLOWFISH - Invalid key length",
        ERR_BLOWFISH_INVALID_INPUT_LENGTH => "BLOWFISH - Invalid data input length",
        ERR_ARC4_INVALID_KEY_LENGTH => "ARC4 - Invalid key length",
        ERR_AES_INVALID_KEY_LENGTH => "AES - Invalid key length",
        ERR_AES_INVALID_INPUT_LENGTH => "AES - Invalid data input length",
        ERR_CAMELLIA_INVALID_KEY_LENGTH => "CAMELLIA - Invalid key length",
        ERR_CAMELLIA_INVALID_INPUT_LENGTH => "CAMELLIA - Invalid data input length",
        ERR_XTEA_INVALID_INPUT_LENGTH => "XTEA - The data input has an invalid length",
        ERR_BASE64_INVALID_CHARACTER => "BASE64 - Invalid character in input",
        ERR_RSA_BAD_INPUT_DATA => "RSA - Bad input parameters to function",
        ERR_RSA_INVALID_PADDING => "RSA - Input data contains invalid padding and is rejected",
        ERR_RSA_KEY_GEN_FAILED => "RSA - Something failed during generation of a key",
        ERR_RSA_KEY_CHECK_FAILED => "RSA - Key failed to pass the libraries validity check",
        ERR_RSA_VERIFY_FAILED => "RSA - The PKCS#1 verification failed",
        ERR_RSA_OUTPUT_TOO_LARGE => "RSA - The output buffer for decryption is not large enough",
        ERR_RSA_RNG_FAILED => "RSA - The random generator failed to generate non-zeros",
        ERR_MD_FEATURE_UNAVAILABLE => "MD - The selected feature is not available",
        ERR_MD_FILE_IO_ERROR => "MD - Opening or reading of file failed",
        _ => "UNKNOWN ERROR CODE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_codes_follow_cipher() {
        let aes = Error::InvalidKeyLength {
            cipher: CipherKind::Aes,
            bits: 100,
        };
        let camellia = Error::InvalidKeyLength {
            cipher: CipherKind::Camellia,
            bits: 100,
        };
        assert_eq!(aes.code(), -0x0020);
        assert_eq!(camellia.code(), -0x0024);
        assert_eq!(strerror(aes.code()), "AES - Invalid key length");

        let arc4 = Error::InvalidStreamKeyLength(0);
        assert_eq!(arc4.code(), -0x001A);
        assert_eq!(strerror(arc4.code()), "ARC4 - Invalid key length");
    }

    #[test]
    fn test_padding_and_verify_do_not_share_codes() {
        assert_ne!(Error::InvalidPadding.code(), Error::VerifyFailed.code());
        assert_eq!(
            strerror(Error::VerifyFailed.code()),
            "RSA - The PKCS#1 verification failed"
        );
    }

    #[test]
    fn test_every_code_is_negative_and_described() {
        let samples = [
            Error::InvalidPadding,
            Error::InvalidKey("modulus is even"),
            Error::DivisionByZero,
            Error::NotInvertible,
            Error::KeyGenerationFailed { attempts: 3 },
            Error::MessageTooLong { max: 5, actual: 9 },
            Error::InvalidIvLength {
                cipher: CipherKind::Xtea,
                expected: 8,
                actual: 3,
            },
        ];
        for err in samples {
            assert!(err.code() < 0);
            assert_ne!(strerror(err.code()), "UNKNOWN ERROR CODE");
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(strerror(-0x7777), "UNKNOWN ERROR CODE");
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::InvalidInputLength {
            cipher: CipherKind::Blowfish,
            len: 13,
        };
        assert_eq!(
            format!("{}", err),
            "BLOWFISH - invalid data input length: 13 bytes"
        );
    }
}
