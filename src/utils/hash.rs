//! 哈希工具
//!
//! 题目内容指纹和随机种子派生都基于 SHA-256

use sha2::{Digest, Sha256};

/// 计算字节内容的 SHA-256 十六进制摘要
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// 由标签派生稳定的 64 位值
///
/// 与进程无关，同一标签在任何机器上都得到相同结果
pub fn stable_hash(label: &str) -> u64 {
    let digest = Sha256::digest(label.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
