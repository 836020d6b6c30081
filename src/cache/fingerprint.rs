//! 任务指纹
//!
//! 缓存键：任务文本（加可选的缓存名判别符）的 SHA-256 十六进制摘要。
//! 指纹在参数替换之前基于原始任务文本计算，同一录制可服务不同参数值。

use sha2::{Digest, Sha256};

/// 计算任务指纹；同一 (task, cache_name) 跨进程、跨平台结果一致
pub fn fingerprint(task: &str, cache_name: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task.as_bytes());
    if let Some(name) = cache_name {
        hasher.update(name.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = fingerprint("get the header text", None);
        let b = fingerprint("get the header text", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_discriminator_changes_fingerprint() {
        let plain = fingerprint("get the header text", None);
        let named = fingerprint("get the header text", Some("login flow"));
        let other = fingerprint("get the header text", Some("signup flow"));
        assert_ne!(plain, named);
        assert_ne!(named, other);
    }

    #[test]
    fn test_empty_task_is_valid() {
        assert_eq!(fingerprint("", None).len(), 64);
    }
}
