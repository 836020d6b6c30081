//! 缓存存储
//!
//! 文件布局：<root>/<指纹>.json，或指定缓存名时 <root>/<缓存名(空白转下划线)>.json。
//! 文件内部始终按指纹键控，一个文件可容纳多个任务的条目。
//! 写入走读-合并-写：先加载既有文件，仅覆盖本指纹的条目，不丢兄弟条目。
//! 跨进程并发写同一文件不做互斥，后写者赢（调用方需要时自行按路径串行化）。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::entry::{substitute_parameters, CacheEntry, CacheFile, ParameterMap, Trace};
use crate::core::TaskError;

/// 缓存存储：绑定一个必须已存在的目录
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// 打开缓存目录；目录不存在视为配置错误，不自动创建
    pub fn open(root: &Path) -> Result<Self, TaskError> {
        if !root.is_dir() {
            return Err(TaskError::Config(format!(
                "Cache path {} does not exist",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// 解析缓存文件路径：缓存名优先（空白字符替换为下划线），否则用指纹
    pub fn file_path(&self, fingerprint: &str, cache_name: Option<&str>) -> PathBuf {
        let stem = match cache_name {
            Some(name) => sanitize_cache_name(name),
            None => fingerprint.to_string(),
        };
        self.root.join(format!("{}.json", stem))
    }

    /// 查找缓存条目
    ///
    /// 参数替换在解析 JSON 之前作用于原始文本；文件不存在即未命中。
    /// 文件存在但不可解析，或命中条目的内部指纹与键不一致，按缓存损坏处理。
    pub fn lookup(
        &self,
        fingerprint: &str,
        cache_name: Option<&str>,
        params: &ParameterMap,
    ) -> Result<Option<CacheEntry>, TaskError> {
        let path = self.file_path(fingerprint, cache_name);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|e| TaskError::CacheIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let substituted = substitute_parameters(&raw, params);
        let file: CacheFile =
            serde_json::from_str(&substituted).map_err(|e| TaskError::CacheCorruption {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        match file.get(fingerprint) {
            Some(entry) if entry.fingerprint == fingerprint => {
                debug!(path = %path.display(), fingerprint, "cache hit");
                Ok(Some(entry.clone()))
            }
            Some(entry) => Err(TaskError::CacheCorruption {
                path: path.display().to_string(),
                message: format!(
                    "entry fingerprint {} does not match key {}",
                    entry.fingerprint, fingerprint
                ),
            }),
            None => Ok(None),
        }
    }

    /// 写入缓存条目（读-合并-写，保留文件中其余条目）
    pub fn save(
        &self,
        fingerprint: &str,
        cache_name: Option<&str>,
        trace: &Trace,
    ) -> Result<(), TaskError> {
        let path = self.file_path(fingerprint, cache_name);

        let mut file: CacheFile = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| TaskError::CacheIo {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            serde_json::from_str(&raw).map_err(|e| TaskError::CacheCorruption {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            CacheFile::new()
        };

        file.insert(
            fingerprint.to_string(),
            CacheEntry {
                fingerprint: fingerprint.to_string(),
                trace: trace.clone(),
            },
        );

        let body = serde_json::to_string_pretty(&file).map_err(|e| TaskError::CacheIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&path, body).map_err(|e| TaskError::CacheIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), fingerprint, "cache entry saved");
        Ok(())
    }
}

fn sanitize_cache_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
