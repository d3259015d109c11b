//! 整文件 JSON 持久化
//!
//! 缓存和作业记录都是"读出全部 → 修改 → 写回全部"。写入先落到同目录的
//! 临时文件再 rename，读者只会看到旧内容或新内容。

use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 读取 JSON 文件；文件不存在时返回 `None`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::io(path, e)),
    };
    let value = serde_json::from_slice(&bytes).map_err(|e| AppError::json(path, e))?;
    Ok(Some(value))
}

/// 读取必须存在的 JSON 输入文件
pub fn read_required_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    read_json(path)?.ok_or_else(|| AppError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// 序列化并原子写入
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> AppResult<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| AppError::json(path, e))?;
    write_bytes_atomic(path, &bytes)
}

/// 原子写入任意字节（PDF、markdown 也走这里）
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp).map_err(|e| AppError::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| AppError::io(&tmp, e))?;
    file.sync_all().map_err(|e| AppError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::io(path, e)
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
