use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// 文件系统工具
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// 安全地创建目录
    pub fn create_dir_all(path: &Path) -> Result<(), io::Error> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// 安全地删除目录及其内容
    pub fn remove_dir_all(path: &Path) -> Result<(), io::Error> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }

    /// 安全地删除文件
    pub fn remove_file(path: &Path) -> Result<(), io::Error> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// 读取文件内容，如果文件不存在则返回 None
    pub fn read_to_string_optional(path: &Path) -> Result<Option<String>, io::Error> {
        if path.exists() {
            Ok(Some(fs::read_to_string(path)?))
        } else {
            Ok(None)
        }
    }

    /// 写入文件，创建目录如果不存在
    pub fn write_to_string(path: &Path, content: &str) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            Self::create_dir_all(parent)?;
        }

        fs::write(path, content)
    }

    /// 递归复制目录，目标目录不存在时创建
    pub fn copy_dir(src: &Path, dst: &Path) -> Result<(), io::Error> {
        for entry in WalkDir::new(src) {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let target = dst.join(relative);

            if entry.file_type().is_dir() {
                Self::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    Self::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    /// 移动文件或目录，跨卷时退化为复制后删除
    pub fn move_dir(src: &Path, dst: &Path) -> Result<(), io::Error> {
        if let Some(parent) = dst.parent() {
            Self::create_dir_all(parent)?;
        }

        if fs::rename(src, dst).is_ok() {
            return Ok(());
        }

        log::debug!("rename {} 失败，改为复制", src.display());
        if src.is_dir() {
            Self::copy_dir(src, dst)?;
            fs::remove_dir_all(src)
        } else {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }

    /// 把目录下的每一项移动到目标目录中
    pub fn move_children(src_dir: &Path, dst_dir: &Path) -> Result<(), io::Error> {
        Self::create_dir_all(dst_dir)?;
        for entry in fs::read_dir(src_dir)? {
            let entry = entry?;
            Self::move_dir(&entry.path(), &dst_dir.join(entry.file_name()))?;
        }
        Ok(())
    }
}
