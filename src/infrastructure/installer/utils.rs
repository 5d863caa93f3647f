use crate::error::{AppError, AppResult};
use crate::utils::filesystem::FileSystemUtils;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) {percent}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> AppResult<()> {
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AppError::installation(format!("读取 ZIP 文件失败: {}", e)))?;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| AppError::installation(format!("读取 ZIP 文件项失败: {}", e)))?;
        let outpath = dest_dir.join(file.mangled_name());
        if file.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent() {
                if !p.exists() {
                    fs::create_dir_all(p)?;
                }
            }
            let mut outfile = fs::File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }
    Ok(())
}

/// 解压 ZIP 到 `dest_dir`，压缩包只有一个顶层目录时去掉这一层
pub fn extract_zip_stripped(zip_path: &Path, dest_dir: &Path) -> AppResult<()> {
    let staging = tempfile::Builder::new()
        .prefix("winprep-unzip")
        .tempdir_in(staging_parent(dest_dir))?;
    extract_zip(zip_path, staging.path())?;

    let root = single_child_dir(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf());
    FileSystemUtils::move_dir(&root, dest_dir)?;
    Ok(())
}

/// 在目标所在目录旁建立临时目录，便于直接 rename
fn staging_parent(dest_dir: &Path) -> PathBuf {
    match dest_dir.parent() {
        Some(parent) if parent.exists() => parent.to_path_buf(),
        _ => std::env::temp_dir(),
    }
}

/// 目录中只有一个子目录时返回它
fn single_child_dir(dir: &Path) -> AppResult<Option<PathBuf>> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(Some(only.clone())),
        _ => Ok(None),
    }
}
