use crate::core::constants::step_ids;
use crate::core::{PathPosition, ProvisionContext, Step};
use crate::error::{AppError, AppResult};
use crate::infrastructure::env_path::add_to_path;
use crate::infrastructure::installer::extract_zip_stripped;
use crate::infrastructure::template::render_url;
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::path::PathBuf;

/// 从 `cmake-3.1.0-win32-x86.zip` 中取出 `3.1`
pub fn cmake_series(archive: &str) -> AppResult<String> {
    let re = Regex::new(r"^cmake-(\d+)\.(\d+)\.").map_err(|e| AppError::config(e.to_string()))?;
    let caps = re
        .captures(archive)
        .ok_or_else(|| AppError::config(format!("无法识别的 CMake 压缩包名: {}", archive)))?;
    Ok(format!("{}.{}", &caps[1], &caps[2]))
}

/// 免安装的 CMake 压缩包
pub struct CmakeStep;

impl CmakeStep {
    fn install_dir(ctx: &ProvisionContext) -> PathBuf {
        ctx.config.paths.program_files_x86.join("CMake")
    }
}

#[async_trait]
impl Step for CmakeStep {
    fn id(&self) -> String {
        step_ids::CMAKE.to_string()
    }

    fn description(&self) -> String {
        "CMake".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(Self::install_dir(ctx).join("bin").join("cmake.exe"))
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let cmake = &ctx.config.cmake;
        let url = render_url(
            &cmake.url,
            &json!({
                "series": cmake_series(&cmake.archive)?,
                "archive": cmake.archive,
            }),
        )?;

        let archive = ctx.fetch(&url).await?;
        let install_dir = Self::install_dir(ctx);
        extract_zip_stripped(archive.path(), &install_dir)?;

        let bin = install_dir.join("bin");
        if !bin.join("cmake.exe").exists() {
            return Err(AppError::installation(format!(
                "压缩包中没有 bin\\cmake.exe: {}",
                cmake.archive
            )));
        }
        add_to_path(ctx, &bin, PathPosition::Append)?;
        Ok(())
    }
}

/// Maven 二进制发行包
pub struct MavenStep;

impl MavenStep {
    fn install_dir(ctx: &ProvisionContext) -> PathBuf {
        ctx.config.paths.system_drive.join("maven")
    }
}

#[async_trait]
impl Step for MavenStep {
    fn id(&self) -> String {
        step_ids::MAVEN.to_string()
    }

    fn description(&self) -> String {
        "Maven".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(Self::install_dir(ctx).join("bin"))
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let maven = &ctx.config.maven;
        let url = render_url(&maven.url, &json!({ "version": maven.version }))?;

        let archive = ctx.fetch(&url).await?;
        let install_dir = Self::install_dir(ctx);
        extract_zip_stripped(archive.path(), &install_dir)?;

        let bin = install_dir.join("bin");
        if !bin.exists() {
            return Err(AppError::installation(format!(
                "Maven 压缩包中没有 bin 目录: {}",
                url
            )));
        }
        add_to_path(ctx, &bin, PathPosition::Append)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;
    use std::io::Write;

    fn zip_bytes(entries: &[&str]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for name in entries {
                writer
                    .start_file(*name, zip::write::FileOptions::default())
                    .unwrap();
                writer.write_all(b"content").unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_cmake_series() {
        assert_eq!(cmake_series("cmake-3.1.0-win32-x86.zip").unwrap(), "3.1");
        assert_eq!(cmake_series("cmake-2.8.12-win32-x86.zip").unwrap(), "2.8");
        assert!(cmake_series("ninja.zip").is_err());
    }

    #[tokio::test]
    async fn test_cmake_install_extracts_and_updates_path() {
        let host = TestHost::new();
        host.downloader.set_content(|_| {
            zip_bytes(&[
                "cmake-3.1.0-win32-x86/bin/cmake.exe",
                "cmake-3.1.0-win32-x86/bin/ctest.exe",
            ])
        });
        let ctx = host.context();

        assert!(!CmakeStep.is_installed(&ctx).unwrap());
        CmakeStep.install(&ctx).await.unwrap();
        assert!(CmakeStep.is_installed(&ctx).unwrap());

        assert_eq!(
            host.downloader.urls(),
            vec!["http://www.cmake.org/files/v3.1/cmake-3.1.0-win32-x86.zip"]
        );
        let bin = host.config.paths.program_files_x86.join("CMake").join("bin");
        assert!(ctx.search_path().unwrap().contains(&bin));
    }

    #[tokio::test]
    async fn test_maven_install() {
        let host = TestHost::new();
        host.downloader
            .set_content(|_| zip_bytes(&["apache-maven-3.2.5/bin/mvn.bat", "apache-maven-3.2.5/lib/a.jar"]));
        let ctx = host.context();

        MavenStep.install(&ctx).await.unwrap();

        assert!(host.root().join("maven").join("bin").join("mvn.bat").is_file());
        assert_eq!(
            host.downloader.urls(),
            vec!["https://archive.apache.org/dist/maven/maven-3/3.2.5/binaries/apache-maven-3.2.5-bin.zip"]
        );
    }

    #[tokio::test]
    async fn test_cmake_archive_without_binary_fails() {
        let host = TestHost::new();
        host.downloader.set_content(|_| zip_bytes(&["cmake/readme.txt"]));
        let ctx = host.context();

        let err = CmakeStep.install(&ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Installation { .. }));
    }
}
