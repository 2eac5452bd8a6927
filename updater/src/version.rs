//! 설치 버전 기록 (`installed_version.txt`)
//!
//! 파일이 없거나 비어 있으면 "미설치" 상태이며 화면에는 `N/A`로 표시합니다.

use std::path::{Path, PathBuf};

use crate::error::UpdaterError;

/// 미설치 상태 표시값
pub const NOT_INSTALLED: &str = "N/A";

/// 설치 루트의 버전 기록 파일
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 설치된 버전 (없으면 None)
    pub fn read(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let version = content.trim();
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }

    /// 표시용 버전 문자열
    pub fn display(&self) -> String {
        display_version(self.read().as_deref())
    }

    /// 버전 기록 (덮어쓰기)
    pub fn write(&self, version: &str) -> Result<(), UpdaterError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| UpdaterError::from_io(&e, "create directory", parent))?;
        }
        std::fs::write(&self.path, version)
            .map_err(|e| UpdaterError::from_io(&e, "write version marker", &self.path))
    }

    /// 설치된 버전이 `latest`와 같은지
    pub fn is_current(&self, latest: &str) -> bool {
        self.read().as_deref() == Some(latest)
    }
}

/// `None`을 `N/A`로 표시
pub fn display_version(version: Option<&str>) -> String {
    version.unwrap_or(NOT_INSTALLED).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_marker_means_not_installed() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::new(tmp.path().join("installed_version.txt"));
        assert_eq!(store.read(), None);
        assert_eq!(store.display(), "N/A");
        assert!(!store.is_current("600"));
    }

    #[test]
    fn write_then_read_trims() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("root").join("installed_version.txt");
        let store = VersionStore::new(&path);
        store.write("600").unwrap();
        assert_eq!(store.read().as_deref(), Some("600"));

        std::fs::write(&path, "  601\n").unwrap();
        assert_eq!(store.read().as_deref(), Some("601"));
        assert!(store.is_current("601"));
    }

    #[test]
    fn blank_marker_is_not_installed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("installed_version.txt");
        std::fs::write(&path, "\n  \n").unwrap();
        assert_eq!(VersionStore::new(path).read(), None);
    }
}
