//! 런처 설정 관리
//!
//! `launcher.toml`에서 설정을 로드합니다. 모든 필드는 기본값을 가지므로
//! 파일이 없거나 일부 키만 있어도 동작합니다.
//!
//! ```toml
//! install_root = "D:/Games/NucleusRobloxVersion"
//! probe_timeout_secs = 15
//!
//! [extract_paths]
//! "content-extra.zip" = "content/extra/"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::UpdaterError;

/// 설치 루트 환경 변수 오버라이드
pub const INSTALL_ROOT_ENV: &str = "NUCLEUS_INSTALL_ROOT";

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// 런처 설정: 한 번 생성되어 모든 컴포넌트에 참조로 전달됨
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// 최신 버전 조회 엔드포인트
    pub version_url: String,
    /// 응답 JSON에서 버전 문자열 위치 (JSON pointer)
    pub version_json_pointer: String,
    /// 버전 문자열 앞에서 제거할 접두사
    pub version_prefix: String,
    /// 패키지 다운로드 URL 템플릿 (`{version}`, `{package}` 치환)
    pub package_url_template: String,
    /// 패키지 매니페스트 파일 이름
    pub manifest_name: String,
    /// 설치 루트 (None이면 실행 파일 옆 `NucleusRobloxVersion`)
    pub install_root: Option<PathBuf>,
    /// 다운로드 캐시 디렉터리 이름 (설치 루트 하위)
    pub download_dir_name: String,
    /// 설치 버전 기록 파일 이름
    pub marker_file_name: String,
    /// 설정 파일 이름
    pub settings_file_name: String,
    pub settings_content_folder: String,
    pub settings_base_url: String,
    /// 실행할 클라이언트 실행 파일 (설치 루트 기준)
    pub executable_name: String,
    /// 버전 조회 타임아웃 (패키지 다운로드에는 타임아웃 없음)
    pub probe_timeout_secs: u64,
    /// 매니페스트에서 제외할 항목
    pub manifest_denylist: Vec<String>,
    /// 매니페스트를 받지 못했을 때 사용할 패키지 목록
    pub fallback_packages: Vec<String>,
    /// 기본 압축 해제 경로에 추가/덮어쓸 항목
    pub extract_paths: BTreeMap<String, String>,
    /// 일부 패키지가 실패해도 버전 기록을 갱신할지 여부
    pub advance_marker_on_partial_failure: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            version_url: "https://nucleus.rip/info".to_string(),
            version_json_pointer: "/Versions/Roblox".to_string(),
            version_prefix: "version-".to_string(),
            package_url_template: "https://setup-aws.rbxcdn.com/version-{version}-{package}".to_string(),
            manifest_name: "rbxPkgManifest.txt".to_string(),
            install_root: None,
            download_dir_name: "downloads".to_string(),
            marker_file_name: "installed_version.txt".to_string(),
            settings_file_name: "AppSettings.xml".to_string(),
            settings_content_folder: "content".to_string(),
            settings_base_url: "http://www.roblox.com".to_string(),
            executable_name: "RobloxPlayerBeta.exe".to_string(),
            probe_timeout_secs: 10,
            manifest_denylist: vec![
                "ClientSettings".to_string(),
                "RobloxPlayerInstaller.exe".to_string(),
            ],
            fallback_packages: crate::manifest::FALLBACK_PACKAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extract_paths: BTreeMap::new(),
            advance_marker_on_partial_failure: false,
        }
    }
}

impl LauncherConfig {
    /// 지정한 설치 루트를 사용하는 기본 설정
    pub fn with_install_root(root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: Some(root.into()),
            ..Default::default()
        }
    }

    /// 실제 설치 루트 결정: 설정값 → 환경 변수 → 실행 파일 옆
    pub fn resolve_install_root(&self) -> PathBuf {
        if let Some(ref root) = self.install_root {
            return root.clone();
        }
        if let Ok(p) = std::env::var(INSTALL_ROOT_ENV) {
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        exe_dir().join("NucleusRobloxVersion")
    }

    /// 필수 값 검증
    pub fn validate(&self) -> Result<(), UpdaterError> {
        if self.version_url.trim().is_empty() {
            return Err(UpdaterError::ConfigError { message: "version_url is empty".into() });
        }
        if !self.package_url_template.contains("{package}") {
            return Err(UpdaterError::ConfigError {
                message: format!(
                    "package_url_template must contain {{package}}: '{}'",
                    self.package_url_template
                ),
            });
        }
        if self.executable_name.trim().is_empty() {
            return Err(UpdaterError::ConfigError { message: "executable_name is empty".into() });
        }
        for (name, field) in [
            (&self.download_dir_name, "download_dir_name"),
            (&self.marker_file_name, "marker_file_name"),
        ] {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(UpdaterError::ConfigError {
                    message: format!("{} must be a plain file name: '{}'", field, name),
                });
            }
        }
        for (package, dir) in &self.extract_paths {
            let dir = dir.trim_end_matches(['/', '\\']);
            if !dir.is_empty() && crate::layout::sanitize_entry_name(dir).is_none() {
                return Err(UpdaterError::ConfigError {
                    message: format!(
                        "extract_paths.\"{}\" must stay inside the installation root: '{}'",
                        package, dir
                    ),
                });
            }
        }
        Ok(())
    }
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 설정 파일 경로 결정
pub fn config_file_path() -> Option<PathBuf> {
    // 1. 실행 파일 옆 config/launcher.toml, launcher.toml
    let dir = exe_dir();
    let candidates = [
        dir.join("config").join(CONFIG_FILE_NAME),
        dir.join(CONFIG_FILE_NAME),
        // 2. CWD의 config/launcher.toml
        PathBuf::from("config").join(CONFIG_FILE_NAME),
    ];
    candidates.into_iter().find(|p| p.exists())
}

/// 지정한 파일에서 설정 로드 (파일이 없거나 잘못되면 에러)
pub fn load_config_from(path: &Path) -> Result<LauncherConfig, UpdaterError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| UpdaterError::from_io(&e, "read config", path))?;
    let cfg = parse_config(&content)?;
    tracing::info!("[Config] Loaded from {:?}", path);
    Ok(cfg)
}

/// TOML 문자열에서 설정 파싱
pub fn parse_config(content: &str) -> Result<LauncherConfig, UpdaterError> {
    let cfg: LauncherConfig = toml::from_str(content).map_err(|e| UpdaterError::ConfigError {
        message: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// 설정 로드: 명시 경로가 있으면 그 파일, 없으면 탐색 후 기본값
pub fn load_config(explicit: Option<&Path>) -> Result<LauncherConfig, UpdaterError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    match config_file_path() {
        Some(path) => match load_config_from(&path) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                tracing::warn!("[Config] Ignoring {:?}: {}", path, e);
                Ok(LauncherConfig::default())
            }
        },
        None => Ok(LauncherConfig::default()),
    }
}
