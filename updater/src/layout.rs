//! 설치 루트 디렉터리 구조
//!
//! ## 디렉터리 구조
//! ```text
//! NucleusRobloxVersion/
//! ├── downloads/              (다운로드 캐시, 정리 대상 아님)
//! ├── installed_version.txt   (버전 기록, 정리 대상 아님)
//! ├── AppSettings.xml
//! ├── RobloxPlayerBeta.exe
//! ├── content/…
//! ├── ExtraContent/…
//! └── PlatformContent/pc/…
//! ```
//!
//! 패키지별 압축 해제 위치는 [`ExtractionMap`]이 결정하며,
//! 클라이언트가 기대하는 구조와 정확히 일치해야 합니다.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::LauncherConfig;
use crate::error::UpdaterError;

/// 패키지 → 설치 루트 기준 상대 경로 (빈 문자열은 루트)
const DEFAULT_EXTRACT_PATHS: [(&str, &str); 23] = [
    ("RobloxApp.zip", ""),
    ("redist.zip", ""),
    ("shaders.zip", "shaders/"),
    ("ssl.zip", "ssl/"),
    ("WebView2.zip", ""),
    ("WebView2RuntimeInstaller.zip", "WebView2RuntimeInstaller/"),
    ("content-avatar.zip", "content/avatar/"),
    ("content-configs.zip", "content/configs/"),
    ("content-fonts.zip", "content/fonts/"),
    ("content-sky.zip", "content/sky/"),
    ("content-sounds.zip", "content/sounds/"),
    ("content-textures2.zip", "content/textures/"),
    ("content-models.zip", "content/models/"),
    ("content-platform-fonts.zip", "PlatformContent/pc/fonts/"),
    ("content-platform-dictionaries.zip", "PlatformContent/pc/shared_compression_dictionaries/"),
    ("content-terrain.zip", "PlatformContent/pc/terrain/"),
    ("content-textures3.zip", "PlatformContent/pc/textures/"),
    ("extracontent-luapackages.zip", "ExtraContent/LuaPackages/"),
    ("extracontent-translations.zip", "ExtraContent/translations/"),
    ("extracontent-models.zip", "ExtraContent/models/"),
    ("extracontent-textures.zip", "ExtraContent/textures/"),
    ("extracontent-places.zip", "ExtraContent/places/"),
    ("rbxPkgManifest.txt", ""),
];

/// 패키지별 압축 해제 위치 테이블
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMap {
    entries: BTreeMap<String, String>,
}

impl Default for ExtractionMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_EXTRACT_PATHS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ExtractionMap {
    /// 기본 테이블 위에 설정의 `extract_paths`를 덮어씀
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (package, dir) in overrides {
            map.entries.insert(package.clone(), dir.clone());
        }
        map
    }

    /// 패키지의 상대 경로 (매핑이 없으면 빈 문자열 = 루트)
    pub fn relative_dir(&self, package: &str) -> &str {
        self.entries.get(package).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, package: &str) -> bool {
        self.entries.contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 정리 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanReport {
    /// 삭제한 항목 이름
    pub removed: Vec<String>,
    /// (항목 이름, 에러): 삭제 실패
    pub failed: Vec<(String, String)>,
}

/// 설치 루트와 그 하위 경로 관리
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
    download_dir_name: String,
    marker_file_name: String,
    settings_file_name: String,
    settings_content_folder: String,
    settings_base_url: String,
    executable_name: String,
    extraction: ExtractionMap,
}

impl InstallLayout {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            root: config.resolve_install_root(),
            download_dir_name: config.download_dir_name.clone(),
            marker_file_name: config.marker_file_name.clone(),
            settings_file_name: config.settings_file_name.clone(),
            settings_content_folder: config.settings_content_folder.clone(),
            settings_base_url: config.settings_base_url.clone(),
            executable_name: config.executable_name.clone(),
            extraction: ExtractionMap::with_overrides(&config.extract_paths),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join(&self.download_dir_name)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(&self.marker_file_name)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(&self.settings_file_name)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.root.join(&self.executable_name)
    }

    pub fn extraction_map(&self) -> &ExtractionMap {
        &self.extraction
    }

    /// 설치 루트와 다운로드 캐시 생성 (이미 있으면 무시)
    pub fn ensure(&self) -> Result<(), UpdaterError> {
        let dir = self.download_dir();
        std::fs::create_dir_all(&dir).map_err(|e| UpdaterError::from_io(&e, "create directory", &dir))
    }

    /// 패키지의 압축 해제 대상 디렉터리
    ///
    /// 루트 밖을 가리키는 경로는 루트로 대체합니다.
    pub fn destination_for(&self, package: &str) -> PathBuf {
        match sanitize_entry_name(self.extraction.relative_dir(package)) {
            Some(rel) => self.root.join(rel),
            None => self.root.clone(),
        }
    }

    /// 다운로드 캐시와 버전 기록을 제외한 설치 루트의 모든 항목 삭제
    ///
    /// 개별 항목의 삭제 실패는 기록만 하고 나머지를 계속 정리합니다.
    pub fn clean(&self) -> CleanReport {
        let mut report = CleanReport::default();

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
            Err(e) => {
                tracing::error!("[Installer] Cannot list {}: {}", self.root.display(), e);
                report.failed.push((self.root.display().to_string(), e.to_string()));
                return report;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name == self.download_dir_name || name == self.marker_file_name {
                continue;
            }

            let path = entry.path();
            let result = match entry.file_type() {
                Ok(ft) if ft.is_dir() => std::fs::remove_dir_all(&path),
                Ok(_) => std::fs::remove_file(&path),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.removed.push(name),
                Err(e) => {
                    tracing::warn!("[Installer] Error removing {}: {}", path.display(), e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        report
    }

    /// 다운로드 캐시 비우기 (디렉터리는 다시 생성)
    pub fn clear_download_cache(&self) -> Result<(), UpdaterError> {
        let dir = self.download_dir();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| UpdaterError::from_io(&e, "remove", &dir))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| UpdaterError::from_io(&e, "create directory", &dir))
    }

    /// AppSettings.xml 작성 (항상 덮어씀)
    pub fn write_app_settings(&self) -> Result<PathBuf, UpdaterError> {
        let path = self.settings_path();
        let content = app_settings_xml(&self.settings_content_folder, &self.settings_base_url);
        std::fs::write(&path, content).map_err(|e| UpdaterError::from_io(&e, "write settings", &path))?;
        Ok(path)
    }
}

/// AppSettings.xml 내용
pub fn app_settings_xml(content_folder: &str, base_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Settings>
    <ContentFolder>{}</ContentFolder>
    <BaseUrl>{}</BaseUrl>
</Settings>"#,
        content_folder, base_url
    )
}

/// zip 엔트리 이름을 대상 디렉터리 기준 상대 경로로 변환
///
/// `\` 구분자를 `/`로 바꾸고, 루트 밖으로 나가는 경로(`..`, 절대 경로)는 None.
pub fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// zip 아카이브의 모든 엔트리를 `target_dir`에 해제, 해제한 파일 수 반환
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<usize, UpdaterError> {
    std::fs::create_dir_all(target_dir)
        .map_err(|e| UpdaterError::from_io(&e, "create directory", target_dir))?;

    let file = std::fs::File::open(archive_path)
        .map_err(|e| UpdaterError::from_io(&e, "open", archive_path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| UpdaterError::from_zip(&e, archive_path))?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| UpdaterError::from_zip(&e, archive_path))?;
        let raw_name = entry.name().to_string();
        let Some(rel) = sanitize_entry_name(&raw_name) else {
            tracing::warn!("[Installer] Skipping unsafe entry '{}' in {}", raw_name, archive_path.display());
            continue;
        };
        let out_path = target_dir.join(rel);

        if entry.is_dir() || raw_name.ends_with('/') || raw_name.ends_with('\\') {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| UpdaterError::from_io(&e, "create directory", &out_path))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| UpdaterError::from_io(&e, "create directory", parent))?;
        }
        let mut outfile = std::fs::File::create(&out_path)
            .map_err(|e| UpdaterError::from_io(&e, "create", &out_path))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => UpdaterError::ArchiveError {
                archive: archive_path.display().to_string(),
                message: e.to_string(),
            },
            _ => UpdaterError::from_io(&e, "write", &out_path),
        })?;
        extracted += 1;
    }

    Ok(extracted)
}

/// 아카이브가 아닌 파일을 대상 디렉터리로 이동 (원래 이름 유지)
pub fn move_into(file: &Path, target_dir: &Path) -> Result<PathBuf, UpdaterError> {
    std::fs::create_dir_all(target_dir)
        .map_err(|e| UpdaterError::from_io(&e, "create directory", target_dir))?;
    let name = file
        .file_name()
        .ok_or_else(|| UpdaterError::FileSystemError {
            operation: "move".into(),
            path: file.display().to_string(),
            message: "path has no file name".into(),
        })?;
    let dest = target_dir.join(name);

    if std::fs::rename(file, &dest).is_err() {
        // 다른 볼륨이면 rename 불가 → 복사 후 삭제
        std::fs::copy(file, &dest).map_err(|e| UpdaterError::from_io(&e, "copy", &dest))?;
        std::fs::remove_file(file).map_err(|e| UpdaterError::from_io(&e, "remove", file))?;
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn layout_in(tmp: &TempDir) -> InstallLayout {
        InstallLayout::from_config(&LauncherConfig::with_install_root(tmp.path().join("root")))
    }

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extraction_map_matches_client_layout() {
        let map = ExtractionMap::default();
        assert_eq!(map.len(), 23);
        assert_eq!(map.relative_dir("RobloxApp.zip"), "");
        assert_eq!(map.relative_dir("content-textures2.zip"), "content/textures/");
        assert_eq!(map.relative_dir("content-textures3.zip"), "PlatformContent/pc/textures/");
        assert_eq!(
            map.relative_dir("content-platform-dictionaries.zip"),
            "PlatformContent/pc/shared_compression_dictionaries/"
        );
        assert_eq!(map.relative_dir("extracontent-luapackages.zip"), "ExtraContent/LuaPackages/");
        assert_eq!(map.relative_dir("unknown.zip"), "");
        assert!(!map.contains("unknown.zip"));
    }

    #[test]
    fn overrides_extend_the_default_table() {
        let mut overrides = BTreeMap::new();
        overrides.insert("content-extra.zip".to_string(), "content/extra/".to_string());
        overrides.insert("ssl.zip".to_string(), "certs/".to_string());
        let map = ExtractionMap::with_overrides(&overrides);
        assert_eq!(map.len(), 24);
        assert_eq!(map.relative_dir("content-extra.zip"), "content/extra/");
        assert_eq!(map.relative_dir("ssl.zip"), "certs/");
    }

    #[test]
    fn escaping_override_falls_back_to_root() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = LauncherConfig::with_install_root(tmp.path().join("root"));
        cfg.extract_paths.insert("a.zip".into(), "../outside/".into());
        cfg.extract_paths.insert("b.zip".into(), "/abs".into());
        cfg.extract_paths.insert("c.zip".into(), "PlatformContent\\pc\\extra".into());
        let layout = InstallLayout::from_config(&cfg);

        assert_eq!(layout.destination_for("a.zip"), layout.root());
        assert_eq!(layout.destination_for("b.zip"), layout.root());
        assert_eq!(
            layout.destination_for("c.zip"),
            layout.root().join("PlatformContent").join("pc").join("extra")
        );
    }

    #[test]
    fn every_fallback_package_resolves_under_root() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(&tmp);
        for package in crate::manifest::FALLBACK_PACKAGES {
            let dest = layout.destination_for(package);
            assert!(dest.starts_with(layout.root()), "{} -> {:?}", package, dest);
        }
        assert_eq!(layout.destination_for("RobloxApp.zip"), layout.root());
        assert_eq!(
            layout.destination_for("content-sky.zip"),
            layout.root().join("content").join("sky")
        );
    }

    #[test]
    fn clean_preserves_cache_and_marker() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(&tmp);
        layout.ensure().unwrap();

        std::fs::write(layout.marker_path(), "599").unwrap();
        std::fs::write(layout.download_dir().join("partial.zip"), b"xx").unwrap();
        std::fs::create_dir_all(layout.root().join("content").join("fonts")).unwrap();
        std::fs::write(layout.root().join("content").join("fonts").join("a.ttf"), b"f").unwrap();
        std::fs::write(layout.root().join("RobloxPlayerBeta.exe"), b"exe").unwrap();
        std::fs::write(layout.root().join("AppSettings.xml"), b"x").unwrap();

        let report = layout.clean();
        assert!(report.failed.is_empty());
        assert_eq!(report.removed.len(), 3);

        let mut left: Vec<String> = std::fs::read_dir(layout.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left, vec!["downloads", "installed_version.txt"]);
        assert_eq!(std::fs::read_to_string(layout.marker_path()).unwrap(), "599");
        assert!(layout.download_dir().join("partial.zip").exists());
    }

    #[test]
    fn clean_without_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(&tmp);
        assert_eq!(layout.clean(), CleanReport::default());
        assert!(!layout.root().exists());
    }

    #[test]
    fn settings_file_has_fixed_content_and_is_overwritten() {
        let tmp = TempDir::new().unwrap();
        let layout = layout_in(&tmp);
        layout.ensure().unwrap();
        std::fs::write(layout.settings_path(), "stale").unwrap();

        let path = layout.write_app_settings().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Settings>\n    <ContentFolder>content</ContentFolder>\n    <BaseUrl>http://www.roblox.com</BaseUrl>\n</Settings>"
        );
    }

    #[test]
    fn sanitize_normalizes_and_rejects_escapes() {
        assert_eq!(
            sanitize_entry_name("content\\fonts\\a.ttf"),
            Some(PathBuf::from("content").join("fonts").join("a.ttf"))
        );
        assert_eq!(sanitize_entry_name("./shaders/x.bin"), Some(PathBuf::from("shaders").join("x.bin")));
        assert_eq!(sanitize_entry_name("../evil.dll"), None);
        assert_eq!(sanitize_entry_name("a/../../evil.dll"), None);
        assert_eq!(sanitize_entry_name("/etc/passwd"), None);
        assert_eq!(sanitize_entry_name(""), None);
    }

    #[test]
    fn extract_archive_writes_nested_entries() {
        let tmp = TempDir::new().unwrap();
        let zip_path = tmp.path().join("pkg.zip");
        write_zip(
            &zip_path,
            &[
                ("RobloxPlayerBeta.exe", b"MZ"),
                ("content\\sounds\\ouch.ogg", b"ogg"),
                ("../escape.txt", b"nope"),
            ],
        );

        let target = tmp.path().join("out");
        let count = extract_archive(&zip_path, &target).unwrap();
        assert_eq!(count, 2);
        assert_eq!(std::fs::read(target.join("RobloxPlayerBeta.exe")).unwrap(), b"MZ");
        assert_eq!(
            std::fs::read(target.join("content").join("sounds").join("ouch.ogg")).unwrap(),
            b"ogg"
        );
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let tmp = TempDir::new().unwrap();
        let zip_path = tmp.path().join("broken.zip");
        std::fs::write(&zip_path, b"definitely not a zip").unwrap();
        let err = extract_archive(&zip_path, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, UpdaterError::ArchiveError { .. }), "{:?}", err);
    }

    #[test]
    fn move_into_keeps_file_name() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("rbxPkgManifest.txt");
        std::fs::write(&src, "v0\n").unwrap();
        let dest = move_into(&src, &tmp.path().join("root")).unwrap();
        assert_eq!(dest, tmp.path().join("root").join("rbxPkgManifest.txt"));
        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "v0\n");
    }
}
