//! 패키지 매니페스트 파싱
//!
//! 매니페스트는 한 줄에 토큰 하나인 텍스트입니다. 패키지 이름 사이사이에
//! 해시(32자리 hex), 크기(정수), 버전 태그(`v0`) 줄이 섞여 있으며
//! 이들을 걸러낸 나머지가 다운로드 순서대로의 패키지 목록입니다.
//!
//! ```text
//! v0
//! RobloxApp.zip
//! 4f9d3a0e4c6b2f3b8e1d7a5c9b0e2f41
//! 52418022
//! 129330736
//! ```

use regex::Regex;
use std::sync::LazyLock;

static HASH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{32}$").expect("valid hash regex"));
static SIZE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid size regex"));
static VERSION_TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+$").expect("valid version tag regex"));

/// 매니페스트를 받지 못했을 때 사용할 패키지 목록 (순서 유지)
pub const FALLBACK_PACKAGES: [&str; 23] = [
    "rbxPkgManifest.txt",
    "RobloxApp.zip",
    "redist.zip",
    "shaders.zip",
    "ssl.zip",
    "WebView2.zip",
    "WebView2RuntimeInstaller.zip",
    "content-avatar.zip",
    "content-configs.zip",
    "content-fonts.zip",
    "content-sky.zip",
    "content-sounds.zip",
    "content-textures2.zip",
    "content-models.zip",
    "content-platform-fonts.zip",
    "content-platform-dictionaries.zip",
    "content-terrain.zip",
    "content-textures3.zip",
    "extracontent-luapackages.zip",
    "extracontent-translations.zip",
    "extracontent-models.zip",
    "extracontent-textures.zip",
    "extracontent-places.zip",
];

/// 패키지 목록의 출처
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManifestSource {
    /// 서버에서 받은 매니페스트
    Remote,
    /// 매니페스트를 받지 못해 고정 목록 사용
    Fallback { reason: String },
}

/// 메타데이터 줄(해시/크기/버전 태그)인지 확인
fn is_metadata_line(line: &str) -> bool {
    HASH_LINE.is_match(line) || SIZE_LINE.is_match(line) || VERSION_TAG_LINE.is_match(line)
}

/// 매니페스트 텍스트에서 패키지 이름 목록을 추출
///
/// 빈 줄, `#` 주석, 메타데이터, `.xml` 항목, `denylist` 항목은 제외됩니다.
pub fn parse_manifest<S: AsRef<str>>(content: &str, denylist: &[S]) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !is_metadata_line(line))
        .filter(|line| !line.ends_with(".xml"))
        .filter(|line| !denylist.iter().any(|d| d.as_ref() == *line))
        .map(str::to_string)
        .collect()
}

/// 압축 해제 대상인지 (zip 아카이브)
pub fn is_archive(package: &str) -> bool {
    package.ends_with(".zip")
}
