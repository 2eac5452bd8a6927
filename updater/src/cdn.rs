//! 버전 조회 / 패키지 다운로드 HTTP 클라이언트
//!
//! - 버전 조회: `version_url`에 GET 한 번, JSON에서 버전 문자열을 꺼냄 (타임아웃 있음)
//! - 패키지: `package_url_template`로 만든 URL을 스트리밍으로 파일에 기록 (타임아웃 없음)

use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::LauncherConfig;
use crate::error::UpdaterError;

/// 다운로드 쓰기 단위 (1 MiB)
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

const USER_AGENT: &str = concat!("nucleus-launcher/", env!("CARGO_PKG_VERSION"));

/// 배포 서버 클라이언트
pub struct DeployClient {
    /// 패키지 다운로드용 (타임아웃 없음)
    http: reqwest::Client,
    /// 버전 조회용 (타임아웃 적용)
    probe_http: reqwest::Client,
    version_url: String,
    version_json_pointer: String,
    version_prefix: String,
    package_url_template: String,
}

impl DeployClient {
    pub fn new(config: &LauncherConfig) -> Result<Self, UpdaterError> {
        let build_err = |e: reqwest::Error| UpdaterError::ConfigError {
            message: format!("failed to create HTTP client: {}", e),
        };

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(build_err)?;
        let probe_http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .build()
            .map_err(build_err)?;

        Ok(Self {
            http,
            probe_http,
            version_url: config.version_url.clone(),
            version_json_pointer: config.version_json_pointer.clone(),
            version_prefix: config.version_prefix.clone(),
            package_url_template: config.package_url_template.clone(),
        })
    }

    /// 패키지 다운로드 URL
    pub fn package_url(&self, version: &str, package: &str) -> String {
        self.package_url_template
            .replace("{version}", version)
            .replace("{package}", package)
    }

    /// 최신 버전 조회
    pub async fn fetch_latest_version(&self) -> Result<String, UpdaterError> {
        let url = &self.version_url;
        let response = self
            .probe_http
            .get(url)
            .send()
            .await
            .map_err(|e| UpdaterError::from_reqwest(&e, url))?;

        if !response.status().is_success() {
            return Err(UpdaterError::from_status(response.status(), url));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpdaterError::parse("version response", e.to_string()))?;

        extract_version(&body, &self.version_json_pointer, &self.version_prefix)
    }

    /// URL 내용을 파일로 스트리밍 저장, 기록한 바이트 수 반환
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, UpdaterError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpdaterError::from_reqwest(&e, url))?;

        if !response.status().is_success() {
            return Err(UpdaterError::from_status(response.status(), url));
        }

        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| UpdaterError::from_io(&e, "create", dest))?;
        let mut writer = tokio::io::BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| UpdaterError::from_reqwest(&e, url))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| UpdaterError::from_io(&e, "write", dest))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| UpdaterError::from_io(&e, "flush", dest))?;

        tracing::debug!("[Updater] Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

/// 버전 응답 JSON에서 버전 문자열 추출 후 접두사 제거
pub fn extract_version(body: &serde_json::Value, pointer: &str, prefix: &str) -> Result<String, UpdaterError> {
    let raw = body
        .pointer(pointer)
        .ok_or_else(|| UpdaterError::parse("version response", format!("missing field {}", pointer)))?
        .as_str()
        .ok_or_else(|| UpdaterError::parse("version response", format!("{} is not a string", pointer)))?;

    let version = raw.strip_prefix(prefix).unwrap_or(raw).trim();
    if version.is_empty() {
        return Err(UpdaterError::parse("version response", "empty version string"));
    }
    Ok(version.to_string())
}
