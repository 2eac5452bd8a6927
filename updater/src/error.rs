//! 에러 타입
//!
//! ## 분류
//! - 네트워크: 요청 실패 또는 2xx 이외의 응답
//! - 파싱: 버전 응답 JSON 구조 불일치, 매니페스트 인코딩 오류
//! - 파일 시스템: 생성/삭제/이동 실패
//! - 아카이브: 손상되었거나 읽을 수 없는 zip
//!
//! 재시도는 하지 않습니다. 호출측이 중단(버전 조회)하거나
//! 기록 후 다음 패키지로 넘어갑니다(패키지 단위).

use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};

/// 업데이터 에러 타입
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum UpdaterError {
    /// 요청 실패 또는 실패 상태 코드
    NetworkError {
        url: String,
        status_code: Option<u16>,
        message: String,
    },
    /// 응답/매니페스트 형식 오류
    ParseError {
        what: String,
        message: String,
    },
    /// 파일 시스템 오류
    FileSystemError {
        operation: String,
        path: String,
        message: String,
    },
    /// zip 아카이브 오류
    ArchiveError {
        archive: String,
        message: String,
    },
    /// 설정 오류
    ConfigError {
        message: String,
    },
}

impl fmt::Display for UpdaterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdaterError::NetworkError { url, status_code: Some(code), .. } => {
                write!(f, "Network error: HTTP {} from {}", code, url)
            }
            UpdaterError::NetworkError { url, status_code: None, message } => {
                write!(f, "Network error: {} ({})", message, url)
            }
            UpdaterError::ParseError { what, message } => {
                write!(f, "Parse error in {}: {}", what, message)
            }
            UpdaterError::FileSystemError { operation, path, message } => {
                write!(f, "File system error during {} on '{}': {}", operation, path, message)
            }
            UpdaterError::ArchiveError { archive, message } => {
                write!(f, "Archive error in {}: {}", archive, message)
            }
            UpdaterError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for UpdaterError {}

impl UpdaterError {
    /// 네트워크 계열 에러인지 확인
    pub fn is_network(&self) -> bool {
        matches!(self, UpdaterError::NetworkError { .. })
    }

    /// 화면(창 모드)에 표시할 짧은 메시지
    pub fn user_message(&self) -> String {
        match self {
            UpdaterError::NetworkError { status_code: Some(404), .. } => {
                "The requested file does not exist on the server.".to_string()
            }
            UpdaterError::NetworkError { status_code: Some(code), .. } if *code >= 500 => {
                "The server is having trouble right now. Try again later.".to_string()
            }
            UpdaterError::NetworkError { .. } => {
                "Check your internet connection.".to_string()
            }
            UpdaterError::ParseError { what, .. } => {
                format!("Unexpected response while reading {}.", what)
            }
            UpdaterError::FileSystemError { .. } => {
                "Could not write to the installation folder. Check disk space and permissions.".to_string()
            }
            UpdaterError::ArchiveError { archive, .. } => {
                format!("{} is damaged and could not be extracted.", archive)
            }
            UpdaterError::ConfigError { message } => {
                format!("Configuration problem: {}", message)
            }
        }
    }

    /// reqwest 에러를 UpdaterError로 변환
    pub fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        UpdaterError::NetworkError {
            url: url.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    /// 실패 상태 코드 응답
    pub fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        UpdaterError::NetworkError {
            url: url.to_string(),
            status_code: Some(status.as_u16()),
            message: status.to_string(),
        }
    }

    /// IO 에러를 UpdaterError로 변환
    pub fn from_io(err: &std::io::Error, operation: &str, path: &Path) -> Self {
        UpdaterError::FileSystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// zip 에러를 UpdaterError로 변환
    pub fn from_zip(err: &zip::result::ZipError, archive: &Path) -> Self {
        UpdaterError::ArchiveError {
            archive: archive
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| archive.display().to_string()),
            message: err.to_string(),
        }
    }

    pub fn parse(what: &str, message: impl Into<String>) -> Self {
        UpdaterError::ParseError {
            what: what.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_display_prefers_status_code() {
        let err = UpdaterError::NetworkError {
            url: "http://cdn/x.zip".into(),
            status_code: Some(404),
            message: "404 Not Found".into(),
        };
        assert_eq!(err.to_string(), "Network error: HTTP 404 from http://cdn/x.zip");
        assert!(err.is_network());
        assert!(err.user_message().contains("does not exist"));
    }

    #[test]
    fn io_error_keeps_operation_and_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = UpdaterError::from_io(&io, "remove", Path::new("/tmp/root/content"));
        match &err {
            UpdaterError::FileSystemError { operation, path, .. } => {
                assert_eq!(operation, "remove");
                assert_eq!(path, "/tmp/root/content");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        assert!(!err.is_network());
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = UpdaterError::ConfigError { message: "bad".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "ConfigError");
        assert_eq!(json["details"]["message"], "bad");
    }
}
