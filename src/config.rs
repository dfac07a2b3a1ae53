use std::net::IpAddr;
use std::path::PathBuf;

use crate::submission::encoding::MimeLabel;
use crate::submission::intake::IntakeProfile;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,
    pub profile: IntakeProfile,
    pub max_file_size: u64,
    pub max_body_size: usize,
    pub mime_label: MimeLabel,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FORMSTASH_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMSTASH_HOST: {e}"))?;

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PORT: {e}"))?;

        let data_file = PathBuf::from(env_or("FORMSTASH_DATA_FILE", "data.json"));
        let upload_dir = PathBuf::from(env_or("FORMSTASH_UPLOAD_DIR", "uploads"));

        let profile = match env_or("FORMSTASH_INTAKE_PROFILE", "images").as_str() {
            "images" => IntakeProfile::Images,
            "documents" => IntakeProfile::Documents,
            other => {
                return Err(format!(
                    "Invalid FORMSTASH_INTAKE_PROFILE '{other}': expected 'images' or 'documents'"
                ));
            }
        };

        let max_file_size: u64 = env_or("FORMSTASH_MAX_FILE_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid FORMSTASH_MAX_FILE_SIZE: {e}"))?;

        let max_body_size: usize = env_or("FORMSTASH_MAX_BODY_SIZE", "52428800")
            .parse()
            .map_err(|e| format!("Invalid FORMSTASH_MAX_BODY_SIZE: {e}"))?;

        let mime_label = match env_or("FORMSTASH_MIME_LABEL", "declared").as_str() {
            "declared" => MimeLabel::Declared,
            "fixed" => MimeLabel::Fixed,
            other => {
                return Err(format!(
                    "Invalid FORMSTASH_MIME_LABEL '{other}': expected 'declared' or 'fixed'"
                ));
            }
        };

        let log_level = env_or("FORMSTASH_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            data_file,
            upload_dir,
            profile,
            max_file_size,
            max_body_size,
            mime_label,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
