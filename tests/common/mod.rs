use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use formstash::config::Config;
use formstash::submission::encoding::MimeLabel;
use formstash::submission::intake::IntakeProfile;

/// A running test server writing into its own temporary directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a multipart form to the submit route, return (body, status).
    pub async fn submit(&self, form: Form) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submit-form"))
            .multipart(form)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// POST a JSON body to the submit route, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submit-form"))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_form_data(&self) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url("/api/get-form-data"))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_form_data(&self) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url("/api/delete-form-data"))
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Number of files currently sitting in the staging directory.
    pub fn staged_file_count(&self) -> usize {
        count_files(&self.upload_dir)
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// A file part with an explicit name and declared content type.
pub fn file_part(bytes: &[u8], file_name: &str, mime: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime")
}

/// Ten bytes starting with a JPEG magic number.
pub const TINY_JPEG: [u8; 10] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 1, 2, 3, 4, 5];

pub fn test_config(dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        data_file: dir.join("data.json"),
        upload_dir: dir.join("uploads"),
        profile: IntakeProfile::Images,
        max_file_size: 10 * 1024 * 1024,
        max_body_size: 50 * 1024 * 1024,
        mime_label: MimeLabel::Declared,
        log_level: "warn".to_string(),
    }
}

/// Spawn a test app with the default image profile.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn a test app after letting the caller adjust its config.
pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = test_config(dir.path());
    customize(&mut config);

    let data_file = config.data_file.clone();
    let upload_dir = config.upload_dir.clone();
    let app = formstash::build_app(config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        data_file,
        upload_dir,
        _dir: dir,
    }
}
