use std::sync::Arc;

use crate::config::Config;
use crate::store::SubmissionStore;
use crate::submission::intake::UploadIntake;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub intake: UploadIntake,
    pub store: SubmissionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let intake = UploadIntake::new(&config.upload_dir, config.profile, config.max_file_size);
        let store = SubmissionStore::new(&config.data_file);
        Self {
            config,
            intake,
            store,
        }
    }
}
