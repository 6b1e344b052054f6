use std::path::PathBuf;

use super::*;

struct TempAppDir {
    path: PathBuf,
}

impl TempAppDir {
    fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("bunkmate-app-{}", uuid::Uuid::new_v4())),
        }
    }
}

impl Drop for TempAppDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[tokio::test]
async fn setup_should_create_storage_and_logs_under_app_data_dir() {
    let dir = TempAppDir::new();
    let state = setup(&dir.path, HostServices::default())
        .await
        .expect("setup");

    assert!(dir.path.join(DB_FILE_NAME).exists());
    let log_dir = state.log_dir().expect("log dir");
    assert!(log_dir.starts_with(&dir.path));
    assert!(log_dir.is_dir());
    assert_eq!(state.repository.load_criteria().await.expect("criteria"), 75);
}

#[tokio::test]
async fn setup_should_reopen_persisted_settings() {
    let dir = TempAppDir::new();
    {
        let state = setup(&dir.path, HostServices::default())
            .await
            .expect("first setup");
        state.repository.save_criteria(80).await.expect("save criteria");
    }

    let reopened = setup(&dir.path, HostServices::default())
        .await
        .expect("second setup");
    assert_eq!(reopened.repository.load_criteria().await.expect("criteria"), 80);
}
