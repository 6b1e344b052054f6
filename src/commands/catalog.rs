use bunkmate_protocol::models::{SubjectCatalogEntry, Topic};
use bunkmate_protocol::{AppResult, InvokeError};

use super::run_command_async;
use crate::app::state::AppState;

pub async fn catalog_list(
    state: &AppState,
    request_id: Option<String>,
) -> Result<Vec<SubjectCatalogEntry>, InvokeError> {
    run_command_async("catalog_list", request_id, || async move {
        let catalog = state.repository.load_catalog().await?;
        AppResult::Ok(catalog.into_entries())
    })
    .await
}

pub async fn catalog_add_topic(
    state: &AppState,
    subject_id: String,
    name: String,
    request_id: Option<String>,
) -> Result<Topic, InvokeError> {
    run_command_async("catalog_add_topic", request_id, || async move {
        state.repository.add_topic(&subject_id, &name).await
    })
    .await
}

pub async fn catalog_update_topic_notes(
    state: &AppState,
    subject_id: String,
    topic_id: String,
    notes: String,
    request_id: Option<String>,
) -> Result<Topic, InvokeError> {
    run_command_async("catalog_update_topic_notes", request_id, || async move {
        state
            .repository
            .update_topic_notes(&subject_id, &topic_id, &notes)
            .await
    })
    .await
}

pub async fn catalog_toggle_topic_favorite(
    state: &AppState,
    subject_id: String,
    topic_id: String,
    request_id: Option<String>,
) -> Result<Topic, InvokeError> {
    run_command_async("catalog_toggle_topic_favorite", request_id, || async move {
        state
            .repository
            .toggle_topic_favorite(&subject_id, &topic_id)
            .await
    })
    .await
}

pub async fn catalog_remove_topic(
    state: &AppState,
    subject_id: String,
    topic_id: String,
    request_id: Option<String>,
) -> Result<Topic, InvokeError> {
    run_command_async("catalog_remove_topic", request_id, || async move {
        state.repository.remove_topic(&subject_id, &topic_id).await
    })
    .await
}
