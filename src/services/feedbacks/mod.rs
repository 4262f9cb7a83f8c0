pub mod list;
pub mod read;
pub mod send;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::feedbacks::requests::SendFeedbackRequest;
use crate::storage::Storage;

pub struct FeedbackService {
    storage: Option<Arc<dyn Storage>>,
}

impl FeedbackService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 教师发送反馈
    pub async fn send_feedback(
        &self,
        request: &HttpRequest,
        feedback: SendFeedbackRequest,
    ) -> ActixResult<HttpResponse> {
        send::send_feedback(self, request, feedback).await
    }

    // 教师最近一个月发送的反馈
    pub async fn list_my_feedbacks(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_my_feedbacks(self, request).await
    }

    pub async fn list_unread(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_unread(self, request).await
    }

    // 最近 30 天的全部反馈
    pub async fn list_recent(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_recent(self, request).await
    }

    pub async fn mark_read(&self, request: &HttpRequest, feedback_id: i64) -> ActixResult<HttpResponse> {
        read::mark_read(self, request, feedback_id).await
    }
}
