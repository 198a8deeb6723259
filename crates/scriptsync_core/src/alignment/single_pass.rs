//! Single-pass alignment for videos that fit one analysis window.

use std::path::Path;

use super::errors::AlignmentError;
use super::prompt::build_alignment_prompt;
use super::response::parse_alignment;
use crate::models::AlignmentResult;
use crate::service::{AlignmentService, RateLimiter, RetryPolicy};

/// Aligns the whole script against the whole video in one request.
pub struct SinglePassAligner<'a> {
    service: &'a dyn AlignmentService,
    rate: &'a RateLimiter,
    retry: &'a RetryPolicy,
}

impl<'a> SinglePassAligner<'a> {
    pub fn new(
        service: &'a dyn AlignmentService,
        rate: &'a RateLimiter,
        retry: &'a RetryPolicy,
    ) -> Self {
        Self {
            service,
            rate,
            retry,
        }
    }

    pub async fn align(
        &self,
        video: &Path,
        script: &str,
        instructions: Option<&str>,
    ) -> Result<AlignmentResult, AlignmentError> {
        if script.trim().is_empty() {
            return Err(AlignmentError::invalid_input("script is empty"));
        }

        self.rate.wait().await;
        let handle = self
            .retry
            .execute("video upload", || self.service.upload_video(video))
            .await?;

        let prompt = build_alignment_prompt(script, instructions);
        let text = self
            .retry
            .execute("alignment request", || {
                self.service.request_alignment(&handle, &prompt)
            })
            .await?;

        let mut result = parse_alignment(&text)?;
        if result.scenes.is_empty() {
            return Err(AlignmentError::NoScenes);
        }
        result.renumber();
        Ok(result)
    }
}
