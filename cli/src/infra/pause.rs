//! Wall-clock `Pause`.

use std::time::Duration;

use crate::application::ports::Pause;

pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
