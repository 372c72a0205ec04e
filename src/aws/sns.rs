//! SNS notification publisher

use tracing::info;

use super::context::AwsContext;
use crate::cloud::Notifier;
use crate::error::NotificationError;

/// Publishes run reports to a configured SNS topic.
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(ctx: &AwsContext, topic_arn: impl Into<String>) -> Self {
        Self {
            client: ctx.sns_client(),
            topic_arn: topic_arn.into(),
        }
    }
}

impl Notifier for SnsNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|error| NotificationError(format!("{error}")))?;

        info!(topic_arn = %self.topic_arn, "Notification sent");
        Ok(())
    }
}
