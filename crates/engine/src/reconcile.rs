use {
    futures::future::{join, join_all},
    herald_channels::{MessageBody, MessagingGateway},
    serde::Serialize,
    tracing::{debug, info, warn},
};

/// One channel in the newly desired set, with the carried-forward prior
/// message id when the channel was already published.
#[derive(Debug, Clone)]
pub struct DesiredTarget {
    pub channel_id: String,
    pub prior_message_id: Option<String>,
}

/// A previously published message leaving the desired set.
#[derive(Debug, Clone)]
pub struct RetiredTarget {
    pub channel_id: String,
    pub message_id: String,
}

/// How a channel ended the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Edited,
    Failed,
}

/// Outcome for a single channel within one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelResult {
    pub channel_id: String,
    pub status: DeliveryStatus,
    /// Id to persist for this channel: the new id after a send, the
    /// unchanged id after an edit, the stale id after a failed edit, and
    /// `None` after a failed send.
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    /// One entry per desired channel, in desired-list order.
    pub per_channel: Vec<ChannelResult>,
    /// First successfully delivered id; backs the primary id kept on the
    /// config row.
    pub first_success_id: Option<String>,
}

impl ReconcileReport {
    /// Channels that neither edited nor sent this pass.
    #[must_use]
    pub fn failed_channels(&self) -> Vec<&str> {
        self.per_channel
            .iter()
            .filter(|r| r.status == DeliveryStatus::Failed)
            .map(|r| r.channel_id.as_str())
            .collect()
    }

    /// Every successfully delivered `(channel_id, message_id)` pair.
    #[must_use]
    pub fn delivered(&self) -> Vec<(&str, &str)> {
        self.per_channel
            .iter()
            .filter(|r| r.status != DeliveryStatus::Failed)
            .filter_map(|r| {
                r.message_id
                    .as_deref()
                    .map(|id| (r.channel_id.as_str(), id))
            })
            .collect()
    }
}

/// Run one reconciliation pass.
///
/// Every desired channel is attempted exactly once, concurrently with its
/// siblings: edit in place when a prior id exists (falling back to a fresh
/// send when the message is gone), send fresh otherwise. Retired messages
/// are deleted best-effort alongside. The pass waits for every outcome; a
/// failing channel never aborts a sibling and nothing is retried.
pub async fn reconcile_pass(
    gateway: &dyn MessagingGateway,
    body: &MessageBody,
    desired: &[DesiredTarget],
    retired: &[RetiredTarget],
) -> ReconcileReport {
    let publishes = desired.iter().map(|target| {
        let channel_id = target.channel_id.clone();
        let prior = target.prior_message_id.clone();
        async move {
            match prior {
                Some(message_id) => edit_or_resend(gateway, body, &channel_id, &message_id).await,
                None => send_fresh(gateway, body, &channel_id).await,
            }
        }
    });

    let (per_channel, ()) = join(
        join_all(publishes),
        retire_messages(gateway, retired),
    )
    .await;

    let first_success_id = per_channel
        .iter()
        .find(|r| r.status != DeliveryStatus::Failed)
        .and_then(|r| r.message_id.clone());

    ReconcileReport {
        attempted: desired.len(),
        per_channel,
        first_success_id,
    }
}

/// Best-effort delete of retired messages, concurrently. "Already gone"
/// counts as success; any other failure is logged and swallowed.
pub async fn retire_messages(gateway: &dyn MessagingGateway, retired: &[RetiredTarget]) {
    let deletes = retired.iter().map(|target| {
        let channel_id = target.channel_id.clone();
        let message_id = target.message_id.clone();
        async move {
            match gateway.delete_message(&channel_id, &message_id).await {
                Ok(()) => {
                    debug!(
                        channel_id = %channel_id,
                        message_id = %message_id,
                        "retired announcement message"
                    );
                },
                Err(e) if e.is_not_found() => {
                    debug!(
                        channel_id = %channel_id,
                        message_id = %message_id,
                        "retired message already gone"
                    );
                },
                Err(e) => {
                    warn!(
                        channel_id = %channel_id,
                        message_id = %message_id,
                        error = %e,
                        "failed to delete retired message"
                    );
                },
            }
        }
    });
    join_all(deletes).await;
}

async fn edit_or_resend(
    gateway: &dyn MessagingGateway,
    body: &MessageBody,
    channel_id: &str,
    prior_id: &str,
) -> ChannelResult {
    match gateway.edit_message(channel_id, prior_id, body).await {
        Ok(()) => {
            debug!(channel_id, message_id = prior_id, "announcement edited in place");
            ChannelResult {
                channel_id: channel_id.to_string(),
                status: DeliveryStatus::Edited,
                message_id: Some(prior_id.to_string()),
                error: None,
            }
        },
        Err(e) if e.is_not_found() => {
            info!(
                channel_id,
                message_id = prior_id,
                "external message gone, sending a fresh copy"
            );
            send_fresh(gateway, body, channel_id).await
        },
        Err(e) => {
            warn!(
                channel_id,
                message_id = prior_id,
                error = %e,
                "edit failed, keeping the stale message id"
            );
            ChannelResult {
                channel_id: channel_id.to_string(),
                status: DeliveryStatus::Failed,
                message_id: Some(prior_id.to_string()),
                error: Some(e.to_string()),
            }
        },
    }
}

async fn send_fresh(
    gateway: &dyn MessagingGateway,
    body: &MessageBody,
    channel_id: &str,
) -> ChannelResult {
    match gateway.send_message(channel_id, body).await {
        Ok(message_id) => {
            info!(channel_id, message_id = %message_id, "announcement sent");
            ChannelResult {
                channel_id: channel_id.to_string(),
                status: DeliveryStatus::Sent,
                message_id: Some(message_id),
                error: None,
            }
        },
        Err(e) => {
            warn!(channel_id, error = %e, "send failed");
            ChannelResult {
                channel_id: channel_id.to_string(),
                status: DeliveryStatus::Failed,
                message_id: None,
                error: Some(e.to_string()),
            }
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    };

    use {
        async_trait::async_trait,
        herald_channels::{ChannelInfo, Error, Result as GatewayResult},
    };

    use super::*;

    /// Always-succeeding gateway that mints sequential message ids and
    /// records deletes.
    #[derive(Default)]
    struct SequentialGateway {
        counter: AtomicU64,
        deleted: Mutex<Vec<String>>,
        missing: Vec<String>,
    }

    #[async_trait]
    impl MessagingGateway for SequentialGateway {
        async fn fetch_channel(
            &self,
            guild_id: &str,
            channel_id: &str,
        ) -> GatewayResult<ChannelInfo> {
            Ok(ChannelInfo {
                id: channel_id.to_string(),
                guild_id: Some(guild_id.to_string()),
                name: None,
            })
        }

        async fn send_message(
            &self,
            _channel_id: &str,
            _body: &MessageBody,
        ) -> GatewayResult<String> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("msg-{n}"))
        }

        async fn edit_message(
            &self,
            _channel_id: &str,
            message_id: &str,
            _body: &MessageBody,
        ) -> GatewayResult<()> {
            if self.missing.iter().any(|m| m == message_id) {
                return Err(Error::not_found("message", message_id));
            }
            Ok(())
        }

        async fn delete_message(
            &self,
            _channel_id: &str,
            message_id: &str,
        ) -> GatewayResult<()> {
            if self.missing.iter().any(|m| m == message_id) {
                return Err(Error::not_found("message", message_id));
            }
            self.deleted.lock().unwrap().push(message_id.to_string());
            Ok(())
        }
    }

    fn desired(channel_id: &str, prior: Option<&str>) -> DesiredTarget {
        DesiredTarget {
            channel_id: channel_id.into(),
            prior_message_id: prior.map(Into::into),
        }
    }

    #[tokio::test]
    async fn results_keep_desired_list_order() {
        let gateway = SequentialGateway::default();
        let report = reconcile_pass(
            &gateway,
            &MessageBody::default(),
            &[desired("c3", None), desired("c1", None), desired("c2", None)],
            &[],
        )
        .await;

        assert_eq!(report.attempted, 3);
        let order: Vec<&str> = report
            .per_channel
            .iter()
            .map(|r| r.channel_id.as_str())
            .collect();
        assert_eq!(order, ["c3", "c1", "c2"]);
    }

    #[tokio::test]
    async fn edit_keeps_the_prior_id() {
        let gateway = SequentialGateway::default();
        let report = reconcile_pass(
            &gateway,
            &MessageBody::default(),
            &[desired("c1", Some("m-old"))],
            &[],
        )
        .await;

        assert_eq!(report.per_channel[0].status, DeliveryStatus::Edited);
        assert_eq!(report.per_channel[0].message_id.as_deref(), Some("m-old"));
        assert_eq!(report.first_success_id.as_deref(), Some("m-old"));
    }

    #[tokio::test]
    async fn missing_message_falls_back_to_send() {
        let gateway = SequentialGateway {
            missing: vec!["m-gone".into()],
            ..Default::default()
        };
        let report = reconcile_pass(
            &gateway,
            &MessageBody::default(),
            &[desired("c1", Some("m-gone"))],
            &[],
        )
        .await;

        assert_eq!(report.per_channel[0].status, DeliveryStatus::Sent);
        assert_eq!(report.per_channel[0].message_id.as_deref(), Some("msg-0"));
    }

    #[tokio::test]
    async fn first_success_id_skips_failures() {
        let gateway = SequentialGateway::default();
        let report = reconcile_pass(
            &gateway,
            &MessageBody::default(),
            &[desired("c1", None), desired("c2", None)],
            &[],
        )
        .await;
        assert_eq!(report.first_success_id, report.per_channel[0].message_id);
    }

    #[tokio::test]
    async fn retire_tolerates_missing_messages() {
        let gateway = SequentialGateway {
            missing: vec!["m-gone".into()],
            ..Default::default()
        };
        retire_messages(
            &gateway,
            &[
                RetiredTarget {
                    channel_id: "c1".into(),
                    message_id: "m-live".into(),
                },
                RetiredTarget {
                    channel_id: "c2".into(),
                    message_id: "m-gone".into(),
                },
            ],
        )
        .await;

        assert_eq!(*gateway.deleted.lock().unwrap(), vec!["m-live".to_string()]);
    }
}
