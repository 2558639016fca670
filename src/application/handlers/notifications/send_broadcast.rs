//! SendBroadcastHandler - admin push broadcast to a filtered student audience.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode};
use crate::ports::{
    AudienceFilter, AuditEntry, AuditLog, PushNotifier, StudentDirectory, BROADCAST_SENT,
};

/// Filter value meaning "no restriction".
pub const ALL: &str = "ALL";

/// Command to broadcast a notification.
#[derive(Debug, Clone)]
pub struct SendBroadcastCommand {
    pub caller: AuthenticatedUser,
    pub title: String,
    pub body: String,
    /// Study level, or `ALL`/absent for every level.
    pub target_level: Option<String>,
    /// Faculty id, or `ALL`/absent for every faculty.
    pub target_faculty_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendBroadcastResult {
    /// Tokens the notification was delivered to.
    pub recipient_count: usize,
    pub failure_count: usize,
}

pub struct SendBroadcastHandler {
    directory: Arc<dyn StudentDirectory>,
    notifier: Arc<dyn PushNotifier>,
    audit_log: Arc<dyn AuditLog>,
}

fn normalize_filter(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != ALL)
}

impl SendBroadcastHandler {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        notifier: Arc<dyn PushNotifier>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            directory,
            notifier,
            audit_log,
        }
    }

    pub async fn handle(
        &self,
        cmd: SendBroadcastCommand,
    ) -> Result<SendBroadcastResult, DomainError> {
        // 1. Admins only
        if !cmd.caller.is_admin {
            return Err(DomainError::new(ErrorCode::Forbidden, "Admins only."));
        }

        let title = cmd.title.trim();
        let body = cmd.body.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if body.is_empty() {
            return Err(DomainError::validation("body", "must not be empty"));
        }

        // 2. Resolve the audience
        let filter = AudienceFilter {
            faculty_id: normalize_filter(cmd.target_faculty_id),
            level: normalize_filter(cmd.target_level),
        };
        let tokens: Vec<String> = self
            .directory
            .find_broadcast_targets(&filter)
            .await?
            .iter()
            .filter_map(|p| p.push_token().map(str::to_string))
            .collect();

        if tokens.is_empty() {
            tracing::info!(?filter, "Broadcast matched no recipients");
            return Ok(SendBroadcastResult {
                recipient_count: 0,
                failure_count: 0,
            });
        }

        // 3. Send
        let report = self
            .notifier
            .send_multicast(&tokens, title, body)
            .await
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        // 4. Audit; the notification is already out, so a failed write is only logged
        let entry = AuditEntry::new(
            BROADCAST_SENT,
            cmd.caller.audit_name(),
            json!({
                "title": title,
                "targetLevel": filter.level.as_deref().unwrap_or(ALL),
                "facultyId": filter.faculty_id.as_deref().unwrap_or(ALL),
                "recipientCount": report.success_count,
            }),
        );
        if let Err(e) = self.audit_log.record(&entry).await {
            tracing::error!(error = %e, "Failed to record broadcast in audit log");
        }

        tracing::info!(
            actor = %cmd.caller.audit_name(),
            recipients = report.success_count,
            failures = report.failure_count,
            "Broadcast sent"
        );

        Ok(SendBroadcastResult {
            recipient_count: report.success_count,
            failure_count: report.failure_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAuditLog, InMemoryStudentDirectory};
    use crate::adapters::push::MockPushNotifier;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::identity::{MatriculeKey, StudentProfile};

    fn student(id: &str, faculty: &str, level: &str, token: Option<&str>) -> StudentProfile {
        let profile = StudentProfile::register(
            UserId::new(id).unwrap(),
            MatriculeKey::new(faculty, id).unwrap(),
            Some(level.to_string()),
            Timestamp::now(),
        );
        match token {
            Some(t) => profile.with_notification_token(t),
            None => profile,
        }
    }

    struct Fixture {
        notifier: MockPushNotifier,
        audit: Arc<InMemoryAuditLog>,
        handler: SendBroadcastHandler,
    }

    fn fixture(notifier: MockPushNotifier) -> Fixture {
        let directory = Arc::new(InMemoryStudentDirectory::with_profiles([
            student("s1", "F1", "L1", Some("tok-1")),
            student("s2", "F1", "L2", Some("tok-2")),
            student("s3", "F2", "L1", Some("tok-3")),
            student("s4", "F1", "L1", None),
            student("s5", "F1", "L1", Some("  ")),
        ]));
        let audit = Arc::new(InMemoryAuditLog::new());
        let handler =
            SendBroadcastHandler::new(directory, Arc::new(notifier.clone()), audit.clone());
        Fixture {
            notifier,
            audit,
            handler,
        }
    }

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser::admin(UserId::new("ops").unwrap(), Some("ops@campus.test".into()))
    }

    fn cmd(level: Option<&str>, faculty: Option<&str>) -> SendBroadcastCommand {
        SendBroadcastCommand {
            caller: admin(),
            title: "Exam".into(),
            body: "Room changed".into(),
            target_level: level.map(str::to_string),
            target_faculty_id: faculty.map(str::to_string),
        }
    }

    fn sent_tokens(notifier: &MockPushNotifier) -> Vec<String> {
        let mut tokens: Vec<String> = notifier.sent().into_iter().map(|m| m.token).collect();
        tokens.sort();
        tokens
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Audience Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn all_targets_every_student_with_a_token() {
        let f = fixture(MockPushNotifier::new());

        let result = f.handler.handle(cmd(Some("ALL"), None)).await.unwrap();

        assert_eq!(result.recipient_count, 3);
        assert_eq!(sent_tokens(&f.notifier), vec!["tok-1", "tok-2", "tok-3"]);
    }

    #[tokio::test]
    async fn filters_by_faculty_and_level() {
        let f = fixture(MockPushNotifier::new());

        let result = f.handler.handle(cmd(Some("L1"), Some("F1"))).await.unwrap();

        assert_eq!(result.recipient_count, 1);
        assert_eq!(sent_tokens(&f.notifier), vec!["tok-1"]);
    }

    #[tokio::test]
    async fn no_match_sends_nothing_and_skips_audit() {
        let f = fixture(MockPushNotifier::new());

        let result = f.handler.handle(cmd(Some("L9"), None)).await.unwrap();

        assert_eq!(result.recipient_count, 0);
        assert_eq!(f.notifier.sent_count(), 0);
        assert!(f.audit.entries().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Audit Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn audit_entry_records_success_count() {
        let f = fixture(MockPushNotifier::new().failing_for("tok-2"));

        let result = f.handler.handle(cmd(None, Some("F1"))).await.unwrap();

        assert_eq!(result.recipient_count, 1);
        assert_eq!(result.failure_count, 1);
        let entries = f.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, BROADCAST_SENT);
        assert_eq!(entries[0].actor, "ops@campus.test");
        assert_eq!(entries[0].details["title"], "Exam");
        assert_eq!(entries[0].details["targetLevel"], "ALL");
        assert_eq!(entries[0].details["facultyId"], "F1");
        assert_eq!(entries[0].details["recipientCount"], 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let f = fixture(MockPushNotifier::new());
        let mut command = cmd(None, None);
        command.caller = AuthenticatedUser::new(UserId::new("s1").unwrap(), None);

        let err = f.handler.handle(command).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let f = fixture(MockPushNotifier::new());
        let mut command = cmd(None, None);
        command.title = "  ".into();

        let err = f.handler.handle(command).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
