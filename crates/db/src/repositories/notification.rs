//! Notification records created inside the caller's unit of work.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tally_core::ledger::LedgerError;

use crate::entities::notifications;
use crate::trace::TraceExt;

/// Input for a new notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Company.
    pub company_id: i64,
    /// Recipient.
    pub recipient_user_id: i64,
    /// Short title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Deep link into the application.
    pub link: String,
}

/// Creates notification records. Delivery happens elsewhere.
pub struct NotificationService;

impl NotificationService {
    /// Inserts a notification.
    pub async fn create(
        conn: &impl ConnectionTrait,
        input: NewNotification,
    ) -> Result<notifications::Model, LedgerError> {
        let row = notifications::ActiveModel {
            company_id: Set(input.company_id),
            recipient_user_id: Set(input.recipient_user_id),
            title: Set(input.title),
            message: Set(input.message),
            link: Set(input.link),
            created_at: Set(Utc::now().into()),
            read_at: Set(None),
            ..Default::default()
        };
        row.insert(conn).await.trace("NS-CREATE")
    }

    /// Notifications of a user, newest first.
    pub async fn for_recipient(
        conn: &impl ConnectionTrait,
        company_id: i64,
        recipient_user_id: i64,
    ) -> Result<Vec<notifications::Model>, LedgerError> {
        notifications::Entity::find()
            .filter(notifications::Column::CompanyId.eq(company_id))
            .filter(notifications::Column::RecipientUserId.eq(recipient_user_id))
            .order_by_desc(notifications::Column::Id)
            .all(conn)
            .await
            .trace("NS-LIST")
    }
}
