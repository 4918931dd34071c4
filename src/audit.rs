use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs::ActiveModel as AuditActive, error::AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    RestaurantCreate,
    StaffAdd,
    MenuChange,
    OrderCreate,
    OrderTransition,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::RestaurantCreate => "restaurant_create",
            AuditAction::StaffAdd => "staff_add",
            AuditAction::MenuChange => "menu_change",
            AuditAction::OrderCreate => "order_create",
            AuditAction::OrderTransition => "order_transition",
        }
    }
}

/// Record an audit row. Accepts a transaction so order writes and their
/// audit trail commit together.
pub async fn log_audit<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    action: AuditAction,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.as_str().to_string()),
        resource: Set(resource.map(str::to_string)),
        metadata: Set(metadata),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Best-effort variant for writes that must not fail the request.
pub async fn log_audit_lenient<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    action: AuditAction,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    if let Err(err) = log_audit(conn, user_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}
