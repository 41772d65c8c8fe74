use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};

use crate::{
    audit,
    entity::{CartItems, Orders, Users, cart_items, order_lines, orders},
    error::WebhookError,
    payments::{events::Event, signature},
    repo,
    state::AppState,
};

/// Largest webhook body accepted.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

pub const ORDER_STATUS_PROCESSING: &str = "processing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Fulfilled { order_id: i32, lines: usize },
    /// The session was already turned into an order.
    Duplicate,
    /// A verified event the storefront does not act on.
    Ignored,
}

/// Verify, parse and act on one provider event. `now` is the unix time the
/// signature timestamp is checked against.
pub async fn handle_webhook(
    state: &AppState,
    payload: &[u8],
    signature_header: Option<&str>,
    now: i64,
) -> Result<WebhookOutcome, WebhookError> {
    if payload.len() > MAX_WEBHOOK_BODY_BYTES {
        return Err(WebhookError::PayloadTooLarge(MAX_WEBHOOK_BODY_BYTES));
    }
    let header = signature_header.ok_or(WebhookError::MissingSignature)?;
    signature::verify(&state.config.stripe.webhook_secret, payload, header, now)?;

    let event: Event = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    if !event.is_checkout_completed() {
        tracing::debug!(event_id = %event.id, kind = %event.kind, "webhook event ignored");
        return Ok(WebhookOutcome::Ignored);
    }

    let session = event
        .checkout_session()
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    let user_id = session
        .client_reference_id
        .as_deref()
        .and_then(|reference| reference.trim().parse::<i32>().ok())
        .ok_or_else(|| WebhookError::InvalidPayload("missing client_reference_id".into()))?;
    if Users::find_by_id(user_id).one(&state.orm).await?.is_none() {
        return Err(WebhookError::InvalidPayload(format!("unknown user {user_id}")));
    }

    let outcome = fulfill_order(&state.orm, user_id, &session.id).await?;
    match &outcome {
        WebhookOutcome::Fulfilled { order_id, lines } => {
            tracing::info!(
                event_id = %event.id,
                session_id = %session.id,
                user_id,
                order_id,
                lines,
                "order fulfilled"
            );
            audit::record(
                &state.orm,
                Some(user_id),
                "order_fulfilled",
                "orders",
                serde_json::json!({ "order_id": order_id, "session_id": session.id }),
            )
            .await;
        }
        WebhookOutcome::Duplicate => {
            tracing::info!(event_id = %event.id, session_id = %session.id, "duplicate delivery");
        }
        WebhookOutcome::Ignored => {}
    }
    Ok(outcome)
}

/// Turn the user's cart into an order paid by `payment_reference`, all in one
/// transaction. Each cart row becomes one order line and exactly the rows read
/// are deleted. A second call with the same reference creates nothing.
pub async fn fulfill_order<C: TransactionTrait>(
    conn: &C,
    user_id: i32,
    payment_reference: &str,
) -> Result<WebhookOutcome, DbErr> {
    match fulfill_in_transaction(conn, user_id, payment_reference).await {
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // A concurrent delivery committed first.
            Ok(WebhookOutcome::Duplicate)
        }
        other => other,
    }
}

async fn fulfill_in_transaction<C: TransactionTrait>(
    conn: &C,
    user_id: i32,
    payment_reference: &str,
) -> Result<WebhookOutcome, DbErr> {
    let txn = conn.begin().await?;

    let existing = Orders::find()
        .filter(orders::Column::PaymentReference.eq(payment_reference))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Ok(WebhookOutcome::Duplicate);
    }

    let rows = repo::lock_cart_rows_for(&txn, user_id).await?;

    let now = Utc::now();
    let order = orders::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        status: Set(ORDER_STATUS_PROCESSING.to_string()),
        payment_reference: Set(payment_reference.to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for row in &rows {
        order_lines::ActiveModel {
            id: NotSet,
            order_id: Set(order.id),
            item_id: Set(row.item_id),
            quantity: Set(row.quantity),
        }
        .insert(&txn)
        .await?;
    }

    if !rows.is_empty() {
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        CartItems::delete_many()
            .filter(cart_items::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok(WebhookOutcome::Fulfilled {
        order_id: order.id,
        lines: rows.len(),
    })
}
