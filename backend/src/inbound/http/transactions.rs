//! Transaction handlers.
//!
//! ```text
//! GET    /api/v1/transactions[?date=YYYY-MM-DD]
//! POST   /api/v1/transactions
//! DELETE /api/v1/transactions/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CurrencyCode, Direction, Transaction, TransactionDraft, TransactionEntry, TransactionId,
    format_amount,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_amount, parse_direction, parse_note, parse_optional_date, parse_uuid,
    require,
};

/// Category name and glyph as recorded on the transaction.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategorySnapshotResponse {
    #[schema(example = "Food")]
    pub name: String,
    #[schema(example = "🍔")]
    pub glyph: String,
}

/// A recorded transaction.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    /// Decimal string.
    #[schema(example = "42.5")]
    pub amount: String,
    /// Amount in the user's currency.
    #[schema(example = "€42.50")]
    pub amount_display: String,
    #[schema(value_type = String, example = "spent")]
    pub direction: Direction,
    pub note: String,
    #[schema(value_type = String, example = "2024-05-17")]
    pub date: chrono::NaiveDate,
    pub category: CategorySnapshotResponse,
}

impl TransactionResponse {
    pub(crate) fn new(value: Transaction, currency: &CurrencyCode) -> Self {
        Self {
            id: value.id.to_string(),
            amount: value.amount.to_string(),
            amount_display: format_amount(value.amount.value(), currency),
            direction: value.direction,
            note: value.note.as_ref().to_owned(),
            date: value.date,
            category: CategorySnapshotResponse {
                name: value.category.name,
                glyph: value.category.glyph,
            },
        }
    }

    pub(crate) fn list(values: Vec<Transaction>, currency: &CurrencyCode) -> Vec<Self> {
        values
            .into_iter()
            .map(|value| Self::new(value, currency))
            .collect()
    }
}

/// New transaction form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[schema(example = "42.50")]
    pub amount: Option<String>,
    #[schema(example = "spent")]
    pub direction: Option<String>,
    #[schema(example = "Lunch")]
    pub note: Option<String>,
    /// Category name, matched ignoring case.
    #[schema(example = "Food")]
    pub category: Option<String>,
    /// Defaults to today.
    #[schema(example = "2024-05-17")]
    pub date: Option<String>,
}

/// Optional day filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionFilter {
    /// Only transactions dated this day (`YYYY-MM-DD`).
    pub date: Option<String>,
}

fn parse_entry(
    payload: CreateTransactionRequest,
    today: chrono::NaiveDate,
) -> Result<TransactionEntry, crate::domain::Error> {
    let amount = FieldName::new("amount");
    let direction = FieldName::new("direction");
    let note = FieldName::new("note");
    let category = FieldName::new("category");
    let date = FieldName::new("date");

    Ok(TransactionEntry {
        draft: TransactionDraft {
            amount: parse_amount(&require(payload.amount, amount)?, amount)?,
            direction: parse_direction(&require(payload.direction, direction)?, direction)?,
            note: parse_note(&require(payload.note, note)?, note)?,
            date: parse_optional_date(payload.date.as_deref(), date)?.unwrap_or(today),
        },
        category: require(payload.category, category)?,
    })
}

/// List transactions, newest date first.
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(TransactionFilter),
    responses(
        (status = 200, description = "Transactions", body = [TransactionResponse]),
        (status = 400, description = "Invalid date", body = crate::domain::Error),
        (status = 401, description = "Not signed in", body = crate::domain::Error)
    ),
    tags = ["transactions"],
    operation_id = "listTransactions"
)]
#[get("/transactions")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
    filter: web::Query<TransactionFilter>,
) -> ApiResult<web::Json<Vec<TransactionResponse>>> {
    let day = parse_optional_date(filter.date.as_deref(), FieldName::new("date"))?;
    let active = state.dashboard(&session).await?;
    let ledger = active.dashboard.ledger();
    let transactions = match day {
        Some(day) => ledger.transactions_on(day),
        None => ledger.transactions(),
    };
    Ok(web::Json(TransactionResponse::list(
        transactions,
        &active.profile.currency,
    )))
}

/// Record a transaction.
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Recorded", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (status = 503, description = "Store unavailable", body = crate::domain::Error)
    ),
    tags = ["transactions"],
    operation_id = "createTransaction"
)]
#[post("/transactions")]
pub async fn create_transaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateTransactionRequest>,
) -> ApiResult<HttpResponse> {
    let active = state.dashboard(&session).await?;
    let entry = parse_entry(payload.into_inner(), active.dashboard.ledger().today())?;
    let transaction = active.dashboard.record(entry).await?;
    Ok(HttpResponse::Created().json(TransactionResponse::new(
        transaction,
        &active.profile.currency,
    )))
}

/// Permanently delete a transaction.
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{id}",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = crate::domain::Error),
        (status = 404, description = "No such transaction", body = crate::domain::Error)
    ),
    tags = ["transactions"],
    operation_id = "deleteTransaction"
)]
#[delete("/transactions/{id}")]
pub async fn delete_transaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = TransactionId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("id"))?);
    let active = state.dashboard(&session).await?;
    active.dashboard.ledger().delete_transaction(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "transactions_tests.rs"]
mod tests;
