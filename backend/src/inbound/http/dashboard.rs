//! Summary cards and calendar heat-map handlers.
//!
//! ```text
//! GET  /api/v1/summary
//! GET  /api/v1/calendar?year=&month=
//! POST /api/v1/calendar/selection
//! ```

use actix_web::{get, post, web};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CurrencyCode, Dashboard, DayActivity, Indicator, Period, SummaryCard, format_amount,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::transactions::TransactionResponse;
use crate::inbound::http::validation::{FieldName, parse_date, require};

/// Totals of one period.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCardResponse {
    #[schema(value_type = String, example = "this_month")]
    pub period: Period,
    #[schema(example = "This Month")]
    pub label: String,
    #[schema(value_type = String, example = "42.50")]
    pub spent: Decimal,
    #[schema(value_type = String, example = "0")]
    pub received: Decimal,
    #[schema(value_type = String, example = "-42.50")]
    pub net: Decimal,
    pub count: usize,
    #[schema(example = "€42.50")]
    pub spent_display: String,
    #[schema(example = "€0.00")]
    pub received_display: String,
    #[schema(example = "-€42.50")]
    pub net_display: String,
    pub net_positive: bool,
}

impl From<SummaryCard> for SummaryCardResponse {
    fn from(value: SummaryCard) -> Self {
        Self {
            period: value.period,
            label: value.label.to_owned(),
            spent: value.spent,
            received: value.received,
            net: value.net,
            count: value.count,
            spent_display: value.spent_display,
            received_display: value.received_display,
            net_display: value.net_display,
            net_positive: value.net_positive,
        }
    }
}

/// Summary cards in the user's currency.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[schema(example = "EUR")]
    pub currency: String,
    #[schema(value_type = String, example = "2024-05-17")]
    pub today: NaiveDate,
    pub cards: Vec<SummaryCardResponse>,
}

/// One heat-map cell.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayResponse {
    #[schema(value_type = String, example = "2024-05-17")]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub net: Decimal,
    #[schema(example = "-€42.50")]
    pub net_display: String,
    pub count: usize,
    #[schema(value_type = String, example = "negative")]
    pub indicator: Indicator,
}

impl DayResponse {
    fn new(value: DayActivity, currency: &CurrencyCode) -> Self {
        Self {
            date: value.date,
            net: value.net,
            net_display: format_amount(value.net, currency),
            count: value.count,
            indicator: value.indicator,
        }
    }
}

/// Selected day and its transactions.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    #[schema(value_type = Option<String>, example = "2024-05-17")]
    pub selected_date: Option<NaiveDate>,
    pub transactions: Vec<TransactionResponse>,
}

impl SelectionResponse {
    fn current(dashboard: &Dashboard, currency: &CurrencyCode) -> Self {
        match dashboard.selected_day() {
            Some((date, transactions)) => Self {
                selected_date: Some(date),
                transactions: TransactionResponse::list(transactions, currency),
            },
            None => Self {
                selected_date: None,
                transactions: Vec::new(),
            },
        }
    }
}

/// A month of heat-map cells plus the current selection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    /// Days with activity, oldest first.
    pub days: Vec<DayResponse>,
    pub selection: SelectionResponse,
}

/// Month to render; defaults to the current one.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    /// 1 to 12.
    pub month: Option<u32>,
}

/// Day to toggle.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SelectDateRequest {
    #[schema(example = "2024-05-17")]
    pub date: Option<String>,
}

/// Today, this month and this year.
#[utoipa::path(
    get,
    path = "/api/v1/summary",
    responses(
        (status = 200, description = "Summary cards", body = SummaryResponse),
        (status = 401, description = "Not signed in", body = crate::domain::Error)
    ),
    tags = ["dashboard"],
    operation_id = "getSummary"
)]
#[get("/summary")]
pub async fn get_summary(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SummaryResponse>> {
    let active = state.dashboard(&session).await?;
    let ledger = active.dashboard.ledger();
    let currency = &active.profile.currency;
    Ok(web::Json(SummaryResponse {
        currency: currency.to_string(),
        today: ledger.today(),
        cards: ledger
            .summary_cards(currency)
            .into_iter()
            .map(SummaryCardResponse::from)
            .collect(),
    }))
}

/// Heat-map cells of a month.
#[utoipa::path(
    get,
    path = "/api/v1/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Calendar month", body = CalendarResponse),
        (status = 400, description = "Invalid month", body = crate::domain::Error),
        (status = 401, description = "Not signed in", body = crate::domain::Error)
    ),
    tags = ["dashboard"],
    operation_id = "getCalendar"
)]
#[get("/calendar")]
pub async fn get_calendar(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CalendarQuery>,
) -> ApiResult<web::Json<CalendarResponse>> {
    let active = state.dashboard(&session).await?;
    let dashboard = &active.dashboard;
    let currency = &active.profile.currency;
    let today = dashboard.ledger().today();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    let days = dashboard
        .month(year, month)?
        .into_iter()
        .map(|day| DayResponse::new(day, currency))
        .collect();
    Ok(web::Json(CalendarResponse {
        year,
        month,
        days,
        selection: SelectionResponse::current(dashboard, currency),
    }))
}

/// Toggle the selected day; selecting it again clears the selection.
#[utoipa::path(
    post,
    path = "/api/v1/calendar/selection",
    request_body = SelectDateRequest,
    responses(
        (status = 200, description = "Selection after the toggle", body = SelectionResponse),
        (status = 400, description = "Invalid date", body = crate::domain::Error)
    ),
    tags = ["dashboard"],
    operation_id = "toggleCalendarSelection"
)]
#[post("/calendar/selection")]
pub async fn toggle_selection(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SelectDateRequest>,
) -> ApiResult<web::Json<SelectionResponse>> {
    let field = FieldName::new("date");
    let date = parse_date(&require(payload.into_inner().date, field)?, field)?;
    let active = state.dashboard(&session).await?;
    active.dashboard.toggle_date(date);
    Ok(web::Json(SelectionResponse::current(
        &active.dashboard,
        &active.profile.currency,
    )))
}
