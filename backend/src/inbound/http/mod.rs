//! HTTP inbound adapter exposing the JSON API under `/api/v1`.

use actix_web::web;

pub mod categories;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod session;
pub mod session_config;
pub mod sessions;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod transactions;
mod validation;

pub use error::ApiResult;

/// Register every API handler; mount inside a scope carrying the session
/// middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sessions::get_session)
        .service(sessions::bootstrap_session)
        .service(sessions::sign_in)
        .service(sessions::complete_profile)
        .service(sessions::retry_profile_load)
        .service(sessions::sign_out)
        .service(sessions::clear_error)
        .service(sessions::list_currencies)
        .service(categories::list_categories)
        .service(categories::create_category)
        .service(transactions::list_transactions)
        .service(transactions::create_transaction)
        .service(transactions::delete_transaction)
        .service(dashboard::get_summary)
        .service(dashboard::get_calendar)
        .service(dashboard::toggle_selection);
}
