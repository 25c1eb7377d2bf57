//! Domain model and use-cases.
//!
//! Everything here is transport agnostic. Collaborators are reached through
//! [`ports`]; inbound adapters only see [`Error`] and the view-model types.
//!
//! Public surface:
//! - [`SessionReconciler`]: folds popup, redirect and listener sign-in into
//!   one [`SessionSnapshot`].
//! - [`CategoryBook`] and [`Ledger`]: live per-user view-models.
//! - [`summarize`], [`month_activity`], [`DateSelection`]: aggregation.
//! - [`ClientSession`]: per-browser-client context tying them together.

pub mod ports;

mod auth;
mod calendar;
mod category;
mod category_book;
mod client_session;
mod currency;
mod dashboard;
pub mod error;
mod ledger;
mod money;
mod session;
mod summary;
mod trace_id;
mod transaction;
mod user;

pub use self::auth::{DeviceProfile, Principal, SMALL_SCREEN_MAX_WIDTH};
pub use self::calendar::{
    CalendarError, DateSelection, DayActivity, Indicator, day_activity, day_detail,
    month_activity,
};
pub use self::category::{
    Category, CategoryId, CategoryName, CategoryValidationError, DEFAULT_CATEGORIES,
    FALLBACK_GLYPH, NewCategory, glyph_or_default,
};
pub use self::category_book::CategoryBook;
pub use self::client_session::{ActiveDashboard, ClientSession};
pub use self::currency::{
    CurrencyCode, CurrencyCodeError, CurrencyOption, SUPPORTED_CURRENCIES, format_amount,
};
pub use self::dashboard::{Dashboard, DashboardStores, TransactionEntry};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::ledger::{Ledger, TransactionDraft};
pub use self::money::{Amount, AmountError};
pub use self::session::{
    FailureKind, LandingView, ListenerHandle, SessionError, SessionErrorCode, SessionReconciler,
    SessionSnapshot, SignInOutcome, SignInPhase,
};
pub use self::summary::{Period, Summary, SummaryCard, Totals, summarize};
pub use self::trace_id::TraceId;
pub use self::transaction::{
    CategorySnapshot, Direction, NewTransaction, Note, Transaction, TransactionId,
    TransactionValidationError,
};
pub use self::user::{DisplayName, UserId, UserProfile, UserValidationError};
