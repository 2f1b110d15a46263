//! Client-side logic for the ComplyFormAI bid-management service.
//!
//! The interesting piece is [`services::breakdown`], which validates and
//! normalizes a subcontractor's participation-category breakdown before it
//! is attached to a bid. [`services::participation`] wraps it in the
//! add-subcontractor form flow, and [`api::client`] talks to the REST API.

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use api::client::ComplyFormClient;
pub use api::error::ApiError;
pub use config::ClientConfig;
pub use services::breakdown::{
    BreakdownError, BreakdownSet, BreakdownSummary, Category, CategoryEntry, NormalizedBreakdown,
};
pub use services::participation::{
    FormError, ParticipationForm, ParticipationSubmitter, SubmitOutcome,
    submit_participation_form,
};
