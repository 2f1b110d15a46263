use crate::api::error::ApiError;
use crate::models::{BidSubcontractor, BidSubcontractorCreateRequest};
use crate::services::breakdown::{BreakdownError, BreakdownSet};
use crate::utils::validation::{parse_amount, validate_subcontract_value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

/// Field order used when reporting field-level failures.
const FIELD_ORDER: [&str; 3] = ["subcontractor_id", "work_description", "subcontract_value"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error(transparent)]
    Breakdown(#[from] BreakdownError),

    #[error("{0}")]
    Field(String),

    /// Rejection reported by the bid-management service, passed through verbatim.
    #[error("{0}")]
    Server(String),

    #[error("Could not reach the bid-management service: {0}")]
    Transport(String),
}

impl FormError {
    /// True for failures detected before any request was made.
    pub fn is_local(&self) -> bool {
        matches!(self, FormError::Breakdown(_) | FormError::Field(_))
    }
}

impl From<ApiError> for FormError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server { message, .. } => FormError::Server(message),
            other => FormError::Transport(other.to_string()),
        }
    }
}

/// Capability to attach a subcontractor to a bid.
#[async_trait]
pub trait ParticipationSubmitter: Send + Sync {
    async fn submit_participation(
        &self,
        bid_id: &str,
        request: &BidSubcontractorCreateRequest,
    ) -> Result<BidSubcontractor, ApiError>;
}

/// Inputs of the add-subcontractor form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ParticipationForm {
    #[validate(length(min = 1, message = "Subcontractor is required"))]
    pub subcontractor_id: String,

    #[validate(length(min = 1, message = "Work description is required"))]
    pub work_description: String,

    #[serde(default)]
    pub naics_code: String,

    #[validate(custom(function = "validate_subcontract_value"))]
    pub subcontract_value: String,

    #[serde(default)]
    pub breakdown: BreakdownSet,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub created: BidSubcontractor,
    /// Blank form to present after a successful submission.
    pub form: ParticipationForm,
}

impl ParticipationForm {
    pub fn new(
        subcontractor_id: impl Into<String>,
        work_description: impl Into<String>,
        naics_code: impl Into<String>,
        subcontract_value: impl Into<String>,
    ) -> Self {
        Self {
            subcontractor_id: subcontractor_id.into(),
            work_description: work_description.into(),
            naics_code: naics_code.into(),
            subcontract_value: subcontract_value.into(),
            breakdown: BreakdownSet::new(),
        }
    }

    pub fn add_breakdown_entry(
        &self,
        category: &str,
        percentage_text: &str,
    ) -> Result<Self, FormError> {
        let breakdown = self.breakdown.add_entry(category, percentage_text)?;
        Ok(Self {
            breakdown,
            ..self.clone()
        })
    }

    pub fn remove_breakdown_entry(&self, index: usize) -> Self {
        Self {
            breakdown: self.breakdown.remove_entry(index),
            ..self.clone()
        }
    }

    /// Validates the form and produces the outbound payload.
    ///
    /// Breakdown checks run first (NAICS, then the 100% cap), followed by
    /// the remaining field checks.
    pub fn build_request(&self) -> Result<BidSubcontractorCreateRequest, FormError> {
        self.breakdown.validate_for_submit(&self.naics_code)?;
        self.validate()
            .map_err(|e| FormError::Field(first_field_message(&e)))?;

        let subcontract_value = parse_amount(&self.subcontract_value).ok_or_else(|| {
            FormError::Field("Subcontract value must be a non-negative number".to_string())
        })?;

        Ok(BidSubcontractorCreateRequest {
            subcontractor_id: self.subcontractor_id.clone(),
            work_description: self.work_description.clone(),
            naics_code: self.naics_code.clone(),
            subcontract_value,
            counts_toward_mbe: self.breakdown.counts_toward_mbe(),
            category_breakdown: self.breakdown.normalize(),
        })
    }
}

fn first_field_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    FIELD_ORDER
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Validates, normalizes and submits the form.
///
/// Local failures return before the submitter is called. On success the
/// outcome carries a fresh form with an empty breakdown.
pub async fn submit_participation_form<S>(
    submitter: &S,
    bid_id: &str,
    form: &ParticipationForm,
) -> Result<SubmitOutcome, FormError>
where
    S: ParticipationSubmitter + ?Sized,
{
    let request = form.build_request()?;

    match submitter.submit_participation(bid_id, &request).await {
        Ok(created) => {
            info!(
                "Attached subcontractor {} to bid {} (counts toward MBE: {})",
                created.subcontractor_id, bid_id, created.counts_toward_mbe
            );
            Ok(SubmitOutcome {
                created,
                form: ParticipationForm::default(),
            })
        }
        Err(e) => {
            warn!("Bid {} rejected participation: {}", bid_id, e);
            Err(e.into())
        }
    }
}
