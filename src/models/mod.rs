use crate::services::breakdown::NormalizedBreakdown;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub id: String,
    pub cert_number: Option<String>,
    pub cert_type: Option<String>,
    pub naics_codes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcontractor {
    pub id: String,
    pub organization_id: String,
    pub legal_name: String,
    pub certification_number: Option<String>,
    pub is_mbe: bool,
    #[serde(default)]
    pub certifications: Option<Vec<Certification>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubcontractor {
    pub id: String,
    pub bid_id: String,
    pub subcontractor_id: String,
    pub work_description: String,
    pub naics_code: String,
    pub subcontract_value: f64,
    pub counts_toward_mbe: bool,
    #[serde(default)]
    pub subcontractor: Option<Subcontractor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub organization_id: String,
    pub solicitation_number: String,
    pub total_amount: f64,
    pub mbe_goal: f64,
    #[serde(default)]
    pub bid_subcontractors: Option<Vec<BidSubcontractor>>,
}

impl Bid {
    /// Sum of subcontract values attached to this bid.
    pub fn subcontracted_amount(&self) -> f64 {
        self.bid_subcontractors
            .iter()
            .flatten()
            .map(|s| s.subcontract_value)
            .sum()
    }
}

/// Status of a compliance rule or of a whole validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Fail,
    Warning,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Other,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationStatus::Pass => "PASS",
            ValidationStatus::Fail => "FAIL",
            ValidationStatus::Warning => "WARNING",
            ValidationStatus::Other => "OTHER",
        })
    }
}

/// Outcome of a single server-side compliance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub id: String,
    pub bid_id: String,
    pub rule_name: String,
    pub status: ValidationStatus,
    #[serde(default)]
    pub error_message: String,
    pub created_at: String,
}

impl ValidationResult {
    pub fn is_failure(&self) -> bool {
        self.status == ValidationStatus::Fail
    }

    pub fn is_warning(&self) -> bool {
        self.status == ValidationStatus::Warning
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub bid_id: String,
    pub overall_status: ValidationStatus,
    pub total_validations: u32,
    pub passed: u32,
    pub failed: u32,
    pub warnings: u32,
    #[serde(default)]
    pub validations: Vec<ValidationResult>,
}

impl ValidationResponse {
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validations.iter().filter(|v| v.is_failure())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryCertifications {
    #[serde(default)]
    pub mbe: bool,
    #[serde(default)]
    pub vsbe: bool,
    #[serde(default)]
    pub dbe: bool,
}

/// Entry of the shared subcontractor directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcontractorDirectory {
    pub id: String,
    pub legal_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub certifications: Option<DirectoryCertifications>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub projects_completed: Option<u32>,
    #[serde(default)]
    pub naics_codes: Option<Vec<String>>,
    #[serde(default)]
    pub jurisdiction_codes: Option<Vec<String>>,
    #[serde(default)]
    pub capabilities: Option<String>,
}

impl SubcontractorDirectory {
    pub fn is_mbe(&self) -> bool {
        self.certifications.as_ref().is_some_and(|c| c.mbe)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidCreateRequest {
    pub organization_id: String,
    pub solicitation_number: String,
    pub total_amount: f64,
    pub mbe_goal: f64,
}

/// Body of `POST /bids/{id}/subcontractors`.
///
/// `category_breakdown` is sent as `null` when no breakdown was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubcontractorCreateRequest {
    pub subcontractor_id: String,
    pub work_description: String,
    pub naics_code: String,
    pub subcontract_value: f64,
    pub counts_toward_mbe: bool,
    pub category_breakdown: Option<NormalizedBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationCreateRequest {
    pub name: String,
}
