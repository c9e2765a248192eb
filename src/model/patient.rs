//! Patient report data model.
//!
//! [`DentalData`] is the normalized form held by the dental store.
//! [`ReportPayload`] mirrors what the reporting backend sends; it is
//! converted with [`DentalData::from_payload`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::tooth::{Mask, Tooth};
use crate::error::StoreError;

/// Personal details of a patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDetails {
    #[serde(deserialize_with = "lenient::string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date_of_birth: String,
    #[serde(deserialize_with = "lenient::count")]
    pub age: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub last_scan_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient::string")]
    pub blood_type: String,
    #[serde(deserialize_with = "lenient::seq")]
    pub allergies: Vec<String>,
    #[serde(deserialize_with = "lenient::seq")]
    pub medical_history: Vec<String>,
}

/// Patient identity and details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub patient_id: String,
    #[serde(deserialize_with = "lenient::object")]
    pub info: PatientDetails,
}

/// Upper and lower jaw segmentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JawData {
    #[serde(deserialize_with = "lenient::object")]
    pub upper_jaw: Mask,
    #[serde(deserialize_with = "lenient::object")]
    pub lower_jaw: Mask,
}

/// Caries counts by activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CariesDistribution {
    #[serde(deserialize_with = "lenient::count")]
    pub active: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub arrested: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub recurrent: u32,
}

/// Aggregate tooth statistics from the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    #[serde(deserialize_with = "lenient::count")]
    pub total_teeth: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub healthy: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub treated: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub pathology: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub missing: u32,
    #[serde(deserialize_with = "lenient::object")]
    pub caries_distribution: CariesDistribution,
    #[serde(deserialize_with = "lenient::string")]
    pub periodontal_status: String,
}

/// Scan image dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDimensions {
    #[serde(deserialize_with = "lenient::count")]
    pub width: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub height: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub resolution: String,
    #[serde(deserialize_with = "lenient::count")]
    pub dpi: u32,
}

/// Acquisition details of the X-ray scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub device: String,
    #[serde(deserialize_with = "lenient::object")]
    pub dimensions: ScanDimensions,
    #[serde(deserialize_with = "lenient::string")]
    pub scan_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub scan_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub radiation_dose: String,
}

/// A treatment plan; everything except the id is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlan {
    #[serde(default, deserialize_with = "lenient::string")]
    pub plan_id: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl TreatmentPlan {
    /// Create an empty plan with the given id.
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            details: Map::new(),
        }
    }
}

/// Clinic that produced the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub license: String,
    #[serde(deserialize_with = "lenient::string")]
    pub address: String,
}

/// Report generation metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportMetadata {
    #[serde(deserialize_with = "lenient::string")]
    pub generated_by: String,
    #[serde(deserialize_with = "lenient::string")]
    pub last_updated: String,
    #[serde(deserialize_with = "lenient::object")]
    pub clinic_info: ClinicInfo,
}

/// Complete patient dataset held by the dental store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DentalData {
    #[serde(deserialize_with = "lenient::object")]
    pub patient_info: PatientInfo,
    #[serde(deserialize_with = "lenient::object")]
    pub jaw_data: JawData,
    #[serde(deserialize_with = "lenient::seq")]
    pub teeth: Vec<Tooth>,
    #[serde(deserialize_with = "lenient::object")]
    pub statistics: Statistics,
    #[serde(deserialize_with = "lenient::object")]
    pub scan_info: ScanInfo,
    #[serde(deserialize_with = "lenient::seq")]
    pub problem_detection: Vec<Value>,
    #[serde(deserialize_with = "lenient::seq")]
    pub treatment_plan: Vec<TreatmentPlan>,
    #[serde(deserialize_with = "lenient::object")]
    pub metadata: ReportMetadata,
}

/// Report as delivered by the backend.
///
/// Every field tolerates `null` and loose types; a numeric `patientId`
/// is kept as its decimal text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportPayload {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub patient_id: Option<String>,
    #[serde(deserialize_with = "lenient::object")]
    pub info: PatientDetails,
    #[serde(rename = "JAw", deserialize_with = "lenient::object")]
    pub jaw: JawData,
    #[serde(deserialize_with = "lenient::seq")]
    pub teeth: Vec<Tooth>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub statistics: Option<Statistics>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub scan: Option<ScanInfo>,
    #[serde(rename = "problemDetective", deserialize_with = "lenient::seq")]
    pub problem_detective: Vec<Value>,
    #[serde(deserialize_with = "lenient::seq")]
    pub treatment_plan: Vec<TreatmentPlan>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub metadata: Option<ReportMetadata>,
}

impl ReportPayload {
    /// Parse a raw JSON report; anything but an object is an empty report.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_object() {
            serde_json::from_value(value)
        } else {
            Ok(Self::default())
        }
    }
}

impl DentalData {
    /// Convert a backend report into the store representation.
    ///
    /// Fails only when the patient id is missing or blank.
    pub fn from_payload(payload: ReportPayload) -> Result<Self, StoreError> {
        let patient_id = payload
            .patient_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(StoreError::MissingPatientId)?;

        Ok(Self {
            patient_info: PatientInfo {
                patient_id,
                info: payload.info,
            },
            jaw_data: payload.jaw,
            teeth: payload.teeth,
            statistics: payload.statistics.unwrap_or_default(),
            scan_info: payload.scan.unwrap_or_default(),
            problem_detection: payload.problem_detective,
            treatment_plan: payload.treatment_plan,
            metadata: payload.metadata.unwrap_or_default(),
        })
    }

    /// Parse a raw JSON report. A non-object report has no patient id.
    pub fn from_report_value(value: Value) -> Result<Self, StoreError> {
        Self::from_payload(ReportPayload::from_value(value)?)
    }

    /// Total number of problems over all teeth.
    pub fn problem_count(&self) -> usize {
        self.teeth.iter().map(|t| t.problems.len()).sum()
    }
}
