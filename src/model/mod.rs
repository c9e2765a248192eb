//! Data models for patient reports.

mod lenient;
mod patient;
mod tooth;

pub use patient::{
    CariesDistribution, ClinicInfo, DentalData, JawData, PatientDetails, PatientInfo,
    ReportMetadata, ReportPayload, ScanDimensions, ScanInfo, Statistics, TreatmentPlan,
};
pub use tooth::{Mask, Position, Problem, Tooth, tooth_name};
