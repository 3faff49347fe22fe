//! Learner Home Module
//!
//! Aggregates everything the learner dashboard page shows into a single
//! response: enrollments with mode and certificate info, entitlements and
//! their sessions, email settings, access checks and resume links.

pub mod api;
pub mod error;
pub mod state;
pub mod types;

pub use types::{
    CertificateRecord, CourseMode, CourseOverview, Enrollment, EnterpriseCustomer, Entitlement,
    LearnerDashboard, RecordEnrollmentRequest,
};
