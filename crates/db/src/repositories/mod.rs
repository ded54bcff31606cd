//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument. Writes take the core
//! entities after their guards have run.

pub mod brief_repo;
pub mod brief_response_repo;
pub mod draft_service_repo;
pub mod framework_agreement_repo;
pub mod framework_repo;
pub mod service_repo;
pub mod supplier_framework_repo;
pub mod supplier_repo;
pub mod user_repo;

pub use brief_repo::BriefRepo;
pub use brief_response_repo::BriefResponseRepo;
pub use draft_service_repo::DraftServiceRepo;
pub use framework_agreement_repo::FrameworkAgreementRepo;
pub use framework_repo::FrameworkRepo;
pub use service_repo::ServiceRepo;
pub use supplier_framework_repo::SupplierFrameworkRepo;
pub use supplier_repo::SupplierRepo;
pub use user_repo::UserRepo;
