//! Repository implementations.

pub mod assignment;
pub mod invite;
pub mod patient;
pub mod program;
pub mod session;
pub mod task_template;
pub mod therapist_type;
pub mod user;

pub use assignment::AssignmentRepository;
pub use invite::{ClaimOutcome, InviteRepository};
pub use patient::PatientRepository;
pub use program::ProgramRepository;
pub use session::SessionRepository;
pub use task_template::TaskTemplateRepository;
pub use therapist_type::TherapistTypeRepository;
pub use user::UserRepository;
