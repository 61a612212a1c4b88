pub mod repo_types;
pub mod services;
pub mod standing;

pub use repo_types::{Clinic, DoctorProfile, Gender, PatientProfile, Role, Session, User};
pub use services::{load_account, AccountView};
pub use standing::Standing;
