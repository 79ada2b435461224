pub mod audit_event;
pub mod lead;
pub mod password_reset_token;
pub mod payment;
pub mod project;
pub mod project_version;
pub mod refresh_token;
pub mod theme;
pub mod user;

pub use audit_event::AuditEvent;
pub use lead::Lead;
pub use password_reset_token::PasswordResetToken;
pub use payment::Payment;
pub use project::Project;
pub use project_version::ProjectVersion;
pub use refresh_token::RefreshToken;
pub use theme::Theme;
pub use user::User;
