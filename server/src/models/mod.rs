pub mod dashboard;
pub mod event;
pub mod feedback;
pub mod registration;
pub mod user;

pub use dashboard::DashboardStats;
pub use event::{Event, EventQuery, NewEvent};
pub use feedback::{Feedback, FeedbackRequest};
pub use registration::{
    Registration, RegistrationStatus, RegistrationWithEvent, RegistrationWithUser,
};
pub use user::{NewUser, PublicUser, Role, User};
