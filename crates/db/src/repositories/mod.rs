//! One repository per table, each a unit struct with static async methods
//! taking a `&PgPool`.

mod instance_repo;
mod plan_share_repo;
mod resource_repo;
mod review_repo;
mod sent_reminder_repo;
mod study_plan_repo;
mod user_progress_repo;
mod user_repo;

pub use instance_repo::InstanceRepo;
pub use plan_share_repo::PlanShareRepo;
pub use resource_repo::ResourceRepo;
pub use review_repo::ReviewRepo;
pub use sent_reminder_repo::SentReminderRepo;
pub use study_plan_repo::StudyPlanRepo;
pub use user_progress_repo::UserProgressRepo;
pub use user_repo::UserRepo;
