pub mod periodic_notification;
pub mod scheduled_notification;
pub mod subscriber;
pub mod template;

pub use periodic_notification::PeriodicNotificationRepository;
pub use scheduled_notification::ScheduledNotificationRepository;
pub use subscriber::SubscriberRepository;
pub use template::TemplateRepository;

use crate::error::AppError;

/// Generalizes the "generic CRUD base inherited via multiple ABCs" design
/// note (§9): rather than a class hierarchy, every entity repository funnels
/// its create/update through this one write-error classifier, grounded on
/// `original_source/src/repositories/sql/base.py`'s substring match on
/// "foreign key constraint" to raise a distinct not-found-shaped error.
pub fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        let message = db_err.message().to_lowercase();
        if message.contains("foreign key") {
            return AppError::ForeignKeyNotExists(
                "referenced record does not exist".to_string(),
            );
        }
        if message.contains("unique") || message.contains("constraint") {
            return AppError::Integrity(db_err.message().to_string());
        }
    }
    AppError::Database(err)
}
