pub mod models;
pub mod repository;

pub use models::{
    CreatePeriodicNotification, CreateScheduledNotification, CreateTemplate,
    PeriodicNotification, ScheduledNotification, Subscriber, Template, UpdatePeriodicNotification,
    UpdateScheduledNotification, UpdateTemplate,
};
pub use repository::{
    PeriodicNotificationRepository, ScheduledNotificationRepository, SubscriberRepository,
    TemplateRepository,
};
