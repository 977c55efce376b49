mod broadcast;
mod reminder_scheduler;

pub use broadcast::IntervalBroadcaster;
pub use reminder_scheduler::ReminderScheduler;
