pub mod activity_traits;
pub mod notification_traits;
pub mod registry_traits;

pub use activity_traits::ActivitySource;
pub use notification_traits::NotificationSink;
pub use registry_traits::RegistryStore;
