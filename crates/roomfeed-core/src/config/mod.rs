pub mod subscription;

pub use subscription::SubscriptionConfig;
