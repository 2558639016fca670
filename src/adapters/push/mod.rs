//! Push notification adapters.
//!
//! - `FcmNotifier` - Firebase Cloud Messaging HTTP v1
//! - `DisabledPushNotifier` - used when FCM is not configured
//! - `MockPushNotifier` - recording notifier for tests

mod disabled;
mod fcm_notifier;
mod mock;

pub use disabled::DisabledPushNotifier;
pub use fcm_notifier::{FcmConfig, FcmNotifier, FCM_BASE_URL};
pub use mock::MockPushNotifier;
