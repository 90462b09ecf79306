mod reference;
pub mod telegram;
pub mod vk;

pub use reference::{normalize_telegram_reference, normalize_vk_reference};
pub use telegram::TelegramFetcher;
pub use vk::VkFetcher;
