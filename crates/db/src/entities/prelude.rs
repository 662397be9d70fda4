//! Entity aliases.

pub use super::accounts::Entity as Accounts;
pub use super::balances::Entity as Balances;
pub use super::currencies::Entity as Currencies;
pub use super::notifications::Entity as Notifications;
pub use super::settings::Entity as Settings;
pub use super::slots::Entity as Slots;
pub use super::temp_slots::Entity as TempSlots;
pub use super::transactions::Entity as Transactions;
