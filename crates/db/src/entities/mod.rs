//! `SeaORM` entities.

pub mod prelude;

pub mod accounts;
pub mod balances;
pub mod currencies;
pub mod notifications;
pub mod sea_orm_active_enums;
pub mod settings;
pub mod slots;
pub mod temp_slots;
pub mod transactions;
