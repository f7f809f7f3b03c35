//! SeaORM entities for the `events`, `addresses` and `coupons` tables

pub mod address;
pub mod coupon;
pub mod event;
