//! Database entities managed by the demo service.
//!
//! `demo`, `erp_user` and `erp_user_role` are created at runtime; the rest
//! is reference data loaded from the seed files.

pub mod demo;
pub mod distribution_center;
pub mod erp_user;
pub mod erp_user_role;
pub mod inventory;
pub mod line_item;
pub mod product;
pub mod retailer;
pub mod shipment;
pub mod supplier;
