//! Brand handlers.
//!
//! - `GET /api/v1/brands`                   brand list with means and post counts
//! - `GET /api/v1/brands/{brand}`           drill-down against the market
//! - `GET /api/v1/brands/{brand}/similar`   nearest brands in embedding space

mod detail;
mod list;
mod similar;

pub(super) use detail::get_brand;
pub(super) use list::list_brands;
pub(super) use similar::list_similar;
