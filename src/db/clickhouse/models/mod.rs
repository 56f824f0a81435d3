pub mod price_point;
