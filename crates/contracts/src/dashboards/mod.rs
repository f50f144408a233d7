pub mod d410_sales;
pub mod d411_products;
pub mod d412_regions;
pub mod d413_finance;
pub mod d414_transactions;
