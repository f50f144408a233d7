pub mod a010_ozon_fbs_posting;
pub mod a014_ozon_transactions;
pub mod a025_product_cost;
