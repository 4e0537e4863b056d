pub mod menu_reader;
pub mod promotion_reader;
