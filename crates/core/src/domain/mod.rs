pub mod change;
pub mod dates;
pub mod draft;
pub mod line_item;
pub mod opportunity;
pub mod request;
