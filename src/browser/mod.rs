pub mod connection;

pub use connection::{bring_to_front, connect_to_browser, find_page_by_url};
