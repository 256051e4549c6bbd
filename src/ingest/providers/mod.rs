pub mod page;

pub use page::PageSource;
