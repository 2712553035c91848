pub mod analyst;
pub mod browser;
pub mod export;
pub mod extractor;
pub mod providers;
pub mod report;
pub mod scan;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
