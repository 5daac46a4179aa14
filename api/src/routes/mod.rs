pub mod intercepts;
