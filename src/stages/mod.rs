pub mod annotator;
pub mod cleanup;
pub mod merger;
pub mod midnight;
pub mod numeric;
pub mod reducer;
pub mod resolver;
