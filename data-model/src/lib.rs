pub mod filter_spec;
pub mod projection;
pub mod record;
