//! Pulling diagnostics and field locations out of nested failure structures

pub mod location;
pub mod serde_msg;
pub mod trail;

pub use location::{FieldPath, PathSegment};
pub use trail::{DEFAULT_TRAIL_LIMIT, cause_lines, core_cause_lines};

/// Last path segment of a Rust type name, generics dropped:
/// `std::io::error::Error` -> `Error`, `my::Wrapper<u8>` -> `Wrapper`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_owned()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::short_type_name;

    #[test]
    fn strips_module_path_and_generics() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("app::errors::Wrapper<alloc::string::String>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
