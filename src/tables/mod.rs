// Reference Tables - read-only keyed inputs to the resolution core
//
// Each table:
// - parses a header-normalized RawTable into typed rows
// - normalizes its codes to fixed width (see ids.rs)
// - exposes the key the join engine or classifier matches on

pub mod allocation;
pub mod area;
pub mod cbsa;
pub mod central;
pub mod crosswalk;
pub mod principal;
pub mod region;

pub use allocation::PlaceAllocationRow;
pub use area::AreaDistanceRow;
pub use cbsa::CbsaDelineationRow;
pub use central::CentralCityRow;
pub use crosswalk::TractCrosswalkRow;
pub use principal::PrincipalCityRow;
pub use region::RegionRow;

/// Trim a cell and turn blanks into None
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalized code or None when it does not normalize
pub(crate) fn code_opt(value: &str, width: usize) -> Option<String> {
    Some(crate::ids::normalize_code(value, width)).filter(|c| !c.is_empty())
}
