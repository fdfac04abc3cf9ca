//! Zone geometry constants.

/// Default zone height in cells
pub const ZONE_DEFAULT_ROWS: usize = 100;
/// Default zone width in cells
pub const ZONE_DEFAULT_COLS: usize = 100;
/// Square search radius around the source cell used by the router
pub const ROUTE_RADIUS: i32 = 10;
