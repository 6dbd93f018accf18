/// Land-cover class codes recorded in a cell's terrain histogram
pub const TERRAIN_FOREST: u16 = 1;
pub const TERRAIN_SHRUB: u16 = 2;
pub const TERRAIN_GRASS: u16 = 3;
pub const TERRAIN_FARM: u16 = 4;
pub const TERRAIN_BUILDING: u16 = 5;
pub const TERRAIN_DESERT: u16 = 6;
pub const TERRAIN_SNOW: u16 = 7;
pub const TERRAIN_WATER: u16 = 8;
pub const TERRAIN_WETLAND: u16 = 9;

/// Average H3 hexagon edge length in metres, indexed by resolution
pub const H3_EDGE_LENGTH_M: [f64; 16] = [
    1_107_710.0,
    418_680.0,
    158_240.0,
    59_810.0,
    22_610.0,
    8_540.0,
    3_230.0,
    1_220.0,
    461.35,
    174.38,
    65.91,
    24.91,
    9.42,
    3.56,
    1.35,
    0.51,
];

/// Registry name of the slope derivation pass
pub const SLOPE_PASS: &str = "slope";

/// Decimal places kept for the elevation coefficient of variation
pub const CV_DECIMALS: i32 = 4;

/// Multiplier applied to mean curvature before rounding
pub const CURVATURE_SCALE: f64 = 1000.0;

pub const CURVATURE_DECIMALS: i32 = 6;

/// Decimal places kept for the exposure bearing in degrees
pub const EXPOSURE_DECIMALS: i32 = 2;
