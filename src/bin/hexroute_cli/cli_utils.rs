use hexroute::map::AttributeKind;
use hexroute::spatial::{LatLon, Tessellation};
use hexroute::{HexRouteError, HexRouteResult};
use std::path::Path;
use tracing::warn;

/// Generic parser for delimited strings that return fixed-size arrays
pub fn parse_delimited<const N: usize>(
    input: &str,
    delimiter: char,
    type_name: &str,
) -> HexRouteResult<[f64; N]> {
    let parts: Vec<&str> = input.split(delimiter).map(str::trim).collect();
    if parts.len() != N {
        return Err(HexRouteError::InvalidArgument {
            reason: format!(
                "Invalid {type_name} format '{input}'. Expected {N} {delimiter}-separated values"
            ),
        });
    }

    let mut result = [0.0; N];
    for (slot, part) in result.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| HexRouteError::InvalidArgument {
            reason: format!("Invalid {type_name} value: '{part}'"),
        })?;
    }

    Ok(result)
}

/// Parse a position string "LAT,LON" (metres north/east for planar grids)
pub fn parse_latlon(input: &str) -> HexRouteResult<LatLon> {
    let [lat, lon] = parse_delimited::<2>(input, ',', "position")?;
    let position = LatLon::new(lat, lon);
    if !position.is_finite() {
        return Err(HexRouteError::InvalidCoordinate { lat, lon });
    }
    Ok(position)
}

/// Parse a tessellation name; `base_edge_m` only applies to the planar index
pub fn parse_tessellation(name: &str, base_edge_m: f64) -> HexRouteResult<Tessellation> {
    match name {
        "h3" => Ok(Tessellation::H3),
        "planar" => {
            if !(base_edge_m.is_finite() && base_edge_m > 0.0) {
                return Err(HexRouteError::InvalidArgument {
                    reason: format!("Planar base edge must be positive, got {base_edge_m}"),
                });
            }
            Ok(Tessellation::Planar { base_edge_m })
        }
        _ => Err(HexRouteError::InvalidArgument {
            reason: format!("Unknown tessellation '{name}'. Available: h3, planar"),
        }),
    }
}

/// Parse attribute kinds from a comma-separated list of snake_case names
pub fn parse_attribute_kinds(input: &str) -> HexRouteResult<Vec<AttributeKind>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            AttributeKind::from_name(name).ok_or_else(|| HexRouteError::InvalidArgument {
                reason: format!("Unknown attribute kind '{name}'"),
            })
        })
        .collect()
}

/// Clamp a fraction to [0, 1], warning when it was out of range
pub fn validate_fraction(value: f64, name: &str) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        warn!("{name} {value} is out of range [0.0, 1.0], clamping to valid range");
        value.clamp(0.0, 1.0)
    } else {
        value
    }
}

/// Reject output names that would escape the grids directory
pub fn validate_output_path(filename: &str) -> HexRouteResult<()> {
    if Path::new(filename).is_absolute() {
        return Err(HexRouteError::InvalidArgument {
            reason: format!(
                "Output path must be relative to the grids/ directory, got absolute path: {filename}"
            ),
        });
    }

    if filename.contains("..") {
        return Err(HexRouteError::InvalidArgument {
            reason: "Output path cannot contain '..'".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlon() {
        assert_eq!(
            parse_latlon("32.0603,118.7969").unwrap(),
            LatLon::new(32.0603, 118.7969)
        );
        assert_eq!(
            parse_latlon("-250.5, 1200").unwrap(),
            LatLon::new(-250.5, 1200.0)
        );

        assert!(parse_latlon("32.06").is_err());
        assert!(parse_latlon("north,east").is_err());
        assert!(matches!(
            parse_latlon("NaN,1.0"),
            Err(HexRouteError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_parse_tessellation() {
        assert_eq!(parse_tessellation("h3", 0.0).unwrap(), Tessellation::H3);
        assert_eq!(
            parse_tessellation("planar", 500.0).unwrap(),
            Tessellation::Planar { base_edge_m: 500.0 }
        );
        assert!(parse_tessellation("planar", -1.0).is_err());
        assert!(parse_tessellation("s2", 1.0).is_err());
    }

    #[test]
    fn test_parse_attribute_kinds() {
        assert_eq!(
            parse_attribute_kinds("water, building,shrub_wood").unwrap(),
            vec![
                AttributeKind::Water,
                AttributeKind::Building,
                AttributeKind::ShrubWood
            ]
        );
        assert_eq!(parse_attribute_kinds("").unwrap(), Vec::new());
        assert!(parse_attribute_kinds("water,lava").is_err());
    }

    #[test]
    fn test_validate_fraction() {
        assert_eq!(validate_fraction(0.5, "water"), 0.5);
        assert_eq!(validate_fraction(-0.1, "water"), 0.0);
        assert_eq!(validate_fraction(1.5, "water"), 1.0);
    }

    #[test]
    fn test_validate_output_path() {
        assert!(validate_output_path("survey.bin").is_ok());
        assert!(validate_output_path("nested/survey.bin").is_ok());
        assert!(validate_output_path("../survey.bin").is_err());
        assert!(validate_output_path("/tmp/survey.bin").is_err());
    }
}
