use crate::errors::{HexRouteError, HexRouteResult};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Every kind of attribute a cell may carry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    #[display("water")]
    Water,
    #[display("vegetation")]
    Vegetation,
    #[display("soil")]
    Soil,
    #[display("building")]
    Building,
    #[display("forest")]
    Forest,
    #[display("grass")]
    Grass,
    #[display("shrub_wood")]
    ShrubWood,
    #[display("plowland")]
    Plowland,
    #[display("wasteland")]
    Wasteland,
    #[display("curvature")]
    Curvature,
    #[display("relief")]
    Relief,
    #[display("roughness")]
    Roughness,
    #[display("elevation_coefficient_of_variation")]
    ElevationCoefficientOfVariation,
    #[display("exposure")]
    Exposure,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 14] = [
        AttributeKind::Water,
        AttributeKind::Vegetation,
        AttributeKind::Soil,
        AttributeKind::Building,
        AttributeKind::Forest,
        AttributeKind::Grass,
        AttributeKind::ShrubWood,
        AttributeKind::Plowland,
        AttributeKind::Wasteland,
        AttributeKind::Curvature,
        AttributeKind::Relief,
        AttributeKind::Roughness,
        AttributeKind::ElevationCoefficientOfVariation,
        AttributeKind::Exposure,
    ];

    /// Name used in the grid's derived-attribute registry
    pub fn name(self) -> String {
        self.to_string()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.to_string() == name)
    }
}

/// Payload of an attribute
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    /// Present but not computable, e.g. a coefficient of variation over a zero mean
    #[default]
    Unknown,
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Typed detail attached to one owning attribute kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubAttribute {
    WaterDepth(f64),
    WaterBottomGeology(String),
    FlowSpeed(f64),
    WaterWidth(f64),
    BankSteepness(f64),
    VegetationType(String),
    VegetationDensity(f64),
    AverageVegetationHeight(f64),
    AveragePlantDiameter(f64),
    CanopyClosure(f64),
    SoilType(String),
    SoilHardness(f64),
    SoilBearingCapacity(f64),
    SurfaceSoilThickness(f64),
    BuildingType(String),
    BuildingHardness(f64),
    BuildingDestructibility(f64),
}

/// Payload-free tag of a [`SubAttribute`], used for lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SubAttributeKind {
    WaterDepth,
    WaterBottomGeology,
    FlowSpeed,
    WaterWidth,
    BankSteepness,
    VegetationType,
    VegetationDensity,
    AverageVegetationHeight,
    AveragePlantDiameter,
    CanopyClosure,
    SoilType,
    SoilHardness,
    SoilBearingCapacity,
    SurfaceSoilThickness,
    BuildingType,
    BuildingHardness,
    BuildingDestructibility,
}

impl SubAttribute {
    pub fn kind(&self) -> SubAttributeKind {
        use SubAttributeKind as K;
        match self {
            SubAttribute::WaterDepth(_) => K::WaterDepth,
            SubAttribute::WaterBottomGeology(_) => K::WaterBottomGeology,
            SubAttribute::FlowSpeed(_) => K::FlowSpeed,
            SubAttribute::WaterWidth(_) => K::WaterWidth,
            SubAttribute::BankSteepness(_) => K::BankSteepness,
            SubAttribute::VegetationType(_) => K::VegetationType,
            SubAttribute::VegetationDensity(_) => K::VegetationDensity,
            SubAttribute::AverageVegetationHeight(_) => K::AverageVegetationHeight,
            SubAttribute::AveragePlantDiameter(_) => K::AveragePlantDiameter,
            SubAttribute::CanopyClosure(_) => K::CanopyClosure,
            SubAttribute::SoilType(_) => K::SoilType,
            SubAttribute::SoilHardness(_) => K::SoilHardness,
            SubAttribute::SoilBearingCapacity(_) => K::SoilBearingCapacity,
            SubAttribute::SurfaceSoilThickness(_) => K::SurfaceSoilThickness,
            SubAttribute::BuildingType(_) => K::BuildingType,
            SubAttribute::BuildingHardness(_) => K::BuildingHardness,
            SubAttribute::BuildingDestructibility(_) => K::BuildingDestructibility,
        }
    }

    /// Attribute kind this detail belongs to
    pub fn owner(&self) -> AttributeKind {
        use SubAttributeKind as K;
        match self.kind() {
            K::WaterDepth | K::WaterBottomGeology | K::FlowSpeed | K::WaterWidth | K::BankSteepness => {
                AttributeKind::Water
            }
            K::VegetationType
            | K::VegetationDensity
            | K::AverageVegetationHeight
            | K::AveragePlantDiameter
            | K::CanopyClosure => AttributeKind::Vegetation,
            K::SoilType | K::SoilHardness | K::SoilBearingCapacity | K::SurfaceSoilThickness => {
                AttributeKind::Soil
            }
            K::BuildingType | K::BuildingHardness | K::BuildingDestructibility => {
                AttributeKind::Building
            }
        }
    }
}

/// A kind-tagged value with its ordered sub-attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub value: AttributeValue,
    sub_attributes: Vec<SubAttribute>,
}

impl Attribute {
    pub fn new(kind: AttributeKind, value: AttributeValue) -> Self {
        Self {
            kind,
            value,
            sub_attributes: Vec::new(),
        }
    }

    pub fn number(kind: AttributeKind, value: f64) -> Self {
        Self::new(kind, AttributeValue::Number(value))
    }

    /// Land-cover style attribute that only records presence
    pub fn marker(kind: AttributeKind) -> Self {
        Self::new(kind, AttributeValue::Unknown)
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Append a sub-attribute; it must belong to this attribute's kind
    pub fn add_sub_attribute(&mut self, sub: SubAttribute) -> HexRouteResult<()> {
        if sub.owner() != self.kind {
            return Err(HexRouteError::SubAttributeMismatch {
                attribute: self.kind.to_string(),
                sub: sub.kind().to_string(),
            });
        }
        self.sub_attributes.push(sub);
        Ok(())
    }

    pub fn with_sub_attribute(mut self, sub: SubAttribute) -> HexRouteResult<Self> {
        self.add_sub_attribute(sub)?;
        Ok(self)
    }

    /// First sub-attribute of `kind`
    pub fn sub_attribute(&self, kind: SubAttributeKind) -> Option<&SubAttribute> {
        self.sub_attributes.iter().find(|sub| sub.kind() == kind)
    }

    pub fn sub_attributes(&self) -> &[SubAttribute] {
        &self.sub_attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_attribute_first_match() {
        let water = Attribute::marker(AttributeKind::Water)
            .with_sub_attribute(SubAttribute::WaterDepth(1.5))
            .unwrap()
            .with_sub_attribute(SubAttribute::WaterDepth(3.0))
            .unwrap()
            .with_sub_attribute(SubAttribute::FlowSpeed(0.2))
            .unwrap();

        assert_eq!(
            water.sub_attribute(SubAttributeKind::WaterDepth),
            Some(&SubAttribute::WaterDepth(1.5))
        );
        assert_eq!(water.sub_attribute(SubAttributeKind::BankSteepness), None);
        assert_eq!(water.sub_attributes().len(), 3);
    }

    #[test]
    fn test_mismatched_sub_attribute_is_rejected() {
        let mut soil = Attribute::marker(AttributeKind::Soil);
        let result = soil.add_sub_attribute(SubAttribute::BuildingHardness(4.0));

        assert!(matches!(
            result,
            Err(HexRouteError::SubAttributeMismatch { .. })
        ));
        assert!(soil.sub_attributes().is_empty());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AttributeKind::ALL {
            assert_eq!(AttributeKind::from_name(&kind.name()), Some(kind));
        }
        assert_eq!(AttributeKind::from_name("lava"), None);
    }

    #[test]
    fn test_value_accessors() {
        let relief = Attribute::number(AttributeKind::Relief, 12.0);
        assert_eq!(relief.value().as_number(), Some(12.0));
        assert_eq!(AttributeValue::Text("sand".into()).as_number(), None);
        assert_eq!(AttributeValue::default(), AttributeValue::Unknown);
    }
}
