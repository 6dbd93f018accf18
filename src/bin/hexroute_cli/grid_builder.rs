use hexroute::terrain_generation::{ElevationAlgorithm, SurveyGenerator, get_elevation_preset};
use hexroute::{HexRouteError, HexRouteResult};
use tracing::{info, warn};

/// Assembles a [`SurveyGenerator`] from a preset name and optional overrides
pub struct SurveyBuilder {
    terrain_type: String,
    seed: Option<u32>,
    amplitude: Option<f64>,
    frequency: Option<f64>,
    octaves: Option<u32>,
    base_elevation: Option<f64>,
}

impl SurveyBuilder {
    pub fn new(terrain_type: impl Into<String>) -> Self {
        Self {
            terrain_type: terrain_type.into(),
            seed: None,
            amplitude: None,
            frequency: None,
            octaves: None,
            base_elevation: None,
        }
    }

    pub fn seed(mut self, seed: Option<u32>) -> Self {
        self.seed = seed;
        self
    }

    pub fn amplitude(mut self, amplitude: Option<f64>) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn frequency(mut self, frequency: Option<f64>) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn octaves(mut self, octaves: Option<u32>) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn base_elevation(mut self, base_elevation: Option<f64>) -> Self {
        self.base_elevation = base_elevation;
        self
    }

    fn has_noise_overrides(&self) -> bool {
        self.amplitude.is_some() || self.frequency.is_some() || self.octaves.is_some()
    }

    pub fn build(self) -> HexRouteResult<SurveyGenerator> {
        let mut generator = match get_elevation_preset(&self.terrain_type, self.seed) {
            Some(mut preset) => {
                if self.has_noise_overrides() {
                    preset.algorithm = self.override_preset(preset.algorithm);
                }
                preset
            }
            None => SurveyGenerator::new(self.seed.unwrap_or_else(rand::random), self.custom()?),
        };

        if let Some(base) = self.base_elevation {
            generator = generator.with_base_elevation(base);
        }
        info!(
            "Survey '{}' with seed {} and {:?}",
            self.terrain_type, generator.seed, generator.algorithm
        );
        Ok(generator)
    }

    fn custom(&self) -> HexRouteResult<ElevationAlgorithm> {
        let amplitude = self.amplitude.unwrap_or(15.0);
        let frequency = self.frequency.unwrap_or(0.002);
        let octaves = self.octaves.unwrap_or(4);
        match self.terrain_type.as_str() {
            "perlin" => Ok(ElevationAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            }),
            "ridged" => Ok(ElevationAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            }),
            other => Err(HexRouteError::InvalidArgument {
                reason: format!(
                    "Unknown terrain type: '{other}'. Available presets: flat, hills, mountains, valleys. Custom algorithms: perlin, ridged"
                ),
            }),
        }
    }

    fn override_preset(&self, algorithm: ElevationAlgorithm) -> ElevationAlgorithm {
        match algorithm {
            ElevationAlgorithm::Flat { height } => {
                warn!("Noise parameters are ignored for the 'flat' terrain type");
                ElevationAlgorithm::Flat { height }
            }
            ElevationAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            } => ElevationAlgorithm::Perlin {
                amplitude: self.amplitude.unwrap_or(amplitude),
                frequency: self.frequency.unwrap_or(frequency),
                octaves: self.octaves.unwrap_or(octaves),
            },
            ElevationAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            } => ElevationAlgorithm::Ridged {
                amplitude: self.amplitude.unwrap_or(amplitude),
                frequency: self.frequency.unwrap_or(frequency),
                octaves: self.octaves.unwrap_or(octaves),
            },
        }
    }
}
