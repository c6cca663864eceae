//! Feature channels derived from backplanes.

/// Name, unit and scale of a measured quantity after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureChannel {
    pub name: String,
    pub unit: Option<String>,
    /// Factor applied to raw samples.
    pub scale: f32,
}

impl FeatureChannel {
    /// Normalize a raw backplane name and unit.
    ///
    /// Mapmaker products report some quantities in kilometers or radians;
    /// those are converted to meters and degrees and given their display
    /// names. Anything else is passed through trimmed.
    pub fn normalized(raw_name: &str, raw_unit: Option<&str>) -> Self {
        let name = raw_name.trim();
        let unit = raw_unit.map(str::trim).filter(|u| !u.is_empty());

        match (name, unit) {
            ("Elevation Relative to Gravity", Some("kilometers")) => {
                Self::new("Geopotential Height", Some("m"), 1000.0)
            }
            ("Elevation Relative to Normal Plane", Some("kilometers")) => {
                Self::new("Height Relative to Normal Plane", Some("m"), 1000.0)
            }
            ("Slope", Some("radians")) => Self::new("Slope", Some("deg"), (180.0 / std::f64::consts::PI) as f32),
            _ => Self::new(name, unit, 1.0),
        }
    }

    fn new(name: &str, unit: Option<&str>, scale: f32) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.map(str::to_string),
            scale,
        }
    }
}

/// Values of one feature channel over a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureData {
    pub channel: FeatureChannel,
    /// One value per mesh vertex, already scaled.
    pub per_vertex: Vec<f32>,
    /// One value per triangle: the mean of its three vertex values.
    pub per_triangle: Vec<f32>,
}

impl FeatureData {
    /// Resample per-vertex values onto triangles.
    pub(crate) fn from_vertices(channel: FeatureChannel, per_vertex: Vec<f32>, triangles: &[[u32; 3]]) -> Self {
        let per_triangle = triangles
            .iter()
            .map(|t| t.iter().map(|&v| per_vertex[v as usize]).sum::<f32>() / 3.0)
            .collect();
        Self {
            channel,
            per_vertex,
            per_triangle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalization_table() {
        let geo = FeatureChannel::normalized("Elevation Relative to Gravity ", Some("kilometers"));
        assert_eq!(geo.name, "Geopotential Height");
        assert_eq!(geo.unit.as_deref(), Some("m"));
        assert_eq!(geo.scale, 1000.0);

        let plane = FeatureChannel::normalized("Elevation Relative to Normal Plane", Some(" kilometers "));
        assert_eq!(plane.name, "Height Relative to Normal Plane");
        assert_eq!(plane.scale, 1000.0);

        let slope = FeatureChannel::normalized("Slope", Some("radians"));
        assert_eq!(slope.name, "Slope");
        assert_eq!(slope.unit.as_deref(), Some("deg"));
        assert_relative_eq!(slope.scale, 57.29578, epsilon = 1e-4);
    }

    #[test]
    fn test_passthrough() {
        let albedo = FeatureChannel::normalized(" Albedo ", Some("  "));
        assert_eq!(albedo.name, "Albedo");
        assert_eq!(albedo.unit, None);
        assert_eq!(albedo.scale, 1.0);

        // Slope in degrees already is left alone.
        let slope = FeatureChannel::normalized("Slope", Some("degrees"));
        assert_eq!(slope.unit.as_deref(), Some("degrees"));
        assert_eq!(slope.scale, 1.0);
    }

    #[test]
    fn test_per_triangle_mean() {
        let channel = FeatureChannel::normalized("Albedo", None);
        let data = FeatureData::from_vertices(channel, vec![1.0, 2.0, 3.0, 6.0], &[[0, 1, 2], [1, 2, 3]]);
        assert_eq!(data.per_triangle.len(), 2);
        assert_relative_eq!(data.per_triangle[0], 2.0);
        assert_relative_eq!(data.per_triangle[1], 11.0 / 3.0);
    }
}
