//! Region resolution from engine resource names
//!
//! Reasoning Engine endpoints are regional; the region is embedded in the
//! resource name (`projects/P/locations/REGION/reasoningEngines/ID`).

/// Region used when the resource name carries no usable location segment.
pub const DEFAULT_REGION: &str = "us-central1";

const LOCATION_MARKER: &str = "/locations/";

/// Derive the request region from an engine resource name.
///
/// Takes the segment following the first `/locations/` marker, up to the
/// next `/`. Falls back to [`DEFAULT_REGION`] when the marker is absent or
/// the segment is empty.
pub fn infer_region(engine: &str) -> &str {
    let Some(idx) = engine.find(LOCATION_MARKER) else {
        return DEFAULT_REGION;
    };

    let rest = &engine[idx + LOCATION_MARKER.len()..];
    let region = rest.split('/').next().unwrap_or("");

    if region.is_empty() {
        DEFAULT_REGION
    } else {
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_resource_name() {
        assert_eq!(
            infer_region("projects/p/locations/us-east4/reasoningEngines/e"),
            "us-east4"
        );
    }

    #[test]
    fn test_no_marker_falls_back() {
        assert_eq!(infer_region("projects/p/reasoningEngines/e"), DEFAULT_REGION);
        assert_eq!(infer_region(""), DEFAULT_REGION);
    }

    #[test]
    fn test_empty_segment_falls_back() {
        assert_eq!(infer_region("projects/p/locations//engines/e"), DEFAULT_REGION);
        assert_eq!(infer_region("projects/p/locations/"), DEFAULT_REGION);
    }

    #[test]
    fn test_marker_at_tail() {
        // No trailing slash after the region - still a valid segment
        assert_eq!(infer_region("projects/p/locations/europe-west1"), "europe-west1");
    }

    #[test]
    fn test_first_marker_wins() {
        assert_eq!(
            infer_region("projects/p/locations/us-east4/x/locations/us-west1"),
            "us-east4"
        );
    }
}
