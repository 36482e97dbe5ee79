/// Validation failure for a single point. Raised before anything is encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("point has no measurement name")]
    EmptyMeasurement,

    #[error("point '{measurement}' has no fields")]
    NoFields { measurement: String },
}
