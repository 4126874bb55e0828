use thiserror::Error;

/// Errors produced while turning photos into badges.
#[derive(Debug, Error)]
pub enum BadgeError {
    /// Missing image or missing/empty name on a single-image request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("name is empty after trimming whitespace")]
    InvalidName,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("failed to composite badge: {0}")]
    Composite(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("failed to read archive: {0}")]
    Archive(String),

    #[error("archive contains no supported image files")]
    EmptyBatch,

    #[error("all {failed} images in the archive failed to process")]
    AllFailed { failed: usize },

    /// A single-image pipeline run failed; `source` is the failing stage.
    #[error("failed to process image: {source}")]
    Processing {
        #[source]
        source: Box<BadgeError>,
    },
}

impl BadgeError {
    pub(crate) fn processing(source: BadgeError) -> Self {
        match source {
            already @ BadgeError::Processing { .. } => already,
            other => BadgeError::Processing {
                source: Box::new(other),
            },
        }
    }

    /// The stage error behind a `Processing` failure, or `self` otherwise.
    pub fn cause(&self) -> &BadgeError {
        match self {
            BadgeError::Processing { source } => source.cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_exposes_stage_cause() {
        let err = BadgeError::processing(BadgeError::Decode("bad header".into()));
        assert!(matches!(err.cause(), BadgeError::Decode(_)));
        assert_eq!(
            err.to_string(),
            "failed to process image: failed to decode image: bad header"
        );
    }

    #[test]
    fn processing_is_not_double_wrapped() {
        let inner = BadgeError::processing(BadgeError::Encode("io".into()));
        let outer = BadgeError::processing(inner);
        match outer {
            BadgeError::Processing { source } => {
                assert!(matches!(*source, BadgeError::Encode(_)))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
