use thiserror::Error;

/// Fatal failures. A star that cannot be projected is not one of these; it is
/// skipped for the frame and counted in `ProjectionStats`.
#[derive(Debug, Error)]
pub enum StarfieldError {
    /// A collaborator (window, surface, input device) could not be set up
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The sphere sampler kept landing outside the unit ball
    #[error("generator gave up after {attempts} rejected samples")]
    Generation { attempts: u32 },

    #[error("star spread must be a positive finite number, got {0}")]
    InvalidSpread(f32),
}

pub type Result<T> = std::result::Result<T, StarfieldError>;
