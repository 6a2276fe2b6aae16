use thiserror::Error;

/// Errors surfaced by the work loop and the committer.
#[derive(Debug, Error)]
pub enum Error {
    /// A component called its hooks in a different order or count than on the
    /// previous pass.
    ///
    /// The work-in-progress pass is discarded; the committed tree is left as
    /// it was. Rendering the same component again fails the same way until the
    /// component is fixed.
    #[error(
        "hook order violation in `{component}` at hook #{index}: expected {expected}, found {found}"
    )]
    HookOrder {
        /// Label of the component being evaluated.
        component: String,
        /// Call-order index of the offending hook.
        index: usize,
        /// What the previous pass recorded at this index.
        expected: String,
        /// What this pass asked for.
        found: String,
    },

    /// The host renderer failed.
    ///
    /// Failures during commit leave the host tree partially updated.
    #[error("host operation `{operation}` failed")]
    Host {
        /// The host renderer method that failed.
        operation: &'static str,
        /// The renderer's error.
        #[source]
        source: Box<dyn std::error::Error + 'static>,
    },
}

impl Error {
    pub(crate) fn host<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Error::Host {
            operation,
            source: Box::new(source),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
